use glam::DMat4;

use crate::configuration::Configuration;
use crate::correspondence::Correspondence;
use crate::pose::{pose_to_mat4, PoseTolerance};

/// Filter raw positional candidates down to a consistent correspondence.
///
/// A pair `(a, b)` is kept when both slots hold an instance of the same class
/// and color, `b` is still unmatched, and `b_t_a * pose_a[a]` is close to
/// `pose_b[b]` under `tolerance`. Each A slot takes the first B candidate that
/// passes, in ascending slot order.
///
/// # Arguments
///
/// * `config_a` - Source configuration.
/// * `config_b` - Target configuration.
/// * `candidates` - For every slot of A, the B slots near its transformed position.
/// * `b_t_a` - Trial transform from the frame of A to the frame of B.
/// * `tolerance` - Element-wise pose tolerance.
pub fn validate_matches(
    config_a: &Configuration,
    config_b: &Configuration,
    candidates: &[Vec<usize>],
    b_t_a: &DMat4,
    tolerance: &PoseTolerance,
) -> Correspondence {
    let mut valid = Correspondence::new();

    for (a, a_candidates) in candidates.iter().enumerate() {
        if a_candidates.is_empty() || !config_a.is_present(a) {
            continue;
        }

        let class_a = config_a.class()[a];
        let color_a = config_a.color()[a];
        let transformed_a = *b_t_a * pose_to_mat4(&config_a.poses()[a]);

        let matched = a_candidates.iter().copied().find(|&b| {
            config_b.is_present(b)
                && config_b.class()[b] == class_a
                && config_b.color()[b] == color_a
                && !valid.contains_b(b)
                && tolerance.allclose(&transformed_a, &pose_to_mat4(&config_b.poses()[b]))
        });

        if let Some(b) = matched {
            valid.insert(a, b);
        }
    }

    valid
}
