use std::collections::{BTreeMap, BTreeSet};

use approx::assert_relative_eq;
use glam::{DMat4, DQuat, DVec3};
use kornia_match::pose::{mat4_to_pose, pose_to_mat4, Pose, PoseTolerance, IDENTITY};
use kornia_match::{
    build_lookup, match_configurations, Alignment, Configuration, Correspondence, Instance,
    MatchParams, SeedPair, SpatialIndex,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_pose(rng: &mut StdRng, extent: f64) -> DMat4 {
    let axis = DVec3::new(
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
        rng.random_range(-1.0..1.0),
    )
    .try_normalize()
    .unwrap_or(DVec3::Z);
    let angle = rng.random_range(-std::f64::consts::PI..std::f64::consts::PI);
    let translation = DVec3::new(
        rng.random_range(0.0..extent),
        rng.random_range(0.0..extent),
        rng.random_range(0.0..extent),
    );
    DMat4::from_rotation_translation(DQuat::from_axis_angle(axis, angle), translation)
}

fn random_instances(rng: &mut StdRng, num_instances: usize, num_classes: u32) -> Vec<Instance> {
    (0..num_instances)
        .map(|_| {
            let class = rng.random_range(1..=num_classes);
            let color = rng.random_range(0..2);
            Instance::new(class, color, mat4_to_pose(&random_pose(rng, 10.0)))
        })
        .collect()
}

fn at(x: f64, y: f64, z: f64) -> Pose {
    mat4_to_pose(&DMat4::from_translation(DVec3::new(x, y, z)))
}

fn assert_consistent(alignment: &Alignment, a: &Configuration, b: &Configuration) {
    let tolerance = PoseTolerance::default();
    let b_t_a = pose_to_mat4(&alignment.transform);
    let mut seen_a = BTreeSet::new();
    let mut seen_b = BTreeSet::new();
    for SeedPair { a: ia, b: ib } in alignment.correspondence.iter() {
        assert!(seen_a.insert(ia), "slot {ia} of A matched twice");
        assert!(seen_b.insert(ib), "slot {ib} of B matched twice");
        assert_ne!(a.class()[ia], 0);
        assert_eq!(a.class()[ia], b.class()[ib]);
        assert_eq!(a.color()[ia], b.color()[ib]);
        assert!(tolerance.allclose(
            &(b_t_a * pose_to_mat4(&a.poses()[ia])),
            &pose_to_mat4(&b.poses()[ib])
        ));
    }
}

#[test]
fn identity_matches_every_instance() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut instances = random_instances(&mut rng, 20, 4);
    instances.insert(5, Instance::new(0, 0, [[0.0; 4]; 4]));
    let config = Configuration::from_instances(instances);

    let alignment = match_configurations(&config, &config, None, &MatchParams::default())?;

    assert_eq!(alignment.correspondence.len(), config.num_instances());
    for i in config.instance_indices() {
        assert!(alignment.correspondence.contains(i, i));
    }
    for (row, expected) in alignment.transform.iter().zip(IDENTITY.iter()) {
        for (x, y) in row.iter().zip(expected.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-9);
        }
    }
    assert!(alignment.stats.converged);
    Ok(())
}

#[test]
fn empty_configuration_gives_empty_alignment() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(3);
    let full = Configuration::from_instances(random_instances(&mut rng, 5, 2));
    let background_only = Configuration::new(vec![0, 0], vec![0, 0], vec![IDENTITY; 2])?;
    let no_slots = Configuration::new(vec![], vec![], vec![])?;

    for (a, b) in [
        (&full, &background_only),
        (&background_only, &full),
        (&no_slots, &full),
        (&full, &no_slots),
    ] {
        let alignment = match_configurations(a, b, None, &MatchParams::default())?;
        assert!(alignment.correspondence.is_empty());
        assert_eq!(alignment.transform, IDENTITY);
        assert!(alignment.stats.converged);
    }
    Ok(())
}

#[test]
fn disjoint_classes_give_empty_alignment() -> Result<(), Box<dyn std::error::Error>> {
    let a = Configuration::from_instances([Instance::new(5, 0, at(0.0, 0.0, 0.0))]);
    let b = Configuration::from_instances([
        Instance::new(7, 0, at(0.0, 0.0, 0.0)),
        Instance::new(7, 0, at(1.0, 0.0, 0.0)),
    ]);
    let alignment = match_configurations(&a, &b, None, &MatchParams::default())?;
    assert!(alignment.correspondence.is_empty());
    assert_eq!(alignment.transform, IDENTITY);
    assert_eq!(alignment.stats.evaluations, 0);
    Ok(())
}

#[test]
fn color_mismatch_gives_empty_alignment() -> Result<(), Box<dyn std::error::Error>> {
    let a = Configuration::from_instances([Instance::new(1, 2, at(0.0, 0.0, 0.0))]);
    let b = Configuration::from_instances([Instance::new(1, 3, at(0.0, 0.0, 0.0))]);
    let alignment = match_configurations(&a, &b, None, &MatchParams::default())?;
    assert!(alignment.correspondence.is_empty());
    Ok(())
}

#[test]
fn translation_only() -> Result<(), Box<dyn std::error::Error>> {
    let a = Configuration::from_instances([
        Instance::new(1, 0, at(0.0, 0.0, 0.0)),
        Instance::new(1, 0, at(1.0, 0.0, 0.0)),
    ]);
    let b = Configuration::from_instances([
        Instance::new(1, 0, at(10.0, 0.0, 0.0)),
        Instance::new(1, 0, at(11.0, 0.0, 0.0)),
    ]);
    let params = MatchParams {
        radius: 0.01,
        ..Default::default()
    };
    let alignment = match_configurations(&a, &b, None, &params)?;

    let pairs = alignment.correspondence.iter().collect::<Vec<_>>();
    assert_eq!(pairs, vec![SeedPair::new(1, 1), SeedPair::new(2, 2)]);
    assert_relative_eq!(alignment.transform[0][3], 10.0);
    assert_relative_eq!(alignment.transform[1][3], 0.0);
    assert_relative_eq!(alignment.transform[2][3], 0.0);
    Ok(())
}

#[test]
fn rigid_motion_with_clutter() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let instances_a = random_instances(&mut rng, 15, 3);
    let b_t_a = random_pose(&mut rng, 5.0);

    // B holds the moved instances of A interleaved with unrelated ones
    let mut instances_b = Vec::new();
    let mut expected = BTreeMap::new();
    for (i, instance) in instances_a.iter().enumerate() {
        instances_b.extend(random_instances(&mut rng, 1, 3));
        let moved = mat4_to_pose(&(b_t_a * pose_to_mat4(&instance.pose)));
        instances_b.push(Instance::new(instance.class, instance.color, moved));
        expected.insert(i + 1, instances_b.len());
    }

    let a = Configuration::from_instances(instances_a);
    let b = Configuration::from_instances(instances_b);
    let alignment = match_configurations(&a, &b, None, &MatchParams::default())?;

    assert_consistent(&alignment, &a, &b);
    assert_eq!(alignment.correspondence.a_to_b(), &expected);
    let transform = pose_to_mat4(&alignment.transform);
    for (x, y) in transform.to_cols_array().iter().zip(b_t_a.to_cols_array()) {
        assert_relative_eq!(*x, y, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn partial_overlap_is_consistent() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..5 {
        let a = Configuration::from_instances(random_instances(&mut rng, 12, 2));
        let moved = random_pose(&mut rng, 3.0);
        // keep only some of A in B, plus new instances
        let mut instances_b = a
            .instance_indices()
            .filter(|_| rng.random_bool(0.6))
            .map(|i| {
                Instance::new(
                    a.class()[i],
                    a.color()[i],
                    mat4_to_pose(&(moved * pose_to_mat4(&a.poses()[i]))),
                )
            })
            .collect::<Vec<_>>();
        let kept = instances_b.len();
        instances_b.extend(random_instances(&mut rng, 6, 2));
        let b = Configuration::from_instances(instances_b);

        let alignment = match_configurations(&a, &b, None, &MatchParams::default())?;
        assert_consistent(&alignment, &a, &b);
        assert!(alignment.correspondence.len() >= kept);
    }
    Ok(())
}

#[test]
fn matching_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(5);
    let a = Configuration::from_instances(random_instances(&mut rng, 25, 3));
    let b = Configuration::from_instances(random_instances(&mut rng, 25, 3));

    let first = match_configurations(&a, &b, None, &MatchParams::default())?;
    let second = match_configurations(&a, &b, None, &MatchParams::default())?;
    assert_eq!(first, second);
    assert_consistent(&first, &a, &b);
    Ok(())
}

#[test]
fn evaluation_budget_keeps_a_valid_alignment() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(9);
    let a = Configuration::from_instances(random_instances(&mut rng, 20, 2));
    let b = Configuration::from_instances(random_instances(&mut rng, 20, 2));
    let params = MatchParams {
        max_evaluations: Some(3),
        ..Default::default()
    };

    let alignment = match_configurations(&a, &b, None, &params)?;
    assert!(alignment.stats.evaluations <= 3);
    assert_consistent(&alignment, &a, &b);
    Ok(())
}

#[test]
fn shared_index_across_threads() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(13);
    let b = Configuration::from_instances(random_instances(&mut rng, 30, 3));
    let index = SpatialIndex::new(&b);

    let queries = (0..4)
        .map(|_| {
            let moved = random_pose(&mut rng, 2.0);
            let instances = b
                .instance_indices()
                .take(10)
                .map(|i| {
                    Instance::new(
                        b.class()[i],
                        b.color()[i],
                        mat4_to_pose(&(moved * pose_to_mat4(&b.poses()[i]))),
                    )
                })
                .collect::<Vec<_>>();
            Configuration::from_instances(instances)
        })
        .collect::<Vec<_>>();

    let results = std::thread::scope(|s| {
        let handles = queries
            .iter()
            .map(|a| {
                let (b, index) = (&b, &index);
                s.spawn(move || match_configurations(a, b, Some(index), &MatchParams::default()))
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().expect("matcher thread panicked"))
            .collect::<Result<Vec<_>, _>>()
    })?;

    for (a, alignment) in queries.iter().zip(results.iter()) {
        assert_eq!(alignment.correspondence.len(), 10);
        assert_consistent(alignment, a, &b);
        assert_eq!(
            alignment,
            &match_configurations(a, &b, None, &MatchParams::default())?
        );
    }
    Ok(())
}

#[test]
fn lookup_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let a = Configuration::new(vec![0, 1, 0, 1, 2], vec![0; 5], vec![IDENTITY; 5])?;
    let b = Configuration::new(vec![0, 0, 1, 1], vec![0; 4], vec![IDENTITY; 4])?;
    let mut correspondence = Correspondence::new();
    correspondence.insert(1, 2);
    correspondence.insert(3, 3);

    let lookup = build_lookup(&correspondence, &a, &b);
    assert_eq!(lookup.a_to_b, BTreeMap::from([(1, 2), (3, 3)]));
    assert_eq!(lookup.b_to_a, BTreeMap::from([(2, 1), (3, 3)]));
    assert_eq!(lookup.misses_a, BTreeSet::from([4]));
    assert_eq!(lookup.misses_b, BTreeSet::new());
    Ok(())
}

#[test]
fn alignment_lookup_reports_misses() -> Result<(), Box<dyn std::error::Error>> {
    let a = Configuration::from_instances([
        Instance::new(1, 0, at(0.0, 0.0, 0.0)),
        Instance::new(1, 0, at(1.0, 0.0, 0.0)),
        Instance::new(2, 0, at(5.0, 5.0, 5.0)),
    ]);
    let b = Configuration::from_instances([
        Instance::new(3, 0, at(0.0, 0.0, 0.0)),
        Instance::new(1, 0, at(2.0, 0.0, 0.0)),
        Instance::new(1, 0, at(3.0, 0.0, 0.0)),
    ]);
    let alignment = match_configurations(&a, &b, None, &MatchParams::default())?;
    let lookup = build_lookup(&alignment.correspondence, &a, &b);

    assert_eq!(lookup.a_to_b, BTreeMap::from([(1, 2), (2, 3)]));
    assert_eq!(lookup.misses_a, BTreeSet::from([3]));
    assert_eq!(lookup.misses_b, BTreeSet::from([1]));
    Ok(())
}
