use thiserror::Error;

/// Error raised when an instance pose cannot be used as a rigid transform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The pose holds NaN or infinite entries.
    #[error("Pose of instance {index} contains non-finite values")]
    NonFinitePose {
        /// Slot index of the offending instance.
        index: usize,
    },

    /// The pose cannot be inverted.
    #[error("Pose of instance {index} is singular (determinant {determinant})")]
    SingularPose {
        /// Slot index of the offending instance.
        index: usize,
        /// Determinant of the 4x4 pose matrix.
        determinant: f64,
    },
}

/// Error types for configuration matching.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The per-slot arrays of a configuration do not have the same length.
    #[error("Mismatched configuration lengths: class ({class}), color ({color}), pose ({pose})")]
    MismatchedLengths {
        /// Number of class labels.
        class: usize,
        /// Number of color labels.
        color: usize,
        /// Number of poses.
        pose: usize,
    },

    /// A parameter or auxiliary input is outside of its valid domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A pose of one of the input configurations is not a usable rigid transform.
    #[error("Invalid pose in configuration {configuration}: {source}")]
    InvalidPose {
        /// Which input holds the pose, `"A"` or `"B"`.
        configuration: &'static str,
        /// Underlying pose error.
        #[source]
        source: GeometryError,
    },

    /// A pose could not be used as a rigid transform.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
