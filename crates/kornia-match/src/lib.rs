#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Given two configurations of labeled rigid-body instances, find the rigid
//! transform under which the largest number of instances of the first
//! configuration land on an instance of the second with the same class, color
//! and pose.

/// Candidate seed pairs used to generate trial transforms.
pub mod candidates;

/// Configurations of labeled, posed instances.
pub mod configuration;

/// Partial bijections between configuration slots.
pub mod correspondence;

mod error;
pub use error::{GeometryError, MatchError};

/// Forward and backward lookups of a correspondence.
pub mod lookup;

mod matcher;
pub use matcher::{match_configurations, Alignment, MatchParams, SearchStats};

/// Rigid pose utilities.
pub mod pose;

/// Trial transforms and radius queries against a spatial index.
pub mod query;

/// Static nearest-neighbor index over instance positions.
pub mod spatial_index;

/// State of the best-alignment search.
pub mod tracker;

/// Validation of raw positional candidates.
pub mod validate;

pub use configuration::{Configuration, Instance};
pub use correspondence::{Correspondence, SeedPair};
pub use lookup::{build_lookup, MatchLookup};
pub use spatial_index::SpatialIndex;
