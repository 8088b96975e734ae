//! Near-duplicate detection by geospatial proximity and species name.

mod detector;
mod grid;
mod lookup;

pub use detector::{DuplicateDetector, DuplicateMatch, DuplicateOf, planar_distance};
pub use lookup::{ExistingRecordRef, InMemoryLookup, NoLookup, RecordLookup};
