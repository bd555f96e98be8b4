//! store — persisted pipeline artifacts.
//!
//! Each pipeline stage reads its inputs and writes its output through an
//! [`ArtifactStore`], keyed by [`ArtifactKind`] and reference year. Loading
//! always re-validates the artifact, so a stage never runs on a record
//! whose shapes or Leontief pairing were broken on disk.
//!
//! - [`artifact`]: [`Artifact`] trait, kinds, and the store trait.
//! - [`json`]: [`JsonStore`], the filesystem implementation.

pub mod artifact;
pub mod json;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::artifact::{Artifact, ArtifactKind, ArtifactStore};
pub use self::json::JsonStore;
