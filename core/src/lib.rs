//! Meshweld Core - indexed mesh building
//!
//! Converts a triangulated surface (attribute tables plus per-shape face
//! corners) into a deduplicated vertex buffer and a triangle index buffer.
//!
//! # Architecture
//!
//! - [`AttributeStore`] / [`FaceCorpus`] - parser-supplied input, read-only
//! - [`SmoothingNormalSynthesizer`] - averaged face normals for shapes without normals
//! - [`VertexWelder`] - maps composite attribute keys to first-seen vertex ids
//! - [`IndexedMeshBuilder`] - drives the two above over every shape
//! - [`export_flat`] - per-corner export with no welding
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use meshweld_core::{AttributeStore, Face, FaceCorner, FaceCorpus, IndexedMeshBuilder, Shape};
//!
//! let store = AttributeStore {
//!     positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)],
//!     ..Default::default()
//! };
//! let corner = FaceCorner::new;
//! let corpus = FaceCorpus::new(vec![Shape::with_faces(
//!     "quad",
//!     vec![
//!         Face::new([corner(0), corner(1), corner(3)]),
//!         Face::new([corner(0), corner(3), corner(2)]),
//!     ],
//! )]);
//!
//! let build = IndexedMeshBuilder::default().build(&corpus, &store)?;
//! assert_eq!(build.mesh.vertices.len(), 4);
//! assert_eq!(build.mesh.indices, vec![0, 1, 2, 0, 2, 3]);
//! # Ok::<(), meshweld_core::MeshError>(())
//! ```

pub mod builder;
pub mod error;
pub mod flat;
pub mod math;
pub mod model;
pub mod normals;
pub mod weld;

pub use builder::{
    BuildOptions, DegenerateNormal, IndexedMesh, IndexedMeshBuilder, MeshBuild, SmoothingMode,
};
pub use error::{MalformedReason, MeshError};
pub use flat::{FlatShape, export_flat};
pub use math::Winding;
pub use model::{
    AttributeIndex, AttributeStore, DEFAULT_COLOR, Face, FaceCorner, FaceCorpus, Shape,
};
pub use normals::{SmoothedNormalTable, SmoothingNormalSynthesizer};
pub use weld::{NormalKey, OutputVertex, VertexWelder, WeldKey};
