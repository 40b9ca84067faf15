//! meshweld-export library
//!
//! OBJ loading, export configuration and the binary mesh file formats, for
//! use by the `meshweld-export` binary and by other tools.

pub mod config;
pub mod convert;
pub mod formats;
pub mod obj;

pub use config::ExportConfig;
pub use convert::{
    ExportSummary, convert_obj_flat, convert_obj_indexed, convert_obj_to_memory,
};
pub use formats::{
    DecodedFlatShape, DecodedMesh, FLAT_MESH_EXT, GpuVertex, INDEXED_MESH_EXT, MeshFileHeader,
    read_flat_shapes, read_indexed_mesh, write_flat_shapes, write_indexed_mesh,
};
pub use obj::{ObjError, ObjModel, ParseOptions, load_obj, parse_obj};
