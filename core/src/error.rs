//! Error types for mesh building

use crate::model::AttributeIndex;

/// Why a shape was rejected as malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// Corner references a position past the end of the position array
    PositionOutOfRange { index: AttributeIndex, len: usize },
    /// Corner references a normal past the end of the normal array
    NormalOutOfRange { index: AttributeIndex, len: usize },
    /// Corner references a texture coordinate past the end of the uv array
    UvOutOfRange { index: AttributeIndex, len: usize },
    /// Color table is present but shorter than the position it is looked up by
    ColorOutOfRange { index: AttributeIndex, len: usize },
    /// Face does not have exactly three corners
    NotTriangulated { corners: usize },
    /// Some corners of the shape carry normals and some do not
    MixedNormals,
    /// Some corners of the shape carry texture coordinates and some do not
    MixedUvs,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PositionOutOfRange { index, len } => {
                write!(f, "position index {} out of range (len {})", index, len)
            }
            Self::NormalOutOfRange { index, len } => {
                write!(f, "normal index {} out of range (len {})", index, len)
            }
            Self::UvOutOfRange { index, len } => {
                write!(f, "uv index {} out of range (len {})", index, len)
            }
            Self::ColorOutOfRange { index, len } => {
                write!(f, "no color for position {} (color table len {})", index, len)
            }
            Self::NotTriangulated { corners } => {
                write!(f, "face has {} corners, expected 3", corners)
            }
            Self::MixedNormals => write!(f, "shape mixes corners with and without normals"),
            Self::MixedUvs => write!(f, "shape mixes corners with and without uvs"),
        }
    }
}

/// Error returned when a mesh cannot be built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("Malformed mesh in shape '{shape}', face {face}: {reason}")]
    Malformed {
        shape: String,
        face: usize,
        reason: MalformedReason,
    },

    #[error("Mesh has more distinct vertices than fit in u32 indices")]
    TooManyVertices,
}

impl MeshError {
    pub(crate) fn malformed(shape: &str, face: usize, reason: MalformedReason) -> Self {
        Self::Malformed {
            shape: shape.to_string(),
            face,
            reason,
        }
    }

    /// The malformed-input reason, if this is a malformed-mesh error
    pub fn reason(&self) -> Option<&MalformedReason> {
        match self {
            Self::Malformed { reason, .. } => Some(reason),
            Self::TooManyVertices => None,
        }
    }
}
