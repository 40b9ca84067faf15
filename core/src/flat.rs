//! Non-indexed export: one attribute entry per face corner, per shape
//!
//! No welding and no normal synthesis. A shape's normals and uvs are either
//! present on every corner or on none.

use glam::{Vec2, Vec3};

use crate::error::{MalformedReason, MeshError};
use crate::model::{AttributeStore, FaceCorpus, Shape};

/// Parallel per-corner attribute arrays for one shape
///
/// `normals` and `uvs` are either empty or as long as `positions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatShape {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec3>,
}

impl FlatShape {
    pub fn corner_count(&self) -> usize {
        self.positions.len()
    }
}

/// Gather per-corner attributes for every shape in order
pub fn export_flat(corpus: &FaceCorpus, store: &AttributeStore) -> Result<Vec<FlatShape>, MeshError> {
    corpus
        .shapes
        .iter()
        .map(|shape| export_shape(shape, store))
        .collect()
}

fn export_shape(shape: &Shape, store: &AttributeStore) -> Result<FlatShape, MeshError> {
    let (has_normals, has_uvs) = shape
        .faces
        .first()
        .map(|f| (f.corners[0].normal.is_some(), f.corners[0].uv.is_some()))
        .unwrap_or((false, false));

    let corners = shape.corner_count();
    let mut out = FlatShape {
        name: shape.name.clone(),
        positions: Vec::with_capacity(corners),
        normals: Vec::with_capacity(if has_normals { corners } else { 0 }),
        uvs: Vec::with_capacity(if has_uvs { corners } else { 0 }),
        colors: Vec::with_capacity(corners),
    };

    for (face_idx, face) in shape.faces.iter().enumerate() {
        let malformed = |reason: MalformedReason| MeshError::malformed(&shape.name, face_idx, reason);

        for corner in &face.corners {
            if corner.normal.is_some() != has_normals {
                return Err(malformed(MalformedReason::MixedNormals));
            }
            if corner.uv.is_some() != has_uvs {
                return Err(malformed(MalformedReason::MixedUvs));
            }

            let position = store.position(corner.position).ok_or_else(|| {
                malformed(MalformedReason::PositionOutOfRange {
                    index: corner.position,
                    len: store.positions.len(),
                })
            })?;
            out.positions.push(position);

            if let Some(id) = corner.normal {
                let n = store.normal(id).ok_or_else(|| {
                    malformed(MalformedReason::NormalOutOfRange {
                        index: id,
                        len: store.normals.len(),
                    })
                })?;
                out.normals.push(n);
            }

            if let Some(id) = corner.uv {
                let uv = store.uv(id).ok_or_else(|| {
                    malformed(MalformedReason::UvOutOfRange {
                        index: id,
                        len: store.uvs.len(),
                    })
                })?;
                out.uvs.push(uv);
            }

            let color = store.color(corner.position).ok_or_else(|| {
                malformed(MalformedReason::ColorOutOfRange {
                    index: corner.position,
                    len: store.colors.len(),
                })
            })?;
            out.colors.push(color);
        }
    }

    Ok(out)
}
