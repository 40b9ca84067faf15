//! Smoothing-normal synthesis for shapes without explicit normals
//!
//! Each face contributes its unit geometric normal, unweighted, to every
//! position it touches. The per-position sums are then normalized. A sum that
//! cancels out (or only ever received zero-area faces) has no direction; it is
//! stored as the zero vector and listed as degenerate.

use glam::Vec3;
use hashbrown::HashMap;

use crate::error::{MalformedReason, MeshError};
use crate::math::{Winding, face_normal, normalize_or_degenerate};
use crate::model::{AttributeIndex, AttributeStore, Face, Shape};

/// Synthesized unit normals keyed by position id, scoped to one shape
#[derive(Debug, Clone, Default)]
pub struct SmoothedNormalTable {
    normals: HashMap<AttributeIndex, Vec3>,
    /// Sorted ascending
    degenerate: Vec<AttributeIndex>,
}

impl SmoothedNormalTable {
    /// Normal for a position, `None` if no face touched it
    pub fn get(&self, position: AttributeIndex) -> Option<Vec3> {
        self.normals.get(&position).copied()
    }

    pub fn is_degenerate(&self, position: AttributeIndex) -> bool {
        self.degenerate.binary_search(&position).is_ok()
    }

    /// Positions whose accumulated normal had no direction, ascending
    pub fn degenerate_positions(&self) -> &[AttributeIndex] {
        &self.degenerate
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }
}

/// Builds [`SmoothedNormalTable`]s from face geometry
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothingNormalSynthesizer {
    pub winding: Winding,
}

impl SmoothingNormalSynthesizer {
    pub fn new(winding: Winding) -> Self {
        Self { winding }
    }

    /// Average face normals over every face of the shape
    pub fn synthesize(
        &self,
        shape: &Shape,
        store: &AttributeStore,
    ) -> Result<SmoothedNormalTable, MeshError> {
        self.accumulate(shape, store, |_| true)
    }

    /// Average face normals over the faces tagged with `group` only
    ///
    /// `None` selects the faces that carry no smoothing group.
    pub fn synthesize_group(
        &self,
        shape: &Shape,
        store: &AttributeStore,
        group: Option<u32>,
    ) -> Result<SmoothedNormalTable, MeshError> {
        self.accumulate(shape, store, |face| face.smoothing_group == group)
    }

    fn accumulate(
        &self,
        shape: &Shape,
        store: &AttributeStore,
        include: impl Fn(&Face) -> bool,
    ) -> Result<SmoothedNormalTable, MeshError> {
        let mut sums: HashMap<AttributeIndex, Vec3> = HashMap::new();

        for (face_idx, face) in shape.faces.iter().enumerate() {
            if !include(face) {
                continue;
            }

            let ids = face.positions();
            let mut points = [Vec3::ZERO; 3];
            for (point, &id) in points.iter_mut().zip(ids.iter()) {
                *point = store.position(id).ok_or_else(|| {
                    MeshError::malformed(
                        &shape.name,
                        face_idx,
                        MalformedReason::PositionOutOfRange {
                            index: id,
                            len: store.positions.len(),
                        },
                    )
                })?;
            }

            let normal = face_normal(points[0], points[1], points[2], self.winding);
            for id in ids {
                *sums.entry(id).or_insert(Vec3::ZERO) += normal;
            }
        }

        let mut table = SmoothedNormalTable {
            normals: HashMap::with_capacity(sums.len()),
            degenerate: Vec::new(),
        };
        for (id, sum) in sums {
            match normalize_or_degenerate(sum) {
                Some(n) => {
                    table.normals.insert(id, n);
                }
                None => {
                    table.normals.insert(id, Vec3::ZERO);
                    table.degenerate.push(id);
                }
            }
        }
        table.degenerate.sort_unstable();

        Ok(table)
    }
}
