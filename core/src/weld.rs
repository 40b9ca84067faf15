//! Vertex welding: collapse identical corner attribute tuples into one vertex

use glam::{Vec2, Vec3};
use hashbrown::HashMap;

use crate::error::MeshError;
use crate::model::AttributeIndex;

/// Where a corner's normal comes from, as far as welding is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalKey {
    /// Explicit normal id supplied by the corner
    Explicit(AttributeIndex),
    /// Synthesized normal of the corner's position, within a smoothing scope
    ///
    /// `shape` is the shape's ordinal in the corpus; each shape synthesizes its
    /// own table, so these keys never weld across shapes. `group` is `None`
    /// when one table covers the whole shape.
    Smoothed { shape: usize, group: Option<u32> },
    /// No normal available
    Absent,
}

/// Composite attribute key; corners with equal keys share one output vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeldKey {
    pub position: AttributeIndex,
    pub normal: NormalKey,
    pub uv: Option<AttributeIndex>,
}

/// Fully resolved vertex attributes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputVertex {
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub uv: Vec2,
    pub color: Vec3,
}

/// Assigns sequential vertex ids to distinct [`WeldKey`]s in first-seen order
#[derive(Debug, Default)]
pub struct VertexWelder {
    ids: HashMap<WeldKey, u32>,
    vertices: Vec<OutputVertex>,
}

impl VertexWelder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(corners: usize) -> Self {
        Self {
            ids: HashMap::with_capacity(corners),
            vertices: Vec::with_capacity(corners),
        }
    }

    /// Return the id for `key`, storing `vertex` if the key is new
    ///
    /// On a repeat key the stored vertex is kept and `vertex` is ignored.
    pub fn weld(&mut self, key: WeldKey, vertex: OutputVertex) -> Result<u32, MeshError> {
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }

        let id = u32::try_from(self.vertices.len()).map_err(|_| MeshError::TooManyVertices)?;
        self.vertices.push(vertex);
        self.ids.insert(key, id);
        Ok(id)
    }

    /// Number of distinct vertices so far
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[OutputVertex] {
        &self.vertices
    }

    pub fn into_vertices(self) -> Vec<OutputVertex> {
        self.vertices
    }
}
