//! Input data model: attribute tables and triangulated face corpus
//!
//! Both are produced once by a geometry parser and only read by the builder.

use glam::{Vec2, Vec3};

use crate::error::MalformedReason;

/// Color used for every position when the color table is empty
pub const DEFAULT_COLOR: Vec3 = Vec3::ONE;

/// Index into one of the attribute arrays of an [`AttributeStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeIndex(pub u32);

impl AttributeIndex {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for AttributeIndex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for AttributeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One vertex reference of a triangular face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceCorner {
    pub position: AttributeIndex,
    pub normal: Option<AttributeIndex>,
    pub uv: Option<AttributeIndex>,
}

impl FaceCorner {
    /// Corner with only a position reference
    pub fn new(position: u32) -> Self {
        Self {
            position: AttributeIndex(position),
            normal: None,
            uv: None,
        }
    }

    pub fn with_normal(mut self, normal: u32) -> Self {
        self.normal = Some(AttributeIndex(normal));
        self
    }

    pub fn with_uv(mut self, uv: u32) -> Self {
        self.uv = Some(AttributeIndex(uv));
        self
    }
}

/// Triangle with an optional smoothing-group tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub corners: [FaceCorner; 3],
    pub smoothing_group: Option<u32>,
}

impl Face {
    pub fn new(corners: [FaceCorner; 3]) -> Self {
        Self {
            corners,
            smoothing_group: None,
        }
    }

    pub fn with_smoothing_group(mut self, group: u32) -> Self {
        self.smoothing_group = Some(group);
        self
    }

    /// Build a face from a corner list that must already be a triangle
    pub fn from_polygon(
        corners: &[FaceCorner],
        smoothing_group: Option<u32>,
    ) -> Result<Self, MalformedReason> {
        let corners: [FaceCorner; 3] =
            corners
                .try_into()
                .map_err(|_| MalformedReason::NotTriangulated {
                    corners: corners.len(),
                })?;
        Ok(Self {
            corners,
            smoothing_group,
        })
    }

    /// Position ids of the three corners, in corner order
    pub fn positions(&self) -> [AttributeIndex; 3] {
        self.corners.map(|c| c.position)
    }
}

/// Named group of faces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub name: String,
    pub faces: Vec<Face>,
}

impl Shape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
        }
    }

    pub fn with_faces(name: impl Into<String>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            faces,
        }
    }

    /// True if any corner of the shape references an explicit normal
    pub fn has_explicit_normals(&self) -> bool {
        self.corners().any(|c| c.normal.is_some())
    }

    pub fn corner_count(&self) -> usize {
        self.faces.len() * 3
    }

    /// All corners in face order, then corner order
    pub fn corners(&self) -> impl Iterator<Item = &FaceCorner> {
        self.faces.iter().flat_map(|f| f.corners.iter())
    }
}

/// Parser-supplied attribute arrays
///
/// `normals`, `uvs` and `colors` may be empty. Colors are indexed by
/// position id, not by a separate corner reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Vec3>,
}

impl AttributeStore {
    pub fn position(&self, index: AttributeIndex) -> Option<Vec3> {
        self.positions.get(index.as_usize()).copied()
    }

    pub fn normal(&self, index: AttributeIndex) -> Option<Vec3> {
        self.normals.get(index.as_usize()).copied()
    }

    pub fn uv(&self, index: AttributeIndex) -> Option<Vec2> {
        self.uvs.get(index.as_usize()).copied()
    }

    /// Color of a position, or [`DEFAULT_COLOR`] when there is no color table
    pub fn color(&self, position: AttributeIndex) -> Option<Vec3> {
        if self.colors.is_empty() {
            Some(DEFAULT_COLOR)
        } else {
            self.colors.get(position.as_usize()).copied()
        }
    }
}

/// Ordered list of shapes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceCorpus {
    pub shapes: Vec<Shape>,
}

impl FaceCorpus {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    /// Total number of faces across all shapes
    pub fn face_count(&self) -> usize {
        self.shapes.iter().map(|s| s.faces.len()).sum()
    }

    /// True if there are no faces at all
    pub fn is_empty(&self) -> bool {
        self.face_count() == 0
    }
}
