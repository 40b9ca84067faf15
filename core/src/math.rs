//! Vector helpers for face-normal computation

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Squared length below which a sum of unit normals is treated as zero
pub const DEGENERATE_EPSILON: f32 = 1e-12;

/// Squared sine of the corner angle below which a triangle counts as collinear
///
/// Compared against `|e1 × e2|² / (|e1|² |e2|²)`, so it does not depend on units.
pub const COLLINEAR_EPSILON: f32 = 1e-12;

/// Tolerance used when checking that a normal is unit length
pub const UNIT_TOLERANCE: f32 = 1e-5;

/// Which vertex order is front-facing
///
/// - `CounterClockwise`: `normal = (v1 - v0) × (v2 - v0)` (OBJ/OpenGL convention)
/// - `Clockwise`: `normal = (v2 - v0) × (v1 - v0)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Winding {
    #[default]
    CounterClockwise,
    Clockwise,
}

/// Unnormalized cross product of the two edges leaving `p0`
#[inline]
pub fn face_cross(p0: Vec3, p1: Vec3, p2: Vec3, winding: Winding) -> Vec3 {
    let edge1 = p1 - p0;
    let edge2 = p2 - p0;
    match winding {
        Winding::CounterClockwise => edge1.cross(edge2),
        Winding::Clockwise => edge2.cross(edge1),
    }
}

/// Unit geometric normal of a triangle, or zero for a zero-area triangle
#[inline]
pub fn face_normal(p0: Vec3, p1: Vec3, p2: Vec3, winding: Winding) -> Vec3 {
    let cross = face_cross(p0, p1, p2, winding);
    let scale = (p1 - p0).length_squared() * (p2 - p0).length_squared();
    if !cross.is_finite() || cross.length_squared() <= COLLINEAR_EPSILON * scale {
        return Vec3::ZERO;
    }
    cross.try_normalize().unwrap_or(Vec3::ZERO)
}

/// Normalize `v`, or `None` if its length is too small to normalize
#[inline]
pub fn normalize_or_degenerate(v: Vec3) -> Option<Vec3> {
    if v.length_squared() <= DEGENERATE_EPSILON || !v.is_finite() {
        None
    } else {
        Some(v.normalize())
    }
}

#[inline]
pub fn is_unit(v: Vec3, tolerance: f32) -> bool {
    (v.length() - 1.0).abs() <= tolerance
}
