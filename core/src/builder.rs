//! Indexed mesh construction
//!
//! Walks every shape, face and corner in order, resolves each corner's
//! attributes and feeds them through one [`VertexWelder`] shared by the whole
//! build. Vertex ids therefore continue across shape boundaries.

use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::{MalformedReason, MeshError};
use crate::math::Winding;
use crate::model::{AttributeIndex, AttributeStore, Face, FaceCorner, FaceCorpus, Shape};
use crate::normals::{SmoothedNormalTable, SmoothingNormalSynthesizer};
use crate::weld::{NormalKey, OutputVertex, VertexWelder, WeldKey};

/// How synthesized normals are scoped within a shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmoothingMode {
    /// One average over every face of the shape; smoothing groups are ignored
    #[default]
    PerShape,
    /// One average per smoothing-group id; faces without a group form their own scope
    PerGroup,
}

/// Options for [`IndexedMeshBuilder`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub winding: Winding,
    pub smoothing: SmoothingMode,
}

/// Deduplicated vertex buffer plus triangle index buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<OutputVertex>,
    pub indices: Vec<u32>,
    /// True if any corner supplied a uv id; missing uvs are stored as zero
    pub has_uvs: bool,
}

impl IndexedMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// True if at least one vertex carries a normal
    pub fn has_normals(&self) -> bool {
        self.vertices.iter().any(|v| v.normal.is_some())
    }
}

/// A synthesized normal that had no direction and was replaced by zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegenerateNormal {
    pub shape: String,
    pub position: AttributeIndex,
    /// Smoothing group of the table the position belonged to, per-group mode only
    pub group: Option<u32>,
}

/// Output of a successful build
#[derive(Debug, Clone, Default)]
pub struct MeshBuild {
    pub mesh: IndexedMesh,
    pub degenerate_normals: Vec<DegenerateNormal>,
}

/// Normal source chosen for one shape
enum ShapeNormals {
    Explicit,
    PerShape(SmoothedNormalTable),
    PerGroup(HashMap<Option<u32>, SmoothedNormalTable>),
}

impl ShapeNormals {
    fn table_for(&self, face: &Face) -> Option<(&SmoothedNormalTable, Option<u32>)> {
        match self {
            Self::Explicit => None,
            Self::PerShape(table) => Some((table, None)),
            Self::PerGroup(tables) => tables
                .get(&face.smoothing_group)
                .map(|table| (table, face.smoothing_group)),
        }
    }
}

/// Builds one [`IndexedMesh`] from a face corpus and its attribute tables
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedMeshBuilder {
    options: BuildOptions,
}

impl IndexedMeshBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the welded mesh
    ///
    /// Fails as a whole on the first malformed face; no partial mesh is returned.
    /// An empty corpus produces an empty mesh.
    pub fn build(&self, corpus: &FaceCorpus, store: &AttributeStore) -> Result<MeshBuild, MeshError> {
        let corner_count = corpus.face_count() * 3;
        let mut welder = VertexWelder::with_capacity(corner_count);
        let mut indices = Vec::with_capacity(corner_count);
        let mut degenerate_normals = Vec::new();

        let mut has_uvs = false;

        for (shape_idx, shape) in corpus.shapes.iter().enumerate() {
            let normals = self.shape_normals(shape, store, &mut degenerate_normals)?;
            let first_vertex = welder.len();

            for (face_idx, face) in shape.faces.iter().enumerate() {
                let smoothed = normals.table_for(face);
                for corner in &face.corners {
                    has_uvs |= corner.uv.is_some();
                    let (key, vertex) = resolve_corner(corner, shape_idx, smoothed, store)
                        .map_err(|reason| MeshError::malformed(&shape.name, face_idx, reason))?;
                    indices.push(welder.weld(key, vertex)?);
                }
            }

            tracing::debug!(
                "Shape '{}': {} faces, {} new vertices",
                shape.name,
                shape.faces.len(),
                welder.len() - first_vertex
            );
        }

        Ok(MeshBuild {
            mesh: IndexedMesh {
                vertices: welder.into_vertices(),
                indices,
                has_uvs,
            },
            degenerate_normals,
        })
    }

    fn shape_normals(
        &self,
        shape: &Shape,
        store: &AttributeStore,
        degenerate: &mut Vec<DegenerateNormal>,
    ) -> Result<ShapeNormals, MeshError> {
        if shape.has_explicit_normals() {
            return Ok(ShapeNormals::Explicit);
        }

        let synth = SmoothingNormalSynthesizer::new(self.options.winding);
        match self.options.smoothing {
            SmoothingMode::PerShape => {
                let table = synth.synthesize(shape, store)?;
                report_degenerate(shape, None, &table, degenerate);
                Ok(ShapeNormals::PerShape(table))
            }
            SmoothingMode::PerGroup => {
                let mut groups: Vec<Option<u32>> = Vec::new();
                for face in &shape.faces {
                    if !groups.contains(&face.smoothing_group) {
                        groups.push(face.smoothing_group);
                    }
                }

                let mut tables = HashMap::with_capacity(groups.len());
                for group in groups {
                    let table = synth.synthesize_group(shape, store, group)?;
                    report_degenerate(shape, group, &table, degenerate);
                    tables.insert(group, table);
                }
                Ok(ShapeNormals::PerGroup(tables))
            }
        }
    }
}

fn report_degenerate(
    shape: &Shape,
    group: Option<u32>,
    table: &SmoothedNormalTable,
    out: &mut Vec<DegenerateNormal>,
) {
    for &position in table.degenerate_positions() {
        tracing::warn!(
            "Degenerate normal in shape '{}' at position {}; using zero vector",
            shape.name,
            position
        );
        out.push(DegenerateNormal {
            shape: shape.name.clone(),
            position,
            group,
        });
    }
}

/// Resolve one corner into its weld key and attribute tuple
fn resolve_corner(
    corner: &FaceCorner,
    shape_idx: usize,
    smoothed: Option<(&SmoothedNormalTable, Option<u32>)>,
    store: &AttributeStore,
) -> Result<(WeldKey, OutputVertex), MalformedReason> {
    let position = store
        .position(corner.position)
        .ok_or(MalformedReason::PositionOutOfRange {
            index: corner.position,
            len: store.positions.len(),
        })?;

    let (normal_key, normal) = match (corner.normal, smoothed) {
        (Some(id), _) => {
            let n = store.normal(id).ok_or(MalformedReason::NormalOutOfRange {
                index: id,
                len: store.normals.len(),
            })?;
            (NormalKey::Explicit(id), Some(n))
        }
        (None, Some((table, group))) => match table.get(corner.position) {
            Some(n) => (
                NormalKey::Smoothed {
                    shape: shape_idx,
                    group,
                },
                Some(n),
            ),
            None => (NormalKey::Absent, None),
        },
        (None, None) => (NormalKey::Absent, None),
    };

    let uv = match corner.uv {
        Some(id) => store.uv(id).ok_or(MalformedReason::UvOutOfRange {
            index: id,
            len: store.uvs.len(),
        })?,
        None => Vec2::ZERO,
    };

    let color: Vec3 = store
        .color(corner.position)
        .ok_or(MalformedReason::ColorOutOfRange {
            index: corner.position,
            len: store.colors.len(),
        })?;

    let key = WeldKey {
        position: corner.position,
        normal: normal_key,
        uv: corner.uv,
    };
    let vertex = OutputVertex {
        position,
        normal,
        uv,
        color,
    };
    Ok((key, vertex))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: u32, b: u32, c: u32) -> Face {
        Face::new([FaceCorner::new(a), FaceCorner::new(b), FaceCorner::new(c)])
    }

    fn square_store() -> AttributeStore {
        AttributeStore {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_corpus_builds_empty_mesh() {
        let build = IndexedMeshBuilder::default()
            .build(&FaceCorpus::default(), &AttributeStore::default())
            .unwrap();
        assert!(build.mesh.is_empty());
        assert!(build.mesh.vertices.is_empty());
        assert!(build.degenerate_normals.is_empty());

        let shapes_without_faces = FaceCorpus::new(vec![Shape::new("a"), Shape::new("b")]);
        let build = IndexedMeshBuilder::default()
            .build(&shapes_without_faces, &square_store())
            .unwrap();
        assert!(build.mesh.is_empty());
    }

    #[test]
    fn test_synthesized_normals_weld_by_position() {
        let corpus = FaceCorpus::new(vec![Shape::with_faces(
            "square",
            vec![tri(0, 1, 2), tri(0, 2, 3)],
        )]);
        let build = IndexedMeshBuilder::default()
            .build(&corpus, &square_store())
            .unwrap();

        assert_eq!(build.mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(build.mesh.vertex_count(), 4);
        for v in &build.mesh.vertices {
            assert!((v.normal.unwrap() - Vec3::Z).length() < 1e-6);
            assert_eq!(v.uv, Vec2::ZERO);
            assert_eq!(v.color, Vec3::ONE);
        }
    }

    #[test]
    fn test_ids_continue_across_shapes() {
        let corpus = FaceCorpus::new(vec![
            Shape::with_faces("first", vec![tri(0, 1, 2)]),
            Shape::with_faces("second", vec![tri(0, 2, 3)]),
        ]);
        let build = IndexedMeshBuilder::default()
            .build(&corpus, &square_store())
            .unwrap();

        // Synthesized normals are scoped to their shape, so nothing is shared
        assert_eq!(build.mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(build.mesh.vertex_count(), 6);
    }

    #[test]
    fn test_shared_position_keeps_each_shapes_own_normal() {
        // "a" lies in the XY plane, "b" in the XZ plane; both touch positions 0 and 1
        let store = AttributeStore {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            ..Default::default()
        };
        let corpus = FaceCorpus::new(vec![
            Shape::with_faces("a", vec![tri(0, 1, 2)]),
            Shape::with_faces("b", vec![tri(0, 3, 1)]),
        ]);
        let mesh = IndexedMeshBuilder::default().build(&corpus, &store).unwrap().mesh;

        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        for &i in &mesh.indices[..3] {
            assert!((mesh.vertices[i as usize].normal.unwrap() - Vec3::Z).length() < 1e-6);
        }
        for &i in &mesh.indices[3..] {
            assert!((mesh.vertices[i as usize].normal.unwrap() - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_explicit_normal_keys_weld_across_shapes() {
        let mut store = square_store();
        store.normals = vec![Vec3::Z];
        let lit = |a: u32, b: u32, c: u32| {
            Face::new([
                FaceCorner::new(a).with_normal(0),
                FaceCorner::new(b).with_normal(0),
                FaceCorner::new(c).with_normal(0),
            ])
        };
        let corpus = FaceCorpus::new(vec![
            Shape::with_faces("first", vec![lit(0, 1, 2)]),
            Shape::with_faces("second", vec![lit(0, 2, 3)]),
        ]);
        let build = IndexedMeshBuilder::default()
            .build(&corpus, &store)
            .unwrap();

        // The weld map persists, so equal explicit keys in a later shape reuse ids
        assert_eq!(build.mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(build.mesh.vertex_count(), 4);
    }

    #[test]
    fn test_small_scale_geometry_keeps_normals() {
        let store = AttributeStore {
            positions: vec![Vec3::ZERO, Vec3::X * 5e-4, Vec3::Y * 5e-4],
            ..Default::default()
        };
        let corpus = FaceCorpus::new(vec![Shape::with_faces("chip", vec![tri(0, 1, 2)])]);
        let build = IndexedMeshBuilder::default().build(&corpus, &store).unwrap();

        assert!(build.degenerate_normals.is_empty());
        for v in &build.mesh.vertices {
            assert!((v.normal.unwrap() - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_coincident_positions_with_distinct_ids_stay_separate() {
        let mut store = square_store();
        store.positions.extend_from_within(0..3);
        let corpus = FaceCorpus::new(vec![
            Shape::with_faces("first", vec![tri(0, 1, 2)]),
            Shape::with_faces("copy", vec![tri(4, 5, 6)]),
        ]);
        let build = IndexedMeshBuilder::default().build(&corpus, &store).unwrap();

        assert_eq!(build.mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(build.mesh.vertices[0], build.mesh.vertices[3]);
    }

    #[test]
    fn test_explicit_normals_shape_leaves_missing_normals_absent() {
        let mut store = square_store();
        store.normals = vec![Vec3::Z];
        let face = Face::new([
            FaceCorner::new(0).with_normal(0),
            FaceCorner::new(1),
            FaceCorner::new(2).with_normal(0),
        ]);
        let corpus = FaceCorpus::new(vec![Shape::with_faces("partial", vec![face])]);

        let build = IndexedMeshBuilder::default().build(&corpus, &store).unwrap();
        let normals: Vec<Option<Vec3>> = build.mesh.vertices.iter().map(|v| v.normal).collect();
        assert_eq!(normals, vec![Some(Vec3::Z), None, Some(Vec3::Z)]);
    }

    #[test]
    fn test_per_group_mode_splits_hard_edges() {
        // Two faces sharing edge 0-1, folded 90 degrees, in different groups
        let store = AttributeStore {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
            ],
            ..Default::default()
        };
        let corpus = FaceCorpus::new(vec![Shape::with_faces(
            "fold",
            vec![
                tri(0, 1, 2).with_smoothing_group(1),
                tri(0, 1, 3).with_smoothing_group(2),
            ],
        )]);

        let shared = IndexedMeshBuilder::default().build(&corpus, &store).unwrap();
        assert_eq!(shared.mesh.vertex_count(), 4);

        let options = BuildOptions {
            smoothing: SmoothingMode::PerGroup,
            ..Default::default()
        };
        let split = IndexedMeshBuilder::new(options).build(&corpus, &store).unwrap();
        assert_eq!(split.mesh.vertex_count(), 6);
        assert_eq!(split.mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert!((split.mesh.vertices[0].normal.unwrap() - Vec3::Z).length() < 1e-6);
        assert!((split.mesh.vertices[3].normal.unwrap() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_out_of_range_uv_aborts_build() {
        let mut store = square_store();
        store.uvs = vec![Vec2::ZERO];
        let face = Face::new([
            FaceCorner::new(0).with_uv(0),
            FaceCorner::new(1).with_uv(4),
            FaceCorner::new(2).with_uv(0),
        ]);
        let corpus = FaceCorpus::new(vec![
            Shape::with_faces("ok", vec![tri(0, 1, 2)]),
            Shape::with_faces("bad", vec![tri(0, 1, 2), face]),
        ]);

        let err = IndexedMeshBuilder::default().build(&corpus, &store).unwrap_err();
        assert_eq!(
            err,
            MeshError::Malformed {
                shape: "bad".into(),
                face: 1,
                reason: MalformedReason::UvOutOfRange {
                    index: AttributeIndex(4),
                    len: 1,
                },
            }
        );
    }

    #[test]
    fn test_short_color_table_is_malformed() {
        let mut store = square_store();
        store.colors = vec![Vec3::X, Vec3::Y];
        let corpus = FaceCorpus::new(vec![Shape::with_faces("tinted", vec![tri(0, 1, 2)])]);

        let err = IndexedMeshBuilder::default().build(&corpus, &store).unwrap_err();
        assert!(matches!(
            err.reason(),
            Some(MalformedReason::ColorOutOfRange { index: AttributeIndex(2), len: 2 })
        ));
    }

    #[test]
    fn test_build_options_from_toml() {
        let options: BuildOptions =
            toml::from_str("winding = \"clockwise\"\nsmoothing = \"per-group\"").unwrap();
        assert_eq!(options.winding, Winding::Clockwise);
        assert_eq!(options.smoothing, SmoothingMode::PerGroup);

        let defaults: BuildOptions = toml::from_str("").unwrap();
        assert_eq!(defaults, BuildOptions::default());
    }
}
