//! OBJ -> mesh file conversion

use anyhow::{Context, Result};
use meshweld_core::{IndexedMeshBuilder, MeshBuild, export_flat};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::config::ExportConfig;
use crate::formats::{write_flat_shapes, write_indexed_mesh};
use crate::obj::{ObjModel, load_obj};

/// Totals reported after a conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub shapes: usize,
    pub faces: usize,
    pub vertices: usize,
    pub indices: usize,
    pub degenerate_normals: usize,
}

fn load(input: &Path, config: &ExportConfig) -> Result<ObjModel> {
    load_obj(input, &config.parse).with_context(|| format!("Failed to load OBJ: {:?}", input))
}

/// Parse and weld an OBJ file in memory
pub fn convert_obj_to_memory(input: &Path, config: &ExportConfig) -> Result<MeshBuild> {
    let model = load(input, config)?;
    let build = IndexedMeshBuilder::new(config.build)
        .build(&model.corpus, &model.store)
        .with_context(|| format!("Failed to build mesh from {:?}", input))?;
    Ok(build)
}

/// Convert an OBJ file to an indexed mesh file
pub fn convert_obj_indexed(input: &Path, output: &Path, config: &ExportConfig) -> Result<ExportSummary> {
    let model = load(input, config)?;
    let build = IndexedMeshBuilder::new(config.build)
        .build(&model.corpus, &model.store)
        .with_context(|| format!("Failed to build mesh from {:?}", input))?;

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_indexed_mesh(&mut writer, &build.mesh)?;

    let summary = ExportSummary {
        shapes: model.corpus.shapes.len(),
        faces: model.corpus.face_count(),
        vertices: build.mesh.vertex_count(),
        indices: build.mesh.indices.len(),
        degenerate_normals: build.degenerate_normals.len(),
    };
    tracing::info!(
        "Converted OBJ mesh: {} shapes, {} faces -> {} vertices, {} indices",
        summary.shapes,
        summary.faces,
        summary.vertices,
        summary.indices
    );
    if summary.degenerate_normals > 0 {
        tracing::warn!(
            "{} positions received zero normals (degenerate geometry)",
            summary.degenerate_normals
        );
    }

    Ok(summary)
}

/// Convert an OBJ file to a flat (non-indexed) mesh file
pub fn convert_obj_flat(input: &Path, output: &Path, config: &ExportConfig) -> Result<ExportSummary> {
    let model = load(input, config)?;
    let shapes = export_flat(&model.corpus, &model.store)
        .with_context(|| format!("Failed to export flat mesh from {:?}", input))?;

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_flat_shapes(&mut writer, &shapes)?;

    let corners: usize = shapes.iter().map(|s| s.corner_count()).sum();
    let summary = ExportSummary {
        shapes: shapes.len(),
        faces: model.corpus.face_count(),
        vertices: corners,
        indices: 0,
        degenerate_normals: 0,
    };
    tracing::info!(
        "Converted OBJ mesh (flat): {} shapes, {} corners",
        summary.shapes,
        summary.vertices
    );

    Ok(summary)
}
