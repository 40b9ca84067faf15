//! meshweld-export - welded mesh export tool
//!
//! Converts OBJ meshes to indexed (.mwmesh) or flat (.mwflat) vertex buffers

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use meshweld_export::formats::{KIND_FLAT, KIND_INDEXED};
use meshweld_export::{
    ExportConfig, FLAT_MESH_EXT, INDEXED_MESH_EXT, MeshFileHeader, convert_obj_flat,
    convert_obj_indexed, read_flat_shapes, read_indexed_mesh,
};

#[derive(Parser)]
#[command(name = "meshweld-export")]
#[command(about = "Welded mesh export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export an OBJ file as a welded, indexed mesh
    Index {
        /// Input OBJ file
        input: PathBuf,

        /// Output .mwmesh file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to meshweld.toml config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Export an OBJ file as flat per-corner buffers, one per shape
    Flat {
        /// Input OBJ file
        input: PathBuf,

        /// Output .mwflat file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to meshweld.toml config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the contents summary of a .mwmesh or .mwflat file
    Info {
        /// Mesh file to inspect
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            input,
            output,
            config,
        } => {
            let config = ExportConfig::load_or_default(config.as_deref())?;
            let output = output.unwrap_or_else(|| input.with_extension(INDEXED_MESH_EXT));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            convert_obj_indexed(&input, &output, &config)?;
            tracing::info!("Done!");
        }

        Commands::Flat {
            input,
            output,
            config,
        } => {
            let config = ExportConfig::load_or_default(config.as_deref())?;
            let output = output.unwrap_or_else(|| input.with_extension(FLAT_MESH_EXT));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            convert_obj_flat(&input, &output, &config)?;
            tracing::info!("Done!");
        }

        Commands::Info { input } => print_info(&input)?,
    }

    Ok(())
}

fn print_info(path: &Path) -> Result<()> {
    let data = std::fs::read(path)?;
    let header = MeshFileHeader::from_bytes(&data)
        .ok_or_else(|| anyhow::anyhow!("{:?} is not a meshweld file", path))?;

    match header.kind {
        KIND_INDEXED => {
            let mesh = read_indexed_mesh(&data)?;
            println!("indexed mesh");
            println!("  vertices:  {}", mesh.vertices.len());
            println!("  indices:   {}", mesh.indices.len());
            println!("  triangles: {}", mesh.indices.len() / 3);
            println!("  normals:   {}", header.has_normals());
            println!("  uvs:       {}", header.has_uvs());
        }
        KIND_FLAT => {
            let (_, shapes) = read_flat_shapes(&data)?;
            println!("flat mesh: {} shapes, {} corners", shapes.len(), header.vertex_count);
            for shape in &shapes {
                println!("  '{}': {} corners", shape.name, shape.vertices.len());
            }
        }
        kind => anyhow::bail!("Unknown mesh file kind {}", kind),
    }

    Ok(())
}
