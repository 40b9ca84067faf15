//! Binary mesh file formats (.mwmesh, .mwflat)
//!
//! Indexed file layout:
//! - `MeshFileHeader` (16 bytes, kind = indexed)
//! - `vertex_count` × `GpuVertex` (44 bytes each)
//! - `index_count` × u32 LE
//!
//! Flat file layout:
//! - `MeshFileHeader` (kind = flat, vertex_count = total corners, index_count = 0)
//! - u32 LE shape count
//! - per shape: u32 LE name length, UTF-8 name, u32 LE corner count,
//!   flags u8 + 3 padding bytes, corner count × `GpuVertex`
//!
//! All multi-byte values are little-endian.

use anyhow::{Context, Result, bail, ensure};
use bytemuck::{Pod, Zeroable};
use meshweld_core::{FlatShape, IndexedMesh, OutputVertex};
use std::io::Write;

/// File magic
pub const MESH_MAGIC: [u8; 4] = *b"MWLD";
/// Current format version
pub const MESH_VERSION: u8 = 1;

/// Default extension for indexed mesh files
pub const INDEXED_MESH_EXT: &str = "mwmesh";
/// Default extension for flat mesh files
pub const FLAT_MESH_EXT: &str = "mwflat";

/// File kind: welded vertices plus index buffer
pub const KIND_INDEXED: u8 = 0;
/// File kind: per-shape, per-corner vertices
pub const KIND_FLAT: u8 = 1;

/// Flag: vertices carry meaningful normals
pub const FLAG_NORMALS: u8 = 1;
/// Flag: vertices carry meaningful texture coordinates
pub const FLAG_UVS: u8 = 2;

/// Mesh file header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct MeshFileHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub kind: u8,
    pub flags: u8,
    pub _padding: u8,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl MeshFileHeader {
    pub const SIZE: usize = 16;

    pub fn new(kind: u8, flags: u8, vertex_count: u32, index_count: u32) -> Self {
        Self {
            magic: MESH_MAGIC,
            version: MESH_VERSION,
            kind,
            flags,
            _padding: 0,
            vertex_count,
            index_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes[5] = self.kind;
        bytes[6] = self.flags;
        // padding byte stays 0
        bytes[8..12].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.index_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE || bytes[0..4] != MESH_MAGIC {
            return None;
        }
        Some(Self {
            magic: MESH_MAGIC,
            version: bytes[4],
            kind: bytes[5],
            flags: bytes[6],
            _padding: 0,
            vertex_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            index_count: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }

    pub fn has_normals(&self) -> bool {
        self.flags & FLAG_NORMALS != 0
    }

    pub fn has_uvs(&self) -> bool {
        self.flags & FLAG_UVS != 0
    }
}

/// Vertex record as stored on disk and uploaded to the GPU
///
/// Layout: position f32×3, normal f32×3, uv f32×2, color f32×3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
}

impl GpuVertex {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

impl From<&OutputVertex> for GpuVertex {
    fn from(v: &OutputVertex) -> Self {
        Self {
            position: v.position.to_array(),
            normal: v.normal.unwrap_or_default().to_array(),
            uv: v.uv.to_array(),
            color: v.color.to_array(),
        }
    }
}

/// Decoded indexed mesh file
#[derive(Debug, Clone)]
pub struct DecodedMesh {
    pub header: MeshFileHeader,
    pub vertices: Vec<GpuVertex>,
    pub indices: Vec<u32>,
}

/// Decoded shape of a flat mesh file
#[derive(Debug, Clone)]
pub struct DecodedFlatShape {
    pub name: String,
    pub flags: u8,
    pub vertices: Vec<GpuVertex>,
}

/// Write a complete indexed mesh file
pub fn write_indexed_mesh<W: Write>(w: &mut W, mesh: &IndexedMesh) -> Result<()> {
    let vertex_count = u32::try_from(mesh.vertices.len()).context("Too many vertices")?;
    let index_count = u32::try_from(mesh.indices.len()).context("Too many indices")?;

    let mut flags = 0;
    if mesh.has_normals() {
        flags |= FLAG_NORMALS;
    }
    if mesh.has_uvs {
        flags |= FLAG_UVS;
    }

    let header = MeshFileHeader::new(KIND_INDEXED, flags, vertex_count, index_count);
    w.write_all(&header.to_bytes())?;

    let records: Vec<GpuVertex> = mesh.vertices.iter().map(GpuVertex::from).collect();
    w.write_all(bytemuck::cast_slice(&records))?;

    for i in &mesh.indices {
        w.write_all(&i.to_le_bytes())?;
    }

    Ok(())
}

/// Read an indexed mesh file written by [`write_indexed_mesh`]
pub fn read_indexed_mesh(bytes: &[u8]) -> Result<DecodedMesh> {
    let header = MeshFileHeader::from_bytes(bytes).context("Not a meshweld file (bad magic)")?;
    ensure!(
        header.version == MESH_VERSION,
        "Unsupported mesh file version {}",
        header.version
    );
    ensure!(
        header.kind == KIND_INDEXED,
        "Expected an indexed mesh file, found kind {}",
        header.kind
    );

    let mut reader = ByteReader::new(&bytes[MeshFileHeader::SIZE..]);
    let vertices = reader.vertices(header.vertex_count as usize)?;
    let indices = (0..header.index_count)
        .map(|_| reader.u32())
        .collect::<Result<Vec<_>>>()?;

    Ok(DecodedMesh {
        header,
        vertices,
        indices,
    })
}

/// Write a complete flat mesh file
pub fn write_flat_shapes<W: Write>(w: &mut W, shapes: &[FlatShape]) -> Result<()> {
    let total: usize = shapes.iter().map(FlatShape::corner_count).sum();
    let total = u32::try_from(total).context("Too many corners")?;
    let all_flags = shapes.iter().fold(0, |acc, s| acc | flat_flags(s));

    let header = MeshFileHeader::new(KIND_FLAT, all_flags, total, 0);
    w.write_all(&header.to_bytes())?;
    w.write_all(&(shapes.len() as u32).to_le_bytes())?;

    for shape in shapes {
        let name = shape.name.as_bytes();
        w.write_all(&(name.len() as u32).to_le_bytes())?;
        w.write_all(name)?;
        w.write_all(&(shape.corner_count() as u32).to_le_bytes())?;
        w.write_all(&[flat_flags(shape), 0, 0, 0])?;

        let records: Vec<GpuVertex> = (0..shape.corner_count())
            .map(|i| GpuVertex {
                position: shape.positions[i].to_array(),
                normal: shape.normals.get(i).copied().unwrap_or_default().to_array(),
                uv: shape.uvs.get(i).copied().unwrap_or_default().to_array(),
                color: shape.colors[i].to_array(),
            })
            .collect();
        w.write_all(bytemuck::cast_slice(&records))?;
    }

    Ok(())
}

/// Read a flat mesh file written by [`write_flat_shapes`]
pub fn read_flat_shapes(bytes: &[u8]) -> Result<(MeshFileHeader, Vec<DecodedFlatShape>)> {
    let header = MeshFileHeader::from_bytes(bytes).context("Not a meshweld file (bad magic)")?;
    ensure!(
        header.version == MESH_VERSION,
        "Unsupported mesh file version {}",
        header.version
    );
    ensure!(
        header.kind == KIND_FLAT,
        "Expected a flat mesh file, found kind {}",
        header.kind
    );

    let mut reader = ByteReader::new(&bytes[MeshFileHeader::SIZE..]);
    let count = reader.u32()?;
    // The count is untrusted; each shape needs at least its fixed-size fields
    let capacity = (count as usize).min(reader.remaining() / MIN_FLAT_SHAPE_SIZE);
    let mut shapes = Vec::with_capacity(capacity);
    for _ in 0..count {
        let name_len = reader.u32()? as usize;
        let name = String::from_utf8(reader.take(name_len)?.to_vec())
            .context("Shape name is not UTF-8")?;
        let corners = reader.u32()? as usize;
        let flags = reader.take(4)?[0];
        let vertices = reader.vertices(corners)?;
        shapes.push(DecodedFlatShape {
            name,
            flags,
            vertices,
        });
    }

    Ok((header, shapes))
}

/// Name length + corner count + flags, for a shape with an empty name and no corners
const MIN_FLAT_SHAPE_SIZE: usize = 12;

fn flat_flags(shape: &FlatShape) -> u8 {
    let mut flags = 0;
    if !shape.normals.is_empty() {
        flags |= FLAG_NORMALS;
    }
    if !shape.uvs.is_empty() {
        flags |= FLAG_UVS;
    }
    flags
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            bail!(
                "Mesh file truncated: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            );
        }
        let end = self.pos + len;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn vertices(&mut self, count: usize) -> Result<Vec<GpuVertex>> {
        let len = count
            .checked_mul(GpuVertex::SIZE)
            .context("Mesh file vertex count overflows")?;
        let bytes = self.take(len)?;
        Ok(bytes
            .chunks_exact(GpuVertex::SIZE)
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn sample_mesh() -> IndexedMesh {
        IndexedMesh {
            vertices: vec![
                OutputVertex {
                    position: Vec3::ZERO,
                    normal: Some(Vec3::Z),
                    uv: Vec2::new(0.0, 1.0),
                    color: Vec3::ONE,
                },
                OutputVertex {
                    position: Vec3::X,
                    normal: None,
                    uv: Vec2::ZERO,
                    color: Vec3::new(1.0, 0.0, 0.0),
                },
                OutputVertex {
                    position: Vec3::Y,
                    normal: Some(Vec3::Z),
                    uv: Vec2::ONE,
                    color: Vec3::ONE,
                },
            ],
            indices: vec![0, 1, 2, 2, 1, 0],
            has_uvs: true,
        }
    }

    #[test]
    fn test_gpu_vertex_size() {
        assert_eq!(GpuVertex::SIZE, 44);
    }

    #[test]
    fn test_header_bytes() {
        let header = MeshFileHeader::new(KIND_INDEXED, FLAG_NORMALS, 7, 9);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"MWLD");
        assert_eq!(MeshFileHeader::from_bytes(&bytes), Some(header));
        assert!(header.has_normals());
        assert!(!header.has_uvs());

        assert_eq!(MeshFileHeader::from_bytes(&bytes[..8]), None);
        assert_eq!(MeshFileHeader::from_bytes(&[0u8; 16]), None);
    }

    #[test]
    fn test_indexed_file_layout() {
        let mesh = sample_mesh();
        let mut data = Vec::new();
        write_indexed_mesh(&mut data, &mesh).unwrap();

        assert_eq!(
            data.len(),
            MeshFileHeader::SIZE + 3 * GpuVertex::SIZE + 6 * 4
        );

        let decoded = read_indexed_mesh(&data).unwrap();
        assert_eq!(decoded.header.vertex_count, 3);
        assert_eq!(decoded.header.index_count, 6);
        assert!(decoded.header.has_normals());
        assert!(decoded.header.has_uvs());
        assert_eq!(decoded.indices, mesh.indices);
        // Absent normal is stored as zero
        assert_eq!(decoded.vertices[1].normal, [0.0; 3]);
        assert_eq!(decoded.vertices[1].color, [1.0, 0.0, 0.0]);
        assert_eq!(decoded.vertices[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_empty_mesh_file() {
        let mut data = Vec::new();
        write_indexed_mesh(&mut data, &IndexedMesh::default()).unwrap();
        assert_eq!(data.len(), MeshFileHeader::SIZE);

        let decoded = read_indexed_mesh(&data).unwrap();
        assert!(decoded.vertices.is_empty());
        assert!(decoded.indices.is_empty());
        assert_eq!(decoded.header.flags, 0);
    }

    #[test]
    fn test_truncated_file_is_an_error() {
        let mut data = Vec::new();
        write_indexed_mesh(&mut data, &sample_mesh()).unwrap();
        data.truncate(data.len() - 2);

        let err = read_indexed_mesh(&data).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_flat_file_layout() {
        let shapes = vec![
            FlatShape {
                name: "lit".into(),
                positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                normals: vec![Vec3::Z; 3],
                uvs: Vec::new(),
                colors: vec![Vec3::ONE; 3],
            },
            FlatShape {
                name: "plain".into(),
                positions: vec![Vec3::Y, Vec3::X, Vec3::ZERO],
                normals: Vec::new(),
                uvs: Vec::new(),
                colors: vec![Vec3::ONE; 3],
            },
        ];
        let mut data = Vec::new();
        write_flat_shapes(&mut data, &shapes).unwrap();

        let (header, decoded) = read_flat_shapes(&data).unwrap();
        assert_eq!(header.kind, KIND_FLAT);
        assert_eq!(header.vertex_count, 6);
        assert_eq!(header.flags, FLAG_NORMALS);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].name, "lit");
        assert_eq!(decoded[0].flags, FLAG_NORMALS);
        assert_eq!(decoded[1].flags, 0);
        assert_eq!(decoded[1].vertices[0].position, [0.0, 1.0, 0.0]);

        assert!(read_indexed_mesh(&data).is_err());
    }

    #[test]
    fn test_uv_flag_follows_supplied_uvs() {
        // Supplied uvs that all happen to be (0, 0) still set the flag
        let mut mesh = sample_mesh();
        for v in &mut mesh.vertices {
            v.uv = Vec2::ZERO;
        }
        let mut data = Vec::new();
        write_indexed_mesh(&mut data, &mesh).unwrap();
        assert!(read_indexed_mesh(&data).unwrap().header.has_uvs());

        mesh.has_uvs = false;
        let mut data = Vec::new();
        write_indexed_mesh(&mut data, &mesh).unwrap();
        assert!(!read_indexed_mesh(&data).unwrap().header.has_uvs());
    }

    #[test]
    fn test_corrupt_shape_count_is_truncation_error() {
        let mut data = MeshFileHeader::new(KIND_FLAT, 0, 0, 0).to_bytes().to_vec();
        data.extend_from_slice(&u32::MAX.to_le_bytes());

        let err = read_flat_shapes(&data).unwrap_err();
        assert!(err.to_string().contains("truncated"), "{}", err);

        // Huge corner count inside an otherwise valid shape record
        let mut data = MeshFileHeader::new(KIND_FLAT, 0, 0, 0).to_bytes().to_vec();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        assert!(read_flat_shapes(&data).unwrap_err().to_string().contains("truncated"));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let mut data = Vec::new();
        write_flat_shapes(&mut data, &[]).unwrap();
        assert!(read_flat_shapes(&data).is_ok());

        data[4] = MESH_VERSION + 1;
        let err = read_flat_shapes(&data).unwrap_err();
        assert!(err.to_string().contains("Unsupported mesh file version"));

        let mut data = Vec::new();
        write_indexed_mesh(&mut data, &sample_mesh()).unwrap();
        data[4] = MESH_VERSION + 1;
        assert!(read_indexed_mesh(&data).is_err());
    }
}
