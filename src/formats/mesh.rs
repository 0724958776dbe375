use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::formats::ParserError;
use crate::formats::reader::{read_fixed_string, read_vec3};

pub const FOURCC_MRM: u32 = u32::from_le_bytes(*b"MRM\0");
pub const FOURCC_MMB: u32 = u32::from_le_bytes(*b"MMB\0");

pub const MESH_NAME_LENGTH: usize = 64;

/// One vertex as it is laid out in the compiled mesh files and in the
/// in-memory packed representation. No conversion happens between disk and
/// RAM for these.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PackedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: u32,
}

#[derive(Debug, Clone)]
pub struct SubMeshRange {
    pub texture: String,
    pub index_offset: u32,
    pub index_count: u32,
}

/// The single internal shape every mesh format is normalized into.
#[derive(Debug, Clone, Default)]
pub struct PackedMesh {
    pub vertices: Vec<PackedVertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMeshRange>,
}

#[derive(Debug, Clone)]
pub struct MorphAnimation {
    pub name: String,
    pub frame_count: u32,
    pub fps: f32,
}

pub struct ProgMeshReader {}

impl ProgMeshReader {
    /// Compiled static mesh (`.MRM`).
    pub fn parse_asset<R: Read>(rdr: &mut R) -> Result<PackedMesh, ParserError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != FOURCC_MRM {
            return Err(ParserError::InvalidMagicValue { magic });
        }
        Self::parse_payload(rdr)
    }

    /// Payload after the magic, shared with the morph mesh container which
    /// embeds the same layout.
    fn parse_payload<R: Read>(rdr: &mut R) -> Result<PackedMesh, ParserError> {
        let version = rdr.read_u16::<LittleEndian>()?;
        if version != 1 {
            return Err(ParserError::FormatError {
                reason: "MRM version MUST BE 1",
            });
        }

        let submesh_count = rdr.read_u16::<LittleEndian>()?;
        let vertex_count = rdr.read_u32::<LittleEndian>()?;
        let index_count = rdr.read_u32::<LittleEndian>()?;

        let mut submeshes = Vec::with_capacity(submesh_count as usize);
        for _ in 0..submesh_count {
            let texture = read_fixed_string::<R, MESH_NAME_LENGTH>(rdr)?;
            let index_offset = rdr.read_u32::<LittleEndian>()?;
            let index_count = rdr.read_u32::<LittleEndian>()?;
            submeshes.push(SubMeshRange {
                texture,
                index_offset,
                index_count,
            });
        }

        let mut vertices = Vec::with_capacity(vertex_count as usize);
        for _ in 0..vertex_count {
            vertices.push(PackedVertex {
                position: read_vec3(rdr)?,
                normal: read_vec3(rdr)?,
                uv: [rdr.read_f32::<LittleEndian>()?, rdr.read_f32::<LittleEndian>()?],
                color: rdr.read_u32::<LittleEndian>()?,
            });
        }

        let mut indices = Vec::with_capacity(index_count as usize);
        for _ in 0..index_count {
            indices.push(rdr.read_u32::<LittleEndian>()?);
        }

        Ok(PackedMesh {
            vertices,
            indices,
            submeshes,
        })
    }
}

pub struct MorphMeshReader {}

impl MorphMeshReader {
    /// Morph mesh (`.MMB`): a morph-animation name table followed by an
    /// embedded compiled mesh payload.
    pub fn parse_asset<R: Read>(rdr: &mut R) -> Result<(PackedMesh, Vec<MorphAnimation>), ParserError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != FOURCC_MMB {
            return Err(ParserError::InvalidMagicValue { magic });
        }

        let version = rdr.read_u16::<LittleEndian>()?;
        if version != 1 {
            return Err(ParserError::FormatError {
                reason: "MMB version MUST BE 1",
            });
        }

        let anim_count = rdr.read_u16::<LittleEndian>()?;
        let mut animations = Vec::with_capacity(anim_count as usize);
        for _ in 0..anim_count {
            let name = read_fixed_string::<R, MESH_NAME_LENGTH>(rdr)?;
            let frame_count = rdr.read_u32::<LittleEndian>()?;
            let fps = rdr.read_f32::<LittleEndian>()?;
            animations.push(MorphAnimation {
                name,
                frame_count,
                fps,
            });
        }

        let mesh = ProgMeshReader::parse_payload(rdr)?;
        Ok((mesh, animations))
    }
}
