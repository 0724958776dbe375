use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::formats::ParserError;
use crate::formats::mesh::{MESH_NAME_LENGTH, PackedMesh, ProgMeshReader};
use crate::formats::reader::{read_fixed_string, read_vec3};

/// Full model: node hierarchy plus attached meshes.
pub const FOURCC_MDL: u32 = u32::from_le_bytes(*b"MDL\0");
/// Mesh-only compile, hierarchy expected from a `.MDH` sibling.
pub const FOURCC_MDM: u32 = u32::from_le_bytes(*b"MDM\0");
/// Hierarchy-only compile.
pub const FOURCC_MDH: u32 = u32::from_le_bytes(*b"MDH\0");

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    /// Index into the node list, `-1` for roots.
    pub parent: i16,
    pub translation: [f32; 3],
}

/// A packed mesh bound to one node of the hierarchy.
#[derive(Debug, Clone)]
pub struct NodeAttachment {
    pub node_name: String,
    pub mesh: PackedMesh,
}

#[derive(Debug, Clone, Default)]
pub struct ModelLibrary {
    pub nodes: Vec<ModelNode>,
    pub attachments: Vec<NodeAttachment>,
}

impl ModelLibrary {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.attachments.is_empty()
    }

    /// Merges a hierarchy-only library (`.MDH`) into a mesh-only one (`.MDM`).
    pub fn merge_hierarchy(&mut self, hierarchy: ModelLibrary) {
        if self.nodes.is_empty() {
            self.nodes = hierarchy.nodes;
        }
    }
}

pub struct ModelLibReader {}

impl ModelLibReader {
    pub fn parse_library<R: Read>(rdr: &mut R) -> Result<ModelLibrary, ParserError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        let (has_nodes, has_attachments) = match magic {
            FOURCC_MDL => (true, true),
            FOURCC_MDM => (false, true),
            FOURCC_MDH => (true, false),
            _ => return Err(ParserError::InvalidMagicValue { magic }),
        };

        let version = rdr.read_u16::<LittleEndian>()?;
        if version != 1 {
            return Err(ParserError::FormatError {
                reason: "model library version MUST BE 1",
            });
        }

        let node_count = rdr.read_u16::<LittleEndian>()?;
        let attachment_count = rdr.read_u16::<LittleEndian>()?;
        let _reserved = rdr.read_u16::<LittleEndian>()?;

        if !has_nodes && node_count != 0 {
            return Err(ParserError::FormatError {
                reason: "mesh-only library MUST NOT carry nodes",
            });
        }
        if !has_attachments && attachment_count != 0 {
            return Err(ParserError::FormatError {
                reason: "hierarchy-only library MUST NOT carry attachments",
            });
        }

        let mut nodes = Vec::with_capacity(node_count as usize);
        for _ in 0..node_count {
            let name = read_fixed_string::<R, MESH_NAME_LENGTH>(rdr)?;
            let parent = rdr.read_i16::<LittleEndian>()?;
            let translation = read_vec3(rdr)?;
            nodes.push(ModelNode {
                name,
                parent,
                translation,
            });
        }

        let mut attachments = Vec::with_capacity(attachment_count as usize);
        for _ in 0..attachment_count {
            let node_name = read_fixed_string::<R, MESH_NAME_LENGTH>(rdr)?;
            let mesh = ProgMeshReader::parse_asset(rdr)?;
            attachments.push(NodeAttachment { node_name, mesh });
        }

        Ok(ModelLibrary { nodes, attachments })
    }
}
