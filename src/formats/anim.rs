use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::formats::ParserError;
use crate::formats::mesh::MESH_NAME_LENGTH;
use crate::formats::reader::{read_fixed_string, read_vec3};

/// Compiled animation script.
pub const FOURCC_MSB: u32 = u32::from_le_bytes(*b"MSB\0");

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimSample {
    pub rotation: [f32; 4],
    pub position: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct AnimSequence {
    pub name: String,
    pub fps: f32,
    pub frame_count: u32,
    pub node_count: u32,
    /// `frame_count * node_count` samples, frame-major.
    pub samples: Vec<AnimSample>,
}

pub struct AnimScriptReader {}

impl AnimScriptReader {
    pub fn parse_asset<R: Read>(rdr: &mut R) -> Result<Vec<AnimSequence>, ParserError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != FOURCC_MSB {
            return Err(ParserError::InvalidMagicValue { magic });
        }

        let version = rdr.read_u16::<LittleEndian>()?;
        if version != 1 {
            return Err(ParserError::FormatError {
                reason: "MSB version MUST BE 1",
            });
        }

        let sequence_count = rdr.read_u16::<LittleEndian>()?;
        let mut sequences = Vec::with_capacity(sequence_count as usize);
        for _ in 0..sequence_count {
            let name = read_fixed_string::<R, MESH_NAME_LENGTH>(rdr)?;
            let fps = rdr.read_f32::<LittleEndian>()?;
            let frame_count = rdr.read_u32::<LittleEndian>()?;
            let node_count = rdr.read_u32::<LittleEndian>()?;

            let sample_count = (frame_count as usize) * (node_count as usize);
            let mut samples = Vec::with_capacity(sample_count);
            for _ in 0..sample_count {
                let rotation = [
                    rdr.read_f32::<LittleEndian>()?,
                    rdr.read_f32::<LittleEndian>()?,
                    rdr.read_f32::<LittleEndian>()?,
                    rdr.read_f32::<LittleEndian>()?,
                ];
                let position = read_vec3(rdr)?;
                samples.push(AnimSample { rotation, position });
            }

            sequences.push(AnimSequence {
                name,
                fps,
                frame_count,
                node_count,
                samples,
            });
        }

        Ok(sequences)
    }
}
