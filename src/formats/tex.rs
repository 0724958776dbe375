use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::formats::ParserError;

pub const FOURCC_CTEX: u32 = u32::from_le_bytes(*b"CTEX");

/// Pixel formats a compiled texture may carry. Everything is expanded to
/// RGBA8 on decode so the device collaborator only ever sees one layout.
const FORMAT_RGBA8: u16 = 0;
const FORMAT_BGRA8: u16 = 1;

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub struct CtexReader {}

impl CtexReader {
    /// Parses the compiled texture container (the `-C.TEX` sibling of a raw
    /// `.TGA` source) into a ready-to-upload image.
    pub fn parse_asset<R: Read>(rdr: &mut R) -> Result<DecodedImage, ParserError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != FOURCC_CTEX {
            return Err(ParserError::InvalidMagicValue { magic });
        }

        let version = rdr.read_u16::<LittleEndian>()?;
        if version != 1 {
            return Err(ParserError::FormatError {
                reason: "CTEX version MUST BE 1",
            });
        }

        let format = rdr.read_u16::<LittleEndian>()?;
        let width = rdr.read_u32::<LittleEndian>()?;
        let height = rdr.read_u32::<LittleEndian>()?;
        if width == 0 || height == 0 {
            return Err(ParserError::FormatError {
                reason: "CTEX dimensions must be non-zero",
            });
        }

        let mut rgba = vec![0u8; (width * height * 4) as usize];
        rdr.read_exact(&mut rgba)?;

        match format {
            FORMAT_RGBA8 => (),
            FORMAT_BGRA8 => {
                for px in rgba.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
            }
            _ => {
                return Err(ParserError::FormatError {
                    reason: "unknown CTEX pixel format",
                });
            }
        }

        Ok(DecodedImage { width, height, rgba })
    }
}
