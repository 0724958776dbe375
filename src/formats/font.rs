use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::formats::ParserError;

pub const FOURCC_FNT: u32 = u32::from_le_bytes(*b"FNT\0");

pub const GLYPH_COUNT: usize = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct Glyph {
    pub width: u8,
    pub uv0: [f32; 2],
    pub uv1: [f32; 2],
}

/// One code page of fixed-height glyphs addressing into the companion
/// texture atlas.
#[derive(Debug, Clone)]
pub struct FontFile {
    pub glyph_height: u32,
    pub glyphs: Vec<Glyph>,
}

pub struct FontReader {}

impl FontReader {
    pub fn parse_asset<R: Read>(rdr: &mut R) -> Result<FontFile, ParserError> {
        let magic = rdr.read_u32::<LittleEndian>()?;
        if magic != FOURCC_FNT {
            return Err(ParserError::InvalidMagicValue { magic });
        }

        let version = rdr.read_u16::<LittleEndian>()?;
        if version != 1 {
            return Err(ParserError::FormatError {
                reason: "FNT version MUST BE 1",
            });
        }

        let glyph_height = rdr.read_u32::<LittleEndian>()?;

        let mut widths = [0u8; GLYPH_COUNT];
        rdr.read_exact(&mut widths)?;

        let mut glyphs = Vec::with_capacity(GLYPH_COUNT);
        for width in widths {
            glyphs.push(Glyph {
                width,
                ..Default::default()
            });
        }
        for glyph in glyphs.iter_mut() {
            glyph.uv0 = [rdr.read_f32::<LittleEndian>()?, rdr.read_f32::<LittleEndian>()?];
        }
        for glyph in glyphs.iter_mut() {
            glyph.uv1 = [rdr.read_f32::<LittleEndian>()?, rdr.read_f32::<LittleEndian>()?];
        }

        Ok(FontFile { glyph_height, glyphs })
    }
}
