use thiserror::Error;

pub mod anim;
pub mod font;
pub mod mesh;
pub mod model;
pub mod pattern;
pub mod tex;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("The file's magic value does not match the expectation {magic}")]
    InvalidMagicValue { magic: u32 },

    #[error("The archive signature does not match the expectation")]
    InvalidSignature,

    #[error("The file is violating the expected format, because: {reason}")]
    FormatError { reason: &'static str },

    /// Represents a failure to read from input, plus all other cases of `std::io::Error`.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UTF8ConversationError(#[from] std::string::FromUtf8Error),
}

pub(crate) mod reader {
    use super::ParserError;
    use std::io::Read;

    /// Fixed-size, NUL-padded name field as used by all entry tables.
    pub fn read_fixed_string<R: Read, const N: usize>(rdr: &mut R) -> Result<String, ParserError> {
        let mut buf = [0u8; N];
        rdr.read_exact(&mut buf)?;
        let len = buf.iter().position(|&c| c == 0).unwrap_or(N);
        Ok(String::from_utf8(buf[..len].to_vec())?)
    }

    pub fn read_vec3<R: Read>(rdr: &mut R) -> Result<[f32; 3], ParserError> {
        use byteorder::{LittleEndian, ReadBytesExt};
        Ok([
            rdr.read_f32::<LittleEndian>()?,
            rdr.read_f32::<LittleEndian>()?,
            rdr.read_f32::<LittleEndian>()?,
        ])
    }
}
