use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::formats::ParserError;

pub const VFS_COMMENT_LENGTH: u64 = 256;
pub const VFS_SIGNATURE: [u8; 16] = *b"RVFS_V1.00\0\0\0\0\0\0";
pub const VFS_ENTRY_NAME_LENGTH: usize = 64;

/// A single container file. The header carries an embedded build timestamp
/// that the loader uses for priority ordering, followed by a flat entry
/// table of (name, offset, size).
pub struct VfsArchive {
    entries: HashMap<String, VfsEntry>,
    // Seeking mutates the handle, so reads need interior mutability.
    file: Mutex<File>,
    timestamp: i64,
}

#[derive(Debug, Clone, Copy)]
struct VfsEntry {
    offset: u32,
    size: u32,
}

/// Logical names are case-insensitive and stored with backslash separators.
pub fn canonicalize_name(name: &str) -> String {
    name.replace('/', "\\").to_ascii_uppercase()
}

impl VfsArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ParserError> {
        let mut file = File::open(path)?;

        file.seek(SeekFrom::Start(VFS_COMMENT_LENGTH))?;
        let mut signature = [0u8; 16];
        file.read_exact(&mut signature)?;
        if signature != VFS_SIGNATURE {
            return Err(ParserError::InvalidSignature);
        }

        let entry_count = file.read_u32::<LittleEndian>()?;
        let _root_offset = file.read_u32::<LittleEndian>()?;
        let timestamp = file.read_u32::<LittleEndian>()? as i64;
        let _data_size = file.read_u32::<LittleEndian>()?;

        let mut entries = HashMap::with_capacity(entry_count as usize);
        let mut name_buf = [0u8; VFS_ENTRY_NAME_LENGTH];
        for _ in 0..entry_count {
            file.read_exact(&mut name_buf)?;
            let len = name_buf.iter().position(|&c| c == 0).unwrap_or(name_buf.len());
            let name = String::from_utf8(name_buf[..len].to_vec())?;
            let offset = file.read_u32::<LittleEndian>()?;
            let size = file.read_u32::<LittleEndian>()?;
            entries.insert(canonicalize_name(&name), VfsEntry { offset, size });
        }

        Ok(Self {
            entries,
            file: Mutex::new(file),
            timestamp,
        })
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// `name` must already be canonicalized.
    pub fn contains_file(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn read_file(&self, name: &str) -> Result<Vec<u8>, std::io::Error> {
        let entry = self.entries.get(name).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, format!("no entry {}", name))
        })?;

        let mut file = self.file.lock().expect("archive file lock");
        file.seek(SeekFrom::Start(entry.offset as u64))?;
        let mut buf = vec![0u8; entry.size as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Cheap timestamp probe used during archive discovery, before the full
/// entry table is parsed. Any read or signature failure yields the sentinel
/// `-1` so a malformed archive still participates in ordering.
pub fn probe_timestamp(path: &PathBuf) -> i64 {
    fn probe(path: &PathBuf) -> Result<i64, ParserError> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(VFS_COMMENT_LENGTH))?;
        let mut signature = [0u8; 16];
        file.read_exact(&mut signature)?;
        if signature != VFS_SIGNATURE {
            return Err(ParserError::InvalidSignature);
        }
        let _entry_count = file.read_u32::<LittleEndian>()?;
        file.seek(SeekFrom::Current(4))?;
        Ok(file.read_u32::<LittleEndian>()? as i64)
    }

    probe(path).unwrap_or(-1)
}
