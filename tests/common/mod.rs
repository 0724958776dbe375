#![allow(dead_code)] // each test binary uses its own subset of the helpers

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use ravenmoor::gfx::{BindGroupHandle, BufferHandle, BufferUsage, RenderDevice, TextureHandle};
use ravenmoor::io::common::loader::RawAssetLoader;

/// In-memory byte source that counts every archive interaction, so tests
/// can prove when the cache did (or did not) go back to the archives.
pub struct StubLoader {
    files: HashMap<String, Vec<u8>>,
    reads: AtomicUsize,
    probes: AtomicUsize,
    read_log: Mutex<Vec<String>>,
}

impl StubLoader {
    pub fn new(files: &[(&str, Vec<u8>)]) -> Self {
        Self {
            files: files.iter().map(|(name, data)| (name.to_string(), data.clone())).collect(),
            reads: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            read_log: Mutex::new(Vec::new()),
        }
    }

    pub fn io_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst) + self.probes.load(Ordering::SeqCst)
    }

    pub fn read_log(&self) -> Vec<String> {
        self.read_log.lock().unwrap().clone()
    }
}

impl RawAssetLoader for StubLoader {
    fn load_raw_owned(&self, path: &str) -> Option<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.read_log.lock().unwrap().push(path.to_string());
        self.files.get(path).cloned()
    }

    fn exists(&self, path: &str) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.files.contains_key(path)
    }
}

#[derive(Default)]
pub struct StubDevice {
    next: AtomicU64,
}

impl RenderDevice for StubDevice {
    fn create_buffer(&self, _usage: BufferUsage, _data: &[u8]) -> BufferHandle {
        BufferHandle(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn update_buffer(&self, _buffer: BufferHandle, _data: &[u8]) {}

    fn buffer_size(&self, _buffer: BufferHandle) -> u64 {
        0
    }

    fn create_texture_rgba8(&self, _width: u32, _height: u32, _pixels: &[u8]) -> TextureHandle {
        TextureHandle(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn create_bind_group(&self) -> BindGroupHandle {
        BindGroupHandle(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn bind_storage_buffer(&self, _group: BindGroupHandle, _slot: u32, _buffer: BufferHandle) {}
}

/// Uncompressed true-color TGA, top-left origin, 32bpp.
pub fn tga_bytes(width: u16, height: u16, rgba: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; 18];
    buf[2] = 2;
    buf[12..14].copy_from_slice(&width.to_le_bytes());
    buf[14..16].copy_from_slice(&height.to_le_bytes());
    buf[16] = 32;
    buf[17] = 0x28;
    for px in rgba.chunks_exact(4) {
        buf.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
    }
    buf
}

pub fn ctex_bytes(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let mut buf = u32::from_le_bytes(*b"CTEX").to_le_bytes().to_vec();
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&height.to_le_bytes());
    buf.extend_from_slice(rgba);
    buf
}

/// A complete archive image: 256-byte comment, signature, entry count,
/// table offset, timestamp, payload size, entry table, payloads.
pub fn archive_image(timestamp: u32, files: &[(&str, &[u8])]) -> Vec<u8> {
    const NAME_LEN: usize = 64;
    let mut buf = vec![0u8; 256];
    buf.extend_from_slice(b"RVFS_V1.00\0\0\0\0\0\0");
    buf.extend_from_slice(&(files.len() as u32).to_le_bytes());

    let table_start = buf.len() + 4 + 4 + 4;
    let data_start = table_start + files.len() * (NAME_LEN + 8);
    buf.extend_from_slice(&(table_start as u32).to_le_bytes());
    buf.extend_from_slice(&timestamp.to_le_bytes());
    let data_size: usize = files.iter().map(|(_, data)| data.len()).sum();
    buf.extend_from_slice(&(data_size as u32).to_le_bytes());

    let mut offset = data_start;
    for (name, data) in files {
        let mut name_buf = [0u8; NAME_LEN];
        name_buf[..name.len()].copy_from_slice(name.as_bytes());
        buf.extend_from_slice(&name_buf);
        buf.extend_from_slice(&(offset as u32).to_le_bytes());
        buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        offset += data.len();
    }
    for (_, data) in files {
        buf.extend_from_slice(data);
    }
    buf
}
