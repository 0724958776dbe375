use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use wgpu::util::DeviceExt;

use crate::gfx::{BindGroupHandle, BufferHandle, BufferUsage, RenderDevice, TextureHandle};

/// `RenderDevice` backed by a wgpu device/queue pair. Bind groups are kept
/// as slot maps here; the outer renderer realizes them against its pipeline
/// layouts when it records draws.
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    buffers: DashMap<BufferHandle, wgpu::Buffer>,
    textures: DashMap<TextureHandle, wgpu::Texture>,
    bind_groups: DashMap<BindGroupHandle, Mutex<HashMap<u32, BufferHandle>>>,
    next_handle: AtomicU64,
}

impl WgpuDevice {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self {
            device,
            queue,
            buffers: DashMap::new(),
            textures: DashMap::new(),
            bind_groups: DashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }

    fn next_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    pub fn buffer(&self, handle: BufferHandle) -> Option<dashmap::mapref::one::Ref<'_, BufferHandle, wgpu::Buffer>> {
        self.buffers.get(&handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<dashmap::mapref::one::Ref<'_, TextureHandle, wgpu::Texture>> {
        self.textures.get(&handle)
    }

    /// The (slot, buffer) entries currently bound into `group`, for the
    /// renderer to build its `wgpu::BindGroup` from.
    pub fn bind_group_entries(&self, group: BindGroupHandle) -> Vec<(u32, BufferHandle)> {
        let Some(entries) = self.bind_groups.get(&group) else {
            return Vec::new();
        };
        let entries = entries.lock().expect("bind group lock");
        let mut list: Vec<(u32, BufferHandle)> = entries.iter().map(|(slot, buffer)| (*slot, *buffer)).collect();
        list.sort_by_key(|(slot, _)| *slot);
        list
    }
}

impl RenderDevice for WgpuDevice {
    fn create_buffer(&self, usage: BufferUsage, data: &[u8]) -> BufferHandle {
        let usage = match usage {
            BufferUsage::Storage => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: None,
            contents: data,
            usage,
        });

        let handle = BufferHandle(self.next_handle());
        self.buffers.insert(handle, buffer);
        handle
    }

    fn update_buffer(&self, buffer: BufferHandle, data: &[u8]) {
        if let Some(buf) = self.buffers.get(&buffer) {
            self.queue.write_buffer(&buf, 0, data);
        }
    }

    fn buffer_size(&self, buffer: BufferHandle) -> u64 {
        self.buffers.get(&buffer).map(|buf| buf.size()).unwrap_or(0)
    }

    fn create_texture_rgba8(&self, width: u32, height: u32, pixels: &[u8]) -> TextureHandle {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let handle = TextureHandle(self.next_handle());
        self.textures.insert(handle, texture);
        handle
    }

    fn create_bind_group(&self) -> BindGroupHandle {
        let handle = BindGroupHandle(self.next_handle());
        self.bind_groups.insert(handle, Mutex::new(HashMap::new()));
        handle
    }

    fn bind_storage_buffer(&self, group: BindGroupHandle, slot: u32, buffer: BufferHandle) {
        if let Some(entries) = self.bind_groups.get(&group) {
            entries.lock().expect("bind group lock").insert(slot, buffer);
        }
    }
}
