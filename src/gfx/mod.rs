pub mod wgpu_backend;

/// How many frames may be recorded while earlier ones still execute on the
/// GPU. Everything double-buffered in this crate is sized by this.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Opaque GPU resource handles. The renderer core never interprets them, it
/// only hands them back to the device that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Storage,
    Uniform,
}

/// The GPU abstraction this core consumes. Command recording, pipelines and
/// samplers stay with the caller; the core only creates and fills resources.
pub trait RenderDevice: Send + Sync {
    fn create_buffer(&self, usage: BufferUsage, data: &[u8]) -> BufferHandle;

    /// Byte-exact in-place update. `data` must match the buffer's size;
    /// resizing requires a fresh `create_buffer`.
    fn update_buffer(&self, buffer: BufferHandle, data: &[u8]);

    fn buffer_size(&self, buffer: BufferHandle) -> u64;

    fn create_texture_rgba8(&self, width: u32, height: u32, pixels: &[u8]) -> TextureHandle;

    fn create_bind_group(&self) -> BindGroupHandle;

    /// Re-points `slot` of `group` at `buffer`. Called after a storage
    /// buffer had to be re-created at a new size.
    fn bind_storage_buffer(&self, group: BindGroupHandle, slot: u32, buffer: BufferHandle);
}
