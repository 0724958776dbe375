use std::sync::{Arc, Mutex};

use encase::ShaderType;
use glam::{Mat4, Vec3, Vec4};

use crate::gfx::{BindGroupHandle, BufferHandle, BufferUsage, MAX_FRAMES_IN_FLIGHT, RenderDevice};
use crate::lights::source::LightSource;
use crate::math::frustum::Frustum;

pub mod source;

/// Slot of the light storage buffer inside each pool's per-frame bind group.
/// Slots 0..=3 hold the g-buffer attachments and the frame uniform, owned by
/// the renderer.
pub const LIGHT_SSBO_SLOT: u32 = 4;

/// One element of the GPU light buffer. Field order and sizes match the
/// shader-side struct; encase produces the padded layout on serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, ShaderType)]
pub struct LightSsbo {
    pub pos: Vec3,
    pub range: f32,
    pub color: Vec3,
}

#[derive(ShaderType)]
struct LightGroupUbo {
    mvp: Mat4,
    mvp_inv: Mat4,
    frustum: [Vec4; 6],
}

impl LightGroupUbo {
    fn new(view_project: Mat4) -> Self {
        Self {
            mvp: view_project,
            mvp_inv: view_project.inverse(),
            frustum: Frustum::from_matrix(view_project).planes,
        }
    }
}

/// Static lights share a GPU buffer that is rebuilt rarely; dynamic lights
/// (attached to moving or animated entities) churn every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightPool {
    Static,
    Dynamic,
}

/// Stable address of one light slot: the owning pool plus the index into
/// that pool's parallel arrays. Valid until the slot is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightId {
    pool: LightPool,
    index: u32,
}

impl LightId {
    pub fn new(pool: LightPool, index: u32) -> Self {
        Self { pool, index }
    }

    pub fn pool(&self) -> LightPool {
        self.pool
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Parallel arrays of GPU-mirror and behavior records plus the free list
/// and the per-frame-in-flight upload state.
struct LightBucket {
    data: Vec<LightSsbo>,
    light: Vec<LightSource>,
    free_list: Vec<usize>,
    updated: [bool; MAX_FRAMES_IN_FLIGHT],
    ssbo: [Option<BufferHandle>; MAX_FRAMES_IN_FLIGHT],
    bind: [BindGroupHandle; MAX_FRAMES_IN_FLIGHT],
}

impl LightBucket {
    fn new(device: &dyn RenderDevice) -> Self {
        Self {
            data: Vec::new(),
            light: Vec::new(),
            free_list: Vec::new(),
            updated: [false; MAX_FRAMES_IN_FLIGHT],
            ssbo: [None; MAX_FRAMES_IN_FLIGHT],
            bind: std::array::from_fn(|_| device.create_bind_group()),
        }
    }

    /// Reuses the most recently freed index, else grows both arrays. Every
    /// frame slot is forced to re-upload the whole pool.
    fn alloc(&mut self) -> usize {
        for updated in self.updated.iter_mut() {
            *updated = false;
        }
        if let Some(index) = self.free_list.pop() {
            return index;
        }
        self.data.push(LightSsbo::default());
        self.light.push(LightSource::default());
        self.data.len() - 1
    }

    fn free(&mut self, index: usize) {
        debug_assert!(index < self.data.len(), "free of out-of-range light slot");
        debug_assert!(!self.free_list.contains(&index), "double free of light slot");

        for updated in self.updated.iter_mut() {
            *updated = false;
        }
        if index + 1 == self.data.len() {
            self.data.pop();
            self.light.pop();
        } else {
            self.free_list.push(index);
        }
    }

    fn invalidate(&mut self) {
        for updated in self.updated.iter_mut() {
            *updated = false;
        }
    }
}

struct LightBuckets {
    bucket_static: LightBucket,
    bucket_dynamic: LightBucket,
}

impl LightBuckets {
    fn bucket_mut(&mut self, pool: LightPool) -> &mut LightBucket {
        match pool {
            LightPool::Static => &mut self.bucket_static,
            LightPool::Dynamic => &mut self.bucket_dynamic,
        }
    }

    fn bucket(&self, pool: LightPool) -> &LightBucket {
        match pool {
            LightPool::Static => &self.bucket_static,
            LightPool::Dynamic => &self.bucket_dynamic,
        }
    }
}

/// All point lights of a scene, packed into one GPU buffer per pool,
/// double-buffered across the frames in flight.
pub struct LightGroup {
    device: Arc<dyn RenderDevice>,
    buckets: Mutex<LightBuckets>,
    ubo: [BufferHandle; MAX_FRAMES_IN_FLIGHT],
}

impl LightGroup {
    pub fn new(device: Arc<dyn RenderDevice>) -> Self {
        let ubo_bytes = serialize_ubo(&LightGroupUbo::new(Mat4::IDENTITY));
        let ubo = std::array::from_fn(|_| device.create_buffer(BufferUsage::Uniform, &ubo_bytes));
        let buckets = LightBuckets {
            bucket_static: LightBucket::new(device.as_ref()),
            bucket_dynamic: LightBucket::new(device.as_ref()),
        };
        Self {
            device,
            buckets: Mutex::new(buckets),
            ubo,
        }
    }

    pub(crate) fn alloc(&self, pool: LightPool, source: LightSource) -> LightId {
        let mut buckets = self.lock();
        let bucket = buckets.bucket_mut(pool);
        let index = bucket.alloc();
        bucket.data[index] = LightSsbo {
            pos: source.position(),
            range: source.current_range(),
            color: source.current_color(),
        };
        bucket.light[index] = source;
        LightId::new(pool, index as u32)
    }

    pub(crate) fn free(&self, id: LightId) {
        let mut buckets = self.lock();
        buckets.bucket_mut(id.pool()).free(id.index() as usize);
    }

    /// Mutates both records of one slot in a single critical section, and
    /// marks the pool for re-upload.
    pub(crate) fn with_slot(&self, id: LightId, f: impl FnOnce(&mut LightSsbo, &mut LightSource)) {
        let mut buckets = self.lock();
        let bucket = buckets.bucket_mut(id.pool());
        bucket.invalidate();
        let index = id.index() as usize;
        let (data, light) = (&mut bucket.data[index], &mut bucket.light[index]);
        f(data, light);
    }

    pub fn light_count(&self, pool: LightPool) -> usize {
        self.lock().bucket(pool).data.len()
    }

    /// Advances keyframe animation of every dynamic light and refreshes the
    /// GPU mirror records.
    pub fn tick(&self, time_ms: u64) {
        let mut buckets = self.lock();
        let bucket = &mut buckets.bucket_dynamic;
        if bucket.light.is_empty() {
            return;
        }

        for (light, data) in bucket.light.iter_mut().zip(bucket.data.iter_mut()) {
            light.update(time_ms);
            data.pos = light.position();
            data.range = light.current_range();
            data.color = light.current_color();
        }
        bucket.invalidate();
    }

    /// Reconciles the CPU mirrors with the GPU buffers of `frame`. Pools
    /// already up to date for this frame slot are skipped; a size change
    /// re-creates the buffer and re-binds it, otherwise the contents are
    /// patched in place. The per-frame globals are refreshed
    /// unconditionally.
    pub fn prepare_frame(&self, frame: usize, view_project: Mat4) {
        assert!(frame < MAX_FRAMES_IN_FLIGHT);

        let mut buckets = self.lock();
        for pool in [LightPool::Static, LightPool::Dynamic] {
            let bucket = buckets.bucket_mut(pool);
            if bucket.updated[frame] {
                continue;
            }
            bucket.updated[frame] = true;

            let bytes = serialize_ssbo(&bucket.data);
            match bucket.ssbo[frame] {
                Some(buffer) if self.device.buffer_size(buffer) == bytes.len() as u64 => {
                    self.device.update_buffer(buffer, &bytes);
                }
                _ => {
                    let buffer = self.device.create_buffer(BufferUsage::Storage, &bytes);
                    bucket.ssbo[frame] = Some(buffer);
                    self.device.bind_storage_buffer(bucket.bind[frame], LIGHT_SSBO_SLOT, buffer);
                }
            }
        }
        drop(buckets);

        let bytes = serialize_ubo(&LightGroupUbo::new(view_project));
        self.device.update_buffer(self.ubo[frame], &bytes);
    }

    pub fn bind_group(&self, pool: LightPool, frame: usize) -> BindGroupHandle {
        self.lock().bucket(pool).bind[frame]
    }

    pub fn ubo_buffer(&self, frame: usize) -> BufferHandle {
        self.ubo[frame]
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LightBuckets> {
        self.buckets.lock().expect("light group lock")
    }
}

fn serialize_ssbo(data: &Vec<LightSsbo>) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let mut buffer = encase::StorageBuffer::new(Vec::new());
    buffer.write(data).expect("light buffer serialization");
    buffer.into_inner()
}

fn serialize_ubo(ubo: &LightGroupUbo) -> Vec<u8> {
    let mut buffer = encase::UniformBuffer::new(Vec::new());
    buffer.write(ubo).expect("light ubo serialization");
    buffer.into_inner()
}

/// Everything needed to place one light: static values plus optional
/// keyframe animation for range and color.
#[derive(Debug, Clone, Default)]
pub struct LightDescription {
    pub position: Vec3,
    pub range: f32,
    pub range_anim_scale: Vec<f32>,
    pub range_anim_fps: f32,
    pub range_anim_smooth: bool,
    pub color: Vec3,
    pub color_anim_list: Vec<Vec3>,
    pub color_anim_fps: f32,
    pub color_anim_smooth: bool,
    /// World-placed lights that never move may share the static pool.
    pub is_static: bool,
}

impl LightDescription {
    /// Colors arrive from world data as packed `0x00RRGGBB` integers.
    pub fn set_packed_color(&mut self, color: i32) {
        self.color = crate::util::int_as_color(color).truncate();
    }

    pub fn set_packed_color_anim(&mut self, colors: &[i32], fps: f32, smooth: bool) {
        self.color_anim_list = colors
            .iter()
            .map(|&c| crate::util::int_as_color(c).truncate())
            .collect();
        self.color_anim_fps = fps;
        self.color_anim_smooth = smooth;
    }
}

/// Owning handle of one light slot. Move-only; dropping it (or calling
/// [`Light::release`]) frees the slot for reuse. A released or
/// default-constructed handle ignores all mutations.
#[derive(Default)]
pub struct Light {
    owner: Option<Arc<LightGroup>>,
    id: Option<LightId>,
}

impl Light {
    pub fn new(owner: &Arc<LightGroup>, desc: &LightDescription) -> Self {
        let mut source = LightSource::default();
        source.set_position(desc.position);
        if desc.range_anim_scale.is_empty() {
            source.set_range(desc.range);
        } else {
            source.set_range_anim(
                desc.range_anim_scale.clone(),
                desc.range,
                desc.range_anim_fps,
                desc.range_anim_smooth,
            );
        }
        if desc.color_anim_list.is_empty() {
            source.set_color(desc.color);
        } else {
            source.set_color_anim(desc.color_anim_list.clone(), desc.color_anim_fps, desc.color_anim_smooth);
        }

        let pool = if desc.is_static && !source.is_dynamic() {
            LightPool::Static
        } else {
            LightPool::Dynamic
        };
        let id = owner.alloc(pool, source);
        Self {
            owner: Some(owner.clone()),
            id: Some(id),
        }
    }

    /// A blank dynamic light, to be positioned through the mutators.
    pub fn dynamic(owner: &Arc<LightGroup>) -> Self {
        let id = owner.alloc(LightPool::Dynamic, LightSource::default());
        Self {
            owner: Some(owner.clone()),
            id: Some(id),
        }
    }

    pub fn id(&self) -> Option<LightId> {
        self.id
    }

    pub fn set_position(&self, p: Vec3) {
        let Some((owner, id)) = self.owner.as_ref().zip(self.id) else {
            return;
        };
        owner.with_slot(id, |data, light| {
            data.pos = p;
            light.set_position(p);
        });
    }

    pub fn set_range(&self, range: f32) {
        let Some((owner, id)) = self.owner.as_ref().zip(self.id) else {
            return;
        };
        owner.with_slot(id, |data, light| {
            data.range = range;
            light.set_range(range);
        });
    }

    pub fn set_color(&self, color: Vec3) {
        let Some((owner, id)) = self.owner.as_ref().zip(self.id) else {
            return;
        };
        owner.with_slot(id, |data, light| {
            data.color = color;
            light.set_color(color);
        });
    }

    /// Frees the slot early; the handle stays around as an inert shell.
    pub fn release(&mut self) {
        if let Some((owner, id)) = self.owner.take().zip(self.id.take()) {
            owner.free(id);
        }
    }
}

impl Drop for Light {
    fn drop(&mut self) {
        self.release();
    }
}
