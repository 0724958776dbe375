use std::sync::Arc;

use dashmap::DashMap;

use crate::assets::animation::Animation;
use crate::assets::font::{BitmapFont, FontType};
use crate::assets::mesh::{DecalKey, ProtoMesh};
use crate::assets::skeleton::{AttachBinder, Skeleton};
use crate::assets::texture::Texture;
use crate::formats::pattern::PatternList;
use crate::formats::tex::DecodedImage;
use crate::gfx::RenderDevice;
use crate::io::common::loader::RawAssetLoader;

pub mod animation;
pub mod font;
pub mod mesh;
pub mod skeleton;
pub mod sound;
pub mod texture;

#[cfg(test)]
mod tests;

/// The process-wide content cache: one lazily-populated map per asset kind,
/// entries shared by reference for the cache's lifetime. Passed explicitly
/// through loader call chains instead of living in a global.
///
/// Negative entries (`None` values) remember failed texture/mesh loads so a
/// missing asset is only chased through the archives once. Kinds where a
/// retry is cheap return `None` without caching the failure.
pub struct ResourceCache {
    source: Arc<dyn RawAssetLoader>,
    device: Arc<dyn RenderDevice>,

    fallback: Arc<Texture>,
    fallback_black: Arc<Texture>,

    textures: DashMap<String, Option<Arc<Texture>>>,
    meshes: DashMap<String, Option<Arc<ProtoMesh>>>,
    skeletons: DashMap<String, Arc<Skeleton>>,
    animations: DashMap<String, Arc<Animation>>,
    fonts: DashMap<(String, FontType), Arc<BitmapFont>>,
    patterns: DashMap<String, Arc<PatternList>>,
    decals: DashMap<DecalKey, Arc<ProtoMesh>>,
    binders: DashMap<(usize, usize), Arc<AttachBinder>>,
}

impl ResourceCache {
    pub fn new(source: Arc<dyn RawAssetLoader>, device: Arc<dyn RenderDevice>) -> Self {
        // 1x1 placeholders for call sites that need *a* texture when the real
        // one failed to resolve.
        let fallback = Arc::new(Texture::upload(
            device.as_ref(),
            &DecodedImage {
                width: 1,
                height: 1,
                rgba: vec![255, 255, 255, 255],
            },
        ));
        let fallback_black = Arc::new(Texture::upload(
            device.as_ref(),
            &DecodedImage {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            },
        ));

        Self {
            source,
            device,
            fallback,
            fallback_black,
            textures: DashMap::new(),
            meshes: DashMap::new(),
            skeletons: DashMap::new(),
            animations: DashMap::new(),
            fonts: DashMap::new(),
            patterns: DashMap::new(),
            decals: DashMap::new(),
            binders: DashMap::new(),
        }
    }

    pub fn fallback(&self) -> &Arc<Texture> {
        &self.fallback
    }

    pub fn fallback_black(&self) -> &Arc<Texture> {
        &self.fallback_black
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.source.exists(name)
    }

    pub(crate) fn source(&self) -> &dyn RawAssetLoader {
        self.source.as_ref()
    }

    pub(crate) fn device(&self) -> &dyn RenderDevice {
        self.device.as_ref()
    }

    pub(crate) fn textures(&self) -> &DashMap<String, Option<Arc<Texture>>> {
        &self.textures
    }

    pub(crate) fn meshes(&self) -> &DashMap<String, Option<Arc<ProtoMesh>>> {
        &self.meshes
    }

    pub(crate) fn skeletons(&self) -> &DashMap<String, Arc<Skeleton>> {
        &self.skeletons
    }

    pub(crate) fn animations(&self) -> &DashMap<String, Arc<Animation>> {
        &self.animations
    }

    pub(crate) fn fonts(&self) -> &DashMap<(String, FontType), Arc<BitmapFont>> {
        &self.fonts
    }

    pub(crate) fn patterns(&self) -> &DashMap<String, Arc<PatternList>> {
        &self.patterns
    }

    pub(crate) fn decals(&self) -> &DashMap<DecalKey, Arc<ProtoMesh>> {
        &self.decals
    }

    pub(crate) fn binders(&self) -> &DashMap<(usize, usize), Arc<AttachBinder>> {
        &self.binders
    }
}
