use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::assets::ResourceCache;
use crate::assets::font::FontType;
use crate::assets::mesh::{DecalDescription, MeshLoadCode};
use crate::formats::anim::test_support::{build_msb, idle_sequence};
use crate::formats::font::test_support::build_fnt;
use crate::formats::mesh::test_support::{build_mmb, build_mrm, triangle_mesh};
use crate::formats::model::test_support::{build_biped_mdl, build_library};
use crate::formats::model::{FOURCC_MDH, FOURCC_MDM};
use crate::gfx::{BindGroupHandle, BufferHandle, BufferUsage, RenderDevice, TextureHandle};
use crate::io::common::loader::RawAssetLoader;

struct StubLoader {
    files: HashMap<String, Vec<u8>>,
    reads: AtomicUsize,
    read_log: Mutex<Vec<String>>,
}

impl StubLoader {
    fn new(files: &[(&str, Vec<u8>)]) -> Arc<Self> {
        Arc::new(Self {
            files: files.iter().map(|(name, data)| (name.to_string(), data.clone())).collect(),
            reads: AtomicUsize::new(0),
            read_log: Mutex::new(Vec::new()),
        })
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read_log(&self) -> Vec<String> {
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
        self.files.contains_key(path)
    }
}

#[derive(Default)]
struct NullDevice {
    next: AtomicU64,
}

impl RenderDevice for NullDevice {
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

fn cache(files: &[(&str, Vec<u8>)]) -> (ResourceCache, Arc<StubLoader>) {
    let loader = StubLoader::new(files);
    let cache = ResourceCache::new(loader.clone(), Arc::new(NullDevice::default()));
    (cache, loader)
}

/// Uncompressed true-color TGA with top-left origin, as the raw texture
/// sources ship it.
fn tga_bytes(width: u16, height: u16, rgba: &[u8]) -> Vec<u8> {
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

#[test]
fn mesh_lookup_is_identity_stable() {
    let (cache, loader) = cache(&[("CHEST.MRM", build_mrm(&triangle_mesh("CHEST.TGA")))]);

    let first = cache.mesh("CHEST.MRM").expect("mesh loads");
    let second = cache.mesh("CHEST.MRM").expect("mesh loads");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.reads(), 1);
}

#[test]
fn raw_mesh_names_exchange_to_compiled_extensions() {
    let (cache, _) = cache(&[("CHEST.MRM", build_mrm(&triangle_mesh("CHEST.TGA")))]);

    let mesh = cache.mesh("CHEST.3DS").expect("compiled sibling resolves");
    assert_eq!(mesh.load_code, MeshLoadCode::Static);
    assert_eq!(mesh.name, "CHEST.3DS");
}

#[test]
fn morph_meshes_keep_their_animation_list_and_fix_normals() {
    let (cache, _) = cache(&[("FLAG.MMB", build_mmb(&triangle_mesh("FLAG.TGA"), &[("WAVE", 8, 25.0)]))]);

    let mesh = cache.mesh("FLAG.MMS").expect("morph mesh loads");
    assert_eq!(mesh.load_code, MeshLoadCode::Morph);
    assert_eq!(mesh.morph_animations.len(), 1);
    // the vertical axis of the stored normals is swapped on import
    assert_eq!(mesh.packed.vertices[0].normal, [0.0, 1.0, 0.0]);
}

#[test]
fn skinned_models_probe_the_compiled_sibling_chain() {
    let (cache, _) = cache(&[("HERO.MDL", build_biped_mdl())]);

    let mesh = cache.mesh("HERO.MDS").expect("MDL sibling resolves");
    assert_eq!(mesh.load_code, MeshLoadCode::Dynamic);
    assert_eq!(mesh.attachment_nodes, ["BIP01 HEAD"]);
}

#[test]
fn mesh_only_model_merges_hierarchy_sibling() {
    let body = triangle_mesh("BODY.TGA");
    let (cache, _) = cache(&[
        ("ORC.MDM", build_library(FOURCC_MDM, &[], &[("BIP01", &body)])),
        ("ORC.MDH", build_library(FOURCC_MDH, &[("BIP01", -1, [0.0; 3])], &[])),
    ]);

    let mesh = cache.mesh("ORC.MDM").expect("merged library resolves");
    assert_eq!(mesh.load_code, MeshLoadCode::Dynamic);

    let skeleton = cache.skeleton("ORC.MDS").expect("hierarchy sibling resolves");
    assert_eq!(skeleton.nodes.len(), 1);
}

#[test]
fn failed_mesh_loads_are_negative_cached() {
    let (cache, loader) = cache(&[]);

    assert!(cache.mesh("GONE.MRM").is_none());
    let reads = loader.reads();
    assert!(cache.mesh("GONE.MRM").is_none());
    assert_eq!(loader.reads(), reads, "negative entry must not re-attempt archive I/O");
}

#[test]
fn skeleton_misses_are_retried() {
    let (cache, loader) = cache(&[]);

    assert!(cache.skeleton("HERO.MDS").is_none());
    let reads = loader.reads();
    assert!(cache.skeleton("HERO.MDS").is_none());
    // cheap-retry kind: the probe happens again
    assert!(loader.reads() >= reads);
}

#[test]
fn skeleton_rejects_unskinned_source_extensions() {
    let (cache, loader) = cache(&[]);
    assert!(cache.skeleton("CHEST.3DS").is_none());
    assert!(cache.skeleton("FLAG.MMS").is_none());
    assert_eq!(loader.reads(), 0);
}

#[test]
fn binding_short_circuits_without_attachments() {
    let (cache, _) = cache(&[
        ("HERO.MDL", build_biped_mdl()),
        ("CHEST.MRM", build_mrm(&triangle_mesh("CHEST.TGA"))),
        ("CRATE.MRM", build_mrm(&triangle_mesh("CRATE.TGA"))),
    ]);

    let skeleton = cache.skeleton("HERO.MDL").expect("skeleton");
    let chest = cache.mesh("CHEST.MRM").expect("mesh");
    let crate_ = cache.mesh("CRATE.MRM").expect("mesh");

    let a = cache.bind_mesh(&skeleton, &chest);
    let b = cache.bind_mesh(&skeleton, &crate_);
    assert!(a.is_empty());
    // different meshes, same shared empty binder
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn bindings_are_cached_by_pair_identity() {
    let (cache, _) = cache(&[("HERO.MDL", build_biped_mdl())]);

    let skeleton = cache.skeleton("HERO.MDL").expect("skeleton");
    let mesh = cache.mesh("HERO.MDL").expect("mesh");

    let first = cache.bind_mesh(&skeleton, &mesh);
    let second = cache.bind_mesh(&skeleton, &mesh);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.bindings, vec![Some(1)]);
}

#[test]
fn animation_names_exchange_to_script_extension() {
    let (cache, _) = cache(&[("HUMANS.MSB", build_msb(&[idle_sequence()]))]);

    let animation = cache.animation("HUMANS.MDS").expect("script resolves");
    assert_eq!(animation.name, "HUMANS");
    assert!(animation.sequence("S_IDLE").is_some());

    let again = cache.animation("HUMANS.MDH").expect("same script");
    assert!(Arc::ptr_eq(&animation, &again));
}

#[test]
fn fonts_are_keyed_by_name_and_type() {
    let (cache, _) = cache(&[
        ("font_old_10_white.fnt", build_fnt(17)),
        ("font_old_10_white_hi.fnt", build_fnt(33)),
    ]);

    let normal = cache.font("font_old_10_white.tga", FontType::Normal).expect("font");
    let same = cache.font("font_old_10_white.tga", FontType::Normal).expect("font");
    assert!(Arc::ptr_eq(&normal, &same));
    assert_eq!(normal.glyph_height, 17);
    // missing atlas texture is tolerated; the glyph table still loads
    assert!(normal.texture.is_none());

    let hi = cache.font("font_old_10_white.tga", FontType::Hi).expect("hi variant");
    assert_eq!(hi.glyph_height, 33);
    assert!(!Arc::ptr_eq(&normal, &hi));

    let red = cache.font("font_old_10_white.tga", FontType::Red).expect("red tint");
    assert_eq!(red.color.x, 1.0);
    assert_eq!(red.color.y, 0.0);
}

#[test]
fn decals_cache_by_composite_key() {
    let (cache, _) = cache(&[("BLOOD.TGA", tga_bytes(1, 1, &[200, 0, 0, 255]))]);

    let desc = DecalDescription {
        texture: "BLOOD.TGA".into(),
        size_x: 1.5,
        size_y: 1.5,
        two_sided: true,
    };
    let first = cache.decal_mesh(&desc).expect("decal builds");
    let second = cache.decal_mesh(&desc).expect("decal builds");
    assert!(Arc::ptr_eq(&first, &second));

    let flipped = cache.decal_mesh(&DecalDescription {
        two_sided: false,
        ..desc.clone()
    });
    assert!(!Arc::ptr_eq(&first, &flipped.expect("one-sided variant")));
}

#[test]
fn decals_without_material_texture_are_refused() {
    let (cache, _) = cache(&[]);
    let desc = DecalDescription {
        texture: "GONE.TGA".into(),
        size_x: 1.0,
        size_y: 1.0,
        two_sided: false,
    };
    assert!(cache.decal_mesh(&desc).is_none());
}

#[test]
fn decal_requests_through_the_mesh_path_are_rejected() {
    let (cache, loader) = cache(&[]);
    assert!(cache.mesh("BLOOD.TGA").is_none());
    assert_eq!(loader.reads(), 0);
}

#[test]
fn pattern_lists_are_cached() {
    let (cache, loader) = cache(&[("MUSIC\\TAVERN.LST", b"TAVERN_DAY_01.SGT\nTAVERN_DAY_02.SGT\n".to_vec())]);

    let first = cache.pattern_list("MUSIC\\TAVERN.LST").expect("list");
    let second = cache.pattern_list("MUSIC\\TAVERN.LST").expect("list");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.segments.len(), 2);
    assert_eq!(loader.reads(), 1);
}

#[test]
fn compiled_texture_is_preferred_over_raw_source() {
    let ctex = {
        let mut buf = crate::formats::tex::FOURCC_CTEX.to_le_bytes().to_vec();
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&[1, 2, 3, 255]);
        buf
    };
    let (cache, loader) = cache(&[
        ("STONE-C.TEX", ctex),
        ("STONE.TGA", tga_bytes(1, 1, &[9, 9, 9, 255])),
    ]);

    assert!(cache.texture("STONE.TGA").is_some());
    assert_eq!(loader.read_log(), ["STONE-C.TEX"]);
}
