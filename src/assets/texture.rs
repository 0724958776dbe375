use std::sync::Arc;

use log::error;

use crate::assets::ResourceCache;
use crate::formats::tex::{CtexReader, DecodedImage};
use crate::gfx::{RenderDevice, TextureHandle};
use crate::util::file_ext;

/// A decoded, uploaded texture. The pixel data lives on the GPU; only the
/// handle and the dimensions stay host-side.
#[derive(Debug)]
pub struct Texture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub(crate) fn upload(device: &dyn RenderDevice, image: &DecodedImage) -> Self {
        Self {
            handle: device.create_texture_rgba8(image.width, image.height, &image.rgba),
            width: image.width,
            height: image.height,
        }
    }
}

/// Replaces the first literal `<tag>0` token with `<tag><value>`,
/// independent of the surrounding text.
pub(crate) fn substitute_token(name: &str, tag: char, value: i32) -> String {
    let bytes = name.as_bytes();
    let pattern = [tag as u8, b'0'];
    for i in 0..bytes.len().saturating_sub(1) {
        if bytes[i] == pattern[0] && bytes[i + 1] == pattern[1] {
            return format!("{}{}{}{}", &name[..i], tag, value, &name[i + 2..]);
        }
    }
    name.to_string()
}

/// Builds the frame-`id` variant of an animated texture name: the `_A0`
/// marker becomes `_A<id>`, everything else is uppercased.
pub(crate) fn substitute_frame(name: &str, id: u32) -> String {
    let bytes = name.as_bytes();
    let mut out = String::with_capacity(name.len() + 2);
    let mut i = 0;
    while i < bytes.len() {
        if i + 2 < bytes.len()
            && bytes[i] == b'_'
            && (bytes[i + 1] == b'A' || bytes[i + 1] == b'a')
            && bytes[i + 2] == b'0'
        {
            out.push_str(&format!("_A{}", id));
            i += 3;
        } else {
            out.push(bytes[i].to_ascii_uppercase() as char);
            i += 1;
        }
    }
    out
}

impl ResourceCache {
    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        if name.is_empty() {
            return None;
        }
        if let Some(hit) = self.textures().get(name) {
            return hit.clone();
        }
        self.textures()
            .entry(name.to_string())
            .or_insert_with(|| self.load_texture_uncached(name))
            .clone()
    }

    /// Substitutes the numeric variant (`V`) and color-channel (`C`) tokens
    /// of a templated texture name, then resolves the result.
    pub fn texture_variant(&self, name: &str, variant: i32, channel: i32) -> Option<Arc<Texture>> {
        let substituted = substitute_token(&substitute_token(name, 'V', variant), 'C', channel);
        self.texture(&substituted)
    }

    /// Resolves the frame sequence of an animated texture (`_A0` marker):
    /// increasing frame indices until the first one that fails, with one
    /// `.TGA`-suffix retry per index. The result may be empty.
    pub fn texture_anim(&self, name: &str) -> Vec<Arc<Texture>> {
        let mut ret = Vec::new();
        if !name.contains("_A0") && !name.contains("_a0") {
            return ret;
        }

        for id in 0.. {
            let frame = substitute_frame(name, id);
            let tex = self.texture(&frame).or_else(|| self.texture(&format!("{}.TGA", frame)));
            match tex {
                Some(t) => ret.push(t),
                None => break,
            }
        }
        ret
    }

    fn load_texture_uncached(&self, name: &str) -> Option<Arc<Texture>> {
        // Prefer the precompiled sibling of raw image sources.
        if file_ext::has_ext(name, "TGA") {
            let dot = name.rfind('.').expect("has_ext implies a dot");
            let compiled = format!("{}-C.TEX", &name[..dot]);
            if self.source().exists(&compiled) {
                if let Some(texture) = self.load_compiled_texture(&compiled) {
                    return Some(texture);
                }
            }
        }

        let data = self.source().load_raw_owned(name)?;
        match decode_raw_image(name, &data) {
            Some(image) => Some(Arc::new(Texture::upload(self.device(), &image))),
            None => None,
        }
    }

    fn load_compiled_texture(&self, name: &str) -> Option<Arc<Texture>> {
        let data = self.source().load_raw_owned(name)?;
        match CtexReader::parse_asset(&mut data.as_slice()) {
            Ok(image) => Some(Arc::new(Texture::upload(self.device(), &image))),
            Err(e) => {
                error!("unable to load texture \"{}\": {}", name, e);
                None
            }
        }
    }
}

fn decode_raw_image(name: &str, data: &[u8]) -> Option<DecodedImage> {
    // TGA carries no magic bytes, so guessing from content alone won't do.
    let format = name
        .rsplit('.')
        .next()
        .and_then(|ext| image::ImageFormat::from_extension(ext.to_ascii_lowercase()));
    let parsed = match format {
        Some(format) => image::load_from_memory_with_format(data, format),
        None => image::load_from_memory(data),
    };

    match parsed {
        Ok(img) => {
            let rgba = img.to_rgba8();
            Some(DecodedImage {
                width: rgba.width(),
                height: rgba.height(),
                rgba: rgba.into_raw(),
            })
        }
        Err(e) => {
            error!("unable to load texture \"{}\": {}", name, e);
            None
        }
    }
}
