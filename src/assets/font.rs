use std::sync::Arc;

use glam::Vec4;
use log::error;

use crate::assets::ResourceCache;
use crate::assets::texture::Texture;
use crate::formats::font::{FontReader, Glyph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontType {
    Normal,
    Hi,
    Disabled,
    Yellow,
    Red,
}

/// A glyph table plus its atlas texture, tinted per font type.
#[derive(Debug)]
pub struct BitmapFont {
    pub glyph_height: u32,
    pub glyphs: Vec<Glyph>,
    pub texture: Option<Arc<Texture>>,
    pub color: Vec4,
}

impl ResourceCache {
    pub fn font(&self, name: &str, kind: FontType) -> Option<Arc<BitmapFont>> {
        let key = (name.to_string(), kind);
        if let Some(hit) = self.fonts().get(&key) {
            return Some(hit.clone());
        }

        match self.load_font_uncached(name, kind) {
            Some(font) => Some(self.fonts().entry(key).or_insert(font).clone()),
            None => None,
        }
    }

    fn load_font_uncached(&self, name: &str, kind: FontType) -> Option<Arc<BitmapFont>> {
        let stem = name.split('.').next().unwrap_or(name);
        let (fnt, tga) = match kind {
            FontType::Hi => (format!("{}_hi.fnt", stem), format!("{}_hi.tga", stem)),
            _ => (format!("{}.fnt", stem), format!("{}.tga", stem)),
        };

        let color = match kind {
            FontType::Normal | FontType::Hi => Vec4::new(1.0, 1.0, 1.0, 1.0),
            FontType::Disabled => Vec4::new(1.0, 1.0, 1.0, 0.6),
            FontType::Yellow => Vec4::new(1.0, 1.0, 0.1, 1.0),
            FontType::Red => Vec4::new(1.0, 0.0, 0.0, 1.0),
        };

        let data = self.source().load_raw_owned(&fnt)?;
        let file = match FontReader::parse_asset(&mut data.as_slice()) {
            Ok(file) => file,
            Err(e) => {
                error!("unable to load font \"{}\": {}", fnt, e);
                return None;
            }
        };

        Some(Arc::new(BitmapFont {
            glyph_height: file.glyph_height,
            glyphs: file.glyphs,
            texture: self.texture(&tga),
            color,
        }))
    }
}
