use std::sync::Arc;

use log::error;

use crate::assets::ResourceCache;
use crate::formats::anim::{AnimScriptReader, AnimSequence};
use crate::util::file_ext::{exchange_ext, has_ext};

/// All sequences of one compiled animation script.
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub sequences: Vec<AnimSequence>,
}

impl Animation {
    pub fn sequence(&self, name: &str) -> Option<&AnimSequence> {
        self.sequences.iter().find(|seq| seq.name == name)
    }
}

impl ResourceCache {
    pub fn animation(&self, name: &str) -> Option<Arc<Animation>> {
        if name.len() < 4 {
            return None;
        }

        let mut name = name.to_string();
        let _ = exchange_ext(&mut name, "MDS", "MSB") || exchange_ext(&mut name, "MDH", "MSB");
        if !has_ext(&name, "MSB") {
            error!("unable to load animation \"{}\": unrecognized format", name);
            return None;
        }

        if let Some(hit) = self.animations().get(&name) {
            return Some(hit.clone());
        }

        match self.load_animation_uncached(&name) {
            Some(animation) => Some(self.animations().entry(name).or_insert(animation).clone()),
            None => None,
        }
    }

    fn load_animation_uncached(&self, name: &str) -> Option<Arc<Animation>> {
        let data = self.source().load_raw_owned(name)?;
        match AnimScriptReader::parse_asset(&mut data.as_slice()) {
            Ok(sequences) => {
                // the stem, without the ".MSB"
                let stem = name[..name.len() - 4].to_string();
                Some(Arc::new(Animation {
                    name: stem,
                    sequences,
                }))
            }
            Err(e) => {
                error!("unable to load animation \"{}\": {}", name, e);
                None
            }
        }
    }
}
