use std::io::Cursor;
use std::sync::Arc;

use kira::sound::static_sound::StaticSoundData;
use log::error;

use crate::assets::ResourceCache;
use crate::formats::pattern::{PatternList, parse_pattern_list};

/// A fully decoded, playback-ready sound. Cheap to clone; the samples are
/// shared.
#[derive(Clone)]
pub struct SoundBuffer {
    pub data: StaticSoundData,
}

impl ResourceCache {
    /// Uncached by design: sound effects are decoded per request and the
    /// caller keeps the buffer for as long as it plays.
    pub fn load_sound(&self, name: &str) -> Option<SoundBuffer> {
        if name.is_empty() {
            return None;
        }

        let data = self.source().load_raw_owned(name)?;
        match StaticSoundData::from_cursor(Cursor::new(data)) {
            Ok(data) => Some(SoundBuffer { data }),
            Err(e) => {
                error!("unable to load sound \"{}\": {}", name, e);
                None
            }
        }
    }

    pub fn pattern_list(&self, name: &str) -> Option<Arc<PatternList>> {
        if let Some(hit) = self.patterns().get(name) {
            return Some(hit.clone());
        }

        let data = self.source().load_raw_owned(name)?;
        match parse_pattern_list(name, &data) {
            Ok(list) => Some(
                self.patterns()
                    .entry(name.to_string())
                    .or_insert(Arc::new(list))
                    .clone(),
            ),
            Err(e) => {
                error!("unable to load pattern list \"{}\": {}", name, e);
                None
            }
        }
    }
}
