use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{trace, warn};

use crate::io::common::loader::RawAssetLoader;
use crate::io::vfs::archive::{VfsArchive, canonicalize_name, probe_timestamp};

/// Discovers and orders the backing archives, then serves byte lookups by
/// logical name: the first archive in priority order that carries the name
/// wins.
pub struct VfsLoader {
    prioritized_archives: Vec<(String, VfsArchive)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCandidate {
    pub path: PathBuf,
    /// `.mod` archives carry modifications and override everything else.
    pub is_mod: bool,
    /// Embedded header timestamp, `-1` when the header couldn't be parsed.
    pub time: i64,
    /// Discovery order, used as the final tie breaker.
    pub ord: usize,
}

/// Mod archives first, then by descending embedded timestamp, then by
/// descending discovery order (a later-discovered archive of equal timestamp
/// wins).
pub fn load_order(a: &ArchiveCandidate, b: &ArchiveCandidate) -> Ordering {
    (b.is_mod, b.time, b.ord).cmp(&(a.is_mod, a.time, a.ord))
}

impl VfsLoader {
    pub fn new<P: AsRef<Path>>(data_folders: &[P]) -> Self {
        let mut candidates = Vec::new();
        for folder in data_folders {
            Self::scan_folder(folder.as_ref(), &mut candidates);
        }
        candidates.sort_by(load_order);

        let prioritized_archives = candidates
            .into_iter()
            .filter_map(|candidate| {
                let name = candidate.path.to_string_lossy().to_string();
                match VfsArchive::open(&candidate.path) {
                    Ok(archive) => Some((name, archive)),
                    Err(e) => {
                        warn!("Skipping unreadable archive {}: {}", name, e);
                        None
                    }
                }
            })
            .collect_vec();

        Self { prioritized_archives }
    }

    pub fn archive_names(&self) -> impl Iterator<Item = &str> {
        self.prioritized_archives.iter().map(|(name, _)| name.as_str())
    }

    fn scan_folder(folder: &Path, out: &mut Vec<ArchiveCandidate>) {
        let Ok(entries) = fs::read_dir(folder) else {
            warn!("Failed to enumerate data folder: {}", folder.display());
            return;
        };

        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if path.is_dir() {
                Self::scan_folder(&path, out);
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_ascii_lowercase();
            let is_mod = file_name.ends_with(".mod");
            if !is_mod && !file_name.ends_with(".vfs") {
                continue;
            }

            let time = probe_timestamp(&path);
            let ord = out.len();
            out.push(ArchiveCandidate { path, is_mod, time, ord });
        }
    }

    fn find_archive(&self, canonical: &str) -> Option<&(String, VfsArchive)> {
        self.prioritized_archives
            .iter()
            .find(|(_, archive)| archive.contains_file(canonical))
    }
}

impl RawAssetLoader for VfsLoader {
    fn load_raw_owned(&self, path: &str) -> Option<Vec<u8>> {
        let canonical = canonicalize_name(path);
        let Some((name, archive)) = self.find_archive(&canonical) else {
            warn!("Could not locate {}!", path);
            return None;
        };

        trace!("Loading {} from {}", path, name);
        match archive.read_file(&canonical) {
            Ok(buf) => Some(buf),
            Err(e) => {
                warn!("Failed to read {} from {}: {}", path, name, e);
                None
            }
        }
    }

    fn exists(&self, path: &str) -> bool {
        let canonical = canonicalize_name(path);
        self.find_archive(&canonical).is_some()
    }
}
