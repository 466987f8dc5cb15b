use std::io::{Cursor, Read};

use image::DynamicImage;
use log::{debug, warn};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use zip::ZipArchive;

use crate::difficulty::{DifficultyCandidate, closest_by_name};
use crate::osu_file::OsuFile;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

#[derive(Debug, Clone)]
pub struct ArchiveDifficulty {
    pub file_name: String,
    pub beatmap: OsuFile,
}

impl DifficultyCandidate for ArchiveDifficulty {
    fn version(&self) -> &str {
        &self.beatmap.version
    }
}

/// A downloaded `.osz` beatmap-set archive.
pub struct BeatmapArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    pub difficulties: Vec<ArchiveDifficulty>,
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04")
}

impl BeatmapArchive {
    pub fn from_bytes(bytes: Vec<u8>) -> crate::Result<Self> {
        if !is_zip(&bytes) {
            return Err(crate::Error::InvalidArchive);
        }

        let mut zip = ZipArchive::new(Cursor::new(bytes))?;

        let mut raw = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;

            if !entry.is_file() || !has_extension(entry.name(), &["osu"]) {
                continue;
            }

            let file_name = entry.name().to_owned();
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;

            raw.push((file_name, buf));
        }

        let mut difficulties = raw
            .into_par_iter()
            .map(|(file_name, buf)| ArchiveDifficulty {
                beatmap: OsuFile::parse(&String::from_utf8_lossy(&buf)),
                file_name,
            })
            .collect::<Vec<_>>();

        difficulties.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        debug!("archive holds {} difficulties", difficulties.len());

        if difficulties.is_empty() {
            return Err(crate::Error::InvalidArchive);
        }

        Ok(Self { zip, difficulties })
    }

    /// Looks a difficulty up by exact beatmap id first, then by name.
    pub fn difficulty(&self, beatmap_id: Option<u64>, version: &str) -> Option<&ArchiveDifficulty> {
        beatmap_id
            .and_then(|id| {
                self.difficulties
                    .iter()
                    .find(|d| d.beatmap.beatmap_id == Some(id))
            })
            .or_else(|| closest_by_name(&self.difficulties, version))
    }

    /// Reads an entry, matching the name case-insensitively and ignoring
    /// path separator differences.
    pub fn read_entry(&mut self, name: &str) -> crate::Result<Option<Vec<u8>>> {
        let wanted = name.replace('\\', "/").to_lowercase();

        let index = (0..self.zip.len()).find(|&i| {
            self.zip
                .name_for_index(i)
                .is_some_and(|n| n.replace('\\', "/").to_lowercase() == wanted)
        });

        let Some(index) = index else {
            return Ok(None);
        };

        let mut entry = self.zip.by_index(index)?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;

        Ok(Some(buf))
    }

    fn load_image(&mut self, name: &str) -> Option<DynamicImage> {
        let bytes = match self.read_entry(name) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!("background {name} missing from archive");
                return None;
            }
            Err(err) => {
                warn!("failed to read {name}: {err}");
                return None;
            }
        };

        match image::load_from_memory(&bytes) {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("failed to decode {name}: {err}");
                None
            }
        }
    }

    /// Background art for `difficulty`, falling back to any other
    /// difficulty's background and then to the largest image in the archive.
    pub fn background(&mut self, difficulty: Option<&ArchiveDifficulty>) -> crate::Result<DynamicImage> {
        let mut names = Vec::new();

        if let Some(bg) = difficulty.and_then(|d| d.beatmap.background.clone()) {
            names.push(bg);
        }

        for d in &self.difficulties {
            if let Some(bg) = &d.beatmap.background
                && !names.contains(bg)
            {
                names.push(bg.clone());
            }
        }

        for name in names {
            if let Some(image) = self.load_image(&name) {
                debug!("using background {name}");
                return Ok(image);
            }
        }

        let largest = (0..self.zip.len())
            .filter_map(|i| {
                let entry = self.zip.by_index(i).ok()?;
                has_extension(entry.name(), IMAGE_EXTENSIONS).then(|| (entry.name().to_owned(), entry.size()))
            })
            .max_by_key(|(_, size)| *size);

        if let Some((name, _)) = largest
            && let Some(image) = self.load_image(&name)
        {
            debug!("using largest image {name} as background");
            return Ok(image);
        }

        Err(crate::Error::NoBackground)
    }
}
