use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

const REGULAR_FALLBACKS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const BOLD_FALLBACKS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Font paths to try, user supplied ones first.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FontConf {
    #[cfg_attr(feature = "serde", serde(default))]
    pub regular: Vec<PathBuf>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bold: Vec<PathBuf>,
    /// Skip the built-in system font locations.
    #[cfg_attr(feature = "serde", serde(default))]
    pub no_system_fallback: bool,
}

impl FontConf {
    pub fn candidates(&self, weight: FontWeight) -> Vec<PathBuf> {
        let (configured, fallbacks) = match weight {
            FontWeight::Regular => (&self.regular, REGULAR_FALLBACKS),
            FontWeight::Bold => (&self.bold, BOLD_FALLBACKS),
        };

        let mut candidates = configured.clone();

        if !self.no_system_fallback {
            candidates.extend(fallbacks.iter().map(PathBuf::from));
        }

        candidates
    }
}

pub fn load_font(path: &Path) -> crate::Result<FontArc> {
    let bytes = std::fs::read(path)?;

    FontArc::try_from_vec(bytes).map_err(|_| crate::Error::InvalidFont(path.to_owned()))
}

/// First candidate that exists and parses.
pub fn load_first(candidates: &[PathBuf]) -> Option<FontArc> {
    for path in candidates {
        if !path.exists() {
            continue;
        }

        match load_font(path) {
            Ok(font) => {
                debug!("loaded font {}", path.display());
                return Some(font);
            }
            Err(err) => warn!("skipping font {}: {err}", path.display()),
        }
    }

    None
}

#[derive(Clone)]
pub struct Fonts {
    pub regular: FontArc,
    pub bold: FontArc,
}

impl Fonts {
    /// Loads both weights. A missing bold font falls back to the regular
    /// one and vice versa; only having neither is an error.
    pub fn load(conf: &FontConf) -> crate::Result<Fonts> {
        let regular_candidates = conf.candidates(FontWeight::Regular);
        let bold_candidates = conf.candidates(FontWeight::Bold);

        let regular = load_first(&regular_candidates);
        let bold = load_first(&bold_candidates);

        match (regular, bold) {
            (Some(regular), Some(bold)) => Ok(Fonts { regular, bold }),
            (Some(regular), None) => {
                warn!("no bold font found, using regular");
                Ok(Fonts {
                    bold: regular.clone(),
                    regular,
                })
            }
            (None, Some(bold)) => {
                warn!("no regular font found, using bold");
                Ok(Fonts {
                    regular: bold.clone(),
                    bold,
                })
            }
            (None, None) => Err(crate::Error::FontNotFound(
                regular_candidates.into_iter().chain(bold_candidates).collect(),
            )),
        }
    }

    pub fn get(&self, weight: FontWeight) -> &FontArc {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_fonts_come_first() {
        let conf = FontConf {
            regular: vec![PathBuf::from("/custom/font.ttf")],
            ..Default::default()
        };

        let candidates = conf.candidates(FontWeight::Regular);
        assert_eq!(candidates[0], PathBuf::from("/custom/font.ttf"));
        assert!(candidates.len() > 1);
    }

    #[test]
    fn missing_fonts_error() {
        let conf = FontConf {
            regular: vec![PathBuf::from("/does/not/exist.ttf")],
            bold: vec![],
            no_system_fallback: true,
        };

        assert!(matches!(Fonts::load(&conf), Err(crate::Error::FontNotFound(paths)) if paths.len() == 1));
    }

    #[test]
    fn garbage_font_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        assert!(matches!(load_font(&path), Err(crate::Error::InvalidFont(_))));
        assert!(load_first(&[path]).is_none());
    }
}
