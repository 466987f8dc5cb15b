use image::RgbaImage;

use crate::backend::{ThumbnailBackend, paint};
use crate::{Error, ThumbnailConf, ThumbnailRenderer};

/// Paints the thumbnail without touching the filesystem.
#[derive(Default)]
pub struct MemoryBackend;

impl ThumbnailBackend for MemoryBackend {
    type Output = RgbaImage;

    fn run(&mut self, conf: &ThumbnailConf, renderer: impl ThumbnailRenderer) -> Result<RgbaImage, Error> {
        paint(conf, renderer)
    }
}
