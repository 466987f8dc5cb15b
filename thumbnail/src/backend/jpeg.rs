use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use log::info;

use crate::backend::memory::MemoryBackend;
use crate::backend::{ThumbnailBackend, ensure_parent};
use crate::{Error, ThumbnailConf, ThumbnailRenderer};

/// Paints the thumbnail and writes it to `conf.save_path` as a JPEG.
#[derive(Default)]
pub struct JpegBackend;

pub fn encode(image: &RgbaImage, quality: u8, writer: impl std::io::Write) -> crate::Result<()> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
    encoder.encode_image(&rgb)?;
    Ok(())
}

impl ThumbnailBackend for JpegBackend {
    type Output = PathBuf;

    fn run(&mut self, conf: &ThumbnailConf, renderer: impl ThumbnailRenderer) -> Result<PathBuf, Error> {
        let Some(save_path) = &conf.save_path else {
            return Err(Error::NoSavePath);
        };

        let image = MemoryBackend.run(conf, renderer)?;

        ensure_parent(save_path)?;
        let file = File::create(save_path).map_err(|_| Error::FailedToSave(save_path.to_owned()))?;
        encode(&image, conf.quality, BufWriter::new(file))?;

        info!("saved thumbnail to {}", save_path.display());

        Ok(save_path.to_owned())
    }
}
