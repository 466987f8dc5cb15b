use std::path::Path;

use image::RgbaImage;

use crate::{Canvas, ThumbnailConf, ThumbnailRenderer};

pub mod jpeg;
pub mod memory;

pub trait ThumbnailBackend {
    type Output;

    fn run(
        &mut self,
        conf: &ThumbnailConf,
        renderer: impl ThumbnailRenderer,
    ) -> Result<Self::Output, crate::Error>;
}

/// Runs `renderer` against a fresh canvas sized by `conf`.
pub fn paint(conf: &ThumbnailConf, mut renderer: impl ThumbnailRenderer) -> crate::Result<RgbaImage> {
    let mut canvas = Canvas::new(conf.width, conf.height);

    renderer.setup(&mut canvas)?;
    renderer.draw(&mut canvas)?;

    Ok(canvas.into_image())
}

pub(crate) fn ensure_parent(path: &Path) -> crate::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    Ok(())
}
