pub mod backend;
pub mod effects;
pub mod font;
pub mod layout;
pub mod text;

use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use thiserror::Error;

pub use ab_glyph;
pub use image;

use crate::font::{FontConf, FontWeight, Fonts};
use crate::text::TextMetrics;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no usable font found, tried: {0:?}")]
    FontNotFound(Vec<PathBuf>),
    #[error("invalid font file: {0}")]
    InvalidFont(PathBuf),
    #[error("no font loaded")]
    NoFont,
    #[error("no path to save too")]
    NoSavePath,
    #[error("failed to save image: {0}")]
    FailedToSave(PathBuf),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub trait ThumbnailRenderer {
    #[allow(unused_variables)]
    fn setup(&mut self, canvas: &mut Canvas) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<()>;
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThumbnailConf {
    pub width: u32,
    pub height: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
    pub save_path: Option<PathBuf>,
}

impl Default for ThumbnailConf {
    fn default() -> Self {
        Self {
            width: layout::CANVAS_WIDTH,
            height: layout::CANVAS_HEIGHT,
            quality: 95,
            save_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Rgba<u8>,
    pub radius: f32,
}

/// How text and shapes are filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Rgba<u8>,
    pub font_size: f32,
    pub weight: FontWeight,
    pub align: Align,
    pub glow: Option<Glow>,
    pub shadow: Option<Rgba<u8>>,
}

impl Paint {
    pub fn color(color: Rgba<u8>) -> Self {
        Self {
            color,
            font_size: 32.0,
            weight: FontWeight::Regular,
            align: Align::Left,
            glow: None,
            shadow: None,
        }
    }

    pub fn with_color(mut self, color: Rgba<u8>) -> Self {
        self.color = color;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn with_glow(mut self, color: Rgba<u8>, radius: f32) -> Self {
        self.glow = Some(Glow { color, radius });
        self
    }

    pub fn with_shadow(mut self, color: Rgba<u8>) -> Self {
        self.shadow = Some(color);
        self
    }
}

pub struct Canvas {
    image: RgbaImage,
    fonts: Option<Fonts>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            fonts: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn load_fonts(&mut self, conf: &FontConf) -> Result<()> {
        self.fonts = Some(Fonts::load(conf)?);
        Ok(())
    }

    pub fn fonts(&self) -> Result<&Fonts> {
        self.fonts.as_ref().ok_or(Error::NoFont)
    }

    pub fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
        effects::fill_rect(&mut self.image, x, y, width, height, color);
    }

    pub fn fill_rounded_rect(
        &mut self,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        radius: f32,
        color: Rgba<u8>,
    ) {
        let shape = effects::rounded_rect(width, height, radius, color);
        effects::blend(&mut self.image, &shape, x, y);
    }

    /// Alpha-composites `image` with its top left corner at `x`, `y`.
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        effects::blend(&mut self.image, image, x, y);
    }

    pub fn measure_text(&self, text: &str, paint: &Paint) -> Result<TextMetrics> {
        let font = self.fonts()?.get(paint.weight);
        Ok(text::measure(font, paint.font_size, text))
    }

    /// Draws `text` with `y` as the baseline and `x` interpreted per the
    /// paint's alignment.
    pub fn fill_text(&mut self, x: f32, y: f32, text: &str, paint: &Paint) -> Result<TextMetrics> {
        let font = self.fonts()?.get(paint.weight).clone();
        let metrics = text::measure(&font, paint.font_size, text);

        let left = match paint.align {
            Align::Left => x,
            Align::Center => x - metrics.width / 2.0,
            Align::Right => x - metrics.width,
        };

        if let Some(glow) = paint.glow {
            let layer = text::render_layer(&font, paint.font_size, text, glow.color, glow.radius);
            let offset = layer.padding as f32;
            let glow_layer = effects::glow(&layer.image, glow.radius, glow.color);
            effects::blend(
                &mut self.image,
                &glow_layer,
                (left - offset) as i64,
                (y - metrics.ascent - offset) as i64,
            );
        }

        if let Some(shadow) = paint.shadow {
            let offset = (paint.font_size / 24.0).max(1.0);
            text::draw(&mut self.image, &font, paint.font_size, left + offset, y + offset, text, shadow);
        }

        text::draw(&mut self.image, &font, paint.font_size, left, y, text, paint.color);

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_builder() {
        let paint = Paint::color(Rgba([255, 255, 255, 255]))
            .with_font_size(48.0)
            .with_align(Align::Center)
            .with_glow(Rgba([0, 0, 0, 200]), 8.0);

        assert_eq!(paint.font_size, 48.0);
        assert_eq!(paint.align, Align::Center);
        assert_eq!(paint.glow.map(|g| g.radius), Some(8.0));
    }

    #[test]
    fn text_without_font_fails() {
        let mut canvas = Canvas::new(10, 10);
        let paint = Paint::color(Rgba([255, 255, 255, 255]));
        assert!(matches!(canvas.fill_text(0.0, 0.0, "x", &paint), Err(Error::NoFont)));
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_rect(-5, 8, 8, 8, Rgba([255, 0, 0, 255]));

        assert_eq!(canvas.image().get_pixel(0, 9), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.image().get_pixel(3, 9), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.image().get_pixel(0, 7), &Rgba([0, 0, 0, 255]));
    }
}
