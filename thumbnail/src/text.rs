use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use image::{Pixel, Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    /// Negative, below the baseline.
    pub descent: f32,
}

impl TextMetrics {
    pub fn height(&self) -> f32 {
        self.ascent - self.descent
    }
}

/// Glyphs positioned along a baseline starting at `x`, `y`.
fn layout(font: &FontArc, size: f32, x: f32, y: f32, text: &str) -> Vec<Glyph> {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = x;
    let mut previous = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);

        if let Some(previous) = previous {
            caret += scaled.kern(previous, id);
        }

        glyphs.push(id.with_scale_and_position(size, point(caret, y)));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    glyphs
}

pub fn measure(font: &FontArc, size: f32, text: &str) -> TextMetrics {
    let scaled = font.as_scaled(PxScale::from(size));

    let width = layout(font, size, 0.0, 0.0, text)
        .last()
        .map(|glyph| glyph.position.x + scaled.h_advance(glyph.id))
        .unwrap_or_default();

    TextMetrics {
        width,
        ascent: scaled.ascent(),
        descent: scaled.descent(),
    }
}

pub fn draw(
    image: &mut RgbaImage,
    font: &FontArc,
    size: f32,
    x: f32,
    y: f32,
    text: &str,
    color: Rgba<u8>,
) {
    let (width, height) = (image.width() as i64, image.height() as i64);

    for glyph in layout(font, size, x, y, text) {
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };

        let bounds = outlined.px_bounds();
        let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);

        outlined.draw(|gx, gy, coverage| {
            let px = left + gx as i64;
            let py = top + gy as i64;

            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }

            let alpha = (color[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
            let src = Rgba([color[0], color[1], color[2], alpha]);
            image.get_pixel_mut(px as u32, py as u32).blend(&src);
        });
    }
}

pub struct TextLayer {
    pub image: RgbaImage,
    pub padding: u32,
}

/// Renders `text` onto its own transparent image with `padding` pixels
/// of room on every side, baseline at `padding + ascent`.
pub fn render_layer(
    font: &FontArc,
    size: f32,
    text: &str,
    color: Rgba<u8>,
    padding: f32,
) -> TextLayer {
    let metrics = measure(font, size, text);
    let padding = padding.max(0.0).ceil() as u32 * 2;

    let width = metrics.width.ceil() as u32 + padding * 2;
    let height = metrics.height().ceil() as u32 + padding * 2;

    let mut image = RgbaImage::new(width.max(1), height.max(1));
    draw(
        &mut image,
        font,
        size,
        padding as f32,
        padding as f32 + metrics.ascent,
        text,
        color,
    );

    TextLayer { image, padding }
}

/// Shrinks the font size until `text` fits in `max_width`, never going
/// below `min_size`.
pub fn fit_size(font: &FontArc, size: f32, min_size: f32, max_width: f32, text: &str) -> f32 {
    let width = measure(font, size, text).width;

    if width <= max_width || width <= 0.0 {
        return size;
    }

    (size * max_width / width).max(min_size)
}

/// Cuts `text` down with a trailing ellipsis so it fits in `max_width`.
pub fn truncate(font: &FontArc, size: f32, max_width: f32, text: &str) -> String {
    if measure(font, size, text).width <= max_width {
        return text.to_owned();
    }

    let mut chars: Vec<char> = text.chars().collect();

    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}…", chars.iter().collect::<String>().trim_end());

        if measure(font, size, &candidate).width <= max_width {
            return candidate;
        }
    }

    String::new()
}
