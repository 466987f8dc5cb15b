use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Pixel, Rgba, RgbaImage};

/// Alpha-composites `top` over `bottom`, clipping to `bottom`'s bounds.
pub fn blend(bottom: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    imageops::overlay(bottom, top, x, y);
}

pub fn fill_rect(image: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + width as i64).min(image.width() as i64);
    let y1 = (y + height as i64).min(image.height() as i64);

    for py in y0..y1 {
        for px in x0..x1 {
            image.get_pixel_mut(px as u32, py as u32).blend(&color);
        }
    }
}

/// Scales and center-crops `image` so it covers `width` x `height` exactly.
pub fn cover(image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    image.resize_to_fill(width, height, FilterType::Triangle).to_rgba8()
}

pub fn blur(image: &RgbaImage, sigma: f32) -> RgbaImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageops::blur(image, sigma)
}

/// Scales color channels towards black, `amount` 0 leaves the image as is.
pub fn dim(image: &mut RgbaImage, amount: f32) {
    let keep = 1.0 - amount.clamp(0.0, 1.0);

    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (*channel as f32 * keep).round() as u8;
        }
    }
}

/// Darkens the image more towards the edges.
pub fn vignette(image: &mut RgbaImage, strength: f32) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let max = (cx * cx + cy * cy).sqrt();

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let distance = (dx * dx + dy * dy).sqrt() / max;
        let keep = 1.0 - strength.clamp(0.0, 1.0) * distance * distance;

        for channel in &mut pixel.0[..3] {
            *channel = (*channel as f32 * keep).round() as u8;
        }
    }
}

/// A soft halo of `color` following the alpha of `layer`.
pub fn glow(layer: &RgbaImage, radius: f32, color: Rgba<u8>) -> RgbaImage {
    let alpha = GrayImage::from_fn(layer.width(), layer.height(), |x, y| {
        Luma([layer.get_pixel(x, y)[3]])
    });

    let blurred = if radius > 0.0 {
        imageops::blur(&alpha, radius / 2.0)
    } else {
        alpha
    };

    RgbaImage::from_fn(layer.width(), layer.height(), |x, y| {
        let coverage = blurred.get_pixel(x, y)[0] as f32 / 255.0;
        // blurred alpha is faint, boost it before applying the glow color
        let a = (coverage * 2.0).min(1.0) * color[3] as f32;
        Rgba([color[0], color[1], color[2], a.round() as u8])
    })
}

/// Antialiased coverage of a pixel at distance `d` from a shape edge,
/// positive inside.
fn edge_coverage(d: f32) -> f32 {
    (d + 0.5).clamp(0.0, 1.0)
}

/// Resizes `image` to a `diameter` square and cuts it to a circle.
pub fn circle(image: &DynamicImage, diameter: u32) -> RgbaImage {
    let mut square = cover(image, diameter, diameter);
    let r = diameter as f32 / 2.0;

    for (x, y, pixel) in square.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        let coverage = edge_coverage(r - (dx * dx + dy * dy).sqrt());
        pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
    }

    square
}

/// A circular outline of `thickness` pixels fitting a `diameter` square.
pub fn ring(diameter: u32, thickness: f32, color: Rgba<u8>) -> RgbaImage {
    let r = diameter as f32 / 2.0;

    RgbaImage::from_fn(diameter, diameter, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        let distance = (dx * dx + dy * dy).sqrt();
        let coverage = edge_coverage(r - distance).min(edge_coverage(distance - (r - thickness)));

        Rgba([color[0], color[1], color[2], (color[3] as f32 * coverage).round() as u8])
    })
}

pub fn rounded_rect(width: u32, height: u32, radius: f32, color: Rgba<u8>) -> RgbaImage {
    let radius = radius.min(width as f32 / 2.0).min(height as f32 / 2.0).max(0.0);
    let (w, h) = (width as f32, height as f32);

    RgbaImage::from_fn(width, height, |x, y| {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;

        // nearest point on the inner rectangle the corners are rounded around
        let cx = px.clamp(radius, w - radius);
        let cy = py.clamp(radius, h - radius);
        let distance = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
        let coverage = edge_coverage(radius - distance);

        Rgba([color[0], color[1], color[2], (color[3] as f32 * coverage).round() as u8])
    })
}
