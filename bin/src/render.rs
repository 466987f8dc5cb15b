use image::{DynamicImage, Rgba};
use lib::rank::hsl_to_rgb8;
use lib::util::{format_accuracy, format_pp, format_stars};
use palette::Hsl;
use thumbnail::effects;
use thumbnail::font::{FontConf, FontWeight};
use thumbnail::layout::{AVATAR_RING, Anchor, Layout};
use thumbnail::{Align, Canvas, Error, Paint, ThumbnailRenderer};

use crate::play::PlayInfo;

const TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LABEL: Rgba<u8> = Rgba([200, 205, 215, 255]);
const GLOW: Rgba<u8> = Rgba([0, 0, 0, 200]);
const PLAIN_BACKGROUND: Rgba<u8> = Rgba([22, 22, 30, 255]);
const AVATAR_PLACEHOLDER: Rgba<u8> = Rgba([60, 60, 72, 255]);
const FC_BADGE: Rgba<u8> = Rgba([46, 160, 90, 230]);
const MISS: Rgba<u8> = Rgba([255, 110, 110, 255]);

const BACKGROUND_BLUR: f32 = 6.0;
const BACKGROUND_DIM: f32 = 0.45;

pub fn color_from_hsl(hsl: Hsl, alpha: u8) -> Rgba<u8> {
    let (r, g, b) = hsl_to_rgb8(hsl);
    Rgba([r, g, b, alpha])
}

pub struct Thumbnail<'a> {
    pub play: &'a PlayInfo,
    pub background: Option<DynamicImage>,
    pub avatar: Option<DynamicImage>,
    pub fonts: FontConf,
}

impl Thumbnail<'_> {
    fn base(layout: &Layout, size: f32) -> Paint {
        Paint::color(TEXT)
            .with_font_size(layout.font_size(size))
            .with_align(Align::Center)
            .with_glow(GLOW, layout.px(14.0))
    }

    /// Centered text at `anchor`, shrunk to fit `max_width`.
    fn line(canvas: &mut Canvas, anchor: Anchor, text: &str, paint: Paint, max_width: f32) -> Result<(), Error> {
        if text.is_empty() {
            return Ok(());
        }

        let font = canvas.fonts()?.get(paint.weight);
        let size = thumbnail::text::fit_size(font, paint.font_size, paint.font_size * 0.5, max_width, text);
        let text = thumbnail::text::truncate(font, size, max_width, text);

        canvas.fill_text(anchor.x, anchor.y, &text, &paint.with_font_size(size))?;
        Ok(())
    }

    fn draw_background(&self, canvas: &mut Canvas, layout: &Layout) {
        let Some(background) = &self.background else {
            canvas.clear(PLAIN_BACKGROUND);
            return;
        };

        let mut image = effects::cover(background, canvas.width(), canvas.height());
        image = effects::blur(&image, layout.px(BACKGROUND_BLUR));
        effects::dim(&mut image, BACKGROUND_DIM);
        effects::vignette(&mut image, 0.5);

        canvas.draw_image(&image, 0, 0);
    }

    fn draw_avatar(&self, canvas: &mut Canvas, layout: &Layout) {
        let rect = layout.avatar();
        let diameter = rect.width.round() as u32;
        let ring = layout.px(AVATAR_RING);
        let (x, y) = (rect.x.round() as i64, rect.y.round() as i64);

        let outer = diameter + (ring * 2.0).round() as u32;
        let border = color_from_hsl(self.play.rank.glow, 255);
        canvas.draw_image(
            &effects::ring(outer, ring, border),
            x - ring.round() as i64,
            y - ring.round() as i64,
        );

        match &self.avatar {
            Some(avatar) => canvas.draw_image(&effects::circle(avatar, diameter), x, y),
            None => {
                // a ring as thick as its radius is a disc
                let disc = effects::ring(diameter, diameter as f32 / 2.0, AVATAR_PLACEHOLDER);
                canvas.draw_image(&disc, x, y);
            }
        }
    }

    fn draw_header(&self, canvas: &mut Canvas, layout: &Layout) -> Result<(), Error> {
        let play = self.play;
        let max_width = layout.max_line_width();

        if let Some(artist) = &play.artist {
            let paint = Self::base(layout, 44.0).with_color(LABEL);
            Self::line(canvas, layout.artist(), artist, paint, max_width)?;
        }

        let title = Self::base(layout, 84.0).with_weight(FontWeight::Bold);
        Self::line(canvas, layout.title(), &play.title, title, max_width)?;

        let difficulty = match play.stars {
            Some(stars) if !play.difficulty.is_empty() => {
                format!("[{}]  {}", play.difficulty, format_stars(stars))
            }
            Some(stars) => format_stars(stars),
            None if !play.difficulty.is_empty() => format!("[{}]", play.difficulty),
            None => String::new(),
        };

        Self::line(canvas, layout.difficulty(), &difficulty, Self::base(layout, 52.0), max_width)
    }

    fn draw_left(&self, canvas: &mut Canvas, layout: &Layout) -> Result<(), Error> {
        let max_width = layout.max_column_width();
        let label = Self::base(layout, 34.0).with_color(LABEL);
        let value = Self::base(layout, 96.0).with_weight(FontWeight::Bold);

        if let Some(accuracy) = self.play.accuracy {
            let anchor = layout.accuracy();
            let label_anchor = Anchor {
                y: anchor.y - layout.px(100.0),
                ..anchor
            };

            Self::line(canvas, label_anchor, "ACCURACY", label, max_width)?;
            Self::line(canvas, anchor, &format_accuracy(accuracy), value, max_width)?;
        }

        let mods = self.play.mods.to_string();
        Self::line(
            canvas,
            layout.mods(),
            &format!("+{mods}"),
            value.with_font_size(layout.font_size(72.0)),
            max_width,
        )
    }

    fn draw_right(&self, canvas: &mut Canvas, layout: &Layout) -> Result<(), Error> {
        let rank = self.play.rank;
        let badge = layout.rank_badge();

        canvas.fill_rounded_rect(
            badge.x.round() as i64,
            badge.y.round() as i64,
            badge.width.round() as u32,
            badge.height.round() as u32,
            layout.px(28.0),
            Rgba([0, 0, 0, 150]),
        );

        let size = layout.font_size(140.0);
        let (cx, cy) = badge.center();
        let paint = Paint::color(color_from_hsl(rank.fill, 255))
            .with_font_size(size)
            .with_weight(FontWeight::Bold)
            .with_align(Align::Center)
            .with_glow(color_from_hsl(rank.glow, 220), layout.px(22.0));

        let metrics = canvas.measure_text(&rank.label, &paint)?;
        // center the cap height in the badge
        let baseline = cy + metrics.ascent * 0.36;
        canvas.fill_text(cx, baseline, &rank.label, &paint)?;

        if let Some(pp) = self.play.pp {
            let value = Self::base(layout, 84.0).with_weight(FontWeight::Bold);
            Self::line(canvas, layout.pp(), &format_pp(pp), value, layout.max_column_width())?;
        }

        Ok(())
    }

    fn draw_footer(&self, canvas: &mut Canvas, layout: &Layout) -> Result<(), Error> {
        let play = self.play;
        let player = Self::base(layout, 64.0).with_weight(FontWeight::Bold);
        Self::line(canvas, layout.player(), &play.player, player, layout.max_line_width())?;

        let anchor = layout.full_combo();

        if play.is_full_combo() {
            let paint = Self::base(layout, 56.0).with_weight(FontWeight::Bold);
            let metrics = canvas.measure_text("FC", &paint)?;

            let padding = layout.px(36.0);
            let width = metrics.width + padding * 2.0;
            let height = metrics.height() + layout.px(20.0);

            canvas.fill_rounded_rect(
                (anchor.x - width / 2.0).round() as i64,
                (anchor.y - metrics.ascent - layout.px(10.0)).round() as i64,
                width.round() as u32,
                height.round() as u32,
                height / 2.0,
                FC_BADGE,
            );
            canvas.fill_text(anchor.x, anchor.y, "FC", &paint)?;
        } else if let Some(misses) = play.misses.filter(|m| *m > 0) {
            let paint = Self::base(layout, 48.0).with_color(MISS);
            let text = if misses == 1 { "1 miss".to_owned() } else { format!("{misses} misses") };
            Self::line(canvas, anchor, &text, paint, layout.max_line_width())?;
        }

        Ok(())
    }
}

impl ThumbnailRenderer for Thumbnail<'_> {
    fn setup(&mut self, canvas: &mut Canvas) -> Result<(), Error> {
        canvas.load_fonts(&self.fonts)
    }

    fn draw(&mut self, canvas: &mut Canvas) -> Result<(), Error> {
        let layout = Layout::new(canvas.width(), canvas.height());

        self.draw_background(canvas, &layout);
        self.draw_avatar(canvas, &layout);
        self.draw_header(canvas, &layout)?;
        self.draw_left(canvas, &layout)?;
        self.draw_right(canvas, &layout)?;
        self.draw_footer(canvas, &layout)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;
    use lib::mods::{Mods, ModsOrigin};
    use lib::rank::Grade;
    use thumbnail::ThumbnailConf;
    use thumbnail::backend::ThumbnailBackend;
    use thumbnail::backend::memory::MemoryBackend;

    use super::*;

    fn play() -> PlayInfo {
        PlayInfo {
            title: "Some Song".into(),
            artist: Some("Someone".into()),
            difficulty: "Extra".into(),
            stars: Some(7.21),
            accuracy: Some(98.52),
            mods: Mods::HIDDEN | Mods::DOUBLE_TIME,
            mods_origin: ModsOrigin::Render,
            rank: Grade::SH,
            pp: Some(812.0),
            combo: Some(1500),
            max_combo: Some(1500),
            misses: Some(0),
            full_combo: None,
            player: "mrekk".into(),
            user_id: None,
            avatar_url: None,
            beatmap_id: None,
            beatmapset_id: None,
            covers: vec![],
        }
    }

    #[test]
    fn hsl_conversion() {
        let color = color_from_hsl(Grade::A.fill, 128);
        assert_eq!(color[3], 128);
        assert_eq!(color_from_hsl(Hsl::new_srgb(0.0, 0.0, 1.0), 255), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn renders_when_fonts_are_available() {
        let play = play();
        let renderer = Thumbnail {
            play: &play,
            background: Some(DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 36, Rgba([200, 100, 50, 255])))),
            avatar: None,
            fonts: FontConf::default(),
        };

        let conf = ThumbnailConf {
            width: 480,
            height: 270,
            ..Default::default()
        };

        match MemoryBackend.run(&conf, renderer) {
            Ok(image) => {
                assert_eq!(image.dimensions(), (480, 270));
                // background was dimmed
                assert!(image.get_pixel(2, 135)[0] < 200);
            }
            // machines without any of the fallback fonts
            Err(Error::FontNotFound(_)) => {}
            Err(err) => panic!("{err}"),
        }
    }
}
