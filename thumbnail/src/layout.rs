//! Fixed positions of the thumbnail elements. Everything is specified for a
//! 1920x1080 canvas and scaled uniformly for other sizes.

pub const CANVAS_WIDTH: u32 = 1920;
pub const CANVAS_HEIGHT: u32 = 1080;

pub const AVATAR_SIZE: f32 = 360.0;
pub const AVATAR_RING: f32 = 10.0;

const ARTIST_OFFSET: f32 = 260.0;
const TITLE_OFFSET: f32 = 170.0;
const DIFFICULTY_OFFSET: f32 = 70.0;
const SIDE_OFFSET: f32 = 330.0;
const PLAYER_OFFSET: f32 = 110.0;
const FC_OFFSET: f32 = 210.0;

const RANK_BADGE_WIDTH: f32 = 260.0;
const RANK_BADGE_HEIGHT: f32 = 170.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A baseline anchor, `x` is the horizontal center of the text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl Layout {
    pub fn new(width: u32, height: u32) -> Self {
        let scale = (width as f32 / CANVAS_WIDTH as f32).min(height as f32 / CANVAS_HEIGHT as f32);

        Self {
            width: width as f32,
            height: height as f32,
            scale,
        }
    }

    pub fn px(&self, value: f32) -> f32 {
        value * self.scale
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn avatar(&self) -> Rect {
        let (cx, cy) = self.center();
        let size = self.px(AVATAR_SIZE);
        Rect::centered(cx, cy, size, size)
    }

    fn above_avatar(&self, offset: f32) -> Anchor {
        let (cx, _) = self.center();
        Anchor {
            x: cx,
            y: self.avatar().y - self.px(offset),
        }
    }

    fn below_avatar(&self, offset: f32) -> Anchor {
        let (cx, _) = self.center();
        Anchor {
            x: cx,
            y: self.avatar().bottom() + self.px(offset),
        }
    }

    pub fn artist(&self) -> Anchor {
        self.above_avatar(ARTIST_OFFSET)
    }

    pub fn title(&self) -> Anchor {
        self.above_avatar(TITLE_OFFSET)
    }

    pub fn difficulty(&self) -> Anchor {
        self.above_avatar(DIFFICULTY_OFFSET)
    }

    pub fn player(&self) -> Anchor {
        self.below_avatar(PLAYER_OFFSET)
    }

    pub fn full_combo(&self) -> Anchor {
        self.below_avatar(FC_OFFSET)
    }

    pub fn left_column(&self) -> f32 {
        self.avatar().x - self.px(SIDE_OFFSET)
    }

    pub fn right_column(&self) -> f32 {
        self.avatar().right() + self.px(SIDE_OFFSET)
    }

    pub fn accuracy(&self) -> Anchor {
        let (_, cy) = self.center();
        Anchor {
            x: self.left_column(),
            y: cy - self.px(10.0),
        }
    }

    pub fn mods(&self) -> Anchor {
        let (_, cy) = self.center();
        Anchor {
            x: self.left_column(),
            y: cy + self.px(100.0),
        }
    }

    pub fn rank_badge(&self) -> Rect {
        let (_, cy) = self.center();
        Rect::centered(
            self.right_column(),
            cy - self.px(50.0),
            self.px(RANK_BADGE_WIDTH),
            self.px(RANK_BADGE_HEIGHT),
        )
    }

    pub fn pp(&self) -> Anchor {
        let (_, cy) = self.center();
        Anchor {
            x: self.right_column(),
            y: cy + self.px(120.0),
        }
    }

    /// Widest a centered line of text may get.
    pub fn max_line_width(&self) -> f32 {
        self.width - self.px(160.0)
    }

    /// Widest a side column line may get before it reaches the avatar.
    pub fn max_column_width(&self) -> f32 {
        2.0 * (self.avatar().x - self.px(40.0) - self.left_column())
    }

    pub fn font_size(&self, base: f32) -> f32 {
        self.px(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_is_centered() {
        let layout = Layout::default();
        let avatar = layout.avatar();

        assert_eq!(avatar.center(), (960.0, 540.0));
        assert_eq!(avatar.width, AVATAR_SIZE);
    }

    #[test]
    fn blocks_surround_the_avatar() {
        let layout = Layout::default();
        let avatar = layout.avatar();

        assert!(layout.artist().y < layout.title().y);
        assert!(layout.title().y < layout.difficulty().y);
        assert!(layout.difficulty().y < avatar.y);
        assert!(layout.player().y > avatar.bottom());
        assert!(layout.full_combo().y > layout.player().y);
        assert!(layout.accuracy().x < avatar.x);
        assert!(layout.rank_badge().x > avatar.right());
        assert!(layout.pp().x > avatar.right());
    }

    #[test]
    fn everything_fits_on_canvas() {
        let layout = Layout::default();

        assert!(layout.artist().y - layout.font_size(44.0) > 0.0);
        assert!(layout.full_combo().y < layout.height);
        assert!(layout.rank_badge().right() < layout.width);
        assert!(layout.left_column() - layout.max_column_width() / 2.0 >= 0.0);
    }

    #[test]
    fn scales_with_canvas() {
        let layout = Layout::new(960, 540);

        assert_eq!(layout.scale, 0.5);
        assert_eq!(layout.avatar().center(), (480.0, 270.0));
        assert_eq!(layout.avatar().width, AVATAR_SIZE / 2.0);
    }
}
