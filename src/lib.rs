//! Thumbnails for o!rdr replay renders.
//!
//! `lib` holds the osu! and o!rdr data handling, `thumbnail` the image
//! compositing and `bin` the pipeline tying them together.

pub use bin;
pub use lib;
pub use thumbnail;

pub use bin::activate;
pub use bin::args::Args;
pub use bin::play::PlayInfo;
