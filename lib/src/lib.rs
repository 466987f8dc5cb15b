use thiserror::Error;

pub mod archive;
pub mod description;
pub mod difficulty;
pub mod fc;
pub mod link;
pub mod mirror;
pub mod mods;
pub mod ordr;
pub mod osu;
pub mod osu_file;
pub mod pp;
pub mod rank;
pub mod util;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid render link: {0}")]
    InvalidLink(String),
    #[error("Render {0} not found")]
    RenderNotFound(u64),
    #[error("Unknown mod: {0}")]
    UnknownMod(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Request to {url} failed with status {status}: {body}")]
    Api {
        url: String,
        status: u16,
        body: String,
    },
    #[error("No score found for user {user_id} on beatmap {beatmap_id}")]
    NoScore { beatmap_id: u64, user_id: u64 },
    #[error("Beatmap archive unavailable from every mirror")]
    NoMirror,
    #[error("Not a beatmap archive")]
    InvalidArchive,
    #[error("No background image found")]
    NoBackground,
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    UrlError(#[from] url::ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// Re-Exports
pub use image;
pub use lazy_static;
pub use levenshtein;
pub use palette;
pub use rayon;
pub use reqwest;
pub use serde;
pub use serde_json;
pub use url;
