use image::DynamicImage;
use lib::archive::BeatmapArchive;
use lib::mirror::download_beatmapset;
use lib::osu::AVATAR_BASE;
use log::{debug, info, warn};

use crate::cache::Cache;
use crate::play::PlayInfo;

pub async fn fetch_image(client: &reqwest::Client, url: &str) -> anyhow::Result<DynamicImage> {
    debug!("fetching image {url}");

    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    Ok(image::load_from_memory(&bytes)?)
}

async fn archive_background(
    client: &reqwest::Client,
    cache: &Cache,
    mirrors: &[String],
    play: &PlayInfo,
    beatmapset_id: u64,
) -> anyhow::Result<DynamicImage> {
    let bytes = cache
        .archive(beatmapset_id, async || {
            Ok(download_beatmapset(client, mirrors, beatmapset_id).await?)
        })
        .await?;

    let mut archive = BeatmapArchive::from_bytes(bytes)?;
    let difficulty = archive.difficulty(play.beatmap_id, &play.difficulty).cloned();

    match &difficulty {
        Some(d) => debug!("archive difficulty {}", d.file_name),
        None => debug!("no archive difficulty matches {:?}", play.difficulty),
    }

    Ok(archive.background(difficulty.as_ref())?)
}

/// Background art: the archive's, then the API covers. `None` means the
/// caller should fall back to a plain canvas.
pub async fn background(
    client: &reqwest::Client,
    cache: &Cache,
    mirrors: &[String],
    play: &PlayInfo,
    use_archive: bool,
) -> Option<DynamicImage> {
    if use_archive && let Some(beatmapset_id) = play.beatmapset_id {
        match archive_background(client, cache, mirrors, play, beatmapset_id).await {
            Ok(image) => return Some(image),
            Err(err) => warn!("no background from archive: {err}"),
        }
    }

    for url in play.cover_urls() {
        match fetch_image(client, url).await {
            Ok(image) => {
                info!("using cover {url} as background");
                return Some(image);
            }
            Err(err) => warn!("cover {url} failed: {err}"),
        }
    }

    warn!("no background found, using a plain canvas");
    None
}

pub fn avatar_url(play: &PlayInfo) -> Option<String> {
    play.avatar_url
        .clone()
        .or_else(|| play.user_id.map(|id| format!("{AVATAR_BASE}{id}")))
}

pub async fn avatar(client: &reqwest::Client, play: &PlayInfo) -> Option<DynamicImage> {
    let url = avatar_url(play)?;

    match fetch_image(client, &url).await {
        Ok(image) => Some(image),
        Err(err) => {
            warn!("avatar {url} failed: {err}");
            None
        }
    }
}
