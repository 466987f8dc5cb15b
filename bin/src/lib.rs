pub mod args;
pub mod assets;
pub mod cache;
pub mod config;
pub mod play;
pub mod render;

pub use anyhow;
pub use env_logger;
pub use tokio;

use std::path::PathBuf;

use anyhow::Context;
use lib::link::RenderLink;
use lib::mirror::DEFAULT_MIRRORS;
use lib::ordr::OrdrClient;
use lib::osu::{OSU_BASE, OsuApi};
use log::{info, warn};
use thumbnail::ThumbnailConf;
use thumbnail::backend::ThumbnailBackend;
use thumbnail::backend::jpeg::JpegBackend;
use thumbnail::font::FontConf;

use crate::args::Args;
use crate::cache::Cache;
use crate::config::Config;
use crate::play::PlayInfo;
use crate::render::Thumbnail;

const USER_AGENT: &str = concat!("ordr-thumbnail/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(60))
        .build()?)
}

fn load_config(args: &Args) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let path = args.config.clone().or_else(Config::default_path);

    let config = match &path {
        Some(path) => Config::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::default(),
    };

    Ok((config, path))
}

/// Mirrors from flags, then the config file, then the built-in list.
pub fn mirrors(args: &Args, config: &Config) -> Vec<String> {
    if !args.assets.mirrors.is_empty() {
        return args.assets.mirrors.clone();
    }

    if !config.mirrors.is_empty() {
        return config.mirrors.clone();
    }

    DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect()
}

/// Fonts from flags come before the ones in the config file.
pub fn fonts(args: &Args, config: &Config) -> FontConf {
    FontConf {
        regular: args.assets.fonts.iter().chain(&config.fonts.regular).cloned().collect(),
        bold: args.assets.bold_fonts.iter().chain(&config.fonts.bold).cloned().collect(),
        no_system_fallback: config.fonts.no_system_fallback,
    }
}

async fn connect(
    client: &reqwest::Client,
    cache: &Cache,
    args: &Args,
    config: &mut Config,
    config_path: Option<&std::path::Path>,
) -> anyhow::Result<Option<OsuApi>> {
    if args.credentials.no_api {
        return Ok(None);
    }

    config::load_dotenv();

    let Some(credentials) = config::resolve_credentials(
        args.credentials.credentials(),
        config::env_credentials(),
        config,
    ) else {
        info!("no osu! credentials configured");
        return Ok(None);
    };

    if args.credentials.save_credentials {
        match config_path {
            Some(path) => {
                config.set_credentials(&credentials);
                config.save(path)?;
            }
            None => warn!("no config directory, credentials not saved"),
        }
    }

    match cache.token(client, OSU_BASE, &credentials).await {
        Ok(token) => Ok(Some(OsuApi::new(client.clone(), OSU_BASE, token)?)),
        Err(err) => {
            warn!("osu! authentication failed, continuing without the API: {err}");
            Ok(None)
        }
    }
}

/// Gathers the play without rendering anything. Returns the play and the
/// id the default output name is derived from.
pub async fn gather(
    args: &Args,
    client: &reqwest::Client,
    api: Option<&OsuApi>,
) -> anyhow::Result<(PlayInfo, u64)> {
    if let Some(score_id) = args.score {
        let api = api.context("building from a score id needs osu! API credentials")?;
        let play = play::from_score(api, score_id).await?;
        return Ok((play, score_id));
    }

    let link = args.link.as_deref().context("no render link given")?;
    let link: RenderLink = link.parse()?;

    let ordr = OrdrClient::new(client.clone())?;
    let render_id = ordr.resolve_link(&link).await?;
    let render = ordr.render(render_id).await?;

    info!("render {render_id}: {} by {}", render.map_title, render.replay_username);

    let play = play::from_render(&render, api, args.star_tolerance).await;
    Ok((play, render_id))
}

/// Runs the whole pipeline and returns where the thumbnail was saved.
pub async fn activate(args: Args) -> anyhow::Result<PathBuf> {
    let (mut config, config_path) = load_config(&args)?;

    let client = http_client()?;
    let cache_dir = args
        .assets
        .cache_dir
        .clone()
        .or_else(Cache::default_dir)
        .unwrap_or_else(|| std::env::temp_dir().join("ordr-thumbnail"));
    let cache = Cache::new(cache_dir);

    let api = connect(&client, &cache, &args, &mut config, config_path.as_deref()).await?;
    let (play, id) = gather(&args, &client, api.as_ref()).await?;

    if args.print_info {
        println!("{}", serde_json::to_string_pretty(&play)?);
    }

    let mirrors = mirrors(&args, &config);
    let background = assets::background(&client, &cache, &mirrors, &play, !args.assets.no_archive).await;
    let avatar = assets::avatar(&client, &play).await;

    let renderer = Thumbnail {
        play: &play,
        background,
        avatar,
        fonts: fonts(&args, &config),
    };

    let conf = ThumbnailConf {
        quality: args.quality,
        save_path: Some(args.output_path(id)),
        ..Default::default()
    };

    Ok(JpegBackend.run(&conf, renderer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_precedence() {
        let mut args = Args::default();
        let mut config = Config::default();

        assert_eq!(mirrors(&args, &config).len(), DEFAULT_MIRRORS.len());

        config.mirrors = vec!["https://config/{id}".into()];
        assert_eq!(mirrors(&args, &config), vec!["https://config/{id}".to_string()]);

        args.assets.mirrors = vec!["https://flag/{id}".into()];
        assert_eq!(mirrors(&args, &config), vec!["https://flag/{id}".to_string()]);
    }

    #[test]
    fn flag_fonts_first() {
        let mut args = Args::default();
        args.assets.fonts = vec!["a.ttf".into()];

        let config = Config {
            fonts: FontConf {
                regular: vec!["b.ttf".into()],
                ..Default::default()
            },
            ..Default::default()
        };

        let fonts = fonts(&args, &config);
        assert_eq!(fonts.regular, vec![PathBuf::from("a.ttf"), PathBuf::from("b.ttf")]);
        assert!(fonts.bold.is_empty());
    }

    #[tokio::test]
    async fn score_needs_api() {
        let args = Args {
            score: Some(1),
            ..Default::default()
        };

        let client = http_client().unwrap();
        assert!(gather(&args, &client, None).await.is_err());
    }
}
