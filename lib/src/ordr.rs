use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::description::PlayDescription;
use crate::link::{RenderLink, render_id_from_url};
use crate::mods::Mods;

pub const ORDR_API: &str = "https://apis.issou.best/ordr/";

/// Mods as the render service reports them, either a stable bit-flag
/// integer or an acronym string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RenderMods {
    Bits(u32),
    Text(String),
}

impl Default for RenderMods {
    fn default() -> Self {
        RenderMods::Bits(0)
    }
}

impl RenderMods {
    pub fn to_mods(&self) -> Option<Mods> {
        match self {
            RenderMods::Bits(bits) => Some(Mods::from_bits(*bits)),
            RenderMods::Text(text) => match text.parse() {
                Ok(mods) => Some(mods),
                Err(err) => {
                    debug!("unreadable render mods {text:?}: {err}");
                    None
                }
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Render {
    #[serde(rename = "renderID")]
    pub render_id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub map_title: String,
    #[serde(default)]
    pub replay_difficulty: String,
    #[serde(default)]
    pub replay_username: String,
    #[serde(
        rename = "mapID",
        default,
        deserialize_with = "serde_aux::prelude::deserialize_option_number_from_string"
    )]
    pub map_id: Option<u64>,
    #[serde(default)]
    pub replay_mods: RenderMods,
    #[serde(default)]
    pub map_link: Option<String>,
}

impl Render {
    /// Description and title parsed together, the description taking precedence.
    pub fn play_description(&self) -> PlayDescription {
        PlayDescription::parse(&self.description).or(PlayDescription::parse(&self.title))
    }

    /// `mapTitle` is `Artist - Title [Difficulty]`; returns the title part.
    pub fn song_title(&self) -> &str {
        let title = self.map_title.trim();
        let title = match title.rsplit_once(" [") {
            Some((head, tail)) if tail.ends_with(']') => head,
            _ => title,
        };

        title.split_once(" - ").map_or(title, |(_, t)| t).trim()
    }

    pub fn artist(&self) -> Option<&str> {
        self.map_title
            .split_once(" - ")
            .map(|(artist, _)| artist.trim())
    }
}

#[derive(Clone, Debug, Deserialize)]
struct RendersResponse {
    #[serde(default)]
    renders: Vec<Render>,
}

#[derive(Clone, Debug)]
pub struct OrdrClient {
    client: reqwest::Client,
    base: Url,
}

impl OrdrClient {
    pub fn new(client: reqwest::Client) -> crate::Result<Self> {
        Self::with_base(client, ORDR_API)
    }

    pub fn with_base(client: reqwest::Client, base: &str) -> crate::Result<Self> {
        Ok(Self {
            client,
            base: Url::parse(base)?,
        })
    }

    pub async fn render(&self, render_id: u64) -> crate::Result<Render> {
        let url = self.base.join("renders")?;

        debug!("fetching render {render_id}");

        let response = self
            .client
            .get(url)
            .query(&[("renderID", render_id)])
            .send()
            .await?
            .error_for_status()?
            .json::<RendersResponse>()
            .await?;

        response
            .renders
            .into_iter()
            .find(|r| r.render_id == render_id)
            .ok_or(crate::Error::RenderNotFound(render_id))
    }

    /// Turns any render link into an id, following short-link redirects.
    pub async fn resolve_link(&self, link: &RenderLink) -> crate::Result<u64> {
        match link {
            RenderLink::Id(id) => Ok(*id),
            RenderLink::Short(url) => {
                debug!("following short link {url}");

                let response = self.client.get(url.clone()).send().await?;
                let landed = response.url().clone();

                render_id_from_url(&landed)
                    .ok_or_else(|| crate::Error::InvalidLink(landed.to_string()))
            }
        }
    }
}
