use std::fmt;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::difficulty::DifficultyCandidate;
use crate::mods::Mods;
use crate::pp::{DifficultyAttributes, HitCounts, ObjectCounts, ScoreState};
use crate::rank::Grade;

pub const OSU_BASE: &str = "https://osu.ppy.sh/";
pub const AVATAR_BASE: &str = "https://a.ppy.sh/";

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

impl User {
    pub fn avatar_url(&self) -> String {
        self.avatar_url
            .clone()
            .unwrap_or_else(|| format!("{AVATAR_BASE}{}", self.id))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Covers {
    #[serde(rename = "cover@2x", default)]
    pub cover_2x: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(rename = "card@2x", default)]
    pub card_2x: Option<String>,
    #[serde(default)]
    pub card: Option<String>,
}

impl Covers {
    /// Largest cover first.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        [&self.cover_2x, &self.cover, &self.card_2x, &self.card]
            .into_iter()
            .filter_map(|c| c.as_deref())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Beatmap {
    pub id: u64,
    pub beatmapset_id: u64,
    pub version: String,
    pub difficulty_rating: f64,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub max_combo: Option<u32>,
    #[serde(default)]
    pub count_circles: u32,
    #[serde(default)]
    pub count_sliders: u32,
    #[serde(default)]
    pub count_spinners: u32,
    /// Overall difficulty.
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub ar: f64,
    #[serde(default)]
    pub cs: f64,
}

impl Beatmap {
    pub fn objects(&self) -> ObjectCounts {
        ObjectCounts {
            circles: self.count_circles,
            sliders: self.count_sliders,
            spinners: self.count_spinners,
        }
    }
}

impl DifficultyCandidate for Beatmap {
    fn version(&self) -> &str {
        &self.version
    }

    fn star_rating(&self) -> Option<f64> {
        Some(self.difficulty_rating)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Beatmapset {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub title_unicode: Option<String>,
    pub artist: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub covers: Covers,
    #[serde(default)]
    pub beatmaps: Vec<Beatmap>,
}

/// Score mods are plain acronyms on legacy endpoints and objects on lazer ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreMod {
    Acronym(String),
    Object { acronym: String },
}

impl ScoreMod {
    pub fn acronym(&self) -> &str {
        match self {
            ScoreMod::Acronym(acronym) => acronym,
            ScoreMod::Object { acronym } => acronym,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(alias = "great", default)]
    pub count_300: u32,
    #[serde(alias = "ok", default)]
    pub count_100: u32,
    #[serde(alias = "meh", default)]
    pub count_50: u32,
    #[serde(alias = "miss", default)]
    pub count_miss: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub id: Option<u64>,
    /// `0.0..=1.0`
    pub accuracy: f64,
    pub max_combo: u32,
    #[serde(default)]
    pub mods: Vec<ScoreMod>,
    #[serde(default)]
    pub pp: Option<f64>,
    pub rank: Grade,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub perfect: Option<bool>,
    #[serde(default)]
    pub beatmap: Option<Beatmap>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Score {
    pub fn mods(&self) -> Mods {
        Mods::from_acronyms(self.mods.iter().map(ScoreMod::acronym))
    }

    pub fn hit_counts(&self) -> HitCounts {
        let s = &self.statistics;
        HitCounts::new(s.count_300, s.count_100, s.count_50, s.count_miss)
    }

    /// Hit counts, reconstructed from accuracy when the API left them out.
    pub fn hit_counts_for(&self, objects: &ObjectCounts) -> HitCounts {
        let counts = self.hit_counts();

        if counts.total() > 0 || objects.total() == 0 {
            return counts;
        }

        HitCounts::from_accuracy(self.accuracy, objects.total(), counts.misses)
    }

    pub fn state(&self, objects: &ObjectCounts) -> ScoreState {
        ScoreState {
            max_combo: self.max_combo,
            counts: self.hit_counts_for(objects),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct ScoresResponse {
    #[serde(default)]
    scores: Vec<Score>,
}

#[derive(Clone, Debug, Deserialize)]
struct AttributesResponse {
    attributes: DifficultyAttributes,
}

#[derive(Clone, Debug)]
pub struct OsuApi {
    client: reqwest::Client,
    base: Url,
    token: String,
}

async fn check_status(response: reqwest::Response) -> crate::Result<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();

    Err(crate::Error::Api {
        url,
        status: status.as_u16(),
        body,
    })
}

impl OsuApi {
    /// Client-credentials OAuth flow with the `public` scope.
    pub async fn authenticate(
        client: &reqwest::Client,
        base: &str,
        credentials: &Credentials,
    ) -> crate::Result<AccessToken> {
        let url = Url::parse(base)?.join("oauth/token")?;

        debug!("requesting access token");

        let response = client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", "public"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::Error::Authentication(format!("{status}: {body}")));
        }

        Ok(response.json().await?)
    }

    pub fn new(client: reqwest::Client, base: &str, token: impl Into<String>) -> crate::Result<Self> {
        Ok(Self {
            client,
            base: Url::parse(base)?.join("api/v2/")?,
            token: token.into(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> crate::Result<T> {
        let url = self.base.join(endpoint)?;

        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    pub async fn user(&self, username: &str) -> crate::Result<User> {
        self.get(&format!("users/{username}/osu"), &[("key", "username")])
            .await
    }

    pub async fn beatmapset(&self, beatmapset_id: u64) -> crate::Result<Beatmapset> {
        self.get(&format!("beatmapsets/{beatmapset_id}"), &[]).await
    }

    pub async fn beatmap(&self, beatmap_id: u64) -> crate::Result<Beatmap> {
        self.get(&format!("beatmaps/{beatmap_id}"), &[]).await
    }

    pub async fn score(&self, score_id: u64) -> crate::Result<Score> {
        self.get(&format!("scores/{score_id}"), &[]).await
    }

    /// Every score `user_id` has set on `beatmap_id`.
    pub async fn user_beatmap_scores(&self, beatmap_id: u64, user_id: u64) -> crate::Result<Vec<Score>> {
        let response: ScoresResponse = self
            .get(
                &format!("beatmaps/{beatmap_id}/scores/users/{user_id}/all"),
                &[("mode", "osu")],
            )
            .await?;

        Ok(response.scores)
    }

    pub async fn beatmap_attributes(&self, beatmap_id: u64, mods: Mods) -> crate::Result<DifficultyAttributes> {
        let url = self.base.join(&format!("beatmaps/{beatmap_id}/attributes"))?;

        debug!("POST {url} ({mods})");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "mods": mods.bits(), "ruleset": "osu" }))
            .send()
            .await?;

        let response: AttributesResponse = check_status(response).await?.json().await?;

        Ok(response.attributes)
    }
}

/// Picks the score that best matches what the render reports: closest
/// accuracy when known, otherwise the highest PP.
pub fn pick_score(scores: &[Score], accuracy: Option<f64>, mods: Option<Mods>) -> Option<&Score> {
    if let Some(accuracy) = accuracy {
        let accuracy = accuracy / 100.0;

        return scores.iter().min_by(|a, b| {
            let key = |s: &Score| {
                let mods_penalty = match mods {
                    Some(m) if !m.is_empty() && s.mods() != m => 1.0,
                    _ => 0.0,
                };
                (s.accuracy - accuracy).abs() + mods_penalty
            };

            key(a).total_cmp(&key(b))
        });
    }

    scores
        .iter()
        .max_by(|a, b| a.pp.unwrap_or(0.0).total_cmp(&b.pp.unwrap_or(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEATMAPSET: &str = r#"{
        "id": 654321,
        "title": "Some Song",
        "artist": "Someone",
        "creator": "Mapper",
        "covers": {"cover": "https://assets.ppy.sh/c.jpg", "cover@2x": "https://assets.ppy.sh/c@2x.jpg"},
        "beatmaps": [
            {"id": 1, "beatmapset_id": 654321, "version": "Hard", "difficulty_rating": 3.4, "mode": "osu", "max_combo": 600},
            {"id": 2, "beatmapset_id": 654321, "version": "Extra", "difficulty_rating": 6.12, "mode": "osu",
             "max_combo": 1500, "count_circles": 700, "count_sliders": 380, "count_spinners": 2, "accuracy": 9, "ar": 9.6}
        ]
    }"#;

    #[test]
    fn parses_beatmapset() {
        let set: Beatmapset = serde_json::from_str(BEATMAPSET).unwrap();

        assert_eq!(set.beatmaps.len(), 2);
        assert_eq!(set.beatmaps[1].objects().total(), 1082);
        assert_eq!(
            set.covers.candidates().collect::<Vec<_>>(),
            ["https://assets.ppy.sh/c@2x.jpg", "https://assets.ppy.sh/c.jpg"]
        );
    }

    #[test]
    fn parses_legacy_and_lazer_scores() {
        let legacy: Score = serde_json::from_str(
            r#"{"accuracy": 0.9852, "max_combo": 1234, "mods": ["HD", "DT"], "pp": 512.3, "rank": "SH",
                "statistics": {"count_300": 1000, "count_100": 20, "count_50": 0, "count_miss": 2}}"#,
        )
        .unwrap();

        assert_eq!(legacy.mods().to_string(), "HDDT");
        assert_eq!(legacy.rank, Grade::SH);
        assert_eq!(legacy.hit_counts(), HitCounts::new(1000, 20, 0, 2));

        let lazer: Score = serde_json::from_str(
            r#"{"accuracy": 1.0, "max_combo": 1500, "mods": [{"acronym": "NC", "settings": {}}, {"acronym": "CL"}],
                "pp": null, "rank": "X", "statistics": {"great": 1082}}"#,
        )
        .unwrap();

        assert_eq!(lazer.mods().to_string(), "NC");
        assert_eq!(lazer.pp, None);
        assert_eq!(lazer.hit_counts(), HitCounts::new(1082, 0, 0, 0));
    }

    #[test]
    fn reconstructs_counts_from_accuracy() {
        let score: Score =
            serde_json::from_str(r#"{"accuracy": 0.98, "max_combo": 10, "rank": "A"}"#).unwrap();
        let objects = ObjectCounts {
            circles: 900,
            sliders: 100,
            spinners: 0,
        };

        let counts = score.hit_counts_for(&objects);
        assert_eq!(counts.total(), 1000);
        assert!((counts.accuracy() - 0.98).abs() < 0.001);
    }

    #[test]
    fn picks_closest_accuracy() {
        let scores: Vec<Score> = serde_json::from_str(
            r#"[
                {"accuracy": 0.95, "max_combo": 1, "rank": "A", "pp": 400, "mods": ["HD"]},
                {"accuracy": 0.985, "max_combo": 1, "rank": "S", "pp": 300, "mods": ["HD"]},
                {"accuracy": 0.986, "max_combo": 1, "rank": "S", "pp": 310, "mods": ["DT"]}
            ]"#,
        )
        .unwrap();

        let picked = pick_score(&scores, Some(98.52), Some(Mods::HIDDEN)).unwrap();
        assert_eq!(picked.pp, Some(300.0));

        let best = pick_score(&scores, None, None).unwrap();
        assert_eq!(best.pp, Some(400.0));

        assert!(pick_score(&[], Some(98.0), None).is_none());
    }

    #[test]
    fn credentials_are_redacted() {
        let creds = Credentials::new("123", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
        assert!(creds.is_complete());
        assert!(!Credentials::default().is_complete());
    }
}
