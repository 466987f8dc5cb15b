use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lib::osu::{AccessToken, Credentials, OsuApi};
use log::debug;
use serde::{Deserialize, Serialize};

pub const ARCHIVE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Tokens are refreshed this long before the server says they expire.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

fn is_fresh(path: &Path, max_age: Duration) -> anyhow::Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let modified = path.metadata().and_then(|m| m.modified())?;
    // a modification time in the future counts as fresh
    let age = SystemTime::now().duration_since(modified).unwrap_or_default();

    Ok(age < max_age)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("part");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(tmp, path)?;

    Ok(())
}

/// Reads `path` when younger than `max_age`, otherwise calls `update`
/// and stores its result.
pub async fn get_or_update_bytes(
    path: PathBuf,
    max_age: Duration,
    update: impl AsyncFnOnce() -> anyhow::Result<Vec<u8>>,
) -> anyhow::Result<Vec<u8>> {
    if is_fresh(&path, max_age)? {
        debug!("up to date, reading {} from cache", path.display());
        return Ok(std::fs::read(&path)?);
    }

    debug!("missing or out of date, fetching {}", path.display());

    let bytes = update().await?;
    write_atomic(&path, &bytes)?;

    Ok(bytes)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToken {
    pub client_id: String,
    pub access_token: String,
    /// Unix seconds.
    pub expires_at: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl CachedToken {
    pub fn new(client_id: &str, token: &AccessToken) -> Self {
        Self {
            client_id: client_id.to_owned(),
            access_token: token.access_token.clone(),
            expires_at: unix_now() + token.expires_in,
        }
    }

    pub fn is_valid_for(&self, client_id: &str) -> bool {
        self.client_id == client_id && unix_now() + TOKEN_MARGIN.as_secs() < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct Cache {
    pub dir: PathBuf,
}

impl Cache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn default_dir() -> Option<PathBuf> {
        Some(dirs::cache_dir()?.join("ordr-thumbnail"))
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.join("token.json")
    }

    pub fn archive_path(&self, beatmapset_id: u64) -> PathBuf {
        self.dir.join("beatmapsets").join(format!("{beatmapset_id}.osz"))
    }

    /// An access token for `credentials`, reusing the cached one until it
    /// expires.
    pub async fn token(
        &self,
        client: &reqwest::Client,
        base: &str,
        credentials: &Credentials,
    ) -> anyhow::Result<String> {
        let path = self.token_path();

        if let Ok(file) = std::fs::File::open(&path)
            && let Ok(cached) = serde_json::from_reader::<_, CachedToken>(file)
            && cached.is_valid_for(&credentials.client_id)
        {
            debug!("using cached access token");
            return Ok(cached.access_token);
        }

        let token = OsuApi::authenticate(client, base, credentials).await?;
        let cached = CachedToken::new(&credentials.client_id, &token);
        write_atomic(&path, &serde_json::to_vec(&cached)?)?;

        Ok(cached.access_token)
    }

    pub async fn archive(
        &self,
        beatmapset_id: u64,
        fetch: impl AsyncFnOnce() -> anyhow::Result<Vec<u8>>,
    ) -> anyhow::Result<Vec<u8>> {
        get_or_update_bytes(self.archive_path(beatmapset_id), ARCHIVE_MAX_AGE, fetch).await
    }
}
