use std::path::{Path, PathBuf};

use lib::osu::Credentials;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thumbnail::font::FontConf;

pub const CLIENT_ID_VAR: &str = "OSU_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "OSU_CLIENT_SECRET";
/// Unprefixed names, as written by older `.env.local` files.
pub const LEGACY_CLIENT_ID_VAR: &str = "CLIENT_ID";
pub const LEGACY_CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";

/// Persistent settings, stored as JSON under the user's config directory.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Overrides the built-in mirror list when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mirrors: Vec<String>,
    #[serde(default)]
    pub fonts: FontConf,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("ordr-thumbnail").join("config.json"))
    }

    /// A missing file is an empty config.
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            debug!("no config at {}", path.display());
            return Ok(Config::default());
        }

        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)?;

        serde_json::to_writer_pretty(file, self)?;
        info!("saved config to {}", path.display());

        Ok(())
    }

    pub fn credentials(&self) -> Option<Credentials> {
        complete(self.client_id.clone(), self.client_secret.clone())
    }

    pub fn set_credentials(&mut self, credentials: &Credentials) {
        self.client_id = Some(credentials.client_id.clone());
        self.client_secret = Some(credentials.client_secret.clone());
    }
}

fn complete(id: Option<String>, secret: Option<String>) -> Option<Credentials> {
    let credentials = Credentials::new(id?, secret?);
    credentials.is_complete().then_some(credentials)
}

/// Loads `.env.local` then `.env` from the working directory. Variables
/// already set in the environment are left alone.
pub fn load_dotenv() {
    for file in [".env.local", ".env"] {
        match dotenvy::from_filename(file) {
            Ok(path) => debug!("loaded {}", path.display()),
            Err(err) if err.not_found() => {}
            Err(err) => log::warn!("failed to load {file}: {err}"),
        }
    }
}

pub fn env_credentials() -> Option<Credentials> {
    credentials_from(|name| std::env::var(name).ok())
}

/// The `OSU_` pair wins; the unprefixed pair is used only when it is unset.
fn credentials_from(lookup: impl Fn(&str) -> Option<String>) -> Option<Credentials> {
    complete(lookup(CLIENT_ID_VAR), lookup(CLIENT_SECRET_VAR)).or_else(|| {
        let credentials = complete(lookup(LEGACY_CLIENT_ID_VAR), lookup(LEGACY_CLIENT_SECRET_VAR))?;
        debug!("using {LEGACY_CLIENT_ID_VAR}/{LEGACY_CLIENT_SECRET_VAR}");
        Some(credentials)
    })
}

/// First complete pair out of flags, environment and config file.
pub fn resolve_credentials(
    flags: Option<Credentials>,
    env: Option<Credentials>,
    config: &Config,
) -> Option<Credentials> {
    let (credentials, source) = match (flags, env, config.credentials()) {
        (Some(c), _, _) => (c, "flags"),
        (None, Some(c), _) => (c, "environment"),
        (None, None, Some(c)) => (c, "config"),
        (None, None, None) => return None,
    };

    debug!("using osu! credentials from {source}");
    Some(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence() {
        let flags = Credentials::new("1", "flag");
        let env = Credentials::new("2", "env");
        let config = Config {
            client_id: Some("3".into()),
            client_secret: Some("config".into()),
            ..Default::default()
        };

        let picked = resolve_credentials(Some(flags.clone()), Some(env.clone()), &config).unwrap();
        assert_eq!(picked.client_secret, "flag");

        let picked = resolve_credentials(None, Some(env), &config).unwrap();
        assert_eq!(picked.client_secret, "env");

        let picked = resolve_credentials(None, None, &config).unwrap();
        assert_eq!(picked.client_secret, "config");

        assert!(resolve_credentials(None, None, &Config::default()).is_none());
    }

    #[test]
    fn unprefixed_env_vars() {
        fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
            move |name| {
                pairs
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| value.to_string())
            }
        }

        let legacy = credentials_from(vars(&[("CLIENT_ID", "7"), ("CLIENT_SECRET", "old")])).unwrap();
        assert_eq!(legacy.client_id, "7");
        assert_eq!(legacy.client_secret, "old");

        let both = credentials_from(vars(&[
            ("CLIENT_ID", "7"),
            ("CLIENT_SECRET", "old"),
            ("OSU_CLIENT_ID", "8"),
            ("OSU_CLIENT_SECRET", "new"),
        ]))
        .unwrap();
        assert_eq!(both.client_secret, "new");

        // an incomplete prefixed pair does not shadow a complete legacy one
        let mixed = credentials_from(vars(&[
            ("OSU_CLIENT_ID", "8"),
            ("CLIENT_ID", "7"),
            ("CLIENT_SECRET", "old"),
        ]))
        .unwrap();
        assert_eq!(mixed.client_id, "7");

        assert!(credentials_from(vars(&[("CLIENT_ID", "7")])).is_none());
    }

    #[test]
    fn half_configured_is_none() {
        let config = Config {
            client_id: Some("3".into()),
            ..Default::default()
        };

        assert!(config.credentials().is_none());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert_eq!(Config::load(&path).unwrap(), Config::default());

        let mut config = Config {
            mirrors: vec!["https://example.com/d/{id}".into()],
            ..Default::default()
        };
        config.set_credentials(&Credentials::new("42", "secret"));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.credentials().unwrap().client_id, "42");
    }
}
