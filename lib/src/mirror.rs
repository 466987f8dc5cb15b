use log::{debug, warn};

use crate::archive::is_zip;

pub const DEFAULT_MIRRORS: &[&str] = &[
    "https://catboy.best/d/{id}",
    "https://api.nerinyan.moe/d/{id}",
    "https://osu.direct/api/d/{id}",
];

/// Fills the `{id}` placeholder of a mirror template, appending the id when
/// the template has none.
pub fn mirror_url(template: &str, beatmapset_id: u64) -> String {
    if template.contains("{id}") {
        template.replace("{id}", &beatmapset_id.to_string())
    } else {
        format!("{}/{beatmapset_id}", template.trim_end_matches('/'))
    }
}

/// Downloads a beatmap-set archive, trying each mirror in order.
pub async fn download_beatmapset(
    client: &reqwest::Client,
    mirrors: &[String],
    beatmapset_id: u64,
) -> crate::Result<Vec<u8>> {
    for template in mirrors {
        let url = mirror_url(template, beatmapset_id);
        debug!("downloading beatmapset from {url}");

        let response = match client.get(&url).send().await.and_then(|r| r.error_for_status()) {
            Ok(response) => response,
            Err(err) => {
                warn!("mirror {url} failed: {err}");
                continue;
            }
        };

        match response.bytes().await {
            Ok(bytes) if is_zip(&bytes) => return Ok(bytes.to_vec()),
            Ok(_) => warn!("mirror {url} did not return an archive"),
            Err(err) => warn!("mirror {url} failed mid-download: {err}"),
        }
    }

    Err(crate::Error::NoMirror)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_template() {
        assert_eq!(mirror_url("https://catboy.best/d/{id}", 42), "https://catboy.best/d/42");
        assert_eq!(mirror_url("https://example.com/d/", 42), "https://example.com/d/42");
    }

    #[tokio::test]
    async fn no_mirrors_is_an_error() {
        let client = reqwest::Client::new();
        let result = download_beatmapset(&client, &[], 1).await;
        assert!(matches!(result, Err(crate::Error::NoMirror)));
    }
}
