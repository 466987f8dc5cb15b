use std::fmt;
use std::str::FromStr;

use url::Url;

/// Hosts whose first path segment is a short code redirecting to a render.
const SHORT_LINK_HOSTS: &[&str] = &["link.issou.best", "l.issou.best"];

/// Path segments that precede a render id in watch URLs.
const RENDER_SEGMENTS: &[&str] = &["watch", "renders", "render", "r"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderLink {
    Id(u64),
    /// Needs a redirect to be followed before the id is known.
    Short(Url),
}

impl RenderLink {
    pub fn parse(input: &str) -> crate::Result<RenderLink> {
        let input = input.trim();

        if let Ok(id) = input.parse::<u64>() {
            return Ok(RenderLink::Id(id));
        }

        let url = if input.contains("://") {
            Url::parse(input)?
        } else {
            Url::parse(&format!("https://{input}"))?
        };

        if let Some(id) = render_id_from_url(&url) {
            return Ok(RenderLink::Id(id));
        }

        let host = url.host_str().unwrap_or_default();
        let has_code = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .is_some_and(|code| !code.is_empty());

        if SHORT_LINK_HOSTS.contains(&host) && has_code {
            return Ok(RenderLink::Short(url));
        }

        Err(crate::Error::InvalidLink(input.to_owned()))
    }
}

impl FromStr for RenderLink {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RenderLink::parse(s)
    }
}

impl fmt::Display for RenderLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderLink::Id(id) => write!(f, "render {id}"),
            RenderLink::Short(url) => write!(f, "{url}"),
        }
    }
}

/// Render id carried by a watch URL, either in the query or the path.
pub fn render_id_from_url(url: &Url) -> Option<u64> {
    let from_query = url
        .query_pairs()
        .find(|(key, _)| key.eq_ignore_ascii_case("renderid") || key == "id")
        .and_then(|(_, value)| value.parse().ok());

    if from_query.is_some() {
        return from_query;
    }

    let segments = url.path_segments()?.filter(|s| !s.is_empty()).collect::<Vec<_>>();

    segments
        .windows(2)
        .find(|pair| RENDER_SEGMENTS.contains(&pair[0]))
        .and_then(|pair| pair[1].parse().ok())
}
