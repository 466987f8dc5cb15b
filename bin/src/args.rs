use std::path::PathBuf;

use lib::osu::Credentials;
use lib::util::STAR_TOLERANCE;
use serde::{Deserialize, Serialize};

#[cfg(feature = "clap")]
pub const STYLE: clap::builder::Styles = clap::builder::Styles::styled()
    .usage(
        anstyle::Style::new()
            .bold()
            .underline()
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightBlue))),
    )
    .header(
        anstyle::Style::new()
            .bold()
            .underline()
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightBlue))),
    )
    .literal(
        anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightCyan))),
    )
    .invalid(
        anstyle::Style::new()
            .bold()
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightRed))),
    )
    .error(
        anstyle::Style::new()
            .bold()
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightRed))),
    )
    .valid(
        anstyle::Style::new()
            .bold()
            .underline()
            .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightCyan))),
    )
    .placeholder(
        anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
    );

#[derive(Default, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Parser))]
pub struct ArgCredentials {
    #[cfg_attr(
        feature = "clap",
        clap(long, visible_alias = "id", requires = "client_secret")
    )]
    /// osu! OAuth client id
    ///
    /// falls back to OSU_CLIENT_ID, .env.local, .env and the config file
    pub client_id: Option<String>,

    #[cfg_attr(
        feature = "clap",
        clap(long, visible_alias = "secret", requires = "client_id")
    )]
    #[serde(skip)]
    /// osu! OAuth client secret
    ///
    /// falls back to OSU_CLIENT_SECRET, .env.local, .env and the config file
    pub client_secret: Option<String>,

    #[cfg_attr(feature = "clap", clap(long, default_value = "false"))]
    #[serde(skip)]
    /// Store the credentials that end up being used in the config file
    ///
    /// [default: false]
    pub save_credentials: bool,

    #[cfg_attr(feature = "clap", clap(long, default_value = "false"))]
    /// Skip the osu! API entirely and render from o!rdr data only
    ///
    /// [default: false]
    pub no_api: bool,
}

impl ArgCredentials {
    pub fn credentials(&self) -> Option<Credentials> {
        let credentials = Credentials::new(self.client_id.clone()?, self.client_secret.clone()?);
        credentials.is_complete().then_some(credentials)
    }
}

#[derive(Default, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Parser))]
pub struct ArgAssets {
    #[cfg_attr(
        feature = "clap",
        clap(long = "mirror", short = 'm', num_args = 1, value_delimiter = ',')
    )]
    /// Beatmap mirror url templates, tried in order, `{id}` is replaced
    /// with the beatmap-set id
    ///
    /// [default: catboy.best, nerinyan.moe, osu.direct]
    pub mirrors: Vec<String>,

    #[cfg_attr(feature = "clap", clap(long, default_value = "false"))]
    /// Don't download the beatmap archive, use the API cover as background
    ///
    /// [default: false]
    pub no_archive: bool,

    #[cfg_attr(feature = "clap", clap(long = "font", short = 'f', num_args = 1, value_delimiter = ','))]
    /// Regular font files to try before the system ones
    pub fonts: Vec<PathBuf>,

    #[cfg_attr(feature = "clap", clap(long = "bold-font", short = 'F', num_args = 1, value_delimiter = ','))]
    /// Bold font files to try before the system ones
    pub bold_fonts: Vec<PathBuf>,

    #[cfg_attr(feature = "clap", clap(long))]
    #[serde(skip)]
    /// Where downloaded archives and tokens are kept
    ///
    /// [default: <cache dir>/ordr-thumbnail]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Parser))]
#[cfg_attr(feature = "clap", clap(author, version, about, long_about = None))]
#[cfg_attr(feature = "clap", command(styles = STYLE))]
pub struct Args {
    #[cfg_attr(
        feature = "clap",
        clap(required_unless_present = "score", conflicts_with = "score")
    )]
    #[serde(skip)]
    /// o!rdr render link, short link or bare render id
    pub link: Option<String>,

    #[cfg_attr(feature = "clap", clap(long, short = 's'))]
    #[serde(skip)]
    /// Build the thumbnail from an osu! score id instead of a render
    ///
    /// [requires: credentials]
    pub score: Option<u64>,

    #[cfg_attr(feature = "clap", clap(long, short = 'O', visible_alias = "out"))]
    #[serde(skip)]
    /// Where to save the thumbnail
    ///
    /// [default: thumbnail_<id>.jpg]
    pub output: Option<PathBuf>,

    #[cfg_attr(
        feature = "clap",
        clap(long, short = 'q', default_value = "95", value_parser = clap::value_parser!(u8).range(1..=100))
    )]
    /// JPEG quality
    ///
    /// [default: 95]
    pub quality: u8,

    #[cfg_attr(feature = "clap", clap(long, default_value_t = STAR_TOLERANCE))]
    /// How far, in stars, a difficulty may be from the reported star rating
    /// and still be matched when its name doesn't
    ///
    /// [default: 0.1]
    pub star_tolerance: f64,

    #[cfg_attr(feature = "clap", clap(long, short = 'i', default_value = "false"))]
    #[serde(skip)]
    /// Print the gathered play information as JSON
    ///
    /// [default: false]
    pub print_info: bool,

    #[cfg_attr(feature = "clap", clap(long, short = 'c'))]
    #[serde(skip)]
    /// Config file to use
    ///
    /// [default: <config dir>/ordr-thumbnail/config.json]
    pub config: Option<PathBuf>,

    #[cfg_attr(feature = "clap", command(flatten))]
    pub credentials: ArgCredentials,

    #[cfg_attr(feature = "clap", command(flatten))]
    pub assets: ArgAssets,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            link: None,
            score: None,
            output: None,
            quality: 95,
            star_tolerance: STAR_TOLERANCE,
            print_info: false,
            config: None,
            credentials: ArgCredentials::default(),
            assets: ArgAssets::default(),
        }
    }
}

#[cfg(feature = "clap")]
impl Args {
    pub fn error(error: clap::error::ErrorKind, message: impl std::fmt::Display) -> ! {
        use clap::CommandFactory;

        Self::command().error(error, message).exit()
    }

    pub fn parse() -> Self {
        let slf = <Self as clap::Parser>::parse();

        let style = STYLE.get_error();
        let e = style.render();
        let r = style.render_reset();

        if !slf.star_tolerance.is_finite() || slf.star_tolerance < 0.0 {
            Self::error(
                clap::error::ErrorKind::InvalidValue,
                format!(
                    "'{e}--star-tolerance{r}' must be a non-negative number, got '{e}{}{r}'",
                    slf.star_tolerance
                ),
            );
        }

        if let Some(template) = slf.assets.mirrors.iter().find(|m| !m.starts_with("http")) {
            Self::error(
                clap::error::ErrorKind::InvalidValue,
                format!("'{e}--mirror{r}' must be an http(s) url, got '{e}{template}{r}'"),
            );
        }

        slf
    }
}

impl Args {
    /// Default output name, derived from what the thumbnail is built from.
    pub fn output_path(&self, id: u64) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let prefix = if self.score.is_some() { "score" } else { "thumbnail" };
            PathBuf::from(format!("{prefix}_{id}.jpg"))
        })
    }
}
