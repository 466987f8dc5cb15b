use lib::description::PlayDescription;
use lib::difficulty::{Resolution, resolve};
use lib::fc::{FcCheck, FcVerdict, true_fc};
use lib::mods::{Mods, ModsOrigin, reconcile};
use lib::ordr::Render;
use lib::osu::{Beatmap, Beatmapset, OsuApi, Score, User, pick_score};
use lib::pp::{DifficultyAttributes, HitCounts, ObjectCounts, OsuPerformance, PerformanceCalculator, ScoreState};
use lib::rank::Grade;
use log::{debug, info, warn};
use serde::Serialize;

/// Everything the thumbnail shows, reconciled from every source that was
/// reachable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayInfo {
    pub title: String,
    pub artist: Option<String>,
    pub difficulty: String,
    pub stars: Option<f64>,
    /// Percent.
    pub accuracy: Option<f64>,
    pub mods: Mods,
    pub mods_origin: ModsOrigin,
    pub rank: Grade,
    pub pp: Option<f64>,
    pub combo: Option<u32>,
    pub max_combo: Option<u32>,
    pub misses: Option<u32>,
    pub full_combo: Option<FcVerdict>,
    pub player: String,
    pub user_id: Option<u64>,
    pub avatar_url: Option<String>,
    pub beatmap_id: Option<u64>,
    pub beatmapset_id: Option<u64>,
    pub covers: Vec<String>,
}

impl PlayInfo {
    pub fn is_full_combo(&self) -> bool {
        self.full_combo.is_some_and(|v| v.is_fc())
    }

    /// API cover urls, best quality first.
    pub fn cover_urls(&self) -> impl Iterator<Item = &str> {
        self.covers.iter().map(String::as_str)
    }
}

/// What the osu! API contributed. Every field is optional, a failed
/// request just leaves its field empty.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub beatmapset: Option<Beatmapset>,
    pub beatmap: Option<Beatmap>,
    pub user: Option<User>,
    pub score: Option<Score>,
    pub attributes: Option<DifficultyAttributes>,
}

impl Enrichment {
    fn calculator(&self) -> Option<OsuPerformance> {
        let attributes = self.attributes?;
        let objects = self.objects();
        (objects.total() > 0).then(|| OsuPerformance::new(attributes, objects))
    }

    fn objects(&self) -> ObjectCounts {
        self.beatmap
            .as_ref()
            .or_else(|| self.score.as_ref().and_then(|s| s.beatmap.as_ref()))
            .map(Beatmap::objects)
            .unwrap_or_default()
    }

    fn map_max_combo(&self) -> Option<u32> {
        self.attributes.map(|a| a.max_combo).or_else(|| {
            self.beatmap
                .as_ref()
                .or_else(|| self.score.as_ref().and_then(|s| s.beatmap.as_ref()))
                .and_then(|b| b.max_combo)
        })
    }
}

/// Looks up the render's play on the osu! API. Failures are logged and
/// skipped, whatever succeeded is kept.
pub async fn enrich_render(
    api: &OsuApi,
    render: &Render,
    description: &PlayDescription,
    star_tolerance: f64,
) -> Enrichment {
    let mut enrichment = Enrichment::default();

    if let Some(beatmapset_id) = render.map_id {
        match api.beatmapset(beatmapset_id).await {
            Ok(set) => enrichment.beatmapset = Some(set),
            Err(err) => warn!("failed to fetch beatmapset {beatmapset_id}: {err}"),
        }
    }

    if let Some(set) = &enrichment.beatmapset {
        let resolution = resolve(
            &set.beatmaps,
            Some(&render.replay_difficulty),
            description.stars,
            star_tolerance,
        );

        match resolution {
            Resolution::Exact(beatmap) => debug!("resolved difficulty {}", beatmap.version),
            Resolution::NearestStars { candidate, delta } => info!(
                "no difficulty named {:?}, using {} ({delta:.2} stars off)",
                render.replay_difficulty, candidate.version
            ),
            Resolution::Unresolved => warn!(
                "difficulty {:?} not found in beatmapset {}",
                render.replay_difficulty, set.id
            ),
        }

        enrichment.beatmap = resolution.candidate().cloned();
    }

    let username = render.replay_username.trim();
    if !username.is_empty() {
        match api.user(username).await {
            Ok(user) => enrichment.user = Some(user),
            Err(err) => warn!("failed to fetch user {username}: {err}"),
        }
    }

    if let (Some(beatmap), Some(user)) = (&enrichment.beatmap, &enrichment.user) {
        match api.user_beatmap_scores(beatmap.id, user.id).await {
            Ok(scores) => {
                enrichment.score =
                    pick_score(&scores, description.accuracy, render.replay_mods.to_mods()).cloned();

                if enrichment.score.is_none() {
                    info!("{} has no score on beatmap {}", user.username, beatmap.id);
                }
            }
            Err(err) => warn!("failed to fetch scores: {err}"),
        }
    }

    if let Some(beatmap) = &enrichment.beatmap {
        let (mods, _) = reconcile(
            render.replay_mods.to_mods(),
            enrichment.score.as_ref().map(Score::mods),
            description.mods,
        );

        match api.beatmap_attributes(beatmap.id, mods).await {
            Ok(attributes) => enrichment.attributes = Some(attributes),
            Err(err) => warn!("failed to fetch difficulty attributes: {err}"),
        }
    }

    enrichment
}

/// Looks up a score by id along with its beatmap-set and attributes.
pub async fn enrich_score(api: &OsuApi, score_id: u64) -> anyhow::Result<Enrichment> {
    let score = api.score(score_id).await?;

    let mut enrichment = Enrichment::default();

    if let Some(beatmap) = &score.beatmap {
        match api.beatmapset(beatmap.beatmapset_id).await {
            Ok(set) => enrichment.beatmapset = Some(set),
            Err(err) => warn!("failed to fetch beatmapset {}: {err}", beatmap.beatmapset_id),
        }

        // the embedded beatmap lacks object counts
        let full = enrichment
            .beatmapset
            .as_ref()
            .and_then(|set| set.beatmaps.iter().find(|b| b.id == beatmap.id))
            .cloned();

        enrichment.beatmap = match full {
            Some(full) => Some(full),
            None => match api.beatmap(beatmap.id).await {
                Ok(full) => Some(full),
                Err(err) => {
                    warn!("failed to fetch beatmap {}: {err}", beatmap.id);
                    Some(beatmap.clone())
                }
            },
        };

        match api.beatmap_attributes(beatmap.id, score.mods()).await {
            Ok(attributes) => enrichment.attributes = Some(attributes),
            Err(err) => warn!("failed to fetch difficulty attributes: {err}"),
        }
    }

    enrichment.user = score.user.clone();
    enrichment.score = Some(score);

    Ok(enrichment)
}

fn score_state(enrichment: &Enrichment, description: &PlayDescription) -> Option<ScoreState> {
    let objects = enrichment.objects();

    if let Some(score) = &enrichment.score {
        return Some(score.state(&objects));
    }

    let (combo, misses) = (description.combo?, description.misses?);

    let counts = if objects.total() > 0 {
        let accuracy = description.accuracy.unwrap_or(100.0) / 100.0;
        HitCounts::from_accuracy(accuracy, objects.total(), misses)
    } else {
        HitCounts {
            misses,
            ..Default::default()
        }
    };

    Some(ScoreState {
        max_combo: combo,
        counts,
    })
}

/// Merges render data, its parsed description and whatever the API
/// returned. Render data is the floor; nothing here fails.
pub fn assemble(render: Option<&Render>, description: &PlayDescription, enrichment: &Enrichment) -> PlayInfo {
    let score = enrichment.score.as_ref();
    let set = enrichment.beatmapset.as_ref();
    let beatmap = enrichment.beatmap.as_ref();

    let (mods, mods_origin) = reconcile(
        render.and_then(|r| r.replay_mods.to_mods()),
        score.map(Score::mods),
        description.mods,
    );
    debug!("mods {mods} from {mods_origin:?}");

    let calculator = enrichment.calculator();
    let state = score_state(enrichment, description);

    let pp = score
        .and_then(|s| s.pp)
        .or_else(|| {
            let calculator = calculator.as_ref()?;
            calculator.pp(mods, state.as_ref()?)
        })
        .or(description.pp);

    let full_combo = state.map(|state| {
        let check = FcCheck {
            mods,
            state,
            map_max_combo: enrichment.map_max_combo(),
            pp,
        };

        true_fc(&check, calculator.as_ref().map(|c| c as &dyn PerformanceCalculator))
    });

    let title = render
        .map(|r| r.song_title().to_owned())
        .filter(|t| !t.is_empty())
        .or_else(|| set.map(|s| s.title.clone()))
        .unwrap_or_default();

    let artist = render
        .and_then(|r| r.artist())
        .map(str::to_owned)
        .or_else(|| set.map(|s| s.artist.clone()));

    let difficulty = beatmap
        .map(|b| b.version.clone())
        .or_else(|| render.map(|r| r.replay_difficulty.clone()))
        .unwrap_or_default();

    let stars = enrichment
        .attributes
        .map(|a| a.star_rating)
        .or_else(|| beatmap.map(|b| b.difficulty_rating))
        .or(description.stars);

    let rank = score.map(|s| s.rank).unwrap_or_else(|| {
        debug!("no score, rank defaults to {}", lib::util::DEFAULT_RANK);
        Grade::default()
    });

    let user = enrichment.user.as_ref();

    PlayInfo {
        title,
        artist,
        difficulty,
        stars,
        accuracy: score.map(|s| s.accuracy * 100.0).or(description.accuracy),
        mods,
        mods_origin,
        rank,
        pp,
        combo: score.map(|s| s.max_combo).or(description.combo),
        max_combo: enrichment.map_max_combo(),
        misses: state.map(|s| s.counts.misses).or(description.misses),
        full_combo,
        player: user
            .map(|u| u.username.clone())
            .or_else(|| render.map(|r| r.replay_username.clone()))
            .unwrap_or_default(),
        user_id: user.map(|u| u.id),
        avatar_url: user.map(User::avatar_url),
        beatmap_id: beatmap.map(|b| b.id),
        beatmapset_id: set
            .map(|s| s.id)
            .or_else(|| beatmap.map(|b| b.beatmapset_id))
            .or_else(|| render.and_then(|r| r.map_id)),
        covers: set
            .map(|s| s.covers.candidates().map(str::to_owned).collect())
            .unwrap_or_default(),
    }
}

/// Render-first flow. Without an API client the play is built from the
/// render alone.
pub async fn from_render(render: &Render, api: Option<&OsuApi>, star_tolerance: f64) -> PlayInfo {
    let description = render.play_description();
    debug!("parsed description: {description:?}");

    let enrichment = match api {
        Some(api) => enrich_render(api, render, &description, star_tolerance).await,
        None => {
            info!("no osu! API access, using render data only");
            Enrichment::default()
        }
    };

    assemble(Some(render), &description, &enrichment)
}

pub async fn from_score(api: &OsuApi, score_id: u64) -> anyhow::Result<PlayInfo> {
    let enrichment = enrich_score(api, score_id).await?;
    Ok(assemble(None, &PlayDescription::default(), &enrichment))
}
