use log::debug;

use crate::util::normalize_name;

/// Anything that can stand in for one difficulty of a beatmap-set.
pub trait DifficultyCandidate {
    fn version(&self) -> &str;

    fn star_rating(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a, T> {
    /// Case-insensitive name match.
    Exact(&'a T),
    /// No name matched; closest star rating within tolerance.
    NearestStars { candidate: &'a T, delta: f64 },
    Unresolved,
}

impl<'a, T> Resolution<'a, T> {
    pub fn candidate(&self) -> Option<&'a T> {
        match *self {
            Resolution::Exact(candidate) => Some(candidate),
            Resolution::NearestStars { candidate, .. } => Some(candidate),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// Resolves a reported difficulty against a beatmap-set's difficulty list.
///
/// Tries the name first, then the closest star rating no further than
/// `tolerance` away. Ties on star rating keep the earliest candidate.
pub fn resolve<'a, T: DifficultyCandidate>(
    candidates: &'a [T],
    name: Option<&str>,
    stars: Option<f64>,
    tolerance: f64,
) -> Resolution<'a, T> {
    if let Some(name) = name.map(normalize_name).filter(|n| !n.is_empty()) {
        let found = candidates
            .iter()
            .find(|candidate| normalize_name(candidate.version()) == name);

        if let Some(found) = found {
            debug!("difficulty matched by name: {}", found.version());
            return Resolution::Exact(found);
        }
    }

    let Some(stars) = stars.filter(|s| s.is_finite()) else {
        return Resolution::Unresolved;
    };

    let nearest = candidates
        .iter()
        .filter_map(|candidate| Some((candidate, (candidate.star_rating()? - stars).abs())))
        .fold(None::<(&T, f64)>, |best, (candidate, delta)| match best {
            Some((_, best_delta)) if best_delta <= delta => best,
            _ => Some((candidate, delta)),
        });

    match nearest {
        // rounding of the reported rating should not push an exact edge out
        Some((candidate, delta)) if delta <= tolerance + 1e-9 => {
            debug!(
                "difficulty matched by star rating: {} (delta {delta:.3})",
                candidate.version()
            );
            Resolution::NearestStars { candidate, delta }
        }
        _ => Resolution::Unresolved,
    }
}

/// Picks the candidate whose name is closest to `name`.
///
/// Exact (case-insensitive) matches win, otherwise the smallest edit
/// distance is accepted while it stays within a third of the name length.
pub fn closest_by_name<'a, T: DifficultyCandidate>(candidates: &'a [T], name: &str) -> Option<&'a T> {
    let name = normalize_name(name);

    if let Some(found) = candidates
        .iter()
        .find(|candidate| normalize_name(candidate.version()) == name)
    {
        return Some(found);
    }

    let cutoff = name.chars().count() / 3;

    candidates
        .iter()
        .map(|candidate| (candidate, levenshtein::levenshtein(&normalize_name(candidate.version()), &name)))
        .filter(|(_, score)| *score <= cutoff)
        .min_by_key(|(_, score)| *score)
        .map(|(candidate, _)| candidate)
}
