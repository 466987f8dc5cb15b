//! osu!standard performance points from difficulty attributes.
//!
//! Difficulty attributes come precomputed from the osu! API, so this only
//! covers the performance half of the calculation.

use serde::{Deserialize, Serialize};

use crate::mods::Mods;

const PERFORMANCE_BASE_MULTIPLIER: f64 = 1.14;

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitCounts {
    pub n300: u32,
    pub n100: u32,
    pub n50: u32,
    pub misses: u32,
}

impl HitCounts {
    pub const fn new(n300: u32, n100: u32, n50: u32, misses: u32) -> Self {
        Self {
            n300,
            n100,
            n50,
            misses,
        }
    }

    pub const fn total(&self) -> u32 {
        self.n300 + self.n100 + self.n50 + self.misses
    }

    /// Accuracy in `0.0..=1.0`.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();

        if total == 0 {
            return 0.0;
        }

        (self.n300 * 6 + self.n100 * 2 + self.n50) as f64 / (total * 6) as f64
    }

    /// Distributes `total` objects to approximate `accuracy` (`0.0..=1.0`)
    /// with the given miss count, preferring 100s over 50s.
    pub fn from_accuracy(accuracy: f64, total: u32, misses: u32) -> Self {
        let misses = misses.min(total);
        let remaining = total - misses;

        if remaining == 0 {
            return Self::new(0, 0, 0, misses);
        }

        let accuracy = accuracy.clamp(0.0, 1.0);
        let target = (accuracy * 6.0 * total as f64).round() as i64;
        // points lost relative to every remaining object being a 300
        let delta = (6 * remaining as i64 - target).max(0);

        // a 100 loses 4 points, a 50 loses 5
        let mut n100 = (delta / 4).min(remaining as i64);
        let mut n50 = 0;

        if n100 == remaining as i64 {
            let leftover = delta - 4 * n100;
            n50 = leftover.min(n100);
            n100 -= n50;
        }

        let n300 = remaining as i64 - n100 - n50;

        Self::new(n300 as u32, n100 as u32, n50 as u32, misses)
    }
}

/// Map-level difficulty values, already adjusted for the mods they were requested with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyAttributes {
    pub star_rating: f64,
    pub max_combo: u32,
    #[serde(default)]
    pub aim_difficulty: f64,
    #[serde(default)]
    pub speed_difficulty: f64,
    #[serde(default)]
    pub speed_note_count: f64,
    #[serde(default)]
    pub flashlight_difficulty: f64,
    #[serde(default = "default_slider_factor")]
    pub slider_factor: f64,
    #[serde(default)]
    pub approach_rate: f64,
    #[serde(default)]
    pub overall_difficulty: f64,
}

const fn default_slider_factor() -> f64 {
    1.0
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectCounts {
    pub circles: u32,
    pub sliders: u32,
    pub spinners: u32,
}

impl ObjectCounts {
    pub const fn total(&self) -> u32 {
        self.circles + self.sliders + self.spinners
    }
}

/// A play as far as performance calculation is concerned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub max_combo: u32,
    pub counts: HitCounts,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAttributes {
    pub pp: f64,
    pub aim: f64,
    pub speed: f64,
    pub accuracy: f64,
    pub flashlight: f64,
    pub effective_miss_count: f64,
}

pub trait PerformanceCalculator {
    fn performance(&self, mods: Mods, state: &ScoreState) -> Option<PerformanceAttributes>;

    fn pp(&self, mods: Mods, state: &ScoreState) -> Option<f64> {
        self.performance(mods, state).map(|p| p.pp)
    }

    fn max_combo(&self) -> Option<u32> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct OsuPerformance {
    pub attributes: DifficultyAttributes,
    pub objects: ObjectCounts,
}

impl OsuPerformance {
    pub fn new(attributes: DifficultyAttributes, objects: ObjectCounts) -> Self {
        Self {
            attributes,
            objects,
        }
    }

    fn effective_miss_count(&self, state: &ScoreState) -> f64 {
        let counts = &state.counts;
        let mut combo_based = 0.0;

        if self.objects.sliders > 0 {
            let full_combo_threshold =
                self.attributes.max_combo as f64 - 0.1 * self.objects.sliders as f64;

            if (state.max_combo as f64) < full_combo_threshold {
                combo_based = full_combo_threshold / (state.max_combo.max(1) as f64);
            }
        }

        let combo_based = combo_based.min((counts.n100 + counts.n50 + counts.misses) as f64);

        combo_based.max(counts.misses as f64)
    }

    fn combo_scaling(&self, state: &ScoreState) -> f64 {
        if self.attributes.max_combo == 0 {
            return 1.0;
        }

        ((state.max_combo as f64).powf(0.8) / (self.attributes.max_combo as f64).powf(0.8)).min(1.0)
    }

    fn length_bonus(total_hits: f64) -> f64 {
        let bonus = 0.95 + 0.4 * (total_hits / 2000.0).min(1.0);

        if total_hits > 2000.0 {
            bonus + (total_hits / 2000.0).log10() * 0.5
        } else {
            bonus
        }
    }

    fn aim(&self, mods: Mods, state: &ScoreState, total_hits: f64, emc: f64) -> f64 {
        let attrs = &self.attributes;
        let counts = &state.counts;

        let mut value = (5.0 * (attrs.aim_difficulty / 0.0675).max(1.0) - 4.0).powi(3) / 100_000.0;

        let length_bonus = Self::length_bonus(total_hits);
        value *= length_bonus;

        if emc > 0.0 {
            value *= 0.97 * (1.0 - (emc / total_hits).powf(0.775)).powf(emc);
        }

        value *= self.combo_scaling(state);

        let ar = attrs.approach_rate;
        let ar_factor = if ar > 10.33 {
            0.3 * (ar - 10.33)
        } else if ar < 8.0 {
            0.05 * (8.0 - ar)
        } else {
            0.0
        };

        value *= 1.0 + ar_factor * length_bonus;

        if mods.contains(Mods::HIDDEN) {
            value *= 1.0 + 0.04 * (12.0 - ar);
        }

        let difficult_sliders = self.objects.sliders as f64 * 0.15;

        if self.objects.sliders > 0 && difficult_sliders > 0.0 {
            let dropped = ((counts.n100 + counts.n50 + counts.misses) as f64)
                .min(attrs.max_combo.saturating_sub(state.max_combo) as f64)
                .clamp(0.0, difficult_sliders);

            let nerf = (1.0 - attrs.slider_factor) * (1.0 - dropped / difficult_sliders).powi(3)
                + attrs.slider_factor;

            value *= nerf;
        }

        value *= counts.accuracy();
        value *= 0.98 + attrs.overall_difficulty.powi(2) / 2500.0;

        value
    }

    fn speed(&self, mods: Mods, state: &ScoreState, total_hits: f64, emc: f64) -> f64 {
        let attrs = &self.attributes;
        let counts = &state.counts;

        let mut value =
            (5.0 * (attrs.speed_difficulty / 0.0675).max(1.0) - 4.0).powi(3) / 100_000.0;

        let length_bonus = Self::length_bonus(total_hits);
        value *= length_bonus;

        if emc > 0.0 {
            value *= 0.97 * (1.0 - (emc / total_hits).powf(0.775)).powf(emc.powf(0.875));
        }

        value *= self.combo_scaling(state);

        let ar = attrs.approach_rate;
        if ar > 10.33 {
            value *= 1.0 + 0.3 * (ar - 10.33) * length_bonus;
        }

        if mods.contains(Mods::HIDDEN) {
            value *= 1.0 + 0.04 * (12.0 - ar);
        }

        let relevant_total_diff = total_hits - attrs.speed_note_count;
        let n300 = counts.n300 as f64;
        let n100 = counts.n100 as f64;
        let n50 = counts.n50 as f64;

        let relevant_300 = (n300 - relevant_total_diff).max(0.0);
        let relevant_100 = (n100 - (relevant_total_diff - n300).max(0.0)).max(0.0);
        let relevant_50 = (n50 - (relevant_total_diff - n300 - n100).max(0.0)).max(0.0);

        let relevant_accuracy = if attrs.speed_note_count == 0.0 {
            0.0
        } else {
            (relevant_300 * 6.0 + relevant_100 * 2.0 + relevant_50) / (attrs.speed_note_count * 6.0)
        };

        let od = attrs.overall_difficulty;
        value *= (0.95 + od.powi(2) / 750.0)
            * ((counts.accuracy() + relevant_accuracy) / 2.0).powf((14.5 - od.max(8.0)) / 2.0);

        let allowed_50s = total_hits / 500.0;
        if n50 >= allowed_50s {
            value *= 0.99_f64.powf(n50 - allowed_50s);
        }

        value
    }

    fn accuracy(&self, mods: Mods, state: &ScoreState) -> f64 {
        let counts = &state.counts;

        let mut with_accuracy = self.objects.circles as f64;
        if mods.contains(Mods::SCORE_V2) {
            with_accuracy += self.objects.sliders as f64;
        }

        let better_accuracy = if with_accuracy > 0.0 {
            let total = counts.total() as f64;
            let n300 = counts.n300 as f64 - (total - with_accuracy);

            ((n300 * 6.0 + counts.n100 as f64 * 2.0 + counts.n50 as f64) / (with_accuracy * 6.0))
                .max(0.0)
        } else {
            0.0
        };

        let mut value =
            1.52163_f64.powf(self.attributes.overall_difficulty) * better_accuracy.powi(24) * 2.83;

        value *= (with_accuracy / 1000.0).powf(0.3).min(1.15);

        if mods.contains(Mods::HIDDEN) {
            value *= 1.08;
        }

        if mods.contains(Mods::FLASHLIGHT) {
            value *= 1.02;
        }

        value
    }

    fn flashlight(&self, mods: Mods, state: &ScoreState, total_hits: f64, emc: f64) -> f64 {
        if !mods.contains(Mods::FLASHLIGHT) {
            return 0.0;
        }

        let mut value = self.attributes.flashlight_difficulty.powi(2) * 25.0;

        if emc > 0.0 {
            value *= 0.97 * (1.0 - (emc / total_hits).powf(0.775)).powf(emc.powf(0.875));
        }

        value *= self.combo_scaling(state);

        let mut length_factor = 0.7 + 0.1 * (total_hits / 200.0).min(1.0);
        if total_hits > 200.0 {
            length_factor += 0.2 * ((total_hits - 200.0) / 200.0).min(1.0);
        }
        value *= length_factor;

        value *= 0.5 + state.counts.accuracy() / 2.0;
        value *= 0.98 + self.attributes.overall_difficulty.powi(2) / 2500.0;

        value
    }
}

impl PerformanceCalculator for OsuPerformance {
    fn performance(&self, mods: Mods, state: &ScoreState) -> Option<PerformanceAttributes> {
        let total_hits = state.counts.total() as f64;

        if total_hits == 0.0 {
            return None;
        }

        let emc = self.effective_miss_count(state);
        let mut multiplier = PERFORMANCE_BASE_MULTIPLIER;

        if mods.contains(Mods::NO_FAIL) {
            multiplier *= (1.0 - 0.02 * emc).max(0.9);
        }

        if mods.contains(Mods::SPUN_OUT) {
            multiplier *= 1.0 - (self.objects.spinners as f64 / total_hits).powf(0.85);
        }

        let aim = self.aim(mods, state, total_hits, emc);
        let speed = self.speed(mods, state, total_hits, emc);
        let accuracy = self.accuracy(mods, state);
        let flashlight = self.flashlight(mods, state, total_hits, emc);

        // relax and autopilot remove a whole skill from the play
        let (aim, speed) = if mods.contains(Mods::RELAX) {
            (aim, 0.0)
        } else if mods.contains(Mods::AUTOPILOT) {
            (0.0, speed)
        } else {
            (aim, speed)
        };

        let pp = (aim.powf(1.1) + speed.powf(1.1) + accuracy.powf(1.1) + flashlight.powf(1.1))
            .powf(1.0 / 1.1)
            * multiplier;

        Some(PerformanceAttributes {
            pp,
            aim,
            speed,
            accuracy,
            flashlight,
            effective_miss_count: emc,
        })
    }

    fn max_combo(&self) -> Option<u32> {
        Some(self.attributes.max_combo)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_map() -> OsuPerformance {
        OsuPerformance::new(
            DifficultyAttributes {
                star_rating: 6.3,
                max_combo: 1500,
                aim_difficulty: 3.1,
                speed_difficulty: 2.9,
                speed_note_count: 600.0,
                flashlight_difficulty: 2.4,
                slider_factor: 0.98,
                approach_rate: 9.6,
                overall_difficulty: 9.0,
            },
            ObjectCounts {
                circles: 700,
                sliders: 380,
                spinners: 2,
            },
        )
    }

    fn fc_state(map: &OsuPerformance, n100: u32) -> ScoreState {
        let total = map.objects.total();
        ScoreState {
            max_combo: map.attributes.max_combo,
            counts: HitCounts::new(total - n100, n100, 0, 0),
        }
    }

    #[test]
    fn accuracy_of_counts() {
        assert_eq!(HitCounts::new(10, 0, 0, 0).accuracy(), 1.0);
        assert_eq!(HitCounts::default().accuracy(), 0.0);
        let acc = HitCounts::new(90, 10, 0, 0).accuracy();
        assert!((acc - (540.0 + 20.0) / 600.0).abs() < 1e-12);
    }

    #[test]
    fn counts_from_accuracy() {
        let counts = HitCounts::from_accuracy(0.98, 1000, 2);
        assert_eq!(counts.total(), 1000);
        assert_eq!(counts.misses, 2);
        assert!((counts.accuracy() - 0.98).abs() < 0.001, "{counts:?}");

        let perfect = HitCounts::from_accuracy(1.0, 500, 0);
        assert_eq!(perfect, HitCounts::new(500, 0, 0, 0));

        let low = HitCounts::from_accuracy(0.2, 100, 0);
        assert_eq!(low.total(), 100);
        assert!(low.n50 > 0);
    }

    #[test]
    fn pp_is_positive_and_sane() {
        let map = sample_map();
        let pp = map.pp(Mods::NONE, &fc_state(&map, 10)).unwrap();
        assert!(pp > 50.0 && pp < 1500.0, "{pp}");
    }

    #[test]
    fn misses_and_combo_lower_pp() {
        let map = sample_map();
        let fc = fc_state(&map, 10);
        let fc_pp = map.pp(Mods::NONE, &fc).unwrap();

        let mut choke = fc;
        choke.max_combo = 400;
        choke.counts.n300 -= 3;
        choke.counts.misses = 3;
        let choke_pp = map.pp(Mods::NONE, &choke).unwrap();

        assert!(choke_pp < fc_pp, "{choke_pp} >= {fc_pp}");
    }

    #[test]
    fn accuracy_raises_pp() {
        let map = sample_map();
        let better = map.pp(Mods::NONE, &fc_state(&map, 5)).unwrap();
        let worse = map.pp(Mods::NONE, &fc_state(&map, 60)).unwrap();
        assert!(better > worse);
    }

    #[test]
    fn hidden_and_flashlight_add_pp() {
        let map = sample_map();
        let state = fc_state(&map, 10);
        let nm = map.pp(Mods::NONE, &state).unwrap();
        let hdfl = map.pp(Mods::HIDDEN | Mods::FLASHLIGHT, &state).unwrap();
        assert!(hdfl > nm);
    }

    #[test]
    fn empty_state_has_no_pp() {
        let map = sample_map();
        assert!(map.pp(Mods::NONE, &ScoreState::default()).is_none());
    }
}
