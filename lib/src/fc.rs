use log::debug;
use serde::{Deserialize, Serialize};

use crate::mods::Mods;
use crate::pp::{PerformanceCalculator, ScoreState};
use crate::util::FC_PP_TOLERANCE;

/// What the FC heuristic knows about a play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FcCheck {
    pub mods: Mods,
    pub state: ScoreState,
    pub map_max_combo: Option<u32>,
    /// PP reported for the play, if any.
    pub pp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FcVerdict {
    /// Achieved combo reached the map's max combo.
    ComboReached,
    /// Combo short of max, but PP matches a full-combo play.
    PpMatched { achieved: f64, full_combo: f64 },
    Misses(u32),
    ComboShort { combo: u32, max_combo: Option<u32> },
    PpMismatch { achieved: f64, full_combo: f64 },
}

impl FcVerdict {
    pub fn is_fc(&self) -> bool {
        matches!(self, FcVerdict::ComboReached | FcVerdict::PpMatched { .. })
    }
}

/// Decides whether a play was a true FC: no misses and no slider breaks.
///
/// Zero misses is required. The play then counts when its combo reached
/// the map's max combo, or when the PP of a full-combo play at the same
/// accuracy and mods is within [`FC_PP_TOLERANCE`] of the achieved PP.
/// Without a calculator only the combo branch can succeed.
pub fn true_fc(check: &FcCheck, calculator: Option<&dyn PerformanceCalculator>) -> FcVerdict {
    let misses = check.state.counts.misses;
    if misses > 0 {
        return FcVerdict::Misses(misses);
    }

    let combo = check.state.max_combo;
    let max_combo = check
        .map_max_combo
        .or_else(|| calculator.and_then(|c| c.max_combo()));

    if let Some(max_combo) = max_combo
        && combo >= max_combo
    {
        return FcVerdict::ComboReached;
    }

    let short = FcVerdict::ComboShort { combo, max_combo };

    let Some(calculator) = calculator else {
        debug!("no pp calculator, cannot rule out slider breaks");
        return short;
    };

    let Some(full_combo_max) = max_combo else {
        return short;
    };

    let full_combo_state = ScoreState {
        max_combo: full_combo_max,
        counts: check.state.counts,
    };

    let Some(full_combo) = calculator.pp(check.mods, &full_combo_state) else {
        return short;
    };

    let Some(achieved) = check.pp.or_else(|| calculator.pp(check.mods, &check.state)) else {
        return short;
    };

    if full_combo <= 0.0 {
        return short;
    }

    let relative = (full_combo - achieved).abs() / full_combo;
    debug!("fc pp {full_combo:.2}, achieved {achieved:.2}, relative difference {relative:.4}");

    if relative <= FC_PP_TOLERANCE {
        FcVerdict::PpMatched {
            achieved,
            full_combo,
        }
    } else {
        FcVerdict::PpMismatch {
            achieved,
            full_combo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pp::tests::sample_map;
    use crate::pp::{HitCounts, PerformanceAttributes};

    /// Every full-combo play is worth exactly 100pp.
    struct Flat;

    impl PerformanceCalculator for Flat {
        fn performance(&self, _: Mods, _: &ScoreState) -> Option<PerformanceAttributes> {
            None
        }

        fn pp(&self, _: Mods, _: &ScoreState) -> Option<f64> {
            Some(100.0)
        }
    }

    fn check(combo: u32, misses: u32, pp: Option<f64>) -> FcCheck {
        FcCheck {
            mods: Mods::HIDDEN,
            state: ScoreState {
                max_combo: combo,
                counts: HitCounts::new(1060 - misses, 20, 2, misses),
            },
            map_max_combo: Some(1500),
            pp,
        }
    }

    #[test]
    fn misses_are_never_fc() {
        let map = sample_map();
        let verdict = true_fc(&check(1500, 1, None), Some(&map));
        assert_eq!(verdict, FcVerdict::Misses(1));
        assert!(!verdict.is_fc());
    }

    #[test]
    fn max_combo_is_fc_without_calculator() {
        assert_eq!(true_fc(&check(1500, 0, None), None), FcVerdict::ComboReached);
    }

    #[test]
    fn short_combo_without_calculator_is_not_fc() {
        let verdict = true_fc(&check(1497, 0, Some(300.0)), None);
        assert!(matches!(verdict, FcVerdict::ComboShort { combo: 1497, .. }));
    }

    #[test]
    fn slider_end_drop_matches_full_combo_pp() {
        let map = sample_map();
        let verdict = true_fc(&check(1496, 0, None), Some(&map));
        assert!(verdict.is_fc(), "{verdict:?}");
    }

    #[test]
    fn slider_break_does_not_match() {
        let map = sample_map();
        let fc = map
            .pp(Mods::HIDDEN, &check(1500, 0, None).state)
            .unwrap();

        let verdict = true_fc(&check(700, 0, Some(fc * 0.7)), Some(&map));
        assert!(matches!(verdict, FcVerdict::PpMismatch { .. }), "{verdict:?}");
    }

    #[test]
    fn reported_pp_within_tolerance() {
        let map = sample_map();
        let fc = map
            .pp(Mods::HIDDEN, &check(1500, 0, None).state)
            .unwrap();

        let verdict = true_fc(&check(1200, 0, Some(fc * 0.96)), Some(&map));
        assert!(verdict.is_fc(), "{verdict:?}");
    }

    #[test]
    fn max_combo_from_calculator() {
        let map = sample_map();
        let mut c = check(1500, 0, None);
        c.map_max_combo = None;
        assert_eq!(true_fc(&c, Some(&map)), FcVerdict::ComboReached);
    }

    #[test]
    fn tolerance_boundary() {
        let verdict = |pp| true_fc(&check(1200, 0, Some(pp)), Some(&Flat));

        assert!(verdict(95.0).is_fc());
        assert!(verdict(105.0).is_fc());
        assert!(matches!(verdict(94.9), FcVerdict::PpMismatch { .. }));
        assert!(matches!(verdict(105.1), FcVerdict::PpMismatch { .. }));
    }
}
