use serde::{Deserialize, Serialize};

/// Bounds of an exploration-rate schedule.
///
/// For the exponential schedule `end` acts as the floor reported at each step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpsilonRange {
    pub start: f64,
    pub end: f64,
}

impl EpsilonRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

impl From<(f64, f64)> for EpsilonRange {
    fn from((start, end): (f64, f64)) -> Self {
        Self { start, end }
    }
}

/// Linear decay of epsilon in `n_steps`, inclusive of both endpoints.
///
/// A single step yields `[start]` and zero steps yield an empty schedule.
pub fn get_epsilons(epsilon_range: impl Into<EpsilonRange>, n_steps: usize) -> Vec<f64> {
    let EpsilonRange { start, end } = epsilon_range.into();

    match n_steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n_steps - 1) as f64;
            let mut epsilons: Vec<f64> = (0..n_steps).map(|i| start + i as f64 * step).collect();
            epsilons[n_steps - 1] = end;
            epsilons
        }
    }
}

/// Exponential decay of epsilon in `n_steps`.
///
/// Each step emits `max(running, floor)` and then multiplies the running value
/// by `epsilon_decay`. Only the emitted value is floored: the running value
/// keeps decaying underneath it, and nothing is ever clamped from above.
pub fn get_exp_epsilons(
    epsilon_range: impl Into<EpsilonRange>,
    epsilon_decay: f64,
    n_steps: usize,
) -> Vec<f64> {
    let EpsilonRange {
        start,
        end: min_epsilon,
    } = epsilon_range.into();

    let mut epsilon = start;
    let mut epsilons = Vec::with_capacity(n_steps);
    for _ in 0..n_steps {
        epsilons.push(epsilon.max(min_epsilon));
        epsilon *= epsilon_decay;
    }
    epsilons
}

/// Serializable description of a decay schedule, as stored in experiment configs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpsilonSchedule {
    Linear { start: f64, end: f64 },
    Exponential { start: f64, min: f64, decay: f64 },
}

impl EpsilonSchedule {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Linear { .. } => "linear",
            Self::Exponential { .. } => "exponential",
        }
    }

    /// Lowest value the schedule is expected to report.
    pub fn floor(&self) -> f64 {
        match *self {
            Self::Linear { start, end } => start.min(end),
            Self::Exponential { min, .. } => min,
        }
    }

    pub fn values(&self, n_steps: usize) -> Vec<f64> {
        match *self {
            Self::Linear { start, end } => get_epsilons((start, end), n_steps),
            Self::Exponential { start, min, decay } => {
                get_exp_epsilons((start, min), decay, n_steps)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn linear_is_evenly_spaced_with_exact_endpoints() {
        let epsilons = get_epsilons((1.0, 0.1), 5);
        assert_close(&epsilons, &[1.0, 0.775, 0.55, 0.325, 0.1]);
        assert_eq!(epsilons[0], 1.0);
        assert_eq!(epsilons[4], 0.1);
    }

    #[test]
    fn linear_single_step_is_start() {
        assert_eq!(get_epsilons((0.7, 0.2), 1), vec![0.7]);
        assert_eq!(get_epsilons((-3.0, 9.0), 1), vec![-3.0]);
    }

    #[test]
    fn linear_zero_steps_is_empty() {
        assert!(get_epsilons((1.0, 0.0), 0).is_empty());
    }

    #[test]
    fn linear_can_increase() {
        assert_close(&get_epsilons((0.0, 1.0), 3), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn exponential_emits_before_decaying() {
        assert_eq!(
            get_exp_epsilons((1.0, 0.1), 0.5, 4),
            vec![1.0, 0.5, 0.25, 0.125]
        );
    }

    #[test]
    fn exponential_holds_floor_once_reached() {
        let epsilons = get_exp_epsilons((1.0, 0.1), 0.5, 10);
        assert_eq!(&epsilons[..4], &[1.0, 0.5, 0.25, 0.125]);
        assert!(epsilons[4..].iter().all(|&e| e == 0.1), "{epsilons:?}");
        assert!(epsilons.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[test]
    fn exponential_never_clamps_from_above() {
        // Growing schedule starting under the floor.
        let epsilons = get_exp_epsilons((0.05, 0.1), 2.0, 4);
        assert_eq!(epsilons, vec![0.1, 0.1, 0.2, 0.4]);
    }

    #[test]
    fn exponential_running_value_is_not_floored() {
        // Clamping the running value would give [0.5, 1.0, 2.0].
        let epsilons = get_exp_epsilons((0.2, 0.5), 2.0, 3);
        assert_eq!(epsilons, vec![0.5, 0.5, 0.8]);
    }

    #[test]
    fn schedule_config_dispatches() {
        let linear = EpsilonSchedule::Linear {
            start: 1.0,
            end: 0.1,
        };
        let exponential = EpsilonSchedule::Exponential {
            start: 1.0,
            min: 0.1,
            decay: 0.5,
        };
        assert_eq!(linear.values(5), get_epsilons((1.0, 0.1), 5));
        assert_eq!(exponential.values(4), vec![1.0, 0.5, 0.25, 0.125]);
        assert_eq!(linear.floor(), 0.1);
        assert_eq!(exponential.label(), "exponential");
    }

    #[test]
    fn schedule_config_json_shape() {
        let parsed: EpsilonSchedule =
            serde_json::from_str(r#"{"kind":"exponential","start":1.0,"min":0.05,"decay":0.99}"#)
                .unwrap();
        assert_eq!(
            parsed,
            EpsilonSchedule::Exponential {
                start: 1.0,
                min: 0.05,
                decay: 0.99
            }
        );
    }

    proptest! {
        #[test]
        fn schedules_have_requested_length(
            start in -10.0f64..10.0,
            end in -10.0f64..10.0,
            decay in 0.0f64..2.0,
            n_steps in 0usize..500,
        ) {
            prop_assert_eq!(get_epsilons((start, end), n_steps).len(), n_steps);
            prop_assert_eq!(get_exp_epsilons((start, end), decay, n_steps).len(), n_steps);
        }

        #[test]
        fn linear_stays_within_bounds(
            start in 0.0f64..1.0,
            end in 0.0f64..1.0,
            n_steps in 1usize..200,
        ) {
            let (lo, hi) = (start.min(end), start.max(end));
            for epsilon in get_epsilons((start, end), n_steps) {
                prop_assert!(epsilon >= lo - 1e-12 && epsilon <= hi + 1e-12);
            }
        }

        #[test]
        fn exponential_never_reports_below_floor(
            start in 0.0f64..1.0,
            min in 0.0f64..1.0,
            decay in 0.0f64..1.0,
            n_steps in 0usize..200,
        ) {
            for epsilon in get_exp_epsilons((start, min), decay, n_steps) {
                prop_assert!(epsilon >= min);
            }
        }
    }
}
