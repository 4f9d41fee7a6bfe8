use serde::{Deserialize, Serialize};

use crate::rolling::RollingStats;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub label: String,
    pub steps: usize,
    pub first: Option<f64>,
    pub last: Option<f64>,
    /// First step whose value sits at or below `floor`.
    pub steps_to_floor: Option<usize>,
}

impl ScheduleSummary {
    pub fn from_values(label: impl Into<String>, values: &[f64], floor: f64) -> Self {
        Self {
            label: label.into(),
            steps: values.len(),
            first: values.first().copied(),
            last: values.last().copied(),
            steps_to_floor: values.iter().position(|&value| value <= floor),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardSummary {
    pub episodes: usize,
    pub window: usize,
    pub defined: usize,
    pub total_reward: f64,
    pub final_mean: Option<f64>,
    pub final_std: Option<f64>,
    pub best_mean: Option<f64>,
}

impl RewardSummary {
    pub fn from_stats(rewards: &[f64], stats: &RollingStats) -> Self {
        let last_defined = stats.mean.iter().rposition(Option::is_some);
        Self {
            episodes: rewards.len(),
            window: stats.window,
            defined: stats.defined(),
            total_reward: rewards.iter().sum(),
            final_mean: last_defined.and_then(|i| stats.mean[i]),
            final_std: last_defined.and_then(|i| stats.std[i]),
            best_mean: stats.mean.iter().flatten().copied().reduce(f64::max),
        }
    }
}
