use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use plotly::{
    common::{Fill, Line, Mode, Title},
    layout::{Axis, Layout},
    Plot, Scatter,
};
use tracing::{debug, info};

use crate::rolling::{centered_rolling, RollingStats};

const DEFAULT_WIDTH: usize = 640;
const DEFAULT_HEIGHT: usize = 480;
const BAND_OPACITY: f64 = 0.25;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlotLabels {
    pub x_label: String,
    pub y_label: String,
}

impl PlotLabels {
    pub fn new(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            x_label: x_label.into(),
            y_label: y_label.into(),
        }
    }
}

impl Default for PlotLabels {
    fn default() -> Self {
        Self::new("episodes", "reward")
    }
}

/// Plot `rewards` with a centered rolling mean and a one-standard-deviation band.
///
/// Empty or non-finite rewards and a zero window are errors; a window wider
/// than the sequence yields an empty plot.
pub fn plot_reward(rewards: &[f64], window: usize, labels: PlotLabels) -> Result<RewardPlot> {
    if rewards.is_empty() {
        bail!("cannot plot an empty reward sequence");
    }
    if let Some(index) = rewards.iter().position(|reward| !reward.is_finite()) {
        bail!("reward at index {} is not finite: {}", index, rewards[index]);
    }

    let stats = centered_rolling(rewards, window)?;
    if stats.defined() == 0 {
        debug!(
            len = rewards.len(),
            window, "rolling window wider than rewards; plot will be empty"
        );
    }

    Ok(RewardPlot {
        stats,
        labels,
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
    })
}

#[derive(Clone, Debug)]
pub struct RewardPlot {
    stats: RollingStats,
    labels: PlotLabels,
    width: usize,
    height: usize,
}

impl RewardPlot {
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn stats(&self) -> &RollingStats {
        &self.stats
    }

    pub fn labels(&self) -> &PlotLabels {
        &self.labels
    }

    pub fn to_plotly(&self) -> Plot {
        let index: Vec<usize> = (0..self.stats.len()).collect();
        let (lower, upper): (Vec<Option<f64>>, Vec<Option<f64>>) = self
            .stats
            .mean
            .iter()
            .zip(&self.stats.std)
            .map(|pair| match pair {
                (Some(mean), Some(std)) => (Some(mean - std), Some(mean + std)),
                _ => (None, None),
            })
            .unzip();

        // The upper edge fills down to the lower edge, which must come first.
        let lower = Scatter::new(index.clone(), lower)
            .mode(Mode::Lines)
            .line(Line::new().width(0.0))
            .opacity(BAND_OPACITY)
            .show_legend(false)
            .name("mean - std");
        let upper = Scatter::new(index.clone(), upper)
            .mode(Mode::Lines)
            .line(Line::new().width(0.0))
            .fill(Fill::ToNextY)
            .opacity(BAND_OPACITY)
            .show_legend(false)
            .name("mean + std");
        let mean = Scatter::new(index, self.stats.mean.clone())
            .mode(Mode::Lines)
            .name("rolling mean");

        let layout = Layout::new()
            .width(self.width)
            .height(self.height)
            .show_legend(false)
            .x_axis(Axis::new().title(Title::new(&self.labels.x_label)))
            .y_axis(Axis::new().title(Title::new(&self.labels.y_label)));

        let mut plot = Plot::new();
        plot.add_trace(lower);
        plot.add_trace(upper);
        plot.add_trace(mean);
        plot.set_layout(layout);
        plot
    }

    pub fn to_html(&self) -> String {
        self.to_plotly().to_html()
    }

    pub fn to_json(&self) -> String {
        self.to_plotly().to_json()
    }

    /// Write the plot as standalone HTML or plotly JSON, chosen by extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let contents = match extension.as_deref() {
            Some("html") => self.to_html(),
            Some("json") => self.to_json(),
            _ => bail!(
                "unsupported plot format for {} (expected .html or .json)",
                path.display()
            ),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(path, contents)
            .with_context(|| format!("failed to write plot to {}", path.display()))?;
        info!(path = %path.display(), "saved reward plot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn plot_json(plot: &RewardPlot) -> Value {
        serde_json::from_str(&plot.to_json()).unwrap()
    }

    #[test]
    fn default_labels() {
        let labels = PlotLabels::default();
        assert_eq!(labels.x_label, "episodes");
        assert_eq!(labels.y_label, "reward");
    }

    #[test]
    fn empty_rewards_are_rejected() {
        assert!(plot_reward(&[], 3, PlotLabels::default()).is_err());
    }

    #[test]
    fn non_finite_rewards_are_rejected() {
        let err = plot_reward(&[1.0, f64::NAN], 1, PlotLabels::default()).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(plot_reward(&[1.0, 2.0], 0, PlotLabels::default()).is_err());
    }

    #[test]
    fn band_fills_between_edges_under_the_mean() {
        let plot = plot_reward(&[1.0, 2.0, 3.0, 4.0, 5.0], 3, PlotLabels::new("steps", "return"))
            .unwrap();
        let json = plot_json(&plot);
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);

        let (lower, upper, mean) = (&data[0], &data[1], &data[2]);
        assert!(lower.get("fill").is_none());
        assert_eq!(upper["fill"], "tonexty");
        assert_eq!(upper["opacity"], BAND_OPACITY);
        assert_eq!(
            mean["y"],
            serde_json::json!([null, 2.0, 3.0, 4.0, null])
        );
        assert_eq!(lower["y"], serde_json::json!([null, 1.0, 2.0, 3.0, null]));
        assert_eq!(upper["y"], serde_json::json!([null, 3.0, 4.0, 5.0, null]));
        assert_eq!(mean["x"], serde_json::json!([0, 1, 2, 3, 4]));
    }

    #[test]
    fn axis_titles_come_from_labels() {
        let plot = plot_reward(&[0.0, 1.0, 0.0, 1.0], 2, PlotLabels::new("steps", "avg return"))
            .unwrap()
            .with_size(800, 300);
        let json = plot.to_json();
        assert!(json.contains(r#""steps""#));
        assert!(json.contains(r#""avg return""#));

        let layout = &plot_json(&plot)["layout"];
        assert_eq!(layout["width"], 800);
        assert_eq!(layout["height"], 300);
    }

    #[test]
    fn constant_rewards_have_flat_mean_and_collapsed_band() {
        let plot = plot_reward(&[2.0; 30], 4, PlotLabels::default()).unwrap();
        let json = plot_json(&plot);
        let data = json["data"].as_array().unwrap();
        for trace in data {
            for value in trace["y"].as_array().unwrap() {
                assert!(value.is_null() || value.as_f64() == Some(2.0), "{value}");
            }
        }
    }

    #[test]
    fn oversized_window_yields_empty_traces() {
        let plot = plot_reward(&[1.0, 2.0, 3.0], 10, PlotLabels::default()).unwrap();
        assert_eq!(plot.stats().defined(), 0);
        let json = plot_json(&plot);
        for trace in json["data"].as_array().unwrap() {
            assert!(trace["y"].as_array().unwrap().iter().all(Value::is_null));
        }
    }

    #[test]
    fn save_writes_html_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let plot = plot_reward(&[1.0, 2.0, 4.0, 8.0, 4.0, 2.0], 3, PlotLabels::default()).unwrap();

        let html_path = dir.path().join("nested/reward.html");
        plot.save(&html_path).unwrap();
        assert!(fs::read_to_string(&html_path).unwrap().contains("<html"));

        let json_path = dir.path().join("reward.json");
        plot.save(&json_path).unwrap();
        let saved: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(saved["data"].as_array().unwrap().len(), 3);

        assert!(plot.save(&dir.path().join("reward.png")).is_err());
    }
}
