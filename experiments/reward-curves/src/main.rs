use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use rewardkit_core::{
    ensure_report_file, init_tracing, load_json, load_or_init, plot_reward, save_json,
    seeded_rng, uniform_noise, update_sections, EpsilonSchedule, ExperimentArgs, ExperimentMode,
    PlotLabels, ReportSection, RewardPlot, RewardSummary, ScheduleSummary,
    DEFAULT_REPORT_TEMPLATE,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const FULL_EPISODES: usize = 500;
const TEST_EPISODES: usize = 120;
const BENCHMARK_TOLERANCE: f64 = 1e-9;
const SCHEDULE_TABLE_ROWS: usize = 8;

#[derive(Serialize, Deserialize)]
struct ExperimentConfig {
    seed: u64,
    window: usize,
    noise: f64,
    linear: EpsilonSchedule,
    exponential: EpsilonSchedule,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            window: 20,
            noise: 0.2,
            linear: EpsilonSchedule::Linear {
                start: 1.0,
                end: 0.05,
            },
            exponential: EpsilonSchedule::Exponential {
                start: 1.0,
                min: 0.05,
                decay: 0.99,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CurveSnapshot {
    schedule: ScheduleSummary,
    rewards: RewardSummary,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct BenchmarkSnapshot {
    linear: CurveSnapshot,
    exponential: CurveSnapshot,
}

struct ExperimentPaths {
    config: PathBuf,
    report: PathBuf,
    benchmark: PathBuf,
    linear_plot: PathBuf,
    exponential_plot: PathBuf,
}

struct Curve {
    epsilons: Vec<f64>,
    snapshot: CurveSnapshot,
    plot: RewardPlot,
}

fn main() -> Result<()> {
    let args = ExperimentArgs::parse_from_env()?;
    if args.help_requested() {
        print_usage();
        return Ok(());
    }
    init_tracing();

    let mode = args.mode();
    let paths = initialize_paths(args.output_dir());
    let config: ExperimentConfig = load_or_init(&paths.config, ExperimentConfig::default)?;
    ensure_report_file(&paths.report, DEFAULT_REPORT_TEMPLATE)?;
    let benchmark: Option<BenchmarkSnapshot> = load_json(&paths.benchmark)?;

    let episodes = mode.select(FULL_EPISODES, TEST_EPISODES);
    info!(mode = mode.label(), episodes, "running reward-curve experiment");

    let mut rng = seeded_rng(config.seed);
    let linear = run_curve(&config.linear, &config, episodes, &mut rng)?;
    let exponential = run_curve(&config.exponential, &config, episodes, &mut rng)?;

    linear.plot.save(&paths.linear_plot)?;
    exponential.plot.save(&paths.exponential_plot)?;
    write_report(&paths, &config, episodes, &linear, &exponential)?;

    let snapshot = BenchmarkSnapshot {
        linear: linear.snapshot,
        exponential: exponential.snapshot,
    };

    match mode {
        ExperimentMode::Full => {
            if benchmark.is_none() {
                warn!("no benchmark snapshot recorded yet; run with --mode test to capture one");
            }
        }
        ExperimentMode::Test => {
            if let Some(reference) = benchmark {
                validate_benchmark(&snapshot, &reference)?;
                info!(tolerance = BENCHMARK_TOLERANCE, "benchmark check passed");
            } else {
                save_json(&paths.benchmark, &snapshot)?;
                info!(path = %paths.benchmark.display(), "saved new benchmark snapshot");
            }
        }
    }

    Ok(())
}

fn print_usage() {
    println!(
        "Usage: cargo run -p rewardkit-experiment-reward-curves -- [--mode full|test] [--out DIR]"
    );
}

/// Both modes share one directory so a test-mode benchmark is visible to full runs.
fn initialize_paths(output_dir: Option<&PathBuf>) -> ExperimentPaths {
    let dir = output_dir
        .cloned()
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("runs"));

    ExperimentPaths {
        config: dir.join("config.json"),
        report: dir.join("report.md"),
        benchmark: dir.join("benchmark.json"),
        linear_plot: dir.join("linear.html"),
        exponential_plot: dir.join("exponential.html"),
    }
}

/// Synthesise a reward curve that improves as exploration decays.
fn run_curve(
    schedule: &EpsilonSchedule,
    config: &ExperimentConfig,
    episodes: usize,
    rng: &mut rand::rngs::StdRng,
) -> Result<Curve> {
    let epsilons = schedule.values(episodes);
    let noise = uniform_noise(rng, config.noise, episodes)?;
    let rewards: Vec<f64> = epsilons
        .iter()
        .zip(&noise)
        .map(|(epsilon, noise)| 1.0 - epsilon + noise)
        .collect();

    let plot = plot_reward(
        &rewards,
        config.window,
        PlotLabels::new("episodes", format!("reward ({} epsilon)", schedule.label())),
    )?;

    let snapshot = CurveSnapshot {
        schedule: ScheduleSummary::from_values(schedule.label(), &epsilons, schedule.floor()),
        rewards: RewardSummary::from_stats(&rewards, plot.stats()),
    };
    info!(
        schedule = schedule.label(),
        final_mean = ?snapshot.rewards.final_mean,
        steps_to_floor = ?snapshot.schedule.steps_to_floor,
        "generated reward curve"
    );

    Ok(Curve {
        epsilons,
        snapshot,
        plot,
    })
}

fn write_report(
    paths: &ExperimentPaths,
    config: &ExperimentConfig,
    episodes: usize,
    linear: &Curve,
    exponential: &Curve,
) -> Result<()> {
    let sections = [
        ReportSection::new(
            "configuration",
            render_configuration_section(config, episodes),
        ),
        ReportSection::new(
            "schedules",
            render_schedules_section(&[linear, exponential]),
        ),
        ReportSection::new("rewards", render_rewards_section(&[linear, exponential])),
        ReportSection::new(
            "plots",
            render_plots_section(
                &paths.report,
                &[
                    ("Linear schedule", linear, &paths.linear_plot),
                    ("Exponential schedule", exponential, &paths.exponential_plot),
                ],
            ),
        ),
    ];

    update_sections(&paths.report, &sections)
}

fn render_configuration_section(config: &ExperimentConfig, episodes: usize) -> String {
    format!(
        "- Seed: {}\n- Episodes: {}\n- Rolling window: {}\n- Noise amplitude: {:.3}\n- Linear schedule: `{:?}`\n- Exponential schedule: `{:?}`\n",
        config.seed, episodes, config.window, config.noise, config.linear, config.exponential
    )
}

fn render_schedules_section(curves: &[&Curve]) -> String {
    let mut output = String::new();

    for curve in curves {
        let summary = &curve.snapshot.schedule;
        let _ = writeln!(&mut output, "### {}\n", summary.label);
        match summary.steps_to_floor {
            Some(step) => {
                let _ = writeln!(&mut output, "- Reaches floor at step {}", step);
            }
            None => {
                let _ = writeln!(&mut output, "- Never reaches floor");
            }
        }
        let _ = writeln!(&mut output, "\n| Step | Epsilon |");
        let _ = writeln!(&mut output, "| --- | --- |");
        for step in checkpoints(curve.epsilons.len()) {
            let _ = writeln!(&mut output, "| {} | {:.4} |", step, curve.epsilons[step]);
        }
        output.push('\n');
    }

    output
}

fn render_rewards_section(curves: &[&Curve]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        &mut output,
        "| Schedule | Episodes | Window | Total reward | Final mean | Final std | Best mean |"
    );
    let _ = writeln!(&mut output, "| --- | --- | --- | --- | --- | --- | --- |");

    for curve in curves {
        let rewards = &curve.snapshot.rewards;
        let _ = writeln!(
            &mut output,
            "| {} | {} | {} | {:.3} | {} | {} | {} |",
            curve.snapshot.schedule.label,
            rewards.episodes,
            rewards.window,
            rewards.total_reward,
            format_optional(rewards.final_mean),
            format_optional(rewards.final_std),
            format_optional(rewards.best_mean)
        );
    }

    output
}

fn render_plots_section(report_path: &Path, plots: &[(&str, &Curve, &PathBuf)]) -> String {
    let mut output = String::new();
    for (title, curve, plot_path) in plots {
        let _ = writeln!(
            &mut output,
            "- {}: [{}]({}) ({} of {} episodes smoothed, window {})",
            title,
            plot_file_name(plot_path),
            relative_to_report(report_path, plot_path),
            curve.snapshot.rewards.defined,
            curve.snapshot.rewards.episodes,
            curve.snapshot.rewards.window
        );
    }
    output
}

fn plot_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn relative_to_report(report_path: &Path, plot_path: &Path) -> String {
    match (report_path.parent(), plot_path.parent()) {
        (Some(report_dir), Some(plot_dir)) if report_dir == plot_dir => plot_file_name(plot_path),
        _ => plot_path.display().to_string(),
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:.4}"))
}

/// Evenly spread row indices for schedule tables, always including the last step.
fn checkpoints(len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let rows = SCHEDULE_TABLE_ROWS.min(len);
    let mut steps: Vec<usize> = (0..rows)
        .map(|row| row * (len - 1) / (rows - 1).max(1))
        .collect();
    steps.dedup();
    steps
}

fn validate_benchmark(actual: &BenchmarkSnapshot, reference: &BenchmarkSnapshot) -> Result<()> {
    validate_curve(&actual.linear, &reference.linear)?;
    validate_curve(&actual.exponential, &reference.exponential)
}

fn validate_curve(actual: &CurveSnapshot, reference: &CurveSnapshot) -> Result<()> {
    let label = &actual.schedule.label;
    if actual.schedule.steps != reference.schedule.steps
        || actual.schedule.steps_to_floor != reference.schedule.steps_to_floor
    {
        return Err(anyhow!(
            "{} schedule shape changed between runs; update benchmark if this is intentional",
            label
        ));
    }

    ensure_close_opt(
        actual.schedule.last,
        reference.schedule.last,
        &format!("{label} final epsilon"),
    )?;
    ensure_close(
        actual.rewards.total_reward,
        reference.rewards.total_reward,
        &format!("{label} total reward"),
    )?;
    ensure_close_opt(
        actual.rewards.final_mean,
        reference.rewards.final_mean,
        &format!("{label} final rolling mean"),
    )?;
    ensure_close_opt(
        actual.rewards.final_std,
        reference.rewards.final_std,
        &format!("{label} final rolling std"),
    )
}

fn ensure_close_opt(actual: Option<f64>, expected: Option<f64>, label: &str) -> Result<()> {
    match (actual, expected) {
        (Some(actual), Some(expected)) => ensure_close(actual, expected, label),
        (None, None) => Ok(()),
        _ => Err(anyhow!(
            "{} availability changed between runs; update benchmark if this is intentional",
            label
        )),
    }
}

fn ensure_close(actual: f64, expected: f64, label: &str) -> Result<()> {
    if (actual - expected).abs() > BENCHMARK_TOLERANCE {
        Err(anyhow!(
            "{} deviated from benchmark (actual {:.6} vs expected {:.6}, tol {:.1e})",
            label,
            actual,
            expected,
            BENCHMARK_TOLERANCE
        ))
    } else {
        Ok(())
    }
}
