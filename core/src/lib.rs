pub mod config;
pub mod experiment;
pub mod logging;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod rng;
pub mod rolling;
pub mod schedule;

pub use config::{load_json, load_or_init, save_json};
pub use experiment::{ExperimentArgs, ExperimentMode};
pub use logging::{init_tracing, DEFAULT_FILTER, LOG_ENV};
pub use metrics::{RewardSummary, ScheduleSummary};
pub use plot::{plot_reward, PlotLabels, RewardPlot};
pub use report::{ensure_report_file, update_sections, ReportSection, DEFAULT_REPORT_TEMPLATE};
pub use rng::{seeded_rng, uniform_noise};
pub use rolling::{centered_rolling, RollingStats};
pub use schedule::{get_epsilons, get_exp_epsilons, EpsilonRange, EpsilonSchedule};
