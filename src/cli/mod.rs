//! Command-line interface for training and dataset inspection.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::metrics_index::{IndexOutcome, MetricsIndexConfig};
use crate::pipeline::{PipelineConfig, TrainingPipeline, TrainingSummary};
use crate::preprocessing::{label_distribution, TARGET_COLUMN};
use crate::tracking::TrackingConfig;
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(230, 190, 90) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lungcancer-rf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Random-forest training pipeline for the lung cancer survey")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full training pipeline
    Train {
        /// Survey CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Where the best model is written (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Experiment tracker base URL
        #[arg(long, env = "MLFLOW_TRACKING_URI")]
        tracking_uri: Option<String>,

        /// Experiment name (created when missing)
        #[arg(long, env = "MLFLOW_EXPERIMENT_NAME")]
        experiment: Option<String>,

        /// Metrics index base URL
        #[arg(long, env = "METRICS_INDEX_URL")]
        index_url: Option<String>,

        /// Skip the metrics index entirely
        #[arg(long)]
        no_index: bool,

        /// Worker threads for the grid search
        #[arg(long)]
        n_jobs: Option<usize>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show dataset information
    Info {
        /// Survey CSV file
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Options of the `train` command
#[derive(Debug, Clone, Default)]
pub struct TrainArgs {
    pub tracking_uri: Option<String>,
    pub experiment: Option<String>,
    pub index_url: Option<String>,
    pub no_index: bool,
    pub n_jobs: Option<usize>,
    pub json: bool,
}

impl TrainArgs {
    /// Overlay the flags onto the environment-derived defaults
    pub fn to_config(&self) -> PipelineConfig {
        let mut tracking = TrackingConfig::default();
        if let Some(uri) = &self.tracking_uri {
            tracking = tracking.with_tracking_uri(uri.clone());
        }
        if let Some(name) = &self.experiment {
            tracking = tracking.with_experiment_name(name.clone());
        }

        let mut index = MetricsIndexConfig::default();
        if let Some(url) = &self.index_url {
            index = index.with_url(url.clone());
        }
        if self.no_index {
            index = index.disabled();
        }

        let mut config = PipelineConfig::default()
            .with_tracking(tracking)
            .with_metrics_index(index);
        if let Some(n) = self.n_jobs {
            config = config.with_n_jobs(n);
        }
        config
    }
}

// ─── Train ─────────────────────────────────────────────────────────────────────

pub async fn cmd_train(data_path: &PathBuf, output: &PathBuf, args: &TrainArgs) -> anyhow::Result<()> {
    let config = args.to_config();

    if args.json {
        let summary = TrainingPipeline::new(config).run(data_path, output).await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    section("Train");
    println!("  {:<12} {}", muted("Data"), data_path.display());
    println!("  {:<12} {}", muted("Tracker"), config.tracking.tracking_uri);
    println!("  {:<12} {}", muted("Experiment"), config.tracking.experiment_name);
    println!("  {:<12} {} candidates × {} folds", muted("Search"), config.grid.len(), config.cv_folds);
    println!();

    step_run("Training");
    let start = Instant::now();
    let summary = TrainingPipeline::new(config).run(data_path, output).await?;
    step_done(&format!("{:.1}s", start.elapsed().as_secs_f64()));

    print_summary(&summary, output);
    Ok(())
}

fn print_summary(summary: &TrainingSummary, output: &PathBuf) {
    println!();
    line_box_top();
    line_box_empty();
    line_box(&kv("CV accuracy     ", &format!("{:.4}", summary.accuracy)));
    line_box(&kv("Hold-out        ", &format!("{:.4}", summary.holdout_accuracy)));
    line_box(&kv("Run             ", &summary.run_id));
    line_box(&kv("Model           ", &output.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    for (name, value) in summary.best_params.to_param_map() {
        line_box(&kv(&format!("{:<16}", name), &value));
    }
    line_box_empty();
    line_box_bottom();

    let index = match &summary.index_outcome {
        IndexOutcome::Indexed { id } => format!("{} {}", ok("indexed"), dim(id)),
        IndexOutcome::Unreachable => warn("index unreachable, document skipped").to_string(),
        IndexOutcome::Failed { reason } => format!("{} {}", warn("index failed"), dim(reason)),
        IndexOutcome::Disabled => dim("index disabled").to_string(),
    };
    println!("  {}", index);
    println!();
}

// ─── Info ──────────────────────────────────────────────────────────────────────

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let loader = DataLoader::new();
    let info = loader.get_file_info(data_path)?;
    let df = loader.load_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), info.path);
    println!("  {:<12} {:.1} KB", muted("Size"), info.file_size as f64 / 1024.0);
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<22} {:<10} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(42)));
    for col in df.get_columns() {
        println!(
            "  {:<22} {:<10} {:>6}",
            col.name().to_string(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
        );
    }

    println!();
    match label_distribution(&df, TARGET_COLUMN) {
        Ok(counts) => {
            println!("  {}", muted("Label balance"));
            for (label, count) in counts {
                let share = count as f64 / df.height().max(1) as f64 * 100.0;
                println!("    {:<10} {:>6}  {}", label, count, dim(&format!("{:.1}%", share)));
            }
        }
        Err(_) => println!("  {}", warn(&format!("no {} column", TARGET_COLUMN))),
    }
    println!();

    Ok(())
}
