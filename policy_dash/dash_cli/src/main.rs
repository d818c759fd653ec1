use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use policy_report::{
    ClassifiedLine, DashboardView, FeatureBar, RecommendationCard, ReportParser, ReportSection,
};
use policy_simulation_client::{ClientConfig, Region, RunOutcome, SimulationClient, ViewHooks};
use shared_logging::LogLevel;
use tokio::{runtime::Runtime, sync::Notify};

/// Extra wait for the scroll hook beyond the configured delay.
const SCROLL_GRACE: Duration = Duration::from_millis(500);

/// Time left to detached tasks once the command has finished.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Cells of a full-width driver bar.
const BAR_CELLS: f64 = 20.0;

#[derive(Parser, Debug)]
#[command(name = "policy-dash", version, about = "Policy simulation dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs one policy simulation and prints the results dashboard.
    Simulate(SimulateArgs),
    /// Parses a narrative report and prints its sections.
    Report {
        /// Narrative file; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print sections as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Free-text policy description.
    #[arg(long)]
    policy: String,
    /// Ask the backend to optimize the policy parameters.
    #[arg(long)]
    optimize: bool,
    /// Target state or union territory.
    #[arg(long)]
    state: Option<String>,
    /// TOML client configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON-lines log file, overriding the configuration.
    #[arg(long)]
    log: Option<PathBuf>,
    /// JSON-lines event file, overriding the configuration.
    #[arg(long)]
    event_log: Option<PathBuf>,
    /// Minimum log level (DEBUG, INFO, WARN, ERROR).
    #[arg(long)]
    min_level: Option<String>,
    /// Print the raw result as JSON.
    #[arg(long)]
    json: bool,
}

/// Terminal stand-in for scrolling: announces the results anchor and wakes the renderer.
#[derive(Default)]
struct TerminalHooks {
    shown: Notify,
}

impl ViewHooks for TerminalHooks {
    fn scroll_into_view(&self, anchor: &str) {
        eprintln!("-> #{anchor}");
        self.shown.notify_one();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate(args) => handle_simulate(args),
        Commands::Report { file, json } => handle_report(file, json),
    }
}

fn handle_simulate(args: SimulateArgs) -> Result<()> {
    if args.policy.trim().is_empty() {
        bail!("policy text must not be blank");
    }
    let config = load_config(&args)?;
    let runtime = Runtime::new().context("starting async runtime")?;
    let outcome = runtime.block_on(simulate(args, config));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    outcome
}

async fn simulate(args: SimulateArgs, config: ClientConfig) -> Result<()> {
    let scroll_wait = config.scroll_delay() + SCROLL_GRACE;
    let hooks = Arc::new(TerminalHooks::default());
    let client = SimulationClient::builder()
        .config(config)
        .hooks(hooks.clone())
        .build()?;
    let region = args.state.as_deref().map(Region::new);
    match client.run(args.policy, args.optimize, region).await {
        RunOutcome::Succeeded(result) => {
            let _ = tokio::time::timeout(scroll_wait, hooks.shown.notified()).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(result.as_ref())?);
            } else {
                print!("{}", render_dashboard(&DashboardView::from_result(&result)));
            }
            Ok(())
        }
        RunOutcome::Failed(message) => bail!("simulation failed: {message}"),
        RunOutcome::Superseded => bail!("simulation was superseded by a newer run"),
    }
}

fn load_config(args: &SimulateArgs) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(path) = &args.log {
        config.telemetry.log_path = Some(path.clone());
    }
    if let Some(path) = &args.event_log {
        config.telemetry.event_log = Some(path.clone());
    }
    if let Some(level) = &args.min_level {
        config.telemetry.min_level = level.parse::<LogLevel>()?;
    }
    config.apply_env()
}

fn handle_report(file: Option<PathBuf>, json: bool) -> Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("reading report {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading report from stdin")?;
            buf
        }
    };
    let sections = ReportParser::parse(Some(&text));
    if json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
    } else {
        print!("{}", render_sections(&sections));
    }
    Ok(())
}

fn render_dashboard(view: &DashboardView) -> String {
    let mut out = format!("Simulation {}\n\n", view.simulation_id);
    for card in &view.metric_cards {
        out.push_str(&format!("{:<24}{}", card.title, card.value_label()));
        if let Some(predicted) = card.predicted_label() {
            out.push_str(&format!("  ({predicted})"));
        }
        out.push('\n');
    }

    out.push_str("\nImpact predictions\n");
    for bar in &view.impact_bars {
        out.push_str(&format!("  {:<18}{:.3}\n", bar.name, bar.value));
    }

    if let Some(panel) = &view.optimization {
        out.push_str(&format!(
            "\nOptimization\n  Reward score      {}\n  Improvement       {}\n  Cost efficiency   {}\n",
            panel.reward_score, panel.improvement, panel.cost_efficiency
        ));
    }

    if !view.drivers.is_empty() {
        out.push_str("\nKey impact drivers\n");
        for bar in &view.drivers {
            let filled = bar_cells(bar);
            out.push_str(&format!(
                "  {:<24}{:<20} {}\n",
                bar.label,
                "#".repeat(filled),
                bar.percent_label()
            ));
        }
    }

    if !view.sections.is_empty() {
        out.push('\n');
        out.push_str(&render_sections(&view.sections));
    }

    if !view.recommendations.is_empty() {
        out.push_str("\nRecommendations\n");
        for card in &view.recommendations {
            out.push_str(&render_card(card));
        }
    }
    out
}

fn bar_cells(bar: &FeatureBar) -> usize {
    let cells = (bar.fraction * BAR_CELLS).round().clamp(0.0, BAR_CELLS);
    // NaN clamps to NaN and casts to zero.
    cells as usize
}

fn render_sections(sections: &[ReportSection]) -> String {
    let mut out = String::new();
    for section in sections {
        out.push_str(&section.title);
        out.push('\n');
        for line in &section.lines {
            match line {
                ClassifiedLine::Bullet { text } => out.push_str(&format!("  • {text}\n")),
                ClassifiedLine::KeyValue { key, value } => {
                    out.push_str(&format!("  {key}: {value}\n"));
                }
                ClassifiedLine::Paragraph { text } => out.push_str(&format!("  {text}\n")),
            }
        }
        out.push('\n');
    }
    out
}

fn render_card(card: &RecommendationCard) -> String {
    match card {
        RecommendationCard::Text { text } => format!("  - {text}\n"),
        RecommendationCard::Detailed {
            priority,
            category,
            heading,
            rationale,
            action_items,
        } => {
            let mut badges: Vec<&str> = Vec::new();
            if let Some(badge) = priority {
                badges.push(&badge.label);
            }
            if let Some(category) = category {
                badges.push(category);
            }
            let mut out = if badges.is_empty() {
                format!("  - {heading}\n")
            } else {
                format!("  - [{}] {heading}\n", badges.join(" | "))
            };
            if let Some(rationale) = rationale {
                out.push_str(&format!("      {rationale}\n"));
            }
            for (idx, item) in action_items.iter().enumerate() {
                out.push_str(&format!("      {}. {item}\n", idx + 1));
            }
            out
        }
    }
}
