use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod analyzer;
mod config;
mod dataset;
mod gemini;
mod history;
mod links;
mod models;
mod report;
mod risk;
mod state;

use analyzer::{
    decode_image, load_image, validate_link, Analysis, AnalysisRequest, Analyzer, InputMode,
};
use config::Config;
use history::HistoryStore;
use links::LinkReport;
use report::BatchRow;
use state::AppState;

#[derive(Parser)]
#[command(name = "fraud-scan")]
#[command(about = "Scores messages, emails and screenshots for fraud risk", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Use the offline heuristic scorer even when an API key is set
    #[arg(long, global = true)]
    mock: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum View {
    Summary,
    Email,
    Links,
    Timeline,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a message, a screenshot or a demo scenario
    #[command(group(
        ArgGroup::new("input")
            .args(["text", "image", "image_data", "demo"])
            .required(true)
            .multiple(true)
    ))]
    Analyze {
        text: Option<String>,
        #[arg(long, conflicts_with = "image_data")]
        image: Option<PathBuf>,
        /// Screenshot as base64 or a data: URL
        #[arg(long)]
        image_data: Option<String>,
        /// Demo scenario id (see `demo`)
        #[arg(long, conflicts_with_all = ["text", "image", "image_data"])]
        demo: Option<String>,
        #[arg(long, value_enum, default_value_t = View::Summary)]
        view: View,
    },
    /// Analyze an email from its sender, subject and body
    Email {
        #[arg(long, default_value = "")]
        sender: String,
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long, value_enum, default_value_t = View::Email)]
        view: View,
    },
    /// Check a single URL
    Link { url: String },
    /// List the demo scenarios
    Demo,
    /// Score every `text` row of a CSV file
    Batch {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Inspect or manage recent analyses
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Write a markdown report of recent analyses
    Report {
        #[arg(long, default_value = "fraud-report.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Show the most recent analyses
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show recorded analyses at or above a risk score
    Alerts {
        #[arg(long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(0..=100))]
        min_score: u8,
    },
    /// Delete all recorded analyses
    Clear,
    /// Record offline verdicts for every demo scenario
    Seed,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fraud_scan=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fraud_scan=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn render_view(view: View, analysis: &Analysis, links: &[LinkReport]) -> anyhow::Result<String> {
    let response = &analysis.response;
    Ok(match view {
        View::Summary => report::render_summary(analysis),
        View::Email => report::render_email(response),
        View::Links => report::render_links(response, links),
        View::Timeline => report::render_timeline(response),
        View::Json => serde_json::to_string_pretty(response).context("failed to encode verdict")?,
    })
}

fn inspect_links(text: &str) -> Vec<LinkReport> {
    links::extract_urls(text)
        .iter()
        .filter_map(|url| LinkReport::inspect(url))
        .collect()
}

fn finish(state: &AppState, view: View, config: &Config) -> anyhow::Result<()> {
    let analysis = state
        .result
        .as_ref()
        .context("analysis finished without a verdict")?;
    let links = inspect_links(&state.input_text);
    println!("{}", render_view(view, analysis, &links)?);

    let mut history = HistoryStore::open_default(config.history_path.as_deref());
    let record = history.add(&analysis.response, state.mode_label());
    debug!(
        id = %record.id,
        demo_mode = state.demo_mode,
        persistent = history.is_persistent(),
        "recorded analysis"
    );
    Ok(())
}

async fn run_batch(
    analyzer: &Analyzer,
    csv_path: &std::path::Path,
) -> anyhow::Result<Vec<BatchRow>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        text: String,
        #[serde(default)]
        label: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 1;
        let row = result.with_context(|| format!("invalid CSV row {line}"))?;
        let request = match AnalysisRequest::text(row.text) {
            Ok(request) => request.with_mode(InputMode::Batch),
            Err(err) => {
                warn!(line, error = %err, "skipping row");
                continue;
            }
        };

        let analysis = analyzer.analyze(&request).await;
        rows.push(BatchRow {
            line,
            label: row.label.filter(|label| !label.trim().is_empty()),
            response: analysis.response,
        });
    }

    Ok(rows)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_env();
    let demo_mode = cli.mock || config.demo_mode;
    let analyzer = Analyzer::new(&config, cli.mock);
    debug!(online = analyzer.is_online(), model = %config.model, "analyzer ready");

    match cli.command {
        Commands::Analyze {
            text,
            image,
            image_data,
            demo,
            view,
        } => {
            let mut state = AppState::new(demo_mode);
            if let Some(id) = demo.as_deref() {
                let item = state.fill_demo_data(id)?;
                info!(scenario = item.id, tier = item.risk_tier.as_str(), "loaded demo scenario");
            } else {
                state.set_input(text.unwrap_or_default());
                let image = match (image, image_data) {
                    (Some(path), _) => Some(load_image(&path)?),
                    (None, Some(encoded)) => Some(decode_image(&encoded)?),
                    (None, None) => None,
                };
                state.set_image(image);
            }

            state.run(&analyzer).await?;
            finish(&state, view, &config)?;
        }
        Commands::Email {
            sender,
            subject,
            body,
            view,
        } => {
            let request = AnalysisRequest::email(&sender, &subject, &body)?;
            let mut state = AppState::new(demo_mode);
            state.submit(&analyzer, request).await;
            finish(&state, view, &config)?;
        }
        Commands::Link { url } => {
            let report = validate_link(&url)?;
            print!("{}", report::render_link_check(&report));
        }
        Commands::Demo => {
            print!("{}", report::render_demo_list());
        }
        Commands::Batch { csv } => {
            let rows = run_batch(&analyzer, &csv).await?;
            print!("{}", report::render_batch(&rows));
        }
        Commands::History { action } => {
            let mut history = HistoryStore::open_default(config.history_path.as_deref());
            match action {
                HistoryAction::List { limit } => {
                    if let Some(path) = history.path() {
                        println!("History file: {}", path.display());
                    }
                    print!("{}", report::render_history(history.list(), limit));
                }
                HistoryAction::Alerts { min_score } => {
                    print!("{}", report::render_alerts(history.list(), min_score));
                }
                HistoryAction::Clear => {
                    history.clear();
                    println!("History cleared.");
                }
                HistoryAction::Seed => {
                    let seeded = history.seed();
                    println!("Recorded {seeded} demo analyses.");
                }
            }
        }
        Commands::Report { out } => {
            let history = HistoryStore::open_default(config.history_path.as_deref());
            let report = report::build_history_report(history.list());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
