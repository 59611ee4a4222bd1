//! CLI entry point for the mentor recommendation engine.
//!
//! Provides commands for building the index, querying it, inspecting the
//! served generation and (with `http-server`) serving it over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use mentor_rag::display::{self, THEME, Tone, with_spinner};
use mentor_rag::io::{ExitCode, JsonError, OutputFormat};
use mentor_rag::semantic::IndexManifest;
use mentor_rag::{
    JsonFileSource, MentorError, MentorListing, MentorService, MentorSource, QueryProfile,
    RecommendResponse, SearchFilters, Settings, TopK,
};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Semantic mentor recommendations
#[derive(Parser)]
#[command(
    name = "mentor-rag",
    version = env!("CARGO_PKG_VERSION"),
    about = "Semantic mentor recommendations",
    long_about = "Build a semantic index of mentors and recommend the closest matches for a student profile.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ mentor-rag init\n  $ mentor-rag build --source mentors.json\n  $ mentor-rag recommend --skills rust,python --country India"
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Set up .mentor-rag directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Display active settings")]
    Config,

    #[command(about = "Embed available mentors and publish a new index generation")]
    Build {
        /// Mentor export to read instead of `data.mentors_path`
        #[arg(short, long)]
        source: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    #[command(about = "Show the served index generation")]
    Info {
        #[arg(long)]
        json: bool,
    },

    #[command(about = "List mentors from the configured source")]
    Mentors {
        /// Include mentors not accepting mentees
        #[arg(short, long)]
        all: bool,

        #[arg(long)]
        json: bool,
    },

    #[command(
        about = "Recommend mentors for a student profile",
        after_help = "Examples:\n  mentor-rag recommend --skills python,ml --interests research --country India\n  mentor-rag recommend --department \"Computer\" --career-goal \"data scientist\" --top-k 3 --json"
    )]
    Recommend {
        /// Comma-separated skills
        #[arg(long, value_delimiter = ',')]
        skills: Vec<String>,

        /// Comma-separated interests
        #[arg(long, value_delimiter = ',')]
        interests: Vec<String>,

        #[arg(long)]
        degree: Option<String>,

        /// Also filters mentors by department (substring, case-insensitive)
        #[arg(long)]
        department: Option<String>,

        /// Also filters mentors by resolved country
        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        preferred_domain: Option<String>,

        #[arg(long)]
        career_goal: Option<String>,

        /// Number of results (defaults to 5)
        #[arg(short = 'k', long)]
        top_k: Option<i64>,

        #[arg(long)]
        json: bool,
    },

    #[command(about = "Recommend mentors for raw query text")]
    Query {
        text: String,

        #[arg(short = 'k', long)]
        top_k: Option<i64>,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        json: bool,
    },

    #[cfg(feature = "http-server")]
    #[command(about = "Serve the HTTP API")]
    Serve {
        /// Address to bind (overrides `server.bind`)
        #[arg(long)]
        bind: Option<String>,
    },
}

impl Commands {
    fn output_format(&self) -> OutputFormat {
        let json = match self {
            Commands::Build { json, .. }
            | Commands::Info { json }
            | Commands::Mentors { json, .. }
            | Commands::Recommend { json, .. }
            | Commands::Query { json, .. } => *json,
            _ => false,
        };
        OutputFormat::from_json_flag(json)
    }
}

#[derive(Debug, Serialize)]
struct IndexInfo {
    generation: String,
    generations_on_disk: usize,
    manifest: IndexManifest,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.command.output_format();

    let settings = match &cli.config {
        Some(path) => match Settings::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!(
                    "{}",
                    THEME.status(Tone::Error, format!(
                        "Configuration error loading from {}: {e}",
                        path.display()
                    ))
                );
                std::process::exit(ExitCode::ConfigError.into());
            }
        },
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("{}", THEME.status(Tone::Warning, format!("Configuration error: {e}")));
            Settings::default()
        }),
    };

    init_tracing(&settings.logging.level);

    if cli.config.is_none() && !matches!(cli.command, Commands::Init { .. }) {
        if let Err(warning) = Settings::check_init() {
            tracing::warn!("{warning}; using default configuration");
        }
    }

    let code = match run(cli.command, settings).await {
        Ok(code) => code,
        Err(e) => report_error(&e, format),
    };
    if !code.is_success() {
        tracing::debug!(code = i32::from(code), "{}", code.description());
    }
    if code.is_blocking() {
        eprintln!("{}", THEME.status(Tone::Warning, code.description()));
    }
    std::process::exit(code.into());
}

/// `RUST_LOG` wins over `logging.level`. Logs go to stderr.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_error(error: &anyhow::Error, format: OutputFormat) -> ExitCode {
    let Some(mentor_error) = error.downcast_ref::<MentorError>() else {
        eprintln!("{}", THEME.status(Tone::Error, format!("{error:#}")));
        return ExitCode::GeneralError;
    };

    if format.is_json() {
        if let Ok(json) = serde_json::to_string_pretty(&JsonError::from_error(mentor_error)) {
            println!("{json}");
            return ExitCode::from_error(mentor_error);
        }
    }
    eprintln!("{}", THEME.status(Tone::Error, mentor_error));
    for suggestion in mentor_error.recovery_suggestions() {
        eprintln!("  {}", THEME.paint(&THEME.dim, suggestion));
    }
    ExitCode::from_error(mentor_error)
}

fn load_service(
    settings: &Settings,
    source: Arc<dyn MentorSource>,
) -> anyhow::Result<MentorService> {
    let service = with_spinner("Loading embedding model...", || {
        MentorService::from_settings(settings, source)
    })?;
    Ok(service)
}

fn render_recommendations(response: &RecommendResponse) -> String {
    let query = THEME.paint(&THEME.dim, format!("Query: {}", response.query));
    if response.results.is_empty() {
        format!("{query}\n{}", THEME.status(Tone::Warning, "No mentors matched"))
    } else {
        format!("{query}\n{}", display::recommendation_table(response))
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    let values: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    (!values.is_empty()).then_some(values)
}

async fn run(command: Commands, settings: Settings) -> anyhow::Result<ExitCode> {
    let format = command.output_format();

    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force).map_err(|e| anyhow::anyhow!("{e}"))?;
            println!(
                "{}",
                THEME.status(Tone::Success, format!(
                    "Created configuration file at {}",
                    THEME.paint(&THEME.path, path.display())
                ))
            );
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("{}", THEME.paint(&THEME.header, "Current Configuration:"));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Build { source, json: _ } => {
            let source: Arc<dyn MentorSource> = match source {
                Some(path) => Arc::new(JsonFileSource::new(path)),
                None => MentorService::default_source(&settings),
            };
            let service = load_service(&settings, source)?;
            let report = service.rebuild();

            format.emit(&report, |report| {
                let mut out: Vec<String> = report
                    .messages
                    .iter()
                    .map(|message| THEME.paint(&THEME.dim, message))
                    .collect();
                out.push(display::build_report_table(report));
                out.join("\n")
            })?;
            return Ok(ExitCode::from_build_report(&report));
        }

        Commands::Info { json: _ } => {
            let artifacts = settings.artifact_store();
            let dir = artifacts.current_dir()?;
            let manifest = IndexManifest::load(&dir)?;
            let info = IndexInfo {
                generation: artifacts.current_generation()?.unwrap_or_default(),
                generations_on_disk: artifacts.generations()?.len(),
                manifest,
            };

            format.emit(&info, |info| {
                format!(
                    "{}\n{}",
                    display::index_info_table(
                        &info.generation,
                        &info.manifest,
                        info.generations_on_disk
                    ),
                    THEME.paint(&THEME.path, artifacts.root().display())
                )
            })?;
        }

        Commands::Mentors { all, json: _ } => {
            let source = MentorService::default_source(&settings);
            let mentors = source
                .fetch_mentors(!all)
                .map_err(MentorError::from)?;

            let listing = MentorListing::from(mentors);
            format.emit(&listing, |listing| {
                format!(
                    "{}\n{} mentors",
                    display::mentor_table(&listing.mentors),
                    THEME.paint(&THEME.number, listing.count)
                )
            })?;
        }

        Commands::Recommend {
            skills,
            interests,
            degree,
            department,
            country,
            preferred_domain,
            career_goal,
            top_k,
            json: _,
        } => {
            let profile = QueryProfile {
                skills: non_empty(skills),
                interests: non_empty(interests),
                preferred_domain,
                country,
                career_goal,
                degree,
                department,
                top_k,
            };
            let service = load_service(&settings, MentorService::default_source(&settings))?;
            let response = service.recommend(&profile)?;
            format.emit(&response, render_recommendations)?;
        }

        Commands::Query {
            text,
            top_k,
            country,
            department,
            json: _,
        } => {
            let filters = SearchFilters::new(country.as_deref(), department.as_deref());
            let service = load_service(&settings, MentorService::default_source(&settings))?;
            let response =
                service.recommend_text(&text, TopK::from_requested(top_k), &filters)?;
            format.emit(&response, render_recommendations)?;
        }

        #[cfg(feature = "http-server")]
        Commands::Serve { bind } => {
            use anyhow::Context;

            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            let service = Arc::new(load_service(
                &settings,
                MentorService::default_source(&settings),
            )?);

            // Warm the engine so the first request doesn't pay for the load
            match service.engine() {
                Ok(engine) => tracing::info!(mentors = engine.len(), "index loaded"),
                Err(e) if e.is_not_initialized() => {
                    tracing::warn!("no index yet; POST /build-index to create one")
                }
                Err(e) => return Err(e.into()),
            }

            mentor_rag::http::serve(service, &bind)
                .await
                .with_context(|| format!("HTTP server on {bind} failed"))?;
        }
    }

    Ok(ExitCode::Success)
}
