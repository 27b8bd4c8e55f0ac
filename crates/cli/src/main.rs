use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use db::KeyValueStore;
use events::Event;
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::{OrchestrationReport, StageProgression};
use planwise_core::{ProjectData, Questionnaire, StageStatus};
use server::config::{AppConfig, DEFAULT_DATA_DIR};
use server::{create_router, state::AppState};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "planwise=info,server=info,orchestrator=info,genai=info,tower_http=info";

#[derive(Parser)]
#[command(name = "planwise")]
#[command(about = "Turn a short questionnaire into an AI-generated project plan", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding config.toml and the database
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory, config file and database
    Init,
    /// Run the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        /// Store this AI key before starting
        #[arg(long, env = "PLANWISE_API_KEY")]
        api_key: Option<String>,

        /// Open the Swagger UI in a browser
        #[arg(long)]
        open: bool,
    },
    /// List saved projects with their roadmap progress
    Status,
    /// Generate a full plan from a questionnaire answers file
    Plan {
        answers: PathBuf,

        #[arg(long, env = "PLANWISE_API_KEY")]
        api_key: Option<String>,
    },
    /// Write a project as JSON
    Export {
        id: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Store an exported project JSON as a new project
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Some(Commands::Init) => init(&data_dir).await,
        Some(Commands::Serve {
            port,
            api_key,
            open,
        }) => serve(&data_dir, port, api_key, open).await,
        Some(Commands::Status) => status(&data_dir).await,
        Some(Commands::Plan { answers, api_key }) => plan(&data_dir, &answers, api_key).await,
        Some(Commands::Export { id, output }) => export(&data_dir, &id, output.as_deref()).await,
        Some(Commands::Import { file }) => import(&data_dir, &file).await,
        None => serve(&data_dir, None, None, false).await,
    }
}

async fn init(data_dir: &Path) -> Result<()> {
    let config_path = data_dir.join(server::config::CONFIG_FILE);
    if config_path.exists() {
        println!("Already initialized at {}", data_dir.display());
        return Ok(());
    }

    let config = AppConfig::default();
    config
        .write(data_dir)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let pool = db::create_pool(&config.database_url(data_dir)).await?;
    db::run_migrations(&pool).await?;

    println!();
    println!("{} planwise in {}", "Initialized".green().bold(), data_dir.display());
    println!();
    println!("Created:");
    println!("  {}/", data_dir.display());
    println!("  ├── {}", server::config::CONFIG_FILE);
    println!("  └── {}", config.storage.database);
    println!();
    println!("Next steps:");
    println!("  1. Run 'planwise serve --api-key <key>' to start the API");
    println!("  2. Or run 'planwise plan answers.json' for a headless plan");

    Ok(())
}

async fn load_state(data_dir: &Path) -> Result<(AppConfig, AppState)> {
    let config = AppConfig::read(data_dir).await;

    tokio::fs::create_dir_all(data_dir)
        .await
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let store = db::SqliteStore::connect(&config.database_url(data_dir))
        .await
        .context("Failed to open database")?;
    let store: Arc<dyn KeyValueStore> = Arc::new(store);

    let state = AppState::from_config(store, config.genai.clone());
    Ok((config, state))
}

async fn serve(
    data_dir: &Path,
    port: Option<u16>,
    api_key: Option<String>,
    open_browser: bool,
) -> Result<()> {
    init_tracing(DEFAULT_LOG_FILTER);

    let (config, state) = load_state(data_dir).await?;
    if let Some(key) = api_key {
        state.credentials.set(&key).await?;
    }
    let credential_configured = state.credentials.is_configured().await?;

    let host = config.server.host.clone();
    let port = port.unwrap_or(config.server.port);
    tracing::info!("Database: {}", config.database_path(data_dir).display());
    tracing::info!("Text model: {}", config.genai.text_model);

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    let base_url = format!("http://{}", listener.local_addr()?);

    println!();
    println!("planwise");
    println!("════════════════════════════════════════");
    println!();
    println!("  API Server:  {}", base_url);
    println!("  Swagger UI:  {}/swagger-ui", base_url);
    if !credential_configured {
        println!(
            "  {}  no API key stored, generation is disabled",
            "Warning:".yellow().bold()
        );
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    if open_browser {
        let swagger_url = format!("{}/swagger-ui", base_url);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            if let Err(e) = open::that(&swagger_url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        });
    }

    axum::serve(listener, app).await?;

    Ok(())
}

async fn status(data_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        println!("No planwise data in {}.", data_dir.display());
        println!("Run 'planwise init' to initialize.");
        return Ok(());
    }

    init_tracing("warn");
    let (_, state) = load_state(data_dir).await?;
    let summaries = state.projects.list().await?;
    let credential = state.credentials.get().await?;

    println!();
    println!("Data:    {}", data_dir.display());
    println!(
        "API key: {}",
        credential
            .as_deref()
            .map(orchestrator::mask_credential)
            .unwrap_or_else(|| "not set".to_string())
    );
    println!();

    if summaries.is_empty() {
        println!("No projects yet.");
        println!();
        return Ok(());
    }

    println!("Projects ({}):", summaries.len());
    for summary in &summaries {
        let Some(project) = state.projects.load(&summary.id).await? else {
            continue;
        };
        let progress = StageProgression::progress_percent(&project);
        let next = StageProgression::next_stage(&project)
            .map(|stage| stage.title().to_string())
            .unwrap_or_else(|| "done".to_string());
        let icon = if progress == 100 { "●" } else if progress > 0 { "◐" } else { "○" };

        println!(
            "  {} {:>3}%  {}  {}  (next: {})",
            icon,
            progress,
            summary.name.bold(),
            summary.id.dimmed(),
            next
        );
    }
    println!();

    Ok(())
}

async fn plan(data_dir: &Path, answers_path: &Path, api_key: Option<String>) -> Result<()> {
    init_tracing("warn");

    let content = tokio::fs::read_to_string(answers_path)
        .await
        .with_context(|| format!("Failed to read {}", answers_path.display()))?;
    let answers: Questionnaire =
        serde_json::from_str(&content).context("Answers file is not valid questionnaire JSON")?;

    let (_, state) = load_state(data_dir).await?;
    if let Some(key) = api_key {
        state.credentials.set(&key).await?;
    }
    let credential = state.credentials.require().await?;

    let project = state.projects.create(answers).await?;
    println!(
        "{} project {}",
        "Planning".green().bold(),
        project.id.dimmed()
    );

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos:>3}% {msg}")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let mut rx = state.event_bus.subscribe();
    let progress_bar = bar.clone();
    let progress = tokio::spawn(async move {
        loop {
            let envelope = match rx.recv().await {
                Ok(envelope) => envelope,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match envelope.event {
                Event::GenerationProgress {
                    progress, message, ..
                } => {
                    progress_bar.set_position(u64::from(progress));
                    progress_bar.set_message(message);
                }
                Event::StepFailed {
                    step,
                    error,
                    skipped,
                    ..
                } => {
                    let label = if skipped { "skipped" } else { "failed" };
                    progress_bar.println(format!("  {} {}: {}", label.yellow(), step, error));
                }
                Event::GenerationFinished { .. } => break,
                _ => {}
            }
        }
    });

    let handle = state
        .orchestration
        .start(&state.runs, project, credential)
        .await?;
    let report = handle.await.context("Generation task panicked")?;
    let _ = progress.await;
    bar.finish_and_clear();

    print_report(&report);
    print_roadmap(&report.project);

    if !report.is_success() {
        bail!(
            "Generation stopped at {}; regenerate the remaining stages from the API",
            report
                .failed_step
                .map(|step| step.as_str())
                .unwrap_or("an unknown step")
        );
    }
    Ok(())
}

fn print_report(report: &OrchestrationReport) {
    println!();
    let project = &report.project;
    println!("{}", project.display_name().bold());
    if let Some(slogan) = &project.slogan {
        println!("  {}", slogan.italic());
    }
    println!();

    for step in &report.completed_steps {
        println!("  {} {}", "✓".green(), step);
    }
    for step in &report.skipped_steps {
        println!("  {} {} (skipped)", "-".yellow(), step);
    }
    if let Some(step) = report.failed_step {
        println!(
            "  {} {}: {}",
            "✗".red(),
            step,
            report.error.as_deref().unwrap_or("failed")
        );
    }
}

fn print_roadmap(project: &ProjectData) {
    println!();
    println!("Roadmap:");
    for view in StageProgression::roadmap(project) {
        let status = match view.status {
            StageStatus::Completed => "completed".green(),
            StageStatus::Available => "available".yellow(),
            StageStatus::Locked => "locked".dimmed(),
        };
        println!("  {:<22} {}", view.stage.title, status);
    }
    println!();
    println!("Project id: {}", project.id);
}

async fn export(data_dir: &Path, id: &str, output: Option<&Path>) -> Result<()> {
    init_tracing("warn");
    let (_, state) = load_state(data_dir).await?;
    let json = state.projects.export_json(id).await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn import(data_dir: &Path, file: &Path) -> Result<()> {
    init_tracing("warn");
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let (_, state) = load_state(data_dir).await?;
    let project = state.projects.import_json(&content).await?;

    println!(
        "{} {} as {}",
        "Imported".green().bold(),
        project.display_name().bold(),
        project.id
    );
    Ok(())
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
