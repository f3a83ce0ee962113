//! `ftr` - Dashboards functional test runner

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ftr_e2e::{run_session, scenarios, write_results, RunOptions, Suite};
use ftr_harness::{FtrConfig, FtrContext};

#[derive(Parser)]
#[command(name = "ftr")]
#[command(about = "Functional test runner for Dashboards")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "FTR_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios
    Run(RunArgs),

    /// List scenarios and their cases
    List,
}

#[derive(Args)]
struct RunArgs {
    /// Scenario id; every scenario runs when omitted
    scenario: Option<String>,

    /// Configuration file
    #[arg(short, long, env = "FTR_CONFIG")]
    config: Option<PathBuf>,

    /// Only run cases whose full title contains this text
    #[arg(short, long)]
    grep: Option<String>,

    /// WebDriver endpoint
    #[arg(long, env = "FTR_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Base URL of the application under test
    #[arg(long, env = "FTR_BASE_URL")]
    base_url: Option<String>,

    /// Stop a suite at its first failing case
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    bail: Option<bool>,

    /// Directory for test-results.json
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run against the in-memory application instead of a browser
    #[cfg(feature = "fake-app")]
    #[arg(long)]
    fake: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::List => {
            for (id, build) in scenarios::SCENARIOS {
                let suite = build();
                println!("{id}: {}", suite.name());
                for title in suite.titles() {
                    println!("    {title}");
                }
            }
            Ok(())
        }
        Commands::Run(args) => run(args).await,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn load_config(args: &RunArgs) -> anyhow::Result<FtrConfig> {
    let mut config = match &args.config {
        Some(path) => FtrConfig::load(path)?,
        None => FtrConfig::default(),
    };
    if let Some(url) = &args.webdriver_url {
        config.webdriver.url = url.clone();
    }
    if let Some(url) = &args.base_url {
        config.app.base_url = url.clone();
    }
    if let Some(bail) = args.bail {
        config.run.bail = bail;
    }
    if let Some(output) = &args.output {
        config.run.output_dir = output.display().to_string();
    }
    config.validate()?;
    Ok(config)
}

#[cfg_attr(not(feature = "fake-app"), allow(unused_variables))]
async fn connect(config: FtrConfig, args: &RunArgs) -> anyhow::Result<FtrContext> {
    #[cfg(feature = "fake-app")]
    if args.fake {
        let app = std::sync::Arc::new(ftr_harness::fake::FakeDashboards::new(&config.app));
        let settings = app.settings_store();
        return Ok(FtrContext::new(config, app, settings)?);
    }
    Ok(FtrContext::connect(config).await?)
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let suites: Vec<Suite> = match &args.scenario {
        Some(id) => vec![scenarios::by_id(id)?],
        None => scenarios::all(),
    };
    let options = RunOptions {
        bail: config.run.bail,
        grep: args.grep.clone(),
    };
    let output_dir = PathBuf::from(&config.run.output_dir);

    info!("ftr v{}", env!("CARGO_PKG_VERSION"));
    let ctx = connect(config, &args).await?;
    let results = run_session(&ctx, &suites, options).await?;
    write_results(&output_dir, &results)?;

    let failed: usize = results.iter().map(|r| r.failed + r.hook_failures.len()).sum();
    if failed > 0 {
        anyhow::bail!("{failed} failure(s)");
    }
    if results.iter().all(|r| r.total == 0) {
        return Err(ftr_e2e::E2eError::NothingToRun(args.grep.unwrap_or_default()).into());
    }
    Ok(())
}
