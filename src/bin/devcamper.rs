use clap::{Parser, Subcommand};
use devcamper::api::Api;
use devcamper::cli::{self as prog_cli, OutputMode};
use devcamper::config::AppConfig;
use devcamper::seed::SeedOptions;
use devcamper::services::OfflineGeocoder;
use devcamper::store::MemoryStore;
use devcamper::utils::logger;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "devcamper", version, about = "DevCamper API over an in-memory store", long_about = None)]
struct Cli {
    #[arg(long, global = true, help = "Path to a config file (TOML); defaults to DEVCAMPER_CONFIG or ./devcamper.toml")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "COLLECTION=FILE", help = "NDJSON file to load before running; repeatable")]
    seed: Vec<String>,
    #[arg(long, global = true, help = "Skip seed lines that fail to import")]
    skip_errors: bool,
    #[arg(long, global = true, help = "Print compact JSON")]
    compact: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run an advanced-results query and print the envelope")]
    Query {
        #[arg(help = "Collection name (bootcamps, courses, reviews, users)")]
        collection: String,
        #[arg(default_value = "", help = "Query string, e.g. 'averageCost[lte]=10000&select=name&page=2'")]
        params: String,
    },
    #[command(about = "Send one request through the API dispatcher; prints status and body")]
    Request {
        #[arg(help = "GET, POST, PUT or DELETE")]
        method: String,
        #[arg(help = "Path with query string, e.g. /api/v1/bootcamps?limit=2")]
        path: String,
        #[arg(long, help = "JSON request body")]
        body: Option<String>,
        #[arg(long, help = "Bearer token")]
        token: Option<String>,
    },
    #[command(about = "Generate a P-256 PKCS#8 PEM key for token_key_pem")]
    Keygen,
    #[command(name = "hash-password", about = "Print the argon2 PHC hash of a password")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
    },
}

impl From<Commands> for prog_cli::Command {
    fn from(c: Commands) -> Self {
        match c {
            Commands::Query { collection, params } => Self::Query { collection, params },
            Commands::Request { method, path, body, token } => Self::Request { method, path, body, token },
            Commands::Keygen => Self::Keygen,
            Commands::HashPassword { password } => Self::HashPassword { password },
        }
    }
}

async fn run(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    let cfg = AppConfig::load(cli.config.as_deref())?;
    if cfg.log_dir.is_some() || cfg.log_level.is_some() {
        logger::configure_logging(cfg.log_dir.as_deref(), cfg.log_level.as_deref(), None);
    } else {
        logger::configure_from_env();
    }
    let seeds = cli.seed.iter().map(|s| prog_cli::parse_seed_spec(s)).collect::<Result<Vec<_>, _>>()?;
    let store = MemoryStore::new();
    let opts = SeedOptions {
        skip_errors: cli.skip_errors,
        progress_every: Some(1000),
        geocoder: Some(Arc::new(OfflineGeocoder::new(cfg.zipcodes.clone()))),
    };
    let report = prog_cli::seed_store(&store, &seeds, &opts)?;
    if !seeds.is_empty() {
        log::info!("seeded {} documents ({} skipped)", report.inserted, report.skipped);
    }
    let api = Api::new(Arc::new(store), cfg)?;
    let mode = if cli.compact { OutputMode::Compact } else { OutputMode::Pretty };
    Ok(prog_cli::run(&api, cli.command.into(), mode).await?)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
