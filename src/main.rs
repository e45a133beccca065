use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gaokao_advisor::auth::{CreateUserError, UserStore};
use gaokao_advisor::config::{self, Config};
use gaokao_advisor::output;
use gaokao_advisor::ranking::{
    DistributionSource, FileSource, HttpSource, ScoreRankConverter, TableKey,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Args, Debug, Clone)]
struct TableArgs {
    /// Province code (defaults to the configured default_province)
    #[arg(long)]
    province: Option<String>,

    /// Subject track: physics or history (defaults to default_subject)
    #[arg(long)]
    subject: Option<String>,

    /// Fetch tables from a running server instead of the data directory
    #[arg(long, value_name = "URL")]
    remote: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default if no subcommand)
    Serve {
        /// Port to listen on, overriding config and PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Convert an exam score to a province rank
    ToRank {
        score: f64,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Convert a province rank to an exam score
    ToScore {
        rank: u64,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Print distribution rows between two scores
    Range {
        min: f64,
        max: f64,
        #[command(flatten)]
        table: TableArgs,
    },
    /// List the data files in the data directory
    Datasets,
    /// Create a sign-in account (password is prompted)
    CreateUser {
        #[arg(long)]
        username: String,
        /// Display name (defaults to the username)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: String,
    },
}

#[derive(Parser, Debug)]
#[command(name = "gaokao-advisor")]
#[command(about = "College-admission advisory service and score/rank tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/gaokao-advisor/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

enum Lookup {
    Rank(f64),
    Score(u64),
    Range(f64, f64),
}

async fn run_lookup<S: DistributionSource>(source: S, key: TableKey, lookup: Lookup) {
    let converter = ScoreRankConverter::new(source);
    let use_colors = output::should_use_colors();

    let text = match lookup {
        Lookup::Rank(score) => {
            let rank = converter
                .score_to_rank_detailed(score, &key.province, &key.subject)
                .await;
            output::format_rank_result(score, &key, &rank, use_colors)
        }
        Lookup::Score(rank) => {
            let score = converter
                .rank_to_score_detailed(rank, &key.province, &key.subject)
                .await;
            output::format_score_result(rank, &key, &score, use_colors)
        }
        Lookup::Range(min, max) => {
            let rows = converter
                .score_range(min, max, &key.province, &key.subject)
                .await;
            output::format_range_table(&rows, use_colors)
        }
    };
    println!("{}", text);
}

async fn lookup_command(config: &Config, table: TableArgs, lookup: Lookup) {
    let key = TableKey::new(
        table
            .province
            .unwrap_or_else(|| config.default_province.clone()),
        table
            .subject
            .unwrap_or_else(|| config.default_subject.clone()),
    );

    match table.remote {
        Some(url) => run_lookup(HttpSource::new(&url), key, lookup).await,
        None => run_lookup(FileSource::new(config.data_dir.clone()), key, lookup).await,
    }
}

async fn create_user_command(
    config: &Config,
    username: String,
    name: Option<String>,
    email: String,
) -> i32 {
    let path = config::users_path(config);
    let store = match UserStore::open(&path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("User store error: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    let password = match read_new_password() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{:#}", e);
            return EXIT_AUTH;
        }
    };

    let name = name.unwrap_or_else(|| username.clone());
    match store.create_user(&name, &username, &email, &password).await {
        Ok(user) => {
            println!("Created user in {}", store.path().display());
            println!("{}", output::format_user(&user, output::should_use_colors()));
            EXIT_SUCCESS
        }
        Err(CreateUserError::Other(e)) => {
            eprintln!("Failed to create user: {:#}", e);
            EXIT_CONFIG
        }
        Err(e) => {
            eprintln!("Failed to create user: {}", e);
            EXIT_AUTH
        }
    }
}

fn read_new_password() -> anyhow::Result<String> {
    use anyhow::Context;

    let password =
        rpassword::prompt_password("Password: ").context("Failed to read password from stdin")?;
    let confirm =
        rpassword::prompt_password("Confirm password: ").context("Failed to read password from stdin")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        std::process::exit(EXIT_CONFIG);
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let command = cli.command.unwrap_or(Commands::Serve { port: None });

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let mut config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Commands::Serve { port: Some(port) } = command {
        config.port = port;
    }

    // Validate config at startup
    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let code = match command {
        Commands::Serve { .. } => match gaokao_advisor::server::start_server(config).await {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                eprintln!("Server error: {:#}", e);
                EXIT_NETWORK
            }
        },
        Commands::ToRank { score, table } => {
            lookup_command(&config, table, Lookup::Rank(score)).await;
            EXIT_SUCCESS
        }
        Commands::ToScore { rank, table } => {
            lookup_command(&config, table, Lookup::Score(rank)).await;
            EXIT_SUCCESS
        }
        Commands::Range { min, max, table } => {
            lookup_command(&config, table, Lookup::Range(min, max)).await;
            EXIT_SUCCESS
        }
        Commands::Datasets => {
            let keys = gaokao_advisor::dataset::available_datasets(&config.data_dir);
            println!(
                "{}",
                output::format_datasets(&keys, output::should_use_colors())
            );
            EXIT_SUCCESS
        }
        Commands::CreateUser {
            username,
            name,
            email,
        } => create_user_command(&config, username, name, email).await,
    };

    std::process::exit(code);
}
