use anyhow::{anyhow, Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use taskboard::config::TaskboardConfig;
use taskboard::Taskboard;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

mod request_id;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    // Rebuild DSN with absolute path and normalized slashes; create the file if missing.
    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) => {
            out.push('?');
            out.push_str(q);
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

/// Taskboard Server - users, projects, tasks and webhook events over REST
#[derive(Parser)]
#[command(name = "taskboard-server")]
#[command(about = "Taskboard Server - users, projects, tasks and webhook events over REST")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (port / verbosity)
    config.apply_cli_overrides(&args);

    // Initialize logging
    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Taskboard Server starting");

    // Print config and exit if requested
    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    // Execute command
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Resolve the DSN to connect to; `--mock` swaps in an in-memory database.
fn resolve_dsn(db_config: &DatabaseConfig, base_dir: &Path, args: &CliArgs) -> Result<String> {
    if args.mock {
        return Ok("sqlite::memory:".to_string());
    }
    let raw = db_config.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if !raw.starts_with("sqlite:") {
        return Err(anyhow!("Unsupported database type in DSN '{}'", raw));
    }
    absolutize_sqlite_dsn(raw, base_dir, true)
}

async fn connect(dsn: &str, db_config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(dsn.to_owned());
    // Every connection to "sqlite::memory:" opens its own database.
    let max_conns = if dsn == "sqlite::memory:" {
        1
    } else {
        db_config.max_conns.unwrap_or(10)
    };
    opts.max_connections(max_conns)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if let Some(ms) = db_config.busy_timeout_ms {
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(Duration::from_millis(u64::from(ms))));
    }

    tracing::info!("Connecting to database: {}", dsn);
    Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to {dsn}"))
}

// JSON bodies of this API are small.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Global middleware, outermost first:
/// PropagateRequestId -> SetRequestId -> Trace -> Timeout -> CORS -> body limit.
fn apply_layers(mut router: Router, config: &runtime::ServerConfig) -> Result<Router> {
    router = router.layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    if let Some(origin) = config.cors_allowed_origin.as_deref() {
        let origin = HeaderValue::from_str(origin)
            .with_context(|| format!("invalid cors_allowed_origin '{origin}'"))?;
        router = router.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::exact(origin))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        );
    }

    if config.timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(config.timeout_sec)));
    }

    let x_request_id = request_id::header();
    router = router
        .layer(request_id::create_trace_layer())
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            request_id::MakeReqId,
        ))
        .layer(PropagateRequestIdLayer::new(x_request_id));
    Ok(router)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    // Base dir for resolving relative sqlite paths (already absolute & created)
    let base_dir = PathBuf::from(&config.server.home_dir);
    let db_config = match (config.database.clone(), args.mock) {
        (Some(db), _) => db,
        (None, true) => DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_conns: Some(1),
            busy_timeout_ms: None,
        },
        (None, false) => {
            return Err(anyhow!("database section is required to run the server"));
        }
    };
    let dsn = resolve_dsn(&db_config, &base_dir, &args)?;
    let db = connect(&dsn, &db_config).await?;

    let module_cfg: TaskboardConfig = config.module_config("taskboard")?;
    let taskboard = Taskboard::new();
    taskboard.migrate(&db).await?;
    taskboard.init(db, module_cfg).await?;

    let router = taskboard.register_rest(Router::new())?;
    let router = apply_layers(router, &config.server)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            anyhow!(
                "Invalid bind address '{}:{}': {}",
                config.server.host,
                config.server.port,
                e
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    let shutdown = async {
        if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
            tracing::error!(error = %e, "failed to listen for shutdown signals");
            std::future::pending::<()>().await;
        }
        tracing::info!("HTTP server shutting down gracefully");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow!(e))
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    // AppConfig::load_* already normalized & created home_dir
    if let Some(db_config) = config.database.as_ref() {
        resolve_dsn(db_config, Path::new(&config.server.home_dir), &args)?;
    }
    let module_cfg: TaskboardConfig = config.module_config("taskboard")?;
    url::Url::parse(&module_cfg.webhook.url)
        .with_context(|| format!("invalid webhook url '{}'", module_cfg.webhook.url))?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}
