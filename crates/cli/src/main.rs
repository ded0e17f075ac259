use clap::{Parser, Subcommand};
use conduit::config::{self, BuiltinRoutes};
use conduit::context::RouteContext;
use conduit::demo::ConversationRoutes;
use conduit::route::RouteDefinitions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conduit")]
#[command(about = "Conduit CLI: timer routes through LLM agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args)]
struct RouteArgs {
    /// Config file path (default: CONDUIT_CONFIG_PATH or ~/.conduit/config.json)
    #[arg(long, short, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use the built-in conversation routes without a memory id (overrides routes.builtin)
    #[arg(long)]
    stateless: bool,

    /// Extra route file (YAML, or JSON by extension); may be repeated
    #[arg(long = "routes", value_name = "FILE")]
    routes: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory with a default config and a sample route file.
    Init {
        /// Config file path (default: CONDUIT_CONFIG_PATH or ~/.conduit/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Start the routes and run until every timer is done, the duration limit is hit, or Ctrl+C.
    Run {
        #[command(flatten)]
        routes: RouteArgs,

        /// Stop after this many seconds (overrides main.durationMaxSeconds)
        #[arg(long, value_name = "SECS")]
        duration: Option<u64>,

        /// Keep running after all finite timers finished (until Ctrl+C or --duration)
        #[arg(long)]
        keep_running: bool,
    },

    /// List the routes that `run` would start.
    Routes {
        #[command(flatten)]
        routes: RouteArgs,

        /// Print the routes as a YAML route file
        #[arg(long)]
        yaml: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("conduit {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Run {
            routes,
            duration,
            keep_running,
        }) => {
            if let Err(e) = run_routes(routes, duration, keep_running).await {
                log::error!("run failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Routes { routes, yaml }) => {
            if let Err(e) = list_routes(routes, yaml) {
                log::error!("routes failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let dir = conduit::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Load config and build a context holding the built-in routes plus any route files.
fn build_context(
    args: RouteArgs,
    adjust: impl FnOnce(&mut config::Config),
) -> anyhow::Result<RouteContext> {
    let (mut config, path) = config::load_config(args.config)?;
    if args.stateless {
        config.routes.builtin = BuiltinRoutes::Stateless;
    }
    adjust(&mut config);

    let mut files = config::resolve_route_files(&config, &path);
    files.extend(args.routes);
    let builtin = config.routes.builtin;

    let mut context = RouteContext::new(config);
    match builtin {
        BuiltinRoutes::Memory => context.add_routes(&ConversationRoutes::with_memory())?,
        BuiltinRoutes::Stateless => context.add_routes(&ConversationRoutes::stateless())?,
        BuiltinRoutes::None => {}
    }
    for file in &files {
        context.add_route_definitions(conduit::dsl::load_routes_file(file)?)?;
    }
    Ok(context)
}

async fn run_routes(
    args: RouteArgs,
    duration: Option<u64>,
    keep_running: bool,
) -> anyhow::Result<()> {
    let mut context = build_context(args, |config| {
        if duration.is_some() {
            config.main.duration_max_seconds = duration;
        }
        config.main.keep_running |= keep_running;
    })?;
    if context.definitions().is_empty() {
        anyhow::bail!("no routes configured (routes.builtin is none and no route files given)");
    }

    context.run().await?;

    for id in context.route_ids() {
        if let Some(stats) = context.route_stats(&id) {
            log::info!(
                "route {}: {} completed, {} failed",
                id,
                stats.completed,
                stats.failed
            );
        }
    }
    Ok(())
}

fn list_routes(args: RouteArgs, yaml: bool) -> anyhow::Result<()> {
    let context = build_context(args, |_| {})?;
    if yaml {
        let mut routes = RouteDefinitions::new();
        for def in context.definitions() {
            routes.push(def.clone());
        }
        print!("{}", conduit::dsl::to_yaml(&routes)?);
    } else {
        for def in context.definitions() {
            println!("{}", def.describe());
        }
    }
    Ok(())
}
