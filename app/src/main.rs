use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::store::ResultStore;
use eyre::Result;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod bench;

/// Workspace crates that log, filtered at the same level as the binary
const MODULES: &[&str] = &["common", "iobench", "iobench_basic"];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    /// Extra tracing directives, ie. `iobench=debug`
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured trial and merge the throughput samples into a results file
    Run {
        /// Repetitions of each trial
        trials: usize,
        /// JSON results file, created if missing
        outfile: PathBuf,
        /// Use the configured thread counts instead of a single thread
        #[arg(short, long, default_value_t = false)]
        concurrent: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Draw one throughput chart per test from results files
    Graph {
        /// Later files replace sizes recorded by earlier ones
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Print generated benchmark commands
    Print {
        #[arg(short, long, default_value_t = false)]
        concurrent: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "iobench.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("iobench_harness={log_level}"));
    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }
    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking).with_ansi(false))
        .init();

    if let Err(err) = dispatch(args.command, args.no_progress).await {
        error!("{err:#?}");
        return Err(err);
    }
    Ok(())
}

async fn dispatch(command: Commands, no_progress: bool) -> Result<()> {
    match command {
        Commands::Run {
            trials,
            outfile,
            concurrent,
            config,
        } => {
            let config = bench::load_config(config.as_deref()).await?;
            bench::run_benchmark(trials, outfile, concurrent, &config, no_progress).await
        }
        Commands::Graph { files, out_dir } => graph(&files, out_dir).await,
        Commands::Print { concurrent, config } => {
            let config = bench::load_config(config.as_deref()).await?;
            bench::print_commands(&config, concurrent);
            Ok(())
        }
    }
}

async fn graph(files: &[PathBuf], out_dir: PathBuf) -> Result<()> {
    let store = ResultStore::load_all(files).await?;
    info!("Loaded {} tests from {} files", store.len(), files.len());

    let written = tokio::task::spawn_blocking(move || {
        iobench_basic::render_charts(&store, &out_dir)
    })
    .await??;
    for path in written {
        println!("Generated: {}", path.display());
    }
    Ok(())
}
