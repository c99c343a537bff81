use std::path::{Path, PathBuf};

use common::{config::Config, store::ResultStore};
use console::style;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use iobench::{BatchStatus, Invocation, TrialMatrix, run_batch};
use tokio::{fs::read_to_string, signal::ctrl_c};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub async fn load_config(config_file: Option<&Path>) -> Result<Config> {
    match config_file {
        Some(path) => {
            let data = read_to_string(path)
                .await
                .context(format!("Reading config file {}", path.display()))?;
            serde_yml::from_str(&data).context(format!("Parsing config file {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

pub fn print_commands(config: &Config, concurrent: bool) {
    let matrix = TrialMatrix::new(&config.trials.for_run(concurrent));
    let invocation = Invocation::new(&config.settings);
    for spec in matrix.iter() {
        println!(
            "{}: {}",
            spec.test_name(invocation.kind()),
            invocation.display(spec)
        );
    }
    println!("{} trials", matrix.len());
}

/// Runs every trial `trials` times and merges the samples into `outfile`
pub async fn run_benchmark(
    trials: usize,
    outfile: PathBuf,
    concurrent: bool,
    config: &Config,
    no_progress: bool,
) -> Result<()> {
    let mut store = ResultStore::load(&outfile).await?;
    let matrix = TrialMatrix::new(&config.trials.for_run(concurrent));
    let invocation = Invocation::new(&config.settings);
    if matrix.is_empty() {
        warn!("No trials configured");
    }
    debug!("{} trials, {} runs each", matrix.len(), trials);

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let progress = if no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new((matrix.len() * trials) as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=>-"),
        );
        bar
    };

    let mut result = Ok(());
    for spec in matrix.iter() {
        let test_name = spec.test_name(invocation.kind());
        progress.set_message(format!("{test_name} {} x{}", spec.size, spec.threads));
        info!("Running {} with args: {:?}", invocation.kind(), spec.args());

        let batch = match run_batch(trials, spec, &invocation, &cancel, &progress).await {
            Ok(batch) => batch,
            Err(err) => {
                result = Err(err);
                break;
            }
        };
        debug!("{test_name} {}: {} samples", spec.size, batch.samples.len());

        if !batch.samples.is_empty() {
            store.merge_samples(&test_name, &spec.size, spec.threads, batch.samples);
        }
        if let BatchStatus::Aborted(err) = &batch.status {
            progress.println(format!("{} {test_name}: {err}", style("Failed").red()));
        }
        if batch.status == BatchStatus::Cancelled || cancel.is_cancelled() {
            break;
        }
    }
    progress.finish_and_clear();
    interrupt.abort();

    // samples collected before a fatal error are kept
    store.save(&outfile).await?;
    if let Err(err) = &result {
        error!("Stopped early: {err:#}");
    }
    result?;

    println!(
        "{} {}",
        style("Results written to").green(),
        outfile.display()
    );
    Ok(())
}
