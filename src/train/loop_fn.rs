use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{NnError, Result};
use crate::network::backprop::BackPropagation;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::{train_epoch, Sample};

/// Trains `network` for `config.epochs` epochs and returns the mean training
/// loss of the **last completed epoch** (`0.0` when no epoch ran).
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
///
/// # Errors
/// `InvalidConfig` if `samples` is empty; any shape error raised by a sample
/// aborts the run.
pub fn train_loop(
    network: &mut BackPropagation,
    samples: &[Sample],
    config: &TrainConfig,
) -> Result<f64> {
    if samples.is_empty() {
        return Err(NnError::InvalidConfig("no training samples".into()));
    }

    info!(
        epochs = config.epochs,
        samples = samples.len(),
        learn_rate = network.learn_rate(),
        parallel = config.parallel,
        "starting training"
    );

    let mut last_train_loss = 0.0;
    let mut completed = 0;

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            warn!(epoch, "stop flag set, ending training");
            break;
        }

        let t_start = Instant::now();
        let train_loss = train_epoch(network, samples, config.parallel)?;
        let elapsed_ms = t_start.elapsed().as_millis() as u64;
        last_train_loss = train_loss;
        completed = epoch;

        debug!(epoch, train_loss, elapsed_ms, "epoch complete");

        if let Some(ref tx) = config.progress_tx {
            let stats = EpochStats {
                epoch,
                total_epochs: config.epochs,
                train_loss,
                elapsed_ms,
            };
            if tx.send(stats).is_err() {
                warn!(epoch, "progress receiver dropped, ending training");
                break;
            }
        }
    }

    info!(completed, train_loss = last_train_loss, "training finished");
    Ok(last_train_loss)
}

fn stop_requested(config: &TrainConfig) -> bool {
    config.stop_flag
        .as_ref()
        .map_or(false, |flag| flag.load(Ordering::Relaxed))
}
