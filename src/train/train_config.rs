use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`: total number of full passes over the training data
/// - `parallel`: use the row-parallel matrix multiply in forward passes
/// - `progress_tx`: optional channel sender; one `EpochStats` is sent per
///   completed epoch.  If the receiver is dropped the loop
///   terminates early.
/// - `stop_flag`: optional atomic flag; when set to `true` from another
///   thread the loop terminates after the current epoch.
pub struct TrainConfig {
    pub epochs: usize,
    pub parallel: bool,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Sequential `TrainConfig` with no progress channel and no stop flag.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            parallel: false,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
