//! Stage notifications for long-running embed/extract calls.

use std::fmt;
use tracing::debug;

/// Pipeline stage reported to an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compressing,
    Encrypting,
    Embedding,
    Extracting,
    Decrypting,
    Decompressing,
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Compressing => "Compressing data...",
            Stage::Encrypting => "Encrypting data...",
            Stage::Embedding => "Embedding data...",
            Stage::Extracting => "Extracting data...",
            Stage::Decrypting => "Decrypting data...",
            Stage::Decompressing => "Decompressing data...",
            Stage::Writing => "Writing data...",
        };
        f.write_str(label)
    }
}

/// Receives stage notifications. Borrowed for one call, never stored.
pub trait ProgressObserver {
    fn on_stage(&self, stage: Stage);
}

impl<F: Fn(Stage)> ProgressObserver for F {
    fn on_stage(&self, stage: Stage) {
        self(stage)
    }
}

pub(crate) fn notify(observer: Option<&dyn ProgressObserver>, stage: Stage) {
    debug!(?stage, "stage");
    if let Some(observer) = observer {
        observer.on_stage(stage);
    }
}
