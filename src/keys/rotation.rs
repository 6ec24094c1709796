use super::{roll, SharedKeyring};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Owns the background task that rolls the key files.
///
/// Dropping the handle closes the stop channel, which also ends the task.
pub struct RotationHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RotationHandle {
    /// Signals the task and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.task.await {
            tracing::error!("key rotation task failed: {}", err);
        }
    }
}

/// Rolls the key files in `dir` every `every` and swaps the result into
/// `keyring`. The first roll happens one full period after the call.
pub fn spawn(dir: PathBuf, keyring: SharedKeyring, every: Duration) -> anyhow::Result<RotationHandle> {
    anyhow::ensure!(!every.is_zero(), "key rotation period must be non-zero");

    let (stop, mut stopped) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        loop {
            tokio::select! {
                _ = &mut stopped => break,
                _ = ticker.tick() => rotate(&dir, &keyring).await,
            }
        }
        tracing::debug!(dir = %dir.display(), "key rotation stopped");
    });

    Ok(RotationHandle { stop, task })
}

async fn rotate(dir: &Path, keyring: &SharedKeyring) {
    let dir = dir.to_owned();
    match tokio::task::spawn_blocking(move || roll(&dir)).await {
        Ok(Ok(next)) => {
            tracing::info!(pairs = next.len(), "rolled cookie keys");
            keyring.replace(next);
        }
        Ok(Err(err)) => tracing::error!("failed to roll key files, keeping previous keys: {:#}", err),
        Err(err) => tracing::error!("key roll did not complete: {}", err),
    }
}
