//! Cooperative cancellation for the fetch and analysis loops.

use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, warn};

/// Read side of the interrupt flag, checked at the top of each loop iteration.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Returns a trigger and the flag it controls.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A flag that is never raised.
    #[cfg(test)]
    pub fn never() -> Self {
        Self::channel().1
    }

    /// Raise the flag on the first Ctrl-C and exit the process on the second.
    pub fn on_ctrl_c() -> Self {
        let (tx, shutdown) = Self::channel();

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("Ctrl+C received; stopping after the current request (press again to quit)");
            let _ = tx.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                error!("Second Ctrl+C received; exiting immediately");
                std::process::exit(1);
            }
        });

        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the flag is raised. Never resolves if the trigger is
    /// dropped without raising it.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|raised| *raised).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration`, waking early if the flag is raised.
    ///
    /// Returns `false` when the sleep was cut short.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.triggered() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_is_not_triggered() {
        assert!(!Shutdown::never().is_triggered());
    }

    #[test]
    fn test_trigger() {
        let (tx, shutdown) = Shutdown::channel();
        let copy = shutdown.clone();
        assert!(!shutdown.is_triggered());

        tx.send(true).unwrap();
        assert!(shutdown.is_triggered());
        assert!(copy.is_triggered());
    }

    #[tokio::test]
    async fn test_sleep_completes_when_not_triggered() {
        assert!(Shutdown::never().sleep(Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_sleep_wakes_on_trigger() {
        let (tx, shutdown) = Shutdown::channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
        });

        let slept = tokio::time::timeout(
            Duration::from_secs(5),
            shutdown.sleep(Duration::from_secs(60)),
        )
        .await
        .unwrap();
        assert!(!slept);
    }

    #[tokio::test]
    async fn test_sleep_returns_at_once_when_already_triggered() {
        let (tx, shutdown) = Shutdown::channel();
        tx.send(true).unwrap();

        let slept = tokio::time::timeout(
            Duration::from_secs(5),
            shutdown.sleep(Duration::from_secs(60)),
        )
        .await
        .unwrap();
        assert!(!slept);
    }
}
