//! Shutdown Coordination
//!
//! Turns process signals into a broadcast that long-running loops can select
//! on. A first signal requests a graceful stop; a second one exits at once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Exit code used when a second signal forces an immediate exit
pub const FORCED_EXIT_CODE: i32 = 130;

/// Coordinates graceful shutdown across the application
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
    signal_count: Arc<AtomicUsize>,
}

impl ShutdownCoordinator {
    pub fn new() -> (Self, broadcast::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(8);
        let coordinator = Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            signal_count: Arc::new(AtomicUsize::new(0)),
        };
        (coordinator, shutdown_rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Record one received signal; returns true if it was not the first
    fn record_signal(&self) -> bool {
        let previous = self.signal_count.fetch_add(1, Ordering::AcqRel);
        self.trigger_shutdown();
        previous >= 1
    }

    /// Spawn signal listeners on the current tokio runtime
    pub fn install_signal_handlers(self: &Arc<Self>) {
        #[cfg(unix)]
        {
            // Restore default SIGPIPE so piping output into `head` ends quietly
            unsafe {
                libc::signal(libc::SIGPIPE, libc::SIG_DFL);
            }

            use tokio::signal::unix::{signal, SignalKind};
            let kinds = [
                SignalKind::interrupt(),
                SignalKind::terminate(),
                SignalKind::hangup(),
                SignalKind::quit(),
            ];

            for kind in kinds {
                let coordinator = Arc::clone(self);
                tokio::spawn(async move {
                    let Ok(mut stream) = signal(kind) else {
                        log::debug!("Could not register handler for {:?}", kind);
                        return;
                    };
                    while stream.recv().await.is_some() {
                        if coordinator.record_signal() {
                            log::warn!("Second signal received; exiting");
                            std::process::exit(FORCED_EXIT_CODE);
                        }
                        log::info!("Signal received; stopping after the current run");
                    }
                });
            }
        }

        #[cfg(not(unix))]
        {
            let coordinator = Arc::clone(self);
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if coordinator.record_signal() {
                        std::process::exit(FORCED_EXIT_CODE);
                    }
                    log::info!("Ctrl-C received; stopping after the current run");
                }
            });
        }
    }
}
