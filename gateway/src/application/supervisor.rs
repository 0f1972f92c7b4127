//! Process-level lifecycle: launches the gateway, waits for an interrupt,
//! and drives a graceful-then-forced shutdown on a double Ctrl-C (spec
//! §4.6). Grounded in
//! `cooprefr-bettersys/rust-backend/src/bin/edge_receiver.rs`'s spawned
//! `tokio::signal::ctrl_c()` listener with an interrupt counter.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::application::feed_gateway::FeedGateway;

/// Owns the process's relationship with one [`FeedGateway`]: starts it,
/// listens for Ctrl-C, and blocks until every instrument task has wound
/// down.
pub struct Supervisor {
    gateway: Arc<FeedGateway>,
}

impl Supervisor {
    pub fn new(gateway: Arc<FeedGateway>) -> Self {
        Supervisor { gateway }
    }

    /// Launches the gateway's instrument tasks, installs the interrupt
    /// handler, and awaits completion. The first Ctrl-C requests a graceful
    /// shutdown (sockets close, tasks unwind); a second forces immediate
    /// cancellation.
    pub async fn run(&self) {
        self.gateway.launch();

        let gateway = Arc::clone(&self.gateway);
        let interrupt_count = Arc::new(AtomicU32::new(0));
        tokio::spawn(async move {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    break;
                }
                let count = interrupt_count.fetch_add(1, Ordering::AcqRel) + 1;
                if count == 1 {
                    tracing::info!("shutdown requested, closing venue connections");
                    gateway.request_shutdown();
                } else {
                    tracing::warn!("second interrupt received, forcing shutdown");
                    gateway.force_cancel();
                    break;
                }
            }
        });

        self.gateway.join().await;
        tracing::info!("gateway shut down");
    }
}
