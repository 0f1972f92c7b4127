//! Owns the venue socket and message queue per instrument, performs the
//! sequence check, coordinates recovery, and fans Updates out to registered
//! consumers (spec §4.4). Grounded in
//! `trading-infra/gateway/src/application/market_data_handler.rs`'s
//! state-plus-event-loop-plus-snapshot-loop shape; the sync/out-of-sync
//! bookkeeping there is replaced with this spec's explicit
//! `Init -> Streaming -> Recovering` state machine and `InstrumentHandler`/
//! `RecoveryHandler` delegation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use convex_core::{Instrument, Update};

use crate::application::config::{GatewayConfig, MarketDataConfig};
use crate::application::instrument_handler::InstrumentHandler;
use crate::application::recovery_handler::{self, RecoveryHandler};
use crate::domain::events::VenueEvent;
use crate::domain::traits::SnapshotFetcher;
use crate::infrastructure::ws_client::{WsClient, WsEvent};

/// Invoked by the gateway's processor loop each time a fresh [`Update`] is
/// available for an instrument. Implementations (e.g. [`super::subscriber::Subscriber`])
/// must return promptly and must not block (spec §6 consumer callback
/// contract).
pub trait UpdateCallback: Send + Sync {
    fn on_update(&self, update: &Update);
}

/// Per-instrument runtime state: the handler and recovery handler the spec
/// names, plus the bookkeeping the gateway needs to run its sequence-check
/// state machine (spec §4.4's `Init -> Streaming -> Recovering`).
struct InstrumentRuntime {
    instrument: Instrument,
    handler: Mutex<InstrumentHandler>,
    recovery: Mutex<RecoveryHandler>,
    /// Weak so a dropped [`super::subscriber::Subscriber`] deregisters
    /// itself for free — `publish` prunes dead entries as it iterates,
    /// which is this crate's RAII replacement for the original's
    /// `gateway.unregister` call from `Subscriber.__del__`.
    callbacks: Mutex<Vec<Weak<dyn UpdateCallback>>>,
    initialized: AtomicBool,
    recovering: AtomicBool,
    last_in_seq: AtomicU64,
    recovery_task: Mutex<Option<JoinHandle<()>>>,
}

impl InstrumentRuntime {
    fn new(instrument: Instrument, fetcher: Arc<dyn SnapshotFetcher>, buffer_bound: usize) -> Self {
        InstrumentRuntime {
            handler: Mutex::new(InstrumentHandler::new(instrument.clone())),
            recovery: Mutex::new(RecoveryHandler::with_bound(fetcher, buffer_bound)),
            callbacks: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            recovering: AtomicBool::new(false),
            last_in_seq: AtomicU64::new(0),
            recovery_task: Mutex::new(None),
            instrument,
        }
    }
}

/// Owns one venue's socket(s), one [`InstrumentRuntime`] per subscribed
/// instrument, and the set of background tasks that keep them fed. One
/// `FeedGateway` serves one venue; it may serve any number of instruments
/// (spec §4.4: "current code specializes to one, but the contract is N").
pub struct FeedGateway {
    config: GatewayConfig,
    md_config: MarketDataConfig,
    fetcher: Arc<dyn SnapshotFetcher>,
    instruments: Mutex<HashMap<Instrument, Arc<InstrumentRuntime>>>,
    shutdown: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl FeedGateway {
    pub fn new(
        config: GatewayConfig,
        md_config: MarketDataConfig,
        fetcher: Arc<dyn SnapshotFetcher>,
    ) -> Arc<Self> {
        Arc::new(FeedGateway {
            config,
            md_config,
            fetcher,
            instruments: Mutex::new(HashMap::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Registers interest in `instrument`, allocating its runtime state if
    /// this is the first call for it. Idempotent.
    pub fn subscribe(&self, instrument: Instrument) {
        let mut instruments = self.instruments.lock();
        instruments.entry(instrument.clone()).or_insert_with(|| {
            Arc::new(InstrumentRuntime::new(
                instrument,
                Arc::clone(&self.fetcher),
                self.md_config.recovery_buffer_bound,
            ))
        });
    }

    /// Adds a consumer callback for `instrument`, implicitly subscribing if
    /// this is the first registration for it (spec §4.4).
    pub fn register(&self, instrument: Instrument, callback: Arc<dyn UpdateCallback>) {
        self.subscribe(instrument.clone());
        let instruments = self.instruments.lock();
        if let Some(runtime) = instruments.get(&instrument) {
            runtime.callbacks.lock().push(Arc::downgrade(&callback));
        }
    }

    /// Starts the reader + processor task pair for every currently
    /// subscribed instrument. Safe to call once; instruments subscribed
    /// afterwards are not picked up by a prior `launch()` call.
    pub fn launch(self: &Arc<Self>) {
        let runtimes: Vec<_> = self.instruments.lock().values().cloned().collect();
        let mut tasks = self.tasks.lock();
        for runtime in runtimes {
            let gateway = Arc::clone(self);
            tasks.push(tokio::spawn(async move {
                gateway.run_instrument(runtime).await;
            }));
        }
    }

    /// Signals every task to stop at its next suspension point and cancels
    /// any in-flight recovery fetch. Socket close happens as each reader
    /// task unwinds.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.shutdown_notify.notify_waiters();
        for runtime in self.instruments.lock().values() {
            if let Some(task) = runtime.recovery_task.lock().take() {
                task.abort();
            }
        }
    }

    /// Aborts every instrument task outright, for a second shutdown signal
    /// that should not wait for a graceful unwind (spec §4.6).
    pub fn force_cancel(&self) {
        for handle in self.tasks.lock().iter() {
            handle.abort();
        }
    }

    /// Awaits every launched instrument task. Consumes the task list, so
    /// this may only be driven to completion once per `launch()` call.
    pub async fn join(&self) {
        let handles = std::mem::take(&mut *self.tasks.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn run_instrument(self: Arc<Self>, runtime: Arc<InstrumentRuntime>) {
        let ws_client = WsClient::new(self.config.ws_url.clone());
        let (handle, mut events) = match ws_client.connect(&runtime.instrument.product_id()).await
        {
            Ok(pair) => pair,
            Err(err) => {
                tracing::error!(
                    instrument = %runtime.instrument,
                    error = %err,
                    "failed to connect venue socket"
                );
                return;
            }
        };
        tracing::info!(instrument = %runtime.instrument, "venue socket connected");

        let (queue_tx, mut queue_rx) = tokio::sync::mpsc::unbounded_channel::<VenueEvent>();

        let reader = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    WsEvent::Message(msg) => {
                        if queue_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    WsEvent::ParseError(err) => {
                        tracing::warn!(error = %err, "dropping malformed venue message");
                    }
                    WsEvent::Disconnected => {
                        tracing::warn!("venue socket disconnected");
                        break;
                    }
                }
            }
        });

        loop {
            let first = tokio::select! {
                _ = self.shutdown_notify.notified() => None,
                received = queue_rx.recv() => received,
            };
            let Some(first) = first else {
                break;
            };
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            self.handle_message(&runtime, first);
            while let Ok(next) = queue_rx.try_recv() {
                self.handle_message(&runtime, next);
            }

            let update = runtime.handler.lock().make_update();
            if let Some(update) = update {
                self.publish(&runtime, update);
            }
        }

        reader.abort();
        handle.close().await;
    }

    /// Sequence-check algorithm (spec §4.4): duplicates are dropped, the
    /// next-in-order message is applied directly, and anything else opens
    /// a gap. The very first message for an instrument is accepted
    /// unconditionally and sets the baseline (`Init -> Streaming`).
    fn handle_message(self: &Arc<Self>, runtime: &Arc<InstrumentRuntime>, msg: VenueEvent) {
        if runtime.recovering.load(Ordering::Acquire) {
            runtime.recovery.lock().buffer(msg);
            if runtime.recovery_task.lock().is_none() {
                // A previous fetch attempt failed; the next live message
                // naturally retries it (spec §7.4).
                self.start_recovery(runtime);
            }
            return;
        }

        let received = msg.sequence();

        if !runtime.initialized.swap(true, Ordering::AcqRel) {
            runtime.last_in_seq.store(received, Ordering::Release);
            runtime.handler.lock().handle_event(msg);
            return;
        }

        let last = runtime.last_in_seq.load(Ordering::Acquire);
        if received <= last {
            return;
        }

        let expected = last + 1;
        runtime.last_in_seq.store(received, Ordering::Release);

        if received == expected {
            runtime.handler.lock().handle_event(msg);
        } else {
            self.begin_gap(runtime, msg);
        }
    }

    fn begin_gap(self: &Arc<Self>, runtime: &Arc<InstrumentRuntime>, triggering_msg: VenueEvent) {
        let was_recovering = runtime.recovering.swap(true, Ordering::AcqRel);
        if was_recovering {
            if let Some(task) = runtime.recovery_task.lock().take() {
                task.abort();
            }
        }
        {
            let mut recovery = runtime.recovery.lock();
            recovery.drop_buffered();
            recovery.buffer(triggering_msg);
        }

        tracing::warn!(instrument = %runtime.instrument, "sequence gap detected, entering recovery");
        let update = runtime.handler.lock().make_gapped_update();
        self.publish(runtime, update);

        self.start_recovery(runtime);
    }

    fn start_recovery(self: &Arc<Self>, runtime: &Arc<InstrumentRuntime>) {
        let gateway = Arc::clone(self);
        let runtime_for_task = Arc::clone(runtime);
        let task = tokio::spawn(async move {
            gateway.run_recovery(runtime_for_task).await;
        });
        *runtime.recovery_task.lock() = Some(task);
    }

    async fn run_recovery(self: Arc<Self>, runtime: Arc<InstrumentRuntime>) {
        let product_id = runtime.instrument.product_id();
        match self.fetcher.fetch_snapshot(&product_id).await {
            Ok(raw) => {
                let sequence = raw.sequence;
                let book = recovery_handler::build_book(runtime.instrument.clone(), raw);

                runtime.handler.lock().recover(sequence, book);
                let resynced = {
                    let mut recovery = runtime.recovery.lock();
                    let mut handler = runtime.handler.lock();
                    recovery.replay(sequence, |event| handler.handle_event(event));
                    handler.sequence()
                };

                // Messages buffered during recovery never touch `last_in_seq`
                // (they take the early-return branch in `handle_message`), so
                // it must be resynced here to the post-replay baseline.
                // Otherwise the next live message looks like a fresh gap and
                // the instrument never leaves `Recovering` (spec §4.4).
                runtime.last_in_seq.store(resynced, Ordering::Release);
                runtime.recovering.store(false, Ordering::Release);
                *runtime.recovery_task.lock() = None;
                tracing::info!(instrument = %runtime.instrument, sequence, "recovery complete");

                let update = runtime.handler.lock().make_update();
                if let Some(update) = update {
                    self.publish(&runtime, update);
                }
            }
            Err(err) => {
                tracing::error!(
                    instrument = %runtime.instrument,
                    error = %err,
                    "recovery snapshot fetch failed; status remains Gapped"
                );
                *runtime.recovery_task.lock() = None;
            }
        }
    }

    fn publish(&self, runtime: &InstrumentRuntime, update: Update) {
        let mut callbacks = runtime.callbacks.lock();
        callbacks.retain(|weak| {
            let Some(callback) = weak.upgrade() else {
                return false;
            };
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback.on_update(&update)
            }));
            if result.is_err() {
                tracing::error!(instrument = %runtime.instrument, "consumer callback panicked");
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::traits::{FetchError, RawSnapshot};

    fn instrument() -> Instrument {
        Instrument::new("BTC", "USD", "GDAX")
    }

    struct EmptyFetcher;

    #[async_trait]
    impl SnapshotFetcher for EmptyFetcher {
        async fn fetch_snapshot(&self, _product_id: &str) -> Result<RawSnapshot, FetchError> {
            Ok(RawSnapshot {
                sequence: 20,
                bids: vec![],
                asks: vec![],
            })
        }
    }

    fn open(seq: u64, order_id: &str, price: &str, size: &str) -> VenueEvent {
        VenueEvent::Open {
            product_id: "BTC-USD".into(),
            sequence: seq,
            time: "2026-01-01T00:00:00Z".into(),
            order_id: order_id.into(),
            side: "buy".into(),
            price: price.into(),
            remaining_size: size.into(),
        }
    }

    fn gateway() -> (Arc<FeedGateway>, Arc<InstrumentRuntime>) {
        let gateway = FeedGateway::new(
            GatewayConfig {
                venue_id: "GDAX".into(),
                ws_url: "wss://unused".into(),
                rest_base_url: "https://unused".into(),
            },
            MarketDataConfig::default(),
            Arc::new(EmptyFetcher),
        );
        gateway.subscribe(instrument());
        let runtime = gateway
            .instruments
            .lock()
            .get(&instrument())
            .cloned()
            .unwrap();
        (gateway, runtime)
    }

    /// First message for a fresh instrument is accepted unconditionally
    /// and sets the sequence baseline (Init -> Streaming).
    #[test]
    fn first_message_initializes_without_gap() {
        let (gateway, runtime) = gateway();
        gateway.handle_message(&runtime, open(10, "A", "100.00", "1.0"));
        assert_eq!(runtime.last_in_seq.load(Ordering::Acquire), 10);
        assert!(!runtime.recovering.load(Ordering::Acquire));
    }

    /// S5: duplicate suppression.
    #[test]
    fn duplicate_sequence_is_dropped() {
        let (gateway, runtime) = gateway();
        gateway.handle_message(&runtime, open(10, "A", "100.00", "1.0"));
        gateway.handle_message(&runtime, open(10, "A", "200.00", "9.0"));
        let update = runtime.handler.lock().make_update().unwrap();
        assert_eq!(update.book.bids[0].price.to_string(), "100");
    }

    /// S4: a skipped sequence opens a gap and immediately emits a Gapped
    /// update; the triggering message itself is buffered, not applied.
    #[tokio::test]
    async fn gap_enters_recovering_and_buffers_triggering_message() {
        let (gateway, runtime) = gateway();
        gateway.handle_message(&runtime, open(10, "A", "100.00", "1.0"));
        runtime.handler.lock().make_update();

        gateway.handle_message(&runtime, open(15, "B", "101.00", "1.0"));

        assert!(runtime.recovering.load(Ordering::Acquire));
        assert!(runtime.recovery.lock().has_buffered());
        // The gapped order never reached the book.
        let snap = runtime.handler.lock().make_update();
        assert!(snap.is_none() || !snap.unwrap().book.bids.iter().any(|l| l.order_count > 1));
    }

    /// While recovering, further live messages are buffered rather than
    /// applied directly.
    #[tokio::test]
    async fn messages_during_recovery_are_buffered_not_applied() {
        let (gateway, runtime) = gateway();
        gateway.handle_message(&runtime, open(10, "A", "100.00", "1.0"));
        runtime.handler.lock().make_update();
        gateway.handle_message(&runtime, open(15, "B", "101.00", "1.0"));
        gateway.handle_message(&runtime, open(16, "C", "102.00", "1.0"));

        let before = runtime.handler.lock().sequence();
        assert_eq!(before, 10);
    }

    #[test]
    fn register_before_subscribe_still_allocates_runtime() {
        let gateway = FeedGateway::new(
            GatewayConfig {
                venue_id: "GDAX".into(),
                ws_url: "wss://unused".into(),
                rest_base_url: "https://unused".into(),
            },
            MarketDataConfig::default(),
            Arc::new(EmptyFetcher),
        );

        struct NoopCallback;
        impl UpdateCallback for NoopCallback {
            fn on_update(&self, _update: &Update) {}
        }

        gateway.register(instrument(), Arc::new(NoopCallback));
        assert!(gateway.instruments.lock().contains_key(&instrument()));
    }

    #[test]
    fn dropped_subscriber_is_pruned_from_callbacks() {
        let (gateway, runtime) = gateway();

        struct NoopCallback;
        impl UpdateCallback for NoopCallback {
            fn on_update(&self, _update: &Update) {}
        }

        let callback = Arc::new(NoopCallback);
        runtime.callbacks.lock().push(Arc::downgrade(
            &(Arc::clone(&callback) as Arc<dyn UpdateCallback>),
        ));
        drop(callback);

        gateway.handle_message(&runtime, open(10, "A", "100.00", "1.0"));
        let update = runtime.handler.lock().make_update().unwrap();
        gateway.publish(&runtime, update);

        assert!(runtime.callbacks.lock().is_empty());
    }
}
