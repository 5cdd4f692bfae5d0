//! Background error tracker client

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use logit_core::{AppInfo, Env, SentryConfig, TRACKER_QUEUE_CAPACITY};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, TrackerError};
use crate::event::ErrorEvent;
use crate::sentry::{Dsn, SentryTransport};
use crate::{ErrorTracker, Transport};

/// Counts events that were queued but not yet handled by the worker
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Pending {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            if self.drained.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

/// Defaults stamped onto events that do not carry their own
#[derive(Debug, Clone, Default)]
pub struct TrackerOptions {
    pub environment: Option<String>,
    pub release: Option<String>,
    pub queue_capacity: usize,
}

impl TrackerOptions {
    pub fn new() -> Self {
        Self {
            queue_capacity: TRACKER_QUEUE_CAPACITY,
            ..Default::default()
        }
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Fire-and-forget tracker client.
///
/// `capture` never blocks: events go onto a bounded queue drained by a
/// worker thread that drives the transport. A full queue drops the event.
pub struct TrackerClient {
    sender: Option<Sender<ErrorEvent>>,
    pending: Arc<Pending>,
    dropped: AtomicU64,
    worker: Option<JoinHandle<()>>,
    options: TrackerOptions,
}

impl TrackerClient {
    /// Start a client around `transport`
    pub fn new<T: Transport + 'static>(transport: T, options: TrackerOptions) -> Result<Self> {
        let (sender, receiver) = bounded(options.queue_capacity.max(1));
        let pending = Arc::new(Pending::default());
        let worker = spawn_worker(transport, receiver, Arc::clone(&pending))?;

        Ok(Self {
            sender: Some(sender),
            pending,
            dropped: AtomicU64::new(0),
            worker: Some(worker),
            options,
        })
    }

    /// Start a client posting to the configured Sentry project
    pub fn from_config(config: &SentryConfig, env: Env, app: &AppInfo) -> Result<Self> {
        let dsn = Dsn::parse(&config.dsn())?;
        let options = TrackerOptions::new()
            .environment(env.as_str())
            .release(app.release());
        Self::new(SentryTransport::new(dsn), options)
    }

    /// Number of events dropped because the queue was full or closed
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Flush queued events, then stop the worker
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        let flushed = self.pending.wait(timeout);
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if flushed {
                let _ = worker.join();
            }
        }
        flushed
    }

    fn enqueue(&self, event: ErrorEvent) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(TrackerError::Closed)?;

        self.pending.add();
        match sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                self.pending.done();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Error tracker queue full, dropping event {}", event.event_id);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                self.pending.done();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(TrackerError::Closed)
            }
        }
    }
}

impl ErrorTracker for TrackerClient {
    fn capture(&self, mut event: ErrorEvent) {
        if event.environment.is_none() {
            event.environment = self.options.environment.clone();
        }
        if event.release.is_none() {
            event.release = self.options.release.clone();
        }

        if let Err(e) = self.enqueue(event) {
            warn!("Failed to queue error event: {}", e);
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.pending.wait(timeout)
    }
}

impl Drop for TrackerClient {
    fn drop(&mut self) {
        // closing the queue lets the worker exit once it has drained
        self.sender.take();
    }
}

fn spawn_worker<T: Transport + 'static>(
    transport: T,
    receiver: Receiver<ErrorEvent>,
    pending: Arc<Pending>,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("logit-tracker".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Error tracker runtime failed to start: {}", e);
                    for _ in receiver.iter() {
                        pending.done();
                    }
                    return;
                }
            };

            for event in receiver.iter() {
                match runtime.block_on(transport.send(&event)) {
                    Ok(()) => debug!("Error event {} submitted", event.event_id),
                    Err(e) => warn!("Failed to submit error event {}: {}", event.event_id, e),
                }
                pending.done();
            }
        })?;

    Ok(handle)
}
