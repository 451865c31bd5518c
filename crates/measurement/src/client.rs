//! Tracker implementation.

use crate::config::{Config, DispatchMode, TrackerBuilder};
use crate::dispatcher::{log_outcomes, Dispatcher, Outcome};
use crate::encode::encode_hit;
use crate::hit::{Batch, Hit};
use crate::queue::HitQueue;
use crate::scheduler::Scheduler;
use crate::transport::HttpTransport;
use crate::types::{CustomDimensions, DefaultContext, Identifier, QueryItems};
use crate::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Measurement client.
///
/// Hits accepted by [`track`](Tracker::track) are queued; the first hit of an
/// empty queue arms a timer, and when it fires everything queued so far goes
/// out in one POST. Delivery is best effort: one attempt per batch, and the
/// result is only reported to the log sink.
///
/// # Example
///
/// ```rust,no_run
/// use measurement::{Identifier, Params, Tracker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), measurement::Error> {
///     let tracker = Tracker::builder("UA-XXXX-Y", Identifier::anonymous())
///         .log(|line| eprintln!("{line}"))
///         .build()?;
///
///     tracker.track(&Params::new().set("t", "screenview").set("cd", "Home"))?;
///     tracker.track(&Params::new().set("t", "event").set("ec", "ui").set("ea", "tap"))?;
///
///     tracker.shutdown().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Tracker {
    config: Config,
    queue: Arc<HitQueue>,
    scheduler: Scheduler,
    dispatcher: Arc<Dispatcher>,
    is_shutdown: AtomicBool,
}

impl Tracker {
    /// Create a new builder with the given tracking id and user.
    pub fn builder(tracking_id: impl Into<String>, identifier: Identifier) -> TrackerBuilder {
        TrackerBuilder::new(tracking_id, identifier)
    }

    fn from_parts(
        config: Config,
        runtime: Handle,
        dispatcher: Arc<Dispatcher>,
        queue: Arc<HitQueue>,
    ) -> Self {
        let scheduler = Scheduler::new(runtime, config.flush_delay());
        Self {
            config,
            queue,
            scheduler,
            dispatcher,
            is_shutdown: AtomicBool::new(false),
        }
    }

    /// Get the tracker configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the parameters sent with every hit.
    pub fn context(&self) -> &DefaultContext {
        self.config.context()
    }

    /// Get the number of queued hits.
    pub fn pending_hit_count(&self) -> usize {
        self.queue.len()
    }

    /// Track an event.
    ///
    /// Never blocks and never waits on the network. A payload that cannot be
    /// encoded is logged and dropped; the only error is [`Error::Shutdown`].
    pub fn track(&self, payload: &dyn QueryItems) -> Result<(), Error> {
        self.track_with(payload, None)
    }

    /// Track an event with a custom dimension and metric.
    pub fn track_with(
        &self,
        payload: &dyn QueryItems,
        custom: Option<&CustomDimensions>,
    ) -> Result<(), Error> {
        self.ensure_not_shutdown()?;

        match encode_hit(self.config.context(), payload, custom) {
            Ok(hit) => self.enqueue(hit),
            Err(e) => {
                warn!(error = %e, "dropping hit");
                Ok(())
            }
        }
    }

    /// Queue an already encoded hit, from [`encode_hit`](crate::encode_hit)
    /// or [`Hit::from_encoded`].
    pub fn enqueue(&self, hit: Hit) -> Result<(), Error> {
        self.ensure_not_shutdown()?;

        match self.config.mode() {
            DispatchMode::Batch => {
                if self.queue.append(hit) {
                    let dispatcher = self.dispatcher.clone();
                    self.scheduler.arm(async move { dispatcher.flush().await });
                }
            }
            DispatchMode::Immediate => {
                let dispatcher = self.dispatcher.clone();
                self.scheduler.spawn(async move {
                    dispatcher.send(Batch::single(hit)).await;
                });
            }
        }

        Ok(())
    }

    /// Shutdown the tracker.
    ///
    /// Sends whatever is still queued and waits for that one attempt. Returns
    /// its outcome, or `None` if nothing was queued or the tracker was already
    /// shut down. Sends started in immediate mode are not awaited.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Option<Outcome> {
        if self.is_shutdown.swap(true, Ordering::SeqCst) {
            return None;
        }

        info!(pending = self.queue.len(), "shutting down tracker");

        // A timer that is still pending will find the queue empty.
        let batch = Batch::from_hits(self.queue.drain())?;
        Some(self.dispatcher.send(batch).await)
    }

    fn ensure_not_shutdown(&self) -> Result<(), Error> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Err(Error::Shutdown);
        }
        Ok(())
    }
}

impl TrackerBuilder {
    /// Build the tracker.
    ///
    /// Needs a tokio runtime: the one passed to
    /// [`runtime`](TrackerBuilder::runtime), or else the current one.
    pub fn build(mut self) -> Result<Tracker, Error> {
        let config = self.build_config()?;
        let runtime = match self.runtime.take() {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| {
                Error::Config("no tokio runtime; call from within one or set runtime()".into())
            })?,
        };

        let queue = Arc::new(HitQueue::new());
        let transport = Arc::new(HttpTransport::new(&config)?);
        let (outcomes, receiver) = mpsc::unbounded_channel();
        runtime.spawn(log_outcomes(receiver, self.log.take()));

        let dispatcher = Arc::new(Dispatcher::new(queue.clone(), transport, outcomes));

        debug!(
            endpoint = config.endpoint(),
            mode = ?config.mode(),
            "tracker ready"
        );

        Ok(Tracker::from_parts(config, runtime, dispatcher, queue))
    }
}
