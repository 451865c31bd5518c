//! Draining the queue, sending batches, and reporting how it went.

use crate::config::LogSink;
use crate::hit::Batch;
use crate::queue::HitQueue;
use crate::transport::HttpTransport;
use crate::Error;
use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Collector answered 200. Carries the body that was sent.
    Delivered { payload: String },
    /// Collector answered with another status.
    Rejected { status: StatusCode },
    /// Request never completed (DNS, connect, timeout, ...).
    Failed { error: String },
}

impl Outcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Delivered { payload } => write!(f, "Sent data:\n{}", payload),
            Outcome::Rejected { status } => write!(f, "Error: {}", status.as_u16()),
            Outcome::Failed { error } => write!(f, "Error: {}", error),
        }
    }
}

/// Sends batches and publishes every [`Outcome`] to the outcome channel.
#[derive(Debug)]
pub struct Dispatcher {
    queue: Arc<HitQueue>,
    transport: Arc<HttpTransport>,
    outcomes: mpsc::UnboundedSender<Outcome>,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<HitQueue>,
        transport: Arc<HttpTransport>,
        outcomes: mpsc::UnboundedSender<Outcome>,
    ) -> Self {
        Self {
            queue,
            transport,
            outcomes,
        }
    }

    /// Timer body: take the whole window and send it.
    pub async fn flush(&self) {
        let hits = self.queue.take_for_flush();
        let Some(batch) = Batch::from_hits(hits) else {
            debug!("flush timer found an empty queue");
            return;
        };

        self.send(batch).await;
    }

    /// Send one batch, exactly once.
    pub async fn send(&self, batch: Batch) -> Outcome {
        let outcome = match self.transport.send(&batch).await {
            Ok(()) => Outcome::Delivered {
                payload: batch.body().to_owned(),
            },
            Err(Error::Status(status)) => Outcome::Rejected { status },
            Err(e) => Outcome::Failed {
                error: error_chain(&e),
            },
        };

        // The consumer is gone only once the runtime is shutting down.
        let _ = self.outcomes.send(outcome.clone());

        outcome
    }
}

/// Render an error with all of its causes, e.g. a timeout under a send error.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // Wrappers often repeat their inner error in their own message.
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Single consumer of delivery outcomes.
pub(crate) async fn log_outcomes(
    mut outcomes: mpsc::UnboundedReceiver<Outcome>,
    sink: Option<LogSink>,
) {
    while let Some(outcome) = outcomes.recv().await {
        match &outcome {
            Outcome::Delivered { payload } => {
                info!(bytes = payload.len(), "batch delivered")
            }
            Outcome::Rejected { status } => {
                warn!(status = %status, "batch rejected, dropping")
            }
            Outcome::Failed { error } => warn!(error = %error, "batch failed, dropping"),
        }

        if let Some(sink) = &sink {
            sink(&outcome.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerBuilder;
    use crate::hit::Hit;
    use crate::types::Identifier;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    type Parts = (Arc<HitQueue>, Dispatcher, mpsc::UnboundedReceiver<Outcome>);

    fn dispatcher(uri: &str) -> Parts {
        dispatcher_with_timeout(uri, Duration::from_secs(20))
    }

    fn dispatcher_with_timeout(uri: &str, timeout: Duration) -> Parts {
        let config = TrackerBuilder::new("UA-1234-1", Identifier::user("usr_1"))
            .endpoint(format!("{}/batch", uri))
            .timeout(timeout)
            .build_config()
            .unwrap();
        let queue = Arc::new(HitQueue::new());
        let transport = Arc::new(HttpTransport::new(&config).unwrap());
        let (tx, rx) = mpsc::unbounded_channel();

        (queue.clone(), Dispatcher::new(queue, transport, tx), rx)
    }

    #[tokio::test]
    async fn test_flush_posts_whole_queue() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/batch"))
            .and(header("cache-control", "no-cache"))
            .and(body_string("t=event&ea=a\nt=event&ea=b\n"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (queue, dispatcher, mut rx) = dispatcher(&mock_server.uri());
        queue.append(Hit::new("t=event&ea=a".into()));
        queue.append(Hit::new("t=event&ea=b".into()));

        dispatcher.flush().await;

        assert!(queue.is_empty());
        assert!(!queue.is_armed());
        assert_eq!(
            rx.recv().await.unwrap(),
            Outcome::Delivered {
                payload: "t=event&ea=a\nt=event&ea=b\n".into()
            }
        );
    }

    #[tokio::test]
    async fn test_flush_on_empty_queue_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let (_queue, dispatcher, mut rx) = dispatcher(&mock_server.uri());

        dispatcher.flush().await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_server_error_is_reported_not_requeued() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (queue, dispatcher, _rx) = dispatcher(&mock_server.uri());
        queue.append(Hit::new("t=event".into()));

        let outcome = dispatcher.send(Batch::from_hits(queue.drain()).unwrap()).await;

        assert_eq!(
            outcome,
            Outcome::Rejected {
                status: StatusCode::INTERNAL_SERVER_ERROR
            }
        );
        assert_eq!(outcome.to_string(), "Error: 500");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        // Nothing listens on the discard port.
        let (_queue, dispatcher, _rx) = dispatcher("http://127.0.0.1:9");

        let outcome = dispatcher.send(Batch::single(Hit::new("t=event".into()))).await;

        assert!(matches!(outcome, Outcome::Failed { .. }));
        assert!(outcome.to_string().starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_timeout_cause_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let (_queue, dispatcher, mut rx) =
            dispatcher_with_timeout(&mock_server.uri(), Duration::from_millis(200));

        let outcome = dispatcher.send(Batch::single(Hit::new("t=event".into()))).await;

        assert!(matches!(outcome, Outcome::Failed { .. }));
        assert!(outcome.to_string().contains("timed out"), "{}", outcome);
        assert_eq!(rx.recv().await.unwrap(), outcome);
    }

    #[test]
    fn test_error_chain_skips_repeated_messages() {
        #[derive(Debug, thiserror::Error)]
        #[error("operation timed out")]
        struct Inner;

        #[derive(Debug, thiserror::Error)]
        #[error("error sending request")]
        struct Middle(#[source] Inner);

        #[derive(Debug, thiserror::Error)]
        #[error("HTTP request failed: {0}")]
        struct Outer(#[source] Middle);

        assert_eq!(
            error_chain(&Outer(Middle(Inner))),
            "HTTP request failed: error sending request: operation timed out"
        );
    }

    #[tokio::test]
    async fn test_log_consumer_forwards_messages() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = lines.clone();
        let sink: LogSink =
            Arc::new(move |line: &str| captured.lock().unwrap().push(line.to_string()));

        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = tokio::spawn(log_outcomes(rx, Some(sink)));

        tx.send(Outcome::Delivered {
            payload: "t=event\n".into(),
        })
        .unwrap();
        tx.send(Outcome::Rejected {
            status: StatusCode::BAD_REQUEST,
        })
        .unwrap();
        drop(tx);
        consumer.await.unwrap();

        assert_eq!(
            *lines.lock().unwrap(),
            vec!["Sent data:\nt=event\n".to_string(), "Error: 400".to_string()]
        );
    }
}
