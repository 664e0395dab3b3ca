use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

const POST_TIMEOUT: Duration = Duration::from_secs(5);
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Outbound "game ended" event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub success: bool,
    pub elapsed_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attempt_count: Option<u32>,
}

impl CompletionEvent {
    pub fn success(elapsed_seconds: u64, attempt_count: Option<u32>) -> Self {
        Self {
            success: true,
            elapsed_seconds,
            attempt_count,
        }
    }
}

/// Fire-and-forget delivery of completion events. Implementations must not block
/// the caller and must not report delivery failures back to it.
pub trait Notifier {
    fn notify(&self, event: &CompletionEvent);
}

/// Used when no realtime channel is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, event: &CompletionEvent) {
        tracing::debug!(?event, "no notification channel configured");
    }
}

/// Posts events as JSON to an HTTP endpoint from a worker thread.
///
/// Dropping the notifier closes the queue and waits up to [`SHUTDOWN_GRACE`]
/// for the worker to finish an in-flight post.
pub struct HttpNotifier {
    tx: Option<Sender<CompletionEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let (tx, rx) = mpsc::channel::<CompletionEvent>();

        let worker = std::thread::spawn(move || {
            let client = match reqwest::blocking::Client::builder()
                .timeout(POST_TIMEOUT)
                .build()
            {
                Ok(client) => client,
                Err(err) => {
                    tracing::warn!(%err, "notification client unavailable");
                    return;
                }
            };

            for event in rx {
                if let Err(err) = post(&client, &url, &event) {
                    tracing::warn!(%err, %url, "completion event not delivered");
                }
            }
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }
}

impl Drop for HttpNotifier {
    fn drop(&mut self) {
        drop(self.tx.take());
        let Some(worker) = self.worker.take() else {
            return;
        };

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while !worker.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        if worker.is_finished() {
            if worker.join().is_err() {
                tracing::error!("notification worker panicked");
            }
        } else {
            tracing::warn!(
                grace_ms = SHUTDOWN_GRACE.as_millis() as u64,
                "exiting with a completion event possibly still in flight"
            );
        }
    }
}

fn post(
    client: &reqwest::blocking::Client,
    url: &str,
    event: &CompletionEvent,
) -> crate::Result<()> {
    client.post(url).json(event).send()?.error_for_status()?;
    tracing::info!(%url, "completion event delivered");
    Ok(())
}

impl Notifier for HttpNotifier {
    fn notify(&self, event: &CompletionEvent) {
        let sent = self
            .tx
            .as_ref()
            .is_some_and(|tx| tx.send(event.clone()).is_ok());
        if !sent {
            tracing::warn!("notification worker has stopped; event dropped");
        }
    }
}

/// Picks the notifier for an optional endpoint.
pub fn from_url(url: Option<&str>) -> Box<dyn Notifier> {
    match url {
        Some(url) if !url.trim().is_empty() => Box::new(HttpNotifier::new(url.trim())),
        _ => Box::new(NullNotifier),
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Keeps every event it is handed.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingNotifier {
        pub events: Arc<Mutex<Vec<CompletionEvent>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, event: &CompletionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
