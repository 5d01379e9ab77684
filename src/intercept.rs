use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{
    browser::{CapturedResponse, ResponseStream},
    error::{Error, Result},
    menu::{extract, menu_message, MenuDocument, StationSpec},
    telegram::Deliver,
};

/// What happened to the one menu response a run expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capture {
    Delivered,
    /// The body wasn't a menu document; nothing was sent.
    Malformed,
    /// The digest was built but the send failed.
    DeliveryFailed,
    /// The hook ended (or its body couldn't be read) before a menu arrived.
    /// [`Completion::wait`] turns this into [`Error::CaptureMissed`].
    Missed,
}

#[derive(Clone)]
pub struct InterceptionCoordinator {
    deliverer: Arc<dyn Deliver>,
    recipient: i64,
    period: String,
    stations: Vec<StationSpec>,
}

impl InterceptionCoordinator {
    pub fn new(
        deliverer: Arc<dyn Deliver>,
        recipient: i64,
        period: impl Into<String>,
        stations: Vec<StationSpec>,
    ) -> Self {
        Self {
            deliverer,
            recipient,
            period: period.into(),
            stations,
        }
    }

    /// Spawns the listener for the first response on `responses`.
    ///
    /// The returned `Completion` resolves once that response has been fully
    /// handled, whatever the outcome.
    pub fn arm(&self, mut responses: ResponseStream) -> Completion {
        let (done, rx) = oneshot::channel();
        let coordinator = self.clone();
        let task = tokio::spawn(async move {
            let capture = match responses.next().await {
                Some(Ok(response)) => coordinator.handle(response).await,
                Some(Err(e)) => {
                    log::error!("Failed to read intercepted response: {e}");
                    Capture::Missed
                }
                None => {
                    log::warn!("Response hook closed before the menu request");
                    Capture::Missed
                }
            };
            let _ = done.send(capture);
        });
        Completion { rx, task }
    }

    /// Parses, extracts and delivers one captured menu. Errors stop here.
    pub async fn handle(&self, response: CapturedResponse) -> Capture {
        log::info!("Intercepted request {}", response.url);
        let document = match MenuDocument::parse(&response.body) {
            Ok(document) => document,
            Err(e) => {
                log::error!("Failed to parse menu: {e}");
                return Capture::Malformed;
            }
        };

        let digest = extract(&document, &self.period, &self.stations);
        if digest.is_empty() {
            log::info!("No dishes listed for {}", self.period);
        }

        match self.deliverer.send(self.recipient, &menu_message(&digest)).await {
            Ok(()) => Capture::Delivered,
            Err(e) => {
                log::error!("Failed to send message: {e}");
                Capture::DeliveryFailed
            }
        }
    }
}

/// Single-use rendezvous with the listener spawned by [`InterceptionCoordinator::arm`].
/// Dropping it abandons the listener.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<Capture>,
    task: JoinHandle<()>,
}

impl Completion {
    /// Only a handled menu counts, even if its delivery failed. Anything
    /// short of that is an error so the run can be retried.
    pub async fn wait(mut self, timeout: Duration) -> Result<Capture> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(Capture::Missed)) => Err(Error::CaptureMissed),
            Ok(Ok(capture)) => Ok(capture),
            Ok(Err(_)) => {
                log::error!("Interception listener stopped without reporting");
                Err(Error::CaptureMissed)
            }
            Err(_) => Err(Error::CaptureTimedOut(timeout)),
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.task.abort();
    }
}
