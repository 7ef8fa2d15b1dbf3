//! Single-slot bridge to an isolated image-processing context.
//!
//! Pixel work happens elsewhere (a worker, a UI thread, another process).
//! The bridge ships a [`ProcessRequest`] to that context and hands the
//! caller a [`PendingReply`] future that settles when the context answers
//! with a [`BridgeEvent`].
//!
//! At most one request is in flight per bridge. The pending slot doubles as
//! the "occupied" flag: [`ProcessingBridge::submit`] refuses a second
//! request with [`LocframeError::BridgeBusy`], and there is no queue. Since
//! only one request can be outstanding, replies carry no correlation ID;
//! a reply arriving when nothing is pending is dropped.
//!
//! No timeout or cancellation is supported. The slot stays occupied until
//! the context answers, even if the caller has dropped its [`PendingReply`]:
//! the context is still working on that request, and its reply must not
//! settle a newer one.
//!
//! ```
//! use futures::executor::block_on;
//! use futures::StreamExt;
//! use locframe::bridge::{BridgeEvent, CleanOptions, ProcessRequest, ProcessingBridge};
//!
//! let (bridge, mut requests) = ProcessingBridge::channel();
//! let reply = bridge
//!     .submit(ProcessRequest {
//!         image_bytes: vec![1, 2, 3],
//!         cleaning_areas: vec![],
//!         options: CleanOptions::new("inpaint"),
//!     })
//!     .unwrap();
//!
//! // The processing context picks the request up and answers it.
//! let request = block_on(requests.next()).unwrap();
//! bridge.deliver(BridgeEvent::Processed(request.image_bytes));
//!
//! assert_eq!(block_on(reply).unwrap(), vec![1, 2, 3]);
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::channel::{mpsc, oneshot};
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::LocframeError;
use crate::matcher::CleaningArea;

/// Options forwarded untouched to the processing context.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanOptions {
    /// Name of the cleaning method the context should apply.
    pub method: String,
    /// Method-specific settings.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CleanOptions {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// The payload shipped to the processing context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub image_bytes: Vec<u8>,
    pub cleaning_areas: Vec<CleaningArea>,
    pub options: CleanOptions,
}

/// A reply from the processing context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Processing succeeded with these result bytes.
    Processed(Vec<u8>),
    /// Processing failed with this message.
    ProcessError(String),
}

type Reply = Result<Vec<u8>, String>;

/// The caller's side of the bridge.
#[derive(Debug)]
pub struct ProcessingBridge {
    pending: Mutex<Option<oneshot::Sender<Reply>>>,
    outbox: mpsc::UnboundedSender<ProcessRequest>,
}

impl ProcessingBridge {
    /// Creates a bridge and the receiving end the processing context reads
    /// requests from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProcessRequest>) {
        let (outbox, requests) = mpsc::unbounded();
        let bridge = Self {
            pending: Mutex::new(None),
            outbox,
        };
        (bridge, requests)
    }

    /// True while a request awaits its reply.
    pub fn is_busy(&self) -> bool {
        self.slot().is_some()
    }

    /// Ships `request` to the processing context.
    ///
    /// # Errors
    /// [`LocframeError::BridgeBusy`] if a request is already outstanding,
    /// [`LocframeError::BridgeClosed`] if the context's receiver is gone.
    pub fn submit(&self, request: ProcessRequest) -> Result<PendingReply, LocframeError> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Err(LocframeError::BridgeBusy);
        }

        let (sender, receiver) = oneshot::channel();
        if self.outbox.unbounded_send(request).is_err() {
            *slot = None;
            return Err(LocframeError::BridgeClosed);
        }
        *slot = Some(sender);
        tracing::debug!("processing request sent");

        Ok(PendingReply { receiver })
    }

    /// Submits `request` and waits for its reply.
    pub async fn request_processing(&self, request: ProcessRequest) -> Result<Vec<u8>, LocframeError> {
        self.submit(request)?.await
    }

    /// Settles the pending request with `event`.
    ///
    /// The slot is cleared before the reply is handed over, so a duplicate
    /// event can never settle the same request twice. A reply to an
    /// abandoned request only frees the slot. Returns `false`, and does
    /// nothing else, if no request was pending.
    pub fn deliver(&self, event: BridgeEvent) -> bool {
        let sender = self.slot().take();
        let Some(sender) = sender else {
            tracing::debug!("ignoring processing reply with no pending request");
            return false;
        };

        let reply = match event {
            BridgeEvent::Processed(bytes) => Ok(bytes),
            BridgeEvent::ProcessError(message) => Err(message),
        };
        if sender.send(reply).is_err() {
            tracing::debug!("processing reply arrived after the caller stopped waiting");
        }
        true
    }

    fn slot(&self) -> MutexGuard<'_, Option<oneshot::Sender<Reply>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves to the processing result of a submitted request.
#[derive(Debug)]
#[must_use = "a processing reply does nothing unless awaited"]
pub struct PendingReply {
    receiver: oneshot::Receiver<Reply>,
}

impl Future for PendingReply {
    type Output = Result<Vec<u8>, LocframeError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver.poll_unpin(cx).map(|reply| match reply {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(message)) => Err(LocframeError::Processing(message)),
            Err(oneshot::Canceled) => Err(LocframeError::BridgeClosed),
        })
    }
}
