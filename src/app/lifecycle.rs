// SPDX-License-Identifier: GPL-3.0-only

//! Stream lifecycle state machine
//!
//! Owns the single active stream. Every selection first tears the current
//! stream down, then issues a ticket carrying a fresh sequence number. Only
//! the completion of the most recent ticket may install a stream; older
//! completions are stale and their streams are stopped on arrival.
//!
//! Request futures open hardware through a [`RequestGate`], one at a time.
//! A superseded request opens nothing, or stops what it opened before the
//! next open starts. A stream opened but not yet applied is stopped by the
//! next selection.
//!
//! ```text
//!            begin_select / shutdown
//!   ┌──────┐ ◄──────────────────────── ┌────────┐
//!   │ Idle │                           │ Active │
//!   └──────┘ ────────────────────────► └────────┘
//!            complete(latest, Ok)
//! ```

use crate::backends::camera::{MediaStream, MediaTrack, SelectedDevice, StreamId};
use crate::errors::{MediaError, MediaResult};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Handle for one outstanding acquisition request
#[derive(Debug)]
pub struct SelectTicket {
    seq: u64,
    choice: SelectedDevice,
}

impl SelectTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn choice(&self) -> &SelectedDevice {
        &self.choice
    }
}

/// Current state of the manager
#[derive(Debug, Default)]
pub enum LifecycleState {
    /// No stream bound
    #[default]
    Idle,
    /// Exactly one stream bound
    Active(MediaStream),
}

/// Outcome of feeding a completion to the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The stream was installed and is now active
    Activated(StreamId),
    /// The latest request failed; the manager stays idle
    Failed(MediaError),
    /// A newer request superseded this one; the result was discarded
    Stale,
}

#[derive(Default)]
struct GateState {
    latest_seq: u64,
    /// Tracks of a stream opened for `latest_seq` that has not been applied yet
    unclaimed: Option<(u64, Vec<Arc<dyn MediaTrack>>)>,
}

/// Shared between the lifecycle and its in-flight request futures.
///
/// Holds the newest ticket number and allows a single hardware open at a
/// time.
#[derive(Clone, Default)]
pub struct RequestGate {
    state: Arc<Mutex<GateState>>,
    opening: Arc<tokio::sync::Mutex<()>>,
}

impl RequestGate {
    fn state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn latest_seq(&self) -> u64 {
        self.state().latest_seq
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.latest_seq() == seq
    }

    /// Run `start` for ticket `seq` once no other open is in progress.
    ///
    /// Returns `None` when the ticket was superseded, either before its turn
    /// (nothing is opened) or while opening (the new stream is stopped
    /// before the gate is released).
    pub async fn open<F>(&self, seq: u64, start: F) -> Option<MediaResult<MediaStream>>
    where
        F: FnOnce() -> BoxFuture<'static, MediaResult<MediaStream>>,
    {
        if !self.is_current(seq) {
            debug!(seq, "Request superseded before opening");
            return None;
        }
        let _opening = self.opening.lock().await;
        if !self.is_current(seq) {
            debug!(seq, "Request superseded while waiting to open");
            return None;
        }

        let result = start().await;

        let mut state = self.state();
        match result {
            Ok(mut stream) if state.latest_seq != seq => {
                drop(state);
                info!(seq, stream = %stream.id(), "Stopping stream of superseded request");
                stream.shutdown();
                None
            }
            Ok(stream) => {
                state.unclaimed = Some((seq, stream.tracks().to_vec()));
                Some(Ok(stream))
            }
            Err(err) => Some(Err(err)),
        }
    }

    /// Invalidate every outstanding ticket and stop any stream opened for
    /// one of them. Returns the new latest sequence number.
    fn advance(&self) -> u64 {
        let (seq, unclaimed) = {
            let mut state = self.state();
            state.latest_seq += 1;
            (state.latest_seq, state.unclaimed.take())
        };
        if let Some((old, tracks)) = unclaimed {
            info!(seq = old, "Stopping stream opened for a superseded request");
            for track in tracks {
                track.stop();
            }
        }
        seq
    }

    /// Forget the unclaimed stream of `seq` once its completion is applied
    fn claim(&self, seq: u64) {
        let mut state = self.state();
        if state.unclaimed.as_ref().is_some_and(|(s, _)| *s == seq) {
            state.unclaimed = None;
        }
    }
}

impl std::fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGate")
            .field("latest_seq", &self.latest_seq())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct StreamLifecycle {
    state: LifecycleState,
    gate: RequestGate,
    /// Choice of the latest ticket while it has not completed
    pending: Option<SelectedDevice>,
}

impl StreamLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, LifecycleState::Active(_))
    }

    pub fn active_stream(&self) -> Option<&MediaStream> {
        match &self.state {
            LifecycleState::Active(stream) => Some(stream),
            LifecycleState::Idle => None,
        }
    }

    pub fn active_stream_mut(&mut self) -> Option<&mut MediaStream> {
        match &mut self.state {
            LifecycleState::Active(stream) => Some(stream),
            LifecycleState::Idle => None,
        }
    }

    /// Choice whose acquisition is still in flight
    pub fn pending(&self) -> Option<&SelectedDevice> {
        self.pending.as_ref()
    }

    pub fn latest_seq(&self) -> u64 {
        self.gate.latest_seq()
    }

    /// Gate that request futures for this lifecycle open hardware through
    pub fn gate(&self) -> RequestGate {
        self.gate.clone()
    }

    /// Stop the active stream (if any) and issue a ticket for `choice`.
    ///
    /// The teardown completes before this returns, so the caller can only
    /// start the acquisition once the previous hardware handle is released.
    /// A stream already opened for an older ticket is stopped here too.
    pub fn begin_select(&mut self, choice: SelectedDevice) -> SelectTicket {
        self.teardown();
        let seq = self.gate.advance();
        self.pending = Some(choice.clone());
        debug!(seq, choice = %choice, "Issued acquisition ticket");
        SelectTicket { seq, choice }
    }

    /// Apply the result of a ticket's acquisition
    pub fn complete(
        &mut self,
        ticket: SelectTicket,
        result: MediaResult<MediaStream>,
    ) -> Completion {
        self.gate.claim(ticket.seq);
        let latest = self.gate.latest_seq();
        if ticket.seq != latest {
            match result {
                Ok(mut stream) => {
                    info!(
                        seq = ticket.seq,
                        latest,
                        stream = %stream.id(),
                        "Discarding stream from superseded request"
                    );
                    stream.shutdown();
                }
                Err(err) => {
                    debug!(seq = ticket.seq, error = %err, "Ignoring failure of superseded request");
                }
            }
            return Completion::Stale;
        }

        self.pending = None;

        match result {
            Ok(stream) => {
                // Never two streams at once
                self.teardown();
                let id = stream.id();
                info!(seq = ticket.seq, stream = %id, choice = %ticket.choice, "Stream active");
                self.state = LifecycleState::Active(stream);
                Completion::Activated(id)
            }
            Err(err) => {
                warn!(seq = ticket.seq, choice = %ticket.choice, error = %err, "Acquisition failed");
                Completion::Failed(err)
            }
        }
    }

    /// Stop the active stream and invalidate every outstanding ticket
    pub fn shutdown(&mut self) {
        self.teardown();
        self.gate.advance();
        self.pending = None;
    }

    /// Stop the active stream, returning its id
    fn teardown(&mut self) -> Option<StreamId> {
        match std::mem::take(&mut self.state) {
            LifecycleState::Active(mut stream) => {
                let id = stream.id();
                info!(stream = %id, "Tearing down active stream");
                stream.shutdown();
                Some(id)
            }
            LifecycleState::Idle => None,
        }
    }
}
