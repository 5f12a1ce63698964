// SPDX-License-Identifier: GPL-3.0-only

//! Camera session
//!
//! Ties enumeration, acquisition, the stream lifecycle, the selection list
//! and the display surface together. The session is owned by the UI that
//! created it: [`CameraSession::init`] (or [`CameraSession::begin_init`] for a
//! UI that must not wait) runs once when the UI appears and
//! [`CameraSession::shutdown`] (or drop) releases the camera when it goes.
//!
//! Acquisitions run as detached futures. The UI loop awaits them wherever it
//! likes and feeds the resulting [`SessionEvent`] back through
//! [`CameraSession::handle_event`], which is the only place a stream becomes
//! active.

use super::lifecycle::{Completion, SelectTicket, StreamLifecycle};
use super::selection::{SelectionEntry, SelectionList};
use super::video_sink::{SinkBinding, VideoSink};
use crate::backends::camera::{
    DeviceDescriptor, DeviceEnumerator, FacingMode, MediaHost, MediaStream, SelectedDevice, StreamAcquirer,
    StreamId,
};
use crate::errors::{MediaError, MediaResult};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info};

/// Progress and error notices shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A camera is being opened
    Selecting(SelectedDevice),
    Acquired {
        choice: SelectedDevice,
        stream_id: StreamId,
    },
    AcquisitionFailed {
        choice: SelectedDevice,
        error: MediaError,
    },
    EnumerationFailed(MediaError),
    /// Number of video inputs found
    DevicesListed(usize),
}

impl Notice {
    /// Notices that need the user's attention before carrying on
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::AcquisitionFailed { .. } | Notice::EnumerationFailed(_)
        )
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Selecting(choice) => write!(f, "Opening {}...", choice),
            Notice::Acquired { choice, stream_id } => {
                write!(f, "Streaming {} [{}]", choice, stream_id)
            }
            Notice::AcquisitionFailed { choice, error } => {
                write!(f, "Could not open {}: {}", choice, error)
            }
            Notice::EnumerationFailed(error) => write!(f, "Could not list cameras: {}", error),
            Notice::DevicesListed(1) => write!(f, "1 camera found"),
            Notice::DevicesListed(count) => write!(f, "{} cameras found", count),
        }
    }
}

/// Receives notices. Errors are delivered here at the point of failure.
pub trait Notifier: Send {
    fn notify(&mut self, notice: Notice);
}

/// Completion of one acquisition, to be fed to [`CameraSession::handle_event`]
#[derive(Debug)]
pub struct SessionEvent {
    ticket: SelectTicket,
    /// `None` when a newer selection superseded the request
    result: Option<MediaResult<MediaStream>>,
}

impl SessionEvent {
    pub fn choice(&self) -> &SelectedDevice {
        self.ticket.choice()
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.result, Some(Ok(_)))
    }

    /// True if the request was superseded and never produced a stream
    pub fn is_superseded(&self) -> bool {
        self.result.is_none()
    }
}

/// Futures started by [`CameraSession::begin_init`]
pub struct InitRequests {
    pub devices: BoxFuture<'static, MediaResult<Vec<DeviceDescriptor>>>,
    pub stream: BoxFuture<'static, SessionEvent>,
}

/// Outcome of [`CameraSession::init`]; each half may fail independently
#[derive(Debug)]
pub struct InitReport {
    /// Number of video inputs listed
    pub devices: MediaResult<usize>,
    pub stream: Completion,
}

pub struct CameraSession<S: VideoSink, N: Notifier> {
    enumerator: DeviceEnumerator,
    acquirer: StreamAcquirer,
    lifecycle: StreamLifecycle,
    selection: SelectionList,
    sink: S,
    notifier: N,
    initial: SelectedDevice,
    initialized: bool,
}

impl<S: VideoSink, N: Notifier> CameraSession<S, N> {
    pub fn new(host: Arc<dyn MediaHost>, sink: S, notifier: N) -> Self {
        Self {
            enumerator: DeviceEnumerator::new(host.clone()),
            acquirer: StreamAcquirer::new(host),
            lifecycle: StreamLifecycle::new(),
            selection: SelectionList::default_only(),
            sink,
            notifier,
            initial: SelectedDevice::Default,
            initialized: false,
        }
    }

    /// Facing mode requested by the "Default" entry
    pub fn with_facing(mut self, facing: FacingMode) -> Self {
        self.acquirer = self.acquirer.clone().with_facing(facing);
        self
    }

    /// Camera opened by [`Self::init`] instead of the default one
    pub fn with_initial(mut self, choice: SelectedDevice) -> Self {
        self.initial = choice;
        self
    }

    /// List devices and open the initial camera concurrently.
    ///
    /// Runs once; later calls return `None`. If enumeration fails the list
    /// holds only the "Default" entry.
    pub async fn init(&mut self) -> Option<InitReport> {
        let requests = self.begin_init()?;
        let (listed, event) = tokio::join!(requests.devices, requests.stream);

        let devices = self.apply_devices(listed);
        let stream = self.handle_event(event);
        Some(InitReport { devices, stream })
    }

    /// Start the two halves of [`Self::init`] without waiting for them.
    ///
    /// Feed the listing to [`Self::apply_devices`] and the stream event to
    /// [`Self::handle_event`], in either order. Returns `None` once the
    /// session has been initialized.
    pub fn begin_init(&mut self) -> Option<InitRequests> {
        if self.initialized {
            debug!("Session already initialized");
            return None;
        }
        self.initialized = true;
        info!(initial = %self.initial, "Initializing camera session");

        let devices = self.enumerator.list_devices();
        let stream = self.select(self.initial.clone());
        Some(InitRequests { devices, stream })
    }

    /// Replace the selection list with the enumerated devices. Returns the
    /// number of video inputs listed.
    pub fn apply_devices(
        &mut self,
        listed: MediaResult<Vec<DeviceDescriptor>>,
    ) -> MediaResult<usize> {
        let devices = match listed {
            Ok(devices) => {
                self.selection = SelectionList::new(&devices);
                let count = self.selection.len() - 1;
                self.notifier.notify(Notice::DevicesListed(count));
                Ok(count)
            }
            Err(err) => {
                self.selection = SelectionList::default_only();
                self.notifier.notify(Notice::EnumerationFailed(err.clone()));
                Err(err)
            }
        };
        self.selection.focus(&self.initial);
        devices
    }

    /// Tear down the active stream and start acquiring `choice`.
    ///
    /// The returned future is independent of the session; await it and pass
    /// its event to [`Self::handle_event`]. Request futures open hardware one
    /// at a time, and a request superseded by a later `select` opens nothing
    /// or stops what it opened.
    pub fn select(&mut self, choice: SelectedDevice) -> BoxFuture<'static, SessionEvent> {
        self.notifier.notify(Notice::Selecting(choice.clone()));
        self.sink.unbind();

        let ticket = self.lifecycle.begin_select(choice);
        let gate = self.lifecycle.gate();
        let acquirer = self.acquirer.clone();
        async move {
            let result = gate
                .open(ticket.seq(), || acquirer.acquire(ticket.choice()))
                .await;
            SessionEvent { ticket, result }
        }
        .boxed()
    }

    /// Select the entry under the cursor
    pub fn select_current(&mut self) -> Option<BoxFuture<'static, SessionEvent>> {
        let choice = self.selection.current()?.choice.clone();
        Some(self.select(choice))
    }

    /// Select and apply the completion in one step
    pub async fn select_and_wait(&mut self, choice: SelectedDevice) -> Completion {
        let event = self.select(choice).await;
        self.handle_event(event)
    }

    /// Apply an acquisition completion: bind the sink on success, report on
    /// failure, ignore superseded requests.
    pub fn handle_event(&mut self, event: SessionEvent) -> Completion {
        let SessionEvent { ticket, result } = event;
        let Some(result) = result else {
            debug!(seq = ticket.seq(), choice = %ticket.choice(), "Superseded request skipped");
            return Completion::Stale;
        };
        let choice = ticket.choice().clone();
        let completion = self.lifecycle.complete(ticket, result);

        match &completion {
            Completion::Activated(stream_id) => {
                if let Some(stream) = self.lifecycle.active_stream_mut() {
                    let binding = SinkBinding {
                        stream_id: stream.id(),
                        label: stream.label().to_string(),
                        frames: stream.take_frames(),
                    };
                    self.sink.bind(binding);
                }
                self.selection.focus(&choice);
                self.notifier.notify(Notice::Acquired {
                    choice,
                    stream_id: *stream_id,
                });
            }
            Completion::Failed(error) => {
                self.notifier.notify(Notice::AcquisitionFailed {
                    choice,
                    error: error.clone(),
                });
            }
            Completion::Stale => {}
        }

        completion
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        self.selection.entries()
    }

    pub fn selection(&self) -> &SelectionList {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionList {
        &mut self.selection
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn active_stream(&self) -> Option<&MediaStream> {
        self.lifecycle.active_stream()
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// True while the latest request has not completed
    pub fn is_acquiring(&self) -> bool {
        self.lifecycle.pending().is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Release the camera and drop any in-flight request
    pub fn shutdown(&mut self) {
        if self.lifecycle.is_active() || self.lifecycle.pending().is_some() {
            info!("Shutting down camera session");
        }
        self.sink.unbind();
        self.lifecycle.shutdown();
    }
}

impl<S: VideoSink, N: Notifier> Drop for CameraSession<S, N> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
