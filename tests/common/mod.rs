// SPDX-License-Identifier: GPL-3.0-only

//! Fake media host, sink and notifier shared by the integration tests

#![allow(dead_code)]

use camera_preview::app::{Notice, Notifier, SinkBinding, VideoSink};
use camera_preview::backends::camera::{
    DeviceDescriptor, MediaHost, MediaStream, MediaTrack, StreamConstraints, StreamId,
    VideoConstraint,
};
use camera_preview::errors::{MediaError, MediaResult};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Key used in the call log for default-camera requests
pub const DEFAULT_KEY: &str = "default";

#[derive(Default)]
struct HostState {
    devices: Mutex<Option<MediaResult<Vec<DeviceDescriptor>>>>,
    failures: Mutex<HashMap<String, MediaError>>,
    calls: Mutex<Vec<String>>,
    tracks: Mutex<Vec<Arc<FakeTrack>>>,
    open: AtomicUsize,
    max_open: AtomicUsize,
}

impl HostState {
    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Host that hands out fake streams and counts open hardware handles
#[derive(Clone, Default)]
pub struct FakeHost {
    state: Arc<HostState>,
}

impl FakeHost {
    pub fn with_devices(devices: Vec<DeviceDescriptor>) -> Self {
        let host = Self::default();
        *host.state.devices.lock().unwrap() = Some(Ok(devices));
        host
    }

    pub fn failing_enumeration(error: MediaError) -> Self {
        let host = Self::default();
        *host.state.devices.lock().unwrap() = Some(Err(error));
        host
    }

    /// Make acquisitions of `key` (a device id or [`DEFAULT_KEY`]) fail
    pub fn fail(&self, key: &str, error: MediaError) {
        self.state
            .failures
            .lock()
            .unwrap()
            .insert(key.to_string(), error);
    }

    pub fn open(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    pub fn max_open(&self) -> usize {
        self.state.max_open.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    /// Every track ever handed out, oldest first
    pub fn tracks(&self) -> Vec<Arc<FakeTrack>> {
        self.state.tracks.lock().unwrap().clone()
    }

    pub fn as_host(&self) -> Arc<dyn MediaHost> {
        Arc::new(self.clone())
    }
}

impl MediaHost for FakeHost {
    fn enumerate_devices(&self) -> BoxFuture<'static, MediaResult<Vec<DeviceDescriptor>>> {
        self.state.log("enumerate".to_string());
        let result = self
            .state
            .devices
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()));
        async move { result }.boxed()
    }

    fn get_stream(
        &self,
        constraints: StreamConstraints,
    ) -> BoxFuture<'static, MediaResult<MediaStream>> {
        assert!(!constraints.audio, "audio must never be requested");
        let key = match &constraints.video {
            VideoConstraint::DeviceId(id) => id.clone(),
            VideoConstraint::FacingMode(_) => DEFAULT_KEY.to_string(),
        };
        self.state.log(format!("get_stream:{}", key));

        let state = self.state.clone();
        async move {
            if let Some(err) = state.failures.lock().unwrap().get(&key).cloned() {
                return Err(err);
            }

            let open = state.open.fetch_add(1, Ordering::SeqCst) + 1;
            state.max_open.fetch_max(open, Ordering::SeqCst);

            let track = Arc::new(FakeTrack {
                id: key.clone(),
                live: AtomicBool::new(true),
                host: state.clone(),
            });
            state.tracks.lock().unwrap().push(track.clone());
            Ok(MediaStream::new(key, vec![track as Arc<dyn MediaTrack>], None))
        }
        .boxed()
    }
}

pub struct FakeTrack {
    id: String,
    live: AtomicBool,
    host: Arc<HostState>,
}

impl FakeTrack {
    pub fn track_id(&self) -> &str {
        &self.id
    }

    pub fn is_live_track(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.id
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.host.open.fetch_sub(1, Ordering::SeqCst);
            self.host.log(format!("stop:{}", self.id));
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeSink {
    pub bound: Option<StreamId>,
    pub history: Vec<StreamId>,
}

impl VideoSink for FakeSink {
    fn bind(&mut self, binding: SinkBinding) {
        self.bound = Some(binding.stream_id);
        self.history.push(binding.stream_id);
    }

    fn unbind(&mut self) {
        self.bound = None;
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notices: Vec<Notice>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<&Notice> {
        self.notices.iter().filter(|n| n.is_error()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

pub fn front() -> DeviceDescriptor {
    DeviceDescriptor::video("cam1", "Front")
}

pub fn back() -> DeviceDescriptor {
    DeviceDescriptor::video("cam2", "Back")
}
