// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the camera session against a fake media host

mod common;

use camera_preview::app::{CameraSession, Completion, Notice};
use camera_preview::backends::camera::SelectedDevice;
use camera_preview::errors::MediaError;
use common::{DEFAULT_KEY, FakeHost, FakeSink, RecordingNotifier, back, front};

type Session = CameraSession<FakeSink, RecordingNotifier>;

fn session(host: &FakeHost) -> Session {
    CameraSession::new(
        host.as_host(),
        FakeSink::default(),
        RecordingNotifier::default(),
    )
}

fn labels(session: &Session) -> Vec<String> {
    session.entries().iter().map(|e| e.label.clone()).collect()
}

#[tokio::test]
async fn init_lists_devices_and_binds_default_stream() {
    let host = FakeHost::with_devices(vec![front()]);
    let mut session = session(&host);

    let report = session.init().await.expect("first init runs");
    assert_eq!(report.devices, Ok(1));
    let Completion::Activated(s0) = report.stream else {
        panic!("default stream should be active, got {:?}", report.stream);
    };

    assert_eq!(labels(&session), ["Front", "Default"]);
    assert_eq!(session.sink().bound, Some(s0));
    assert_eq!(session.active_stream().map(|s| s.id()), Some(s0));
    assert_eq!(host.open(), 1);
    assert!(host.position(&format!("get_stream:{}", DEFAULT_KEY)).is_some());
}

#[tokio::test]
async fn init_runs_only_once() {
    let host = FakeHost::with_devices(vec![front()]);
    let mut session = session(&host);

    assert!(session.init().await.is_some());
    assert!(session.init().await.is_none());
    assert_eq!(host.tracks().len(), 1);
}

#[tokio::test]
async fn begin_init_applies_results_in_any_order() {
    let host = FakeHost::with_devices(vec![front(), back()]);
    let mut session = session(&host);

    let requests = session.begin_init().expect("first init starts");
    assert!(session.is_initialized());
    assert!(session.begin_init().is_none());

    // The stream can be ready before the device list
    let completion = session.handle_event(requests.stream.await);
    assert!(matches!(completion, Completion::Activated(_)));
    assert_eq!(labels(&session), ["Default"]);

    assert_eq!(session.apply_devices(requests.devices.await), Ok(2));
    assert_eq!(labels(&session), ["Front", "Back", "Default"]);
    assert!(session.is_active());
    assert!(session.init().await.is_none());
    assert_eq!(host.open(), 1);
}

#[tokio::test]
async fn failed_listing_after_begin_init_keeps_default_entry() {
    let host = FakeHost::failing_enumeration(MediaError::HardwareUnavailable("v4l2".into()));
    let mut session = session(&host);

    let requests = session.begin_init().expect("first init starts");
    let devices = session.apply_devices(requests.devices.await);
    assert!(matches!(devices, Err(MediaError::HardwareUnavailable(_))));
    assert_eq!(labels(&session), ["Default"]);

    let completion = session.handle_event(requests.stream.await);
    assert!(matches!(completion, Completion::Activated(_)));
}

#[tokio::test]
async fn clicking_a_device_stops_the_old_stream_before_acquiring() {
    let host = FakeHost::with_devices(vec![front()]);
    let mut session = session(&host);
    session.init().await;
    let s0 = session.sink().bound.expect("default stream bound");

    assert!(session.selection_mut().focus_device("cam1"));
    let request = session.select_current().expect("cursor on an entry");
    // Teardown happens before the request future is even polled
    assert_eq!(host.open(), 0);
    let completion = session.handle_event(request.await);

    let Completion::Activated(s1) = completion else {
        panic!("front camera should be active, got {:?}", completion);
    };
    assert_ne!(s0, s1);

    let stop = host.position(&format!("stop:{}", DEFAULT_KEY)).expect("S0 stopped");
    let acquire = host.position("get_stream:cam1").expect("cam1 requested");
    assert!(stop < acquire, "calls: {:?}", host.calls());

    assert_eq!(session.sink().bound, Some(s1));
    assert_eq!(session.sink().history, vec![s0, s1]);
    assert!(!host.tracks()[0].is_live_track());
    assert_eq!(host.open(), 1);
    assert_eq!(host.max_open(), 1);
}

#[tokio::test]
async fn permission_denied_reports_and_stays_idle() {
    let host = FakeHost::with_devices(vec![front()]);
    host.fail("cam1", MediaError::PermissionDenied("cam1".into()));
    let mut session = session(&host);
    session.init().await;

    let completion = session
        .select_and_wait(SelectedDevice::Device(front()))
        .await;

    assert_eq!(
        completion,
        Completion::Failed(MediaError::PermissionDenied("cam1".into()))
    );
    assert!(!session.is_active());
    assert!(!session.is_acquiring());
    assert_eq!(session.sink().bound, None);
    assert_eq!(labels(&session), ["Front", "Default"]);
    assert_eq!(host.open(), 0);

    let errors = session.notifier().errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        Notice::AcquisitionFailed {
            error: MediaError::PermissionDenied(_),
            ..
        }
    ));

    // Still usable afterwards
    let completion = session.select_and_wait(SelectedDevice::Default).await;
    assert!(matches!(completion, Completion::Activated(_)));
}

#[tokio::test]
async fn sequential_selections_never_hold_two_handles() {
    let host = FakeHost::with_devices(vec![front(), back()]);
    let mut session = session(&host);
    session.init().await;

    let choices = [
        SelectedDevice::Device(front()),
        SelectedDevice::Device(back()),
        SelectedDevice::Default,
        SelectedDevice::Device(back()),
        SelectedDevice::Device(back()),
        SelectedDevice::Device(front()),
    ];
    for _ in 0..5 {
        for choice in &choices {
            let completion = session.select_and_wait(choice.clone()).await;
            assert!(matches!(completion, Completion::Activated(_)));
            assert_eq!(host.open(), 1);
        }
    }

    assert_eq!(host.max_open(), 1);
    assert_eq!(host.tracks().len(), 1 + 5 * choices.len());
}

#[tokio::test]
async fn reselecting_the_active_device_reacquires() {
    let host = FakeHost::with_devices(vec![front()]);
    let mut session = session(&host);
    session.init().await;

    let first = session.select_and_wait(SelectedDevice::Device(front())).await;
    let second = session.select_and_wait(SelectedDevice::Device(front())).await;

    assert_ne!(first, second);
    let cam1_requests = host
        .calls()
        .iter()
        .filter(|c| *c == "get_stream:cam1")
        .count();
    assert_eq!(cam1_requests, 2);
    assert_eq!(host.open(), 1);
}

fn requests_for(host: &FakeHost, call: &str) -> usize {
    host.calls().iter().filter(|c| *c == call).count()
}

#[tokio::test]
async fn latest_selection_wins_and_superseded_request_never_opens() {
    let host = FakeHost::with_devices(vec![front()]);
    let mut session = session(&host);
    session.init().await;

    let first = session.select(SelectedDevice::Default);
    let second = session.select(SelectedDevice::Device(front()));

    let latest = session.handle_event(second.await);
    let Completion::Activated(latest_id) = latest else {
        panic!("latest request should activate, got {:?}", latest);
    };
    let stale = first.await;
    assert!(stale.is_superseded());
    assert_eq!(session.handle_event(stale), Completion::Stale);

    // Only the init request ever opened the default camera
    assert_eq!(requests_for(&host, &format!("get_stream:{}", DEFAULT_KEY)), 1);
    assert_eq!(session.sink().bound, Some(latest_id));
    assert_eq!(session.active_stream().map(|s| s.label()), Some("cam1"));
    assert_eq!(host.open(), 1);
    assert_eq!(host.max_open(), 1);
}

#[tokio::test]
async fn double_click_on_one_device_holds_one_handle() {
    let host = FakeHost::with_devices(vec![front()]);
    let mut session = session(&host);
    session.init().await;

    let first = session.select(SelectedDevice::Device(front()));
    let second = session.select(SelectedDevice::Device(front()));
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_superseded());
    assert!(second.is_ok());
    assert_eq!(host.max_open(), 1);

    assert_eq!(session.handle_event(first), Completion::Stale);
    assert!(matches!(
        session.handle_event(second),
        Completion::Activated(_)
    ));
    assert_eq!(requests_for(&host, "get_stream:cam1"), 1);
    assert!(session.notifier().errors().is_empty());
    assert_eq!(host.open(), 1);
}

#[tokio::test]
async fn opened_but_unapplied_stream_is_released_by_next_select() {
    let host = FakeHost::with_devices(vec![front(), back()]);
    let mut session = session(&host);
    session.init().await;

    let first = session.select(SelectedDevice::Device(front())).await;
    assert!(first.is_ok());
    assert_eq!(host.open(), 1);

    let second = session.select(SelectedDevice::Device(back()));
    assert_eq!(host.open(), 0);
    let second = second.await;
    assert_eq!(host.open(), 1);

    assert_eq!(session.handle_event(first), Completion::Stale);
    assert!(matches!(
        session.handle_event(second),
        Completion::Activated(_)
    ));

    let cam1 = host
        .tracks()
        .into_iter()
        .find(|t| t.track_id() == "cam1")
        .expect("cam1 was opened");
    assert!(!cam1.is_live_track());
    assert_eq!(session.active_stream().map(|s| s.label()), Some("cam2"));
    assert_eq!(host.open(), 1);
    assert_eq!(host.max_open(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_of_spawned_selections_never_holds_two_handles() {
    let host = FakeHost::with_devices(vec![front(), back()]);
    let mut session = session(&host);
    session.init().await;

    let choices = [
        SelectedDevice::Device(front()),
        SelectedDevice::Device(front()),
        SelectedDevice::Device(back()),
        SelectedDevice::Default,
        SelectedDevice::Device(back()),
        SelectedDevice::Device(front()),
    ];
    let mut requests = Vec::new();
    for choice in choices.iter().cycle().take(24) {
        requests.push(tokio::spawn(session.select(choice.clone())));
        tokio::task::yield_now().await;
    }

    let mut completions = Vec::new();
    for request in requests {
        let event = request.await.expect("request task finished");
        completions.push(session.handle_event(event));
    }

    let (last, earlier) = completions.split_last().expect("requests were made");
    assert!(matches!(last, Completion::Activated(_)), "got {:?}", last);
    assert!(earlier.iter().all(|c| *c == Completion::Stale));
    assert_eq!(session.active_stream().map(|s| s.label()), Some("cam1"));
    assert_eq!(host.open(), 1);
    assert_eq!(host.max_open(), 1);
}

#[tokio::test]
async fn enumeration_failure_leaves_only_default() {
    let host = FakeHost::failing_enumeration(MediaError::PermissionDenied("video".into()));
    let mut session = session(&host);

    let report = session.init().await.expect("first init runs");
    assert!(matches!(report.devices, Err(MediaError::PermissionDenied(_))));
    assert!(matches!(report.stream, Completion::Activated(_)));

    assert_eq!(labels(&session), ["Default"]);
    assert!(
        session
            .notifier()
            .notices
            .iter()
            .any(|n| matches!(n, Notice::EnumerationFailed(_)))
    );
}

#[tokio::test]
async fn default_failure_still_lists_devices() {
    let host = FakeHost::with_devices(vec![front(), back()]);
    host.fail(DEFAULT_KEY, MediaError::HardwareBusy("default".into()));
    let mut session = session(&host);

    let report = session.init().await.expect("first init runs");
    assert_eq!(report.devices, Ok(2));
    assert!(matches!(
        report.stream,
        Completion::Failed(MediaError::HardwareBusy(_))
    ));
    assert_eq!(labels(&session), ["Front", "Back", "Default"]);
    assert!(!session.is_active());
}

#[tokio::test]
async fn initial_device_is_opened_and_focused() {
    let host = FakeHost::with_devices(vec![front(), back()]);
    let mut session = session(&host).with_initial(SelectedDevice::Device(back()));

    let report = session.init().await.expect("first init runs");
    assert!(matches!(report.stream, Completion::Activated(_)));
    assert!(host.position("get_stream:cam2").is_some());
    assert_eq!(
        session.selection().current().map(|e| e.label.as_str()),
        Some("Back")
    );
}

#[tokio::test]
async fn shutdown_releases_the_camera() {
    let host = FakeHost::with_devices(vec![front()]);
    let mut session = session(&host);
    session.init().await;
    assert_eq!(host.open(), 1);

    session.shutdown();
    assert_eq!(host.open(), 0);
    assert_eq!(session.sink().bound, None);
    assert!(!session.is_active());
}

#[tokio::test]
async fn dropping_the_session_releases_the_camera() {
    let host = FakeHost::with_devices(vec![front()]);
    {
        let mut session = session(&host);
        session.init().await;
        assert_eq!(host.open(), 1);
    }
    assert_eq!(host.open(), 0);
}

#[tokio::test]
async fn completion_after_shutdown_is_discarded() {
    let host = FakeHost::with_devices(vec![front()]);
    let mut session = session(&host);
    session.init().await;

    let request = session.select(SelectedDevice::Device(front()));
    session.shutdown();

    assert_eq!(session.handle_event(request.await), Completion::Stale);
    assert_eq!(host.open(), 0);
    assert_eq!(session.sink().bound, None);
}
