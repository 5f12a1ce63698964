// SPDX-License-Identifier: GPL-3.0-only

//! Terminal camera preview
//!
//! Device list on the left, live feed on the right, rendered with ratatui.
//! Enumeration and acquisitions run on a tokio runtime; their results come
//! back over a channel and are applied on the UI loop, which never waits on
//! hardware.

mod sink;
mod widgets;

pub use sink::{PreviewSink, StatusNotifier};
pub use widgets::FrameWidget;

use crate::app::{CameraSession, Completion, SessionEvent};
use crate::backends::camera::{DeviceDescriptor, GstCameraHost, SelectedDevice};
use crate::config::Config;
use crate::constants::timing;
use crate::errors::{AppResult, MediaResult};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::future::BoxFuture;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use widgets::ScreenState;

type Session = CameraSession<PreviewSink, StatusNotifier>;
type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Run the terminal preview until the user quits.
///
/// `save_path` is where the last opened device is remembered; `None` leaves
/// the config file untouched.
pub fn run(config: Config, device: Option<String>, save_path: Option<PathBuf>) -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let mut terminal = setup_terminal()?;

    let result = run_app(&mut terminal, &runtime, config, device, save_path.as_deref());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Enter raw mode and the alternate screen. On failure the terminal is put
/// back the way it was.
fn setup_terminal() -> io::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    let entered = match execute!(stdout, EnterAlternateScreen) {
        Ok(()) => Terminal::new(CrosstermBackend::new(stdout)),
        Err(err) => Err(err),
    };

    entered.inspect_err(|err| {
        warn!(error = %err, "Terminal setup failed, restoring");
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    })
}

/// Results sent from runtime tasks to the UI loop
#[derive(Debug)]
enum UiEvent {
    Devices(MediaResult<Vec<DeviceDescriptor>>),
    Acquired(SessionEvent),
}

/// What a key press asks the UI loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Dismiss,
    Next,
    Previous,
    SelectCurrent,
    SelectDefault,
    None,
}

fn action_for(key: &KeyEvent, modal_open: bool) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if modal_open {
        return Action::Dismiss;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Down | KeyCode::Char('j') => Action::Next,
        KeyCode::Up | KeyCode::Char('k') => Action::Previous,
        KeyCode::Enter => Action::SelectCurrent,
        KeyCode::Char('d') => Action::SelectDefault,
        _ => Action::None,
    }
}

fn run_app(
    terminal: &mut Tui,
    runtime: &Runtime,
    mut config: Config,
    device: Option<String>,
    save_path: Option<&Path>,
) -> AppResult<()> {
    let host = Arc::new(GstCameraHost::from_config(&config));
    let mut session = CameraSession::new(host, PreviewSink::new(), StatusNotifier::new())
        .with_facing(config.default_facing);
    if let Some(id) = device.as_deref() {
        session = session.with_initial(SelectedDevice::Device(DeviceDescriptor::video(id, id)));
    }
    let restore_cursor = device.is_none();

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();

    if let Some(requests) = session.begin_init() {
        spawn_listing(runtime, &events_tx, requests.devices);
        spawn_request(runtime, &events_tx, requests.stream);
    }

    loop {
        apply_events(
            &mut session,
            &mut events_rx,
            &mut config,
            restore_cursor,
            save_path,
        );
        session.sink_mut().drain_frames();
        draw(terminal, &session)?;

        if !event::poll(Duration::from_millis(timing::UI_POLL_MS))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match action_for(&key, session.notifier().modal().is_some()) {
            Action::Quit => break,
            Action::Dismiss => session.notifier_mut().dismiss(),
            Action::Next => session.selection_mut().next(),
            Action::Previous => session.selection_mut().previous(),
            Action::SelectCurrent => {
                if let Some(request) = session.select_current() {
                    spawn_request(runtime, &events_tx, request);
                }
            }
            Action::SelectDefault => {
                let request = session.select(SelectedDevice::Default);
                spawn_request(runtime, &events_tx, request);
            }
            Action::None => {}
        }
    }

    info!("Leaving terminal preview");
    session.shutdown();
    Ok(())
}

fn spawn_request(
    runtime: &Runtime,
    events: &UnboundedSender<UiEvent>,
    request: BoxFuture<'static, SessionEvent>,
) {
    let events = events.clone();
    runtime.spawn(async move {
        // If the UI is gone the event is dropped, which stops its stream
        if events.send(UiEvent::Acquired(request.await)).is_err() {
            debug!("UI closed before acquisition completed");
        }
    });
}

fn spawn_listing(
    runtime: &Runtime,
    events: &UnboundedSender<UiEvent>,
    listing: BoxFuture<'static, MediaResult<Vec<DeviceDescriptor>>>,
) {
    let events = events.clone();
    runtime.spawn(async move {
        if events.send(UiEvent::Devices(listing.await)).is_err() {
            debug!("UI closed before enumeration completed");
        }
    });
}

fn apply_events(
    session: &mut Session,
    events: &mut UnboundedReceiver<UiEvent>,
    config: &mut Config,
    restore_cursor: bool,
    save_path: Option<&Path>,
) {
    while let Ok(event) = events.try_recv() {
        match event {
            UiEvent::Devices(listed) => {
                let devices = session.apply_devices(listed);
                debug!(devices = ?devices, "Device list applied");
                if restore_cursor && let Some(last) = config.last_device_id.as_deref() {
                    session.selection_mut().focus_device(last);
                }
            }
            UiEvent::Acquired(event) => {
                let device_id = event.choice().device_id().map(str::to_string);
                if let Completion::Activated(_) = session.handle_event(event) {
                    remember_device(config, device_id.as_deref(), save_path);
                }
            }
        }
    }
}

/// Record the last opened device so the cursor starts there next time.
/// Saved to `save_path` when there is one.
fn remember_device(config: &mut Config, device_id: Option<&str>, save_path: Option<&Path>) {
    let Some(id) = device_id else {
        return;
    };
    if config.last_device_id.as_deref() == Some(id) {
        return;
    }
    config.last_device_id = Some(id.to_string());

    let Some(path) = save_path else {
        debug!(device = %id, "Config not saved");
        return;
    };
    if let Err(err) = config.save_to(path) {
        warn!(error = %err, "Failed to save config");
    }
}

fn draw(terminal: &mut Tui, session: &Session) -> io::Result<()> {
    let sink = session.sink();
    let notifier = session.notifier();
    let state = ScreenState {
        selection: session.selection(),
        frame: sink.latest_frame(),
        stream_label: sink.label(),
        acquiring: session.is_acquiring(),
        status: notifier.status(),
        modal: notifier.modal(),
    };
    terminal.draw(|f| widgets::draw(f, &state))?;
    Ok(())
}
