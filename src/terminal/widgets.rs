// SPDX-License-Identifier: GPL-3.0-only

//! Widgets for the terminal preview
//!
//! Frames are drawn with Unicode half-blocks: each cell shows two vertical
//! pixels, the upper one as foreground and the lower one as background.

use crate::app::SelectionList;
use crate::backends::camera::CameraFrame;
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph, Widget, Wrap},
};

/// Width of the device list column
const LIST_WIDTH: u16 = 32;

const KEY_HINTS: &str = "↑/↓ move | Enter open | d default | q quit";

/// Everything the screen shows, borrowed from the session for one draw
pub struct ScreenState<'a> {
    pub selection: &'a SelectionList,
    pub frame: Option<&'a CameraFrame>,
    pub stream_label: Option<&'a str>,
    pub acquiring: bool,
    pub status: &'a str,
    pub modal: Option<&'a str>,
}

pub fn draw(f: &mut Frame, state: &ScreenState) {
    let [main, status_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(f.area());
    let [list_area, preview_area] =
        Layout::horizontal([Constraint::Length(LIST_WIDTH), Constraint::Min(0)]).areas(main);

    render_device_list(f, list_area, state.selection);

    let title = state.stream_label.unwrap_or("No camera");
    let block = Block::bordered().title(Line::from(format!(" {} ", title)));
    let inner = block.inner(preview_area);
    f.render_widget(block, preview_area);

    let placeholder = if state.acquiring {
        "Opening camera..."
    } else if state.stream_label.is_some() {
        "Waiting for camera..."
    } else {
        "No camera selected"
    };
    f.render_widget(
        FrameWidget {
            frame: state.frame,
            placeholder,
        },
        inner,
    );

    f.render_widget(StatusBar { message: state.status }, status_area);

    if let Some(message) = state.modal {
        render_error_modal(f, main, message);
    }
}

fn render_device_list(f: &mut Frame, area: Rect, selection: &SelectionList) {
    let items: Vec<ListItem> = selection
        .entries()
        .iter()
        .map(|entry| ListItem::new(entry.label.as_str()))
        .collect();

    let list = List::new(items)
        .block(Block::bordered().title(" Cameras "))
        .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut list_state = ListState::default().with_selected(Some(selection.cursor()));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_error_modal(f: &mut Frame, area: Rect, message: &str) {
    let modal = centered(area, 60, 7);
    let text = vec![
        Line::from(message),
        Line::from(""),
        Line::from("Press any key to continue").style(Style::new().fg(Color::DarkGray)),
    ];
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(
            Block::bordered()
                .title(" Error ")
                .border_style(Style::new().fg(Color::Red)),
        );

    f.render_widget(Clear, modal);
    f.render_widget(paragraph, modal);
}

/// Rect of `percent_x` width and `height` rows centered in `area`
fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (area.width as u32 * percent_x as u32 / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

/// Renders a camera frame using half-block characters
pub struct FrameWidget<'a> {
    pub frame: Option<&'a CameraFrame>,
    pub placeholder: &'a str,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            let x = area.x + area.width.saturating_sub(self.placeholder.len() as u16) / 2;
            let y = area.y + area.height / 2;
            buf.set_string(x, y, self.placeholder, Style::default());
            return;
        };

        // Fit the frame, keeping its aspect ratio
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let w = term_height * frame_aspect;
            (w as u16, area.height)
        } else {
            let h = term_width / frame_aspect;
            (area.width, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + area.width.saturating_sub(display_width) / 2;
        let y_offset = area.y + area.height.saturating_sub(display_height) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

/// RGBA pixel at (x, y), clamped to the frame
fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let x = x.min(frame.width - 1);
    let y = y.min(frame.height - 1);
    let idx = (y * frame.stride + x * 4) as usize;

    match frame.data.get(idx..idx + 3) {
        Some(rgb) => Color::Rgb(rgb[0], rgb[1], rgb[2]),
        None => Color::Black,
    }
}

/// Bottom line: latest notice on the left, key hints on the right
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().bg(Color::DarkGray).fg(Color::White);

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_style(style);
            }
        }

        buf.set_stringn(area.x + 1, area.y, self.message, area.width as usize, style);

        let hints_len = KEY_HINTS.chars().count() as u16;
        let message_end = area.x + 1 + self.message.chars().count() as u16;
        if area.width > hints_len + 1 {
            let hints_x = area.x + area.width - hints_len - 1;
            if hints_x > message_end + 1 {
                buf.set_string(hints_x, area.y, KEY_HINTS, style);
            }
        }
    }
}
