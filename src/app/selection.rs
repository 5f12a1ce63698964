// SPDX-License-Identifier: GPL-3.0-only

//! Device selection entries
//!
//! One entry per video input in host order, followed by the "Default" entry.

use crate::backends::camera::{DeviceDescriptor, SelectedDevice};
use crate::constants::DEFAULT_ENTRY_LABEL;

/// A selectable row in the device list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub label: String,
    /// `"<id> - <kind> - <label>"`
    pub detail: String,
    pub choice: SelectedDevice,
}

impl SelectionEntry {
    fn device(descriptor: &DeviceDescriptor) -> Self {
        Self {
            label: descriptor.display_label().to_string(),
            detail: descriptor.detail(),
            choice: SelectedDevice::Device(descriptor.clone()),
        }
    }

    fn default_entry() -> Self {
        Self {
            label: DEFAULT_ENTRY_LABEL.to_string(),
            detail: String::new(),
            choice: SelectedDevice::Default,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self.choice, SelectedDevice::Default)
    }
}

/// Build the selection entries for an enumeration result
pub fn build_entries(devices: &[DeviceDescriptor]) -> Vec<SelectionEntry> {
    devices
        .iter()
        .filter(|d| d.is_video())
        .map(SelectionEntry::device)
        .chain(std::iter::once(SelectionEntry::default_entry()))
        .collect()
}

/// Selection entries plus a keyboard cursor
#[derive(Debug, Clone)]
pub struct SelectionList {
    entries: Vec<SelectionEntry>,
    cursor: usize,
}

impl Default for SelectionList {
    fn default() -> Self {
        Self::default_only()
    }
}

impl SelectionList {
    pub fn new(devices: &[DeviceDescriptor]) -> Self {
        Self {
            entries: build_entries(devices),
            cursor: 0,
        }
    }

    /// List holding only the "Default" entry, used when enumeration fails
    pub fn default_only() -> Self {
        Self::new(&[])
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&SelectionEntry> {
        self.entries.get(self.cursor)
    }

    pub fn next(&mut self) {
        if !self.entries.is_empty() {
            self.cursor = (self.cursor + 1) % self.entries.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.entries.is_empty() {
            self.cursor = (self.cursor + self.entries.len() - 1) % self.entries.len();
        }
    }

    /// Move the cursor to the entry for `choice`. Returns false if absent.
    pub fn focus(&mut self, choice: &SelectedDevice) -> bool {
        match choice {
            SelectedDevice::Default => self.focus_default(),
            SelectedDevice::Device(d) => self.focus_device(&d.id),
        }
    }

    /// Move the cursor to the device with `id`. Returns false if absent.
    pub fn focus_device(&mut self, id: &str) -> bool {
        match self
            .entries
            .iter()
            .position(|e| e.choice.device_id() == Some(id))
        {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    pub fn focus_default(&mut self) -> bool {
        match self.entries.iter().position(SelectionEntry::is_default) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::DeviceKind;

    fn devices() -> Vec<DeviceDescriptor> {
        vec![
            DeviceDescriptor::new("mic0", DeviceKind::AudioInput, "Microphone"),
            DeviceDescriptor::video("cam1", "Front"),
            DeviceDescriptor::new("meta", DeviceKind::Unknown, "Metadata"),
            DeviceDescriptor::video("cam2", ""),
        ]
    }

    #[test]
    fn entries_keep_host_order_and_end_with_default() {
        let entries = build_entries(&devices());
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Front", "cam2", DEFAULT_ENTRY_LABEL]);
        assert_eq!(entries[0].detail, "cam1 - videoinput - Front");
        assert!(entries[2].is_default());
    }

    #[test]
    fn empty_enumeration_gives_only_default() {
        let list = SelectionList::default_only();
        assert_eq!(list.len(), 1);
        assert_eq!(list.current().map(|e| &e.choice), Some(&SelectedDevice::Default));
    }

    #[test]
    fn cursor_wraps_around() {
        let mut list = SelectionList::new(&devices());
        list.previous();
        assert!(list.current().is_some_and(SelectionEntry::is_default));
        list.next();
        assert_eq!(list.cursor(), 0);
        list.next();
        list.next();
        list.next();
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn focus_finds_devices_by_id() {
        let mut list = SelectionList::new(&devices());
        assert!(list.focus_device("cam2"));
        assert_eq!(list.cursor(), 1);
        assert!(!list.focus_device("mic0"));
        assert_eq!(list.cursor(), 1);
        assert!(list.focus(&SelectedDevice::Default));
        assert_eq!(list.cursor(), 2);
    }
}
