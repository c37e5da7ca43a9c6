//! What the engine asks of the outside world.
//!
//! The engine never touches widgets, bitmaps or audio devices. It issues
//! abstract display and playback commands to a host implementing
//! [`Presenter`], [`AudioSink`] and [`SettingsStore`].

use pl_core::ControlKey;
use pl_dataset::Equipment;
use pl_settings::{MemoryStore, Settings, SettingsResult, SettingsStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDescriptor {
    /// One of the overview photographs. `water_flowing` selects the water
    /// variant, which only exists for the first one.
    Overview { index: usize, water_flowing: bool },
    /// Close-up photograph of one equipment item.
    Equipment { equipment: Equipment, image: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    TutorialStep(usize),
    EquipmentTable(Equipment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub position: (i32, i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundChannel {
    Pump,
    Water,
}

pub trait Presenter {
    fn show_panel(&mut self, key: &ControlKey, visible: bool);
    fn set_display_value(&mut self, key: &ControlKey, value: &str);
    fn set_tooltip(&mut self, key: &ControlKey, text: &str);
    fn show_buttons(&mut self, visible: bool);
    fn select_image(&mut self, image: &ImageDescriptor);
    fn draw_overlay(&mut self, overlay: &Overlay);
    fn clear_overlay(&mut self);
    fn status(&mut self, message: &StatusMessage);
}

/// Fire-and-forget playback control.
pub trait AudioSink {
    fn set_playback(&mut self, channel: SoundChannel, playing: bool);
    /// `gain` in 0.0..=1.0.
    fn set_volume(&mut self, channel: SoundChannel, gain: f32);
}

pub trait Host: Presenter + AudioSink + SettingsStore {}

impl<T: Presenter + AudioSink + SettingsStore> Host for T {}

/// One command received by a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    ShowPanel(ControlKey, bool),
    DisplayValue(ControlKey, String),
    Tooltip(ControlKey, String),
    ShowButtons(bool),
    SelectImage(ImageDescriptor),
    DrawOverlay(Overlay),
    ClearOverlay,
    Status(StatusMessage),
    Playback(SoundChannel, bool),
    Volume(SoundChannel, f32),
}

/// Host that records every command in order; settings stay in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
    pub store: MemoryStore,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            calls: Vec::new(),
            store: MemoryStore {
                settings,
                persist_count: 0,
            },
        }
    }

    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }

    /// Most recent playback state of `channel`.
    pub fn playing(&self, channel: SoundChannel) -> Option<bool> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::Playback(c, playing) if *c == channel => Some(*playing),
            _ => None,
        })
    }

    pub fn last_image(&self) -> Option<&ImageDescriptor> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::SelectImage(image) => Some(image),
            _ => None,
        })
    }

    pub fn last_status(&self) -> Option<&StatusMessage> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::Status(message) => Some(message),
            _ => None,
        })
    }

    pub fn buttons_visible(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::ShowButtons(visible) => Some(*visible),
            _ => None,
        })
    }
}

impl Presenter for RecordingHost {
    fn show_panel(&mut self, key: &ControlKey, visible: bool) {
        self.calls.push(HostCall::ShowPanel(key.clone(), visible));
    }

    fn set_display_value(&mut self, key: &ControlKey, value: &str) {
        self.calls
            .push(HostCall::DisplayValue(key.clone(), value.to_string()));
    }

    fn set_tooltip(&mut self, key: &ControlKey, text: &str) {
        self.calls.push(HostCall::Tooltip(key.clone(), text.to_string()));
    }

    fn show_buttons(&mut self, visible: bool) {
        self.calls.push(HostCall::ShowButtons(visible));
    }

    fn select_image(&mut self, image: &ImageDescriptor) {
        self.calls.push(HostCall::SelectImage(image.clone()));
    }

    fn draw_overlay(&mut self, overlay: &Overlay) {
        self.calls.push(HostCall::DrawOverlay(*overlay));
    }

    fn clear_overlay(&mut self) {
        self.calls.push(HostCall::ClearOverlay);
    }

    fn status(&mut self, message: &StatusMessage) {
        self.calls.push(HostCall::Status(message.clone()));
    }
}

impl AudioSink for RecordingHost {
    fn set_playback(&mut self, channel: SoundChannel, playing: bool) {
        self.calls.push(HostCall::Playback(channel, playing));
    }

    fn set_volume(&mut self, channel: SoundChannel, gain: f32) {
        self.calls.push(HostCall::Volume(channel, gain));
    }
}

impl SettingsStore for RecordingHost {
    fn settings(&self) -> &Settings {
        self.store.settings()
    }

    fn settings_mut(&mut self) -> &mut Settings {
        self.store.settings_mut()
    }

    fn persist(&mut self) -> SettingsResult<()> {
        self.store.persist()
    }
}
