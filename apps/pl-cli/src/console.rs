//! Terminal host: prints the display commands the engine issues.

use pl_core::ControlKey;
use pl_engine::{
    AudioSink, ImageDescriptor, Overlay, OverlayKind, Presenter, SoundChannel, StatusKind,
    StatusMessage,
};
use pl_settings::{Settings, SettingsResult, SettingsStore};

pub struct ConsoleHost<S: SettingsStore> {
    store: S,
    /// Print every display command, not only status lines.
    echo: bool,
}

impl<S: SettingsStore> ConsoleHost<S> {
    pub fn new(store: S, echo: bool) -> Self {
        Self { store, echo }
    }

    fn say(&self, line: String) {
        if self.echo {
            println!("  | {line}");
        }
    }
}

impl<S: SettingsStore> Presenter for ConsoleHost<S> {
    fn show_panel(&mut self, key: &ControlKey, visible: bool) {
        let verb = if visible { "open" } else { "close" };
        self.say(format!("panel {verb} {key}"));
    }

    fn set_display_value(&mut self, key: &ControlKey, value: &str) {
        self.say(format!("{key} = {value}"));
    }

    fn set_tooltip(&mut self, _key: &ControlKey, _text: &str) {}

    fn show_buttons(&mut self, visible: bool) {
        self.say(format!("buttons {}", if visible { "shown" } else { "hidden" }));
    }

    fn select_image(&mut self, image: &ImageDescriptor) {
        let line = match image {
            ImageDescriptor::Overview {
                index,
                water_flowing: true,
            } => format!("image overview #{index} (water flowing)"),
            ImageDescriptor::Overview { index, .. } => format!("image overview #{index}"),
            ImageDescriptor::Equipment { equipment, image } => {
                format!("image {} ({image})", equipment.label())
            }
        };
        self.say(line);
    }

    fn draw_overlay(&mut self, overlay: &Overlay) {
        let (x, y) = overlay.position;
        let line = match overlay.kind {
            OverlayKind::TutorialStep(step) => format!("overlay tutorial step {step} at ({x}, {y})"),
            OverlayKind::EquipmentTable(equipment) => {
                format!("overlay {} table at ({x}, {y})", equipment.label())
            }
        };
        self.say(line);
    }

    fn clear_overlay(&mut self) {
        self.say("overlay cleared".to_string());
    }

    fn status(&mut self, message: &StatusMessage) {
        let tag = match message.kind {
            StatusKind::Info => "info",
            StatusKind::Success => "ok",
            StatusKind::Error => "error",
        };
        println!("[{tag}] {}", message.text);
    }
}

impl<S: SettingsStore> AudioSink for ConsoleHost<S> {
    fn set_playback(&mut self, channel: SoundChannel, playing: bool) {
        if playing {
            self.say(format!("sound {channel:?} playing"));
        }
    }

    fn set_volume(&mut self, _channel: SoundChannel, _gain: f32) {}
}

impl<S: SettingsStore> SettingsStore for ConsoleHost<S> {
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
