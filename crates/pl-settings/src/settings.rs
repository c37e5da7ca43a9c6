//! Typed user preferences and their flat `key = value` text form.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

pub const SETTINGS_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_HOVER_COLOR: u32 = 14_120_448;
pub const MAX_COLOR: u32 = 0xFF_FFFF;
pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    #[default]
    TransparentBorder,
    Gradient,
    RoundedBorders,
    SquareBorders,
}

impl ButtonStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonStyle::TransparentBorder => "transparent-border",
            ButtonStyle::Gradient => "gradient",
            ButtonStyle::RoundedBorders => "rounded-borders",
            ButtonStyle::SquareBorders => "square-borders",
        }
    }
}

impl fmt::Display for ButtonStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ButtonStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "transparent-border" | "Borda transparente" => Ok(ButtonStyle::TransparentBorder),
            "gradient" | "Cor gradiente" => Ok(ButtonStyle::Gradient),
            "rounded-borders" | "Bordas redondas" => Ok(ButtonStyle::RoundedBorders),
            "square-borders" | "Bordas quadradas" => Ok(ButtonStyle::SquareBorders),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonBackground {
    #[default]
    White,
    Blue,
}

impl ButtonBackground {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonBackground::White => "white",
            ButtonBackground::Blue => "blue",
        }
    }
}

impl fmt::Display for ButtonBackground {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ButtonBackground {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "white" | "Branco" => Ok(ButtonBackground::White),
            "blue" | "Azul" => Ok(ButtonBackground::Blue),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub version: String,
    pub button_style: ButtonStyle,
    pub button_background: ButtonBackground,
    pub button_hover_color: u32,
    pub tooltip_content: bool,
    pub init_maximized: bool,
    pub sound_active: bool,
    /// 0..=100
    pub volume: u8,
    pub tutorial_completed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION.to_string(),
            button_style: ButtonStyle::default(),
            button_background: ButtonBackground::default(),
            button_hover_color: DEFAULT_HOVER_COLOR,
            tooltip_content: true,
            init_maximized: false,
            sound_active: true,
            volume: 25,
            tutorial_completed: false,
        }
    }
}

/// Why a single line was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoSeparator,
    UnknownKey,
    BadValue,
}

impl Settings {
    /// Parse the text form, starting from the defaults.
    ///
    /// Never fails: lines without `=`, unknown keys and malformed values are
    /// skipped and the affected option keeps its default.
    pub fn parse(text: &str) -> Self {
        let mut settings = Settings::default();
        for (n, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(reason) = settings.apply_line(line) {
                warn!(line = n + 1, text = line, ?reason, "settings line skipped");
            }
        }
        settings
    }

    /// Apply one `key = value` line.
    pub fn apply_line(&mut self, line: &str) -> Result<(), SkipReason> {
        let (key, value) = line.split_once('=').ok_or(SkipReason::NoSeparator)?;
        self.set(key.trim(), value.trim())
    }

    /// Set one option from its textual key and value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SkipReason> {
        match key {
            "version" => self.version = value.to_string(),
            "buttonStyle" => {
                self.button_style = value.parse().map_err(|_| SkipReason::BadValue)?;
            }
            "buttonBackgroundColor" => {
                self.button_background = value.parse().map_err(|_| SkipReason::BadValue)?;
            }
            "buttonHoverColor" => {
                let color: u32 = value.parse().map_err(|_| SkipReason::BadValue)?;
                if color > MAX_COLOR {
                    return Err(SkipReason::BadValue);
                }
                self.button_hover_color = color;
            }
            "tooltipContent" => self.tooltip_content = parse_flag(value)?,
            "initMaximized" => self.init_maximized = parse_flag(value)?,
            "soundActive" => self.sound_active = parse_flag(value)?,
            "volume" => {
                let volume: i64 = value.parse().map_err(|_| SkipReason::BadValue)?;
                self.volume = volume.clamp(0, MAX_VOLUME as i64) as u8;
            }
            "tutorialCompleted" => self.tutorial_completed = parse_flag(value)?,
            // Older files stored "show the tutorial on start" instead.
            "tutorial" => self.tutorial_completed = !parse_flag(value)?,
            _ => return Err(SkipReason::UnknownKey),
        }
        debug!(key, value, "setting applied");
        Ok(())
    }

    /// Text form, one `key = value` per line, no trailing newline.
    pub fn to_file_string(&self) -> String {
        [
            format!("version = {}", self.version),
            format!("buttonStyle = {}", self.button_style),
            format!("buttonBackgroundColor = {}", self.button_background),
            format!("buttonHoverColor = {}", self.button_hover_color),
            format!("tooltipContent = {}", u8::from(self.tooltip_content)),
            format!("initMaximized = {}", u8::from(self.init_maximized)),
            format!("soundActive = {}", u8::from(self.sound_active)),
            format!("volume = {}", self.volume),
            format!("tutorialCompleted = {}", u8::from(self.tutorial_completed)),
        ]
        .join("\n")
    }

    /// Volume as a 0.0..=1.0 gain.
    pub fn gain(&self) -> f32 {
        f32::from(self.volume) / f32::from(MAX_VOLUME)
    }
}

fn parse_flag(value: &str) -> Result<bool, SkipReason> {
    let n: i64 = value.parse().map_err(|_| SkipReason::BadValue)?;
    Ok(n != 0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn arbitrary_text_never_panics(text in ".{0,200}") {
            let _ = Settings::parse(&text);
        }

        #[test]
        fn any_volume_lands_in_range(v in any::<i32>()) {
            let s = Settings::parse(&format!("volume = {v}"));
            prop_assert!(s.volume <= MAX_VOLUME);
        }
    }
}
