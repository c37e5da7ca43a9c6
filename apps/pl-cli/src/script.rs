//! Replay scripts: one session command per line.
//!
//! ```text
//! # comments and blank lines are skipped
//! motor on
//! set abertura 50
//! panel flow_meter
//! zoom pump
//! next
//! tutorial start
//! ```

use pl_dataset::Equipment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { key: String, value: String },
    Motor(bool),
    Panel(Equipment),
    Close(String),
    Zoom(Equipment),
    Next,
    Prev,
    TutorialStart,
    TutorialEnd,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based.
    pub line: usize,
    pub command: Command,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    text.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            Some(
                parse_command(trimmed)
                    .map(|command| ScriptLine {
                        line: i + 1,
                        command,
                    })
                    .map_err(|message| ScriptError {
                        line: i + 1,
                        message,
                    }),
            )
        })
        .collect()
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match (verb, args.as_slice()) {
        // Values such as "890 (50)" contain spaces.
        ("set", [key, rest @ ..]) if !rest.is_empty() => Ok(Command::Set {
            key: key.to_string(),
            value: rest.join(" "),
        }),
        ("motor", ["on"]) => Ok(Command::Motor(true)),
        ("motor", ["off"]) => Ok(Command::Motor(false)),
        ("panel", [equipment]) => Ok(Command::Panel(equipment.parse()?)),
        ("close", [key]) => Ok(Command::Close(key.to_string())),
        ("zoom", [equipment]) => Ok(Command::Zoom(equipment.parse()?)),
        ("next", []) => Ok(Command::Next),
        ("prev", []) => Ok(Command::Prev),
        ("tutorial", ["start"]) => Ok(Command::TutorialStart),
        ("tutorial", ["end"]) => Ok(Command::TutorialEnd),
        ("clear", []) => Ok(Command::Clear),
        _ => Err(format!("cannot parse '{line}'")),
    }
}
