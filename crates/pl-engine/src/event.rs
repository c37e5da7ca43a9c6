//! Events observed by the tutorial.

use pl_core::{ControlKey, Snapshot};

use crate::gate::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A change was accepted; `snapshot` is the full state after it.
    ValueChanged {
        key: ControlKey,
        value: String,
        snapshot: Snapshot,
    },
    ButtonPressed { action: Action },
    NavKey { direction: Direction },
}
