//! Permission vector over the clickable actions.

use pl_dataset::{ACTION_COUNT, Equipment};
use tracing::debug;

/// Every gated action, by its numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PreviousImage,
    NextImage,
    Zoom(Equipment),
    /// Panel toggle button; the pump has none.
    Panel(Equipment),
    MotorOn,
    MotorOff,
}

/// Panel buttons in id order (ids 9..=14).
const PANEL_ORDER: [Equipment; 6] = [
    Equipment::BallValve,
    Equipment::FlowMeter,
    Equipment::ElectricMotor,
    Equipment::VacuumGauge,
    Equipment::PressureGauge,
    Equipment::Piezometer,
];

const ZOOM_BASE: usize = 2;
const PANEL_BASE: usize = 9;

impl Action {
    pub fn id(&self) -> usize {
        match self {
            Action::PreviousImage => 0,
            Action::NextImage => 1,
            Action::Zoom(equipment) => {
                ZOOM_BASE + Equipment::ALL.iter().position(|e| e == equipment).unwrap_or(0)
            }
            Action::Panel(equipment) => {
                PANEL_BASE + PANEL_ORDER.iter().position(|e| e == equipment).unwrap_or(0)
            }
            Action::MotorOn => 15,
            Action::MotorOff => 16,
        }
    }

    pub fn from_id(id: usize) -> Option<Self> {
        match id {
            0 => Some(Action::PreviousImage),
            1 => Some(Action::NextImage),
            2..=8 => Equipment::ALL.get(id - ZOOM_BASE).copied().map(Action::Zoom),
            9..=14 => PANEL_ORDER.get(id - PANEL_BASE).copied().map(Action::Panel),
            15 => Some(Action::MotorOn),
            16 => Some(Action::MotorOff),
            _ => None,
        }
    }

    /// The panel button of `equipment`, if it has one.
    pub fn panel(equipment: Equipment) -> Option<Self> {
        PANEL_ORDER
            .contains(&equipment)
            .then_some(Action::Panel(equipment))
    }

    pub fn all() -> impl Iterator<Item = Action> {
        (0..ACTION_COUNT).filter_map(Action::from_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGate {
    allowed: [bool; ACTION_COUNT],
}

impl Default for AccessGate {
    fn default() -> Self {
        Self {
            allowed: [true; ACTION_COUNT],
        }
    }
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_all(&mut self, allowed: bool) {
        self.allowed = [allowed; ACTION_COUNT];
    }

    pub fn set(&mut self, action: Action, allowed: bool) {
        if let Some(slot) = self.allowed.get_mut(action.id()) {
            *slot = allowed;
        }
    }

    pub fn is_allowed(&self, action: Action) -> bool {
        self.allowed.get(action.id()).copied().unwrap_or(false)
    }

    /// Deny everything, then allow exactly `actions`.
    pub fn allow_only(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.set_all(false);
        for action in actions {
            self.set(action, true);
        }
        debug!(allowed = ?self.allowed_ids(), "gate updated");
    }

    pub fn all_allowed(&self) -> bool {
        self.allowed.iter().all(|&a| a)
    }

    pub fn allowed_ids(&self) -> Vec<usize> {
        (0..ACTION_COUNT).filter(|&i| self.allowed[i]).collect()
    }
}
