//! The guided tour: a state machine over 21 numbered steps.
//!
//! Each step carries its allowed actions and overlay coordinates in the
//! dataset; the image shown is a fixed function of the step number.

use pl_core::ControlKey;
use pl_dataset::{Dataset, Equipment, TUTORIAL_STEP_COUNT, TutorialStep};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::event::{Direction, Event};
use crate::gate::Action;

pub const LAST_STEP: usize = TUTORIAL_STEP_COUNT - 1;

/// Step where switching the motor on moves the tour forward.
pub const MOTOR_STEP: usize = 14;
/// Step where opening the valve moves the tour forward.
pub const VALVE_STEP: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// First overview photograph, control buttons hidden.
    Overview,
    /// Close-up of one equipment item.
    Zoomed(Equipment),
    /// First overview photograph with the buttons shown and usable.
    Interactive,
    /// First overview photograph; buttons stay as the previous step left them.
    InteractiveOverview,
}

pub fn image_mode(step: usize) -> ImageMode {
    match step {
        4 | 5 => ImageMode::Zoomed(Equipment::Piezometer),
        7 => ImageMode::Zoomed(Equipment::VacuumGauge),
        8 => ImageMode::Zoomed(Equipment::ElectricMotor),
        9 => ImageMode::Zoomed(Equipment::Pump),
        10 => ImageMode::Zoomed(Equipment::PressureGauge),
        11 => ImageMode::Zoomed(Equipment::FlowMeter),
        13 => ImageMode::Zoomed(Equipment::BallValve),
        14 | 15 => ImageMode::Interactive,
        16..=18 => ImageMode::InteractiveOverview,
        _ => ImageMode::Overview,
    }
}

/// Everything the host must apply when the tour lands on a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPolicy {
    pub step: usize,
    pub allowed: Vec<Action>,
    pub image: ImageMode,
    pub coordinates: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The tour is still running. The policy is re-applied even when the
    /// step did not move.
    Step {
        policy: StepPolicy,
        moved: bool,
        /// Further edits of the hook control must be disabled.
        lock_hook: bool,
    },
    /// The last step was acknowledged; the caller must run the end sequence.
    Finished,
}

#[derive(Debug, Clone)]
pub struct TutorialEngine {
    steps: Vec<TutorialStep>,
    hook: ControlKey,
    valve: ControlKey,
    current: Option<usize>,
}

impl TutorialEngine {
    pub fn new(steps: Vec<TutorialStep>, hook: ControlKey, valve: ControlKey) -> EngineResult<Self> {
        if steps.len() != TUTORIAL_STEP_COUNT {
            return Err(EngineError::InvalidArg {
                what: "tutorial needs exactly 21 steps",
            });
        }
        Ok(Self {
            steps,
            hook,
            valve,
            current: None,
        })
    }

    pub fn from_dataset(dataset: &Dataset) -> EngineResult<Self> {
        Self::new(
            dataset.tutorial.clone(),
            dataset.controls.hook_key.clone(),
            dataset.controls.valve_key.clone(),
        )
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn step(&self) -> Option<usize> {
        self.current
    }

    /// Enter step 0.
    pub fn start(&mut self) -> StepPolicy {
        self.current = Some(0);
        info!("tutorial started");
        self.policy(0)
    }

    /// Leave the tour. Returns whether it was running.
    pub fn finish(&mut self) -> bool {
        let was_active = self.current.take().is_some();
        if was_active {
            info!("tutorial finished");
        }
        was_active
    }

    /// Feed one event. `None` while inactive.
    pub fn notify(&mut self, event: &Event) -> Option<Transition> {
        let step = self.current?;
        if step == LAST_STEP {
            self.current = None;
            return Some(Transition::Finished);
        }

        let mut lock_hook = false;
        let next = match event {
            Event::ValueChanged { snapshot, .. } => {
                let positive = |key: &ControlKey| snapshot.numeric(key.as_str()).is_some_and(|v| v > 0.0);
                if step == MOTOR_STEP && positive(&self.hook) {
                    lock_hook = true;
                    step + 1
                } else if step == VALVE_STEP && positive(&self.valve) {
                    step + 1
                } else {
                    step
                }
            }
            Event::ButtonPressed { .. } if step > VALVE_STEP => step + 1,
            Event::ButtonPressed { .. } => step,
            Event::NavKey {
                direction: Direction::Right,
            } => step + 1,
            Event::NavKey {
                direction: Direction::Left,
            } => step.saturating_sub(1),
        };

        self.current = Some(next);
        debug!(from = step, to = next, ?event, "tutorial notified");
        Some(Transition::Step {
            policy: self.policy(next),
            moved: next != step,
            lock_hook,
        })
    }

    pub fn policy(&self, step: usize) -> StepPolicy {
        let data = self.steps.get(step);
        StepPolicy {
            step,
            allowed: data
                .map(|s| s.allowed_clicks.iter().filter_map(|&id| Action::from_id(id)).collect())
                .unwrap_or_default(),
            image: image_mode(step),
            coordinates: data.map(|s| s.coordinates).unwrap_or_default(),
        }
    }
}
