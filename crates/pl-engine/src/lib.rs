//! pl-engine: state lookup, value propagation and the guided tour.
//!
//! Contains:
//! - table (the recorded states, order-checked)
//! - resolver (forward-scan lookup of a controllable tuple)
//! - registry (live control values and snapshots)
//! - gate (action permissions)
//! - tutorial (step state machine)
//! - host (presentation, audio and settings seams)
//! - session (the data flow tying it all together)

pub mod error;
pub mod event;
pub mod gate;
pub mod host;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod table;
pub mod tutorial;

pub use error::{EngineError, EngineResult};
pub use event::{Direction, Event};
pub use gate::{AccessGate, Action};
pub use host::{
    AudioSink, Host, HostCall, ImageDescriptor, Overlay, OverlayKind, Presenter, RecordingHost,
    SoundChannel, StatusKind, StatusMessage,
};
pub use registry::{ControlRegistry, ControlState};
pub use resolver::{Lookup, Resolution, ValueResolver};
pub use session::{Outcome, Session};
pub use table::StateTable;
pub use tutorial::{ImageMode, StepPolicy, Transition, TutorialEngine};
