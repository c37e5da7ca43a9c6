//! One running lab session: every component wired together.
//!
//! All operations run synchronously to completion. A value change flows
//! registry -> resolver -> registry -> change log -> tutorial, and the host
//! is updated only after the state has settled.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pl_core::{ControlKey, Snapshot};
use pl_dataset::{ControlsDef, Dataset, Equipment, EquipmentTable};
use pl_report::{ChangeLog, ExportFormat, PdfRenderer, ReportColumns, ensure_suffix};
use pl_settings::{MAX_VOLUME, SettingsStore};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::event::{Direction, Event};
use crate::gate::{AccessGate, Action};
use crate::host::{
    AudioSink, Host, ImageDescriptor, Overlay, OverlayKind, Presenter, SoundChannel, StatusMessage,
};
use crate::registry::ControlRegistry;
use crate::resolver::{Resolution, ValueResolver};
use crate::table::StateTable;
use crate::tutorial::{ImageMode, StepPolicy, Transition, TutorialEngine};

pub const MOTOR_PANEL_LOCKED: &str = "Switch the electric motor on to access its panel.";

/// What happened to a user request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The request changed nothing.
    Unchanged,
    /// The gate or a disabled control refused it.
    Denied,
}

pub struct Session<H: Host> {
    controls: ControlsDef,
    table: StateTable,
    resolver: ValueResolver,
    registry: ControlRegistry,
    log: ChangeLog,
    gate: AccessGate,
    tutorial: TutorialEngine,
    equipment: Vec<EquipmentTable>,
    host: H,
    overview_images: usize,
    image_index: usize,
    zoom: Option<Equipment>,
    open_panels: BTreeSet<ControlKey>,
    motor_on: bool,
    water_flowing: bool,
}

impl<H: Host> Session<H> {
    /// Build the session and push the initial state to `host`.
    ///
    /// `overview_images` is the number of overview photographs the host can
    /// cycle through. The guided tour starts right away unless the host's
    /// settings record it as completed.
    pub fn new(dataset: Dataset, host: H, overview_images: usize) -> EngineResult<Self> {
        let mut session = Self::without_tour(dataset, host, overview_images)?;
        if !session.host.settings().tutorial_completed {
            info!("tutorial not completed yet, starting it");
            session.init_tutorial()?;
        }
        Ok(session)
    }

    /// Like [`Session::new`] but never starts the tour by itself.
    pub fn without_tour(dataset: Dataset, host: H, overview_images: usize) -> EngineResult<Self> {
        if overview_images == 0 {
            return Err(EngineError::InvalidArg {
                what: "at least one overview image is required",
            });
        }
        let tutorial = TutorialEngine::from_dataset(&dataset)?;
        let Dataset {
            controls,
            states,
            equipment,
            ..
        } = dataset;
        let table = StateTable::from_controls(&controls, states)?;
        let registry = ControlRegistry::new(&controls);

        let mut session = Self {
            controls,
            table,
            resolver: ValueResolver::default(),
            registry,
            log: ChangeLog::new(),
            gate: AccessGate::new(),
            tutorial,
            equipment,
            host,
            overview_images,
            image_index: 0,
            zoom: None,
            open_panels: BTreeSet::new(),
            motor_on: false,
            water_flowing: false,
        };
        session.settle();
        session.apply_volume();
        let image = session.overview_image();
        session.host.select_image(&image);
        session.host.show_buttons(true);
        info!(
            controls = session.registry.iter().count(),
            states = session.table.len(),
            "session ready"
        );
        Ok(session)
    }

    // ---- accessors ----

    pub fn registry(&self) -> &ControlRegistry {
        &self.registry
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    pub fn log(&self) -> &ChangeLog {
        &self.log
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn tutorial(&self) -> &TutorialEngine {
        &self.tutorial
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn image_index(&self) -> usize {
        self.image_index
    }

    pub fn zoomed(&self) -> Option<Equipment> {
        self.zoom
    }

    pub fn is_panel_open(&self, key: &str) -> bool {
        self.open_panels.iter().any(|k| k.as_str() == key)
    }

    pub fn is_motor_on(&self) -> bool {
        self.motor_on
    }

    pub fn is_water_flowing(&self) -> bool {
        self.water_flowing
    }

    pub fn report_columns(&self) -> ReportColumns {
        self.registry.report_columns()
    }

    /// Look up the state `key = value` would produce, without applying it.
    pub fn preview(&self, key: &ControlKey, value: &str) -> Resolution<'_> {
        self.resolver
            .resolve(&self.table, key, value, &self.registry.controllable_snapshot())
    }

    // ---- value changes ----

    /// A value typed or picked in a control panel.
    pub fn set_value(&mut self, key: &str, value: &str) -> EngineResult<Outcome> {
        let control = self
            .registry
            .get(key)
            .ok_or_else(|| EngineError::UnknownControl {
                key: key.to_string(),
            })?;
        if !control.is_controllable() {
            return Err(EngineError::NotControllable {
                key: key.to_string(),
            });
        }
        let enabled = control.is_enabled();
        let action = Action::panel(control.spec().equipment);

        if !enabled {
            self.host
                .status(&StatusMessage::info(format!("'{key}' is locked right now.")));
            return Ok(Outcome::Denied);
        }
        if action.is_some_and(|a| !self.gate.is_allowed(a)) {
            debug!(key, "panel edit denied by gate");
            return Ok(Outcome::Denied);
        }
        self.apply_change(key, value)
    }

    fn apply_change(&mut self, key: &str, value: &str) -> EngineResult<Outcome> {
        let before = self.registry.snapshot();
        if !self.registry.set_value(key, value)? {
            debug!(key, value, "value unchanged");
            return Ok(Outcome::Unchanged);
        }
        self.settle();

        let after = self.registry.snapshot();
        let changed = ControlKey::from(key);
        let canonical = after.get(key).unwrap_or(value).to_string();
        self.log.take_note(&before, &changed, &canonical, &after);

        self.notify_tutorial(Event::ValueChanged {
            key: changed,
            value: canonical,
            snapshot: after,
        })?;
        Ok(Outcome::Applied)
    }

    /// Resolve the current controllable values and push the result out.
    fn settle(&mut self) {
        let controllable = self.registry.controllable_snapshot();
        let resolution = self.resolver.resolve_snapshot(&self.table, &controllable);
        if let Some(record) = resolution.record() {
            self.registry.apply_derived(record);
        }
        if resolution.hook_off {
            self.motor_on = false;
            let hook = self.controls.hook_key.clone();
            self.hide_panel(&hook);
        }

        for control in self.registry.iter() {
            self.host.set_display_value(control.key(), control.value());
        }
        self.push_tooltips();
        self.update_sound();
    }

    fn push_tooltips(&mut self) {
        let show = self.host.settings().tooltip_content;
        for control in self.registry.iter() {
            let text = if show {
                format!("{} {}", control.value(), control.spec().unit)
            } else {
                String::new()
            };
            self.host.set_tooltip(control.key(), &text);
        }
    }

    fn update_sound(&mut self) {
        let positive = |key: &ControlKey| {
            self.registry
                .numeric(key.as_str())
                .is_some_and(|v| v > 0.0)
        };
        let running = positive(&self.controls.hook_key);
        let flowing = running && positive(&self.controls.valve_key);

        if flowing != self.water_flowing {
            self.water_flowing = flowing;
            if self.zoom.is_none() {
                let image = self.overview_image();
                self.host.select_image(&image);
            }
        }

        let active = self.host.settings().sound_active;
        self.host.set_playback(SoundChannel::Pump, active && running);
        self.host.set_playback(SoundChannel::Water, active && flowing);
    }

    fn apply_volume(&mut self) {
        let gain = self.host.settings().gain();
        self.host.set_volume(SoundChannel::Pump, gain / 5.0);
        self.host.set_volume(SoundChannel::Water, gain);
    }

    // ---- buttons ----

    /// Toggle the control panel of `equipment`.
    pub fn press_panel_button(&mut self, equipment: Equipment) -> EngineResult<Outcome> {
        let action = Action::panel(equipment).ok_or(EngineError::InvalidArg {
            what: "equipment has no panel button",
        })?;
        if !self.gate.is_allowed(action) {
            return Ok(Outcome::Denied);
        }
        self.notify_tutorial(Event::ButtonPressed { action })?;

        let key = self
            .registry
            .by_equipment(equipment)
            .map(|c| c.key().clone())
            .ok_or_else(|| EngineError::UnknownControl {
                key: equipment.label().to_string(),
            })?;
        if self.open_panels.contains(&key) {
            self.hide_panel(&key);
        } else if key == self.controls.hook_key && !self.motor_on {
            self.host.status(&StatusMessage::error(MOTOR_PANEL_LOCKED));
        } else {
            self.show_panel(&key);
        }
        Ok(Outcome::Applied)
    }

    pub fn close_panel(&mut self, key: &str) {
        let key = ControlKey::from(key);
        self.hide_panel(&key);
    }

    fn show_panel(&mut self, key: &ControlKey) {
        self.open_panels.insert(key.clone());
        self.host.show_panel(key, true);
    }

    fn hide_panel(&mut self, key: &ControlKey) {
        if self.open_panels.remove(key) {
            self.host.show_panel(key, false);
        }
    }

    pub fn motor_on(&mut self) -> EngineResult<Outcome> {
        if !self.gate.is_allowed(Action::MotorOn) {
            return Ok(Outcome::Denied);
        }
        self.motor_on = true;
        let hook = self.controls.hook_key.clone();
        if self.registry.numeric(hook.as_str()) != Some(0.0) {
            return Ok(Outcome::Unchanged);
        }
        let on_value = self.controls.motor_on_value.display();
        self.show_panel(&hook);
        self.apply_change(hook.as_str(), &on_value)
    }

    pub fn motor_off(&mut self) -> EngineResult<Outcome> {
        if !self.gate.is_allowed(Action::MotorOff) {
            return Ok(Outcome::Denied);
        }
        self.motor_on = false;
        let hook = self.controls.hook_key.clone();
        if self.registry.numeric(hook.as_str()) == Some(0.0) {
            return Ok(Outcome::Unchanged);
        }
        let baseline = self
            .registry
            .get(hook.as_str())
            .and_then(|c| c.baseline())
            .ok_or_else(|| EngineError::UnknownControl {
                key: hook.to_string(),
            })?;
        self.hide_panel(&hook);
        self.apply_change(hook.as_str(), &baseline)
    }

    // ---- images ----

    pub fn next_image(&mut self) -> EngineResult<Outcome> {
        self.navigate(Direction::Right)
    }

    pub fn previous_image(&mut self) -> EngineResult<Outcome> {
        self.navigate(Direction::Left)
    }

    fn navigate(&mut self, direction: Direction) -> EngineResult<Outcome> {
        let action = match direction {
            Direction::Left => Action::PreviousImage,
            Direction::Right => Action::NextImage,
        };
        if !self.gate.is_allowed(action) {
            return Ok(Outcome::Denied);
        }
        if self.tutorial.is_active() {
            self.notify_tutorial(Event::NavKey { direction })?;
            return Ok(Outcome::Applied);
        }

        if self.zoom.take().is_none() {
            let n = self.overview_images;
            self.image_index = match direction {
                Direction::Right => (self.image_index + 1) % n,
                Direction::Left => (self.image_index + n - 1) % n,
            };
        }
        self.host.clear_overlay();
        let image = self.overview_image();
        self.host.select_image(&image);
        self.host.show_buttons(true);
        Ok(Outcome::Applied)
    }

    pub fn zoom(&mut self, equipment: Equipment) -> EngineResult<Outcome> {
        if !self.gate.is_allowed(Action::Zoom(equipment)) {
            return Ok(Outcome::Denied);
        }
        self.show_zoom(equipment)?;
        Ok(Outcome::Applied)
    }

    fn show_zoom(&mut self, equipment: Equipment) -> EngineResult<()> {
        let table = self
            .equipment
            .iter()
            .find(|t| t.equipment == equipment)
            .ok_or(EngineError::NoEquipmentImage {
                equipment: equipment.label(),
            })?;
        let image = ImageDescriptor::Equipment {
            equipment,
            image: table.image.clone(),
        };
        let position = table.table_coordinates;

        self.zoom = Some(equipment);
        self.host.show_buttons(false);
        self.host.select_image(&image);
        if !self.tutorial.is_active() {
            self.host.draw_overlay(&Overlay {
                kind: OverlayKind::EquipmentTable(equipment),
                position,
            });
        }
        Ok(())
    }

    fn overview_image(&self) -> ImageDescriptor {
        ImageDescriptor::Overview {
            index: self.image_index,
            water_flowing: self.water_flowing && self.image_index == 0,
        }
    }

    // ---- tutorial ----

    /// Start the tour from step 0, ending a running one first.
    pub fn init_tutorial(&mut self) -> EngineResult<()> {
        if self.tutorial.is_active() {
            self.end_tutorial()?;
        }
        let policy = self.tutorial.start();

        self.registry.reset_to_baseline();
        self.motor_on = false;
        self.settle();
        self.log.clear();

        let keys: Vec<ControlKey> = self.registry.iter().map(|c| c.key().clone()).collect();
        for key in &keys {
            self.host.show_panel(key, false);
        }
        self.open_panels.clear();
        self.image_index = 0;
        self.zoom = None;

        self.apply_step_policy(&policy)
    }

    /// Leave the tour if one is running.
    pub fn end_tutorial(&mut self) -> EngineResult<()> {
        if self.tutorial.finish() {
            self.finish_tutorial()?;
        }
        Ok(())
    }

    fn notify_tutorial(&mut self, event: Event) -> EngineResult<()> {
        match self.tutorial.notify(&event) {
            None => Ok(()),
            Some(Transition::Finished) => self.finish_tutorial(),
            Some(Transition::Step {
                policy, lock_hook, ..
            }) => {
                if lock_hook {
                    let hook = self.controls.hook_key.clone();
                    self.registry.set_enabled(hook.as_str(), false)?;
                }
                self.apply_step_policy(&policy)
            }
        }
    }

    fn apply_step_policy(&mut self, policy: &StepPolicy) -> EngineResult<()> {
        self.gate.allow_only(policy.allowed.iter().copied());

        match policy.image {
            ImageMode::Zoomed(equipment) => self.show_zoom(equipment)?,
            mode => {
                self.zoom = None;
                self.image_index = 0;
                match mode {
                    ImageMode::Overview => self.host.show_buttons(false),
                    ImageMode::Interactive => self.host.show_buttons(true),
                    _ => {}
                }
                let image = self.overview_image();
                self.host.select_image(&image);
            }
        }

        self.host.draw_overlay(&Overlay {
            kind: OverlayKind::TutorialStep(policy.step),
            position: policy.coordinates,
        });
        Ok(())
    }

    fn finish_tutorial(&mut self) -> EngineResult<()> {
        self.zoom = None;
        self.image_index = 0;
        self.registry.enable_all();
        self.gate.set_all(true);

        self.host.clear_overlay();
        let image = self.overview_image();
        self.host.select_image(&image);
        self.host.show_buttons(true);

        self.host.settings_mut().tutorial_completed = true;
        self.host.persist()?;
        self.host
            .status(&StatusMessage::success("Tutorial completed."));
        Ok(())
    }

    // ---- settings ----

    pub fn set_sound_active(&mut self, active: bool) -> EngineResult<()> {
        self.host.settings_mut().sound_active = active;
        self.host.persist()?;
        self.update_sound();
        Ok(())
    }

    pub fn set_volume(&mut self, volume: u8) -> EngineResult<()> {
        self.host.settings_mut().volume = volume.min(MAX_VOLUME);
        self.host.persist()?;
        self.apply_volume();
        Ok(())
    }

    pub fn set_tooltip_content(&mut self, show: bool) -> EngineResult<()> {
        self.host.settings_mut().tooltip_content = show;
        self.host.persist()?;
        self.push_tooltips();
        Ok(())
    }

    // ---- report ----

    pub fn clear_report(&mut self) {
        self.log.clear();
        self.host
            .status(&StatusMessage::info("Report cleared."));
    }

    pub fn export_report(&self, format: ExportFormat, pdf: &PdfRenderer) -> EngineResult<Vec<u8>> {
        Ok(self
            .log
            .export_with(format, &self.registry.report_columns(), pdf)?)
    }

    /// Export and write the report, adding the format suffix to `path` when
    /// missing. The outcome is also reported through the host status line.
    pub fn save_report(
        &mut self,
        path: &Path,
        format: ExportFormat,
        pdf: &PdfRenderer,
    ) -> EngineResult<PathBuf> {
        let path = ensure_suffix(path, format);
        let written = self
            .export_report(format, pdf)
            .and_then(|bytes| Ok(std::fs::write(&path, bytes)?));
        match written {
            Ok(()) => {
                self.host.status(&StatusMessage::success(format!(
                    "Report saved to {}",
                    path.display()
                )));
                Ok(path)
            }
            Err(e) => {
                self.host.status(&StatusMessage::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Every control's current value.
    pub fn snapshot(&self) -> Snapshot {
        self.registry.snapshot()
    }
}
