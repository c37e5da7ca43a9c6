//! Live values of every control.

use pl_core::{ControlKey, Real, Snapshot, leading_number, parse_control_value, values_match};
use pl_dataset::{ControlSpec, ControlsDef, Equipment, StateRecord};
use pl_report::ReportColumns;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    spec: ControlSpec,
    value: String,
    enabled: bool,
}

impl ControlState {
    fn new(spec: ControlSpec) -> Self {
        let value = spec
            .allowed_values
            .first()
            .map(|v| v.display())
            .unwrap_or_default();
        Self {
            spec,
            value,
            enabled: true,
        }
    }

    pub fn spec(&self) -> &ControlSpec {
        &self.spec
    }

    pub fn key(&self) -> &ControlKey {
        &self.spec.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn numeric(&self) -> Option<Real> {
        leading_number(&self.value)
    }

    pub fn is_controllable(&self) -> bool {
        self.spec.controllable
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The "off" value of a controllable control: its first allowed value.
    pub fn baseline(&self) -> Option<String> {
        self.spec.allowed_values.first().map(|v| v.display())
    }

    /// The allowed value equal to `target`, in its canonical text.
    fn canonical(&self, target: Real) -> Option<String> {
        self.spec
            .allowed_values
            .iter()
            .find(|v| v.numeric().is_some_and(|n| values_match(n, target)))
            .map(|v| v.display())
    }
}

/// Ordered controls, addressed by key.
#[derive(Debug, Clone)]
pub struct ControlRegistry {
    controls: Vec<ControlState>,
}

impl ControlRegistry {
    /// Controllable controls start at their first allowed value, derived
    /// controls empty until the first resolve.
    pub fn new(def: &ControlsDef) -> Self {
        Self {
            controls: def.controls.iter().cloned().map(ControlState::new).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ControlState> {
        self.controls.iter().find(|c| c.key().as_str() == key)
    }

    fn get_mut(&mut self, key: &str) -> EngineResult<&mut ControlState> {
        self.controls
            .iter_mut()
            .find(|c| c.key().as_str() == key)
            .ok_or_else(|| EngineError::UnknownControl {
                key: key.to_string(),
            })
    }

    pub fn by_equipment(&self, equipment: Equipment) -> Option<&ControlState> {
        self.controls.iter().find(|c| c.spec.equipment == equipment)
    }

    /// Set a controllable control. Returns `Ok(false)` when the value is
    /// already current.
    pub fn set_value(&mut self, key: &str, value: &str) -> EngineResult<bool> {
        let control = self.get_mut(key)?;
        if !control.is_controllable() {
            return Err(EngineError::NotControllable {
                key: key.to_string(),
            });
        }
        let target = parse_control_value(value)?;
        let canonical = control
            .canonical(target)
            .ok_or_else(|| EngineError::ValueNotAllowed {
                key: key.to_string(),
                value: value.to_string(),
            })?;
        if canonical == control.value {
            return Ok(false);
        }
        debug!(key, from = %control.value, to = %canonical, "control set");
        control.value = canonical;
        Ok(true)
    }

    /// Copy every derived value out of `record`.
    pub fn apply_derived(&mut self, record: &StateRecord) {
        for control in self.controls.iter_mut().filter(|c| !c.is_controllable()) {
            if let Some(value) = record.display(control.spec.key.as_str()) {
                control.value = value;
            }
        }
    }

    /// Put every controllable control back to its baseline.
    pub fn reset_to_baseline(&mut self) {
        for control in self.controls.iter_mut().filter(|c| c.is_controllable()) {
            if let Some(baseline) = control.baseline() {
                control.value = baseline;
            }
        }
    }

    pub fn set_enabled(&mut self, key: &str, enabled: bool) -> EngineResult<()> {
        self.get_mut(key)?.enabled = enabled;
        Ok(())
    }

    pub fn enable_all(&mut self) {
        for control in &mut self.controls {
            control.enabled = true;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControlState> {
        self.controls.iter()
    }

    pub fn all_controllable(&self) -> impl Iterator<Item = &ControlState> {
        self.controls.iter().filter(|c| c.is_controllable())
    }

    pub fn all_derived(&self) -> impl Iterator<Item = &ControlState> {
        self.controls.iter().filter(|c| !c.is_controllable())
    }

    pub fn numeric(&self, key: &str) -> Option<Real> {
        self.get(key).and_then(ControlState::numeric)
    }

    /// Every control's value, in registry order.
    pub fn snapshot(&self) -> Snapshot {
        self.controls
            .iter()
            .map(|c| (c.key().clone(), c.value.clone()))
            .collect()
    }

    pub fn controllable_snapshot(&self) -> Snapshot {
        self.all_controllable()
            .map(|c| (c.key().clone(), c.value.clone()))
            .collect()
    }

    /// Report columns in registry order.
    pub fn report_columns(&self) -> ReportColumns {
        ReportColumns::new(
            self.controls
                .iter()
                .map(|c| (c.key().clone(), c.spec.header()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_core::PlError;
    use pl_dataset::CellValue;

    fn def() -> ControlsDef {
        let spec = |key: &str, controllable: bool, allowed: Vec<CellValue>, equipment| ControlSpec {
            key: key.into(),
            display_name: key.to_uppercase(),
            unit: "u".to_string(),
            controllable,
            allowed_values: allowed,
            equipment,
        };
        ControlsDef {
            hook_key: "rpm".into(),
            valve_key: "abertura".into(),
            motor_on_value: "890 (50)".into(),
            controls: vec![
                spec(
                    "abertura",
                    true,
                    vec![0.0.into(), 50.0.into(), 100.0.into()],
                    Equipment::BallValve,
                ),
                spec(
                    "rpm",
                    true,
                    vec!["0 (0)".into(), "890 (50)".into()],
                    Equipment::ElectricMotor,
                ),
                spec("q", false, vec![], Equipment::FlowMeter),
            ],
        }
    }

    #[test]
    fn starts_at_baseline() {
        let registry = ControlRegistry::new(&def());
        assert_eq!(registry.get("abertura").unwrap().value(), "0");
        assert_eq!(registry.get("rpm").unwrap().value(), "0 (0)");
        assert_eq!(registry.get("q").unwrap().value(), "");
        assert_eq!(registry.all_controllable().count(), 2);
        assert_eq!(registry.all_derived().count(), 1);
    }

    #[test]
    fn set_value_canonicalises_and_detects_no_change() {
        let mut registry = ControlRegistry::new(&def());
        assert!(registry.set_value("rpm", "890").unwrap());
        assert_eq!(registry.get("rpm").unwrap().value(), "890 (50)");
        assert!(!registry.set_value("rpm", "890 (50)").unwrap());
    }

    #[test]
    fn set_value_rejects_bad_input() {
        let mut registry = ControlRegistry::new(&def());
        assert!(matches!(
            registry.set_value("q", "1"),
            Err(EngineError::NotControllable { .. })
        ));
        assert!(matches!(
            registry.set_value("abertura", "30"),
            Err(EngineError::ValueNotAllowed { .. })
        ));
        assert!(matches!(
            registry.set_value("abertura", "half"),
            Err(EngineError::Value(PlError::NonNumeric { .. }))
        ));
        assert!(matches!(
            registry.set_value("nope", "1"),
            Err(EngineError::UnknownControl { .. })
        ));
    }

    #[test]
    fn derived_values_come_from_record() {
        let mut registry = ControlRegistry::new(&def());
        let record = StateRecord::new().with("q", 12.5).with("abertura", 50.0);
        registry.apply_derived(&record);
        assert_eq!(registry.get("q").unwrap().value(), "12.5");
        // controllables are untouched
        assert_eq!(registry.get("abertura").unwrap().value(), "0");
    }

    #[test]
    fn snapshot_is_detached() {
        let mut registry = ControlRegistry::new(&def());
        let before = registry.snapshot();
        registry.set_value("abertura", "100").unwrap();
        assert_eq!(before.get("abertura"), Some("0"));
        assert_eq!(registry.snapshot().get("abertura"), Some("100"));
        let keys: Vec<&str> = before.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["abertura", "rpm", "q"]);
    }
}
