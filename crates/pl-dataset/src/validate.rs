//! Dataset validation logic.

use std::cmp::Ordering;
use std::collections::HashSet;

use pl_core::{ControlKey, Real};

use crate::schema::{ACTION_COUNT, ControlsDef, Dataset, StateRecord, TUTORIAL_STEP_COUNT};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Empty {what}")]
    Empty { what: &'static str },

    #[error("State record {row} has no field '{key}'")]
    MissingField { row: usize, key: String },

    #[error("State table is not sorted: row {row} is out of order on '{key}'")]
    UnsortedTable { row: usize, key: String },

    #[error("Tutorial must have {expected} steps, found {found}")]
    TutorialLength { expected: usize, found: usize },

    #[error("Tutorial step at position {position} declares index {index}")]
    TutorialIndex { position: usize, index: usize },

    #[error("Tutorial step {step} allows unknown action {action}")]
    UnknownAction { step: usize, action: usize },
}

pub fn validate_dataset(dataset: &Dataset) -> Result<(), ValidationError> {
    validate_controls(&dataset.controls)?;
    validate_states(&dataset.controls, &dataset.states)?;

    if dataset.tutorial.len() != TUTORIAL_STEP_COUNT {
        return Err(ValidationError::TutorialLength {
            expected: TUTORIAL_STEP_COUNT,
            found: dataset.tutorial.len(),
        });
    }
    for (position, step) in dataset.tutorial.iter().enumerate() {
        if step.index != position {
            return Err(ValidationError::TutorialIndex {
                position,
                index: step.index,
            });
        }
        if let Some(&action) = step.allowed_clicks.iter().find(|&&a| a >= ACTION_COUNT) {
            return Err(ValidationError::UnknownAction {
                step: step.index,
                action,
            });
        }
    }

    let mut seen = HashSet::new();
    for table in &dataset.equipment {
        if !seen.insert(table.equipment) {
            return Err(ValidationError::DuplicateId {
                id: table.equipment.label().to_string(),
                context: "equipment tables".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_controls(controls: &ControlsDef) -> Result<(), ValidationError> {
    if controls.controls.is_empty() {
        return Err(ValidationError::Empty { what: "control list" });
    }

    let mut keys = HashSet::new();
    let mut equipment = HashSet::new();
    for spec in &controls.controls {
        if !keys.insert(&spec.key) {
            return Err(ValidationError::DuplicateId {
                id: spec.key.to_string(),
                context: "controls".to_string(),
            });
        }
        if !equipment.insert(spec.equipment) {
            return Err(ValidationError::DuplicateId {
                id: spec.equipment.label().to_string(),
                context: "control equipment".to_string(),
            });
        }
        if spec.controllable {
            if spec.allowed_values.is_empty() {
                return Err(ValidationError::Empty {
                    what: "allowed values of a controllable control",
                });
            }
            if let Some(bad) = spec.allowed_values.iter().find(|v| v.numeric().is_none()) {
                return Err(ValidationError::InvalidValue {
                    field: format!("{}.allowed_values", spec.key),
                    value: bad.display(),
                    reason: "controllable values must start with a number".to_string(),
                });
            }
        }
    }

    for (key, context) in [
        (&controls.hook_key, "hook_key"),
        (&controls.valve_key, "valve_key"),
    ] {
        match controls.get(key.as_str()) {
            None => {
                return Err(ValidationError::MissingReference {
                    id: key.to_string(),
                    context: context.to_string(),
                });
            }
            Some(spec) if !spec.controllable => {
                return Err(ValidationError::InvalidValue {
                    field: context.to_string(),
                    value: key.to_string(),
                    reason: "must name a controllable control".to_string(),
                });
            }
            Some(_) => {}
        }
    }

    let hook = controls.get(controls.hook_key.as_str());
    let on_value = controls.motor_on_value.display();
    if !hook.is_some_and(|spec| spec.allowed_values.iter().any(|v| v.display() == on_value)) {
        return Err(ValidationError::InvalidValue {
            field: "motor_on_value".to_string(),
            value: on_value,
            reason: "not an allowed value of the hook control".to_string(),
        });
    }

    Ok(())
}

pub fn validate_states(
    controls: &ControlsDef,
    states: &[StateRecord],
) -> Result<(), ValidationError> {
    if states.is_empty() {
        return Err(ValidationError::Empty { what: "state table" });
    }
    for (row, record) in states.iter().enumerate() {
        if let Some(spec) = controls.controls.iter().find(|c| !record.contains(c.key.as_str())) {
            return Err(ValidationError::MissingField {
                row,
                key: spec.key.to_string(),
            });
        }
    }
    check_table_order(states, &controls.hook_key, &controls.secondary_keys())
}

/// Check the nesting the forward-only resolver relies on: rows are sorted by
/// the hook key ascending, then by each secondary key ascending within a
/// hook group.
pub fn check_table_order(
    states: &[StateRecord],
    hook: &ControlKey,
    secondaries: &[ControlKey],
) -> Result<(), ValidationError> {
    let order: Vec<&ControlKey> = std::iter::once(hook).chain(secondaries.iter()).collect();

    let sort_key = |row: usize| -> Result<Vec<Real>, ValidationError> {
        order
            .iter()
            .map(|key| {
                let cell = states[row].get(key.as_str()).ok_or_else(|| {
                    ValidationError::MissingField {
                        row,
                        key: key.to_string(),
                    }
                })?;
                cell.numeric().ok_or_else(|| ValidationError::InvalidValue {
                    field: format!("states[{row}].{key}"),
                    value: cell.display(),
                    reason: "sort keys must be numeric".to_string(),
                })
            })
            .collect()
    };

    let mut previous = match states.first() {
        Some(_) => sort_key(0)?,
        None => return Ok(()),
    };
    for row in 1..states.len() {
        let current = sort_key(row)?;
        for (i, key) in order.iter().enumerate() {
            match current[i].partial_cmp(&previous[i]) {
                Some(Ordering::Greater) => break,
                Some(Ordering::Equal) => continue,
                _ => {
                    return Err(ValidationError::UnsortedTable {
                        row,
                        key: key.to_string(),
                    });
                }
            }
        }
        previous = current;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StateRecord;

    fn row(hook: f64, valve: f64) -> StateRecord {
        StateRecord::new().with("rpm", hook).with("abertura", valve)
    }

    #[test]
    fn sorted_table_passes() {
        let states = vec![row(0.0, 0.0), row(50.0, 50.0), row(50.0, 100.0), row(100.0, 100.0)];
        check_table_order(&states, &"rpm".into(), &["abertura".into()]).unwrap();
    }

    #[test]
    fn descending_secondary_within_group_fails() {
        let states = vec![row(0.0, 0.0), row(50.0, 100.0), row(50.0, 50.0)];
        let err = check_table_order(&states, &"rpm".into(), &["abertura".into()]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsortedTable {
                row: 2,
                key: "abertura".to_string()
            }
        );
    }

    #[test]
    fn secondary_may_restart_in_next_group() {
        let states = vec![row(50.0, 100.0), row(100.0, 0.0)];
        check_table_order(&states, &"rpm".into(), &["abertura".into()]).unwrap();
    }

    #[test]
    fn descending_hook_fails() {
        let states = vec![row(100.0, 0.0), row(50.0, 0.0)];
        let err = check_table_order(&states, &"rpm".into(), &[]).unwrap_err();
        assert!(matches!(err, ValidationError::UnsortedTable { row: 1, .. }));
    }

    #[test]
    fn decorated_hook_text_sorts_numerically() {
        let states = vec![
            StateRecord::new().with("rpm", "0 (0)").with("abertura", 0.0),
            StateRecord::new().with("rpm", "890 (50)").with("abertura", 0.0),
            StateRecord::new().with("rpm", "1750 (100)").with("abertura", 0.0),
        ];
        check_table_order(&states, &"rpm".into(), &["abertura".into()]).unwrap();
    }
}
