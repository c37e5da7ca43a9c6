//! The recorded state table.

use pl_core::{ControlKey, Real, Tolerances, nearly_equal};
use pl_dataset::{ControlsDef, StateRecord, check_table_order};

use crate::error::EngineResult;

/// Immutable, ordered list of recorded states.
///
/// Rows are sorted by the hook key and then by each secondary key within a
/// hook group. [`StateTable::new`] refuses a table that breaks this nesting,
/// since the resolver's forward scan depends on it.
#[derive(Debug, Clone)]
pub struct StateTable {
    records: Vec<StateRecord>,
    hook: ControlKey,
    secondaries: Vec<ControlKey>,
}

impl StateTable {
    pub fn new(
        records: Vec<StateRecord>,
        hook: ControlKey,
        secondaries: Vec<ControlKey>,
    ) -> EngineResult<Self> {
        check_table_order(&records, &hook, &secondaries)?;
        Ok(Self {
            records,
            hook,
            secondaries,
        })
    }

    pub fn from_controls(controls: &ControlsDef, records: Vec<StateRecord>) -> EngineResult<Self> {
        Self::new(records, controls.hook_key.clone(), controls.secondary_keys())
    }

    pub fn hook_key(&self) -> &ControlKey {
        &self.hook
    }

    /// Controllable keys scanned after the hook, in scan order.
    pub fn secondary_keys(&self) -> &[ControlKey] {
        &self.secondaries
    }

    pub fn get(&self, index: usize) -> Option<&StateRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[StateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First row at or after `start` whose `key` equals `target`.
    pub fn position_from(
        &self,
        start: usize,
        key: &ControlKey,
        target: Real,
        tol: Tolerances,
    ) -> Option<usize> {
        self.records
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, record)| {
                record
                    .numeric(key.as_str())
                    .is_some_and(|v| nearly_equal(v, target, tol))
            })
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use pl_dataset::ValidationError;

    fn row(hook: f64, valve: f64) -> StateRecord {
        StateRecord::new().with("rpm", hook).with("abertura", valve)
    }

    #[test]
    fn unsorted_rows_are_refused() {
        let err = StateTable::new(
            vec![row(50.0, 0.0), row(0.0, 0.0)],
            "rpm".into(),
            vec!["abertura".into()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::UnsortedTable { row: 1, .. })
        ));
    }

    #[test]
    fn position_from_skips_earlier_rows() {
        let table = StateTable::new(
            vec![row(0.0, 0.0), row(50.0, 0.0), row(50.0, 100.0)],
            "rpm".into(),
            vec!["abertura".into()],
        )
        .unwrap();
        let valve = ControlKey::from("abertura");
        let tol = Tolerances::default();
        assert_eq!(table.position_from(0, &valve, 0.0, tol), Some(0));
        assert_eq!(table.position_from(1, &valve, 0.0, tol), Some(1));
        assert_eq!(table.position_from(2, &valve, 0.0, tol), None);
        assert_eq!(table.position_from(9, &valve, 100.0, tol), None);
    }
}
