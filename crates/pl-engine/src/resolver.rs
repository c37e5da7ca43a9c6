//! Mapping a control change to a recorded state.
//!
//! The hook key is searched first over the whole table. Each remaining
//! controllable key is then searched forward from the row the previous key
//! landed on, so the result is the row matching the full controllable tuple
//! whenever the table is sorted the way [`StateTable`] requires.
//!
//! A key with no matching row leaves the carried index where it was and is
//! reported in [`Resolution::misses`]. When the hook itself misses the
//! forward scans start at row 0, and when nothing matched at all the lookup
//! is [`Lookup::NotFound`].

use pl_core::{ControlKey, Real, Snapshot, Tolerances, nearly_equal};
use pl_dataset::StateRecord;
use tracing::{debug, warn};

use crate::table::StateTable;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'t> {
    Found { index: usize, record: &'t StateRecord },
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'t> {
    pub lookup: Lookup<'t>,
    /// The hook value is zero: whatever panel belongs to the hook control
    /// must be hidden by the caller.
    pub hook_off: bool,
    /// Keys whose value matched no row at the point they were scanned.
    pub misses: Vec<ControlKey>,
}

impl<'t> Resolution<'t> {
    pub fn record(&self) -> Option<&'t StateRecord> {
        match self.lookup {
            Lookup::Found { record, .. } => Some(record),
            Lookup::NotFound => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self.lookup {
            Lookup::Found { index, .. } => Some(index),
            Lookup::NotFound => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueResolver {
    tol: Tolerances,
}

impl ValueResolver {
    pub fn new(tol: Tolerances) -> Self {
        Self { tol }
    }

    /// Resolve with `changed` set to `value` on top of the current
    /// controllable values.
    pub fn resolve<'t>(
        &self,
        table: &'t StateTable,
        changed: &ControlKey,
        value: &str,
        current: &Snapshot,
    ) -> Resolution<'t> {
        let mut values = current.clone();
        values.insert(changed.clone(), value);
        self.resolve_snapshot(table, &values)
    }

    /// Resolve the controllable values in `values` as they stand.
    pub fn resolve_snapshot<'t>(&self, table: &'t StateTable, values: &Snapshot) -> Resolution<'t> {
        let hook = table.hook_key();
        let hook_value = values.numeric(hook.as_str());
        let hook_off = hook_value.is_some_and(|v| nearly_equal(v, 0.0, self.tol));

        let mut misses = Vec::new();
        let mut index = hook_value.and_then(|v| table.position_from(0, hook, v, self.tol));
        if index.is_none() {
            self.miss(&mut misses, hook, hook_value);
        }

        for key in table.secondary_keys() {
            let target = values.numeric(key.as_str());
            let found =
                target.and_then(|v| table.position_from(index.unwrap_or(0), key, v, self.tol));
            match found {
                Some(i) => index = Some(i),
                None => self.miss(&mut misses, key, target),
            }
        }

        let lookup = match index.and_then(|i| table.get(i).map(|record| (i, record))) {
            Some((index, record)) => Lookup::Found { index, record },
            None => Lookup::NotFound,
        };
        let resolution = Resolution {
            lookup,
            hook_off,
            misses,
        };
        debug!(index = ?resolution.index(), hook_off, misses = resolution.misses.len(), "resolved");
        resolution
    }

    fn miss(&self, misses: &mut Vec<ControlKey>, key: &ControlKey, value: Option<Real>) {
        warn!(%key, ?value, "no recorded state matches; keeping previous row");
        misses.push(key.clone());
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn grid(hooks: &[u32], valves: &[u32]) -> StateTable {
        let mut records = Vec::new();
        for &h in hooks {
            for &v in valves {
                records.push(
                    StateRecord::new()
                        .with("hook", h as f64)
                        .with("valve", v as f64)
                        .with("flow", (h * 1000 + v) as f64),
                );
            }
        }
        StateTable::new(records, "hook".into(), vec!["valve".into()]).unwrap()
    }

    fn sorted_unique(max: u32) -> impl Strategy<Value = Vec<u32>> {
        prop::collection::btree_set(0..max, 1..6).prop_map(|s| s.into_iter().collect())
    }

    proptest! {
        #[test]
        fn existing_tuple_resolves_exactly(
            hooks in sorted_unique(2000),
            valves in sorted_unique(101),
            hi in any::<prop::sample::Index>(),
            vi in any::<prop::sample::Index>(),
        ) {
            let table = grid(&hooks, &valves);
            let h = *hi.get(&hooks);
            let v = *vi.get(&valves);

            let mut current = Snapshot::new();
            current.insert("hook".into(), h.to_string());
            current.insert("valve".into(), v.to_string());
            let res = ValueResolver::default().resolve_snapshot(&table, &current);

            let record = res.record().unwrap();
            prop_assert_eq!(record.numeric("hook"), Some(h as f64));
            prop_assert_eq!(record.numeric("valve"), Some(v as f64));
            prop_assert_eq!(record.numeric("flow"), Some((h * 1000 + v) as f64));
            prop_assert!(res.misses.is_empty());
        }
    }
}
