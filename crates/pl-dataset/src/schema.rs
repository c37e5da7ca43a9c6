//! Dataset schema definitions.

use std::collections::BTreeMap;
use std::str::FromStr;

use pl_core::{ControlKey, Real, format_reading, leading_number};
use serde::{Deserialize, Serialize};

/// Number of steps in the guided tutorial.
pub const TUTORIAL_STEP_COUNT: usize = 21;

/// Number of gated actions (navigation, zooms, panel buttons, motor on/off).
pub const ACTION_COUNT: usize = 17;

/// Physical items of the lab bench, in toolbar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Pump,
    ElectricMotor,
    BallValve,
    FlowMeter,
    VacuumGauge,
    PressureGauge,
    Piezometer,
}

impl Equipment {
    pub const ALL: [Equipment; 7] = [
        Equipment::Pump,
        Equipment::ElectricMotor,
        Equipment::BallValve,
        Equipment::FlowMeter,
        Equipment::VacuumGauge,
        Equipment::PressureGauge,
        Equipment::Piezometer,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Equipment::Pump => "Pump",
            Equipment::ElectricMotor => "Electric motor",
            Equipment::BallValve => "Ball valve",
            Equipment::FlowMeter => "Flow meter",
            Equipment::VacuumGauge => "Vacuum gauge",
            Equipment::PressureGauge => "Pressure gauge",
            Equipment::Piezometer => "Piezometer",
        }
    }

    /// Snake-case name used in data files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Equipment::Pump => "pump",
            Equipment::ElectricMotor => "electric_motor",
            Equipment::BallValve => "ball_valve",
            Equipment::FlowMeter => "flow_meter",
            Equipment::VacuumGauge => "vacuum_gauge",
            Equipment::PressureGauge => "pressure_gauge",
            Equipment::Piezometer => "piezometer",
        }
    }
}

impl FromStr for Equipment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Equipment::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| format!("unknown equipment '{s}'"))
    }
}

/// A single cell of the dataset: numbers in the recorded table, or
/// decorated text such as the motor speed `"890 (50)"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(Real),
    Text(String),
}

impl CellValue {
    pub fn numeric(&self) -> Option<Real> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => leading_number(s),
        }
    }

    /// Text shown to the user for this cell.
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(v) => format_reading(*v),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl From<Real> for CellValue {
    fn from(v: Real) -> Self {
        CellValue::Number(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub key: ControlKey,
    pub display_name: String,
    pub unit: String,
    pub controllable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<CellValue>,
    pub equipment: Equipment,
}

impl ControlSpec {
    /// Report/table header: `"<display name> (<unit>)"`.
    pub fn header(&self) -> String {
        format!("{} ({})", self.display_name, self.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsDef {
    /// Controllable key the table is primarily sorted and searched by.
    pub hook_key: ControlKey,
    /// Controllable key of the valve opening.
    pub valve_key: ControlKey,
    /// Hook value applied when the motor is switched on from zero.
    pub motor_on_value: CellValue,
    pub controls: Vec<ControlSpec>,
}

impl ControlsDef {
    pub fn get(&self, key: &str) -> Option<&ControlSpec> {
        self.controls.iter().find(|c| c.key.as_str() == key)
    }

    /// Controllable keys other than the hook, in declaration order.
    pub fn secondary_keys(&self) -> Vec<ControlKey> {
        self.controls
            .iter()
            .filter(|c| c.controllable && c.key != self.hook_key)
            .map(|c| c.key.clone())
            .collect()
    }
}

/// One row of the precomputed table: the value of every control for one
/// consistent physical state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateRecord {
    fields: BTreeMap<ControlKey, CellValue>,
}

impl StateRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<CellValue>) -> Self {
        self.fields.insert(ControlKey::from(key), value.into());
        self
    }

    pub fn insert(&mut self, key: ControlKey, value: CellValue) {
        self.fields.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    pub fn numeric(&self, key: &str) -> Option<Real> {
        self.get(key).and_then(CellValue::numeric)
    }

    pub fn display(&self, key: &str) -> Option<String> {
        self.get(key).map(CellValue::display)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ControlKey> {
        self.fields.keys()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialStep {
    pub index: usize,
    /// Overlay position in image coordinates.
    pub coordinates: (i32, i32),
    #[serde(default)]
    pub allowed_clicks: Vec<usize>,
}

/// Zoom photograph of an equipment item and where its data table is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentTable {
    pub equipment: Equipment,
    pub image: String,
    pub table_coordinates: (i32, i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub flow_m3_h: Real,
    pub head_m: Real,
}

/// Theoretical pump curve shown next to the bench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpCurve {
    pub rotation_rpm: Real,
    pub points: Vec<CurvePoint>,
}

impl Default for PumpCurve {
    fn default() -> Self {
        const FLOW: [Real; 9] = [0.0, 10.0, 12.5, 15.0, 20.0, 25.0, 30.0, 33.6, 38.5];
        const HEAD: [Real; 9] = [22.6, 22.57, 22.42, 22.17, 21.33, 20.05, 18.33, 16.82, 14.39];
        Self {
            rotation_rpm: 1750.0,
            points: FLOW
                .iter()
                .zip(HEAD.iter())
                .map(|(&flow_m3_h, &head_m)| CurvePoint { flow_m3_h, head_m })
                .collect(),
        }
    }
}

/// Everything the engine needs, already parsed and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub controls: ControlsDef,
    pub states: Vec<StateRecord>,
    pub tutorial: Vec<TutorialStep>,
    pub equipment: Vec<EquipmentTable>,
    pub pump_curve: PumpCurve,
}

impl Dataset {
    pub fn equipment_table(&self, equipment: Equipment) -> Option<&EquipmentTable> {
        self.equipment.iter().find(|t| t.equipment == equipment)
    }
}
