// params.rs
// Configuration of the sorting cell as stored in params.json, typed views over the
// parts the viewer reads, and the pure update functions used by the parameter editor.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::config::PREVIEW_XY_OFFSET;
use crate::error::{LoadError, ParamsError, StoreError};
use crate::geometry::{derive_scene, StaticScene};
use crate::store::{Kind, Store};

/// The full parameter document. Subsystem groups are kept as open records so that
/// parameters the viewer does not know about survive an edit/save cycle untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub unit: BTreeMap<String, String>,
    pub conveyor: Map<String, Value>,
    pub slider: Map<String, Value>,
    pub beam: Map<String, Value>,
    pub target: Map<String, Value>,
    #[serde(rename = "timeStep")]
    pub time_step: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub seed: i64,
    /// Top-level keys outside the known set.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConveyorParams {
    pub length: f32,
    pub nb_in_conveyor: usize,
    pub nb_out_conveyor: usize,
    pub in_direction: [f32; 2],
    pub out_direction: [f32; 2],
    pub in_end_pos: Vec<[f32; 2]>,
    pub out_end_pos: Vec<[f32; 2]>,
    pub in_width: Vec<f32>,
    pub out_width: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamParams {
    pub direction: [f32; 2],
    pub first_beam_pos: f32,
    pub spacing: f32,
    pub width: f32,
    pub length: f32,
    pub nb_of_beams: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderParams {
    pub width: f32,
    pub arm_width: f32,
    pub reach: f32,
    pub reach_offset: f32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TargetParams {
    pub width: f32,
}

/// Everything the static scene and the slider kinematics read from a configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneParams {
    pub conveyor: ConveyorParams,
    pub beam: BeamParams,
    pub slider: SliderParams,
    pub target: TargetParams,
    /// Simulated seconds between two consecutive snapshots.
    pub time_step: f64,
}

impl ConveyorParams {
    /// Sign applied to the beam spacing. The input direction's second component
    /// selects which of its own components carries the travel sign; when it is not
    /// a valid component index the sign of the dominant component is used instead.
    pub fn travel_sign(&self) -> f32 {
        let d = self.in_direction;
        match d[1] {
            s if s == 0.0 => d[0],
            s if s == 1.0 => d[1],
            _ => {
                let dominant = if d[0].abs() >= d[1].abs() { d[0] } else { d[1] };
                if dominant < 0.0 {
                    -1.0
                } else {
                    1.0
                }
            }
        }
    }
}

fn field<T: DeserializeOwned>(
    group: &Map<String, Value>,
    field: &'static str,
) -> Result<T, ParamsError> {
    serde_json::from_value(Value::Object(group.clone()))
        .map_err(|source| ParamsError::Field { field, source })
}

impl Configuration {
    pub fn from_value(value: Value) -> Result<Self, ParamsError> {
        serde_json::from_value(value).map_err(|source| ParamsError::Field {
            field: "configuration",
            source,
        })
    }

    pub fn to_value(&self) -> Value {
        // A Configuration only holds JSON-native data, serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Typed view used by geometry derivation and playback.
    pub fn scene(&self) -> Result<SceneParams, ParamsError> {
        Ok(SceneParams {
            conveyor: field(&self.conveyor, "conveyor")?,
            beam: field(&self.beam, "beam")?,
            slider: field(&self.slider, "slider")?,
            target: field(&self.target, "target")?,
            time_step: self.time_step,
        })
    }

    pub fn unit_of(&self, key: &str) -> &str {
        self.unit.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Shape of a parameter value, used by the form layer to pick an input widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Array,
    NestedArray,
}

pub fn param_kind(value: &Value) -> ParamKind {
    match value {
        Value::Array(items) => match items.first() {
            Some(Value::Array(_)) => ParamKind::NestedArray,
            _ => ParamKind::Array,
        },
        _ => ParamKind::Number,
    }
}

fn parse_path(path: &str) -> Result<Vec<&str>, ParamsError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ParamsError::BadPath(path.to_string()));
    }
    Ok(segments)
}

/// Returns a copy of `config` with the value at `path` replaced.
///
/// `path` is dot separated: `timeStep`, `slider.reach`, `conveyor.inWidth.1`,
/// `conveyor.inEndPos.0.1`. Numeric segments index into arrays. The last key of
/// an object may be new; every intermediate segment must already exist.
pub fn set_param(
    config: &Configuration,
    path: &str,
    value: Value,
) -> Result<Configuration, ParamsError> {
    let segments = parse_path(path)?;
    let mut root = config.to_value();

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| ParamsError::BadPath(path.to_string()))?;

    let mut cursor = &mut root;
    for segment in parents {
        cursor = match cursor {
            Value::Object(map) => map
                .get_mut(*segment)
                .ok_or_else(|| ParamsError::UnknownPath(path.to_string()))?,
            Value::Array(items) => {
                let index = array_index(path, segment)?;
                items.get_mut(index).ok_or(ParamsError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                })?
            }
            _ => return Err(ParamsError::UnknownPath(path.to_string())),
        };
    }

    match cursor {
        Value::Object(map) => {
            map.insert((*last).to_string(), value);
        }
        Value::Array(items) => {
            let index = array_index(path, last)?;
            let slot = items.get_mut(index).ok_or(ParamsError::IndexOutOfRange {
                path: path.to_string(),
                index,
            })?;
            *slot = value;
        }
        _ => return Err(ParamsError::UnknownPath(path.to_string())),
    }

    Configuration::from_value(root)
}

fn array_index(path: &str, segment: &str) -> Result<usize, ParamsError> {
    segment
        .parse()
        .map_err(|_| ParamsError::BadPath(path.to_string()))
}

/// Input and output pick rates of a configuration, in picks per minute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowRates {
    pub input: f64,
    pub output: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowParams {
    speed: [f64; 2],
    nb_in_conveyor: usize,
    nb_out_conveyor: usize,
    in_items_per_row: Vec<f64>,
    out_items_per_row: Vec<f64>,
    in_row_spacing: f64,
    bad_product_ratio: f64,
    n_packages_row: f64,
    packages_row_spacing: f64,
    packages_extra_spacing: f64,
}

pub fn flow_rates(config: &Configuration) -> Result<FlowRates, ParamsError> {
    let p: FlowParams = field(&config.conveyor, "conveyor")?;
    let in_items: f64 = p.in_items_per_row.iter().take(p.nb_in_conveyor).sum();
    let out_items: f64 = p.out_items_per_row.iter().take(p.nb_out_conveyor).sum();

    let input = p.speed[0] / p.in_row_spacing * in_items * (1.0 - p.bad_product_ratio) * 60.0;
    let output = p.speed[1]
        / (p.n_packages_row * p.packages_row_spacing + p.packages_extra_spacing)
        * out_items
        * p.n_packages_row
        * 60.0;
    Ok(FlowRates { input, output })
}

/// The configuration being edited, passed explicitly to whoever needs to read or change it.
#[derive(Debug, Default)]
pub struct EditContext {
    config: Option<Configuration>,
    dirty: bool,
}

impl EditContext {
    pub fn new(config: Configuration) -> Self {
        Self {
            config: Some(config),
            dirty: false,
        }
    }

    /// Loads the saved `params` settings.
    pub fn load<S: Store>(store: &S) -> Result<Self, LoadError> {
        let value = store.load_named(crate::config::PARAMS_SETTINGS_NAME, Kind::Settings)?;
        let config = Configuration::from_value(value).inspect_err(|e| {
            log::error!("Saved parameters are malformed: {e}");
        })?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> Option<&Configuration> {
        self.config.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn replace(&mut self, config: Configuration) {
        self.config = Some(config);
        self.dirty = true;
    }

    /// Applies one field edit. On error the configuration is unchanged.
    pub fn update(&mut self, path: &str, value: Value) -> Result<(), ParamsError> {
        let Some(current) = self.config.as_ref() else {
            return Err(ParamsError::UnknownPath(path.to_string()));
        };
        let next = set_param(current, path, value)?;
        self.config = Some(next);
        self.dirty = true;
        Ok(())
    }

    /// Static scene of the configuration being edited, laid out for the preview pane.
    pub fn preview(&self, container_width: f32) -> Result<Option<StaticScene>, ParamsError> {
        let Some(config) = self.config.as_ref() else {
            return Ok(None);
        };
        let params = config.scene()?;
        Ok(Some(derive_scene(&params, PREVIEW_XY_OFFSET, container_width)))
    }

    pub fn save<S: Store>(&mut self, store: &S) -> Result<(), StoreError> {
        let Some(config) = self.config.as_ref() else {
            log::warn!("No data to save");
            return Err(StoreError::NothingToSave);
        };
        store.save_named(
            crate::config::PARAMS_SETTINGS_NAME,
            Kind::Settings,
            &config.to_value(),
        )?;
        self.dirty = false;
        Ok(())
    }
}
