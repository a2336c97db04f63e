// history.rs
// Recorded simulation runs: one snapshot per time step, decoded from history.json.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use ultraviolet::Vec2;

use crate::error::HistoryError;

/// A recorded coordinate. Extra components (e.g. height) are accepted and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "[f32; 2]")]
pub struct Point(pub Vec2);

impl TryFrom<Vec<f32>> for Point {
    type Error = String;

    fn try_from(coords: Vec<f32>) -> Result<Self, Self::Error> {
        match coords.as_slice() {
            [x, y, ..] => Ok(Point(Vec2::new(*x, *y))),
            _ => Err(format!("expected at least 2 coordinates, got {}", coords.len())),
        }
    }
}

impl From<Point> for [f32; 2] {
    fn from(p: Point) -> Self {
        [p.0.x, p.0.y]
    }
}

/// Parallel position/status sequences of one entity kind. Index `i` in both
/// sequences is the same entity for the whole history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
    #[serde(default)]
    pub position: Vec<Point>,
    #[serde(default)]
    pub status: Vec<i32>,
}

impl EntityGroup {
    pub fn len(&self) -> usize {
        self.status.len().max(self.position.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self, i: usize) -> Option<Vec2> {
        self.position.get(i).map(|p| p.0)
    }

    pub fn status(&self, i: usize) -> Option<i32> {
        self.status.get(i).copied()
    }
}

/// The state of every tracked entity at one time step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub targets: EntityGroup,
    #[serde(default)]
    pub drops: EntityGroup,
    #[serde(default)]
    pub sliders: EntityGroup,
    /// Rails only record a status.
    #[serde(default)]
    pub beams: EntityGroup,
}

/// Which variable-length group a list tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemGroup {
    Targets,
    Drops,
}

impl Snapshot {
    pub fn group(&self, which: ItemGroup) -> &EntityGroup {
        match which {
            ItemGroup::Targets => &self.targets,
            ItemGroup::Drops => &self.drops,
        }
    }
}

/// An ordered, immutable sequence of snapshots indexed from 0.
#[derive(Clone, Debug, PartialEq)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    /// Builds a history from snapshots already in time order.
    pub fn new(snapshots: Vec<Snapshot>) -> Result<Self, HistoryError> {
        if snapshots.is_empty() {
            return Err(HistoryError::Empty);
        }
        let history = Self { snapshots };
        history.validate()?;
        Ok(history)
    }

    /// Decodes the `{"<step>": snapshot, ...}` document written by the simulator.
    pub fn from_value(value: Value) -> Result<Self, HistoryError> {
        let by_key: HashMap<String, Snapshot> = serde_json::from_value(value)?;
        let mut by_step = BTreeMap::new();
        for (key, snapshot) in by_key {
            // only the canonical decimal form, so "01" or "+1" cannot alias step 1
            let step: usize = match key.parse() {
                Ok(step) if usize::to_string(&step) == key => step,
                _ => return Err(HistoryError::BadStepKey(key)),
            };
            if by_step.insert(step, snapshot).is_some() {
                return Err(HistoryError::DuplicateStep(step));
            }
        }
        // keys are unique and sorted, so a gap shows up as a key larger than its rank
        for (rank, step) in by_step.keys().enumerate() {
            if *step != rank {
                return Err(HistoryError::MissingStep(rank));
            }
        }
        Self::new(by_step.into_values().collect())
    }

    pub fn to_value(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .snapshots
            .iter()
            .enumerate()
            .map(|(t, s)| (t.to_string(), serde_json::to_value(s).unwrap_or(Value::Null)))
            .collect();
        Value::Object(map)
    }

    fn validate(&self) -> Result<(), HistoryError> {
        let first = &self.snapshots[0];
        let sliders = first.sliders.len();
        let beams = first.beams.len();

        for (step, snapshot) in self.snapshots.iter().enumerate() {
            for (group, g) in [
                ("targets", &snapshot.targets),
                ("drops", &snapshot.drops),
                ("sliders", &snapshot.sliders),
            ] {
                if g.position.len() != g.status.len() {
                    return Err(HistoryError::LengthMismatch {
                        step,
                        group,
                        positions: g.position.len(),
                        statuses: g.status.len(),
                    });
                }
            }
            let b = &snapshot.beams;
            if !b.position.is_empty() && b.position.len() != b.status.len() {
                return Err(HistoryError::LengthMismatch {
                    step,
                    group: "beams",
                    positions: b.position.len(),
                    statuses: b.status.len(),
                });
            }
            if snapshot.sliders.len() != sliders {
                return Err(HistoryError::FixedGroupResized {
                    step,
                    group: "sliders",
                    expected: sliders,
                    found: snapshot.sliders.len(),
                });
            }
            if snapshot.beams.len() != beams {
                return Err(HistoryError::FixedGroupResized {
                    step,
                    group: "beams",
                    expected: beams,
                    found: snapshot.beams.len(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Last valid time index.
    pub fn total_frames(&self) -> usize {
        self.snapshots.len() - 1
    }

    pub fn get(&self, t: usize) -> Option<&Snapshot> {
        self.snapshots.get(t)
    }

    pub fn slider_count(&self) -> usize {
        self.snapshots[0].sliders.len()
    }

    pub fn beam_count(&self) -> usize {
        self.snapshots[0].beams.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_steps() -> Value {
        json!({
            "0": {
                "targets": { "position": [], "status": [] },
                "drops": { "position": [[5.0, 6.0]], "status": [10] },
                "sliders": { "position": [[1.0, 2.0], [3.0, 4.0]], "status": [30, 30] },
                "beams": { "status": [20] }
            },
            "1": {
                "targets": { "position": [[10.0, 20.0], [30.0, 40.0]], "status": [0, 1] },
                "drops": { "position": [[5.0, 6.0, 0.0]], "status": [11] },
                "sliders": { "position": [[1.5, 2.0], [3.0, 4.5]], "status": [31, 35] },
                "beams": { "status": [21] }
            }
        })
    }

    #[test]
    fn decodes_step_map_in_order() {
        let history = History::from_value(two_steps()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.total_frames(), 1);
        assert_eq!(history.slider_count(), 2);
        assert_eq!(history.beam_count(), 1);

        let last = history.get(1).unwrap();
        assert_eq!(last.targets.len(), 2);
        assert_eq!(last.targets.position(1), Some(Vec2::new(30.0, 40.0)));
        assert_eq!(last.drops.position(0), Some(Vec2::new(5.0, 6.0)));
        assert_eq!(last.beams.status(0), Some(21));
        assert!(history.get(2).is_none());
    }

    #[test]
    fn rejects_gaps_and_bad_keys() {
        let mut doc = two_steps();
        let step = doc["1"].clone();
        doc.as_object_mut().unwrap().remove("1");
        doc.as_object_mut().unwrap().insert("2".into(), step.clone());
        assert!(matches!(History::from_value(doc), Err(HistoryError::MissingStep(1))));

        let mut doc = two_steps();
        doc.as_object_mut().unwrap().insert("x".into(), step);
        assert!(matches!(History::from_value(doc), Err(HistoryError::BadStepKey(k)) if k == "x"));
    }

    #[test]
    fn rejects_aliased_step_keys() {
        for alias in ["01", "+1", " 1", "1 "] {
            let mut doc = two_steps();
            let step = doc["1"].clone();
            doc.as_object_mut().unwrap().insert(alias.into(), step);
            assert!(
                matches!(History::from_value(doc), Err(HistoryError::BadStepKey(ref k)) if k == alias),
                "{alias:?} accepted"
            );
        }
    }

    #[test]
    fn rejects_empty_and_non_map_documents() {
        assert!(matches!(History::from_value(json!({})), Err(HistoryError::Empty)));
        assert!(matches!(History::from_value(json!([1, 2])), Err(HistoryError::Json(_))));
    }

    #[test]
    fn rejects_unpaired_status() {
        let mut doc = two_steps();
        doc["1"]["targets"]["status"] = json!([0]);
        assert!(matches!(
            History::from_value(doc),
            Err(HistoryError::LengthMismatch { step: 1, group: "targets", positions: 2, statuses: 1 })
        ));
    }

    #[test]
    fn slider_and_beam_counts_are_fixed() {
        let mut doc = two_steps();
        doc["1"]["sliders"] = json!({ "position": [[1.0, 2.0]], "status": [30] });
        assert!(matches!(
            History::from_value(doc),
            Err(HistoryError::FixedGroupResized { group: "sliders", expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn points_need_two_coordinates() {
        let mut doc = two_steps();
        doc["1"]["targets"]["position"] = json!([[1.0], [2.0, 3.0]]);
        assert!(matches!(History::from_value(doc), Err(HistoryError::Json(_))));
    }

    #[test]
    fn value_roundtrip_keeps_step_keys() {
        let history = History::from_value(two_steps()).unwrap();
        let value = history.to_value();
        assert_eq!(value["1"]["targets"]["position"][0], json!([10.0, 20.0]));
        assert_eq!(History::from_value(value).unwrap(), history);
    }
}
