// map.rs
// Package maps: target points placed on a package outline, stored under maps/.
// Edits are pure functions returning a new map, like params::set_param.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LoadError, MapError, StoreError};
use crate::store::{Kind, Store};

/// Colors a package point may take, as written in map files.
pub const PACKAGE_COLORS: [&str; 5] = ["red", "blue", "green", "yellow", "purple"];

/// Where and in which color a freshly added point appears.
pub const NEW_POINT: (f64, f64, &str) = (10.0, 10.0, "red");

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
    /// Outline vertices usually carry no color.
    #[serde(default)]
    pub color: String,
}

impl MapPoint {
    pub fn new(x: f64, y: f64, color: impl Into<String>) -> Self {
        Self {
            x,
            y,
            color: color.into(),
        }
    }
}

/// One package layout: target points and the contour they sit in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMap {
    #[serde(default)]
    pub points: Vec<MapPoint>,
    #[serde(default)]
    pub outline: Vec<MapPoint>,
}

impl PackageMap {
    pub fn from_value(value: Value) -> Result<Self, MapError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Value {
        // only numbers and strings, serialization cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.outline.is_empty()
    }

    fn check(&self, index: usize) -> Result<(), MapError> {
        if index >= self.points.len() {
            return Err(MapError::PointOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(())
    }
}

/// Appends a point at the default place and color; returns the new map and the point's index.
pub fn add_point(map: &PackageMap) -> (PackageMap, usize) {
    let mut next = map.clone();
    let (x, y, color) = NEW_POINT;
    next.points.push(MapPoint::new(x, y, color));
    let index = next.points.len() - 1;
    (next, index)
}

/// Removes point `index`. Later points shift down by one.
pub fn delete_point(map: &PackageMap, index: usize) -> Result<PackageMap, MapError> {
    map.check(index)?;
    let mut next = map.clone();
    next.points.remove(index);
    Ok(next)
}

pub fn recolor(map: &PackageMap, index: usize, color: &str) -> Result<PackageMap, MapError> {
    map.check(index)?;
    if !PACKAGE_COLORS.contains(&color) {
        return Err(MapError::UnknownColor(color.to_string()));
    }
    let mut next = map.clone();
    next.points[index].color = color.to_string();
    Ok(next)
}

pub fn move_point(map: &PackageMap, index: usize, x: f64, y: f64) -> Result<PackageMap, MapError> {
    map.check(index)?;
    let mut next = map.clone();
    next.points[index].x = x;
    next.points[index].y = y;
    Ok(next)
}

/// Reads map `name`. A document that is not a package map is reported as an error;
/// the caller shows an empty map in that case.
pub fn load_map<S: Store>(store: &S, name: &str) -> Result<PackageMap, LoadError> {
    let value = store.load_named(name, Kind::Map)?;
    let map = PackageMap::from_value(value).inspect_err(|e| {
        log::error!("Map {name} is not a package map: {e}");
    })?;
    Ok(map)
}

pub fn save_map<S: Store>(store: &S, name: &str, map: &PackageMap) -> Result<(), StoreError> {
    store.save_named(name, Kind::Map, &map.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::MemStore;
    use serde_json::json;

    fn sample() -> PackageMap {
        PackageMap::from_value(json!({
            "points": [
                { "x": 0.0, "y": 0.0, "color": "blue" },
                { "x": 5.0, "y": 7.5, "color": "green" }
            ],
            "outline": [
                { "x": -10.0, "y": -10.0 },
                { "x": 10.0, "y": -10.0 },
                { "x": 10.0, "y": 10.0 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn decodes_points_and_uncolored_outline() {
        let map = sample();
        assert_eq!(map.points[1], MapPoint::new(5.0, 7.5, "green"));
        assert_eq!(map.outline.len(), 3);
        assert_eq!(map.outline[0].color, "");
        assert!(PackageMap::from_value(json!({})).unwrap().is_empty());
    }

    #[test]
    fn rejects_documents_that_are_not_maps() {
        assert!(matches!(
            PackageMap::from_value(json!({ "points": [{ "x": "a" }] })),
            Err(MapError::Json(_))
        ));
        assert!(PackageMap::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn add_point_appends_default_point() {
        let map = sample();
        let (next, index) = add_point(&map);
        assert_eq!(index, 2);
        assert_eq!(next.points[2], MapPoint::new(10.0, 10.0, "red"));
        assert_eq!(map.points.len(), 2);
    }

    #[test]
    fn delete_point_shifts_later_points() {
        let next = delete_point(&sample(), 0).unwrap();
        assert_eq!(next.points, vec![MapPoint::new(5.0, 7.5, "green")]);
        assert_eq!(next.outline, sample().outline);
    }

    #[test]
    fn edits_reject_missing_points() {
        let map = sample();
        assert!(matches!(
            delete_point(&map, 2),
            Err(MapError::PointOutOfRange { index: 2, len: 2 })
        ));
        assert!(recolor(&map, 9, "red").is_err());
        assert!(move_point(&PackageMap::default(), 0, 1.0, 1.0).is_err());
    }

    #[test]
    fn recolor_and_move() {
        let map = sample();
        let next = recolor(&map, 1, "purple").unwrap();
        assert_eq!(next.points[1].color, "purple");
        assert!(matches!(recolor(&map, 1, "pink"), Err(MapError::UnknownColor(c)) if c == "pink"));

        let moved = move_point(&next, 1, -3.0, 4.0).unwrap();
        assert_eq!(moved.points[1], MapPoint::new(-3.0, 4.0, "purple"));
        assert_eq!(next.points[1].x, 5.0);
    }

    #[test]
    fn load_reports_invalid_documents() {
        let store = MemStore::default();
        store.docs.borrow_mut().insert("broken".into(), json!("not a map"));
        assert!(matches!(load_map(&store, "broken"), Err(LoadError::Map(_))));
        assert!(matches!(
            load_map(&store, "absent"),
            Err(LoadError::Store(StoreError::NotFound { .. }))
        ));

        save_map(&store, "box", &sample()).unwrap();
        assert_eq!(load_map(&store, "box").unwrap(), sample());
    }
}
