#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fresh directory under the system temp dir, unique per process and call.
pub fn temp_root(label: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "sortsim_viewer_{}_{}_{}",
        label,
        std::process::id(),
        timestamp
    ));
    std::fs::create_dir_all(&path).expect("temp dir");
    path
}

pub fn params() -> Value {
    json!({
        "unit": { "length": "mm", "duration": "s" },
        "timeStep": 0.01,
        "duration": 60.0,
        "seed": 3,
        "conveyor": {
            "speed": [70.0, 210.0],
            "length": 3000.0,
            "nbInConveyor": 2,
            "nbOutConveyor": 1,
            "inDirection": [-1, 0],
            "outDirection": [-1, 0],
            "inEndPos": [[0.0, 293.5], [0.0, 1020.5]],
            "outEndPos": [[0.0, 657.0]],
            "inWidth": [387.0, 387.0],
            "outWidth": [290.0],
            "inItemsPerRow": [6, 6],
            "outItemsPerRow": [4],
            "inRowSpacing": 60.0,
            "badProductRatio": 0.2,
            "nPackagesRow": 3,
            "packagesRowSpacing": 60.0,
            "packagesExtraSpacing": 20.0
        },
        "slider": { "width": 120.0, "armWidth": 20.0, "reach": 100.0, "reachOffset": 40.0 },
        "beam": {
            "spacing": 420.0,
            "width": 100.0,
            "length": 1300.0,
            "nbOfBeams": 6,
            "direction": [0, 1],
            "firstBeamPos": 600.0
        },
        "target": { "width": 50.0 }
    })
}

/// Two frames: no targets at 0, a FREE and an ASSIGNED target at 1.
pub fn growing_history() -> Value {
    json!({
        "0": {
            "targets": { "position": [], "status": [] },
            "drops": { "position": [], "status": [] },
            "sliders": { "position": [[500.0, 300.0], [500.0, 700.0]], "status": [30, 30] },
            "beams": { "status": [20] }
        },
        "1": {
            "targets": { "position": [[10.0, 20.0], [30.0, 40.0]], "status": [0, 1] },
            "drops": { "position": [], "status": [] },
            "sliders": { "position": [[510.0, 300.0], [500.0, 690.0]], "status": [35, 31] },
            "beams": { "status": [21] }
        }
    })
}

/// Writes `history/<name>/{history,params}.json` under `root`.
pub fn write_run(root: &std::path::Path, name: &str, history: &Value, params: &Value) {
    let dir = root.join("history").join(name);
    std::fs::create_dir_all(&dir).expect("run dir");
    std::fs::write(dir.join("history.json"), history.to_string()).expect("history");
    std::fs::write(dir.join("params.json"), params.to_string()).expect("params");
}
