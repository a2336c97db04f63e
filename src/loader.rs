// loader.rs
// Fetches a recorded run (history + the parameters it was simulated with) as one unit.

use std::fmt;
use std::sync::Arc;

use crate::config::{CURRENT_CONFIGURATION, HISTORY_FILE, PARAMS_FILE};
use crate::error::{LoadError, StoreError};
use crate::history::History;
use crate::params::Configuration;
use crate::store::{run_document, Kind, Store};

/// One entry of the history selection list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The configuration open in the editor, shown without a history.
    CurrentConfiguration,
    Recorded(String),
}

impl Selection {
    pub fn from_label(label: &str) -> Self {
        if label == CURRENT_CONFIGURATION {
            Selection::CurrentConfiguration
        } else {
            Selection::Recorded(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Selection::CurrentConfiguration => CURRENT_CONFIGURATION,
            Selection::Recorded(name) => name,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A loaded run. Both halves are shared read-only until the next load replaces them.
#[derive(Clone, Debug)]
pub struct LoadedRun {
    pub name: String,
    pub history: Arc<History>,
    pub params: Arc<Configuration>,
}

/// Loads `history/<name>/history.json` and `history/<name>/params.json`.
///
/// Nothing is returned unless both documents decode and the parameters describe a
/// drawable scene, so callers never see half a run.
pub fn load_run<S: Store>(store: &S, name: &str) -> Result<LoadedRun, LoadError> {
    let history_doc = store.load_named(&run_document(name, HISTORY_FILE), Kind::Settings)?;
    let params_doc = store.load_named(&run_document(name, PARAMS_FILE), Kind::Settings)?;

    let history = History::from_value(history_doc)?;
    let params = Configuration::from_value(params_doc)?;
    params.scene()?;

    log::info!(
        "Loaded run {name}: {} frames, {} sliders",
        history.len(),
        history.slider_count()
    );
    Ok(LoadedRun {
        name: name.to_string(),
        history: Arc::new(history),
        params: Arc::new(params),
    })
}

/// The selection list: "Current configuration" followed by every recorded run.
pub fn selection_list<S: Store>(store: &S) -> Result<Vec<Selection>, StoreError> {
    let runs = store.list_names(Kind::Settings)?;
    Ok(std::iter::once(Selection::CurrentConfiguration)
        .chain(runs.into_iter().map(Selection::Recorded))
        .collect())
}

/// Name of the most recent run, i.e. the last one listed.
pub fn latest_run<S: Store>(store: &S) -> Result<Option<String>, StoreError> {
    Ok(store.list_names(Kind::Settings)?.pop())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::params::tests::sample_config_value;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// In-memory store keyed by the requested name.
    #[derive(Default)]
    pub(crate) struct MemStore {
        pub docs: RefCell<BTreeMap<String, Value>>,
        pub runs: Vec<String>,
    }

    impl MemStore {
        pub fn with_run(mut self, name: &str, history: Value, params: Value) -> Self {
            let mut docs = self.docs.borrow_mut();
            docs.insert(run_document(name, HISTORY_FILE), history);
            docs.insert(run_document(name, PARAMS_FILE), params);
            drop(docs);
            self.runs.push(name.to_string());
            self
        }
    }

    impl Store for MemStore {
        fn load_named(&self, name: &str, _kind: Kind) -> Result<Value, StoreError> {
            self.docs
                .borrow()
                .get(name)
                .cloned()
                .ok_or_else(|| StoreError::NotFound { path: name.into() })
        }

        fn list_names(&self, _kind: Kind) -> Result<Vec<String>, StoreError> {
            Ok(self.runs.clone())
        }

        fn save_named(&self, name: &str, _kind: Kind, data: &Value) -> Result<(), StoreError> {
            self.docs.borrow_mut().insert(name.to_string(), data.clone());
            Ok(())
        }

        fn delete_named(&self, name: &str, _kind: Kind) -> Result<(), StoreError> {
            self.docs
                .borrow_mut()
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound { path: name.into() })
        }
    }

    pub(crate) fn two_frame_history() -> Value {
        json!({
            "0": {
                "targets": { "position": [], "status": [] },
                "drops": { "position": [], "status": [] },
                "sliders": { "position": [[500.0, 300.0]], "status": [30] },
                "beams": { "status": [30] }
            },
            "1": {
                "targets": { "position": [[10.0, 20.0], [30.0, 40.0]], "status": [0, 1] },
                "drops": { "position": [[70.0, 80.0]], "status": [10] },
                "sliders": { "position": [[520.0, 300.0]], "status": [31] },
                "beams": { "status": [31] }
            }
        })
    }

    #[test]
    fn loads_both_halves() {
        let store = MemStore::default().with_run("run-a", two_frame_history(), sample_config_value());
        let run = load_run(&store, "run-a").unwrap();
        assert_eq!(run.name, "run-a");
        assert_eq!(run.history.total_frames(), 1);
        assert_eq!(run.params.time_step, 0.01);
    }

    #[test]
    fn missing_params_fail_the_whole_load() {
        let store = MemStore::default().with_run("run-a", two_frame_history(), sample_config_value());
        store
            .docs
            .borrow_mut()
            .remove(&run_document("run-a", PARAMS_FILE));
        assert!(matches!(
            load_run(&store, "run-a"),
            Err(LoadError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[test]
    fn malformed_history_is_reported() {
        let store = MemStore::default().with_run("bad", json!({"0": {"targets": 5}}), sample_config_value());
        assert!(matches!(load_run(&store, "bad"), Err(LoadError::History(_))));
    }

    #[test]
    fn selection_list_starts_with_current_configuration() {
        let store = MemStore::default()
            .with_run("a", two_frame_history(), sample_config_value())
            .with_run("b", two_frame_history(), sample_config_value());
        let list = selection_list(&store).unwrap();
        assert_eq!(
            list,
            vec![
                Selection::CurrentConfiguration,
                Selection::Recorded("a".into()),
                Selection::Recorded("b".into()),
            ]
        );
        assert_eq!(latest_run(&store).unwrap().as_deref(), Some("b"));
        assert_eq!(latest_run(&MemStore::default()).unwrap(), None);
    }

    #[test]
    fn labels_roundtrip() {
        assert_eq!(Selection::from_label("Current configuration"), Selection::CurrentConfiguration);
        assert_eq!(Selection::from_label("run-2").label(), "run-2");
        assert_eq!(Selection::CurrentConfiguration.to_string(), "Current configuration");
    }
}
