// session.rs
// One replay view: the loaded run, its static scene, the derived entity lists and the
// playback controller that drives them.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::config::SIMULATION_XY_OFFSET;
use crate::entities::sync_group;
use crate::error::{LoadError, StoreError};
use crate::geometry::{derive_scene, Circle, StaticScene};
use crate::history::{History, ItemGroup, Snapshot};
use crate::loader::{load_run, Selection};
use crate::params::{Configuration, EditContext};
use crate::playback::{FrameChange, PlaybackController, PlaybackSpeed, PlaybackState};
use crate::sliders::{SliderFrame, SliderRig, TravelDirection};
use crate::store::Store;

/// A message for the user that stays until dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Malformed data empties the view; a failed read leaves what was shown before.
fn is_malformed(e: &LoadError) -> bool {
    matches!(
        e,
        LoadError::History(_) | LoadError::Params(_) | LoadError::Store(StoreError::Json { .. })
    )
}

pub struct ReplaySession {
    container_width: f32,
    selection: Option<Selection>,
    params: Option<Arc<Configuration>>,
    history: Option<Arc<History>>,
    scene: Option<StaticScene>,
    rig: Option<SliderRig>,
    item_radius: f32,
    targets: Vec<Circle>,
    drops: Vec<Circle>,
    sliders: SliderFrame,
    controller: PlaybackController,
    notice: Option<Notice>,
}

impl ReplaySession {
    pub fn new(container_width: f32) -> Self {
        Self {
            container_width,
            selection: None,
            params: None,
            history: None,
            scene: None,
            rig: None,
            item_radius: 0.0,
            targets: Vec::new(),
            drops: Vec::new(),
            sliders: SliderFrame::default(),
            controller: PlaybackController::new(),
            notice: None,
        }
    }

    /// Switches to `selection`. "Current configuration" shows the editor's parameters
    /// without a history.
    pub fn select<S: Store>(
        &mut self,
        store: &S,
        selection: &Selection,
        editor: &EditContext,
    ) -> Result<(), LoadError> {
        match selection {
            Selection::CurrentConfiguration => match editor.config() {
                Some(config) => self.show_configuration(Arc::new(config.clone())),
                None => {
                    self.clear();
                    self.fail(LoadError::NoConfiguration)
                }
            },
            Selection::Recorded(name) => self.load_recorded(store, name),
        }
    }

    /// Loads a recorded run and shows its first frame.
    pub fn load_recorded<S: Store>(&mut self, store: &S, name: &str) -> Result<(), LoadError> {
        let run = match load_run(store, name) {
            Ok(run) => run,
            Err(e) => {
                if is_malformed(&e) {
                    self.clear();
                } else {
                    self.controller.pause();
                }
                return self.fail(e);
            }
        };
        self.install(
            Selection::Recorded(run.name.clone()),
            run.params,
            Some(run.history),
        )
    }

    pub fn show_configuration(&mut self, config: Arc<Configuration>) -> Result<(), LoadError> {
        self.install(Selection::CurrentConfiguration, config, None)
    }

    fn install(
        &mut self,
        selection: Selection,
        params: Arc<Configuration>,
        history: Option<Arc<History>>,
    ) -> Result<(), LoadError> {
        self.clear();
        let scene_params = match params.scene() {
            Ok(p) => p,
            Err(e) => return self.fail(e.into()),
        };

        self.scene = Some(derive_scene(
            &scene_params,
            SIMULATION_XY_OFFSET,
            self.container_width,
        ));
        let rig = SliderRig::new(&scene_params);
        self.item_radius = scene_params.target.width / 2.0;

        if let Some(history) = &history {
            if let Some(first) = history.get(0) {
                self.sliders = rig.initial(first);
            }
            self.controller
                .load(history.total_frames(), scene_params.time_step);
        }
        self.rig = Some(rig);
        self.selection = Some(selection);
        self.params = Some(params);
        self.history = history;
        self.notice = None;
        self.refresh(FrameChange { from: 0, to: 0 });
        Ok(())
    }

    /// Back to the empty state: nothing loaded, stopped, every derived list cleared.
    pub fn clear(&mut self) {
        self.controller.unload();
        self.selection = None;
        self.params = None;
        self.history = None;
        self.scene = None;
        self.rig = None;
        self.targets.clear();
        self.drops.clear();
        self.sliders = SliderFrame::default();
    }

    fn fail(&mut self, error: LoadError) -> Result<(), LoadError> {
        log::error!("Load failed: {error}");
        self.notice = Some(Notice {
            message: error.to_string(),
        });
        Err(error)
    }

    fn refresh(&mut self, change: FrameChange) {
        let (Some(history), Some(rig)) = (self.history.as_ref(), self.rig.as_ref()) else {
            return;
        };
        let Some(snapshot) = history.get(change.to) else {
            return;
        };
        self.targets = sync_group(
            &self.targets,
            &snapshot.targets,
            ItemGroup::Targets,
            self.item_radius,
        );
        self.drops = sync_group(&self.drops, &snapshot.drops, ItemGroup::Drops, self.item_radius);
        self.sliders = rig.update(
            &self.sliders,
            snapshot,
            TravelDirection::between(change.from, change.to),
        );
    }

    fn apply(&mut self, change: Option<FrameChange>) -> Option<FrameChange> {
        if let Some(change) = change {
            self.refresh(change);
        }
        change
    }

    // ==== Controls ====

    pub fn play(&mut self, now: Instant) {
        self.controller.play(now);
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn toggle(&mut self, now: Instant) {
        self.controller.toggle(now);
    }

    pub fn step(&mut self, delta: isize) -> Option<FrameChange> {
        let change = self.controller.step(delta);
        self.apply(change)
    }

    pub fn scrub(&mut self, index: usize, now: Instant) -> Option<FrameChange> {
        let change = self.controller.scrub(index, now);
        self.apply(change)
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed, now: Instant) {
        self.controller.set_speed(speed, now);
    }

    /// Drives autoplay; call whenever [`ReplaySession::next_deadline`] has passed.
    pub fn poll(&mut self, now: Instant) -> Option<FrameChange> {
        let change = self.controller.poll(now);
        self.apply(change)
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ==== Views ====

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn params(&self) -> Option<&Configuration> {
        self.params.as_deref()
    }

    pub fn history(&self) -> Option<&History> {
        self.history.as_deref()
    }

    pub fn scene(&self) -> Option<&StaticScene> {
        self.scene.as_ref()
    }

    pub fn targets(&self) -> &[Circle] {
        &self.targets
    }

    pub fn drops(&self) -> &[Circle] {
        &self.drops
    }

    pub fn sliders(&self) -> &SliderFrame {
        &self.sliders
    }

    /// Snapshot at the current index.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.history.as_ref()?.get(self.controller.index())
    }

    pub fn index(&self) -> usize {
        self.controller.index()
    }

    pub fn total_frames(&self) -> usize {
        self.controller.total_frames()
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.controller.speed()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.controller.next_deadline()
    }

    /// Simulated time of the current frame, in seconds.
    pub fn sim_time(&self) -> f64 {
        let step = self.params.as_ref().map(|p| p.time_step).unwrap_or(0.0);
        self.controller.index() as f64 * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{two_frame_history, MemStore};
    use crate::params::tests::{sample_config, sample_config_value};
    use crate::status::status_to_style;
    use serde_json::json;
    use ultraviolet::Vec2;

    fn session_with_run() -> (ReplaySession, MemStore) {
        let store = MemStore::default().with_run("run", two_frame_history(), sample_config_value());
        let mut session = ReplaySession::new(1200.0);
        session.load_recorded(&store, "run").unwrap();
        (session, store)
    }

    #[test]
    fn load_shows_first_frame_stopped() {
        let (session, _) = session_with_run();
        assert_eq!(session.index(), 0);
        assert_eq!(session.total_frames(), 1);
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(session.targets().is_empty());
        assert_eq!(session.sliders().len(), 1);
        assert!(session.scene().is_some());
        assert_eq!(session.selection(), Some(&Selection::Recorded("run".into())));
    }

    #[test]
    fn scrubbing_forward_grows_targets() {
        let (mut session, _) = session_with_run();
        let change = session.scrub(1, Instant::now());
        assert_eq!(change, Some(FrameChange { from: 0, to: 1 }));

        let targets = session.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].center, Vec2::new(10.0, 20.0));
        assert_eq!(targets[1].center, Vec2::new(30.0, 40.0));
        assert_eq!(targets[0].style, status_to_style(0));
        assert_eq!(targets[1].style, status_to_style(1));
        assert_eq!(targets[0].radius, 25.0);
        assert_eq!(session.drops().len(), 1);
        assert_eq!(session.sliders().heads[0].center, Vec2::new(520.0, 300.0));
    }

    #[test]
    fn stepping_back_shrinks_targets() {
        let (mut session, _) = session_with_run();
        session.step(1);
        assert_eq!(session.step(-1), Some(FrameChange { from: 1, to: 0 }));
        assert!(session.targets().is_empty());
        assert!(session.drops().is_empty());
    }

    #[test]
    fn playing_advances_through_poll() {
        let (mut session, _) = session_with_run();
        let t0 = Instant::now();
        session.play(t0);
        // 10 ms steps at x1 run four frames per tick, more than this run holds
        let due = session.next_deadline().unwrap();
        assert_eq!(session.poll(due), None);
        assert_eq!(session.state(), PlaybackState::Stopped);

        session.set_speed(PlaybackSpeed::from_index(0).unwrap(), t0);
        session.play(t0);
        let due = session.next_deadline().unwrap();
        assert_eq!(session.poll(due), Some(FrameChange { from: 0, to: 1 }));
        assert_eq!(session.targets().len(), 2);
    }

    #[test]
    fn reload_resets_playback() {
        let (mut session, store) = session_with_run();
        let now = Instant::now();
        session.scrub(1, now);
        session.play(now);
        session.load_recorded(&store, "run").unwrap();
        assert_eq!(session.index(), 0);
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(session.targets().is_empty());
    }

    #[test]
    fn malformed_run_empties_the_view_with_a_notice() {
        let (mut session, _) = session_with_run();
        let store = MemStore::default().with_run("bad", json!({"0": {"targets": 5}}), sample_config_value());
        assert!(session.load_recorded(&store, "bad").is_err());
        assert!(session.notice().is_some());
        assert!(session.scene().is_none());
        assert!(session.history().is_none());
        assert_eq!(session.total_frames(), 0);

        session.dismiss_notice();
        assert!(session.notice().is_none());
    }

    #[test]
    fn missing_run_keeps_what_was_shown() {
        let (mut session, store) = session_with_run();
        session.scrub(1, Instant::now());
        let err = session.load_recorded(&store, "nope").unwrap_err();
        assert!(matches!(err, LoadError::Store(StoreError::NotFound { .. })));
        assert!(session.notice().is_some());
        assert_eq!(session.index(), 1);
        assert_eq!(session.targets().len(), 2);
    }

    #[test]
    fn current_configuration_has_no_history() {
        let store = MemStore::default();
        let editor = EditContext::new(sample_config());
        let mut session = ReplaySession::new(1200.0);
        session
            .select(&store, &Selection::CurrentConfiguration, &editor)
            .unwrap();
        assert!(session.scene().is_some());
        assert!(session.history().is_none());
        assert_eq!(session.total_frames(), 0);
        session.play(Instant::now());
        assert_eq!(session.state(), PlaybackState::Stopped);
        assert!(session.sliders().is_empty());
    }

    #[test]
    fn current_configuration_needs_an_editor_config() {
        let store = MemStore::default();
        let mut session = ReplaySession::new(1200.0);
        let err = session
            .select(&store, &Selection::CurrentConfiguration, &EditContext::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::NoConfiguration));
        assert!(session.notice().is_some());
    }

    #[test]
    fn sim_time_follows_index() {
        let (mut session, _) = session_with_run();
        session.step(1);
        assert!((session.sim_time() - 0.01).abs() < 1e-12);
    }
}
