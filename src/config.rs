// Centralized constants for the replay viewer and the editor preview

use palette::Srgb;

// ====================
// Scene placement
// ====================
/// World-unit offset applied before scaling in the replay view.
pub const SIMULATION_XY_OFFSET: [f32; 2] = [100.0, 80.0];
/// World-unit offset used by the small preview next to the parameter editor.
pub const PREVIEW_XY_OFFSET: [f32; 2] = [100.0, 20.0];
/// Distance a beam sticks out past the conveyor edge, in world units.
pub const BEAM_OVERHANG: f32 = 70.0;
/// Label font size in world units (multiplied by the scale factor on screen).
pub const LABEL_FONT_SIZE: f32 = 35.0;

// ====================
// Colors
// ====================
pub const IN_CONVEYOR_FILL: Srgb<u8> = Srgb::new(170, 250, 210);
pub const OUT_CONVEYOR_FILL: Srgb<u8> = Srgb::new(250, 170, 170);
pub const BEAM_FILL: Srgb<u8> = Srgb::new(128, 128, 128);
pub const BEAM_ALPHA: f32 = 0.3;
pub const SLIDER_COLOR: Srgb<u8> = Srgb::new(160, 160, 160);
/// Head color while a slider carries a package.
pub const SLIDER_COLOR_PICKED: Srgb<u8> = Srgb::new(0, 110, 250);
pub const SLIDER_ALPHA: f32 = 0.8;
pub const STROKE_COLOR: Srgb<u8> = Srgb::new(0, 0, 0);
pub const STROKE_WIDTH: f32 = 2.0;
pub const LABEL_COLOR: Srgb<u8> = Srgb::new(0, 0, 255);

// ====================
// Playback
// ====================
/// Speed multipliers offered by the speed bar, slowest first.
pub const PLAYBACK_SPEEDS: [f32; 4] = [0.25, 0.5, 0.75, 1.0];
pub const DEFAULT_SPEED_INDEX: usize = 3;
/// Below this tick interval (ms) four frames are advanced per tick.
pub const FRAME_SKIP_4_BELOW_MS: f64 = 15.0;
/// Below this tick interval (ms) two frames are advanced per tick.
pub const FRAME_SKIP_2_BELOW_MS: f64 = 30.0;

// ====================
// Persistence
// ====================
/// Pseudo-entry prepended to the history list; selects the editor's configuration.
pub const CURRENT_CONFIGURATION: &str = "Current configuration";
/// Settings name the editor saves its configuration under.
pub const PARAMS_SETTINGS_NAME: &str = "params";
pub const MAPS_DIR: &str = "maps";
pub const HISTORY_DIR: &str = "history";
pub const HISTORY_FILE: &str = "history.json";
pub const PARAMS_FILE: &str = "params.json";

// ====================
// Viewer defaults
// ====================
pub const DEFAULT_CONTAINER_WIDTH: f32 = 1200.0;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const SETTINGS_FILE: &str = "viewer.toml";
