pub mod config;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod history;
pub mod loader;
pub mod map;
pub mod panel;
pub mod params;
pub mod playback;
pub mod session;
pub mod settings;
pub mod sliders;
pub mod status;
pub mod store;
pub mod svg;
