use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sortsim_viewer::config::SETTINGS_FILE;
use sortsim_viewer::playback::PlaybackSpeed;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to the viewer settings TOML
    #[arg(long, default_value = SETTINGS_FILE)]
    pub config: PathBuf,

    /// Data directory (overrides the settings file)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List recorded runs, or maps with --maps
    List {
        #[arg(long, default_value_t = false)]
        maps: bool,
    },

    /// Summary of a run (or "Current configuration") and its first frame
    Info {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Replay a run in real time
    Play {
        #[arg(value_name = "NAME")]
        name: String,

        /// Speed multiplier: 0.25, 0.5, 0.75 or 1 (overrides config)
        #[arg(long)]
        speed: Option<PlaybackSpeed>,

        /// Start frame
        #[arg(long, default_value_t = 0)]
        from: usize,

        /// Write one SVG per displayed frame into this directory
        #[arg(long)]
        svg_dir: Option<PathBuf>,
    },

    /// Render one frame as SVG
    Frame {
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(value_name = "INDEX")]
        index: usize,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change one saved parameter, e.g. `set conveyor.speed.0 80`
    Set {
        #[arg(value_name = "PATH")]
        path: String,

        /// JSON value
        #[arg(value_name = "VALUE")]
        value: String,
    },

    /// Print the points and outline of a saved map
    Map {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Delete a saved map
    DeleteMap {
        #[arg(value_name = "NAME")]
        name: String,
    },
}
