mod cli;

use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use sortsim_viewer::error::{LoadError, StoreError};
use sortsim_viewer::loader::{latest_run, selection_list, Selection};
use sortsim_viewer::map::{load_map, PackageMap};
use sortsim_viewer::panel::{rail_rows, slider_rows};
use sortsim_viewer::params::{flow_rates, EditContext};
use sortsim_viewer::playback::PlaybackState;
use sortsim_viewer::session::ReplaySession;
use sortsim_viewer::settings::ViewerSettings;
use sortsim_viewer::store::{FsStore, Kind, Store};
use sortsim_viewer::svg::render_session;

use cli::{Args, Command};

/// "last" picks the most recent run.
const LAST_SIMULATION: &str = "last";

fn main() -> Result<()> {
    // Install logger immediately, then set runtime max level from the settings file.
    let mut builder = env_logger::builder();
    builder.filter_level(log::LevelFilter::Trace);
    builder.parse_default_env();
    let _ = builder.try_init();
    log::set_max_level(log::LevelFilter::Info);

    let args = Args::parse();
    let mut settings = ViewerSettings::load_or_default(&args.config)
        .map_err(|e| anyhow!("failed to read {}: {e}", args.config.display()))?;
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(settings.level_filter());
    }
    if let Some(dir) = args.data_dir {
        settings.data_dir = dir;
    }

    let store = FsStore::new(&settings.data_dir);
    log::debug!("Data directory {}", store.root().display());

    match args.command {
        Command::List { maps } => list(&store, maps),
        Command::Info { name } => info(&store, &settings, &name),
        Command::Play {
            name,
            speed,
            from,
            svg_dir,
        } => {
            let speed = speed.unwrap_or(settings.speed);
            play(&store, &settings, &name, speed, from, svg_dir.as_deref())
        }
        Command::Frame {
            name,
            index,
            output,
        } => frame(&store, &settings, &name, index, output.as_deref()),
        Command::Set { path, value } => set(&store, &path, &value),
        Command::Map { name } => show_map(&store, &name),
        Command::DeleteMap { name } => {
            store.delete_named(&name, Kind::Map)?;
            println!("Deleted map {name}");
            Ok(())
        }
    }
}

fn list(store: &FsStore, maps: bool) -> Result<()> {
    if maps {
        for name in store.list_names(Kind::Map)? {
            println!("{name}");
        }
    } else {
        for selection in selection_list(store)? {
            println!("{selection}");
        }
    }
    Ok(())
}

/// A map file that is not a package map shows as an empty map.
fn show_map(store: &FsStore, name: &str) -> Result<()> {
    let map = match load_map(store, name) {
        Ok(map) => map,
        Err(LoadError::Map(_) | LoadError::Store(StoreError::Json { .. })) => {
            eprintln!("Invalid JSON file.");
            PackageMap::default()
        }
        Err(e) => return Err(e.into()),
    };
    println!("{name}: {} points, {} outline vertices", map.points.len(), map.outline.len());
    for (i, point) in map.points.iter().enumerate() {
        println!("  {i:>3} ({:.1}, {:.1}) {}", point.x, point.y, point.color);
    }
    Ok(())
}

/// Editor state for "Current configuration"; empty when no parameters were saved yet.
fn editor(store: &FsStore) -> EditContext {
    EditContext::load(store).unwrap_or_else(|e| {
        log::warn!("No saved parameters: {e}");
        EditContext::default()
    })
}

fn open(store: &FsStore, settings: &ViewerSettings, name: &str) -> Result<ReplaySession> {
    let selection = if name == LAST_SIMULATION {
        let latest = latest_run(store)?.ok_or_else(|| anyhow!("no recorded runs in {}", store.root().display()))?;
        Selection::Recorded(latest)
    } else {
        Selection::from_label(name)
    };
    let mut session = ReplaySession::new(settings.container_width);
    session
        .select(store, &selection, &editor(store))
        .with_context(|| format!("cannot open {selection}"))?;
    Ok(session)
}

fn info(store: &FsStore, settings: &ViewerSettings, name: &str) -> Result<()> {
    let session = open(store, settings, name)?;
    let Some(params) = session.params() else {
        return Ok(());
    };

    println!("{}", session.selection().map(|s| s.label()).unwrap_or(name));
    println!("  frames:     {}", session.total_frames() + 1);
    println!("  time step:  {} s", params.time_step);
    println!("  duration:   {} {}", params.duration, params.unit_of("duration"));
    println!("  seed:       {}", params.seed);
    match flow_rates(params) {
        Ok(rates) => println!(
            "  flow rate:  {:.1} in / {:.1} out per minute",
            rates.input, rates.output
        ),
        Err(e) => log::warn!("Flow rates unavailable: {e}"),
    }
    if let Some(scene) = session.scene() {
        println!(
            "  scene:      {:.0} x {:.0}, scale {:.4}",
            scene.bounds.width(),
            scene.bounds.height(),
            scene.scale
        );
    }
    if let Some(snapshot) = session.snapshot() {
        println!("  rails:");
        for row in rail_rows(snapshot) {
            println!("    {:>3} {:<14} {:?}", row.ordinal, row.name, row.indicator);
        }
        println!("  sliders:");
        for row in slider_rows(snapshot) {
            println!("    {:>3} {:<14} {:?}", row.ordinal, row.name, row.indicator);
        }
    }
    Ok(())
}

fn write_svg(session: &ReplaySession, dir: &Path) -> Result<()> {
    let Some(doc) = render_session(session) else {
        return Ok(());
    };
    let path = dir.join(format!("frame_{:06}.svg", session.index()));
    std::fs::write(&path, doc).with_context(|| format!("writing {}", path.display()))
}

fn play(
    store: &FsStore,
    settings: &ViewerSettings,
    name: &str,
    speed: sortsim_viewer::playback::PlaybackSpeed,
    from: usize,
    svg_dir: Option<&Path>,
) -> Result<()> {
    let mut session = open(store, settings, name)?;
    if let Some(dir) = svg_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let now = Instant::now();
    session.set_speed(speed, now);
    session.scrub(from, now);
    if let Some(dir) = svg_dir {
        write_svg(&session, dir)?;
    }
    session.play(now);
    log::info!(
        "Playing from frame {} of {} at {}",
        session.index(),
        session.total_frames(),
        session.speed()
    );

    while session.state() == PlaybackState::Playing {
        let Some(deadline) = session.next_deadline() else {
            break;
        };
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        if session.poll(Instant::now()).is_some() {
            log::info!(
                "frame {}/{}  t = {:.2} s  targets {}  drops {}",
                session.index(),
                session.total_frames(),
                session.sim_time(),
                session.targets().len(),
                session.drops().len()
            );
            if let Some(dir) = svg_dir {
                write_svg(&session, dir)?;
            }
        }
    }
    log::info!("Stopped at frame {}", session.index());
    Ok(())
}

fn frame(
    store: &FsStore,
    settings: &ViewerSettings,
    name: &str,
    index: usize,
    output: Option<&Path>,
) -> Result<()> {
    let mut session = open(store, settings, name)?;
    session.scrub(index, Instant::now());
    let doc = render_session(&session).ok_or_else(|| anyhow!("nothing to render"))?;
    match output {
        Some(path) => std::fs::write(path, doc).with_context(|| format!("writing {}", path.display()))?,
        None => print!("{doc}"),
    }
    Ok(())
}

fn set(store: &FsStore, path: &str, value: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(value)
        .or_else(|_| serde_json::to_value(value))
        .context("value is not JSON")?;
    let mut editor = EditContext::load(store)?;
    editor.update(path, value)?;
    editor.save(store)?;
    println!("Saved {path}");
    Ok(())
}
