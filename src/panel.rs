// panel.rs
// Side panels of the replay view: per-rail and per-slider status rows, and the item color legend.

use std::borrow::Cow;

use palette::Srgb;

use crate::history::Snapshot;
use crate::status::{item_legend, status_to_name, ActuatorState, Style, Vocabulary};

/// Colored dot shown next to an actuator's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indicator {
    Green,
    Orange,
    Yellow,
    Blue,
    Red,
}

impl Indicator {
    pub fn color(self) -> Srgb<u8> {
        match self {
            Indicator::Green => Srgb::new(0, 128, 0),
            Indicator::Orange => Srgb::new(255, 165, 0),
            Indicator::Yellow => Srgb::new(255, 255, 0),
            Indicator::Blue => Srgb::new(0, 0, 255),
            Indicator::Red => Srgb::new(255, 0, 0),
        }
    }

    /// Rails: ready states green, active pick/place blue.
    pub fn for_rail(code: i32) -> Self {
        use ActuatorState::*;
        match ActuatorState::from_code(code) {
            Some(CanPick | CanPlace) => Indicator::Green,
            Some(Skipped) => Indicator::Orange,
            Some(SkipAndWait) => Indicator::Yellow,
            Some(Picking | Placing) => Indicator::Blue,
            _ => Indicator::Red,
        }
    }

    /// Sliders: idle green, waiting yellow, active pick/place blue.
    pub fn for_slider(code: i32) -> Self {
        use ActuatorState::*;
        match ActuatorState::from_code(code) {
            Some(Idle) => Indicator::Green,
            Some(Skipped) => Indicator::Orange,
            Some(SkipAndWait | Waiting) => Indicator::Yellow,
            Some(Picking | Placing) => Indicator::Blue,
            _ => Indicator::Red,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusRow {
    pub ordinal: usize,
    pub name: Cow<'static, str>,
    pub indicator: Indicator,
}

fn rows(statuses: &[i32], indicator: fn(i32) -> Indicator) -> Vec<StatusRow> {
    statuses
        .iter()
        .enumerate()
        .map(|(ordinal, &code)| StatusRow {
            ordinal,
            name: status_to_name(Vocabulary::Actuator, code),
            indicator: indicator(code),
        })
        .collect()
}

pub fn rail_rows(snapshot: &Snapshot) -> Vec<StatusRow> {
    rows(&snapshot.beams.status, Indicator::for_rail)
}

pub fn slider_rows(snapshot: &Snapshot) -> Vec<StatusRow> {
    rows(&snapshot.sliders.status, Indicator::for_slider)
}

/// Name and style of every item status, in table order.
pub fn legend() -> Vec<(&'static str, Style)> {
    item_legend().collect()
}
