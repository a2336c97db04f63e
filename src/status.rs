//! Integer status codes recorded in a history, their names and display styles.
//!
//! Two vocabularies share the same lookup mechanism: item codes carried by
//! targets and drops, and actuator codes carried by beams (rails) and sliders.
//! Which table applies follows from the group a code was read from.

use std::borrow::Cow;

use palette::Srgb;

/// Which status table a code belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vocabulary {
    /// Targets and drops.
    Item,
    /// Beams and sliders.
    Actuator,
}

/// Fill and opacity of a marker. The stroke is the same for every status.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub fill: Srgb<u8>,
    pub opacity: f32,
}

impl Style {
    pub const fn new(fill: Srgb<u8>, opacity: f32) -> Self {
        Self { fill, opacity }
    }

    /// Style used for codes missing from the item table.
    pub const UNASSIGNED: Style = Style::new(Srgb::new(0, 0, 0), 1.0);
}

struct ItemEntry {
    code: i32,
    name: &'static str,
    style: Style,
}

const ITEM_TABLE: [ItemEntry; 8] = [
    ItemEntry { code: 0, name: "FREE", style: Style::new(Srgb::new(130, 230, 230), 1.0) },
    ItemEntry { code: 1, name: "ASSIGNED", style: Style::new(Srgb::new(250, 250, 130), 1.0) },
    ItemEntry { code: 2, name: "SKIPPED", style: Style::new(Srgb::new(230, 130, 130), 1.0) },
    ItemEntry { code: 3, name: "GONE", style: Style::new(Srgb::new(0, 0, 0), 0.0) },
    ItemEntry { code: 4, name: "BAD", style: Style::new(Srgb::new(110, 110, 110), 1.0) },
    ItemEntry { code: 10, name: "NORMAL", style: Style::new(Srgb::new(230, 170, 120), 1.0) },
    ItemEntry { code: 11, name: "FLIPPED", style: Style::new(Srgb::new(130, 230, 130), 1.0) },
    ItemEntry { code: 13, name: "FILLED", style: Style::new(Srgb::new(255, 255, 255), 1.0) },
];

/// Beam and slider lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActuatorState {
    Skipped,
    CanPick,
    Picking,
    CanPlace,
    Placing,
    DonePlacing,
    WaitConveyor,
    Idle,
    Traveling,
    SkipAndWait,
    Dropped,
    Waiting,
    /// Vertical (z axis) movement of a slider head.
    ZMovement,
}

impl ActuatorState {
    pub fn from_code(code: i32) -> Option<Self> {
        use ActuatorState::*;
        Some(match code {
            2 => Skipped,
            20 => CanPick,
            21 => Picking,
            22 => CanPlace,
            23 => Placing,
            24 => DonePlacing,
            25 => WaitConveyor,
            30 => Idle,
            31 => Traveling,
            32 => SkipAndWait,
            33 => Dropped,
            34 => Waiting,
            35 => ZMovement,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        use ActuatorState::*;
        match self {
            Skipped => "SKIPPED",
            CanPick => "CAN_PICK",
            Picking => "PICKING",
            CanPlace => "CAN_PLACE",
            Placing => "PLACING",
            DonePlacing => "DONE_PLACING",
            WaitConveyor => "WAIT_CONVEYOR",
            Idle => "IDLE",
            Traveling => "TRAVELING",
            SkipAndWait => "SKIP_N_WAIT",
            Dropped => "DROPPED",
            Waiting => "WAITING",
            ZMovement => "Z_MVMT",
        }
    }
}

/// Name of `code` in the given vocabulary. Never fails: unknown codes map to `UNKNOWN <code>`.
pub fn status_to_name(vocabulary: Vocabulary, code: i32) -> Cow<'static, str> {
    let known = match vocabulary {
        Vocabulary::Item => ITEM_TABLE.iter().find(|e| e.code == code).map(|e| e.name),
        Vocabulary::Actuator => ActuatorState::from_code(code).map(ActuatorState::name),
    };
    match known {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("UNKNOWN {code}")),
    }
}

/// Display style of a target or drop status; unknown codes get [`Style::UNASSIGNED`].
pub fn status_to_style(code: i32) -> Style {
    ITEM_TABLE
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.style)
        .unwrap_or(Style::UNASSIGNED)
}

/// Every item status in table order, for the color legend.
pub fn item_legend() -> impl Iterator<Item = (&'static str, Style)> {
    ITEM_TABLE.iter().map(|e| (e.name, e.style))
}
