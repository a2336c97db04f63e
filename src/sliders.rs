// sliders.rs
// Per-frame geometry of the slider bodies, their arms and heads.

use ultraviolet::Vec2;

use crate::config;
use crate::geometry::{axis, Circle, EntityKey, Rect};
use crate::history::Snapshot;
use crate::params::SceneParams;
use crate::status::{ActuatorState, Style};

/// Sliders are grouped four per beam; the last two of each group sit on the far side.
pub const SLIDERS_PER_BEAM: usize = 4;
/// Each rail status covers two consecutive sliders.
pub const SLIDERS_PER_RAIL: usize = 2;

/// Direction the time index moved to reach the frame being derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelDirection {
    Forward,
    /// Also used when the index did not move.
    Backward,
}

impl TravelDirection {
    pub fn between(from: usize, to: usize) -> Self {
        if to > from {
            TravelDirection::Forward
        } else {
            TravelDirection::Backward
        }
    }
}

/// Side of the beam slider `i` works on: `1.0` for ordinals 2 and 3 of each group of four.
pub fn side(i: usize) -> f32 {
    if i % SLIDERS_PER_BEAM >= 2 {
        1.0
    } else {
        -1.0
    }
}

/// Drawn slider shapes for one frame. All three lists have one entry per slider ordinal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliderFrame {
    pub bodies: Vec<Rect>,
    pub arms: Vec<Rect>,
    pub heads: Vec<Circle>,
}

impl SliderFrame {
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }
}

/// Static slider parameters, resolved once per loaded configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SliderRig {
    beam_dir: [f32; 2],
    beam_width: f32,
    first_beam_pos: f32,
    spacing: f32,
    travel_sign: f32,
    slider_width: f32,
    arm_width: f32,
    /// Half of reach plus reach offset: the body extent across the beam.
    half_span: f32,
    head_radius: f32,
}

impl SliderRig {
    pub fn new(params: &SceneParams) -> Self {
        Self {
            beam_dir: params.beam.direction,
            beam_width: params.beam.width,
            first_beam_pos: params.beam.first_beam_pos,
            spacing: params.beam.spacing,
            travel_sign: params.conveyor.travel_sign(),
            slider_width: params.slider.width,
            arm_width: params.slider.arm_width,
            half_span: (params.slider.reach + params.slider.reach_offset) / 2.0,
            head_radius: params.target.width / 2.0,
        }
    }

    fn body_size(&self) -> Vec2 {
        let b = self.beam_dir;
        Vec2::new(
            (self.slider_width * b[0]).abs() + (self.half_span * b[1]).abs(),
            (self.slider_width * b[1]).abs() + (self.half_span * b[0]).abs(),
        )
    }

    fn head_style(fill: palette::Srgb<u8>) -> Style {
        Style::new(fill, config::SLIDER_ALPHA)
    }

    /// Shapes before the first derivation: bodies and arms parked off-scene, heads
    /// at their recorded start position in the default color.
    pub fn initial(&self, first: &Snapshot) -> SliderFrame {
        let n = first.sliders.len();
        let bodies = (0..n)
            .map(|i| {
                Rect::new(
                    Vec2::new(-1.0, -1.0),
                    self.body_size(),
                    config::SLIDER_COLOR,
                    config::SLIDER_ALPHA,
                    EntityKey::Slider(i),
                )
                .with_label(i.to_string())
            })
            .collect();
        let arms = (0..n)
            .map(|i| {
                Rect::new(
                    Vec2::new(-1.0, -1.0),
                    Vec2::zero(),
                    config::SLIDER_COLOR,
                    config::SLIDER_ALPHA,
                    EntityKey::SliderArm(i),
                )
            })
            .collect();
        let heads = (0..n)
            .map(|i| Circle {
                center: first.sliders.position(i).unwrap_or(Vec2::zero()),
                radius: self.head_radius,
                style: Self::head_style(config::SLIDER_COLOR),
                key: EntityKey::SliderHead(i),
            })
            .collect();
        SliderFrame { bodies, arms, heads }
    }

    /// Derives every slider's shapes for `snapshot`. Head colors depend on the
    /// previous frame, see [`next_head_fill`].
    pub fn update(
        &self,
        previous: &SliderFrame,
        snapshot: &Snapshot,
        direction: TravelDirection,
    ) -> SliderFrame {
        let n = snapshot.sliders.position.len();
        let mut frame = SliderFrame {
            bodies: Vec::with_capacity(n),
            arms: Vec::with_capacity(n),
            heads: Vec::with_capacity(n),
        };

        for (i, point) in snapshot.sliders.position.iter().enumerate() {
            let position = point.0;
            let (body, raw_body_origin) = self.body(i, position);
            frame.arms.push(self.arm(i, position, raw_body_origin));
            frame.bodies.push(body);

            let prev_style = previous
                .heads
                .get(i)
                .map(|h| h.style)
                .unwrap_or(Self::head_style(config::SLIDER_COLOR));
            let fill = next_head_fill(prev_style.fill, snapshot, i, direction);
            let style = if fill != prev_style.fill {
                Self::head_style(fill)
            } else {
                prev_style
            };
            frame.heads.push(Circle {
                center: position,
                radius: previous.heads.get(i).map(|h| h.radius).unwrap_or(self.head_radius),
                style,
                key: EntityKey::SliderHead(i),
            });
        }
        frame
    }

    fn beam_position(&self, i: usize) -> f32 {
        let beam_index = (i / SLIDERS_PER_BEAM) as f32;
        self.first_beam_pos + beam_index * self.spacing * self.travel_sign
    }

    fn body(&self, i: usize, position: Vec2) -> (Rect, Vec2) {
        let b = self.beam_dir;
        let side = side(i);
        let length_offset = if side > 0.0 { 0.0 } else { -self.half_span };
        let across = self.beam_position(i) + length_offset + self.beam_width * side / 2.0;

        let along_axis = |j: usize| {
            (axis(position, j) - self.slider_width / 2.0) * b[j] + across * b[1 - j]
        };
        let origin = Vec2::new(along_axis(0), along_axis(1));
        let rect = Rect::new(
            origin,
            self.body_size(),
            config::SLIDER_COLOR,
            config::SLIDER_ALPHA,
            EntityKey::Slider(i),
        )
        .with_label(i.to_string());
        (rect, origin)
    }

    fn arm(&self, i: usize, position: Vec2, body_origin: Vec2) -> Rect {
        let b = self.beam_dir;
        let side = side(i);
        let arm_width = [self.arm_width * b[0], self.arm_width * b[1]];
        let arm_length = [0, 1].map(|j| {
            (b[1 - j] * (axis(position, j) - axis(body_origin, j) - self.half_span / 2.0)).abs()
        });
        let side_offset = if side > 0.0 {
            [0.0, 0.0]
        } else {
            [-arm_length[0], -arm_length[1]]
        };
        let size = [0, 1].map(|j| arm_width[j] + arm_length[j]);
        let origin = [0, 1].map(|j| {
            axis(position, j) - size[j] + b[j].abs() * arm_width[j] / 2.0 - side_offset[j]
        });
        Rect::new(
            Vec2::new(origin[0], origin[1]),
            Vec2::new(size[0], size[1]),
            config::SLIDER_COLOR,
            config::SLIDER_ALPHA,
            EntityKey::SliderArm(i),
        )
    }
}

/// Head color of slider `i` after moving in `direction` onto `snapshot`.
///
/// The decision is only taken while the slider is in vertical movement: the head
/// is highlighted when its rail is picking and time runs forward, or placing and
/// time runs backward; otherwise it returns to the default color. In every other
/// state the head keeps `current`.
pub fn next_head_fill(
    current: palette::Srgb<u8>,
    snapshot: &Snapshot,
    i: usize,
    direction: TravelDirection,
) -> palette::Srgb<u8> {
    let slider_state = snapshot.sliders.status(i).and_then(ActuatorState::from_code);
    if slider_state != Some(ActuatorState::ZMovement) {
        return current;
    }
    let rail_state = snapshot
        .beams
        .status(i / SLIDERS_PER_RAIL)
        .and_then(ActuatorState::from_code);
    match (rail_state, direction) {
        (Some(ActuatorState::Picking), TravelDirection::Forward)
        | (Some(ActuatorState::Placing), TravelDirection::Backward) => config::SLIDER_COLOR_PICKED,
        _ => config::SLIDER_COLOR,
    }
}
