// Static scene geometry (conveyors and beams), the shape records drawn every frame,
// and the world-to-screen projection.

use std::fmt;

use palette::Srgb;
use ultraviolet::Vec2;

use crate::config;
use crate::params::SceneParams;
use crate::status::Style;

/// Stable identity of a drawn shape. Dynamic entities are identified by their ordinal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKey {
    InConveyor(usize),
    OutConveyor(usize),
    Beam(usize),
    Target(usize),
    Drop(usize),
    Slider(usize),
    SliderArm(usize),
    SliderHead(usize),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::InConveyor(i) => write!(f, "conveyor-in-{i}"),
            EntityKey::OutConveyor(i) => write!(f, "conveyor-out-{i}"),
            EntityKey::Beam(i) => write!(f, "beam-{i}"),
            EntityKey::Target(i) => write!(f, "targets-{i}"),
            EntityKey::Drop(i) => write!(f, "drops-{i}"),
            EntityKey::Slider(i) => write!(f, "slider-{i}"),
            EntityKey::SliderArm(i) => write!(f, "slider-arm-{i}"),
            EntityKey::SliderHead(i) => write!(f, "slider-head-{i}"),
        }
    }
}

/// Axis-aligned rectangle in world units. `size` is never negative.
#[derive(Clone, Debug, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
    pub fill: Srgb<u8>,
    pub opacity: f32,
    pub key: EntityKey,
    pub label: Option<String>,
}

/// Circle marker in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
    pub style: Style,
    pub key: EntityKey,
}

#[inline]
pub(crate) fn axis(v: Vec2, j: usize) -> f32 {
    if j == 0 {
        v.x
    } else {
        v.y
    }
}

impl Rect {
    /// Folds a negative extent back into the origin so that the same area is
    /// described with a non-negative size.
    pub fn normalized(origin: Vec2, size: Vec2) -> (Vec2, Vec2) {
        let mut origin = origin;
        let mut size = size;
        if size.x < 0.0 {
            origin.x += size.x;
            size.x = -size.x;
        }
        if size.y < 0.0 {
            origin.y += size.y;
            size.y = -size.y;
        }
        (origin, size)
    }

    pub fn new(origin: Vec2, size: Vec2, fill: Srgb<u8>, opacity: f32, key: EntityKey) -> Self {
        let (origin, size) = Self::normalized(origin, size);
        Self {
            origin,
            size,
            fill,
            opacity,
            key,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }
}

/// Running bounding box of the static scene. The world origin is always inside it
/// since every view is positioned relative to that origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Vec2::zero(),
            max: Vec2::zero(),
        }
    }
}

impl Bounds {
    pub fn include(&mut self, rect: &Rect) {
        let far = rect.max();
        self.min = self.min.min_by_component(rect.origin).min_by_component(far);
        self.max = self.max.max_by_component(rect.origin).max_by_component(far);
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Conveyors and beams, derived once per (configuration, container) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticScene {
    pub rects: Vec<Rect>,
    pub bounds: Bounds,
    /// Pixels per world unit.
    pub scale: f32,
    pub offset: Vec2,
}

#[derive(Clone, Copy)]
enum ConveyorSide {
    In,
    Out,
}

fn conveyor_rect(params: &SceneParams, side: ConveyorSide, idx: usize) -> Option<Rect> {
    let c = &params.conveyor;
    let (width, direction, end, fill, key) = match side {
        ConveyorSide::In => (
            *c.in_width.get(idx)?,
            c.in_direction,
            *c.in_end_pos.get(idx)?,
            config::IN_CONVEYOR_FILL,
            EntityKey::InConveyor(idx),
        ),
        ConveyorSide::Out => (
            *c.out_width.get(idx)?,
            c.out_direction,
            *c.out_end_pos.get(idx)?,
            config::OUT_CONVEYOR_FILL,
            EntityKey::OutConveyor(idx),
        ),
    };

    let across = Vec2::new((direction[1] * width).abs(), (direction[0] * width).abs());
    let along = Vec2::new(-direction[0] * c.length, -direction[1] * c.length);
    let origin = Vec2::new(end[0], end[1]) - across * 0.5;
    Some(Rect::new(origin, across + along, fill, 1.0, key))
}

fn beam_rect(params: &SceneParams, idx: usize) -> Rect {
    let b = &params.beam;
    let d = b.direction;
    let sign = params.conveyor.travel_sign();

    let across = Vec2::new(b.width * d[1], b.width * d[0]);
    let along = Vec2::new(b.length * d[0], b.length * d[1]);
    let position = b.first_beam_pos + idx as f32 * b.spacing * sign - b.width / 2.0;
    let origin = Vec2::new(
        d[1] * position - d[0] * config::BEAM_OVERHANG,
        d[0] * position - d[1] * config::BEAM_OVERHANG,
    );
    Rect::new(origin, across + along, config::BEAM_FILL, config::BEAM_ALPHA, EntityKey::Beam(idx))
        .with_label(idx.to_string())
}

/// Lays out input conveyors, output conveyors, then beams, and fits the scene
/// (plus `offset` on both sides) to `container_width` pixels.
pub fn derive_scene(params: &SceneParams, offset: [f32; 2], container_width: f32) -> StaticScene {
    let c = &params.conveyor;
    let mut rects = Vec::with_capacity(c.nb_in_conveyor + c.nb_out_conveyor + params.beam.nb_of_beams);
    let mut bounds = Bounds::default();

    let conveyors = (0..c.nb_in_conveyor)
        .map(|i| (ConveyorSide::In, i))
        .chain((0..c.nb_out_conveyor).map(|i| (ConveyorSide::Out, i)));
    for (side, i) in conveyors {
        match conveyor_rect(params, side, i) {
            Some(rect) => {
                bounds.include(&rect);
                rects.push(rect);
            }
            None => log::warn!("Conveyor {i} is missing its width or end position, skipped"),
        }
    }

    for i in 0..params.beam.nb_of_beams {
        let rect = beam_rect(params, i);
        bounds.include(&rect);
        rects.push(rect);
    }

    let span = bounds.width() + 2.0 * offset[0];
    let scale = if span > 0.0 && span.is_finite() {
        container_width / span
    } else {
        1.0
    };

    StaticScene {
        rects,
        bounds,
        scale,
        offset: Vec2::new(offset[0], offset[1]),
    }
}

/// Pixel-space rectangle ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label_at: Vec2,
    pub font_size: f32,
}

/// Pixel-space circle ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenCircle {
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
}

impl StaticScene {
    pub fn project_point(&self, world: Vec2) -> Vec2 {
        (world + self.offset) * self.scale
    }

    pub fn project_rect(&self, rect: &Rect) -> ScreenRect {
        let at = self.project_point(rect.origin);
        let size = rect.size * self.scale;
        ScreenRect {
            x: at.x,
            y: at.y,
            width: size.x,
            height: size.y,
            label_at: at + size * 0.5,
            font_size: config::LABEL_FONT_SIZE * self.scale,
        }
    }

    pub fn project_circle(&self, circle: &Circle) -> ScreenCircle {
        let at = self.project_point(circle.center);
        ScreenCircle {
            cx: at.x,
            cy: at.y,
            r: circle.radius * self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::tests::sample_config;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn negative_size_is_folded_into_origin() {
        let (origin, size) = Rect::normalized(Vec2::new(50.0, 50.0), Vec2::new(-10.0, 5.0));
        assert_eq!(origin, Vec2::new(40.0, 50.0));
        assert_eq!(size, Vec2::new(10.0, 5.0));

        let (origin, size) = Rect::normalized(Vec2::new(0.0, 0.0), Vec2::new(3.0, -4.0));
        assert_eq!(origin, Vec2::new(0.0, -4.0));
        assert_eq!(size, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn bounds_cover_normalized_rects() {
        let mut bounds = Bounds::default();
        let rect = Rect::new(
            Vec2::new(50.0, 50.0),
            Vec2::new(-10.0, 5.0),
            config::BEAM_FILL,
            1.0,
            EntityKey::Beam(0),
        );
        bounds.include(&rect);
        assert_eq!(bounds.min, Vec2::new(0.0, 0.0));
        assert_eq!(bounds.max, Vec2::new(50.0, 55.0));

        let far = Rect::new(
            Vec2::new(-20.0, 10.0),
            Vec2::new(5.0, -30.0),
            config::BEAM_FILL,
            1.0,
            EntityKey::Beam(1),
        );
        bounds.include(&far);
        assert_eq!(bounds.min, Vec2::new(-20.0, -20.0));
        assert_eq!(bounds.max, Vec2::new(50.0, 55.0));
    }

    #[test]
    fn sample_scene_layout() {
        let params = sample_config().scene().unwrap();
        let scene = derive_scene(&params, config::SIMULATION_XY_OFFSET, 1200.0);
        assert_eq!(scene.rects.len(), 2 + 1 + 6);

        let keys: Vec<_> = scene.rects.iter().map(|r| r.key).collect();
        assert_eq!(keys[0], EntityKey::InConveyor(0));
        assert_eq!(keys[2], EntityKey::OutConveyor(0));
        assert_eq!(keys[3], EntityKey::Beam(0));

        let first_in = &scene.rects[0];
        assert_eq!(first_in.origin, Vec2::new(0.0, 100.0));
        assert_eq!(first_in.size, Vec2::new(3000.0, 387.0));

        let out = &scene.rects[2];
        assert_eq!(out.origin, Vec2::new(0.0, 512.0));
        assert_eq!(out.size, Vec2::new(3000.0, 290.0));

        // the input direction points to -x, so beams march towards -x
        let first_beam = &scene.rects[3];
        assert_eq!(first_beam.origin, Vec2::new(550.0, -70.0));
        assert_eq!(first_beam.size, Vec2::new(100.0, 1300.0));
        assert_eq!(first_beam.label.as_deref(), Some("0"));
        let last_beam = &scene.rects[8];
        assert_eq!(last_beam.origin, Vec2::new(-1550.0, -70.0));
        assert_eq!(last_beam.label.as_deref(), Some("5"));

        assert_eq!(scene.bounds.min, Vec2::new(-1550.0, -70.0));
        assert_eq!(scene.bounds.max, Vec2::new(3000.0, 1230.0));
        assert!(close(scene.scale, 1200.0 / 4750.0));
    }

    #[test]
    fn no_rect_has_negative_size() {
        let mut params = sample_config().scene().unwrap();
        params.conveyor.in_direction = [1.0, 0.0];
        params.beam.direction = [0.0, -1.0];
        let scene = derive_scene(&params, [0.0, 0.0], 800.0);
        for rect in &scene.rects {
            assert!(rect.size.x >= 0.0 && rect.size.y >= 0.0, "{}", rect.key);
        }
    }

    #[test]
    fn missing_conveyor_entries_are_skipped() {
        let mut params = sample_config().scene().unwrap();
        params.conveyor.nb_in_conveyor = 3;
        let scene = derive_scene(&params, [0.0, 0.0], 800.0);
        assert_eq!(scene.rects.len(), 2 + 1 + 6);
    }

    #[test]
    fn degenerate_scene_keeps_unit_scale() {
        let mut params = sample_config().scene().unwrap();
        params.conveyor.nb_in_conveyor = 0;
        params.conveyor.nb_out_conveyor = 0;
        params.beam.nb_of_beams = 0;
        let scene = derive_scene(&params, [0.0, 0.0], 800.0);
        assert!(scene.rects.is_empty());
        assert_eq!(scene.scale, 1.0);
    }

    #[test]
    fn projection_applies_offset_then_scale() {
        let params = sample_config().scene().unwrap();
        let mut scene = derive_scene(&params, [100.0, 80.0], 1200.0);
        scene.scale = 0.5;
        let circle = Circle {
            center: Vec2::new(10.0, 20.0),
            radius: 25.0,
            style: Style::UNASSIGNED,
            key: EntityKey::Target(0),
        };
        assert_eq!(
            scene.project_circle(&circle),
            ScreenCircle { cx: 55.0, cy: 50.0, r: 12.5 }
        );
        let rect = Rect::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 4.0),
            config::BEAM_FILL,
            1.0,
            EntityKey::Beam(0),
        );
        let screen = scene.project_rect(&rect);
        assert_eq!((screen.x, screen.y, screen.width, screen.height), (50.0, 40.0, 5.0, 2.0));
        assert_eq!(screen.label_at, Vec2::new(52.5, 41.0));
        assert_eq!(screen.font_size, 17.5);
    }

    #[test]
    fn keys_render_like_dom_keys() {
        assert_eq!(EntityKey::SliderArm(3).to_string(), "slider-arm-3");
        assert_eq!(EntityKey::Target(0).to_string(), "targets-0");
        assert_eq!(EntityKey::OutConveyor(1).to_string(), "conveyor-out-1");
    }
}
