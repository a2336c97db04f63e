// svg.rs
// Writes one replay frame as a standalone SVG document.

use std::fmt::Write;

use palette::Srgb;
use ultraviolet::Vec2;

use crate::config::{LABEL_COLOR, STROKE_COLOR, STROKE_WIDTH};
use crate::geometry::{Circle, Rect, StaticScene};
use crate::session::ReplaySession;
use crate::sliders::SliderFrame;

fn hex(c: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}

fn push_rect(out: &mut String, scene: &StaticScene, rect: &Rect) {
    let r = scene.project_rect(rect);
    let _ = writeln!(
        out,
        r#"  <rect id="{}" x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="{}"/>"#,
        rect.key,
        r.x,
        r.y,
        r.width,
        r.height,
        hex(rect.fill),
        rect.opacity
    );
    if let Some(label) = &rect.label {
        let _ = writeln!(
            out,
            r#"  <text x="{:.2}" y="{:.2}" font-size="{:.2}" fill="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            r.label_at.x,
            r.label_at.y,
            r.font_size,
            hex(LABEL_COLOR),
            label
        );
    }
}

fn push_circle(out: &mut String, scene: &StaticScene, circle: &Circle) {
    let c = scene.project_circle(circle);
    let _ = writeln!(
        out,
        r#"  <circle id="{}" cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}" fill-opacity="{}" stroke="{}" stroke-width="{}"/>"#,
        circle.key,
        c.cx,
        c.cy,
        c.r,
        hex(circle.style.fill),
        circle.style.opacity,
        hex(STROKE_COLOR),
        STROKE_WIDTH
    );
}

/// Renders the static scene with the given dynamic shapes on top, in draw order:
/// conveyors and beams, targets, drops, slider arms, slider bodies, slider heads.
pub fn render(scene: &StaticScene, targets: &[Circle], drops: &[Circle], sliders: &SliderFrame) -> String {
    let top_left = scene.project_point(scene.bounds.min - scene.offset);
    let bottom_right = scene.project_point(scene.bounds.max + scene.offset);
    let size = bottom_right - top_left;
    let size = Vec2::new(size.x.max(1.0), size.y.max(1.0));

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="{:.2} {:.2} {:.2} {:.2}">"#,
        size.x, size.y, top_left.x, top_left.y, size.x, size.y
    );
    for rect in &scene.rects {
        push_rect(&mut out, scene, rect);
    }
    for circle in targets.iter().chain(drops) {
        push_circle(&mut out, scene, circle);
    }
    for rect in sliders.arms.iter().chain(&sliders.bodies) {
        push_rect(&mut out, scene, rect);
    }
    for head in &sliders.heads {
        push_circle(&mut out, scene, head);
    }
    out.push_str("</svg>\n");
    out
}

/// Current frame of `session`, or `None` when nothing is loaded.
pub fn render_session(session: &ReplaySession) -> Option<String> {
    let scene = session.scene()?;
    Some(render(scene, session.targets(), session.drops(), session.sliders()))
}
