use crate::{
    dataset::trajectory::EntityRole,
    foundation::core::{Color, Position},
    foundation::math::Fnv1a64,
    render::state::RenderFrame,
};

/// Stable per-frame fingerprint used to elide unchanged frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FrameFingerprint(pub u64);

/// Compute a stable fingerprint for a rendered frame.
///
/// The scrub value itself is not hashed, so scrub changes that land on the same samples still
/// fingerprint equal.
pub fn fingerprint_frame(frame: &RenderFrame) -> FrameFingerprint {
    let mut h = Fnv1a64::new_default();
    h.write_f64(frame.view.rotation_rad);
    write_position(&mut h, frame.view.about);
    h.write_u64(frame.entities.len() as u64);
    for e in &frame.entities {
        h.write_str(&e.id.group);
        h.write_u64(e.id.index as u64);
        h.write_u8(role_tag(e.role));
        write_position(&mut h, e.position);
        write_color(&mut h, e.color);
        h.write_u8(e.status.map_or(u8::MAX, |s| s.code() as u8));
    }
    FrameFingerprint(h.finish())
}

fn role_tag(role: EntityRole) -> u8 {
    match role {
        EntityRole::Body => 0,
        EntityRole::Ship => 1,
        EntityRole::Orbit => 2,
    }
}

fn write_position(h: &mut Fnv1a64, p: Position) {
    h.write_f64(p.x);
    h.write_f64(p.y);
    h.write_f64(p.z);
}

fn write_color(h: &mut Fnv1a64, c: Color) {
    h.write_bytes(&[c.r, c.g, c.b, c.a]);
}

#[cfg(test)]
#[path = "../../tests/unit/render/fingerprint.rs"]
mod tests;
