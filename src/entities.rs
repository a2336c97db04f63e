//! Keeps the drawn target and drop markers in step with the current snapshot.
//!
//! Markers have no identity besides their ordinal in the group. The simulator only
//! ever removes entities from the tail of a group, so a shrinking group is handled by
//! truncation; a removal from the middle would show up as every later marker taking
//! over its predecessor's place.

use crate::geometry::{Circle, EntityKey};
use crate::history::{EntityGroup, ItemGroup};
use crate::status::status_to_style;

fn key_for(group: ItemGroup, i: usize) -> EntityKey {
    match group {
        ItemGroup::Targets => EntityKey::Target(i),
        ItemGroup::Drops => EntityKey::Drop(i),
    }
}

/// Reconciles `previous` against one group of the new snapshot and returns the new list.
///
/// Surviving markers keep their key and radius and take the new position and
/// status style; markers past the new length are dropped; new ordinals are appended
/// with `radius`. Calling it again with the same group returns an equal list.
pub fn sync_group(
    previous: &[Circle],
    group: &EntityGroup,
    which: ItemGroup,
    radius: f32,
) -> Vec<Circle> {
    let new_len = group.position.len().min(group.status.len());
    let kept = previous.len().min(new_len);

    let mut next = Vec::with_capacity(new_len);
    next.extend(previous[..kept].iter().enumerate().map(|(i, prev)| Circle {
        center: group.position[i].0,
        radius: prev.radius,
        style: status_to_style(group.status[i]),
        key: prev.key,
    }));
    next.extend((kept..new_len).map(|i| Circle {
        center: group.position[i].0,
        radius,
        style: status_to_style(group.status[i]),
        key: key_for(which, i),
    }));
    next
}
