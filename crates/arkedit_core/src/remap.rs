use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::collector::CollectedGraph;
use crate::object::{COMPONENT_PROPS, GameObject, ObjectId};
use crate::properties::Reference;

/// Result of a renumbering pass. `old_to_new` is a bijection onto
/// `[start_id, start_id + objects.len())`, kept for reuse by callers
/// (identity reconciliation reads it, tests assert over it).
#[derive(Debug)]
pub struct Remapped {
    pub objects: Vec<GameObject>,
    pub old_to_new: HashMap<ObjectId, ObjectId>,
    /// `ById` references that pointed outside the collected set and were
    /// left untouched. Expected for root exports (external targets);
    /// a full-container collection must produce zero.
    pub unresolved: usize,
}

/// Orders the collected records, assigns dense ids from `start_id` and
/// rewrites every internal `ById` reference in place.
///
/// Ordering rule: each character is immediately followed by its resolvable
/// status component and inventory component, in that order. A record placed
/// as a component is never placed twice; everything else keeps collection
/// order after the character blocks.
pub fn remap(graph: CollectedGraph, start_id: i32) -> Remapped {
    let objects = graph.into_objects();
    let count = objects.len();

    let index: HashMap<ObjectId, usize> = objects
        .iter()
        .enumerate()
        .map(|(slot, object)| (object.id, slot))
        .collect();

    let mut placed = vec![false; count];
    let mut order = Vec::with_capacity(count);

    for slot in 0..count {
        if placed[slot] || !objects[slot].is_character() {
            continue;
        }
        placed[slot] = true;
        order.push(slot);

        for prop in COMPONENT_PROPS {
            if let Some(component) = objects[slot].component_ref(prop)
                && let Some(&component_slot) = index.get(&component)
                && !placed[component_slot]
            {
                placed[component_slot] = true;
                order.push(component_slot);
            }
        }
    }

    for slot in 0..count {
        if !placed[slot] {
            order.push(slot);
        }
    }

    // Reorder, then assign start_id + position while recording old ids.
    let mut position_of = vec![0usize; count];
    for (position, &slot) in order.iter().enumerate() {
        position_of[slot] = position;
    }
    let mut tagged: Vec<(usize, GameObject)> = objects
        .into_iter()
        .enumerate()
        .map(|(slot, object)| (position_of[slot], object))
        .collect();
    tagged.sort_by_key(|(position, _)| *position);
    let mut ordered: Vec<GameObject> = tagged.into_iter().map(|(_, object)| object).collect();

    let mut old_to_new = HashMap::with_capacity(count);
    for (position, object) in ordered.iter_mut().enumerate() {
        let new_id = ObjectId(start_id + position as i32);
        old_to_new.insert(object.id, new_id);
        object.id = new_id;
    }

    // Each worker mutates only its own record's subtree and reads the
    // finalized mapping, so the rewrite parallelizes per record.
    let unresolved = AtomicUsize::new(0);
    ordered.par_iter_mut().for_each(|object| {
        object.properties.for_each_reference_mut(&mut |reference| {
            if let Reference::ById(target) = reference {
                match old_to_new.get(target) {
                    Some(&new_id) => *target = new_id,
                    None => {
                        unresolved.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });
    });

    Remapped {
        objects: ordered,
        old_to_new,
        unresolved: unresolved.into_inner(),
    }
}
