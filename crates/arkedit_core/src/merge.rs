use std::collections::HashSet;

use rand::Rng;
use tracing::warn;

use crate::container::ObjectContainer;
use crate::error::{CoreError, CoreErrorCode};
use crate::item::{ITEM_ID1_PROP, ITEM_ID2_PROP, ITEM_ID_STRUCT_PROP};
use crate::object::{COMPONENT_PROPS, GameObject, Name, ObjectId};
use crate::properties::{PropertyBag, Value};

/// Flat creature identity pair, stored directly on the record.
pub const DINO_ID1_PROP: &str = "DinoID1";
pub const DINO_ID2_PROP: &str = "DinoID2";

/// Cap on random redraws before giving up. The 64-bit space makes hitting
/// this without a bug practically impossible, but the loop must terminate.
const MAX_ID_DRAWS: u32 = 1 << 16;

/// Composite 64-bit domain ids in use, across both known shapes.
#[derive(Debug, Default)]
pub struct IdLedger {
    used: HashSet<u64>,
}

impl IdLedger {
    /// One scan per shape over the destination container.
    pub fn scan(container: &ObjectContainer) -> Self {
        let mut ledger = Self::default();
        for object in container.objects() {
            if let Some(id) = creature_domain_id(object) {
                ledger.used.insert(id);
            }
            if let Some(id) = item_domain_id(&object.properties) {
                ledger.used.insert(id);
            }
        }
        ledger
    }

    /// Check-and-insert: true when the value was free and is now reserved.
    pub fn reserve(&mut self, value: u64) -> bool {
        self.used.insert(value)
    }

    /// Draws random candidates until one is free, bounded so a bug cannot
    /// spin silently forever.
    pub fn allocate(&mut self, rng: &mut impl Rng) -> Result<u64, CoreError> {
        for _ in 0..MAX_ID_DRAWS {
            let candidate: u64 = rng.r#gen();
            if self.used.insert(candidate) {
                return Ok(candidate);
            }
        }
        Err(CoreError::new(
            CoreErrorCode::Exhausted,
            "could not draw a free 64-bit domain id",
        ))
    }
}

/// Display names in use, keyed by (base, instance).
#[derive(Debug, Default)]
pub struct NameLedger {
    used: HashSet<(String, u32)>,
}

impl NameLedger {
    pub fn scan(container: &ObjectContainer) -> Self {
        let mut ledger = Self::default();
        for object in container.objects() {
            for name in &object.names {
                ledger.reserve(name);
            }
        }
        ledger
    }

    pub fn reserve(&mut self, name: &Name) -> bool {
        self.used.insert((name.base.clone(), name.instance))
    }

    /// Smallest unused instance suffix for `base`, reserved on return.
    pub fn allocate(&mut self, base: &str) -> Name {
        let mut instance = 0u32;
        loop {
            if self.used.insert((base.to_string(), instance)) {
                return Name::new(base, instance);
            }
            instance += 1;
        }
    }
}

pub fn creature_domain_id(object: &GameObject) -> Option<u64> {
    let id1 = object.properties.int_value(DINO_ID1_PROP)?;
    let id2 = object.properties.int_value(DINO_ID2_PROP)?;
    Some(combine_halves(id1, id2))
}

pub fn item_domain_id(properties: &PropertyBag) -> Option<u64> {
    let pair = properties.bag(ITEM_ID_STRUCT_PROP)?;
    let id1 = pair.int_value(ITEM_ID1_PROP)?;
    let id2 = pair.int_value(ITEM_ID2_PROP)?;
    Some(combine_halves(id1, id2))
}

pub fn combine_halves(id1: i64, id2: i64) -> u64 {
    ((id1 as u32 as u64) << 32) | id2 as u32 as u64
}

pub fn split_halves(value: u64) -> (i64, i64) {
    (((value >> 32) as u32) as i64, (value as u32) as i64)
}

/// Grafts an already-remapped batch into `destination`.
///
/// The incoming records must carry fresh, destination-disjoint object ids
/// (the remap pass guarantees this); a colliding id is an `Integrity`
/// error. Only the two remaining identity spaces are reconciled here:
/// composite 64-bit domain ids first, display names second. Returns the
/// number of records appended.
pub fn merge(
    destination: &mut ObjectContainer,
    incoming: Vec<GameObject>,
    rng: &mut impl Rng,
) -> Result<usize, CoreError> {
    let mut incoming = incoming;
    let appended = incoming.len();

    for object in &incoming {
        if destination.contains(object.id) {
            return Err(CoreError::new(
                CoreErrorCode::Integrity,
                format!("incoming record {} collides with an existing object id", object.id),
            ));
        }
    }

    // Domain ids: redraw any colliding pair, in either shape.
    let mut ids = IdLedger::scan(destination);
    for object in &mut incoming {
        if let Some(current) = creature_domain_id(object)
            && !ids.reserve(current)
        {
            let fresh = ids.allocate(rng)?;
            let (id1, id2) = split_halves(fresh);
            object.properties.set(DINO_ID1_PROP, Value::Int(id1));
            object.properties.set(DINO_ID2_PROP, Value::Int(id2));
        }
        if let Some(current) = item_domain_id(&object.properties)
            && !ids.reserve(current)
        {
            let fresh = ids.allocate(rng)?;
            let (id1, id2) = split_halves(fresh);
            if let Some(pair) = object.properties.bag_mut(ITEM_ID_STRUCT_PROP) {
                pair.set(ITEM_ID1_PROP, Value::Int(id1));
                pair.set(ITEM_ID2_PROP, Value::Int(id2));
            }
        }
    }

    let mut names = NameLedger::scan(destination);
    let appended_ids: Vec<ObjectId> = incoming.iter().map(|object| object.id).collect();
    for object in incoming {
        destination.push(object);
    }

    // Display names. Components keep their owner-derived identity and are
    // only touched via propagation from their character.
    for id in appended_ids {
        let Some(object) = destination.get(id) else {
            continue;
        };
        if object.is_component() || object.names.is_empty() {
            continue;
        }

        let is_character = object.is_character();
        if !is_character && object.names.len() != 1 {
            warn!(
                id = %object.id,
                class = %object.class_name,
                "record carries multiple names but no component prefix; leaving names untouched"
            );
            continue;
        }

        let current = object.names[0].clone();
        if names.reserve(&current) {
            continue;
        }

        let fresh = names.allocate(&current.base);
        let component_ids: Vec<ObjectId> = if is_character {
            COMPONENT_PROPS
                .iter()
                .filter_map(|prop| destination.get(id).and_then(|o| o.component_ref(prop)))
                .collect()
        } else {
            Vec::new()
        };

        if let Some(object) = destination.get_mut(id) {
            object.names[0] = fresh.clone();
        }
        for component_id in component_ids {
            if let Some(component) = destination.get_mut(component_id)
                && component.names.len() == 2
            {
                component.names[1] = fresh.clone();
            }
        }
    }

    Ok(appended)
}
