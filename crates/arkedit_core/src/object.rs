use std::fmt;

use serde::{Deserialize, Serialize};

use crate::properties::{PropertyBag, Reference, Value};

/// Reference properties linking a character to its owned component records.
/// These two slots are the only recognized component kinds; ordering,
/// rename propagation and cascade removal all enumerate exactly this set.
pub const STATUS_COMPONENT_PROP: &str = "MyCharacterStatusComponent";
pub const INVENTORY_COMPONENT_PROP: &str = "MyInventoryComponent";
pub const COMPONENT_PROPS: [&str; 2] = [STATUS_COMPONENT_PROP, INVENTORY_COMPONENT_PROP];

pub const CHARACTER_CLASS_SUFFIX: &str = "_Character_BP_C";
pub const PLAYER_PAWN_CLASS_PREFIX: &str = "PlayerPawnTest";

/// Name prefixes identifying component records. A component's identity is
/// owner-derived; it is never renamed independently.
pub const COMPONENT_NAME_PREFIXES: [&str; 4] = [
    "DinoCharacterStatusComponent",
    "PrimalCharacterStatusComponent",
    "DinoTamedInventoryComponent",
    "PrimalInventoryBP",
];

/// The subset of component prefixes that mark item-holding inventories.
pub const INVENTORY_NAME_PREFIXES: [&str; 2] =
    ["DinoTamedInventoryComponent", "PrimalInventoryBP"];

pub const TARGETING_TEAM_PROP: &str = "TargetingTeam";

/// Dense, container-scoped object handle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ObjectId(pub i32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A base string with an integer instance suffix, rendered as `Base_N`
/// (bare base when the instance is zero).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name {
    pub base: String,
    pub instance: u32,
}

impl Name {
    pub fn new(base: impl Into<String>, instance: u32) -> Self {
        Self {
            base: base.into(),
            instance,
        }
    }

    pub fn parse(raw: &str) -> Self {
        if let Some(pos) = raw.rfind('_') {
            let suffix = &raw[pos + 1..];
            if !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_digit())
                && let Ok(instance) = suffix.parse::<u32>()
            {
                return Self::new(&raw[..pos], instance);
            }
        }
        Self::new(raw, 0)
    }

    pub fn is_component(&self) -> bool {
        COMPONENT_NAME_PREFIXES
            .iter()
            .any(|prefix| self.base.starts_with(prefix))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance == 0 {
            f.write_str(&self.base)
        } else {
            write!(f, "{}_{}", self.base, self.instance)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Axis-aligned bounding box with per-axis defaults of ±infinity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub max_z: f32,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min_x: f32::NEG_INFINITY,
            min_y: f32::NEG_INFINITY,
            min_z: f32::NEG_INFINITY,
            max_x: f32::INFINITY,
            max_y: f32::INFINITY,
            max_z: f32::INFINITY,
        }
    }
}

impl Aabb {
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min_x
            && p.x <= self.max_x
            && p.y >= self.min_y
            && p.y <= self.max_y
            && p.z >= self.min_z
            && p.z <= self.max_z
    }
}

/// One record in the persisted object graph. References to other records
/// are non-owning `ById` links; sub-records embedded in the property bag
/// are owned and not separately addressable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    pub id: ObjectId,
    pub class_name: String,
    pub names: Vec<Name>,
    pub is_item: bool,
    pub location: Option<Vec3>,
    pub properties: PropertyBag,
}

impl GameObject {
    pub fn new(id: ObjectId, class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        Self {
            id,
            class_name: class_name.clone(),
            names: vec![Name::parse(&class_name)],
            is_item: false,
            location: None,
            properties: PropertyBag::new(),
        }
    }

    /// Creature/avatar entities, by class-name convention.
    pub fn is_character(&self) -> bool {
        self.class_name.ends_with(CHARACTER_CLASS_SUFFIX)
            || self.class_name.starts_with(PLAYER_PAWN_CLASS_PREFIX)
    }

    /// Owned sub-object of another record: two names, the second linking
    /// back to the owner, and a recognized component name prefix.
    pub fn is_component(&self) -> bool {
        self.names.len() == 2 && self.names[0].is_component()
    }

    /// Component record that holds item arrays, by name-prefix convention.
    pub fn is_inventory_component(&self) -> bool {
        self.is_component()
            && INVENTORY_NAME_PREFIXES
                .iter()
                .any(|prefix| self.names[0].base.starts_with(prefix))
    }

    /// The owner-name slot of a component record.
    pub fn owner_name(&self) -> Option<&Name> {
        if self.names.len() == 2 {
            self.names.get(1)
        } else {
            None
        }
    }

    pub fn team(&self) -> Option<i64> {
        self.properties.int_value(TARGETING_TEAM_PROP)
    }

    /// Resolves one of the two known component reference properties.
    pub fn component_ref(&self, prop: &str) -> Option<ObjectId> {
        match self.properties.reference(prop)? {
            Reference::ById(id) => Some(*id),
            Reference::ByPath(_) => None,
        }
    }

    pub fn set_reference(&mut self, prop: &str, target: ObjectId) {
        self.properties.set(prop, Value::Ref(Reference::ById(target)));
    }
}
