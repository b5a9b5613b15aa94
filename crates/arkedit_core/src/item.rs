use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::merge::{IdLedger, NameLedger, split_halves};
use crate::object::{GameObject, ObjectId};
use crate::properties::{PropertyBag, Reference, Value};

/// Nested item identity pair, one level inside a struct-valued property.
pub const ITEM_ID_STRUCT_PROP: &str = "ItemId";
pub const ITEM_ID1_PROP: &str = "ItemID1";
pub const ITEM_ID2_PROP: &str = "ItemID2";

pub const OWNER_INVENTORY_PROP: &str = "OwnerInventory";
pub const ITEM_ARCHETYPE_PROP: &str = "ItemArchetype";
pub const ITEM_QUANTITY_PROP: &str = "ItemQuantity";
pub const SAVED_DURABILITY_PROP: &str = "SavedDurability";
pub const ITEM_RATING_PROP: &str = "ItemRating";
pub const ITEM_QUALITY_PROP: &str = "ItemQualityIndex";
pub const ITEM_STAT_VALUES_PROP: &str = "ItemStatValues";
pub const ITEM_COLOR_ID_PROP: &str = "ItemColorID";
pub const CUSTOM_ITEM_NAME_PROP: &str = "CustomItemName";
pub const CUSTOM_ITEM_DESCRIPTION_PROP: &str = "CustomItemDescription";
pub const CRAFTER_NAME_PROP: &str = "CrafterCharacterName";
pub const CRAFTER_TRIBE_PROP: &str = "CrafterTribeName";
pub const CRAFTED_SKILL_BONUS_PROP: &str = "CraftedSkillBonus";
pub const NEXT_SPOILING_TIME_PROP: &str = "NextSpoilingTime";

fn default_qty() -> u32 {
    1
}

/// Declarative description of an item to synthesize. Every field is
/// optional in the document form; defaults are zero/empty except `qty`,
/// which defaults to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemTemplate {
    pub class_name: String,
    pub blueprint_path: String,
    pub qty: u32,
    pub custom_name: String,
    pub custom_description: String,
    pub durability: f64,
    pub rating: f64,
    pub quality: u8,
    pub item_stat_values: Vec<i64>,
    pub item_colors: Vec<i64>,
    pub crafter_name: String,
    pub crafter_tribe: String,
    pub crafted_skill_bonus: f64,
    pub upload_offset: f64,
}

impl Default for ItemTemplate {
    fn default() -> Self {
        Self {
            class_name: String::new(),
            blueprint_path: String::new(),
            qty: default_qty(),
            custom_name: String::new(),
            custom_description: String::new(),
            durability: 0.0,
            rating: 0.0,
            quality: 0,
            item_stat_values: Vec::new(),
            item_colors: Vec::new(),
            crafter_name: String::new(),
            crafter_tribe: String::new(),
            crafted_skill_bonus: 0.0,
            upload_offset: 0.0,
        }
    }
}

impl ItemTemplate {
    /// Class the synthesized record will carry; falls back to the terminal
    /// segment of the blueprint path when no class name was given.
    pub fn effective_class(&self) -> &str {
        if !self.class_name.is_empty() {
            return &self.class_name;
        }
        match self.blueprint_path.rsplit_once(['/', '.']) {
            Some((_, tail)) if !tail.is_empty() => tail.trim_end_matches('\''),
            _ => &self.blueprint_path,
        }
    }
}

/// Builds a new item record from a template.
///
/// Only non-default field values become properties, keeping the output
/// minimal. The composite item id is freshly drawn against `ids` and the
/// name takes the lowest free instance suffix from `names`.
pub fn synthesize(
    template: &ItemTemplate,
    id: ObjectId,
    owner_inventory: Option<ObjectId>,
    ids: &mut IdLedger,
    names: &mut NameLedger,
    rng: &mut impl Rng,
) -> Result<GameObject, CoreError> {
    let class = template.effective_class().to_string();
    let mut object = GameObject::new(id, class.clone());
    object.is_item = true;
    object.names = vec![names.allocate(&class)];

    let mut properties = PropertyBag::new();

    let (id1, id2) = split_halves(ids.allocate(rng)?);
    let mut pair = PropertyBag::new();
    pair.set(ITEM_ID1_PROP, Value::Int(id1));
    pair.set(ITEM_ID2_PROP, Value::Int(id2));
    properties.set(ITEM_ID_STRUCT_PROP, Value::Struct(pair));

    if !template.blueprint_path.is_empty() {
        properties.set(
            ITEM_ARCHETYPE_PROP,
            Value::Ref(Reference::ByPath(template.blueprint_path.clone())),
        );
    }
    if template.qty != 1 {
        properties.set(ITEM_QUANTITY_PROP, Value::Int(template.qty as i64));
    }
    if template.durability != 0.0 {
        properties.set(SAVED_DURABILITY_PROP, Value::Float(template.durability));
    }
    if template.rating != 0.0 {
        properties.set(ITEM_RATING_PROP, Value::Float(template.rating));
    }
    if template.quality != 0 {
        properties.set(ITEM_QUALITY_PROP, Value::Byte(template.quality));
    }
    for (slot, &value) in template.item_stat_values.iter().enumerate() {
        if value != 0 {
            properties.set_at(ITEM_STAT_VALUES_PROP, slot as u32, Value::Int(value));
        }
    }
    for (slot, &color) in template.item_colors.iter().enumerate() {
        if color != 0 {
            properties.set_at(ITEM_COLOR_ID_PROP, slot as u32, Value::Int(color));
        }
    }
    if !template.custom_name.is_empty() {
        properties.set(
            CUSTOM_ITEM_NAME_PROP,
            Value::Str(template.custom_name.clone()),
        );
    }
    if !template.custom_description.is_empty() {
        properties.set(
            CUSTOM_ITEM_DESCRIPTION_PROP,
            Value::Str(template.custom_description.clone()),
        );
    }
    if !template.crafter_name.is_empty() {
        properties.set(CRAFTER_NAME_PROP, Value::Str(template.crafter_name.clone()));
    }
    if !template.crafter_tribe.is_empty() {
        properties.set(
            CRAFTER_TRIBE_PROP,
            Value::Str(template.crafter_tribe.clone()),
        );
    }
    if template.crafted_skill_bonus != 0.0 {
        properties.set(
            CRAFTED_SKILL_BONUS_PROP,
            Value::Float(template.crafted_skill_bonus),
        );
    }
    if template.upload_offset != 0.0 {
        properties.set(NEXT_SPOILING_TIME_PROP, Value::Float(template.upload_offset));
    }
    if let Some(owner) = owner_inventory {
        properties.set(OWNER_INVENTORY_PROP, Value::Ref(Reference::ById(owner)));
    }

    object.properties = properties;
    Ok(object)
}
