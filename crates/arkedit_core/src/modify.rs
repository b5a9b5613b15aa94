use rand::Rng;
use tracing::{debug, warn};

use crate::container::ObjectContainer;
use crate::error::CoreError;
use crate::item::{ITEM_ARCHETYPE_PROP, ItemTemplate, synthesize};
use crate::merge::{IdLedger, NameLedger};
use crate::object::{
    Aabb, COMPONENT_PROPS, GameObject, INVENTORY_COMPONENT_PROP, ObjectId,
};
use crate::properties::{Reference, Value};
use crate::script::ModificationPlan;

pub const ASSOCIATED_ITEM_PROP: &str = "AssociatedPrimalItem";
pub const MY_ITEM_PROP: &str = "MyItem";
pub const CURRENT_WEAPON_PROP: &str = "CurrentWeapon";

pub const INVENTORY_ITEMS_PROP: &str = "InventoryItems";
pub const EQUIPPED_ITEMS_PROP: &str = "EquippedItems";
pub const ITEM_SLOTS_PROP: &str = "ItemSlots";
pub const ITEM_ARRAY_PROPS: [&str; 3] =
    [INVENTORY_ITEMS_PROP, EQUIPPED_ITEMS_PROP, ITEM_SLOTS_PROP];

pub const DEFAULT_ITEM_COUNT_PROP: &str = "DisplayDefaultItemInventoryCount";

/// Counts of changes actually applied by one plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Class renames performed.
    pub renamed: usize,
    /// Delete operations that matched a record.
    pub deleted: usize,
    /// Records synthesized and inserted.
    pub added: usize,
    /// Records removed, cascades included.
    pub removed: usize,
}

impl ApplyReport {
    pub fn total(&self) -> usize {
        self.renamed + self.deleted + self.added + self.removed
    }
}

/// Recognized record shapes driving cascade removal.
#[derive(Debug)]
enum Shape {
    Weapon(ObjectId),
    DroppedItem(ObjectId),
    HasComponents(Vec<ObjectId>),
    Plain,
}

fn shape_of(object: &GameObject) -> Shape {
    if let Some(Reference::ById(item)) = object.properties.reference(ASSOCIATED_ITEM_PROP) {
        return Shape::Weapon(*item);
    }
    if let Some(Reference::ById(item)) = object.properties.reference(MY_ITEM_PROP) {
        return Shape::DroppedItem(*item);
    }
    let components: Vec<ObjectId> = COMPONENT_PROPS
        .iter()
        .filter_map(|prop| object.component_ref(prop))
        .collect();
    if components.is_empty() {
        Shape::Plain
    } else {
        Shape::HasComponents(components)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InventoryPolicy {
    ReplaceDefault,
    AddDefault,
    Replace,
    Add,
}

/// Identity allocation state shared by every synthesis in one apply pass.
struct Allocator {
    ids: IdLedger,
    names: NameLedger,
    next_id: i32,
}

impl Allocator {
    fn scan(container: &ObjectContainer) -> Self {
        Self {
            ids: IdLedger::scan(container),
            names: NameLedger::scan(container),
            next_id: container.next_id(),
        }
    }

    fn synthesize(
        &mut self,
        template: &ItemTemplate,
        owner: Option<ObjectId>,
        rng: &mut impl Rng,
    ) -> Result<GameObject, CoreError> {
        let object = synthesize(
            template,
            ObjectId(self.next_id),
            owner,
            &mut self.ids,
            &mut self.names,
            rng,
        )?;
        self.next_id += 1;
        Ok(object)
    }
}

/// Applies a parsed edit script against a live container: class renames,
/// ordered first-match-wins deletes with cascade removal, top-level item
/// additions, then the four inventory edit policies.
pub fn apply(
    plan: &mut ModificationPlan,
    container: &mut ObjectContainer,
    rng: &mut impl Rng,
) -> Result<ApplyReport, CoreError> {
    let mut report = ApplyReport::default();

    apply_renames(plan, container, &mut report);
    apply_deletes(plan, container, &mut report);

    // Ledgers are scanned once after deletion so synthesized identities are
    // checked against everything that survived.
    let mut alloc = Allocator::scan(container);

    for template in &plan.add_items {
        let object = alloc.synthesize(template, None, rng)?;
        container.push(object);
        report.added += 1;
    }

    let edits: [(InventoryPolicy, &_); 4] = [
        (InventoryPolicy::ReplaceDefault, &plan.replace_default_inventory),
        (InventoryPolicy::AddDefault, &plan.add_to_default_inventory),
        (InventoryPolicy::Replace, &plan.replace_inventory),
        (InventoryPolicy::Add, &plan.add_to_inventory),
    ];
    for (policy, edit_map) in edits {
        let mut keys: Vec<&String> = edit_map.keys().collect();
        keys.sort();
        for key in keys {
            let templates = &edit_map[key];
            for inventory in resolve_inventories(container, key) {
                apply_inventory_edit(
                    container,
                    policy,
                    inventory,
                    templates,
                    &mut alloc,
                    rng,
                    &mut report,
                )?;
            }
        }
    }

    debug!(
        renamed = report.renamed,
        deleted = report.deleted,
        added = report.added,
        removed = report.removed,
        "edit script applied"
    );
    Ok(report)
}

fn apply_renames(
    plan: &ModificationPlan,
    container: &mut ObjectContainer,
    report: &mut ApplyReport,
) {
    for object in container.objects_mut() {
        let renames = if object.is_item {
            &plan.item_class_renames
        } else {
            &plan.class_renames
        };
        let Some(new_class) = renames.get(&object.class_name) else {
            continue;
        };
        object.class_name = new_class.clone();
        // Best-effort: keep a structured blueprint path in line with the
        // new class when the record carries one.
        if let Some(Reference::ByPath(path)) = object.properties.reference(ITEM_ARCHETYPE_PROP) {
            let rederived = rederive_blueprint_path(path, new_class);
            object
                .properties
                .set(ITEM_ARCHETYPE_PROP, Value::Ref(Reference::ByPath(rederived)));
        }
        report.renamed += 1;
    }
}

/// Swaps the terminal class segment of a blueprint path, keeping the
/// directory: `/Game/Mod/Old.Old_C` becomes `/Game/Mod/New.New_C`.
fn rederive_blueprint_path(old_path: &str, new_class: &str) -> String {
    let directory = old_path.rsplit_once('/').map(|(head, _)| head);
    let asset = new_class.strip_suffix("_C").unwrap_or(new_class);
    match directory {
        Some(directory) => format!("{directory}/{asset}.{new_class}"),
        None => format!("{asset}.{new_class}"),
    }
}

fn apply_deletes(
    plan: &mut ModificationPlan,
    container: &mut ObjectContainer,
    report: &mut ApplyReport,
) {
    for id in container.ids() {
        let Some(object) = container.get(id) else {
            // Already removed by an earlier cascade.
            continue;
        };
        if object.is_item || object.is_component() {
            continue;
        }

        let location = object.location;
        let team = object.team();
        let class = object.class_name.clone();

        // First match wins: one deletion per record.
        let mut matched = false;
        for operation in plan.deletes.iter_mut() {
            if !operation.has_budget() || !operation.classes.contains(&class) {
                continue;
            }
            let in_bounds = match location {
                Some(point) => operation.bounds.contains(point),
                // Location-less records only match unbounded operations.
                None => operation.bounds == Aabb::default(),
            };
            if !in_bounds {
                continue;
            }
            if let Some(filter) = operation.team
                && team != Some(filter)
            {
                continue;
            }
            operation.spend();
            matched = true;
            break;
        }

        if matched {
            report.removed += cascade_remove(container, id);
            report.deleted += 1;
            continue;
        }

        // The record survived; its carried items are still tested
        // independently against every operation's class set.
        for item_id in carried_items(container, id) {
            let Some(item) = container.get(item_id) else {
                continue;
            };
            let item_class = item.class_name.clone();
            let mut hit = false;
            for operation in plan.deletes.iter_mut() {
                if operation.has_budget() && operation.classes.contains(&item_class) {
                    operation.spend();
                    hit = true;
                    break;
                }
            }
            if hit {
                remove_carried_item(container, id, item_id);
                report.removed += 1;
            }
        }
    }
}

/// Removes a record and everything its shape owns. Returns how many
/// records left the container.
fn cascade_remove(container: &mut ObjectContainer, id: ObjectId) -> usize {
    let Some(object) = container.get(id) else {
        return 0;
    };
    let shape = shape_of(object);
    let mut removed = 0;

    match shape {
        Shape::Weapon(item) => {
            if container.remove(item).is_some() {
                removed += 1;
            }
            // Holders keep a back-reference to the weapon; null it out.
            for holder in container.objects_mut() {
                let points_here = matches!(
                    holder.properties.reference(CURRENT_WEAPON_PROP),
                    Some(Reference::ById(target)) if *target == id
                );
                if points_here {
                    holder.properties.remove(CURRENT_WEAPON_PROP);
                }
            }
        }
        Shape::DroppedItem(item) => {
            if container.remove(item).is_some() {
                removed += 1;
            }
        }
        Shape::HasComponents(components) => {
            for component_id in components {
                for item in component_items(container, component_id, &ITEM_ARRAY_PROPS) {
                    if container.remove(item).is_some() {
                        removed += 1;
                    }
                }
                if container.remove(component_id).is_some() {
                    removed += 1;
                }
            }
        }
        Shape::Plain => {}
    }

    if container.remove(id).is_some() {
        removed += 1;
    }
    removed
}

/// Item records a top-level record carries, per its shape.
fn carried_items(container: &ObjectContainer, id: ObjectId) -> Vec<ObjectId> {
    let Some(object) = container.get(id) else {
        return Vec::new();
    };
    match shape_of(object) {
        Shape::Weapon(item) | Shape::DroppedItem(item) => vec![item],
        Shape::HasComponents(components) => components
            .into_iter()
            .flat_map(|component| component_items(container, component, &ITEM_ARRAY_PROPS))
            .collect(),
        Shape::Plain => Vec::new(),
    }
}

fn component_items(
    container: &ObjectContainer,
    component_id: ObjectId,
    arrays: &[&str],
) -> Vec<ObjectId> {
    let Some(component) = container.get(component_id) else {
        return Vec::new();
    };
    let mut items = Vec::new();
    for array in arrays {
        if let Some(values) = component.properties.array(array) {
            for value in values {
                if let Value::Ref(Reference::ById(item)) = value {
                    items.push(*item);
                }
            }
        }
    }
    items
}

/// Removes one carried item while leaving the holder intact: the item
/// record goes away and every link from the holder or its components to
/// that item is scrubbed.
fn remove_carried_item(container: &mut ObjectContainer, holder_id: ObjectId, item_id: ObjectId) {
    container.remove(item_id);

    let components: Vec<ObjectId> = match container.get(holder_id) {
        Some(holder) => COMPONENT_PROPS
            .iter()
            .filter_map(|prop| holder.component_ref(prop))
            .collect(),
        None => return,
    };

    if let Some(holder) = container.get_mut(holder_id) {
        for prop in [ASSOCIATED_ITEM_PROP, MY_ITEM_PROP] {
            let points_here = matches!(
                holder.properties.reference(prop),
                Some(Reference::ById(target)) if *target == item_id
            );
            if points_here {
                holder.properties.remove(prop);
            }
        }
    }

    for component_id in components {
        let Some(component) = container.get_mut(component_id) else {
            continue;
        };
        for array in ITEM_ARRAY_PROPS {
            if let Some(values) = component.properties.array_mut(array) {
                values.retain(
                    |value| !matches!(value, Value::Ref(Reference::ById(id)) if *id == item_id),
                );
            }
        }
    }
}

/// Resolves an edit target to inventory component records: by owner class
/// name, or directly by an inventory component's owner-name slot.
fn resolve_inventories(container: &ObjectContainer, key: &str) -> Vec<ObjectId> {
    let mut out = Vec::new();
    for object in container.objects() {
        if object.class_name == key {
            if let Some(component) = object.component_ref(INVENTORY_COMPONENT_PROP)
                && container.contains(component)
            {
                out.push(component);
            }
        } else if object.is_inventory_component()
            && let Some(owner) = object.owner_name()
            && owner.to_string() == key
        {
            out.push(object.id);
        }
    }
    out.sort();
    out.dedup();
    out
}

fn apply_inventory_edit(
    container: &mut ObjectContainer,
    policy: InventoryPolicy,
    inventory_id: ObjectId,
    templates: &[ItemTemplate],
    alloc: &mut Allocator,
    rng: &mut impl Rng,
    report: &mut ApplyReport,
) -> Result<(), CoreError> {
    let (default_count, has_array) = match container.get(inventory_id) {
        Some(component) => (
            component
                .properties
                .int_value(DEFAULT_ITEM_COUNT_PROP)
                .unwrap_or(0)
                .max(0) as usize,
            component.properties.array(INVENTORY_ITEMS_PROP).is_some(),
        ),
        None => return Ok(()),
    };

    if policy == InventoryPolicy::ReplaceDefault && !has_array && default_count > 0 {
        warn!(
            inventory = %inventory_id,
            default_count,
            "inventory advertises default items but has no item array; skipping edit"
        );
        return Ok(());
    }

    let mut new_refs = Vec::with_capacity(templates.len());
    for template in templates {
        let object = alloc.synthesize(template, Some(inventory_id), rng)?;
        new_refs.push(Value::Ref(Reference::ById(object.id)));
        container.push(object);
        report.added += 1;
    }

    match policy {
        InventoryPolicy::ReplaceDefault => {
            let prefix = leading_items(container, inventory_id, default_count);
            for item in prefix {
                if container.remove(item).is_some() {
                    report.removed += 1;
                }
            }
            if let Some(component) = container.get_mut(inventory_id) {
                ensure_array(component, INVENTORY_ITEMS_PROP);
                if let Some(values) = component.properties.array_mut(INVENTORY_ITEMS_PROP) {
                    let cut = default_count.min(values.len());
                    values.splice(0..cut, new_refs);
                }
                component
                    .properties
                    .set(DEFAULT_ITEM_COUNT_PROP, Value::Int(templates.len() as i64));
            }
        }
        InventoryPolicy::AddDefault => {
            if let Some(component) = container.get_mut(inventory_id) {
                ensure_array(component, INVENTORY_ITEMS_PROP);
                if let Some(values) = component.properties.array_mut(INVENTORY_ITEMS_PROP) {
                    let at = default_count.min(values.len());
                    values.splice(at..at, new_refs);
                }
                component.properties.set(
                    DEFAULT_ITEM_COUNT_PROP,
                    Value::Int((default_count + templates.len()) as i64),
                );
            }
        }
        InventoryPolicy::Replace => {
            let tail = trailing_items(container, inventory_id, default_count);
            for item in tail {
                if container.remove(item).is_some() {
                    report.removed += 1;
                }
            }
            if let Some(component) = container.get_mut(inventory_id) {
                ensure_array(component, INVENTORY_ITEMS_PROP);
                if let Some(values) = component.properties.array_mut(INVENTORY_ITEMS_PROP) {
                    values.truncate(default_count.min(values.len()));
                    values.extend(new_refs);
                }
            }
        }
        InventoryPolicy::Add => {
            if let Some(component) = container.get_mut(inventory_id) {
                ensure_array(component, INVENTORY_ITEMS_PROP);
                if let Some(values) = component.properties.array_mut(INVENTORY_ITEMS_PROP) {
                    values.extend(new_refs);
                }
            }
        }
    }

    Ok(())
}

fn ensure_array(component: &mut GameObject, prop: &str) {
    if component.properties.array(prop).is_none() {
        component.properties.set(prop, Value::Array(Vec::new()));
    }
}

fn leading_items(container: &ObjectContainer, inventory_id: ObjectId, count: usize) -> Vec<ObjectId> {
    match container.get(inventory_id) {
        Some(component) => component
            .properties
            .array(INVENTORY_ITEMS_PROP)
            .map(|values| {
                values
                    .iter()
                    .take(count)
                    .filter_map(|value| match value {
                        Value::Ref(Reference::ById(item)) => Some(*item),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

fn trailing_items(
    container: &ObjectContainer,
    inventory_id: ObjectId,
    skip: usize,
) -> Vec<ObjectId> {
    match container.get(inventory_id) {
        Some(component) => component
            .properties
            .array(INVENTORY_ITEMS_PROP)
            .map(|values| {
                values
                    .iter()
                    .skip(skip)
                    .filter_map(|value| match value {
                        Value::Ref(Reference::ById(item)) => Some(*item),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        None => Vec::new(),
    }
}
