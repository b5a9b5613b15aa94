use arkedit_core::object::{
    GameObject, INVENTORY_COMPONENT_PROP, Name, ObjectId, STATUS_COMPONENT_PROP,
};
use arkedit_core::properties::{PropertyBag, Reference, Value};
use arkedit_core::{ObjectContainer, collect, collect_all};

fn by_id(id: i32) -> Value {
    Value::Ref(Reference::ById(ObjectId(id)))
}

fn character(id: i32, status: i32, inventory: i32) -> GameObject {
    let mut object = GameObject::new(ObjectId(id), "Raptor_Character_BP_C");
    object.properties.set(STATUS_COMPONENT_PROP, by_id(status));
    object
        .properties
        .set(INVENTORY_COMPONENT_PROP, by_id(inventory));
    object
}

fn component(id: i32, base: &str, owner: &GameObject) -> GameObject {
    let mut object = GameObject::new(ObjectId(id), base);
    object.names = vec![Name::new(base, id as u32), owner.names[0].clone()];
    object
}

#[test]
fn collects_closure_from_character_root() {
    let mut container = ObjectContainer::new();
    let character = character(1, 2, 3);
    let status = component(2, "DinoCharacterStatusComponent_BP_C", &character);
    let mut inventory = component(3, "PrimalInventoryBP_C", &character);
    inventory
        .properties
        .set("InventoryItems", Value::Array(vec![by_id(4)]));
    let mut item = GameObject::new(ObjectId(4), "PrimalItem_WeaponPike_C");
    item.is_item = true;

    let bystander = GameObject::new(ObjectId(5), "TribeFlag_C");

    container.push(character);
    container.push(status);
    container.push(inventory);
    container.push(item);
    container.push(bystander);

    let graph = collect(&container, &[ObjectId(1)]);
    assert_eq!(graph.len(), 4);
    for id in [1, 2, 3, 4] {
        assert!(graph.contains(ObjectId(id)), "missing object {id}");
    }
    assert!(!graph.contains(ObjectId(5)));
}

#[test]
fn dangling_reference_is_left_unresolved() {
    // Status component holds a struct array with two references, one of
    // which points at an id that does not exist in the container.
    let mut container = ObjectContainer::new();
    let character = character(1, 2, 99);
    let mut status = component(2, "DinoCharacterStatusComponent_BP_C", &character);

    let mut entry_live = PropertyBag::new();
    entry_live.set("Linked", by_id(7));
    let mut entry_dangling = PropertyBag::new();
    entry_dangling.set("Linked", by_id(404));
    status.properties.set(
        "BuffReferences",
        Value::Array(vec![Value::Struct(entry_live), Value::Struct(entry_dangling)]),
    );

    let referenced = GameObject::new(ObjectId(7), "BuffGeneric_C");

    container.push(character);
    container.push(status);
    container.push(referenced);

    let graph = collect(&container, &[ObjectId(1)]);
    assert_eq!(graph.len(), 3);
    assert!(graph.contains(ObjectId(1)));
    assert!(graph.contains(ObjectId(2)));
    assert!(graph.contains(ObjectId(7)));
    assert!(!graph.contains(ObjectId(404)));
}

#[test]
fn cyclic_references_terminate() {
    let mut container = ObjectContainer::new();
    let mut first = GameObject::new(ObjectId(1), "StructureTurret_C");
    first.properties.set("LinkedStructure", by_id(2));
    let mut second = GameObject::new(ObjectId(2), "StructureTurret_C");
    second.properties.set("LinkedStructure", by_id(1));
    container.push(first);
    container.push(second);

    let graph = collect(&container, &[ObjectId(1)]);
    assert_eq!(graph.len(), 2);
}

#[test]
fn missing_root_collects_nothing() {
    let container = ObjectContainer::new();
    let graph = collect(&container, &[ObjectId(1)]);
    assert!(graph.is_empty());
}

#[test]
fn repeated_collection_is_side_effect_free() {
    let mut container = ObjectContainer::new();
    let mut root = GameObject::new(ObjectId(0), "StorageBox_C");
    root.properties.set("Linked", by_id(1));
    container.push(root);
    container.push(GameObject::new(ObjectId(1), "StorageBox_C"));

    let first = collect(&container, &[ObjectId(0)]);
    let second = collect(&container, &[ObjectId(0)]);
    assert_eq!(first.len(), second.len());
    assert_eq!(container.len(), 2);
}

#[test]
fn collect_all_preserves_container_order() {
    let mut container = ObjectContainer::new();
    for id in [3, 1, 2] {
        container.push(GameObject::new(ObjectId(id), "StorageBox_C"));
    }
    let order: Vec<i32> = collect_all(&container).iter().map(|o| o.id.0).collect();
    assert_eq!(order, vec![3, 1, 2]);
}
