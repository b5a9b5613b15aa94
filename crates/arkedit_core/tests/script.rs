use arkedit_core::script::{DeleteOperation, ModificationPlan, UNLIMITED};
use serde_json::json;

#[test]
fn full_document_parses_every_section() {
    let document = json!({
        "remapDinoClassNames": {"Raptor_Character_BP_C": "Carno_Character_BP_C"},
        "remapItemArchetypes": {"PrimalItem_WeaponPike_C": "PrimalItem_WeaponSpear_C"},
        "delete": [
            "Ptero_Character_BP_C",
            {
                "classes": ["Rex_Character_BP_C"],
                "minX": -1000.0, "maxX": 1000.0,
                "team": 2000000000,
                "maxDeleteCount": 5
            }
        ],
        "addItems": [{"className": "PrimalItemResource_Stone_C", "qty": 100}],
        "replaceDefaultInventory": {"Raptor_Character_BP_C": [{"className": "A_C"}]},
        "addToDefaultInventory": {"Raptor_Character_BP_C": [{"className": "B_C"}]},
        "replaceInventory": {"Raptor_Character_BP_C": [{"className": "C_C"}]},
        "addToInventory": {"Raptor_Character_BP_C": [{"className": "D_C"}]}
    });

    let (plan, issues) = ModificationPlan::from_document(&document);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");

    assert_eq!(
        plan.class_renames.get("Raptor_Character_BP_C"),
        Some(&"Carno_Character_BP_C".to_string())
    );
    assert_eq!(plan.item_class_renames.len(), 1);
    assert_eq!(plan.deletes.len(), 2);
    assert_eq!(plan.add_items.len(), 1);
    assert_eq!(plan.add_items[0].qty, 100);
    assert_eq!(plan.replace_default_inventory.len(), 1);
    assert_eq!(plan.add_to_default_inventory.len(), 1);
    assert_eq!(plan.replace_inventory.len(), 1);
    assert_eq!(plan.add_to_inventory.len(), 1);

    let bounded = &plan.deletes[1];
    assert_eq!(bounded.budget, 5);
    assert_eq!(bounded.team, Some(2000000000));
    assert_eq!(bounded.bounds.min_x, -1000.0);
    assert_eq!(bounded.bounds.max_y, f32::INFINITY);
}

#[test]
fn bare_delete_strings_fold_into_a_leading_unlimited_operation() {
    let document = json!({
        "delete": [
            "Ptero_Character_BP_C",
            {"classes": ["Rex_Character_BP_C"], "maxDeleteCount": 1},
            "Dodo_Character_BP_C"
        ]
    });

    let (plan, issues) = ModificationPlan::from_document(&document);
    assert!(issues.is_empty());
    assert_eq!(plan.deletes.len(), 2);

    let folded = &plan.deletes[0];
    assert_eq!(folded.budget, UNLIMITED);
    assert_eq!(folded.classes.len(), 2);
    assert!(folded.classes.contains("Ptero_Character_BP_C"));
    assert!(folded.classes.contains("Dodo_Character_BP_C"));
    assert_eq!(plan.deletes[1].classes.len(), 1);
}

#[test]
fn wrong_typed_fields_are_reported_and_skipped() {
    let document = json!({
        "remapDinoClassNames": {"Raptor_Character_BP_C": 7},
        "delete": [
            42,
            {"classes": "not-an-array", "maxDeleteCount": "ten", "minX": "west"}
        ],
        "addItems": "nope",
        "addToInventory": {"Raptor_Character_BP_C": [{"qty": "many"}]}
    });

    let (plan, issues) = ModificationPlan::from_document(&document);

    assert!(plan.class_renames.is_empty());
    assert_eq!(plan.deletes.len(), 1);
    assert_eq!(plan.deletes[0].budget, UNLIMITED);
    assert!(plan.deletes[0].classes.is_empty());
    assert!(plan.add_items.is_empty());
    assert_eq!(plan.add_to_inventory["Raptor_Character_BP_C"].len(), 0);

    let fields: Vec<&str> = issues.iter().map(|issue| issue.field.as_str()).collect();
    assert!(fields.contains(&"remapDinoClassNames.Raptor_Character_BP_C"));
    assert!(fields.contains(&"delete[0]"));
    assert!(fields.contains(&"delete[1].classes"));
    assert!(fields.contains(&"delete[1].maxDeleteCount"));
    assert!(fields.contains(&"delete[1].minX"));
    assert!(fields.contains(&"addItems"));
    assert!(fields.contains(&"addToInventory.Raptor_Character_BP_C[0]"));
}

#[test]
fn non_object_document_yields_a_root_issue() {
    let (plan, issues) = ModificationPlan::from_document(&json!([1, 2, 3]));
    assert!(plan.deletes.is_empty());
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].expected, "object");
}

#[test]
fn from_reader_rejects_malformed_json() {
    let result = ModificationPlan::from_reader("{not json".as_bytes());
    assert!(result.is_err());
}

#[test]
fn budget_spend_stops_at_zero_and_unlimited_never_runs_out() {
    let mut limited = DeleteOperation::for_classes(["X_C".to_string()]);
    limited.budget = 1;
    assert!(limited.has_budget());
    limited.spend();
    assert!(!limited.has_budget());
    limited.spend();
    assert_eq!(limited.budget, 0);

    let mut unlimited = DeleteOperation::for_classes(["X_C".to_string()]);
    for _ in 0..100 {
        unlimited.spend();
    }
    assert!(unlimited.has_budget());
}
