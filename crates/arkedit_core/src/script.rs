use std::collections::{HashMap, HashSet};
use std::io::Read;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{CoreError, CoreErrorCode};
use crate::item::ItemTemplate;
use crate::object::Aabb;

/// Budget value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// One delete pass over the destination graph. The budget counts remaining
/// deletions and is decremented while the plan is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOperation {
    pub bounds: Aabb,
    pub team: Option<i64>,
    pub budget: i64,
    pub classes: HashSet<String>,
}

impl DeleteOperation {
    pub fn for_classes(classes: impl IntoIterator<Item = String>) -> Self {
        Self {
            bounds: Aabb::default(),
            team: None,
            budget: UNLIMITED,
            classes: classes.into_iter().collect(),
        }
    }

    pub fn has_budget(&self) -> bool {
        self.budget != 0
    }

    /// No-op when unlimited.
    pub fn spend(&mut self) {
        if self.budget > 0 {
            self.budget -= 1;
        }
    }
}

/// A wrong-typed or unusable field in the edit-script document. Reported
/// per field; the field is treated as absent and processing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub expected: &'static str,
}

/// Parsed edit script. Immutable during application except for the delete
/// budgets.
#[derive(Debug, Clone, Default)]
pub struct ModificationPlan {
    pub class_renames: HashMap<String, String>,
    pub item_class_renames: HashMap<String, String>,
    pub deletes: Vec<DeleteOperation>,
    pub add_items: Vec<ItemTemplate>,
    pub replace_default_inventory: HashMap<String, Vec<ItemTemplate>>,
    pub add_to_default_inventory: HashMap<String, Vec<ItemTemplate>>,
    pub replace_inventory: HashMap<String, Vec<ItemTemplate>>,
    pub add_to_inventory: HashMap<String, Vec<ItemTemplate>>,
}

impl ModificationPlan {
    pub fn from_reader(reader: impl Read) -> Result<(Self, Vec<FieldIssue>), CoreError> {
        let document: JsonValue = serde_json::from_reader(reader).map_err(|e| {
            CoreError::new(CoreErrorCode::Script, format!("invalid edit script: {e}"))
        })?;
        Ok(Self::from_document(&document))
    }

    /// Lenient parse: every field is optional, and a wrong-typed field is
    /// reported with its expected type instead of aborting the document.
    pub fn from_document(document: &JsonValue) -> (Self, Vec<FieldIssue>) {
        let mut plan = Self::default();
        let mut issues = Vec::new();

        let Some(root) = document.as_object() else {
            issues.push(FieldIssue {
                field: String::new(),
                expected: "object",
            });
            return (plan, issues);
        };

        plan.class_renames = string_map(root, "remapDinoClassNames", &mut issues);
        plan.item_class_renames = string_map(root, "remapItemArchetypes", &mut issues);
        plan.deletes = delete_operations(root, &mut issues);
        plan.add_items = template_array(root.get("addItems"), "addItems", &mut issues);
        plan.replace_default_inventory =
            template_map(root, "replaceDefaultInventory", &mut issues);
        plan.add_to_default_inventory = template_map(root, "addToDefaultInventory", &mut issues);
        plan.replace_inventory = template_map(root, "replaceInventory", &mut issues);
        plan.add_to_inventory = template_map(root, "addToInventory", &mut issues);

        (plan, issues)
    }
}

fn string_map(
    root: &JsonMap<String, JsonValue>,
    field: &'static str,
    issues: &mut Vec<FieldIssue>,
) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(value) = root.get(field) else {
        return out;
    };
    let Some(entries) = value.as_object() else {
        issues.push(FieldIssue {
            field: field.to_string(),
            expected: "object of string to string",
        });
        return out;
    };
    for (key, entry) in entries {
        match entry.as_str() {
            Some(s) => {
                out.insert(key.clone(), s.to_string());
            }
            None => issues.push(FieldIssue {
                field: format!("{field}.{key}"),
                expected: "string",
            }),
        }
    }
    out
}

fn delete_operations(
    root: &JsonMap<String, JsonValue>,
    issues: &mut Vec<FieldIssue>,
) -> Vec<DeleteOperation> {
    let mut operations = Vec::new();
    let Some(value) = root.get("delete") else {
        return operations;
    };
    let Some(entries) = value.as_array() else {
        issues.push(FieldIssue {
            field: "delete".to_string(),
            expected: "array of string or object",
        });
        return operations;
    };

    // Bare class names fold into a single unlimited whole-map operation.
    let mut folded_classes = HashSet::new();

    for (position, entry) in entries.iter().enumerate() {
        match entry {
            JsonValue::String(class) => {
                folded_classes.insert(class.clone());
            }
            JsonValue::Object(fields) => {
                operations.push(delete_operation(fields, position, issues));
            }
            _ => issues.push(FieldIssue {
                field: format!("delete[{position}]"),
                expected: "string or object",
            }),
        }
    }

    if !folded_classes.is_empty() {
        operations.insert(0, DeleteOperation::for_classes(folded_classes));
    }
    operations
}

fn delete_operation(
    fields: &JsonMap<String, JsonValue>,
    position: usize,
    issues: &mut Vec<FieldIssue>,
) -> DeleteOperation {
    let bounds = Aabb {
        min_x: float_field(fields, position, "minX", f32::NEG_INFINITY, issues),
        min_y: float_field(fields, position, "minY", f32::NEG_INFINITY, issues),
        min_z: float_field(fields, position, "minZ", f32::NEG_INFINITY, issues),
        max_x: float_field(fields, position, "maxX", f32::INFINITY, issues),
        max_y: float_field(fields, position, "maxY", f32::INFINITY, issues),
        max_z: float_field(fields, position, "maxZ", f32::INFINITY, issues),
    };

    let team = match fields.get("team") {
        None => None,
        Some(value) => match value.as_i64() {
            Some(team) => Some(team),
            None => {
                issues.push(FieldIssue {
                    field: format!("delete[{position}].team"),
                    expected: "integer",
                });
                None
            }
        },
    };

    let budget = match fields.get("maxDeleteCount") {
        None => UNLIMITED,
        Some(value) => match value.as_i64() {
            Some(count) => count,
            None => {
                issues.push(FieldIssue {
                    field: format!("delete[{position}].maxDeleteCount"),
                    expected: "integer",
                });
                UNLIMITED
            }
        },
    };

    let mut classes = HashSet::new();
    match fields.get("classes") {
        None => {}
        Some(JsonValue::Array(entries)) => {
            for (class_position, entry) in entries.iter().enumerate() {
                match entry.as_str() {
                    Some(class) => {
                        classes.insert(class.to_string());
                    }
                    None => issues.push(FieldIssue {
                        field: format!("delete[{position}].classes[{class_position}]"),
                        expected: "string",
                    }),
                }
            }
        }
        Some(_) => issues.push(FieldIssue {
            field: format!("delete[{position}].classes"),
            expected: "array of string",
        }),
    }

    DeleteOperation {
        bounds,
        team,
        budget,
        classes,
    }
}

fn float_field(
    fields: &JsonMap<String, JsonValue>,
    position: usize,
    name: &'static str,
    default: f32,
    issues: &mut Vec<FieldIssue>,
) -> f32 {
    match fields.get(name) {
        None => default,
        Some(value) => match value.as_f64() {
            Some(v) => v as f32,
            None => {
                issues.push(FieldIssue {
                    field: format!("delete[{position}].{name}"),
                    expected: "number",
                });
                default
            }
        },
    }
}

fn template_array(
    value: Option<&JsonValue>,
    field: &str,
    issues: &mut Vec<FieldIssue>,
) -> Vec<ItemTemplate> {
    let mut templates = Vec::new();
    let Some(value) = value else {
        return templates;
    };
    let Some(entries) = value.as_array() else {
        issues.push(FieldIssue {
            field: field.to_string(),
            expected: "array of item templates",
        });
        return templates;
    };
    for (position, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<ItemTemplate>(entry.clone()) {
            Ok(template) => templates.push(template),
            Err(_) => issues.push(FieldIssue {
                field: format!("{field}[{position}]"),
                expected: "item template object",
            }),
        }
    }
    templates
}

fn template_map(
    root: &JsonMap<String, JsonValue>,
    field: &'static str,
    issues: &mut Vec<FieldIssue>,
) -> HashMap<String, Vec<ItemTemplate>> {
    let mut out = HashMap::new();
    let Some(value) = root.get(field) else {
        return out;
    };
    let Some(entries) = value.as_object() else {
        issues.push(FieldIssue {
            field: field.to_string(),
            expected: "object of identity to item templates",
        });
        return out;
    };
    for (key, entry) in entries {
        let templates = template_array(Some(entry), &format!("{field}.{key}"), issues);
        out.insert(key.clone(), templates);
    }
    out
}
