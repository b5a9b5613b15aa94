use serde::{Deserialize, Serialize};

use crate::object::ObjectId;

/// A link to another record: by container-local id (rewritable) or by
/// external class/blueprint path (never rewritten).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    ById(ObjectId),
    ByPath(String),
}

/// Property payload. One tag per kind; passes switch on the tag instead of
/// inspecting runtime types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Byte(u8),
    Ref(Reference),
    Struct(PropertyBag),
    Array(Vec<Value>),
}

impl Value {
    fn visit_references(&self, f: &mut impl FnMut(&Reference)) {
        match self {
            Value::Ref(reference) => f(reference),
            Value::Struct(bag) => bag.for_each_reference(f),
            Value::Array(values) => {
                for value in values {
                    value.visit_references(f);
                }
            }
            _ => {}
        }
    }

    fn visit_references_mut(&mut self, f: &mut impl FnMut(&mut Reference)) {
        match self {
            Value::Ref(reference) => f(reference),
            Value::Struct(bag) => bag.for_each_reference_mut(f),
            Value::Array(values) => {
                for value in values {
                    value.visit_references_mut(f);
                }
            }
            _ => {}
        }
    }
}

/// One entry of a property bag. `index` qualifies fixed-size array fields
/// that the save format stores as repeated same-named properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub index: u32,
    pub value: Value,
}

/// Ordered property mapping. Order is preserved exactly as loaded; lookups
/// are linear, which is fine for the handful of properties a record holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    properties: Vec<Property>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_at(name, 0)
    }

    pub fn get_at(&self, name: &str, index: u32) -> Option<&Value> {
        self.properties
            .iter()
            .find(|p| p.name == name && p.index == index)
            .map(|p| &p.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.get_at_mut(name, 0)
    }

    pub fn get_at_mut(&mut self, name: &str, index: u32) -> Option<&mut Value> {
        self.properties
            .iter_mut()
            .find(|p| p.name == name && p.index == index)
            .map(|p| &mut p.value)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.set_at(name, 0, value);
    }

    pub fn set_at(&mut self, name: &str, index: u32, value: Value) {
        if let Some(slot) = self.get_at_mut(name, index) {
            *slot = value;
        } else {
            self.properties.push(Property {
                name: name.to_string(),
                index,
                value,
            });
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self
            .properties
            .iter()
            .position(|p| p.name == name && p.index == 0)?;
        Some(self.properties.remove(pos).value)
    }

    pub fn int_value(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Int(v) => Some(*v),
            Value::Byte(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn float_value(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn str_value(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn reference(&self, name: &str) -> Option<&Reference> {
        match self.get(name)? {
            Value::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn bag(&self, name: &str) -> Option<&PropertyBag> {
        match self.get(name)? {
            Value::Struct(bag) => Some(bag),
            _ => None,
        }
    }

    pub fn bag_mut(&mut self, name: &str) -> Option<&mut PropertyBag> {
        match self.get_mut(name)? {
            Value::Struct(bag) => Some(bag),
            _ => None,
        }
    }

    pub fn array(&self, name: &str) -> Option<&Vec<Value>> {
        match self.get(name)? {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn array_mut(&mut self, name: &str) -> Option<&mut Vec<Value>> {
        match self.get_mut(name)? {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Enumerates every reference in this bag's owned subtree, recursing
    /// through embedded structs and arrays.
    pub fn for_each_reference(&self, f: &mut impl FnMut(&Reference)) {
        for property in &self.properties {
            property.value.visit_references(f);
        }
    }

    pub fn for_each_reference_mut(&mut self, f: &mut impl FnMut(&mut Reference)) {
        for property in &mut self.properties {
            property.value.visit_references_mut(f);
        }
    }
}
