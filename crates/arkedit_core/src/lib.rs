pub mod collector;
pub mod container;
pub mod error;
pub mod item;
pub mod merge;
pub mod modify;
pub mod object;
pub mod properties;
pub mod remap;
pub mod script;

pub use collector::{CollectedGraph, collect, collect_all};
pub use container::{ObjectContainer, load_documents};
pub use error::{CoreError, CoreErrorCode};
pub use item::{ItemTemplate, synthesize};
pub use merge::{IdLedger, NameLedger, merge};
pub use modify::{ApplyReport, apply};
pub use object::{Aabb, GameObject, Name, ObjectId, Vec3};
pub use properties::{Property, PropertyBag, Reference, Value};
pub use remap::{Remapped, remap};
pub use script::{DeleteOperation, FieldIssue, ModificationPlan};
