use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, CoreErrorCode};
use crate::object::{GameObject, ObjectId};

/// Arena of records in file order. Links between records are expressed as
/// ids, never as embedded ownership, so cyclic object graphs are fine.
///
/// Removal leaves a tombstone: surviving records keep their ids until a
/// remap pass assigns fresh dense ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "Vec<GameObject>", from = "Vec<GameObject>")]
pub struct ObjectContainer {
    slots: Vec<Option<GameObject>>,
    index: HashMap<ObjectId, usize>,
}

impl ObjectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn push(&mut self, object: GameObject) {
        debug_assert!(
            !self.index.contains_key(&object.id),
            "object id {} already present",
            object.id
        );
        let slot = self.slots.len();
        self.index.insert(object.id, slot);
        self.slots.push(Some(object));
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.slots[*self.index.get(&id)?].as_ref()
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.slots[*self.index.get(&id)?].as_mut()
    }

    /// Shared removal primitive: a removed record is absent from any
    /// subsequent collection or remap over this container.
    pub fn remove(&mut self, id: ObjectId) -> Option<GameObject> {
        let slot = self.index.remove(&id)?;
        self.slots[slot].take()
    }

    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.slots.iter_mut().filter_map(|slot| slot.as_mut())
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects().map(|object| object.id).collect()
    }

    /// First id past every id currently in use.
    pub fn next_id(&self) -> i32 {
        self.objects()
            .map(|object| object.id.0 + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn from_json_reader(reader: impl Read) -> Result<Self, CoreError> {
        serde_json::from_reader(reader)
            .map_err(|e| CoreError::new(CoreErrorCode::Io, format!("invalid save document: {e}")))
    }

    pub fn to_json_writer(&self, writer: impl Write) -> Result<(), CoreError> {
        serde_json::to_writer(writer, self).map_err(|e| {
            CoreError::new(CoreErrorCode::Io, format!("failed to write document: {e}"))
        })
    }

    pub fn load_json(path: &Path) -> Result<Self, CoreError> {
        let file = File::open(path).map_err(|e| {
            CoreError::new(CoreErrorCode::Io, format!("cannot open {}: {e}", path.display()))
        })?;
        Self::from_json_reader(BufReader::new(file))
    }

    pub fn store_json(&self, path: &Path) -> Result<(), CoreError> {
        let file = File::create(path).map_err(|e| {
            CoreError::new(CoreErrorCode::Io, format!("cannot create {}: {e}", path.display()))
        })?;
        self.to_json_writer(BufWriter::new(file))
    }
}

impl From<Vec<GameObject>> for ObjectContainer {
    fn from(objects: Vec<GameObject>) -> Self {
        let mut container = Self::new();
        for object in objects {
            container.push(object);
        }
        container
    }
}

impl From<ObjectContainer> for Vec<GameObject> {
    fn from(container: ObjectContainer) -> Self {
        container.slots.into_iter().flatten().collect()
    }
}

/// Loads sibling document files in parallel. A file that fails to open or
/// parse is logged and skipped; it never aborts the batch.
pub fn load_documents(paths: &[PathBuf]) -> Vec<(PathBuf, ObjectContainer)> {
    paths
        .par_iter()
        .filter_map(|path| match ObjectContainer::load_json(path) {
            Ok(container) => Some((path.clone(), container)),
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable document");
                None
            }
        })
        .collect()
}
