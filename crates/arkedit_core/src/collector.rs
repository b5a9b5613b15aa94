use std::collections::{HashMap, HashSet, VecDeque};

use crate::container::ObjectContainer;
use crate::object::{GameObject, ObjectId};
use crate::properties::Reference;

/// The induced subgraph reachable from a set of roots, in discovery order.
///
/// Invariant: every `ById` reference reachable from a member either targets
/// another member or was dangling in the source container already.
#[derive(Debug, Clone, Default)]
pub struct CollectedGraph {
    objects: Vec<GameObject>,
    index: HashMap<ObjectId, usize>,
}

impl CollectedGraph {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.index.get(&id).map(|&slot| &self.objects[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.iter()
    }

    pub fn into_objects(self) -> Vec<GameObject> {
        self.objects
    }

    fn insert(&mut self, object: GameObject) {
        self.index.insert(object.id, self.objects.len());
        self.objects.push(object);
    }
}

/// Collects the minimal subgraph reachable from `roots`.
///
/// Worklist traversal: visiting a record enumerates every reference in its
/// owned property subtree (embedded structs and arrays included). `ByPath`
/// references are external and skipped; ids that do not resolve in the
/// container are dangling and silently skipped. The visited set keys on
/// `ObjectId`, so cycles terminate and nothing is collected twice.
pub fn collect(container: &ObjectContainer, roots: &[ObjectId]) -> CollectedGraph {
    let mut graph = CollectedGraph::default();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut queue: VecDeque<ObjectId> = VecDeque::new();

    for &root in roots {
        if let Some(object) = container.get(root)
            && seen.insert(root)
        {
            graph.insert(object.clone());
            queue.push_back(root);
        }
    }

    while let Some(id) = queue.pop_front() {
        let Some(object) = container.get(id) else {
            continue;
        };

        let mut targets = Vec::new();
        object.properties.for_each_reference(&mut |reference| {
            if let Reference::ById(target) = reference {
                targets.push(*target);
            }
        });

        for target in targets {
            if !seen.insert(target) {
                continue;
            }
            // A dangling id stays in the property untouched.
            if let Some(found) = container.get(target) {
                graph.insert(found.clone());
                queue.push_back(target);
            }
        }
    }

    graph
}

/// Whole-container collection, preserving file order.
pub fn collect_all(container: &ObjectContainer) -> CollectedGraph {
    let mut graph = CollectedGraph::default();
    for object in container.objects() {
        graph.insert(object.clone());
    }
    graph
}
