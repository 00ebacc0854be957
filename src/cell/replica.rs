//! Replicas: per-row copies of a prototype widget tree.

use indexmap::{IndexMap, map::Entry};
use tracing::debug;

use crate::{error::WidgetError, form::FormService, tree, widget::Widget};

/// Copies `prototype` for the row identified by `replicator_id`.
///
/// Every identity in the copy gets `"_" + replicator_id` appended; nodes
/// without an identity keep none. The copy is initialized once.
pub fn clone_tree(
    prototype: &dyn Widget,
    replicator_id: &str,
    form: Option<&dyn FormService>,
) -> Result<Box<dyn Widget>, WidgetError> {
    let suffix = format!("_{replicator_id}");
    let mut replica = prototype.clone_widget();
    tree::walk_mut(replica.as_mut(), &mut |_, node| {
        if let Some(id) = node.id().map(|id| format!("{id}{suffix}")) {
            node.set_id(Some(id));
        }
    });
    replica.init(form)?;
    Ok(replica)
}

/// Replicas keyed by replicator id, in creation order.
#[derive(Debug, Clone, Default)]
pub struct ReplicaStore {
    replicas: IndexMap<String, Box<dyn Widget>>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The replica for `replicator_id`, cloning `prototype` the first time.
    pub fn get_or_create(
        &mut self,
        prototype: &dyn Widget,
        replicator_id: &str,
        form: Option<&dyn FormService>,
    ) -> Result<&mut Box<dyn Widget>, WidgetError> {
        match self.replicas.entry(replicator_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let replica = clone_tree(prototype, replicator_id, form)?;
                debug!(
                    "created replica {} of {}",
                    replicator_id,
                    prototype.id().unwrap_or("<anonymous>")
                );
                Ok(entry.insert(replica))
            }
        }
    }

    /// The replica for `replicator_id` if it was already created.
    pub fn get(&self, replicator_id: &str) -> Option<&dyn Widget> {
        self.replicas.get(replicator_id).map(|replica| replica.as_ref())
    }

    pub fn get_mut(&mut self, replicator_id: &str) -> Option<&mut Box<dyn Widget>> {
        self.replicas.get_mut(replicator_id)
    }

    pub fn contains(&self, replicator_id: &str) -> bool {
        self.replicas.contains_key(replicator_id)
    }

    /// Calls `f` on the replica of each of `ids`, in that order, creating any
    /// that are missing. Stops at the first error.
    pub fn enumerate_submitted(
        &mut self,
        prototype: &dyn Widget,
        ids: &[String],
        form: Option<&dyn FormService>,
        mut f: impl FnMut(&str, &mut dyn Widget) -> Result<(), WidgetError>,
    ) -> Result<(), WidgetError> {
        for id in ids {
            let replica = self.get_or_create(prototype, id, form)?;
            f(id, replica.as_mut())?;
        }
        Ok(())
    }

    /// Replicas in creation order, limited to `submitted` when given.
    pub fn enumerate_current(&self, submitted: Option<&[String]>) -> Vec<(&str, &dyn Widget)> {
        let mut current = self.enumerate_all();
        current.retain(|(id, _)| is_current(submitted, id));
        current
    }

    /// Like [`enumerate_current`](Self::enumerate_current), for mutation.
    pub fn visit_current_mut(&mut self, submitted: Option<&[String]>, mut f: impl FnMut(&str, &mut dyn Widget)) {
        for (id, replica) in self.replicas.iter_mut() {
            if is_current(submitted, id) {
                f(id, replica.as_mut());
            }
        }
    }

    /// Every replica in creation order.
    pub fn enumerate_all(&self) -> Vec<(&str, &dyn Widget)> {
        let mut all: Vec<(&str, &dyn Widget)> = Vec::with_capacity(self.replicas.len());
        for (id, replica) in &self.replicas {
            all.push((id.as_str(), replica.as_ref()));
        }
        all
    }

    /// Replicator ids in creation order.
    pub fn ids(&self) -> Vec<String> {
        self.replicas.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }
}

fn is_current(submitted: Option<&[String]>, id: &str) -> bool {
    submitted.is_none_or(|ids| ids.iter().any(|submitted| submitted == id))
}
