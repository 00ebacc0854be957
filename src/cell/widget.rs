//! The widget cell renderer: one prototype widget tree, one replica per row.
//!
//! # Request lifecycle
//!
//! 1. [`init`](WidgetCellRenderer::init): on a postback, the replicator ids
//!    persisted by the previous response are read from the form and a
//!    replica is created (and thereby initialized) for each of them.
//!    Otherwise the prototype is initialized.
//! 2. [`process`](WidgetCellRenderer::process): each replica named by the
//!    persisted list processes its submitted values, in list order. The list
//!    is authoritative: a row deleted from the data source since the last
//!    response still gets its replica processed. Without a list the
//!    prototype is processed.
//! 3. [`render`](WidgetCellRenderer::render), once per row: the view sets
//!    the pending values and the replicator id, the replica for that id is
//!    resolved, the pending values are written onto it and the ids of all
//!    replicas created so far are stored in the form for the next request.
//!
//! Pending values reach the right node of a replica by position: a mapping
//! remembers the pre-order position of its target in the prototype and the
//! replica's node at that position is its copy.

use std::any::Any;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use super::{
    CellRenderer, ERROR_CLASS,
    mapping::{MappingRegistry, MappingTarget},
    replica::ReplicaStore,
};
use crate::{
    error::WidgetError,
    form::FormService,
    html::RenderContext,
    message::Message,
    tree,
    widget::Widget,
};

/// Suffix of the hidden field holding the replicator ids of a prototype.
pub const REPLICATORS_SUFFIX: &str = "_replicators";

#[derive(Debug, Clone)]
pub struct WidgetCellRenderer {
    prototype: Option<Box<dyn Widget>>,
    mappings: MappingRegistry,
    pending: IndexMap<String, Value>,
    replicas: ReplicaStore,
    replicator_id: Option<String>,
    /// Replicator ids submitted with this request, once read from the form.
    submitted: Option<Vec<String>>,
    visible: bool,
    title: Option<String>,
}

impl Default for WidgetCellRenderer {
    fn default() -> Self {
        Self {
            prototype: None,
            mappings: MappingRegistry::new(),
            pending: IndexMap::new(),
            replicas: ReplicaStore::new(),
            replicator_id: None,
            submitted: None,
            visible: true,
            title: None,
        }
    }
}

impl WidgetCellRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a renderer replicating `prototype`.
    pub fn with_prototype(prototype: impl Widget) -> Self {
        Self {
            prototype: Some(Box::new(prototype)),
            ..Self::default()
        }
    }

    /// Sets the prototype widget. A renderer holds at most one.
    pub fn set_prototype(&mut self, prototype: Box<dyn Widget>) -> Result<(), WidgetError> {
        if self.prototype.is_some() {
            return Err(WidgetError::PrototypeAlreadyRegistered);
        }
        self.prototype = Some(prototype);
        Ok(())
    }

    pub fn prototype(&self) -> Option<&dyn Widget> {
        self.prototype.as_deref()
    }

    /// Declares that `property` of the `target` node takes a per-row value.
    ///
    /// Returns the key to pass to [`set_value`](Self::set_value). Keys are
    /// unique: registering a name twice yields `name` and then `name0`.
    pub fn map_property(
        &mut self,
        target: impl Into<MappingTarget>,
        property: &str,
    ) -> Result<String, WidgetError> {
        let target = target.into();
        let prototype = self
            .prototype
            .as_deref()
            .ok_or_else(|| WidgetError::UnknownMappingTarget(target.to_string()))?;
        let position = match &target {
            MappingTarget::Root => Some(0),
            MappingTarget::Id(id) => tree::position_of(prototype, id),
            MappingTarget::Position(position) => Some(*position),
        };
        let Some((position, node)) =
            position.and_then(|position| Some((position, tree::node_at(prototype, position)?)))
        else {
            return Err(WidgetError::UnknownMappingTarget(target.to_string()));
        };
        if !node.accepts_property(property) {
            return Err(WidgetError::UnknownProperty {
                kind: node.kind(),
                property: property.to_string(),
            });
        }
        Ok(self.mappings.register(position, node.kind(), property))
    }

    /// Sets the value for a mapping key, applied on the next render.
    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) -> Result<(), WidgetError> {
        if !self.mappings.contains(key) {
            return Err(WidgetError::UnknownMapping(key.to_string()));
        }
        self.pending.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn mappings(&self) -> &MappingRegistry {
        &self.mappings
    }

    pub fn set_replicator(&mut self, replicator_id: Option<String>) {
        self.replicator_id = replicator_id;
    }

    pub fn replicator(&self) -> Option<&str> {
        self.replicator_id.as_deref()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Title of the enclosing column.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Hidden field key under which replicator ids are persisted.
    pub fn replicators_key(&self) -> Option<String> {
        let id = self.prototype.as_deref()?.id()?;
        Some(format!("{id}{REPLICATORS_SUFFIX}"))
    }

    fn read_submitted(&self, form: Option<&dyn FormService>) -> Result<Option<Vec<String>>, WidgetError> {
        let (Some(form), Some(key)) = (form, self.replicators_key()) else {
            return Ok(None);
        };
        if !form.is_postback() {
            return Ok(None);
        }
        form.persisted_list(&key)
    }

    /// Initializes the replicas submitted with this request, or the prototype
    /// when nothing was submitted.
    pub fn init(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        self.submitted = self.read_submitted(form)?;
        let Some(prototype) = self.prototype.as_deref_mut() else {
            return Ok(());
        };
        match &self.submitted {
            Some(ids) if !ids.is_empty() => {
                debug!("recreating {} submitted replicas", ids.len());
                self.replicas
                    .enumerate_submitted(prototype, ids, form, |_, _| Ok(()))?;
            }
            _ => prototype.init(form)?,
        }
        Ok(())
    }

    /// Processes the replicas submitted with this request, or the prototype
    /// when nothing was submitted.
    pub fn process(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        self.submitted = self.read_submitted(form)?;
        let Some(prototype) = self.prototype.as_deref_mut() else {
            return Ok(());
        };
        match &self.submitted {
            Some(ids) => self
                .replicas
                .enumerate_submitted(prototype, ids, form, |_, replica| replica.process(form))?,
            None => prototype.process(form)?,
        }
        Ok(())
    }

    /// Renders the replica of the current row, or the prototype when no row is set.
    pub fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        if !self.visible {
            return Ok(());
        }
        let Some(replicator_id) = self.replicator_id.clone() else {
            return self.render_prototype(ctx);
        };
        let Some(prototype) = self.prototype.as_deref() else {
            return Ok(());
        };
        let key = prototype
            .id()
            .map(|id| format!("{id}{REPLICATORS_SUFFIX}"))
            .ok_or(WidgetError::PrototypeWithoutId)?;

        let form = ctx.form().ok_or(WidgetError::MissingFormContext)?;
        self.replicas.get_or_create(prototype, &replicator_id, Some(&*form))?;
        let ids = self.replicas.ids();
        debug!("persisting {} replicator ids under {}", ids.len(), key);
        form.set_persisted_list(&key, &ids);

        let Some(replica) = self.replicas.get_mut(&replicator_id) else {
            return Ok(());
        };
        apply_pending(&self.mappings, &self.pending, replica.as_mut())?;
        replica.render(ctx)
    }

    /// Renders the prototype itself with the pending values applied.
    ///
    /// Needs no form; used for a single unreplicated instance.
    pub fn render_prototype(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        if !self.visible {
            return Ok(());
        }
        let Some(prototype) = self.prototype.as_deref_mut() else {
            return Ok(());
        };
        apply_pending(&self.mappings, &self.pending, prototype)?;
        prototype.render(ctx)
    }

    /// Whether a row has a renderable instance.
    pub fn is_renderable(&self) -> bool {
        self.visible && self.prototype.is_some()
    }

    /// The replica for `replicator_id`, if one was created.
    pub fn widget(&self, replicator_id: &str) -> Option<&dyn Widget> {
        self.replicas.get(replicator_id)
    }

    /// Number of replicas created so far.
    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Replicas by replicator id.
    ///
    /// Once submitted ids were read from the form, only replicas that were
    /// submitted are returned.
    pub fn cloned_widgets(&self) -> Vec<(&str, &dyn Widget)> {
        self.replicas.enumerate_current(self.submitted.as_deref())
    }

    fn current_or<'a>(&'a self, replicator_id: Option<&'a str>) -> Option<&'a dyn Widget> {
        let id = replicator_id.or(self.replicator_id.as_deref())?;
        self.replicas.get(id)
    }

    /// Messages of the replica for `replicator_id`, or of the current row's
    /// replica. Never those of the prototype.
    pub fn messages(&self, replicator_id: Option<&str>) -> Vec<Message> {
        self.current_or(replicator_id)
            .map(|replica| replica.messages())
            .unwrap_or_default()
    }

    pub fn has_messages(&self, replicator_id: Option<&str>) -> bool {
        self.current_or(replicator_id)
            .is_some_and(|replica| replica.has_messages())
    }

    /// States of every stateful node in the current replicas, keyed by identity.
    pub fn descendant_states(&self) -> IndexMap<String, Value> {
        let mut states = IndexMap::new();
        for (_, replica) in self.cloned_widgets() {
            tree::walk(replica, &mut |_, node| {
                if let (Some(id), Some(state)) = (node.id(), node.state()) {
                    states.insert(id.to_string(), state);
                }
            });
        }
        states
    }

    /// Restores states produced by [`descendant_states`](Self::descendant_states).
    pub fn set_descendant_states(&mut self, states: &IndexMap<String, Value>) {
        self.replicas
            .visit_current_mut(self.submitted.as_deref(), |_, replica| {
                tree::walk_mut(replica, &mut |_, node| {
                    if let Some(state) = node.id().and_then(|id| states.get(id)) {
                        node.set_state(state.clone());
                    }
                });
            });
    }
}

/// Writes pending values onto the nodes of `target` their mappings point at.
fn apply_pending(
    mappings: &MappingRegistry,
    pending: &IndexMap<String, Value>,
    target: &mut dyn Widget,
) -> Result<(), WidgetError> {
    for (key, value) in pending {
        let mapping = mappings
            .binding(key)
            .ok_or_else(|| WidgetError::UnknownMapping(key.clone()))?;
        let position = mapping.position;
        tree::with_node_mut(target, position, |node| {
            if node.kind() != mapping.kind {
                return Err(WidgetError::ReplicaTreeMismatch { position });
            }
            if node.is_user_supplied(&mapping.property) {
                trace!("keeping submitted {} of node {}", mapping.property, position);
                return Ok(());
            }
            trace!("mapping {} onto {} of node {}", key, mapping.property, position);
            node.set_property(&mapping.property, value.clone())
        })
        .ok_or(WidgetError::ReplicaTreeMismatch { position })??;
    }
    Ok(())
}

impl CellRenderer for WidgetCellRenderer {
    fn init(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        WidgetCellRenderer::init(self, form)
    }

    fn process(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        WidgetCellRenderer::process(self, form)
    }

    fn set_value(&mut self, key: &str, value: Value) -> Result<(), WidgetError> {
        WidgetCellRenderer::set_value(self, key, value)
    }

    fn set_replicator(&mut self, replicator_id: Option<String>) {
        WidgetCellRenderer::set_replicator(self, replicator_id)
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        WidgetCellRenderer::render(self, ctx)
    }

    fn is_renderable(&self) -> bool {
        WidgetCellRenderer::is_renderable(self)
    }

    fn data_specific_css_classes(&self) -> Vec<&'static str> {
        if self.replicator_id.is_some() && self.has_messages(None) {
            vec![ERROR_CLASS]
        } else {
            Vec::new()
        }
    }

    fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    fn widgets(&self) -> Vec<&dyn Widget> {
        self.cloned_widgets()
            .into_iter()
            .map(|(_, replica)| replica)
            .collect()
    }

    fn visit_widgets_mut(&mut self, f: &mut dyn FnMut(&mut dyn Widget)) {
        self.replicas
            .visit_current_mut(self.submitted.as_deref(), |_, replica| f(replica));
    }

    fn clone_renderer(&self) -> Box<dyn CellRenderer> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
