//! Cell renderers: what a table view uses to draw one cell per row.
//!
//! For every row the view pushes the row's values with
//! [`CellRenderer::set_value`], tells the renderer which row it is drawing
//! with [`CellRenderer::set_replicator`] and calls [`CellRenderer::render`].
//! Plain renderers only draw values. [`WidgetCellRenderer`] replicates a
//! whole widget tree per row so each row gets its own inputs.

mod check;
pub mod mapping;
pub mod replica;
mod text;
mod widget;

pub use check::CheckCellRenderer;
pub use mapping::{Mapping, MappingRegistry, MappingTarget};
pub use replica::{ReplicaStore, clone_tree};
pub use text::TextCellRenderer;
pub use widget::WidgetCellRenderer;

use std::any::Any;

use serde_json::Value;

use crate::{error::WidgetError, form::FormService, html::RenderContext, widget::Widget};

/// CSS class added to cells whose widgets have messages.
pub const ERROR_CLASS: &str = "webui-error";

pub trait CellRenderer: Any + Send {
    fn init(&mut self, _form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        Ok(())
    }

    fn process(&mut self, _form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Sets the value of a mappable property for the next render.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), WidgetError>;

    /// Selects the row the next render is for. `None` renders unreplicated.
    fn set_replicator(&mut self, _replicator_id: Option<String>) {}

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError>;

    /// Whether a cell has anything to render. Has no side effects.
    fn is_renderable(&self) -> bool {
        true
    }

    /// Extra CSS classes for the cell of the current row.
    fn data_specific_css_classes(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Receives the title of the enclosing column.
    fn set_title(&mut self, _title: Option<String>) {}

    /// Widgets owned by this renderer that are part of the form.
    fn widgets(&self) -> Vec<&dyn Widget> {
        Vec::new()
    }

    fn visit_widgets_mut(&mut self, _f: &mut dyn FnMut(&mut dyn Widget)) {}

    fn clone_renderer(&self) -> Box<dyn CellRenderer>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn CellRenderer {
    pub fn downcast_ref<T: CellRenderer>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: CellRenderer>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

impl Clone for Box<dyn CellRenderer> {
    fn clone(&self) -> Self {
        self.clone_renderer()
    }
}

impl std::fmt::Debug for dyn CellRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellRenderer")
            .field("widgets", &self.widgets().len())
            .finish()
    }
}
