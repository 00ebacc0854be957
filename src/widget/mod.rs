//! Widgets: the building blocks of a form.
//!
//! A widget owns its identity, its own submitted value and validation
//! messages, and knows how to copy itself (including any children it owns).
//! Widgets never hold a pointer back to their parent; the enclosing form is
//! handed down explicitly to [`Widget::init`], [`Widget::process`] and
//! through the [`RenderContext`] to [`Widget::render`].

mod checkbox;
mod container;
mod entry;
mod label;

pub use checkbox::Checkbox;
pub use container::Container;
pub use entry::{Entry, IntegerEntry};
pub use label::Label;

use std::any::Any;

use serde_json::Value;

use crate::{error::WidgetError, form::FormService, html::RenderContext, message::Message};

/// Capability shared by every widget in a tree.
pub trait Widget: Any + Send {
    /// Identity of this widget, unique within a form. `None` for anonymous widgets.
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);

    /// Short name of the concrete widget type.
    fn kind(&self) -> &'static str;

    /// Called once per request before any processing.
    fn init(&mut self, _form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Reads this widget's submitted value from `form` and validates it.
    fn process(&mut self, _form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError>;

    /// Direct children in display order. Empty for leaves.
    fn children(&self) -> Vec<&dyn Widget> {
        Vec::new()
    }

    /// Calls `f` for every direct child in display order.
    fn visit_children_mut(&mut self, _f: &mut dyn FnMut(&mut dyn Widget)) {}

    /// Messages produced by this widget itself, not its children.
    fn own_messages(&self) -> Vec<Message> {
        Vec::new()
    }

    /// Messages of this widget and all of its descendants.
    fn messages(&self) -> Vec<Message> {
        let mut messages = self.own_messages();
        for child in self.children() {
            messages.extend(child.messages());
        }
        messages
    }

    fn has_messages(&self) -> bool {
        !self.messages().is_empty()
    }

    /// Deep copy of this widget and everything it owns.
    fn clone_widget(&self) -> Box<dyn Widget>;

    /// Names of the properties that can be set with [`Widget::set_property`].
    fn properties(&self) -> &'static [&'static str] {
        &[]
    }

    fn accepts_property(&self, name: &str) -> bool {
        self.properties().contains(&name)
    }

    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), WidgetError> {
        Err(WidgetError::UnknownProperty {
            kind: self.kind(),
            property: name.to_string(),
        })
    }

    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Whether `name` currently holds a value the user submitted.
    ///
    /// Mapped row values are not written over user input.
    fn is_user_supplied(&self, _name: &str) -> bool {
        false
    }

    /// Opaque state for persistence beyond hidden fields. `None` for stateless widgets.
    fn state(&self) -> Option<Value> {
        None
    }

    fn set_state(&mut self, _state: Value) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Widget {
    pub fn downcast_ref<T: Widget>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Widget>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

impl Clone for Box<dyn Widget> {
    fn clone(&self) -> Self {
        self.clone_widget()
    }
}

impl std::fmt::Debug for dyn Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .finish()
    }
}

/// Text form of a property value: strings verbatim, `null` as empty.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Truthiness of a property value.
pub(crate) fn value_flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty() && text != "0" && text != "false",
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Writes `messages` as a list below a field.
pub(crate) fn render_messages(ctx: &mut RenderContext<'_>, messages: &[Message]) {
    if messages.is_empty() {
        return;
    }
    ctx.open("ul", &[("class", "webui-messages")]);
    for message in messages {
        ctx.open("li", &[("class", message.kind.css_class())]);
        ctx.write_text(&message.to_string());
        ctx.close("li");
    }
    ctx.close("ul");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("Alpha")), "Alpha");
        assert_eq!(value_text(&json!(3)), "3");
        assert_eq!(value_text(&Value::Null), "");
    }

    #[test]
    fn test_value_flag() {
        assert!(value_flag(&json!(true)));
        assert!(value_flag(&json!(1)));
        assert!(!value_flag(&json!("0")));
        assert!(!value_flag(&Value::Null));
    }

    #[test]
    fn test_boxed_clone_is_deep() {
        let original: Box<dyn Widget> = Box::new(Label::new("name").text("Alpha"));
        let mut copy = original.clone();
        copy.set_property("text", json!("Beta")).unwrap();
        assert_eq!(original.property("text"), Some(json!("Alpha")));
        assert_eq!(copy.property("text"), Some(json!("Beta")));
    }

    #[test]
    fn test_downcast() {
        let widget: Box<dyn Widget> = Box::new(Checkbox::new("remove"));
        assert!(widget.downcast_ref::<Checkbox>().is_some());
        assert!(widget.downcast_ref::<Label>().is_none());
    }
}
