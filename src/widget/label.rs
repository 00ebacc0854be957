use std::any::Any;

use serde_json::Value;

use super::{Widget, value_text};
use crate::{error::WidgetError, html::RenderContext};

/// Read-only text.
///
/// Renders as `<span id="..." class="webui-label">text</span>`.
#[derive(Debug, Clone, Default)]
pub struct Label {
    id: Option<String>,
    text: String,
}

impl Label {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: String::new(),
        }
    }

    /// A label without an identity.
    pub fn anonymous(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn get_text(&self) -> &str {
        &self.text
    }
}

impl Widget for Label {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn kind(&self) -> &'static str {
        "label"
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        match &self.id {
            Some(id) => ctx.open("span", &[("id", id.as_str()), ("class", "webui-label")]),
            None => ctx.open("span", &[("class", "webui-label")]),
        }
        ctx.write_text(&self.text);
        ctx.close("span");
        Ok(())
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(self.clone())
    }

    fn properties(&self) -> &'static [&'static str] {
        &["text"]
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), WidgetError> {
        match name {
            "text" => self.text = value_text(&value),
            _ => {
                return Err(WidgetError::UnknownProperty {
                    kind: self.kind(),
                    property: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "text" => Some(Value::String(self.text.clone())),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_render_escapes_text() {
        let mut label = Label::new("name").text("<b>Alpha</b>");
        let mut ctx = RenderContext::new();
        label.render(&mut ctx).unwrap();
        assert_eq!(
            ctx.into_html(),
            "<span id=\"name\" class=\"webui-label\">&lt;b&gt;Alpha&lt;/b&gt;</span>"
        );
    }

    #[test]
    fn test_label_rejects_unknown_property() {
        let mut label = Label::new("name");
        let err = label.set_property("value", Value::Null).unwrap_err();
        assert!(matches!(err, WidgetError::UnknownProperty { kind: "label", .. }));
    }
}
