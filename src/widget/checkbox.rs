use std::any::Any;

use serde_json::Value;

use super::{Widget, value_flag};
use crate::{error::WidgetError, form::FormService, html::RenderContext};

const CHECKBOX_SCRIPT: &str = r#"<script src="/static/webui-checkbox.js" defer></script>"#;

/// Checkbox input.
///
/// An unchecked checkbox submits nothing, so on a postback a missing value
/// means unchecked.
#[derive(Debug, Clone, Default)]
pub struct Checkbox {
    id: Option<String>,
    title: Option<String>,
    checked: bool,
    user_supplied: bool,
}

impl Checkbox {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }
}

impl Widget for Checkbox {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn kind(&self) -> &'static str {
        "checkbox"
    }

    fn process(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        let (Some(form), Some(id)) = (form, self.id.as_deref()) else {
            return Ok(());
        };
        if form.is_postback() {
            self.checked = form.submitted_value(id).is_some();
            self.user_supplied = true;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        ctx.emit_once("webui-checkbox", CHECKBOX_SCRIPT);
        let id = self.id.as_deref().unwrap_or_default();
        let mut attrs = vec![("type", "checkbox"), ("id", id), ("name", id), ("value", "on")];
        if let Some(title) = &self.title {
            attrs.push(("title", title.as_str()));
        }
        if self.checked {
            attrs.push(("checked", "checked"));
        }
        ctx.open("input", &attrs);
        Ok(())
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(self.clone())
    }

    fn properties(&self) -> &'static [&'static str] {
        &["checked", "title"]
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), WidgetError> {
        match name {
            "checked" => self.checked = value_flag(&value),
            "title" => self.title = value.as_str().map(str::to_string),
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
            "checked" => Some(Value::Bool(self.checked)),
            "title" => self.title.clone().map(Value::String),
            _ => None,
        }
    }

    fn is_user_supplied(&self, name: &str) -> bool {
        name == "checked" && self.user_supplied
    }

    fn state(&self) -> Option<Value> {
        Some(Value::Bool(self.checked))
    }

    fn set_state(&mut self, state: Value) {
        self.checked = value_flag(&state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
