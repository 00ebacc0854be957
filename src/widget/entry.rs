use std::any::Any;

use serde_json::Value;

use super::{Widget, render_messages, value_flag, value_text};
use crate::{error::WidgetError, form::FormService, html::RenderContext, message::Message};

/// Single line text input.
///
/// Renders as `<input type="text" id="..." name="..." value="...">` followed
/// by any validation messages.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    id: Option<String>,
    title: Option<String>,
    value: String,
    required: bool,
    max_length: Option<usize>,
    user_supplied: bool,
    messages: Vec<Message>,
}

impl Entry {
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

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn get_value(&self) -> &str {
        &self.value
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("this")
    }

    /// Reads the raw submitted value. Returns whether a value was submitted.
    fn read_submitted(&mut self, form: Option<&dyn FormService>) -> bool {
        let (Some(form), Some(id)) = (form, self.id.as_deref()) else {
            return false;
        };
        if !form.is_postback() {
            return false;
        }
        let Some(raw) = form.submitted_value(id) else {
            return false;
        };
        self.value = raw.trim().to_string();
        self.user_supplied = true;
        self.messages.clear();
        true
    }

    fn validate(&mut self) {
        if self.required && self.value.is_empty() {
            let message = format!("The {} field is required.", self.display_title());
            self.messages.push(Message::error(message));
            return;
        }
        if let Some(max_length) = self.max_length
            && self.value.chars().count() > max_length
        {
            let message = format!(
                "The {} field can be at most {} characters long.",
                self.display_title(),
                max_length
            );
            self.messages.push(Message::error(message));
        }
    }

    fn render_input(&self, ctx: &mut RenderContext<'_>, input_type: &str) {
        let id = self.id.as_deref().unwrap_or_default();
        let max_length = self.max_length.map(|n| n.to_string());
        let mut attrs = vec![("type", input_type), ("id", id), ("name", id), ("value", self.value.as_str())];
        if let Some(max_length) = &max_length {
            attrs.push(("maxlength", max_length.as_str()));
        }
        if let Some(title) = &self.title {
            attrs.push(("title", title.as_str()));
        }
        ctx.open("input", &attrs);
        render_messages(ctx, &self.messages);
    }

    fn set_common_property(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "title" => self.title = Some(value_text(value)).filter(|title| !title.is_empty()),
            "required" => self.required = value_flag(value),
            _ => return false,
        }
        true
    }

    fn common_property(&self, name: &str) -> Option<Value> {
        match name {
            "title" => self.title.clone().map(Value::String),
            "required" => Some(Value::Bool(self.required)),
            _ => None,
        }
    }
}

impl Widget for Entry {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn kind(&self) -> &'static str {
        "entry"
    }

    fn process(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        if self.read_submitted(form) {
            self.validate();
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        self.render_input(ctx, "text");
        Ok(())
    }

    fn own_messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(self.clone())
    }

    fn properties(&self) -> &'static [&'static str] {
        &["value", "title", "required"]
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), WidgetError> {
        if name == "value" {
            self.value = value_text(&value);
            return Ok(());
        }
        if self.set_common_property(name, &value) {
            return Ok(());
        }
        Err(WidgetError::UnknownProperty {
            kind: self.kind(),
            property: name.to_string(),
        })
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "value" => Some(Value::String(self.value.clone())),
            _ => self.common_property(name),
        }
    }

    fn is_user_supplied(&self, name: &str) -> bool {
        name == "value" && self.user_supplied
    }

    fn state(&self) -> Option<Value> {
        Some(Value::String(self.value.clone()))
    }

    fn set_state(&mut self, state: Value) {
        self.value = value_text(&state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Text input accepting whole numbers.
#[derive(Debug, Clone, Default)]
pub struct IntegerEntry {
    entry: Entry,
    value: Option<i64>,
}

impl IntegerEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            entry: Entry::new(id),
            value: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.entry = self.entry.title(title);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.entry = self.entry.required(required);
        self
    }

    pub fn value(mut self, value: i64) -> Self {
        self.set_number(Some(value));
        self
    }

    pub fn get_value(&self) -> Option<i64> {
        self.value
    }

    fn set_number(&mut self, value: Option<i64>) {
        self.value = value;
        self.entry.value = value.map(|n| n.to_string()).unwrap_or_default();
    }

    fn number_from(value: &Value) -> Option<i64> {
        match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Widget for IntegerEntry {
    fn id(&self) -> Option<&str> {
        self.entry.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.entry.id = id;
    }

    fn kind(&self) -> &'static str {
        "integer_entry"
    }

    fn process(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        if !self.entry.read_submitted(form) {
            return Ok(());
        }
        self.entry.validate();
        if self.entry.value.is_empty() {
            self.value = None;
            return Ok(());
        }
        match self.entry.value.parse::<i64>() {
            Ok(number) => self.value = Some(number),
            Err(_) => {
                self.value = None;
                let message = format!("The {} field must be an integer.", self.entry.display_title());
                self.entry.messages.push(Message::error(message));
            }
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        self.entry.render_input(ctx, "number");
        Ok(())
    }

    fn own_messages(&self) -> Vec<Message> {
        self.entry.messages.clone()
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
        Box::new(self.clone())
    }

    fn properties(&self) -> &'static [&'static str] {
        &["value", "title", "required"]
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), WidgetError> {
        if name == "value" {
            self.set_number(Self::number_from(&value));
            return Ok(());
        }
        if self.entry.set_common_property(name, &value) {
            return Ok(());
        }
        Err(WidgetError::UnknownProperty {
            kind: self.kind(),
            property: name.to_string(),
        })
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "value" => Some(self.value.map(Value::from).unwrap_or(Value::Null)),
            _ => self.entry.common_property(name),
        }
    }

    fn is_user_supplied(&self, name: &str) -> bool {
        self.entry.is_user_supplied(name)
    }

    fn state(&self) -> Option<Value> {
        Some(self.value.map(Value::from).unwrap_or(Value::Null))
    }

    fn set_state(&mut self, state: Value) {
        self.set_number(Self::number_from(&state));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
