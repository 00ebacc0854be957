//! Forms: the request-scoped home of submitted values and hidden fields.
//!
//! A form renders its widgets inside `<form method="post">` and appends two
//! hidden inputs: [`FORM_FIELD`] carries the form id (its presence in a
//! submission is what makes a request a postback for this form) and
//! [`HIDDEN_FIELD`] carries every hidden field added while rendering,
//! serialized as JSON and encoded as URL-safe base64. On the next request the
//! submitted payload is decoded and served back through
//! [`FormService::hidden_field`], so values round-trip exactly once.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    error::WidgetError,
    html::RenderContext,
    message::Message,
    tree,
    widget::Widget,
};

/// Name of the hidden input identifying the submitted form.
pub const FORM_FIELD: &str = "_webui_form";

/// Name of the hidden input carrying the encoded hidden fields.
pub const HIDDEN_FIELD: &str = "_webui_hidden";

/// What widgets need from the form that encloses them.
pub trait FormService {
    /// Whether the current request submits this form.
    fn is_postback(&self) -> bool;

    /// A hidden field as it was submitted with this request.
    fn hidden_field(&self, key: &str) -> Option<&Value>;

    /// Adds a hidden field to the response, replacing any earlier value under `key`.
    fn set_hidden_field(&mut self, key: &str, value: Value);

    /// Raw submitted value of the input named `name`.
    fn submitted_value(&self, name: &str) -> Option<&str>;

    /// A submitted hidden field holding an ordered list of strings.
    ///
    /// `Ok(None)` when the field was not submitted. Anything but an array of
    /// strings is rejected.
    fn persisted_list(&self, key: &str) -> Result<Option<Vec<String>>, WidgetError> {
        let Some(value) = self.hidden_field(key) else {
            return Ok(None);
        };
        let malformed = || WidgetError::HiddenFields(format!("`{key}` is not a list of strings"));
        let items = value.as_array().ok_or_else(malformed)?;
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(malformed))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Stores an ordered list of strings for the next request.
    fn set_persisted_list(&mut self, key: &str, items: &[String]) {
        self.set_hidden_field(key, Value::from(items.to_vec()));
    }
}

/// Raw name/value pairs of a submitted request body.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    values: IndexMap<String, String>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value. A later value for the same name wins.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for Submission {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Encodes hidden fields for the [`HIDDEN_FIELD`] input.
pub fn encode_hidden_fields(fields: &IndexMap<String, Value>) -> Result<String, WidgetError> {
    let json = serde_json::to_vec(fields)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes the payload of a submitted [`HIDDEN_FIELD`] input.
pub fn decode_hidden_fields(payload: &str) -> Result<IndexMap<String, Value>, WidgetError> {
    let json = URL_SAFE_NO_PAD.decode(payload.trim())?;
    Ok(serde_json::from_slice(&json)?)
}

/// Submission and hidden field bookkeeping of one form for one request.
#[derive(Debug, Default)]
pub struct FormState {
    id: String,
    submission: Option<Submission>,
    submitted_hidden: IndexMap<String, Value>,
    hidden: IndexMap<String, Value>,
}

impl FormState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attaches a request body. Returns whether it submits this form.
    ///
    /// Fails if the body submits this form with a hidden field payload that
    /// cannot be decoded.
    pub fn attach(&mut self, submission: Submission) -> Result<bool, WidgetError> {
        if submission.get(FORM_FIELD) != Some(self.id.as_str()) {
            return Ok(false);
        }
        self.submitted_hidden = match submission.get(HIDDEN_FIELD) {
            Some(payload) => decode_hidden_fields(payload).inspect_err(|err| {
                warn!("form {}: rejecting hidden fields: {}", self.id, err);
            })?,
            None => IndexMap::new(),
        };
        debug!(
            "form {} submitted with {} values and {} hidden fields",
            self.id,
            submission.len(),
            self.submitted_hidden.len()
        );
        self.submission = Some(submission);
        Ok(true)
    }

    /// Hidden fields added to the response so far.
    pub fn hidden_fields(&self) -> &IndexMap<String, Value> {
        &self.hidden
    }

    pub fn clear_hidden_fields(&mut self) {
        self.hidden.clear();
    }
}

impl FormService for FormState {
    fn is_postback(&self) -> bool {
        self.submission.is_some()
    }

    fn hidden_field(&self, key: &str) -> Option<&Value> {
        self.submitted_hidden.get(key)
    }

    fn set_hidden_field(&mut self, key: &str, value: Value) {
        self.hidden.insert(key.to_string(), value);
    }

    fn submitted_value(&self, name: &str) -> Option<&str> {
        self.submission.as_ref()?.get(name)
    }
}

/// A form and the widgets it contains.
pub struct Form {
    action: String,
    submit_label: Option<String>,
    children: Vec<Box<dyn Widget>>,
    state: FormState,
}

impl Form {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            action: "/".to_string(),
            submit_label: None,
            children: Vec::new(),
            state: FormState::new(id),
        }
    }

    pub fn id(&self) -> &str {
        self.state.id()
    }

    /// Sets the URL the form posts to.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Adds a submit button with `label` after the widgets.
    pub fn submit_button(mut self, label: impl Into<String>) -> Self {
        self.submit_label = Some(label.into());
        self
    }

    pub fn child(mut self, child: impl Widget) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn add(&mut self, child: Box<dyn Widget>) {
        self.children.push(child);
    }

    /// Attaches a request body. See [`FormState::attach`].
    pub fn submit(&mut self, submission: Submission) -> Result<bool, WidgetError> {
        self.state.attach(submission)
    }

    pub fn is_submitted(&self) -> bool {
        self.state.is_postback()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }

    /// Initializes every widget. Runs before [`Form::process`].
    pub fn init(&mut self) -> Result<(), WidgetError> {
        let form: &dyn FormService = &self.state;
        for child in &mut self.children {
            child.init(Some(form))?;
        }
        Ok(())
    }

    /// Processes submitted values. Does nothing on a first request.
    pub fn process(&mut self) -> Result<(), WidgetError> {
        if !self.state.is_postback() {
            return Ok(());
        }
        let form: &dyn FormService = &self.state;
        for child in &mut self.children {
            child.process(Some(form))?;
        }
        Ok(())
    }

    /// Renders the form, its widgets and its hidden fields.
    pub fn display(&mut self) -> Result<String, WidgetError> {
        self.state.clear_hidden_fields();

        let mut body = RenderContext::with_form(&mut self.state);
        for child in &mut self.children {
            child.render(&mut body)?;
        }
        let body = body.into_html();

        let id = self.state.id();
        let mut ctx = RenderContext::new();
        ctx.open(
            "form",
            &[("id", id), ("method", "post"), ("action", self.action.as_str())],
        );
        ctx.write(&body);
        if let Some(label) = &self.submit_label {
            ctx.open("button", &[("type", "submit"), ("class", "webui-submit")]);
            ctx.write_text(label);
            ctx.close("button");
        }
        ctx.open("input", &[("type", "hidden"), ("name", FORM_FIELD), ("value", id)]);
        if !self.state.hidden_fields().is_empty() {
            let payload = encode_hidden_fields(self.state.hidden_fields())?;
            ctx.open(
                "input",
                &[("type", "hidden"), ("name", HIDDEN_FIELD), ("value", payload.as_str())],
            );
        }
        ctx.close("form");
        Ok(ctx.into_html())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.children.iter().flat_map(|child| child.messages()).collect()
    }

    pub fn has_messages(&self) -> bool {
        self.children.iter().any(|child| child.has_messages())
    }

    /// The widget with identity `id` anywhere in this form, replicas included.
    pub fn find(&self, id: &str) -> Option<&dyn Widget> {
        self.children
            .iter()
            .find_map(|child| tree::find(child.as_ref(), id))
    }

    /// Like [`Form::find`], downcast to a concrete widget type.
    pub fn find_as<T: Widget>(&self, id: &str) -> Option<&T> {
        self.find(id)?.as_any().downcast_ref::<T>()
    }

    /// Finds a widget by identity and downcasts it to `T` for mutation.
    pub fn with_widget_mut<T: Widget, R>(&mut self, id: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut f = Some(f);
        let mut result = None;
        for child in &mut self.children {
            tree::walk_mut(child.as_mut(), &mut |_, node| {
                if result.is_some() || node.id() != Some(id) {
                    return;
                }
                if let Some(target) = node.as_any_mut().downcast_mut::<T>()
                    && let Some(apply) = f.take()
                {
                    result = Some(apply(target));
                }
            });
        }
        result
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("id", &self.state.id())
            .field("action", &self.action)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{Entry, Label};
    use serde_json::json;
    use std::any::Any;

    fn submission_from(html: &str, extra: &[(&str, &str)]) -> Submission {
        let mut submission = Submission::new();
        for name in [FORM_FIELD, HIDDEN_FIELD] {
            if let Some(value) = hidden_input_value(html, name) {
                submission.insert(name, value);
            }
        }
        for (name, value) in extra {
            submission.insert(*name, *value);
        }
        submission
    }

    fn hidden_input_value(html: &str, name: &str) -> Option<String> {
        let marker = format!("name=\"{name}\" value=\"");
        let start = html.find(&marker)? + marker.len();
        let end = html[start..].find('"')?;
        Some(html[start..start + end].to_string())
    }

    #[test]
    fn test_persisted_list_round_trip() {
        let ids = vec!["3".to_string(), "1".to_string(), "10".to_string()];
        let mut rendered = FormState::new("form");
        rendered.set_persisted_list("field_replicators", &ids);

        let payload = encode_hidden_fields(rendered.hidden_fields()).unwrap();
        let mut next = FormState::new("form");
        let submission = Submission::from_iter([
            (FORM_FIELD.to_string(), "form".to_string()),
            (HIDDEN_FIELD.to_string(), payload),
        ]);
        assert!(next.attach(submission).unwrap());
        assert_eq!(next.persisted_list("field_replicators").unwrap(), Some(ids));
        assert_eq!(next.persisted_list("other").unwrap(), None);
    }

    #[test]
    fn test_tampered_persisted_list_is_rejected() {
        let mut rendered = FormState::new("form");
        rendered.set_hidden_field("mixed", json!([1, "2"]));
        rendered.set_hidden_field("scalar", json!("1"));

        let mut next = FormState::new("form");
        let submission = Submission::from_iter([
            (FORM_FIELD.to_string(), "form".to_string()),
            (HIDDEN_FIELD.to_string(), encode_hidden_fields(rendered.hidden_fields()).unwrap()),
        ]);
        assert!(next.attach(submission).unwrap());
        assert!(matches!(next.persisted_list("mixed"), Err(WidgetError::HiddenFields(_))));
        assert!(matches!(next.persisted_list("scalar"), Err(WidgetError::HiddenFields(_))));
    }

    #[test]
    fn test_submission_for_other_form_is_not_postback() {
        let mut state = FormState::new("form");
        let submission = Submission::from_iter([(FORM_FIELD.to_string(), "other".to_string())]);
        assert!(!state.attach(submission).unwrap());
        assert!(!state.is_postback());
    }

    #[test]
    fn test_corrupt_hidden_fields_are_rejected() {
        let mut state = FormState::new("form");
        let submission = Submission::from_iter([
            (FORM_FIELD.to_string(), "form".to_string()),
            (HIDDEN_FIELD.to_string(), "not base64!".to_string()),
        ]);
        assert!(matches!(state.attach(submission), Err(WidgetError::HiddenFields(_))));
    }

    #[test]
    fn test_form_display_and_postback() {
        let mut form = Form::new("edit").child(Entry::new("name").value("Alpha"));
        form.init().unwrap();
        let html = form.display().unwrap();
        assert!(html.starts_with("<form id=\"edit\" method=\"post\" action=\"/\">"));
        assert!(html.contains("value=\"Alpha\""));
        assert!(!html.contains(HIDDEN_FIELD));

        let mut next = Form::new("edit").child(Entry::new("name"));
        assert!(next.submit(submission_from(&html, &[("name", "Beta")])).unwrap());
        next.init().unwrap();
        next.process().unwrap();
        assert_eq!(next.find_as::<Entry>("name").map(Entry::get_value), Some("Beta"));
    }

    #[test]
    fn test_submit_button_precedes_hidden_inputs() {
        let mut form = Form::new("edit").action("/save").submit_button("Save");
        let html = form.display().unwrap();
        assert_eq!(
            html,
            "<form id=\"edit\" method=\"post\" action=\"/save\">\
             <button type=\"submit\" class=\"webui-submit\">Save</button>\
             <input type=\"hidden\" name=\"_webui_form\" value=\"edit\"></form>"
        );
    }

    #[test]
    fn test_hidden_fields_written_during_render() {
        struct Marker;

        impl Widget for Marker {
            fn id(&self) -> Option<&str> {
                None
            }
            fn set_id(&mut self, _id: Option<String>) {}
            fn kind(&self) -> &'static str {
                "marker"
            }
            fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
                if let Some(form) = ctx.form() {
                    form.set_hidden_field("marker", json!(["a", "b"]));
                }
                Ok(())
            }
            fn clone_widget(&self) -> Box<dyn Widget> {
                Box::new(Marker)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        let mut form = Form::new("edit").child(Marker).child(Label::new("l"));
        let html = form.display().unwrap();
        let mut next = FormState::new("edit");
        next.attach(submission_from(&html, &[])).unwrap();
        assert_eq!(
            next.persisted_list("marker").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_with_widget_mut() {
        let mut form = Form::new("edit").child(Entry::new("name"));
        let updated = form.with_widget_mut::<Entry, _>("name", |entry| {
            entry.add_message(Message::error("taken"));
        });
        assert!(updated.is_some());
        assert!(form.has_messages());
    }
}
