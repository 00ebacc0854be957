//! Feedback messages attached to widgets.

use serde::Serialize;

/// How a message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Notification,
    Warning,
    Error,
}

impl MessageKind {
    /// CSS class used when rendering a message of this kind.
    pub fn css_class(&self) -> &'static str {
        match self {
            MessageKind::Notification => "webui-message-notification",
            MessageKind::Warning => "webui-message-warning",
            MessageKind::Error => "webui-message-error",
        }
    }
}

/// A message shown next to the widget that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub primary: String,
    pub secondary: Option<String>,
    pub kind: MessageKind,
}

impl Message {
    pub fn new(primary: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
            kind,
        }
    }

    /// Creates a validation error message.
    pub fn error(primary: impl Into<String>) -> Self {
        Self::new(primary, MessageKind::Error)
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(secondary) = &self.secondary {
            write!(f, "{} ({})", self.primary, secondary)
        } else {
            write!(f, "{}", self.primary)
        }
    }
}
