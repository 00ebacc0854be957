//! Error types for widget trees and cell renderers.
//!
//! These are structural errors: a misconfigured tree or a value pushed to a
//! mapping nobody declared. Validation problems with submitted input are not
//! errors, they are [`Message`](crate::Message)s attached to widgets.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    /// A widget cell renderer holds exactly one prototype widget.
    #[error("cell renderer already has a prototype widget; only one widget can be added")]
    PrototypeAlreadyRegistered,

    /// Replication derives identities and the hidden field key from the prototype id.
    #[error("prototype widget must have an id to be replicated")]
    PrototypeWithoutId,

    /// A value was pushed under a key that was never registered as a mapping.
    #[error("no property mapping registered under key `{0}`")]
    UnknownMapping(String),

    /// The target widget does not declare the property as settable.
    #[error("widget kind `{kind}` has no settable property `{property}`")]
    UnknownProperty { kind: &'static str, property: String },

    /// The mapping target could not be found in the prototype tree.
    #[error("mapping target {0} not found in prototype widget tree")]
    UnknownMappingTarget(String),

    /// A replica tree no longer lines up with the prototype tree.
    #[error("cloned widget tree does not match prototype widget tree at position {position}")]
    ReplicaTreeMismatch { position: usize },

    /// Replication was attempted outside of a form.
    #[error("cell renderer must be inside a form for widget replication to work")]
    MissingFormContext,

    /// A row of a keyed table view has no usable value in its key field.
    #[error("row {index} has no value in key field `{field}`")]
    MissingRowKey { field: String, index: usize },

    /// The hidden field payload of a submission could not be decoded.
    #[error("invalid hidden field payload: {0}")]
    HiddenFields(String),
}

impl From<serde_json::Error> for WidgetError {
    fn from(err: serde_json::Error) -> Self {
        WidgetError::HiddenFields(err.to_string())
    }
}

impl From<base64::DecodeError> for WidgetError {
    fn from(err: base64::DecodeError) -> Self {
        WidgetError::HiddenFields(err.to_string())
    }
}
