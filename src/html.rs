//! HTML output helpers.

use std::collections::HashSet;

use crate::form::FormService;

/// Escapes text for use in HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Output sink for one response.
///
/// Besides the markup buffer, the context carries the form that encloses the
/// widgets being rendered (if any) and the set of one-time fragments already
/// emitted into this response.
pub struct RenderContext<'a> {
    html: String,
    form: Option<&'a mut dyn FormService>,
    emitted: HashSet<&'static str>,
}

impl<'a> RenderContext<'a> {
    /// Creates a context for rendering outside of any form.
    pub fn new() -> Self {
        Self {
            html: String::new(),
            form: None,
            emitted: HashSet::new(),
        }
    }

    /// Creates a context for rendering the children of `form`.
    pub fn with_form(form: &'a mut dyn FormService) -> Self {
        Self {
            html: String::new(),
            form: Some(form),
            emitted: HashSet::new(),
        }
    }

    /// The form enclosing the widgets being rendered.
    pub fn form(&mut self) -> Option<&mut (dyn FormService + 'a)> {
        self.form.as_deref_mut()
    }

    pub fn has_form(&self) -> bool {
        self.form.is_some()
    }

    /// Writes raw markup.
    pub fn write(&mut self, markup: &str) {
        self.html.push_str(markup);
    }

    /// Writes escaped text.
    pub fn write_text(&mut self, text: &str) {
        self.html.push_str(&escape(text));
    }

    /// Writes an opening tag. Attribute values are escaped.
    pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.html.push('<');
        self.html.push_str(tag);
        for (name, value) in attrs {
            self.html.push(' ');
            self.html.push_str(name);
            self.html.push_str("=\"");
            self.html.push_str(&escape(value));
            self.html.push('"');
        }
        self.html.push('>');
    }

    pub fn close(&mut self, tag: &str) {
        self.html.push_str("</");
        self.html.push_str(tag);
        self.html.push('>');
    }

    /// Writes `markup` only the first time `key` is seen in this response.
    ///
    /// Returns whether the markup was written.
    pub fn emit_once(&mut self, key: &'static str, markup: &str) -> bool {
        if !self.emitted.insert(key) {
            return false;
        }
        self.html.push_str(markup);
        true
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

impl Default for RenderContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_emit_once() {
        let mut ctx = RenderContext::new();
        assert!(ctx.emit_once("script", "<script></script>"));
        assert!(!ctx.emit_once("script", "<script></script>"));
        assert_eq!(ctx.html(), "<script></script>");
    }

    #[test]
    fn test_open_escapes_attributes() {
        let mut ctx = RenderContext::new();
        ctx.open("input", &[("value", "a\"b")]);
        assert_eq!(ctx.into_html(), "<input value=\"a&quot;b\">");
    }
}
