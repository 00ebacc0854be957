use std::any::Any;

use serde_json::Value;

use super::CellRenderer;
use crate::{error::WidgetError, html::RenderContext, widget::value_text};

/// Draws a value as escaped text. Its only mappable key is `text`.
#[derive(Debug, Clone, Default)]
pub struct TextCellRenderer {
    text: String,
}

impl TextCellRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CellRenderer for TextCellRenderer {
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), WidgetError> {
        match key {
            "text" => {
                self.text = value_text(&value);
                Ok(())
            }
            _ => Err(WidgetError::UnknownMapping(key.to_string())),
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        ctx.write_text(&self.text);
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_renderer() {
        let mut renderer = TextCellRenderer::new();
        renderer.set_value("text", json!("A & B")).unwrap();
        let mut ctx = RenderContext::new();
        renderer.render(&mut ctx).unwrap();
        assert_eq!(ctx.into_html(), "A &amp; B");
        assert!(matches!(
            renderer.set_value("title", json!("x")),
            Err(WidgetError::UnknownMapping(key)) if key == "title"
        ));
    }
}
