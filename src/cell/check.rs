use std::any::Any;

use serde_json::Value;

use super::CellRenderer;
use crate::{error::WidgetError, html::RenderContext, widget::value_flag};

/// Draws a check mark for a true value and a blank otherwise.
///
/// Its only mappable key is `value`.
#[derive(Debug, Clone, Default)]
pub struct CheckCellRenderer {
    value: bool,
}

impl CheckCellRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CellRenderer for CheckCellRenderer {
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), WidgetError> {
        match key {
            "value" => {
                self.value = value_flag(&value);
                Ok(())
            }
            _ => Err(WidgetError::UnknownMapping(key.to_string())),
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        if self.value {
            ctx.open("span", &[("class", "webui-check"), ("title", "yes")]);
            ctx.write("&#10003;");
            ctx.close("span");
        } else {
            ctx.write("&nbsp;");
        }
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
    fn test_check_renderer() {
        let mut renderer = CheckCellRenderer::new();
        renderer.set_value("value", json!(true)).unwrap();
        let mut ctx = RenderContext::new();
        renderer.render(&mut ctx).unwrap();
        renderer.set_value("value", json!(false)).unwrap();
        renderer.render(&mut ctx).unwrap();
        assert_eq!(
            ctx.into_html(),
            "<span class=\"webui-check\" title=\"yes\">&#10003;</span>&nbsp;"
        );
    }
}
