use std::any::Any;

use super::Widget;
use crate::{error::WidgetError, form::FormService, html::RenderContext};

/// Groups child widgets in a `<div>`.
#[derive(Debug, Clone, Default)]
pub struct Container {
    id: Option<String>,
    class: Option<String>,
    children: Vec<Box<dyn Widget>>,
}

impl Container {
    /// A container without an identity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn child(mut self, child: impl Widget) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn add(&mut self, child: Box<dyn Widget>) {
        self.children.push(child);
    }
}

impl Widget for Container {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn kind(&self) -> &'static str {
        "container"
    }

    fn init(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        for child in &mut self.children {
            child.init(form)?;
        }
        Ok(())
    }

    fn process(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        for child in &mut self.children {
            child.process(form)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        let mut attrs = Vec::new();
        if let Some(id) = &self.id {
            attrs.push(("id", id.as_str()));
        }
        attrs.push(("class", self.class.as_deref().unwrap_or("webui-container")));
        ctx.open("div", &attrs);
        for child in &mut self.children {
            child.render(ctx)?;
        }
        ctx.close("div");
        Ok(())
    }

    fn children(&self) -> Vec<&dyn Widget> {
        let mut children: Vec<&dyn Widget> = Vec::with_capacity(self.children.len());
        for child in &self.children {
            children.push(child.as_ref());
        }
        children
    }

    fn visit_children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Widget)) {
        for child in &mut self.children {
            f(child.as_mut());
        }
    }

    fn clone_widget(&self) -> Box<dyn Widget> {
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
    use crate::widget::{Entry, Label};

    #[test]
    fn test_container_renders_children_in_order() {
        let mut container = Container::with_id("row")
            .child(Label::new("name").text("Alpha"))
            .child(Entry::new("qty"));
        let mut ctx = RenderContext::new();
        container.render(&mut ctx).unwrap();
        let html = ctx.into_html();
        assert!(html.starts_with("<div id=\"row\" class=\"webui-container\">"));
        let label = html.find("Alpha").unwrap();
        let entry = html.find("id=\"qty\"").unwrap();
        assert!(label < entry);
    }

    #[test]
    fn test_container_aggregates_messages() {
        let mut entry = Entry::new("qty");
        entry.add_message(crate::Message::error("bad"));
        let container = Container::new().child(Label::new("name")).child(entry);
        assert_eq!(container.messages().len(), 1);
        assert!(container.has_messages());
    }
}
