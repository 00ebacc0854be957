//! Table views: rows of data drawn through per-column cell renderers.

use std::any::Any;

use serde_json::Value;

use crate::{
    cell::CellRenderer,
    error::WidgetError,
    form::FormService,
    html::RenderContext,
    widget::{Widget, value_text},
};

/// One column of a [`TableView`].
///
/// Each binding copies a field of the row into a renderer key before the
/// cell is drawn.
#[derive(Debug, Clone)]
pub struct TableViewColumn {
    id: String,
    title: String,
    renderer: Box<dyn CellRenderer>,
    bindings: Vec<(String, String)>,
}

impl TableViewColumn {
    pub fn new(id: impl Into<String>, title: impl Into<String>, renderer: impl CellRenderer) -> Self {
        let title = title.into();
        let mut renderer: Box<dyn CellRenderer> = Box::new(renderer);
        renderer.set_title(Some(title.clone()).filter(|title| !title.is_empty()));
        Self {
            id: id.into(),
            title,
            renderer,
            bindings: Vec::new(),
        }
    }

    /// Feeds `field` of every row into the renderer's `key`.
    pub fn bind(mut self, key: impl Into<String>, field: impl Into<String>) -> Self {
        self.bindings.push((key.into(), field.into()));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn renderer(&self) -> &dyn CellRenderer {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn CellRenderer {
        self.renderer.as_mut()
    }

    /// The renderer as its concrete type.
    pub fn renderer_as<T: CellRenderer>(&self) -> Option<&T> {
        self.renderer.downcast_ref()
    }

    fn load_row(&mut self, row: &Value, replicator_id: &str) -> Result<(), WidgetError> {
        for (key, field) in &self.bindings {
            let value = row.get(field).cloned().unwrap_or(Value::Null);
            self.renderer.set_value(key, value)?;
        }
        self.renderer.set_replicator(Some(replicator_id.to_string()));
        Ok(())
    }
}

/// A `<table>` with one row per data object and one cell per column.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    id: Option<String>,
    row_key: Option<String>,
    columns: Vec<TableViewColumn>,
    rows: Vec<Value>,
}

impl TableView {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Field of each row that identifies it across requests.
    ///
    /// Without one, rows are identified by their index. With one, every row
    /// must carry a non-empty value in it; rows are never mixed between the
    /// two schemes, so an index can not collide with a key.
    pub fn row_key(mut self, field: impl Into<String>) -> Self {
        self.row_key = Some(field.into());
        self
    }

    pub fn column(mut self, column: TableViewColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows;
        self
    }

    pub fn set_rows(&mut self, rows: Vec<Value>) {
        self.rows = rows;
    }

    pub fn columns(&self) -> &[TableViewColumn] {
        &self.columns
    }

    pub fn find_column(&self, id: &str) -> Option<&TableViewColumn> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn find_column_mut(&mut self, id: &str) -> Option<&mut TableViewColumn> {
        self.columns.iter_mut().find(|column| column.id == id)
    }

    fn replicator_id(&self, index: usize, row: &Value) -> Result<String, WidgetError> {
        let Some(field) = self.row_key.as_deref() else {
            return Ok(index.to_string());
        };
        row.get(field)
            .filter(|value| !value.is_null())
            .map(value_text)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| WidgetError::MissingRowKey {
                field: field.to_string(),
                index,
            })
    }

    fn render_head(&self, ctx: &mut RenderContext<'_>) {
        ctx.open("thead", &[]);
        ctx.open("tr", &[]);
        for column in &self.columns {
            ctx.open("th", &[("class", "webui-column-title")]);
            ctx.write_text(&column.title);
            ctx.close("th");
        }
        ctx.close("tr");
        ctx.close("thead");
    }
}

impl Widget for TableView {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn kind(&self) -> &'static str {
        "table_view"
    }

    fn init(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        for column in &mut self.columns {
            column.renderer.init(form)?;
        }
        Ok(())
    }

    fn process(&mut self, form: Option<&dyn FormService>) -> Result<(), WidgetError> {
        for column in &mut self.columns {
            column.renderer.process(form)?;
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), WidgetError> {
        let mut attrs = Vec::new();
        if let Some(id) = &self.id {
            attrs.push(("id", id.as_str()));
        }
        attrs.push(("class", "webui-table-view"));
        ctx.open("table", &attrs);
        self.render_head(ctx);

        ctx.open("tbody", &[]);
        let rows = std::mem::take(&mut self.rows);
        let result = self.render_rows(ctx, &rows);
        self.rows = rows;
        for column in &mut self.columns {
            column.renderer.set_replicator(None);
        }
        result?;
        ctx.close("tbody");
        ctx.close("table");
        Ok(())
    }

    fn children(&self) -> Vec<&dyn Widget> {
        self.columns
            .iter()
            .flat_map(|column| column.renderer.widgets())
            .collect()
    }

    fn visit_children_mut(&mut self, f: &mut dyn FnMut(&mut dyn Widget)) {
        for column in &mut self.columns {
            column.renderer.visit_widgets_mut(f);
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

impl TableView {
    fn render_rows(&mut self, ctx: &mut RenderContext<'_>, rows: &[Value]) -> Result<(), WidgetError> {
        for (index, row) in rows.iter().enumerate() {
            let replicator_id = self.replicator_id(index, row)?;
            ctx.open("tr", &[]);
            for column in &mut self.columns {
                column.load_row(row, &replicator_id)?;
                let mut class = String::from("webui-cell");
                for extra in column.renderer.data_specific_css_classes() {
                    class.push(' ');
                    class.push_str(extra);
                }
                ctx.open("td", &[("class", class.as_str())]);
                if column.renderer.is_renderable() {
                    column.renderer.render(ctx)?;
                }
                ctx.close("td");
            }
            ctx.close("tr");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CheckCellRenderer, TextCellRenderer, WidgetCellRenderer};
    use crate::form::{FORM_FIELD, Form, HIDDEN_FIELD, Submission, encode_hidden_fields};
    use crate::widget::{Container, IntegerEntry, Label};
    use serde_json::json;

    fn build_form() -> Form {
        let mut quantity = WidgetCellRenderer::with_prototype(
            Container::with_id("row")
                .child(Label::new("unit"))
                .child(IntegerEntry::new("qty").title("Quantity")),
        );
        let unit = quantity.map_property("unit", "text").unwrap();
        let qty = quantity.map_property("qty", "value").unwrap();

        let view = TableView::new("items")
            .row_key("sku")
            .column(TableViewColumn::new("name", "Name", TextCellRenderer::new()).bind("text", "name"))
            .column(
                TableViewColumn::new("quantity", "Quantity", quantity)
                    .bind(unit, "unit")
                    .bind(qty, "qty"),
            )
            .column(TableViewColumn::new("taxed", "Taxed", CheckCellRenderer::new()).bind("value", "taxed"))
            .rows(vec![
                json!({"sku": "a1", "name": "Apples", "unit": "kg", "qty": 2, "taxed": false}),
                json!({"sku": "b2", "name": "Bread", "unit": "loaf", "qty": 1, "taxed": true}),
            ]);
        Form::new("cart").child(view)
    }

    fn hidden_value(html: &str) -> String {
        let marker = format!("name=\"{HIDDEN_FIELD}\" value=\"");
        let start = html.find(&marker).unwrap() + marker.len();
        let end = html[start..].find('"').unwrap();
        html[start..start + end].to_string()
    }

    #[test]
    fn test_table_renders_one_replica_per_row() {
        let mut form = build_form();
        form.init().unwrap();
        form.process().unwrap();
        let html = form.display().unwrap();

        assert!(html.contains("<th class=\"webui-column-title\">Quantity</th>"));
        assert!(html.contains("<td class=\"webui-cell\">Apples</td>"));
        assert!(html.contains("id=\"unit_a1\" class=\"webui-label\">kg</span>"));
        assert!(html.contains("id=\"qty_b2\" name=\"qty_b2\" value=\"1\""));
        assert!(html.contains("&#10003;"));
        assert_eq!(
            form.state().hidden_fields().get("row_replicators"),
            Some(&json!(["a1", "b2"]))
        );
    }

    #[test]
    fn test_rows_without_key_use_index() {
        let mut renderer = WidgetCellRenderer::with_prototype(Label::new("cell"));
        let key = renderer.map_property(crate::cell::MappingTarget::Root, "text").unwrap();
        let view = TableView::new("plain")
            .column(TableViewColumn::new("cell", "", renderer).bind(key, "text"))
            .rows(vec![json!({"text": "x"}), json!({"text": "y"})]);
        let mut form = Form::new("f").child(view);
        let html = form.display().unwrap();
        assert!(html.contains("id=\"cell_0\""));
        assert!(html.contains("id=\"cell_1\""));
        assert!(!html.contains("<th class=\"webui-column-title\">x"));
    }

    #[test]
    fn test_postback_marks_invalid_cells() {
        let mut form = build_form();
        let html = form.display().unwrap();

        let mut submission = Submission::new();
        submission.insert(FORM_FIELD, "cart");
        submission.insert(HIDDEN_FIELD, hidden_value(&html));
        submission.insert("qty_a1", "3");
        submission.insert("qty_b2", "lots");

        let mut next = build_form();
        assert!(next.submit(submission).unwrap());
        next.init().unwrap();
        next.process().unwrap();
        assert!(next.has_messages());
        assert_eq!(next.messages().len(), 1);

        let qty = next.find_as::<IntegerEntry>("qty_a1").map(|entry| entry.get_value());
        assert_eq!(qty, Some(Some(3)));

        let html = next.display().unwrap();
        assert!(html.contains("<td class=\"webui-cell webui-error\">"));
        assert!(html.contains("The Quantity field must be an integer."));
        assert!(html.contains("value=\"3\""));
    }

    #[test]
    fn test_rows_without_usable_key_are_rejected() {
        for row in [json!({"id": null}), json!({}), json!({"id": ""})] {
            let mut renderer = WidgetCellRenderer::with_prototype(Label::new("cell"));
            let key = renderer.map_property(crate::cell::MappingTarget::Root, "text").unwrap();
            let view = TableView::new("keyed")
                .row_key("id")
                .column(TableViewColumn::new("cell", "", renderer).bind(key, "text"))
                .rows(vec![json!({"id": "0"}), row]);
            let mut form = Form::new("f").child(view);
            assert!(matches!(
                form.display(),
                Err(WidgetError::MissingRowKey { index: 1, .. })
            ));
        }
    }

    #[test]
    fn test_numeric_row_keys_become_text() {
        let mut renderer = WidgetCellRenderer::with_prototype(Label::new("cell"));
        let key = renderer.map_property(crate::cell::MappingTarget::Root, "text").unwrap();
        let view = TableView::new("keyed")
            .row_key("id")
            .column(TableViewColumn::new("cell", "", renderer).bind(key, "text"))
            .rows(vec![json!({"id": 7, "text": "a"}), json!({"id": "x", "text": "b"})]);
        let mut form = Form::new("f").child(view);
        let html = form.display().unwrap();
        assert!(html.contains("id=\"cell_7\""));
        assert!(html.contains("id=\"cell_x\""));
        assert_eq!(
            form.state().hidden_fields().get("cell_replicators"),
            Some(&json!(["7", "x"]))
        );
    }

    #[test]
    fn test_column_title_reaches_renderer() {
        let form = build_form();
        let view = form.find_as::<TableView>("items").unwrap();
        let column = view.find_column("quantity").unwrap();
        assert_eq!(column.title(), "Quantity");
        let renderer = column.renderer_as::<WidgetCellRenderer>().unwrap();
        assert_eq!(renderer.title(), Some("Quantity"));
    }

    #[test]
    fn test_hidden_fields_are_url_safe() {
        let mut form = build_form();
        let html = form.display().unwrap();
        let hidden = hidden_value(&html);
        assert!(!hidden.contains('+') && !hidden.contains('/'));
        let fields = form.state().hidden_fields().clone();
        assert_eq!(encode_hidden_fields(&fields).unwrap(), hidden);
    }
}
