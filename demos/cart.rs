//! Shopping Cart Example
//!
//! This example demonstrates the widget cell renderer:
//! - One table row per cart item
//! - A quantity entry and a remove checkbox replicated for every row
//! - Per-row validation messages after a postback
//! - Updating the data source from the submitted values
//!
//! Run with: cargo run --example cart
//! Then open http://127.0.0.1:3000 in your browser

use serde::Serialize;
use std::sync::{Arc, Mutex};
use webui_forms::{
    AppState, CheckCellRenderer, Form, MappingTarget, TableView, TableViewColumn,
    TextCellRenderer, WidgetCellRenderer, start_server,
    widget::{Checkbox, Container, IntegerEntry, Label},
};

#[derive(Debug, Clone, Serialize)]
struct Item {
    id: u32,
    name: String,
    unit: String,
    quantity: i64,
    taxed: bool,
}

type Cart = Arc<Mutex<Vec<Item>>>;

fn build_form(cart: &Cart) -> Form {
    let mut quantity = WidgetCellRenderer::with_prototype(
        Container::with_id("quantity_cell")
            .child(IntegerEntry::new("quantity").title("Quantity").required(true))
            .child(Label::new("unit")),
    );
    let quantity_key = quantity
        .map_property("quantity", "value")
        .expect("quantity entry has a value");
    let unit_key = quantity
        .map_property("unit", "text")
        .expect("unit label has text");

    let mut remove = WidgetCellRenderer::with_prototype(Checkbox::new("remove").title("Remove"));
    let remove_title = remove
        .map_property(MappingTarget::Root, "title")
        .expect("checkbox has a title");

    let rows = cart
        .lock()
        .unwrap()
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect();

    let view = TableView::new("cart")
        .row_key("id")
        .column(TableViewColumn::new("name", "Item", TextCellRenderer::new()).bind("text", "name"))
        .column(
            TableViewColumn::new("quantity", "Quantity", quantity)
                .bind(quantity_key, "quantity")
                .bind(unit_key, "unit"),
        )
        .column(TableViewColumn::new("taxed", "Taxed", CheckCellRenderer::new()).bind("value", "taxed"))
        .column(TableViewColumn::new("remove", "Remove", remove).bind(remove_title, "name"))
        .rows(rows);

    Form::new("cart_form").child(view).submit_button("Update cart")
}

fn apply_submission(cart: &Cart, form: &Form) {
    let mut items = cart.lock().unwrap();
    for item in items.iter_mut() {
        let id = format!("quantity_{}", item.id);
        if let Some(quantity) = form.find_as::<IntegerEntry>(&id).and_then(|entry| entry.get_value()) {
            item.quantity = quantity;
        }
    }
    items.retain(|item| {
        let id = format!("remove_{}", item.id);
        !form.find_as::<Checkbox>(&id).is_some_and(|checkbox| checkbox.is_checked())
    });
    println!("Cart updated: {} items", items.len());
}

#[tokio::main]
async fn main() {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let cart: Cart = Arc::new(Mutex::new(vec![
        Item { id: 1, name: "Apples".to_string(), unit: "kg".to_string(), quantity: 2, taxed: false },
        Item { id: 2, name: "Bread".to_string(), unit: "loaf".to_string(), quantity: 1, taxed: false },
        Item { id: 3, name: "Coffee".to_string(), unit: "bag".to_string(), quantity: 1, taxed: true },
    ]));

    let cart_for_build = cart.clone();
    let state = AppState::new(move || build_form(&cart_for_build))
        .on_submit(move |form: &Form| apply_submission(&cart, form));

    println!("Starting cart example on http://127.0.0.1:3000");
    println!("Change quantities, tick rows to remove and press Update cart");

    start_server(state, "Shopping Cart", "127.0.0.1:3000").await.unwrap();
}
