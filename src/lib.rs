//! WebUI Forms - server-rendered forms with per-row widgets
//!
//! WebUI Forms builds HTML forms out of a tree of Rust widgets. The page is
//! rendered on the server, posted back as a regular form submission and
//! rebuilt on every request. Only two things survive between requests: the
//! values the user submitted and the hidden fields the widgets asked the form
//! to carry.
//!
//! # Architecture
//!
//! - **Widgets** ([`widget`]): labels, entries, checkboxes and containers. A
//!   widget knows its identity, reads its own submitted value, validates it
//!   into [`Message`]s and renders itself.
//! - **Forms** ([`form`]): own the submission and the hidden fields of one
//!   request and drive `init`, `process` and `display` over their widgets.
//! - **Table views** ([`view`]): draw one row per data object, one cell per
//!   column, through [`CellRenderer`]s.
//! - **Widget cell renderer** ([`WidgetCellRenderer`]): the heart of the
//!   crate. It holds one prototype widget tree and gives every row its own
//!   replica of it, so each row has independently named inputs
//!   (`quantity_1`, `quantity_2`, ...). The ids of the rows rendered are
//!   stored in the form so that a postback finds every replica again, even
//!   for rows that have since disappeared from the data source.
//!
//! # Request cycle
//!
//! `GET /` builds the form and displays it. `POST /` builds the same form,
//! attaches the submission, runs `init` and `process`, calls the submit
//! callback if no widget produced a message and displays the result.
//!
//! # Example
//!
//! ```no_run
//! use webui_forms::{
//!     AppState, Form, RouterConfig, TableView, TableViewColumn, TextCellRenderer,
//!     WidgetCellRenderer, create_router,
//!     widget::IntegerEntry,
//! };
//! use serde_json::json;
//!
//! fn build() -> Form {
//!     let mut quantity = WidgetCellRenderer::with_prototype(
//!         IntegerEntry::new("quantity").title("Quantity"),
//!     );
//!     let key = quantity.map_property("quantity", "value").unwrap();
//!
//!     let view = TableView::new("items")
//!         .row_key("id")
//!         .column(TableViewColumn::new("name", "Name", TextCellRenderer::new()).bind("text", "name"))
//!         .column(TableViewColumn::new("quantity", "Quantity", quantity).bind(key, "quantity"))
//!         .rows(vec![json!({"id": 1, "name": "Apples", "quantity": 3})]);
//!     Form::new("cart").child(view)
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::new(build).on_submit(|form: &Form| {
//!         println!("{} submitted", form.id());
//!     });
//!
//!     let app = create_router(RouterConfig::new(state).title("Cart"));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
//!         .await
//!         .unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod cell;
pub mod error;
pub mod form;
pub mod html;
pub mod message;
pub mod tree;
pub mod view;
pub mod widget;

pub use cell::{CellRenderer, CheckCellRenderer, MappingTarget, TextCellRenderer, WidgetCellRenderer};
pub use error::WidgetError;
pub use form::{Form, FormService, FormState, Submission};
pub use html::RenderContext;
pub use message::{Message, MessageKind};
pub use view::{TableView, TableViewColumn};
pub use widget::Widget;

use axum::{
    Router,
    extract::{Form as FormBody, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

type BuildCallback = Arc<Box<dyn Fn() -> Form + Send + Sync + 'static>>;
type SubmitCallback = Option<Arc<Box<dyn Fn(&Form) + Send + Sync + 'static>>>;

/// Application state: how to build the page's form and what to do with an
/// accepted submission.
///
/// The form is rebuilt for every request, so widgets never outlive a request.
/// `AppState` is cheap to clone and shared by all connections.
#[derive(Clone)]
pub struct AppState {
    build: BuildCallback,
    on_submit: SubmitCallback,
}

impl AppState {
    /// Creates a new `AppState` that builds its form with `build`.
    ///
    /// # Example
    /// ```
    /// use webui_forms::{AppState, Form};
    ///
    /// let state = AppState::new(|| Form::new("empty"));
    /// ```
    pub fn new(build: impl Fn() -> Form + Send + Sync + 'static) -> Self {
        Self {
            build: Arc::new(Box::new(build)),
            on_submit: None,
        }
    }

    /// Sets the callback invoked with a processed form that has no messages.
    ///
    /// The callback sees the form after `process`, so the submitted values
    /// can be read with [`Form::find_as`]. The page is rebuilt afterwards.
    pub fn on_submit(mut self, on_submit: impl Fn(&Form) + Send + Sync + 'static) -> Self {
        self.on_submit = Some(Arc::new(Box::new(on_submit)));
        self
    }

    /// Runs one request cycle and returns the form's markup.
    ///
    /// `submission` is the posted body, or `None` for a first request.
    pub fn render_page(&self, submission: Option<Submission>) -> Result<String, WidgetError> {
        let mut form = (self.build)();
        if let Some(submission) = submission {
            form.submit(submission)?;
        }
        form.init()?;
        form.process()?;

        if form.is_submitted() {
            if form.has_messages() {
                info!("form {} returned with {} messages", form.id(), form.messages().len());
            } else {
                info!("form {} accepted", form.id());
                if let Some(on_submit) = &self.on_submit {
                    on_submit(&form);
                }
                form = (self.build)();
                form.init()?;
            }
        }
        form.display()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("on_submit", &self.on_submit.is_some())
            .finish()
    }
}

impl IntoResponse for WidgetError {
    fn into_response(self) -> Response {
        let status = match self {
            WidgetError::HiddenFields(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("request failed: {}", self);
        (status, self.to_string()).into_response()
    }
}

#[derive(Clone)]
struct Page {
    state: AppState,
    title: Arc<str>,
}

async fn show_page(State(page): State<Page>) -> Result<Html<String>, WidgetError> {
    let body = page.state.render_page(None)?;
    Ok(Html(generate_html(&page.title, &body)))
}

async fn submit_page(
    State(page): State<Page>,
    FormBody(fields): FormBody<Vec<(String, String)>>,
) -> Result<Html<String>, WidgetError> {
    let submission = fields.into_iter().collect::<Submission>();
    let body = page.state.render_page(Some(submission))?;
    Ok(Html(generate_html(&page.title, &body)))
}

// Default HTML template - wraps the rendered form
fn generate_html(title: &str, body_content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/webui.css">
</head>
<body>
{body_content}
</body>
</html>"#, title = html::escape(title), body_content = body_content)
}

/// Configuration for creating a WebUI Forms router
pub struct RouterConfig {
    /// Application state
    pub state: AppState,
    /// Path to static files directory
    pub static_dir: String,
    /// HTML page title
    pub title: String,
}

impl RouterConfig {
    /// Creates a new router configuration
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            static_dir: "static".to_string(),
            title: "WebUI App".to_string(),
        }
    }

    /// Sets the page title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the static files directory
    pub fn static_dir(mut self, dir: impl Into<String>) -> Self {
        self.static_dir = dir.into();
        self
    }
}

/// Creates an Axum router serving the form.
///
/// The router includes:
/// - `GET /` - Builds and displays the form
/// - `POST /` - Processes a submission and displays the result
/// - `/static` - Serves static files (webui.css, webui-checkbox.js, etc.)
pub fn create_router(config: RouterConfig) -> Router {
    let page = Page {
        state: config.state,
        title: Arc::from(config.title),
    };

    Router::new()
        .route("/", get(show_page).post(submit_page))
        .nest_service("/static", ServeDir::new(config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(page)
}

/// Convenience function to start a WebUI Forms server.
///
/// # Example
/// ```no_run
/// use webui_forms::{AppState, Form, start_server};
///
/// #[tokio::main]
/// async fn main() {
///     let state = AppState::new(|| Form::new("empty"));
///     start_server(state, "My App", "127.0.0.1:3000").await.unwrap();
/// }
/// ```
pub async fn start_server(
    state: AppState,
    title: impl Into<String>,
    addr: impl AsRef<str>,
) -> Result<(), std::io::Error> {
    let config = RouterConfig::new(state).title(title);
    let app = create_router(config);

    let listener = tokio::net::TcpListener::bind(addr.as_ref()).await?;
    info!("Server running on http://{}", addr.as_ref());

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FORM_FIELD, HIDDEN_FIELD};
    use crate::widget::IntegerEntry;
    use serde_json::json;
    use std::sync::Mutex;

    fn build_cart() -> Form {
        let mut quantity = WidgetCellRenderer::with_prototype(
            IntegerEntry::new("quantity").title("Quantity").required(true),
        );
        let key = quantity.map_property(MappingTarget::Root, "value").unwrap();
        let view = TableView::new("items")
            .row_key("id")
            .column(TableViewColumn::new("name", "Name", TextCellRenderer::new()).bind("text", "name"))
            .column(TableViewColumn::new("quantity", "Quantity", quantity).bind(key, "quantity"))
            .rows(vec![
                json!({"id": 1, "name": "Apples", "quantity": 3}),
                json!({"id": 2, "name": "Pears", "quantity": 1}),
            ]);
        Form::new("cart").child(view)
    }

    fn hidden_value(html: &str) -> String {
        let marker = format!("name=\"{HIDDEN_FIELD}\" value=\"");
        let start = html.find(&marker).expect("hidden input") + marker.len();
        let end = html[start..].find('"').expect("closing quote");
        html[start..start + end].to_string()
    }

    #[test]
    fn test_render_page_first_request() {
        let state = AppState::new(build_cart);
        let html = state.render_page(None).unwrap();
        assert!(html.contains("id=\"quantity_1\""));
        assert!(html.contains("id=\"quantity_2\""));
        assert!(html.contains(&format!("name=\"{FORM_FIELD}\" value=\"cart\"")));
    }

    #[test]
    fn test_render_page_accepts_valid_submission() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_callback = seen.clone();
        let state = AppState::new(build_cart).on_submit(move |form: &Form| {
            let value = form
                .find_as::<IntegerEntry>("quantity_2")
                .and_then(|entry| entry.get_value());
            seen_in_callback.lock().unwrap().push(value);
        });

        let first = state.render_page(None).unwrap();
        let submission: Submission = [
            (FORM_FIELD, "cart".to_string()),
            (HIDDEN_FIELD, hidden_value(&first)),
            ("quantity_1", "3".to_string()),
            ("quantity_2", "7".to_string()),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
        let html = state.render_page(Some(submission)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some(7)]);
        // The page is rebuilt after an accepted submission.
        assert!(html.contains("value=\"1\""));
    }

    #[test]
    fn test_app_state_debug() {
        let state = AppState::new(|| Form::new("empty"));
        assert_eq!(format!("{state:?}"), "AppState { on_submit: false }");
    }

    // Test helper: Start a web server on a random port and wait for it to be ready
    async fn start_test_server(state: AppState, title: &str) -> u16 {
        let config = RouterConfig::new(state).title(title);
        let app = create_router(config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let port = listener.local_addr().expect("Failed to get address").port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to be ready by polling HTTP endpoint
        let url = format!("http://127.0.0.1:{}", port);
        let client = reqwest::Client::new();
        for _ in 0..10 {
            if client.get(&url).send().await.is_ok() {
                return port;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
        panic!("Server failed to start");
    }

    async fn post_form(port: u16, body: String) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("http://127.0.0.1:{}/", port))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to post")
    }

    #[tokio::test]
    async fn test_get_page_e2e() {
        let port = start_test_server(AppState::new(build_cart), "Cart").await;
        let response = reqwest::get(format!("http://127.0.0.1:{}/", port))
            .await
            .expect("Failed to get");
        assert_eq!(response.status(), 200);
        let html = response.text().await.expect("Failed to read body");
        assert!(html.contains("<title>Cart</title>"));
        assert!(html.contains("<td class=\"webui-cell\">Apples</td>"));
        assert!(html.contains("id=\"quantity_1\""));
    }

    #[tokio::test]
    async fn test_postback_with_errors_e2e() {
        let submitted = Arc::new(Mutex::new(0usize));
        let counter = submitted.clone();
        let state = AppState::new(build_cart).on_submit(move |_: &Form| {
            *counter.lock().unwrap() += 1;
        });
        let port = start_test_server(state, "Cart").await;

        let first = reqwest::get(format!("http://127.0.0.1:{}/", port))
            .await
            .expect("Failed to get")
            .text()
            .await
            .expect("Failed to read body");
        let body = format!(
            "{FORM_FIELD}=cart&{HIDDEN_FIELD}={}&quantity_1=4&quantity_2=",
            hidden_value(&first)
        );
        let response = post_form(port, body).await;
        assert_eq!(response.status(), 200);
        let html = response.text().await.expect("Failed to read body");

        assert!(html.contains("The Quantity field is required."));
        assert!(html.contains("<td class=\"webui-cell webui-error\">"));
        assert!(html.contains("value=\"4\""));
        assert_eq!(*submitted.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_valid_postback_e2e() {
        let submitted = Arc::new(Mutex::new(0usize));
        let counter = submitted.clone();
        let state = AppState::new(build_cart).on_submit(move |_: &Form| {
            *counter.lock().unwrap() += 1;
        });
        let port = start_test_server(state, "Cart").await;

        let first = reqwest::get(format!("http://127.0.0.1:{}/", port))
            .await
            .expect("Failed to get")
            .text()
            .await
            .expect("Failed to read body");
        let body = format!(
            "{FORM_FIELD}=cart&{HIDDEN_FIELD}={}&quantity_1=4&quantity_2=5",
            hidden_value(&first)
        );
        let response = post_form(port, body).await;
        assert_eq!(response.status(), 200);
        let html = response.text().await.expect("Failed to read body");
        assert!(!html.contains("webui-error"));
        assert_eq!(*submitted.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_hidden_fields_e2e() {
        let port = start_test_server(AppState::new(build_cart), "Cart").await;
        let body = format!("{FORM_FIELD}=cart&{HIDDEN_FIELD}=not*base64");
        let response = post_form(port, body).await;
        assert_eq!(response.status(), 400);
    }
}
