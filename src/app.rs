#![cfg(not(tarpaulin_include))]
use crate::config::Config;
use crate::error::Result;
use crate::login::{self, AccountStore, MemoryAccountStore};
use crate::{dashboard, downloader, flash, templates, upload};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::{Html, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

/// State shared by every handler
pub struct AppState {
    pub config: Config,
    pub accounts: Arc<dyn AccountStore>,
    pub templates: Handlebars<'static>,
}

#[derive(Serialize)]
struct PageContext<'a, T: Serialize> {
    flashes: &'a [String],
    #[serde(flatten)]
    data: &'a T,
}

#[derive(Serialize)]
struct NoData {}

impl AppState {
    pub fn new(config: Config, accounts: Arc<dyn AccountStore>) -> Result<Self> {
        Ok(Self {
            config,
            accounts,
            templates: templates::registry()?,
        })
    }

    /// Renders `name` with the given flash messages and no other data
    pub fn render(&self, name: &str, flashes: &[String]) -> Result<String> {
        let context = PageContext {
            flashes,
            data: &NoData {},
        };
        Ok(self.templates.render(name, &context)?)
    }

    /// Renders a page, consuming any pending flash messages
    pub fn render_page(&self, jar: CookieJar, name: &str) -> Result<(CookieJar, Html<String>)> {
        self.render_with(jar, name, &NoData {})
    }

    /// Like [`AppState::render_page`], with extra template data
    pub fn render_with<T: Serialize>(
        &self,
        jar: CookieJar,
        name: &str,
        data: &T,
    ) -> Result<(CookieJar, Html<String>)> {
        let (jar, flashes) = flash::take(jar);
        let context = PageContext {
            flashes: &flashes,
            data,
        };
        let page = self.templates.render(name, &context)?;
        Ok((jar, Html(page)))
    }
}

/// Builds the application router
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(serve_welcome))
        .route(
            "/sign_up",
            get(login::serve_signup_page).post(login::handle_signup),
        )
        .route(
            "/login",
            get(login::serve_login_page).post(login::handle_login),
        )
        .route(
            "/upload",
            get(upload::serve_upload_page).post(upload::handle_upload),
        )
        .route("/settings", get(serve_settings))
        .route("/chat", get(serve_chat))
        .route("/report", get(serve_report))
        .route("/logout", get(login::handle_logout))
        .route("/dashboard", get(dashboard::render_dashboard))
        .route("/download_report", get(downloader::download_report))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Starts the web server and blocks until it stops
///
/// Creates the upload directory first if it is missing.
pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.upload_dir)?;

    let address = config.server_address();
    let state = Arc::new(AppState::new(config, MemoryAccountStore::shared())?);
    let app = router(state);

    let listener = TcpListener::bind(&address).await?;
    log::info!("Listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    log::info!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

async fn serve_welcome(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    state.render_page(jar, "welcome")
}

async fn serve_settings(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    state.render_page(jar, "settings")
}

async fn serve_chat(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    state.render_page(jar, "chat")
}

async fn serve_report(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    state.render_page(jar, "report")
}
