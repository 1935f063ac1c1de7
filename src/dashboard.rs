use crate::app::AppState;
use crate::error::Result;
use crate::graph;
use axum::{extract::State, response::Html};
use axum_extra::extract::cookie::CookieJar;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use std::sync::Arc;

/// The four charts as base64 PNG payloads, keyed the way the template expects
#[derive(Debug, Clone, Serialize)]
pub struct DashboardCharts {
    pub sentiment_chart: String,
    pub sales_chart: String,
    pub revenue_chart: String,
    pub visitors_chart: String,
}

impl DashboardCharts {
    /// Renders every chart and base64-encodes it
    pub fn generate() -> Result<Self> {
        Ok(Self {
            sentiment_chart: encode(graph::generate_sentiment_chart()?),
            sales_chart: encode(graph::generate_sales_chart()?),
            revenue_chart: encode(graph::generate_revenue_chart()?),
            visitors_chart: encode(graph::generate_visitors_chart()?),
        })
    }
}

fn encode(png: Vec<u8>) -> String {
    STANDARD.encode(png)
}

/// Serve the dashboard with all four charts embedded inline
pub async fn render_dashboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let charts = tokio::task::spawn_blocking(DashboardCharts::generate).await??;
    state.render_with(jar, "dashboard", &charts)
}
