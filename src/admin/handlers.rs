use axum::{response::Html, routing::get, Json, Router};
use serde::Serialize;
use serde_json::Value;

use crate::state::AppState;

const STATS_PAGE: &str = include_str!("stats.html");

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin-stats", get(admin_stats))
        .route("/admin/stats", get(admin_stats_page))
}

/// Traffic counters for the admin dashboard. Nothing is tracked yet, so
/// every counter is zero and both lists are empty.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users: Vec<Value>,
    pub total_queries: u64,
    pub total_packets_sent: u64,
    pub total_packets_received: u64,
    pub queries: Vec<Value>,
}

pub async fn admin_stats() -> Json<AdminStats> {
    Json(AdminStats::default())
}

pub async fn admin_stats_page() -> Html<&'static str> {
    Html(STATS_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stats_are_empty_placeholders() {
        let Json(stats) = admin_stats().await;
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "users": [],
                "totalQueries": 0,
                "totalPacketsSent": 0,
                "totalPacketsReceived": 0,
                "queries": [],
            })
        );
    }

    #[tokio::test]
    async fn page_says_there_is_no_data() {
        let Html(page) = admin_stats_page().await;
        assert!(page.contains("NO DATA YET"));
    }
}
