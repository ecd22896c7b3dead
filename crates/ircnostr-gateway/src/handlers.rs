// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers: GET /health, GET /status, GET /metrics.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use ircnostr_core::types::ConnectionState;
use ircnostr_irc::ConnectionSnapshot;
use ircnostr_relay::StatsSnapshot;
use serde::Serialize;

use crate::server::{BridgeFacts, GatewayState};

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: &'static str,
    pub uptime_secs: u64,
    pub timestamp: DateTime<Utc>,
}

/// Response body for GET /status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub stats: StatsSnapshot,
    pub connection: ConnectionSnapshot,
    #[serde(flatten)]
    pub facts: BridgeFacts,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /health
///
/// 200 while the chat connection is registered and a publisher exists,
/// 503 otherwise.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let registered = state.connection.borrow().state == ConnectionState::Registered;
    let healthy = registered && state.publisher_configured;

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        uptime_secs: state.start_time.elapsed().as_secs(),
        timestamp: Utc::now(),
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body)).into_response()
}

/// GET /status
pub async fn get_status(State(state): State<GatewayState>) -> Json<StatusResponse> {
    let connection = state.connection.borrow().clone();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        stats: state.stats.snapshot(),
        connection,
        facts: (*state.facts).clone(),
    })
}

/// GET /metrics
///
/// Prometheus text exposition, or 404 when metrics export is disabled.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "metrics export is disabled".to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "healthy",
            uptime_secs: 42,
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"uptime_secs\":42"));
        assert!(json.contains("\"timestamp\":\"2023-11-14T22:13:20Z\""));
    }

    #[test]
    fn error_response_serializes() {
        let resp = ErrorResponse {
            error: "metrics export is disabled".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"metrics export is disabled"}"#);
    }
}
