//! HTTP routes and JSON envelopes
//!
//! Every route answers `{errcode, message, data?}`; `errcode` is 0 on success
//! and the error's code otherwise, and the HTTP status carries the same code.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        ConnectInfo, FromRequestParts, Path, Query, State,
    },
    http::{header::USER_AGENT, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::{ChatError, Result};
use crate::models::{ChatMessage, Member, PageRequest, RequestOrigin};
use crate::service::ChatService;
use crate::validation::client_host;

/// Header carrying the authenticated member id, set by the upstream auth layer
pub const MEMBER_HEADER: &str = "x-member-id";

/// Shared application state
pub struct AppState {
    pub service: ChatService,
}

/// Uniform response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResult<T> {
    pub errcode: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> JsonResult<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            errcode: 0,
            message: "ok".to_string(),
            data,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = JsonResult::<()> {
            errcode: self.code(),
            message: self.to_string(),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

/// The logged-in member, if any
pub struct Viewer(pub Option<Member>);

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let member_id = parts
            .headers
            .get(MEMBER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|id| *id > 0);

        let Some(member_id) = member_id else {
            return Ok(Self(None));
        };

        let member = state
            .service
            .store()
            .database()
            .find_member(member_id)
            .unwrap_or_else(|e| {
                warn!(member_id, error = %e, "Member lookup failed; continuing anonymously");
                None
            });
        Ok(Self(member))
    }
}

/// Client host and user agent of the request
pub struct Origin(pub RequestOrigin);

impl<S: Send + Sync> FromRequestParts<S> for Origin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let ip_address = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| client_host(addr))
            .unwrap_or_default();
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(Self(RequestOrigin {
            ip_address,
            user_agent,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub doc_id: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChatParams {
    pub doc_id: Option<i64>,
    #[serde(default)]
    pub prompt: String,
    pub api: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub doc_id: Option<i64>,
    #[serde(default)]
    pub api: String,
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/aigc/messages", get(list_messages))
        .route("/aigc/messages/{id}", delete(delete_message))
        .route("/aigc/chat", post(chat))
        .route("/aigc/analyze", post(analyze))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn respond<T: Serialize>(state: &AppState, result: Result<Option<T>>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(JsonResult::ok(data))).into_response(),
        Err(e) => {
            state.service.metrics().record_error(e.kind());
            e.into_response()
        }
    }
}

fn require_doc_id(doc_id: Option<i64>) -> Result<i64> {
    doc_id.ok_or_else(|| ChatError::validation("doc_id is required"))
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Response {
    let result = params
        .map_err(|e| ChatError::validation(e.body_text()))
        .and_then(|Query(params)| {
            let doc_id = require_doc_id(params.doc_id)?;
            let page = PageRequest::from(params.page.unwrap_or(1));
            state.service.list_messages(doc_id, page, viewer.as_ref())
        })
        .map(Some);
    respond(&state, result)
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    Origin(origin): Origin,
    payload: std::result::Result<Json<ChatParams>, JsonRejection>,
) -> Response {
    let result: Result<Option<ChatMessage>> = async {
        let Json(params) = payload.map_err(|e| ChatError::validation(e.body_text()))?;
        let doc_id = require_doc_id(params.doc_id)?;
        state
            .service
            .chat(
                doc_id,
                &params.prompt,
                params.api.as_deref(),
                viewer.as_ref(),
                &origin,
            )
            .await
            .map(Some)
    }
    .await;
    respond(&state, result)
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    Origin(origin): Origin,
    payload: std::result::Result<Json<AnalyzeParams>, JsonRejection>,
) -> Response {
    let result: Result<Option<ChatMessage>> = async {
        let Json(params) = payload.map_err(|e| ChatError::validation(e.body_text()))?;
        let doc_id = require_doc_id(params.doc_id)?;
        state
            .service
            .analyze(doc_id, &params.api, viewer.as_ref(), &origin)
            .await
            .map(Some)
    }
    .await;
    respond(&state, result)
}

async fn delete_message(
    State(state): State<Arc<AppState>>,
    Viewer(viewer): Viewer,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Response {
    let result = id
        .map_err(|e| ChatError::validation(e.body_text()))
        .and_then(|Path(id)| state.service.delete_message(id, viewer.as_ref()))
        .map(|()| None::<()>);
    respond(&state, result)
}
