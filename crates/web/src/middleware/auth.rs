use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::sync::Arc;
use storage::services::Actor;
use uuid::Uuid;

use crate::error::WebError;

/// Header carrying the attendee id resolved by the upstream session layer
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    keys: Arc<HashSet<String>>,
}

impl ApiKeys {
    pub fn from_comma_separated(keys_str: &str) -> Self {
        let keys = keys_str
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn authorizes(&self, headers: &HeaderMap) -> bool {
        bearer_token(headers).is_some_and(|token| self.is_valid(token))
    }
}

/// Identity of the request, attached by [`identify_caller`]
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Option<Uuid>,
    pub organizer: bool,
}

impl Caller {
    pub fn actor(&self) -> Result<Actor, WebError> {
        if self.organizer {
            return Ok(Actor::Organizer);
        }
        self.user_id().map(Actor::Attendee)
    }

    pub fn user_id(&self) -> Result<Uuid, WebError> {
        self.user_id.ok_or(WebError::Unauthorized)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

fn user_id_header(headers: &HeaderMap) -> Result<Option<Uuid>, WebError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .map(Some)
        .ok_or_else(|| WebError::BadRequest(format!("{} must be a UUID", USER_ID_HEADER)))
}

/// Organizer-only routes: a valid bearer API key is required
pub async fn require_auth(
    State(api_keys): State<ApiKeys>,
    request: Request,
    next: Next,
) -> Response {
    if api_keys.authorizes(request.headers()) {
        return next.run(request).await;
    }

    tracing::warn!("Invalid API key attempt");
    WebError::Unauthorized.into_response()
}

/// Attendee routes: accepts an attendee id header, an organizer key, or both
pub async fn identify_caller(
    State(api_keys): State<ApiKeys>,
    mut request: Request,
    next: Next,
) -> Response {
    let organizer = api_keys.authorizes(request.headers());
    let user_id = match user_id_header(request.headers()) {
        Ok(user_id) => user_id,
        Err(e) => return e.into_response(),
    };

    if !organizer && user_id.is_none() {
        return WebError::Unauthorized.into_response();
    }

    request
        .extensions_mut()
        .insert(Caller { user_id, organizer });

    next.run(request).await
}
