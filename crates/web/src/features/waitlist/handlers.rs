use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::waitlist::{
    ExpirySweepResponse, JoinWaitlistRequest, LeaveWaitlistResponse, OfferSpotRequest,
    RespondToOfferRequest, WaitlistEntryResponse, WaitlistSummary,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebResult;
use crate::middleware::auth::Caller;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/waitlist",
    params(
        ("event_id" = Uuid, Path, description = "Event ID"),
        ("x-user-id" = Uuid, Header, description = "Authenticated attendee")
    ),
    request_body = JoinWaitlistRequest,
    responses(
        (status = 201, description = "Joined the waitlist", body = WaitlistEntryResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already on the waitlist")
    ),
    tag = "waitlist"
)]
pub async fn join_waitlist(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<JoinWaitlistRequest>,
) -> WebResult<Response> {
    req.validate()?;
    let user_id = caller.user_id()?;

    let entry = state.waitlist.join(event_id, user_id, req.notes).await?;

    Ok((StatusCode::CREATED, Json(WaitlistEntryResponse::from(entry))).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/waitlist",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Waiting entries by position, then answered and lapsed offers", body = Vec<WaitlistEntryResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "waitlist"
)]
pub async fn list_waitlist(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> WebResult<Response> {
    let entries = services::list_entries(&state.waitlist, event_id).await?;

    Ok(Json(entries).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/waitlist/summary",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Entry counts per status", body = WaitlistSummary),
        (status = 401, description = "Unauthorized")
    ),
    tag = "waitlist"
)]
pub async fn get_waitlist_summary(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> WebResult<Response> {
    let summary = state.waitlist.summary(event_id).await?;

    Ok(Json(summary).into_response())
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/waitlist/me",
    params(
        ("event_id" = Uuid, Path, description = "Event ID"),
        ("x-user-id" = Uuid, Header, description = "Authenticated attendee")
    ),
    responses(
        (status = 200, description = "The caller's waiting or offered entry", body = WaitlistEntryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not on the waitlist")
    ),
    tag = "waitlist"
)]
pub async fn get_my_entry(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(event_id): Path<Uuid>,
) -> WebResult<Response> {
    let user_id = caller.user_id()?;
    let entry = state.waitlist.my_entry(event_id, user_id).await?;

    Ok(Json(WaitlistEntryResponse::from(entry)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/waitlist/offer",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    request_body = OfferSpotRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Spot offered to the first waiting attendee", body = WaitlistEntryResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Nobody is waiting")
    ),
    tag = "waitlist"
)]
pub async fn offer_spot(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<OfferSpotRequest>,
) -> WebResult<Response> {
    req.validate()?;

    let entry = services::offer_next_spot(
        &state.waitlist,
        event_id,
        req.expires_in_hours,
        state.offer_hours,
    )
    .await?;

    Ok(Json(WaitlistEntryResponse::from(entry)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/waitlist/{entry_id}",
    params(
        ("entry_id" = Uuid, Path, description = "Waitlist entry ID")
    ),
    responses(
        (status = 200, description = "Waitlist entry", body = WaitlistEntryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Entry belongs to another attendee"),
        (status = 404, description = "Entry not found")
    ),
    tag = "waitlist"
)]
pub async fn get_entry(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(entry_id): Path<Uuid>,
) -> WebResult<Response> {
    let entry = state.waitlist.get(entry_id, caller.actor()?).await?;

    Ok(Json(WaitlistEntryResponse::from(entry)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/waitlist/{entry_id}",
    params(
        ("entry_id" = Uuid, Path, description = "Waitlist entry ID")
    ),
    responses(
        (status = 200, description = "Left the waitlist", body = LeaveWaitlistResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Entry belongs to another attendee"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Entry is no longer waiting")
    ),
    tag = "waitlist"
)]
pub async fn leave_waitlist(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(entry_id): Path<Uuid>,
) -> WebResult<Response> {
    state.waitlist.leave(entry_id, caller.actor()?).await?;

    Ok(Json(LeaveWaitlistResponse { success: true }).into_response())
}

#[utoipa::path(
    post,
    path = "/api/waitlist/{entry_id}/respond",
    params(
        ("entry_id" = Uuid, Path, description = "Waitlist entry ID"),
        ("x-user-id" = Uuid, Header, description = "Authenticated attendee")
    ),
    request_body = RespondToOfferRequest,
    responses(
        (status = 200, description = "Offer accepted or declined", body = WaitlistEntryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Entry belongs to another attendee"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Entry has no open offer"),
        (status = 410, description = "Offer expired")
    ),
    tag = "waitlist"
)]
pub async fn respond_to_offer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(entry_id): Path<Uuid>,
    Json(req): Json<RespondToOfferRequest>,
) -> WebResult<Response> {
    let user_id = caller.user_id()?;
    let entry = state.waitlist.respond(entry_id, user_id, req.accept).await?;

    Ok(Json(WaitlistEntryResponse::from(entry)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/waitlist/expire-overdue",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Overdue offers expired", body = ExpirySweepResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "waitlist"
)]
pub async fn expire_overdue_offers(State(state): State<AppState>) -> WebResult<Response> {
    let response = services::expire_overdue(&state.waitlist).await?;

    Ok(Json(response).into_response())
}
