use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{
    expire_overdue_offers, get_entry, get_my_entry, get_waitlist_summary, join_waitlist,
    leave_waitlist, list_waitlist, offer_spot, respond_to_offer,
};
use crate::middleware::auth::{ApiKeys, identify_caller, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let organizer = Router::new()
        .route("/events/:event_id/waitlist", get(list_waitlist))
        .route("/events/:event_id/waitlist/summary", get(get_waitlist_summary))
        .route("/events/:event_id/waitlist/offer", post(offer_spot))
        .route("/admin/waitlist/expire-overdue", post(expire_overdue_offers))
        .route_layer(middleware::from_fn_with_state(api_keys.clone(), require_auth));

    let attendee = Router::new()
        .route("/events/:event_id/waitlist", post(join_waitlist))
        .route("/events/:event_id/waitlist/me", get(get_my_entry))
        .route("/waitlist/:entry_id", get(get_entry).delete(leave_waitlist))
        .route("/waitlist/:entry_id/respond", post(respond_to_offer))
        .route_layer(middleware::from_fn_with_state(api_keys, identify_caller));

    organizer.merge(attendee)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{Value, json};
    use storage::{
        clock::{Clock, ManualClock}, repository::InMemoryWaitlistStore, services::WaitlistCoordinator,
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::middleware::auth::USER_ID_HEADER;

    const API_KEY: &str = "organizer-key";

    struct TestApp {
        router: Router,
        clock: Arc<ManualClock>,
        event_id: Uuid,
    }

    fn test_app() -> TestApp {
        let start = Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let waitlist =
            WaitlistCoordinator::new(Arc::new(InMemoryWaitlistStore::new()), clock.clone());
        let state = AppState {
            waitlist,
            offer_hours: 24,
        };

        let router = Router::new()
            .nest("/api", routes(ApiKeys::from_comma_separated(API_KEY)))
            .with_state(state);

        TestApp {
            router,
            clock,
            event_id: Uuid::new_v4(),
        }
    }

    enum As {
        Attendee(Uuid),
        Organizer,
        Anonymous,
    }

    impl TestApp {
        async fn call(&self, method: Method, uri: &str, who: As, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            builder = match who {
                As::Attendee(user_id) => builder.header(USER_ID_HEADER, user_id.to_string()),
                As::Organizer => builder.header("authorization", format!("Bearer {}", API_KEY)),
                As::Anonymous => builder,
            };

            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };

            (status, value)
        }

        async fn join(&self, user_id: Uuid) -> Value {
            self.clock.advance(Duration::minutes(1));
            let (status, body) = self
                .call(
                    Method::POST,
                    &format!("/api/events/{}/waitlist", self.event_id),
                    As::Attendee(user_id),
                    Some(json!({})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body
        }

        async fn offer(&self, body: Value) -> (StatusCode, Value) {
            self.call(
                Method::POST,
                &format!("/api/events/{}/waitlist/offer", self.event_id),
                As::Organizer,
                Some(body),
            )
            .await
        }

        async fn list(&self) -> Vec<Value> {
            let (status, body) = self
                .call(
                    Method::GET,
                    &format!("/api/events/{}/waitlist", self.event_id),
                    As::Organizer,
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body.as_array().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_join_then_offer_moves_queue() {
        let app = test_app();
        let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(app.join(u1).await["position"], 1);
        assert_eq!(app.join(u2).await["position"], 2);

        let (status, offered) = app.offer(json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(offered["user_id"], u1.to_string());
        assert_eq!(offered["status"], "offered");
        assert_eq!(offered["position"], Value::Null);

        let listed = app.list().await;
        assert_eq!(listed[0]["user_id"], u2.to_string());
        assert_eq!(listed[0]["status"], "waiting");
        assert_eq!(listed[0]["position"], 1);
    }

    #[tokio::test]
    async fn test_default_offer_window_from_state() {
        let app = test_app();
        app.join(Uuid::new_v4()).await;

        let (_, offered) = app.offer(json!({})).await;
        let expires_at = chrono::DateTime::parse_from_rfc3339(offered["expires_at"].as_str().unwrap())
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(expires_at, app.clock.now() + Duration::hours(24));
    }

    #[tokio::test]
    async fn test_duplicate_join_conflicts() {
        let app = test_app();
        let user = Uuid::new_v4();
        app.join(user).await;

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/api/events/{}/waitlist", app.event_id),
                As::Attendee(user),
                Some(json!({ "notes": "again" })),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "already_on_waitlist");
    }

    #[tokio::test]
    async fn test_join_requires_identity() {
        let app = test_app();
        let (status, _) = app
            .call(
                Method::POST,
                &format!("/api/events/{}/waitlist", app.event_id),
                As::Anonymous,
                Some(json!({})),
            )
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_organizer_routes_reject_attendees() {
        let app = test_app();
        let (status, _) = app
            .call(
                Method::GET,
                &format!("/api/events/{}/waitlist", app.event_id),
                As::Attendee(Uuid::new_v4()),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_offer_on_empty_waitlist_conflicts() {
        let app = test_app();
        let (status, body) = app.offer(json!({ "expires_in_hours": 12 })).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "waitlist_empty");
    }

    #[tokio::test]
    async fn test_offer_window_validated() {
        let app = test_app();
        app.join(Uuid::new_v4()).await;

        let (status, body) = app.offer(json!({ "expires_in_hours": 0 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_failed");
    }

    #[tokio::test]
    async fn test_leave_returns_success_and_renumbers() {
        let app = test_app();
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        app.join(u1).await;
        let middle = app.join(u2).await;
        app.join(u3).await;

        let (status, body) = app
            .call(
                Method::DELETE,
                &format!("/api/waitlist/{}", middle["id"].as_str().unwrap()),
                As::Attendee(u2),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let positions: Vec<(String, i64)> = app
            .list()
            .await
            .iter()
            .map(|e| (e["user_id"].as_str().unwrap().to_string(), e["position"].as_i64().unwrap()))
            .collect();
        assert_eq!(positions, vec![(u1.to_string(), 1), (u3.to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_leave_someone_elses_entry_forbidden() {
        let app = test_app();
        let entry = app.join(Uuid::new_v4()).await;

        let (status, body) = app
            .call(
                Method::DELETE,
                &format!("/api/waitlist/{}", entry["id"].as_str().unwrap()),
                As::Attendee(Uuid::new_v4()),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "forbidden");
    }

    #[tokio::test]
    async fn test_late_response_is_gone_and_listed_expired() {
        let app = test_app();
        let user = Uuid::new_v4();
        let entry = app.join(user).await;
        app.offer(json!({ "expires_in_hours": 1 })).await;

        app.clock.advance(Duration::hours(2));
        let (status, body) = app
            .call(
                Method::POST,
                &format!("/api/waitlist/{}/respond", entry["id"].as_str().unwrap()),
                As::Attendee(user),
                Some(json!({ "accept": true })),
            )
            .await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["code"], "offer_expired");

        let listed = app.list().await;
        assert_eq!(listed[0]["status"], "expired");
    }

    #[tokio::test]
    async fn test_accept_and_my_entry() {
        let app = test_app();
        let user = Uuid::new_v4();
        let entry = app.join(user).await;

        let (status, mine) = app
            .call(
                Method::GET,
                &format!("/api/events/{}/waitlist/me", app.event_id),
                As::Attendee(user),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine["id"], entry["id"]);

        app.offer(json!({})).await;
        let (status, accepted) = app
            .call(
                Method::POST,
                &format!("/api/waitlist/{}/respond", entry["id"].as_str().unwrap()),
                As::Attendee(user),
                Some(json!({ "accept": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["status"], "accepted");

        let (status, _) = app
            .call(
                Method::GET,
                &format!("/api/events/{}/waitlist/me", app.event_id),
                As::Attendee(user),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_summary_and_sweep() {
        let app = test_app();
        app.join(Uuid::new_v4()).await;
        app.join(Uuid::new_v4()).await;
        app.offer(json!({ "expires_in_hours": 1 })).await;
        app.clock.advance(Duration::hours(3));

        let (status, swept) = app
            .call(
                Method::POST,
                "/api/admin/waitlist/expire-overdue",
                As::Organizer,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(swept["expired_count"], 1);

        let (_, summary) = app
            .call(
                Method::GET,
                &format!("/api/events/{}/waitlist/summary", app.event_id),
                As::Organizer,
                None,
            )
            .await;
        assert_eq!(summary["waiting"], 1);
        assert_eq!(summary["offered"], 0);
        assert_eq!(summary["expired"], 1);
    }
}
