use axum::Router;

use crate::features::waitlist;
use crate::middleware::auth::ApiKeys;
use crate::state::AppState;

pub fn api(api_keys: ApiKeys) -> Router<AppState> {
    Router::new().nest("/api", waitlist::routes::routes(api_keys))
}
