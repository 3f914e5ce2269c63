use actix_web::HttpResponse;
use serde_json::json;

use crate::middleware::{Authenticated, MaybeUser};

/// `GET /api/v1/me`: the caller of a valid bearer token
pub async fn me(Authenticated(user): Authenticated) -> HttpResponse {
    HttpResponse::Ok().json(user)
}

/// `GET /api/v1/whoami`: the caller of the access token cookie, if any
pub async fn whoami(MaybeUser(user): MaybeUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "user": user }))
}
