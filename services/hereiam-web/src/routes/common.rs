use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::Serialize;

use crate::state::{SessionKey, SESSION_COOKIE};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(mut builder: HttpResponseBuilder, message: impl Into<String>) -> HttpResponse {
    builder.json(ErrorResponse {
        error: message.into(),
    })
}

pub fn bad_request(message: impl Into<String>) -> HttpResponse {
    error(HttpResponse::BadRequest(), message)
}

pub fn unauthorized(message: impl Into<String>) -> HttpResponse {
    error(HttpResponse::Unauthorized(), message)
}

pub fn not_found(message: impl Into<String>) -> HttpResponse {
    error(HttpResponse::NotFound(), message)
}

pub fn conflict(message: impl Into<String>) -> HttpResponse {
    error(HttpResponse::Conflict(), message)
}

pub fn unprocessable(message: impl Into<String>) -> HttpResponse {
    error(HttpResponse::UnprocessableEntity(), message)
}

pub fn bad_gateway(message: impl Into<String>) -> HttpResponse {
    error(HttpResponse::BadGateway(), message)
}

pub fn internal_error(message: impl Into<String>) -> HttpResponse {
    error(HttpResponse::InternalServerError(), message)
}

/// Attaches the session cookie when the session was created by this request.
pub fn with_session(mut response: HttpResponse, key: SessionKey) -> HttpResponse {
    if key.fresh {
        let cookie = Cookie::build(SESSION_COOKIE, key.id.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        if let Err(err) = response.add_cookie(&cookie) {
            tracing::warn!(error = %err, "failed to set session cookie");
        }
    }
    response
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Script calls ask for JSON; plain form posts get redirected back instead.
pub fn wants_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}
