use actix_web::http::{header as actix_header, StatusCode};
use actix_web::{get, web, HttpResponse};
use hereiam_observability::record_tile_request;
use reqwest::header as reqwest_header;

use crate::routes::common::{bad_request, not_found};
use crate::state::AppState;

/// Parses the leading digits of a y segment such as `1234.png`.
fn parse_tile_y(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[get("/ui/tiles/{provider}/{z}/{x}/{y}")]
pub async fn tile(
    state: web::Data<AppState>,
    path: web::Path<(String, u8, u32, String)>,
) -> HttpResponse {
    let (provider_id, z, x, y_raw) = path.into_inner();
    let Some(provider) = state.tile_providers.get(&provider_id) else {
        return not_found("tile provider not found");
    };
    if !provider.accepts_zoom(z) {
        record_tile_request(&provider.id, 400);
        return bad_request("zoom out of range");
    }
    let Some(y) = parse_tile_y(&y_raw) else {
        return bad_request("invalid y");
    };

    let url = provider.upstream_url(z, x, y);
    let response = state
        .tile_client
        .get(&url)
        .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
        .send()
        .await;
    let response = match response {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, provider = %provider.id, "tile request failed");
            record_tile_request(&provider.id, 502);
            return HttpResponse::BadGateway().finish();
        }
    };

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), provider = %provider.id, "tile upstream error");
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        record_tile_request(&provider.id, status.as_u16());
        return HttpResponse::build(status).finish();
    }
    let content_type = response
        .headers()
        .get(reqwest_header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, provider = %provider.id, "tile body read failed");
            record_tile_request(&provider.id, 502);
            return HttpResponse::BadGateway().finish();
        }
    };
    record_tile_request(&provider.id, 200);
    let mut builder = HttpResponse::Ok();
    if let Some(content_type) = content_type.as_deref() {
        builder.insert_header((actix_header::CONTENT_TYPE, content_type));
    }
    builder
        .insert_header(("Cross-Origin-Resource-Policy", "cross-origin"))
        .insert_header(("Cache-Control", "public, max-age=3600"))
        .body(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_segment_accepts_extensions() {
        assert_eq!(parse_tile_y("1234.png"), Some(1234));
        assert_eq!(parse_tile_y("77"), Some(77));
        assert_eq!(parse_tile_y("png"), None);
    }
}
