use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hereiam_config::BaasConfig;
use hereiam_core::CustomData;
use hereiam_identity::{
    AuthError, AuthenticatedUser, EmailPasswordCredentials, IdentityProvider, RemoteFunction,
    RemoteFunctions,
};
use hereiam_observability::record_remote_call;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::ejson;

const CLIENT_API: &str = "api/client/v2.0";

#[derive(Debug, Error)]
pub enum BaasSetupError {
    #[error("HEREIAM_BAAS_APP_ID is empty")]
    MissingAppId,
    #[error("invalid BaaS base url: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    user_id: String,
    #[serde(default)]
    device_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct FunctionCallRequest<'a> {
    name: &'a str,
    arguments: [Value; 1],
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Client for the hosted platform's client API: local user/password
/// identities, session refresh and function calls.
#[derive(Clone)]
pub struct BaasClient {
    client: Client,
    base_url: Url,
    app_id: String,
}

impl BaasClient {
    pub fn new(config: &BaasConfig) -> Result<Self, BaasSetupError> {
        if config.app_id.trim().is_empty() {
            return Err(BaasSetupError::MissingAppId);
        }
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&base).map_err(|err| BaasSetupError::InvalidBaseUrl(err.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url,
            app_id: config.app_id.trim().to_string(),
        })
    }

    fn app_url(&self, path: &str) -> Result<Url, AuthError> {
        self.url(&format!("{CLIENT_API}/app/{}/{path}", self.app_id))
    }

    fn url(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path)
            .map_err(|err| AuthError::network(format!("invalid endpoint {path}: {err}")))
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    AuthError::network(err.to_string())
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    body.error
        .unwrap_or_else(|| format!("request failed with {status}"))
}

fn classify_login_failure(status: StatusCode, message: String) -> AuthError {
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::NOT_FOUND => AuthError::CredentialsRejected { message },
        _ => AuthError::network(message),
    }
}

fn classify_register_failure(status: StatusCode, message: String) -> AuthError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT => {
            AuthError::RegistrationRejected { message }
        }
        _ => AuthError::network(message),
    }
}

fn classify_function_failure(
    function: RemoteFunction,
    status: StatusCode,
    message: String,
) -> AuthError {
    match status {
        StatusCode::UNAUTHORIZED => AuthError::CredentialsRejected { message },
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            AuthError::network(message)
        }
        _ => AuthError::RemoteFunction {
            function: function.name().to_string(),
            message,
        },
    }
}

/// Reads the `user_data` claim of an access token. Tokens without the
/// claim carry no custom data.
pub fn decode_custom_data(access_token: &str) -> Result<CustomData, AuthError> {
    let payload = access_token
        .split('.')
        .nth(1)
        .ok_or_else(|| AuthError::malformed("refresh_custom_data", "access token is not a JWT"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| AuthError::malformed("refresh_custom_data", err.to_string()))?;
    let claims: Value = serde_json::from_slice(&bytes)
        .map_err(|err| AuthError::malformed("refresh_custom_data", err.to_string()))?;
    match claims.get("user_data") {
        None | Some(Value::Null) => Ok(CustomData::default()),
        Some(data) => serde_json::from_value(ejson::relax(data.clone()))
            .map_err(|err| AuthError::malformed("refresh_custom_data", err.to_string())),
    }
}

#[async_trait]
impl IdentityProvider for BaasClient {
    async fn log_in(
        &self,
        credentials: &EmailPasswordCredentials,
    ) -> Result<AuthenticatedUser, AuthError> {
        let url = self.app_url("auth/providers/local-userpass/login")?;
        let response = self
            .client
            .post(url)
            .json(&LoginRequest {
                username: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(transport_error);
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                record_remote_call("log_in", false);
                return Err(err);
            }
        };
        let status = response.status();
        if !status.is_success() {
            record_remote_call("log_in", false);
            let message = error_message(response).await;
            return Err(classify_login_failure(status, message));
        }
        let body = response
            .json::<LoginResponse>()
            .await
            .map_err(|err| AuthError::malformed("log_in", err.to_string()))?;
        record_remote_call("log_in", true);
        debug!(user_id = %body.user_id, "identity logged in");

        let mut user = AuthenticatedUser::new(
            body.user_id,
            body.device_id,
            body.access_token,
            body.refresh_token,
        );
        if let Ok(custom_data) = decode_custom_data(user.access_token()) {
            user.custom_data = custom_data;
        }
        Ok(user)
    }

    async fn register_user(&self, credentials: &EmailPasswordCredentials) -> Result<(), AuthError> {
        let url = self.app_url("auth/providers/local-userpass/register")?;
        let response = self
            .client
            .post(url)
            .json(&RegisterRequest {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(transport_error);
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                record_remote_call("register_user", false);
                return Err(err);
            }
        };
        let status = response.status();
        if !status.is_success() {
            record_remote_call("register_user", false);
            let message = error_message(response).await;
            return Err(classify_register_failure(status, message));
        }
        record_remote_call("register_user", true);
        Ok(())
    }

    async fn refresh_custom_data(&self, user: &mut AuthenticatedUser) -> Result<(), AuthError> {
        let url = self.url(&format!("{CLIENT_API}/auth/session"))?;
        let response = self
            .client
            .post(url)
            .bearer_auth(user.refresh_token())
            .send()
            .await
            .map_err(transport_error);
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                record_remote_call("refresh_custom_data", false);
                return Err(err);
            }
        };
        let status = response.status();
        if !status.is_success() {
            record_remote_call("refresh_custom_data", false);
            let message = error_message(response).await;
            return Err(classify_login_failure(status, message));
        }
        let body = response
            .json::<SessionResponse>()
            .await
            .map_err(|err| AuthError::malformed("refresh_custom_data", err.to_string()))?;
        let custom_data = decode_custom_data(&body.access_token)?;
        record_remote_call("refresh_custom_data", true);
        user.set_access_token(body.access_token);
        user.custom_data = custom_data;
        Ok(())
    }
}

#[async_trait]
impl RemoteFunctions for BaasClient {
    async fn call_function(
        &self,
        user: &AuthenticatedUser,
        function: RemoteFunction,
        args: Value,
    ) -> Result<Value, AuthError> {
        let url = self.app_url("functions/call")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(user.access_token())
            .json(&FunctionCallRequest {
                name: function.name(),
                arguments: [args],
            })
            .send()
            .await
            .map_err(transport_error);
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                record_remote_call(function.name(), false);
                return Err(err);
            }
        };
        let status = response.status();
        if !status.is_success() {
            record_remote_call(function.name(), false);
            let message = error_message(response).await;
            return Err(classify_function_failure(function, status, message));
        }
        let body = response
            .json::<Value>()
            .await
            .map_err(|err| AuthError::malformed(function.name(), err.to_string()))?;
        record_remote_call(function.name(), true);
        debug!(function = function.name(), "remote function returned");
        Ok(ejson::relax(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use hereiam_config::BaasMode;
    use hereiam_identity::AuthErrorKind;
    use serde_json::json;
    use std::sync::Mutex;

    const APP_ID: &str = "hereiam-test";

    fn config(app_id: &str) -> BaasConfig {
        BaasConfig {
            mode: BaasMode::Http,
            base_url: "https://services.cloud.mongodb.com/".to_string(),
            app_id: app_id.to_string(),
            request_timeout_ms: 1000,
        }
    }

    fn token_with_claims(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn requires_app_id() {
        assert!(matches!(
            BaasClient::new(&config("  ")),
            Err(BaasSetupError::MissingAppId)
        ));
    }

    #[test]
    fn builds_app_scoped_urls() {
        let client = BaasClient::new(&config("hereiam-abcde")).unwrap();
        let url = client.app_url("functions/call").unwrap();
        assert_eq!(
            url.as_str(),
            "https://services.cloud.mongodb.com/api/client/v2.0/app/hereiam-abcde/functions/call"
        );
    }

    #[test]
    fn decodes_user_data_claim() {
        let token = token_with_claims(&serde_json::json!({
            "sub": "u1",
            "user_data": {"firstName": "Ada", "lastName": "Berg", "age": {"$numberInt": "31"}}
        }));
        let data = decode_custom_data(&token).unwrap();
        assert_eq!(data.first_name.as_deref(), Some("Ada"));
        assert_eq!(data.extra.get("age"), Some(&serde_json::json!(31)));

        let bare = token_with_claims(&serde_json::json!({"sub": "u1"}));
        assert_eq!(decode_custom_data(&bare).unwrap(), CustomData::default());
        assert_eq!(
            decode_custom_data("opaque").unwrap_err().kind(),
            AuthErrorKind::MalformedResponse
        );
    }

    #[test]
    fn status_codes_map_to_distinct_errors() {
        assert_eq!(
            classify_login_failure(StatusCode::UNAUTHORIZED, "bad".into()).kind(),
            AuthErrorKind::CredentialsRejected
        );
        assert_eq!(
            classify_login_failure(StatusCode::INTERNAL_SERVER_ERROR, "down".into()).kind(),
            AuthErrorKind::Network
        );
        assert_eq!(
            classify_register_failure(StatusCode::CONFLICT, "name already in use".into()).kind(),
            AuthErrorKind::RegistrationRejected
        );
        assert_eq!(
            classify_function_failure(
                RemoteFunction::GetCurrentMission,
                StatusCode::BAD_REQUEST,
                "function not found".into()
            )
            .kind(),
            AuthErrorKind::RemoteFunction
        );
    }

    #[derive(Debug, Clone)]
    struct Seen {
        path: String,
        bearer: Option<String>,
        body: Value,
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Seen>>,
    }

    impl Recorder {
        fn last(&self) -> Seen {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    fn access_token(first_name: &str, last_name: &str) -> String {
        token_with_claims(&json!({
            "sub": "u-ada",
            "user_data": {"firstName": first_name, "lastName": last_name}
        }))
    }

    /// Answers like the App Services client API for one seeded identity.
    async fn app_services(
        req: HttpRequest,
        body: web::Bytes,
        recorder: web::Data<Recorder>,
    ) -> HttpResponse {
        let bearer = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);
        let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        recorder.seen.lock().unwrap().push(Seen {
            path: req.path().to_string(),
            bearer: bearer.clone(),
            body: body.clone(),
        });

        let app = format!("/{CLIENT_API}/app/{APP_ID}");
        let path = req.path();
        if path == format!("{app}/auth/providers/local-userpass/login") {
            if body["password"] == "correct horse" {
                HttpResponse::Ok().json(json!({
                    "access_token": access_token("Ada", "Berg"),
                    "refresh_token": "refresh-ada",
                    "user_id": "u-ada",
                    "device_id": "d-1"
                }))
            } else {
                HttpResponse::Unauthorized().json(json!({"error": "invalid username/password"}))
            }
        } else if path == format!("{app}/auth/providers/local-userpass/register") {
            if body["email"] == "ada@example.org" {
                HttpResponse::Conflict().json(json!({"error": "name already in use"}))
            } else {
                HttpResponse::Created().finish()
            }
        } else if path == format!("/{CLIENT_API}/auth/session") {
            match bearer.as_deref() {
                Some("refresh-ada") => HttpResponse::Created()
                    .json(json!({"access_token": access_token("Ada", "Lovelace")})),
                _ => HttpResponse::Unauthorized().json(json!({"error": "invalid session"})),
            }
        } else if path == format!("{app}/functions/call") {
            if bearer.as_deref().is_none_or(|token| !token.contains('.')) {
                return HttpResponse::Unauthorized().json(json!({"error": "invalid session"}));
            }
            match body["name"].as_str() {
                Some("getCurrentMission") => HttpResponse::Ok().json(json!({
                    "_id": {"$oid": "64b7f0c2a1b2c3d4e5f60718"},
                    "identifier": "Spree flood",
                    "estimatedPopulation": {"$numberInt": "1200"}
                })),
                Some("updateCustomData") => HttpResponse::InternalServerError().body("boom"),
                _ => HttpResponse::Ok().content_type("text/plain").body("not json"),
            }
        } else {
            HttpResponse::NotFound().finish()
        }
    }

    async fn stand_in() -> (BaasClient, web::Data<Recorder>) {
        let recorder = web::Data::new(Recorder::default());
        let data = recorder.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(app_services))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let client = BaasClient::new(&BaasConfig {
            mode: BaasMode::Http,
            base_url: format!("http://{addr}"),
            app_id: APP_ID.to_string(),
            request_timeout_ms: 2000,
        })
        .unwrap();
        (client, recorder)
    }

    fn ada(password: &str) -> EmailPasswordCredentials {
        EmailPasswordCredentials::new("ada@example.org", password)
    }

    #[actix_web::test]
    async fn login_refresh_and_calls_carry_the_right_tokens() {
        let (client, recorder) = stand_in().await;

        let mut user = client.log_in(&ada("correct horse")).await.unwrap();
        let seen = recorder.last();
        assert_eq!(
            seen.path,
            format!("/{CLIENT_API}/app/{APP_ID}/auth/providers/local-userpass/login")
        );
        assert_eq!(
            seen.body,
            json!({"username": "ada@example.org", "password": "correct horse"})
        );
        assert!(user.is_logged_in());
        assert_eq!(user.display_name(), "Ada Berg");

        client.refresh_custom_data(&mut user).await.unwrap();
        let seen = recorder.last();
        assert_eq!(seen.path, format!("/{CLIENT_API}/auth/session"));
        assert_eq!(seen.bearer.as_deref(), Some("refresh-ada"));
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.access_token(), access_token("Ada", "Lovelace"));

        let reply = client
            .call_function(&user, RemoteFunction::GetCurrentMission, json!({}))
            .await
            .unwrap();
        let seen = recorder.last();
        assert_eq!(seen.bearer.as_deref(), Some(user.access_token()));
        assert_eq!(seen.body, json!({"name": "getCurrentMission", "arguments": [{}]}));
        assert_eq!(reply["estimatedPopulation"], json!(1200));
        assert_eq!(reply["identifier"], json!("Spree flood"));
    }

    #[actix_web::test]
    async fn registration_sends_email_and_reports_conflicts() {
        let (client, recorder) = stand_in().await;
        let grace = EmailPasswordCredentials::new("grace@example.org", "correct horse");
        client.register_user(&grace).await.unwrap();
        assert_eq!(
            recorder.last().body,
            json!({"email": "grace@example.org", "password": "correct horse"})
        );

        let err = client.register_user(&ada("correct horse")).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::RegistrationRejected {
                message: "name already in use".to_string()
            }
        );
    }

    #[actix_web::test]
    async fn failed_requests_map_to_error_kinds() {
        let (client, _recorder) = stand_in().await;

        let err = client.log_in(&ada("wrong horse")).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::CredentialsRejected {
                message: "invalid username/password".to_string()
            }
        );

        let mut stale = AuthenticatedUser::new("u-ada", None, "opaque", "refresh-old");
        let err = client.refresh_custom_data(&mut stale).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::CredentialsRejected);

        let user = client.log_in(&ada("correct horse")).await.unwrap();
        let err = client
            .call_function(&user, RemoteFunction::UpdateCustomData, json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::RemoteFunction {
                function: "updateCustomData".to_string(),
                message: "request failed with 500 Internal Server Error".to_string()
            }
        );

        let err = client
            .call_function(&user, RemoteFunction::CreateMission, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::MalformedResponse);

        let err = client
            .call_function(&stale, RemoteFunction::GetCurrentMission, json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::CredentialsRejected);
    }

    #[actix_web::test]
    async fn unreachable_backend_is_a_network_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = BaasClient::new(&BaasConfig {
            mode: BaasMode::Http,
            base_url: format!("http://{addr}"),
            app_id: APP_ID.to_string(),
            request_timeout_ms: 2000,
        })
        .unwrap();
        let err = client.log_in(&ada("correct horse")).await.unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::Network);
    }
}
