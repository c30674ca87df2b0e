/// Firebase Authentication provider (Identity Toolkit REST API)
///
/// Sign-in exchanges the OAuth id token produced by the interactive popup for a Firebase
/// session via `accounts:signInWithIdp`. Refresh goes through the Secure Token service.
use chrono::{Duration, Utc};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{IdpCredential, SessionTokens, UserIdentity},
    services::identity::IdentityProvider,
};

const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpRequest {
    post_body: String,
    request_uri: String,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorBody {
    error: FirebaseError,
}

#[derive(Debug, Deserialize)]
struct FirebaseError {
    message: String,
}

fn expires_at(expires_in: Option<&str>) -> chrono::DateTime<Utc> {
    let secs = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Utc::now() + Duration::seconds(secs)
}

#[derive(Clone)]
pub struct FirebaseIdentityProvider {
    http_client: HttpClient,
    api_key: String,
    identity_api_url: String,
    token_api_url: String,
}

impl FirebaseIdentityProvider {
    pub fn new(api_key: String, identity_api_url: String, token_api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            identity_api_url: identity_api_url.trim_end_matches('/').to_string(),
            token_api_url: token_api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Extracts Firebase's `{"error": {"message": ...}}` body, falling back to the raw text
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<FirebaseErrorBody>(&body) {
            Ok(parsed) => format!("{} ({})", parsed.error.message, status),
            Err(_) => format!("status {}: {}", status, body),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn sign_in(&self, credential: &IdpCredential) -> AppResult<(UserIdentity, SessionTokens)> {
        let url = format!("{}/accounts:signInWithIdp", self.identity_api_url);
        let request = SignInWithIdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                credential.id_token, credential.provider_id
            ),
            request_uri: "http://localhost".to_string(),
            return_secure_token: true,
            return_idp_credential: true,
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::SignIn(Self::error_message(response).await));
        }

        let body: SignInWithIdpResponse = response.json().await?;
        let identity = UserIdentity {
            uid: body.local_id,
            email: body.email,
            display_name: body.display_name,
        };
        let tokens = SessionTokens {
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expires_at(body.expires_in.as_deref()),
        };

        tracing::info!(
            uid = %identity.uid,
            provider = %credential.provider_id,
            "Signed in with identity provider"
        );

        Ok((identity, tokens))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<SessionTokens> {
        let url = format!("{}/token", self.token_api_url);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Token refresh failed: {}",
                Self::error_message(response).await
            )));
        }

        let body: RefreshResponse = response.json().await?;
        Ok(SessionTokens {
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expires_at(body.expires_in.as_deref()),
        })
    }

    async fn sign_out(&self, _tokens: &SessionTokens) -> AppResult<()> {
        // Firebase client sessions end locally; there is no revoke endpoint for end users
        Ok(())
    }

    fn name(&self) -> &'static str {
        "firebase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::post, Form, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_fake_firebase() -> String {
        let app = Router::new()
            .route(
                "/v1/accounts:signInWithIdp",
                post(
                    |Query(params): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                        if params.get("key").map(String::as_str) != Some("web_key") {
                            return Err((
                                StatusCode::BAD_REQUEST,
                                Json(json!({"error": {"message": "API_KEY_INVALID"}})),
                            ));
                        }
                        if body["postBody"] == "id_token=cancelled&providerId=google.com" {
                            return Err((
                                StatusCode::BAD_REQUEST,
                                Json(json!({"error": {"message": "INVALID_IDP_RESPONSE"}})),
                            ));
                        }
                        Ok(Json(json!({
                            "localId": "uid-123",
                            "email": "ada@example.com",
                            "displayName": "Ada",
                            "idToken": "firebase-id-token",
                            "refreshToken": "firebase-refresh",
                            "expiresIn": "3600"
                        })))
                    },
                ),
            )
            .route(
                "/v1/token",
                post(|Form(form): Form<HashMap<String, String>>| async move {
                    Json(json!({
                        "id_token": format!("new-{}", form["refresh_token"]),
                        "refresh_token": "rotated",
                        "expires_in": "120",
                        "user_id": "uid-123"
                    }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/v1", addr)
    }

    fn provider(base: &str, key: &str) -> FirebaseIdentityProvider {
        FirebaseIdentityProvider::new(key.to_string(), base.to_string(), base.to_string())
    }

    fn credential(id_token: &str) -> IdpCredential {
        IdpCredential {
            provider_id: "google.com".to_string(),
            id_token: id_token.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_in_maps_identity_and_tokens() {
        let base = spawn_fake_firebase().await;
        let firebase = provider(&base, "web_key");

        let (identity, tokens) = firebase.sign_in(&credential("google-token")).await.unwrap();
        assert_eq!(identity.uid, "uid-123");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(identity.display_name.as_deref(), Some("Ada"));
        assert_eq!(tokens.id_token, "firebase-id-token");
        assert!(!tokens.is_expired());
    }

    #[tokio::test]
    async fn test_rejected_credential_is_sign_in_error() {
        let base = spawn_fake_firebase().await;
        let firebase = provider(&base, "web_key");

        let result = firebase.sign_in(&credential("cancelled")).await;
        match result {
            Err(AppError::SignIn(message)) => assert!(message.contains("INVALID_IDP_RESPONSE")),
            other => panic!("expected sign-in error, got {:?}", other.map(|(i, _)| i)),
        }
    }

    #[tokio::test]
    async fn test_bad_api_key_is_sign_in_error() {
        let base = spawn_fake_firebase().await;
        let firebase = provider(&base, "wrong");
        assert!(matches!(
            firebase.sign_in(&credential("google-token")).await,
            Err(AppError::SignIn(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let base = spawn_fake_firebase().await;
        let firebase = provider(&base, "web_key");

        let tokens = firebase.refresh("old-refresh").await.unwrap();
        assert_eq!(tokens.id_token, "new-old-refresh");
        assert_eq!(tokens.refresh_token, "rotated");
    }

    #[test]
    fn test_expires_at_defaults_when_unparseable() {
        let at = expires_at(Some("soon"));
        let delta = at - Utc::now();
        assert!(delta > Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS - 5));
    }
}
