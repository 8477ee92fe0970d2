use crate::api::{ApiClient, ApiError, Session};
use crate::models::UserInfo;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    #[serde(rename = "senha")]
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "expiresAt")]
    expires_at: String,
    #[serde(rename = "usuario")]
    user: UserInfo,
}

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Logs in against the backend and keeps the session when a token comes back.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserInfo, ApiError> {
        let response: LoginResponse = self
            .api
            .post_json("/Auth/login", &LoginRequest { email, password })
            .await?;

        match response.token {
            Some(token) if !token.is_empty() => {
                info!("logged in as user {}", response.user.id);
                self.api
                    .credentials()
                    .set(Session {
                        token,
                        expires_at: response.expires_at,
                        user: response.user.clone(),
                    })
                    .await;
                Ok(response.user)
            }
            _ => {
                warn!("login for {email} returned no token");
                Err(ApiError::Unauthorized)
            }
        }
    }

    pub async fn me(&self) -> Result<UserInfo, ApiError> {
        self.api.get_json("/Auth/me").await
    }

    pub async fn logout(&self) {
        self.api.credentials().clear().await;
    }

    pub async fn current_user(&self) -> Option<UserInfo> {
        self.api.credentials().current_user().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.api.credentials().is_authenticated().await
    }
}
