use crate::config::BackendConfig;
use crate::models::UserInfo;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("backend request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("backend rejected the session")]
    Unauthorized,
    #[error("backend returned {status} for {path}")]
    Status { status: StatusCode, path: String },
    #[error("unexpected backend payload from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub expires_at: String,
    pub user: UserInfo,
}

/// Shared holder for the bearer token obtained at login.
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<Mutex<Option<Session>>>,
}

impl CredentialStore {
    pub async fn set(&self, session: Session) {
        *self.inner.lock().await = Some(session);
    }

    pub async fn clear(&self) {
        *self.inner.lock().await = None;
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.lock().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn current_user(&self) -> Option<UserInfo> {
        self.inner.lock().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.is_some()
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    retries: u32,
    credentials: CredentialStore,
}

impl ApiClient {
    pub fn new(config: &BackendConfig, credentials: CredentialStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Config(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries,
            credentials,
        })
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path, |req| req).await?;
        decode(path, response).await
    }

    pub async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + Sync + ?Sized,
    {
        let response = self.send(Method::GET, path, |req| req.query(query)).await?;
        decode(path, response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, |req| req.json(body)).await?;
        decode(path, response).await
    }

    pub async fn put_json<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.send(Method::PUT, path, |req| req.json(body)).await?;
        Ok(())
    }

    async fn send<F>(&self, method: Method, path: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;
        loop {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(token) = self.credentials.token().await {
                request = request.bearer_auth(token);
            }

            match build(request).send().await {
                Ok(response) => return self.check_status(path, response).await,
                Err(err) if attempt < self.retries && retryable(&method, &err) => {
                    attempt += 1;
                    warn!("retrying {method} {path} after transport error: {err}");
                }
                Err(err) => return Err(ApiError::Transport(err)),
            }
        }
    }

    async fn check_status(&self, path: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("backend returned 401 for {path}; clearing credentials");
            self.credentials.clear().await;
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                path: path.to_string(),
            });
        }
        debug!("{path} -> {status}");
        Ok(response)
    }
}

/// Connect failures never reached the backend, so any method may be resent.
/// A timed-out POST may already have been applied and is not repeated.
fn retryable(method: &Method, err: &reqwest::Error) -> bool {
    err.is_connect() || (err.is_timeout() && *method != Method::POST)
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}
