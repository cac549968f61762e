//! HTTP client for the storefront JSON API.
//!
//! Logs in once with email and password and sends the returned token as a
//! bearer token on every call. The token lives only in memory.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use gallery_core::catalog::User;

use crate::error::AdminError;
use crate::resource::Resource;

/// The user the client is logged in as.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Operations the dashboard needs from the API.
pub trait AdminApi: Send + Sync {
    /// Fetch every entity of `R`.
    fn list<R: Resource>(&self) -> impl Future<Output = Result<Vec<R>, AdminError>> + Send;

    /// Create an entity.
    fn create<R: Resource>(
        &self,
        input: &R::Create,
    ) -> impl Future<Output = Result<R, AdminError>> + Send;

    /// Apply a partial update.
    fn update<R: Resource>(
        &self,
        id: R::Id,
        input: &R::Update,
    ) -> impl Future<Output = Result<R, AdminError>> + Send;

    /// Delete an entity.
    fn delete<R: Resource>(&self, id: R::Id) -> impl Future<Output = Result<(), AdminError>> + Send;
}

/// Storefront API client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API at `base_url` (e.g. `http://localhost:3000`).
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Http` if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self, AdminError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                token: RwLock::new(None),
            }),
        })
    }

    /// Log in and keep the token for later calls.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Api` with status 400 on bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, AdminError> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            email: &'a str,
            password: &'a str,
        }

        let response = self
            .inner
            .client
            .post(self.url("/api/auth/login")?)
            .json(&LoginRequest {
                email,
                password: password.expose_secret(),
            })
            .send()
            .await?;
        let login: LoginResponse = parse(response).await?;

        *self.inner.token.write().await = Some(SecretString::from(login.token.clone()));
        tracing::info!(user_id = %login.user.id, role = %login.user.role, "logged in");
        Ok(login)
    }

    /// Whether `login` has succeeded.
    pub async fn is_logged_in(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    fn url(&self, path: &str) -> Result<Url, AdminError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn authorized(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, AdminError> {
        let token = self.inner.token.read().await;
        let token = token.as_ref().ok_or(AdminError::NotLoggedIn)?;
        Ok(self
            .inner
            .client
            .request(method, self.url(path)?)
            .bearer_auth(token.expose_secret()))
    }
}

impl AdminApi for ApiClient {
    #[instrument(skip(self), fields(entity = R::NAME))]
    async fn list<R: Resource>(&self) -> Result<Vec<R>, AdminError> {
        // Orders need a token; catalog listings are public but accept one.
        let response = self
            .authorized(reqwest::Method::GET, R::PATH)
            .await?
            .send()
            .await?;
        parse(response).await
    }

    #[instrument(skip(self, input), fields(entity = R::NAME))]
    async fn create<R: Resource>(&self, input: &R::Create) -> Result<R, AdminError> {
        let response = self
            .authorized(reqwest::Method::POST, R::PATH)
            .await?
            .json(input)
            .send()
            .await?;
        parse(response).await
    }

    #[instrument(skip(self, input), fields(entity = R::NAME, id = %id))]
    async fn update<R: Resource>(&self, id: R::Id, input: &R::Update) -> Result<R, AdminError> {
        let response = self
            .authorized(reqwest::Method::PUT, &format!("{}/{id}", R::PATH))
            .await?
            .json(input)
            .send()
            .await?;
        parse(response).await
    }

    #[instrument(skip(self), fields(entity = R::NAME, id = %id))]
    async fn delete<R: Resource>(&self, id: R::Id) -> Result<(), AdminError> {
        if !R::DELETABLE {
            return Err(AdminError::Unsupported {
                entity: R::NAME,
                operation: "deleted",
            });
        }
        let response = self
            .authorized(reqwest::Method::DELETE, &format!("{}/{id}", R::PATH))
            .await?
            .send()
            .await?;
        check(response).await.map(|_| ())
    }
}

/// Turn an error status into `AdminError::Api`, reading the `{"error"}` body.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, AdminError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    Err(AdminError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AdminError> {
    Ok(check(response).await?.json::<T>().await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_protected_call_requires_login() {
        let client = ApiClient::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
        assert!(!client.is_logged_in().await);

        let err = client
            .list::<gallery_core::catalog::Order>()
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_products_cannot_be_deleted() {
        let client = ApiClient::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
        let err = client
            .delete::<gallery_core::catalog::Product>(gallery_core::ProductId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Unsupported { .. }));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = ApiClient::new(Url::parse("http://localhost:3000").unwrap()).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("localhost:3000"));
        assert!(!debug.contains("token"));
    }
}
