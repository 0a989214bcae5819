//! Gateway for the booking service's REST API.
//!
//! Every network call goes through `ApiClient::request`, which attaches the
//! JSON content type and the current bearer token, turns transport failures
//! into `ApiError::Connectivity`, tears the session down on 401/403, and
//! normalizes every other failure into `ApiError::Application`.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{header, Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use super::error::is_auth_failure;
use super::ApiError;
use crate::auth::{Session, SessionStore};
use crate::config::ApiConfig;
use crate::models::{AllBookingsResponse, Booking, Role, Slot, User};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds. This is the only timeout; there is no
/// retry on top of it.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Date format for the `from`/`to` query parameters.
const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    user: User,
    role: Role,
}

/// API client for the booking service.
/// Clone is cheap - reqwest::Client and the session store are both shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: Arc<SessionStore>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    /// Create a new ApiClient bound to another session store, sharing the
    /// connection pool.
    pub fn with_session(&self, session: Arc<SessionStore>) -> Self {
        Self {
            client: self.client.clone(),
            config: self.config.clone(),
            session,
        }
    }

    /// Issue one call and return the parsed JSON body verbatim.
    ///
    /// The token is read from the session store when the call starts. A
    /// 401/403 clears the session before `ApiError::Unauthorized` is
    /// returned, whatever the endpoint or method.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        self.send(method, url, body).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&self.config.url(path))
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", path, e)))
    }

    /// Endpoint URL with one caller-supplied segment appended, escaped so
    /// it cannot change the path.
    fn endpoint_with_segment(&self, path: &str, segment: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("{} cannot take a path segment", path)))?
            .push(segment);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value, ApiError> {
        let path = url.path().to_owned();
        debug!(%method, %path, "API request");

        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!(%method, %path, error = %e, "API request failed to reach server");
            ApiError::connectivity(e)
        })?;

        let status = response.status();
        if is_auth_failure(status) {
            warn!(%method, %path, status = status.as_u16(), "Authorization rejected, clearing session");
            self.session.logout();
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await.map_err(|e| {
            error!(%method, %path, error = %e, "Failed to read response body");
            ApiError::connectivity(e)
        })?;

        if !status.is_success() {
            let err = ApiError::from_status(status, &text);
            error!(%method, %path, status = status.as_u16(), error = %err, "API request rejected");
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} {}: {}", method, path, e)))
    }

    /// `request`, then deserialize the body into the caller's type.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let value = self.request(method.clone(), path, body).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("{} {}: {}", method, path, e)))
    }

    // ===== Account =====

    /// Log in and activate the session with the returned token and profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let body = json!({ "email": email, "password": password });
        let response: LoginResponse = self.call(Method::POST, "/login", Some(&body)).await?;
        Ok(self.session.login(response.token, response.user, response.role))
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Value, ApiError> {
        let body = json!({ "name": name, "email": email, "password": password });
        self.request(Method::POST, "/register", Some(&body)).await
    }

    // ===== Patient =====

    pub async fn fetch_slots(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Slot>, ApiError> {
        let path = format!(
            "/slots?from={}&to={}",
            from.format(QUERY_DATE_FORMAT),
            to.format(QUERY_DATE_FORMAT)
        );
        self.call(Method::GET, &path, None).await
    }

    pub async fn book(&self, slot_id: &str) -> Result<Value, ApiError> {
        let body = json!({ "slotId": slot_id });
        self.request(Method::POST, "/book", Some(&body)).await
    }

    pub async fn fetch_my_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        self.call(Method::GET, "/my-bookings", None).await
    }

    pub async fn cancel_booking(&self, booking_id: &str) -> Result<Value, ApiError> {
        let url = self.endpoint_with_segment("/bookings", booking_id)?;
        self.send(Method::DELETE, url, None).await
    }

    // ===== Admin =====

    pub async fn fetch_all_bookings(&self, page: u32, limit: u32) -> Result<AllBookingsResponse, ApiError> {
        let path = format!("/all-bookings?page={}&limit={}", page, limit);
        self.call(Method::GET, &path, None).await
    }
}
