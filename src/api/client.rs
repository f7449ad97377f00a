use std::{sync::Arc, time::Duration};

use log::{debug, warn};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{auth::AuthTokens, models::TokenPair};

use super::error::{ApiError, ApiResult};

const REFRESH_PATH: &str = "users/token/refresh/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Bearer,
    Anonymous,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// HTTP wrapper for the workout backend. Attaches the bearer token, and on a
/// 401 performs one refresh-token exchange followed by a single retry.
/// Concurrent 401s share one refresh: whoever holds `refresh_lock` refreshes,
/// the rest pick up the new access token when the lock is released.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<String>,
    tokens: AuthTokens,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, tokens: AuthTokens) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Network(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url.trim_end_matches('/').to_string()),
            tokens,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn tokens(&self) -> &AuthTokens {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let value = self.call(Method::GET, path, query, None, Auth::Bearer).await?;
        decode(value)
    }

    pub(crate) async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self.call(method, path, &[], Some(body), Auth::Bearer).await?;
        decode(value)
    }

    pub(crate) async fn send_anonymous<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self
            .call(Method::POST, path, &[], Some(body), Auth::Anonymous)
            .await?;
        decode(value)
    }

    /// Body-less action endpoint (`PATCH /sets/{id}/skip_set/` and friends).
    pub(crate) async fn action(&self, method: Method, path: &str) -> ApiResult<Value> {
        self.call(method, path, &[], None, Auth::Bearer).await
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<()> {
        self.call(Method::DELETE, path, &[], None, Auth::Bearer)
            .await
            .map(|_| ())
    }

    /// Anonymous GET that hands back the status and body instead of turning
    /// client errors into `ApiError::Http`.
    pub(crate) async fn probe(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<(u16, Value)> {
        let response = self.dispatch(&Method::GET, path, query, None, None).await?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(ApiError::from)?;
        let value = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok((status, value))
    }

    /// Sends a request and returns the decoded JSON body (`Null` when empty).
    pub(crate) async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        auth: Auth,
    ) -> ApiResult<Value> {
        let token = match auth {
            Auth::Bearer => self.tokens.access_token(),
            Auth::Anonymous => None,
        };

        let response = self
            .dispatch(&method, path, query, body.as_ref(), token.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED || auth == Auth::Anonymous {
            return read_body(path, response).await;
        }

        debug!("{method} {path} returned 401, refreshing access token");
        let fresh = self.refresh_access(token.as_deref()).await?;
        let retry = self
            .dispatch(&method, path, query, body.as_ref(), Some(&fresh))
            .await?;
        read_body(path, retry).await
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let mut request = self.http.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(ApiError::from)
    }

    /// Exchanges the refresh token for a new access token. `stale` is the
    /// token that was rejected; if another caller already replaced it while
    /// we waited on the lock, the new one is returned without a second
    /// exchange.
    pub async fn refresh_access(&self, stale: Option<&str>) -> ApiResult<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.tokens.access_token() {
            if stale != Some(current.as_str()) {
                return Ok(current);
            }
        }

        let Some(refresh) = self.tokens.refresh_token() else {
            self.force_logout().await;
            return Err(ApiError::SessionExpired);
        };

        let response = self
            .dispatch(
                &Method::POST,
                REFRESH_PATH,
                &[],
                Some(&serde_json::json!({ "refresh": refresh })),
                None,
            )
            .await?;

        let value = match read_body(REFRESH_PATH, response).await {
            Ok(value) => value,
            Err(err @ ApiError::Network(_)) => return Err(err),
            Err(err) => {
                warn!("Token refresh rejected: {err}");
                self.force_logout().await;
                return Err(ApiError::SessionExpired);
            }
        };

        let refreshed: RefreshResponse = decode(value)?;
        let pair = TokenPair {
            access: refreshed.access.clone(),
            refresh: refreshed.refresh.unwrap_or(refresh),
        };
        self.tokens.store(pair).await?;
        Ok(refreshed.access)
    }

    /// Local-only teardown after the refresh token is gone or rejected.
    pub async fn force_logout(&self) {
        if let Err(err) = self.tokens.clear().await {
            warn!("Failed to clear local session: {err:#}");
        }
    }
}

async fn read_body(path: &str, response: reqwest::Response) -> ApiResult<Value> {
    let status = response.status();
    let text = response.text().await.map_err(ApiError::from)?;

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(path.trim_matches('/').to_string()));
    }
    if !status.is_success() {
        return Err(ApiError::from_response(status.as_u16(), &text));
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(ApiError::from)
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(ApiError::from)
}

/// Accepts both `{"message": ..., "<key>": {...}}` and a bare object.
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(value: Value, key: &str) -> ApiResult<T> {
    let inner = match value {
        Value::Object(mut map) => match map.remove(key) {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                map.insert(key.to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    };
    decode(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutSet;
    use serde_json::json;

    #[test]
    fn envelope_and_bare_bodies_decode_alike() {
        let set = json!({
            "id": 42,
            "workout": 7,
            "exercise_name": "Bench",
            "rest": 90,
            "complete": true
        });

        let wrapped: WorkoutSet =
            unwrap_envelope(json!({ "message": "Set completed", "set": set.clone() }), "set")
                .unwrap();
        let bare: WorkoutSet = unwrap_envelope(set, "set").unwrap();

        assert_eq!(wrapped, bare);
        assert_eq!(bare.rest, Some(90));
    }

    #[test]
    fn scalar_field_with_envelope_name_is_left_in_place() {
        #[derive(Deserialize)]
        struct Weighted {
            weight: String,
        }

        let decoded: Weighted = unwrap_envelope(json!({ "weight": "80.00" }), "weight").unwrap();
        assert_eq!(decoded.weight, "80.00");
    }
}
