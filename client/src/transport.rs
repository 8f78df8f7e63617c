//! HTTP transport to the local REST API.
//!
//! Every request passes through [`AuthContext::authorize`] immediately before
//! it is sent, so a token set after the transport was built is still used.
//! Failures are returned as-is: no retries, no rewriting of error bodies.

use reqwest::multipart::Form;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::auth::AuthContext;
use crate::error::{ClientError, ClientResult};

#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthContext,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration, auth: AuthContext) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Resolve an endpoint path (`/species`, `species/3`) under the base URL.
    fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn send(&self, req: RequestBuilder) -> ClientResult<(StatusCode, String)> {
        let response = self.auth.authorize(req).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let (status, body) = self.send(req).await?;
        if !status.is_success() {
            return Err(ClientError::Api { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        self.send_json(self.http.get(url)).await
    }

    /// Like [`get_json`](Self::get_json) but maps `404 Not Found` to `None`.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> ClientResult<Option<T>> {
        let url = self.url(path)?;
        let (status, body) = self.send(self.http.get(url)).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Api { status, body });
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        self.send_json(self.http.post(url).json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path)?;
        self.send_json(self.http.post(url)).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> ClientResult<T> {
        let url = self.url(path)?;
        self.send_json(self.http.post(url).multipart(form)).await
    }

    /// WebSocket URL for a channel path served by the same host.
    pub fn ws_url(&self, path: &str) -> ClientResult<Url> {
        derive_ws_url(&self.base_url, path)
    }
}

/// Derive a socket URL from the REST base URL: `http` becomes `ws`, `https`
/// becomes `wss`, a trailing `/api` segment is dropped and `path` appended.
pub fn derive_ws_url(base: &Url, path: &str) -> ClientResult<Url> {
    let mut url = base.clone();
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ClientError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::UnsupportedScheme(base.scheme().to_string()))?;

    let trimmed = base.path().trim_end_matches('/');
    let prefix = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

pub const UPDATES_PATH: &str = "/ws/updates";

pub fn chat_path(user_id: &str) -> String {
    format!("/ws/chat/{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn ws_url_swaps_scheme_and_drops_api_suffix() {
        let url = derive_ws_url(&base("http://localhost:8000/api/"), UPDATES_PATH).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/updates");

        let url = derive_ws_url(&base("https://ocean.example.org/api"), &chat_path("u-7")).unwrap();
        assert_eq!(url.as_str(), "wss://ocean.example.org/ws/chat/u-7");
    }

    #[test]
    fn ws_url_keeps_other_prefixes() {
        let url = derive_ws_url(&base("http://host/matsya/"), UPDATES_PATH).unwrap();
        assert_eq!(url.as_str(), "ws://host/matsya/ws/updates");
    }

    #[test]
    fn ws_url_rejects_unknown_schemes() {
        assert!(derive_ws_url(&base("ftp://host/api"), UPDATES_PATH).is_err());
    }

    #[test]
    fn endpoint_paths_resolve_under_base() {
        let transport = HttpTransport::new(
            "http://localhost:8000/api",
            Duration::from_secs(1),
            AuthContext::new(),
        )
        .unwrap();
        assert_eq!(
            transport.url("/species").unwrap().as_str(),
            "http://localhost:8000/api/species"
        );
        assert_eq!(
            transport.url("species/12").unwrap().as_str(),
            "http://localhost:8000/api/species/12"
        );
    }
}
