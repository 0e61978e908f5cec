//! HTTP adapter for the VPS API.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::error::{decode_error_response, ApiError};
use crate::cache::{CacheKey, CacheLayer, CacheResult, CacheWrite};

/// Connection settings, resolved by the caller from configuration.
#[derive(Debug, Clone, Default)]
pub struct ApiSettings {
  pub base_url: Option<String>,
  pub token: Option<String>,
}

/// Success envelope: every payload arrives as `{"data": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
  data: T,
}

/// API client wrapper.
///
/// Each call is a single authenticated request. Successful results are
/// written through to the cache, but the cache is never read here: callers
/// that want read-through use [`CacheLayer::call`] around a client method.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  settings: ApiSettings,
  cache: CacheLayer,
}

impl ApiClient {
  pub fn new(settings: ApiSettings, cache: CacheLayer) -> Self {
    Self {
      http: reqwest::Client::new(),
      settings,
      cache,
    }
  }

  pub fn cache(&self) -> &CacheLayer {
    &self.cache
  }

  pub async fn get<T>(&self, path: &str, key: &CacheKey) -> Result<T, ApiError>
  where
    T: Serialize + DeserializeOwned,
  {
    self.fetch(Method::GET, path, None::<&()>, key).await
  }

  pub async fn post<T, B>(&self, path: &str, body: &B, key: &CacheKey) -> Result<T, ApiError>
  where
    T: Serialize + DeserializeOwned,
    B: Serialize + ?Sized,
  {
    self.fetch(Method::POST, path, Some(body), key).await
  }

  /// Perform a request and return the unwrapped payload.
  pub async fn fetch<T, B>(
    &self,
    method: Method,
    path: &str,
    body: Option<&B>,
    key: &CacheKey,
  ) -> Result<T, ApiError>
  where
    T: Serialize + DeserializeOwned,
    B: Serialize + ?Sized,
  {
    Ok(self.send(method, path, body, key).await?.data)
  }

  /// Perform a request, reporting what happened to the write-through.
  ///
  /// `200 OK` and `201 Created` are both success; some write endpoints
  /// answer with either. The cache write happens when the cache is disabled
  /// or the key is not the sentinel, and never for the sentinel itself.
  pub async fn send<T, B>(
    &self,
    method: Method,
    path: &str,
    body: Option<&B>,
    key: &CacheKey,
  ) -> Result<CacheResult<T>, ApiError>
  where
    T: Serialize + DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let action = format!("{} {}", method, path);

    let config_error = |message: String| ApiError::Config {
      action: action.clone(),
      message,
    };

    let token = non_empty(&self.settings.token)
      .ok_or_else(|| config_error("auth token is not set in the configuration".to_string()))?;
    let base_url = non_empty(&self.settings.base_url)
      .ok_or_else(|| config_error("base_url is not set in the configuration".to_string()))?;

    let payload = body
      .map(serde_json::to_vec)
      .transpose()
      .map_err(|source| ApiError::Encode {
        action: action.clone(),
        source,
      })?;

    let url = Url::parse(&format!("{}{}", base_url, path))
      .map_err(|e| config_error(format!("invalid URL {}{}: {}", base_url, path, e)))?;

    let mut request = self
      .http
      .request(method, url)
      .header(CONTENT_TYPE, "application/json")
      .header(ACCEPT, "application/json")
      .bearer_auth(token);
    if let Some(payload) = payload {
      request = request.body(payload);
    }

    debug!(%action, "sending request");
    let response = request.send().await.map_err(|source| ApiError::Transport {
      action: action.clone(),
      source,
    })?;

    let status = response.status();
    if status != StatusCode::OK && status != StatusCode::CREATED {
      debug!(%action, %status, "request failed");
      return Err(decode_error_response(response, &action).await);
    }

    let bytes = response.bytes().await.map_err(|source| ApiError::Transport {
      action: action.clone(),
      source,
    })?;
    let envelope: Envelope<T> =
      serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode { action, source })?;

    let write = if self.cache.is_disabled() || !key.is_none() {
      self.cache.store(key, &envelope.data)
    } else {
      CacheWrite::Skipped
    };

    Ok(CacheResult::from_network(envelope.data, write))
  }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{FileStorage, DEFAULT_TTL};
  use serde_json::json;
  use wiremock::matchers::{body_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(server: &MockServer, cache_dir: &tempfile::TempDir, no_cache: bool) -> ApiClient {
    let settings = ApiSettings {
      base_url: Some(format!("{}/v1/", server.uri())),
      token: Some("s3cret".to_string()),
    };
    ApiClient::new(
      settings,
      CacheLayer::new(FileStorage::new(cache_dir.path()), no_cache),
    )
  }

  fn cache_files(dir: &tempfile::TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    names.sort();
    names
  }

  #[tokio::test]
  async fn test_get_sends_headers_and_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v1/servers"))
      .and(header("authorization", "Bearer s3cret"))
      .and(header("content-type", "application/json"))
      .and(header("accept", "application/json"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [1, 2, 3]})))
      .expect(1)
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    let ids: Vec<u32> = api.get("servers", &CacheKey::CLOUD_SERVERS).await.unwrap();
    assert_eq!(ids, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn test_success_is_written_through_and_served_by_read_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v1/products"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": ["small"]})))
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    let result = api
      .send::<Vec<String>, ()>(Method::GET, "products", None, &CacheKey::VPS_PRODUCTS)
      .await
      .unwrap();
    assert_eq!(result.write, CacheWrite::Written);
    assert_eq!(cache_files(&dir), vec!["vps_products.json"]);

    let cached = api
      .cache()
      .call(&CacheKey::VPS_PRODUCTS, DEFAULT_TTL, || async {
        Err::<Vec<String>, _>("not called")
      })
      .await
      .unwrap();
    assert_eq!(cached.data, vec!["small".to_string()]);
  }

  #[tokio::test]
  async fn test_post_body_and_created_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/servers/7/change-flavour"))
      .and(body_json(json!({"flavourId": 3})))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"ok": true}})))
      .expect(1)
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    let out: serde_json::Value = api
      .post(
        "servers/7/change-flavour",
        &json!({"flavourId": 3}),
        &CacheKey::NONE,
      )
      .await
      .unwrap();
    assert_eq!(out, json!({"ok": true}));
    assert!(cache_files(&dir).is_empty());
  }

  #[tokio::test]
  async fn test_write_through_happens_even_when_cache_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 1})))
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, true);

    let written = api
      .send::<u8, ()>(Method::GET, "images", None, &CacheKey::VPS_IMAGES)
      .await
      .unwrap();
    assert_eq!(written.write, CacheWrite::Written);

    let skipped = api
      .send::<u8, ()>(Method::GET, "images/1", None, &CacheKey::NONE)
      .await
      .unwrap();
    assert_eq!(skipped.write, CacheWrite::Skipped);

    assert_eq!(cache_files(&dir), vec!["vps_images.json"]);
  }

  #[tokio::test]
  async fn test_cache_write_failure_does_not_fail_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": "x"})))
      .mount(&server)
      .await;

    let file = tempfile::NamedTempFile::new().unwrap();
    let api = ApiClient::new(
      ApiSettings {
        base_url: Some(format!("{}/", server.uri())),
        token: Some("t".to_string()),
      },
      CacheLayer::new(FileStorage::new(file.path().join("oh")), false),
    );

    let result = api
      .send::<String, ()>(Method::GET, "servers", None, &CacheKey::CLOUD_SERVERS)
      .await
      .unwrap();
    assert_eq!(result.data, "x");
    assert!(result.write.is_failed());
  }

  #[tokio::test]
  async fn test_structured_error_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/servers/order"))
      .respond_with(ResponseTemplate::new(422).set_body_json(json!({
        "code": 4220,
        "message": "invalid order",
        "details": {"reason": "validation", "invalid_fields": {"name": "required"}}
      })))
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    let err = api
      .post::<serde_json::Value, _>("servers/order", &json!({}), &CacheKey::NONE)
      .await
      .unwrap_err();

    assert_eq!(err.to_string(), "4220: invalid order (validation)");
    let ApiError::Api(e) = err else {
      panic!("expected structured error");
    };
    assert_eq!(e.action, "POST servers/order");
    assert_eq!(e.details.invalid_fields["name"], "required");
  }

  #[tokio::test]
  async fn test_error_without_code_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "bad"})))
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    let err = api
      .get::<serde_json::Value>("servers/99", &CacheKey::NONE)
      .await
      .unwrap_err();
    match err {
      ApiError::Api(e) => {
        assert_eq!(e.code, 404);
        assert_eq!(e.message, "bad");
      }
      other => panic!("expected structured error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_unparseable_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    let err = api
      .get::<serde_json::Value>("servers", &CacheKey::CLOUD_SERVERS)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
    assert_eq!(err.action(), "GET servers");
    assert!(cache_files(&dir).is_empty());
  }

  #[tokio::test]
  async fn test_malformed_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    let err = api
      .get::<Vec<u32>>("servers", &CacheKey::CLOUD_SERVERS)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
  }

  #[tokio::test]
  async fn test_missing_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheLayer::new(FileStorage::new(dir.path()), false);

    let no_token = ApiClient::new(
      ApiSettings {
        base_url: Some("http://localhost/".to_string()),
        token: Some(String::new()),
      },
      cache.clone(),
    );
    let err = no_token
      .get::<u8>("servers", &CacheKey::NONE)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Config { .. }));
    assert_eq!(err.action(), "GET servers");

    let no_base = ApiClient::new(
      ApiSettings {
        base_url: None,
        token: Some("t".to_string()),
      },
      cache,
    );
    let err = no_base
      .get::<u8>("servers", &CacheKey::NONE)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Config { .. }));
    assert_eq!(err.action(), "GET servers");
  }

  #[tokio::test]
  async fn test_connection_failure_is_transport_error() {
    let dir = tempfile::tempdir().unwrap();
    let api = ApiClient::new(
      ApiSettings {
        base_url: Some("http://127.0.0.1:1/".to_string()),
        token: Some("t".to_string()),
      },
      CacheLayer::new(FileStorage::new(dir.path()), false),
    );

    let err = api
      .get::<u8>("servers", &CacheKey::CLOUD_SERVERS)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
    assert!(err.to_string().starts_with("GET servers request failed"));
  }

  #[tokio::test]
  async fn test_unserializable_body_is_encode_error_and_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 1})))
      .expect(0)
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    // JSON object keys must be strings
    let mut body = std::collections::HashMap::new();
    body.insert((1u8, 2u8), 3u8);

    let err = api
      .post::<u8, _>("servers/order", &body, &CacheKey::NONE)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Encode { .. }));
    assert_eq!(err.action(), "POST servers/order");
  }

  #[tokio::test]
  async fn test_null_list_payload_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let api = client(&server, &dir, false);

    let err = api
      .get::<Vec<u32>>("servers", &CacheKey::CLOUD_SERVERS)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
    assert!(cache_files(&dir).is_empty());
  }

  #[tokio::test]
  async fn test_invalid_url_is_config_error_with_action() {
    let dir = tempfile::tempdir().unwrap();
    let api = ApiClient::new(
      ApiSettings {
        base_url: Some("not a url/".to_string()),
        token: Some("t".to_string()),
      },
      CacheLayer::new(FileStorage::new(dir.path()), false),
    );

    let err = api
      .get::<u8>("images/3", &CacheKey::NONE)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Config { .. }));
    assert_eq!(err.action(), "GET images/3");
    assert!(err.to_string().starts_with("configuration error for GET images/3"));
  }
}
