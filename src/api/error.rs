//! Error types for remote calls and the decoder for failed responses.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::scalars::null_as_default;

/// Everything that can go wrong while calling the API.
///
/// Cache failures are not represented here: they never fail a call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// Missing credential or base URL, or an unusable request URL
  #[error("configuration error for {action}: {message}")]
  Config { action: String, message: String },

  #[error("error encoding request body for {action}: {source}")]
  Encode {
    action: String,
    source: serde_json::Error,
  },

  #[error("{action} request failed: {source}")]
  Transport {
    action: String,
    source: reqwest::Error,
  },

  /// The service answered with a structured failure
  #[error(transparent)]
  Api(#[from] StructuredError),

  #[error("failed to decode response for {action}: {source}")]
  Decode {
    action: String,
    source: serde_json::Error,
  },
}

impl ApiError {
  /// The `METHOD path` description of the failed call.
  pub fn action(&self) -> &str {
    match self {
      Self::Config { action, .. }
      | Self::Encode { action, .. }
      | Self::Transport { action, .. }
      | Self::Decode { action, .. } => action,
      Self::Api(err) => &err.action,
    }
  }
}

/// Failure body returned by the service.
///
/// ```json
/// {"code": 422, "message": "...", "details": {"reason": "...", "invalid_fields": {"name": "..."}}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, thiserror::Error)]
#[error("{code}: {message} ({reason})", reason = .details.reason)]
pub struct StructuredError {
  /// `METHOD path` of the call that failed, attached after decoding
  #[serde(skip)]
  pub action: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub code: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub message: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub details: ErrorDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetails {
  #[serde(default, deserialize_with = "null_as_default")]
  pub reason: String,
  /// Field name to validation message
  #[serde(default, deserialize_with = "null_as_default")]
  pub invalid_fields: BTreeMap<String, String>,
}

/// Turn a non-success response into an [`ApiError`].
pub async fn decode_error_response(response: reqwest::Response, action: &str) -> ApiError {
  let status = response.status().as_u16();
  match response.bytes().await {
    Ok(body) => decode_error_body(status, &body, action),
    Err(source) => ApiError::Transport {
      action: action.to_string(),
      source,
    },
  }
}

/// Parse an error body. A missing or zero code is replaced by `status`.
pub fn decode_error_body(status: u16, body: &[u8], action: &str) -> ApiError {
  match serde_json::from_slice::<StructuredError>(body) {
    Ok(mut err) => {
      if err.code == 0 {
        err.code = i64::from(status);
      }
      err.action = action.to_string();
      ApiError::Api(err)
    }
    Err(source) => ApiError::Decode {
      action: action.to_string(),
      source,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_code_falls_back_to_status() {
    let err = decode_error_body(404, br#"{"message":"bad"}"#, "GET servers/1");
    match err {
      ApiError::Api(e) => {
        assert_eq!(e.code, 404);
        assert_eq!(e.message, "bad");
        assert_eq!(e.action, "GET servers/1");
      }
      other => panic!("expected structured error, got {other:?}"),
    }
  }

  #[test]
  fn test_full_error_body() {
    let body = br#"{
      "code": 1001,
      "message": "validation failed",
      "details": {"reason": "bad input", "invalid_fields": {"name": "too long"}}
    }"#;
    let err = decode_error_body(422, body, "POST servers/order");

    assert_eq!(err.to_string(), "1001: validation failed (bad input)");
    assert_eq!(err.action(), "POST servers/order");
    let ApiError::Api(e) = err else {
      panic!("expected structured error");
    };
    assert_eq!(e.details.invalid_fields.get("name").unwrap(), "too long");
  }

  #[test]
  fn test_zero_code_and_null_details() {
    let err = decode_error_body(500, br#"{"code":0,"message":null,"details":null}"#, "GET x");
    assert_eq!(err.to_string(), "500:  ()");
  }

  #[test]
  fn test_unparseable_body_is_decode_error() {
    let err = decode_error_body(502, b"<html>Bad Gateway</html>", "GET images");
    assert!(matches!(err, ApiError::Decode { .. }));
    assert_eq!(err.action(), "GET images");
    assert!(err.to_string().contains("GET images"));
  }
}
