//! HTTP Basic-auth extractor and standalone verifier.
//!
//! The authenticated username is the staff identity recorded on every
//! injury and follow-up entry written during the request.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use medbay_core::store::InjuryStore;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// One staff account accepted by this server instance.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// The username of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated(pub String);

/// Verify credentials from headers against the configured accounts and
/// return the matching username.
pub fn verify_auth(headers: &HeaderMap, users: &[AuthConfig]) -> Result<String, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let user = users
    .iter()
    .find(|u| u.username == username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(user.username.clone())
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: InjuryStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let username = verify_auth(&parts.headers, &state.users).inspect_err(|_| {
      tracing::debug!(path = %parts.uri.path(), "rejected credentials");
    })?;
    Ok(Authenticated(username))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, header};

  use super::*;
  use crate::tests::{basic, hash};

  fn users() -> Vec<AuthConfig> {
    vec![
      AuthConfig { username: "medico".into(), password_hash: hash("secret") },
      AuthConfig { username: "fisio".into(), password_hash: hash("otra") },
    ]
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn correct_credentials_name_the_user() {
    let users = users();
    assert_eq!(verify_auth(&headers(&basic("fisio", "otra")), &users).unwrap(), "fisio");
  }

  #[test]
  fn wrong_password() {
    let users = users();
    let err = verify_auth(&headers(&basic("medico", "otra")), &users);
    assert!(matches!(err, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let users = users();
    let err = verify_auth(&headers(&basic("nadie", "secret")), &users);
    assert!(matches!(err, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn missing_header_and_bad_base64() {
    let users = users();
    assert!(matches!(verify_auth(&HeaderMap::new(), &users), Err(ApiError::Unauthorized)));
    assert!(matches!(
      verify_auth(&headers("Basic !!!not-base64!!!"), &users),
      Err(ApiError::Unauthorized)
    ));
  }
}
