//! Request extractors.
//!
//! The actor comes from headers set by the upstream auth proxy:
//! `x-actor-id`, `x-actor-role` and optionally `x-auth-method`.
//! `ApiJson` and `ApiQuery` wrap axum's extractors so malformed input is
//! reported in the same error shape as every other failure.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;

use cap_core::enums::{AuthMethod, Role};
use cap_core::errors::CoreError;
use cap_core::identity::Actor;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const AUTH_METHOD_HEADER: &str = "x-auth-method";

/// The authenticated actor behind a request.
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parse a snake-case header value into one of the closed enums.
fn parse_header_enum<T: DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.to_ascii_lowercase())).ok()
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, CoreError> {
    let id = header(headers, ACTOR_ID_HEADER).ok_or(CoreError::Unauthorized)?;
    let role: Role = header(headers, ACTOR_ROLE_HEADER)
        .and_then(parse_header_enum)
        .ok_or(CoreError::Unauthorized)?;
    let auth_method = match header(headers, AUTH_METHOD_HEADER) {
        Some(raw) => parse_header_enum(raw).ok_or(CoreError::Unauthorized)?,
        None => AuthMethod::default(),
    };
    Ok(Actor::new(id, role).with_auth_method(auth_method))
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = actor_from_headers(&parts.headers)?;
        Ok(Self(actor))
    }
}

/// `Json<T>` with rejections mapped to `VALIDATION_FAILED`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query<T>` with rejections mapped to `VALIDATION_FAILED`.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| ApiError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn parses_full_identity() {
        let actor = actor_from_headers(&headers(&[
            (ACTOR_ID_HEADER, "dev-1"),
            (ACTOR_ROLE_HEADER, "Developer"),
            (AUTH_METHOD_HEADER, "email_reply"),
        ]))
        .unwrap();
        assert_eq!(actor.id, "dev-1");
        assert_eq!(actor.role, Role::Developer);
        assert_eq!(actor.auth_method, AuthMethod::EmailReply);
    }

    #[test]
    fn auth_method_defaults_to_web_session() {
        let actor = actor_from_headers(&headers(&[
            (ACTOR_ID_HEADER, "mgr-1"),
            (ACTOR_ROLE_HEADER, "manager"),
        ]))
        .unwrap();
        assert_eq!(actor.auth_method, AuthMethod::WebSession);
    }

    #[test]
    fn missing_or_unknown_identity_is_unauthorized() {
        for pairs in [
            vec![],
            vec![(ACTOR_ROLE_HEADER, "admin")],
            vec![(ACTOR_ID_HEADER, "  "), (ACTOR_ROLE_HEADER, "admin")],
            vec![(ACTOR_ID_HEADER, "x"), (ACTOR_ROLE_HEADER, "superuser")],
        ] {
            assert!(matches!(
                actor_from_headers(&headers(&pairs)),
                Err(CoreError::Unauthorized)
            ));
        }
    }
}
