use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};
use mongodb::bson::oid::ObjectId;

use crate::{
    auth::cookies::{cookie_value, ACCESS_COOKIE},
    errors::AppError,
    models::user::UserPublic,
    services::session,
    state::AppState,
};

/// The access-token cookie wins over an `Authorization: Bearer` header.
pub fn access_credential(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    cookie_value(&jar, ACCESS_COOKIE).or_else(|| {
        headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Authenticated identity for the current request. Handlers taking this
/// extractor are never invoked for unauthenticated requests.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserPublic);

impl CurrentUser {
    pub fn id(&self) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(&self.0.id).map_err(|_| AppError::Unauthorized)
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = access_credential(&parts.headers).ok_or_else(|| {
            tracing::debug!("no credential on request");
            AppError::Unauthorized
        })?;

        let user = session::authenticate(state, &token).await?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderValue};

    use super::*;

    #[test]
    fn cookie_takes_priority_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=from-cookie"),
        );
        assert_eq!(access_credential(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(access_credential(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn nothing_means_no_credential() {
        let mut headers = HeaderMap::new();
        assert_eq!(access_credential(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("accessToken="));
        assert_eq!(access_credential(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(access_credential(&headers), None);
    }
}
