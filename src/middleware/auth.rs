use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::app::AppState;
use crate::auth::{Principal, TokenService, Verification};
use crate::error::ApiError;

/// Why a request was denied. Kept for logs and audit; never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Unauthenticated,
    Expired,
    Malformed,
    SignatureMismatch,
    WrongAudience,
    WrongIssuer,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Unauthenticated => "unauthenticated",
            RejectReason::Expired => "expired",
            RejectReason::Malformed => "malformed",
            RejectReason::SignatureMismatch => "signature_mismatch",
            RejectReason::WrongAudience => "wrong_audience",
            RejectReason::WrongIssuer => "wrong_issuer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection(pub RejectReason);

impl Rejection {
    pub fn reason(&self) -> RejectReason {
        self.0
    }
}

impl From<Rejection> for ApiError {
    fn from(_: Rejection) -> Self {
        ApiError::unauthorized("Authentication required")
    }
}

/// Decide whether a request carries a valid session token.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService, now: DateTime<Utc>) -> Result<Principal, Rejection> {
    let token = extract_bearer_token(headers).ok_or(Rejection(RejectReason::Unauthenticated))?;

    match tokens.verify(token, now) {
        Verification::Valid(principal) => Ok(principal),
        Verification::Expired => Err(Rejection(RejectReason::Expired)),
        Verification::Malformed => Err(Rejection(RejectReason::Malformed)),
        Verification::SignatureMismatch => Err(Rejection(RejectReason::SignatureMismatch)),
        Verification::WrongAudience => Err(Rejection(RejectReason::WrongAudience)),
        Verification::WrongIssuer => Err(Rejection(RejectReason::WrongIssuer)),
    }
}

/// Token from `Authorization: Bearer <token>`. The scheme is case-insensitive.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Middleware guarding protected routes. Injects [`Principal`] into request
/// extensions on success; every rejection becomes the same 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match authenticate(request.headers(), &state.tokens, Utc::now()) {
        Ok(principal) => {
            tracing::debug!("Authenticated request for subject '{}'", principal.subject);
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(rejection) => {
            let reason = rejection.reason();
            match reason {
                RejectReason::Unauthenticated | RejectReason::Expired => {
                    tracing::debug!(reason = reason.as_str(), "Rejected request to {}", request.uri().path());
                }
                _ => {
                    tracing::warn!(reason = reason.as_str(), "Rejected request to {}", request.uri().path());
                }
            }
            Err(rejection.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenSettings;
    use axum::http::HeaderValue;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn service() -> TokenService {
        TokenService::new(TokenSettings::new("s3cr3t", "hub", "app")).unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        let result = authenticate(&HeaderMap::new(), &service(), at(1000));
        assert_eq!(result, Err(Rejection(RejectReason::Unauthenticated)));
    }

    #[test]
    fn wrong_scheme_or_empty_token_is_unauthenticated() {
        for value in ["Basic dTE6cHc=", "Bearer", "Bearer    ", "token-without-scheme"] {
            let result = authenticate(&headers_with(value), &service(), at(1000));
            assert_eq!(result, Err(Rejection(RejectReason::Unauthenticated)), "header={:?}", value);
        }
    }

    #[test]
    fn valid_token_yields_principal() {
        let svc = service();
        let issued = svc.issue(&Principal::new("u1"), at(1000)).unwrap();
        for scheme in ["Bearer", "bearer", "BEARER"] {
            let headers = headers_with(&format!("{} {}", scheme, issued.token));
            assert_eq!(authenticate(&headers, &svc, at(1500)), Ok(Principal::new("u1")));
        }
    }

    #[test]
    fn expired_token_keeps_reason() {
        let svc = service();
        let issued = svc.issue(&Principal::new("u1"), at(1000)).unwrap();
        let headers = headers_with(&format!("Bearer {}", issued.token));
        assert_eq!(
            authenticate(&headers, &svc, at(4601)),
            Err(Rejection(RejectReason::Expired))
        );
    }

    #[test]
    fn every_failure_maps_to_a_reason() {
        let svc = service();
        let cases = [
            ("not.a.token".to_string(), RejectReason::Malformed),
            (
                TokenService::new(TokenSettings::new("other", "hub", "app"))
                    .unwrap()
                    .issue(&Principal::new("u1"), at(1000))
                    .unwrap()
                    .token,
                RejectReason::SignatureMismatch,
            ),
            (
                TokenService::new(TokenSettings::new("s3cr3t", "x", "app"))
                    .unwrap()
                    .issue(&Principal::new("u1"), at(1000))
                    .unwrap()
                    .token,
                RejectReason::WrongIssuer,
            ),
            (
                TokenService::new(TokenSettings::new("s3cr3t", "hub", "x"))
                    .unwrap()
                    .issue(&Principal::new("u1"), at(1000))
                    .unwrap()
                    .token,
                RejectReason::WrongAudience,
            ),
        ];

        for (token, expected) in cases {
            let headers = headers_with(&format!("Bearer {}", token));
            assert_eq!(authenticate(&headers, &svc, at(1000)), Err(Rejection(expected)));
        }
    }

    #[test]
    fn rejection_becomes_generic_unauthorized() {
        let generic: Vec<String> = [RejectReason::Expired, RejectReason::SignatureMismatch]
            .into_iter()
            .map(|r| ApiError::from(Rejection(r)).to_json().to_string())
            .collect();
        assert_eq!(generic[0], generic[1]);
        assert_eq!(ApiError::from(Rejection(RejectReason::Malformed)).status_code(), 401);
    }
}
