//! Bearer-token capability check for the student API.
//!
//! Tokens are compact HS256 JWTs signed with a shared secret. Verification
//! checks the three-segment structure, the `alg` header, the HMAC-SHA256
//! signature (in constant time) and the `exp` claim. Handlers opt in by
//! taking a [`BearerClaims`] argument, which rejects the request with
//! `401 Unauthorized` before the handler body runs.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use futures_util::future::{Ready, ready};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::Error;

use super::state::HttpState;

type HmacSha256 = Hmac<Sha256>;

/// Default token lifetime used by the issuer.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Reasons a bearer credential is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("authorization header missing")]
    Missing,
    #[error("authorization header is not a bearer credential")]
    NotBearer,
    #[error("token is malformed")]
    Malformed,
    #[error("token algorithm is not supported")]
    UnsupportedAlgorithm,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token could not be signed: {message}")]
    Signing { message: String },
}

/// Claims carried by a student API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Issues and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct TokenAuthority {
    secret: Arc<Zeroizing<Vec<u8>>>,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority").finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// Create an authority over `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Arc::new(Zeroizing::new(secret.as_ref().to_vec())),
        }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|err| TokenError::Signing {
            message: err.to_string(),
        })
    }

    /// Sign claims for the subject, expiring after `ttl`.
    pub fn issue(
        &self,
        sub: &str,
        email: &str,
        name: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.sign(&TokenClaims {
            sub: sub.to_owned(),
            email: email.to_owned(),
            name: name.to_owned(),
            exp: (Utc::now() + ttl).timestamp(),
        })
    }

    /// Sign an explicit claim set.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let header = TokenHeader {
            alg: "HS256".to_owned(),
            typ: Some("JWT".to_owned()),
        };
        let signing_input = format!(
            "{}.{}",
            encode_segment(&header)?,
            encode_segment(claims)?
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a compact token and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let header: TokenHeader = decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        let signing_input = token
            .rsplit_once('.')
            .map(|(input, _)| input)
            .ok_or(TokenError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: TokenClaims = decode_segment(payload)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Verify the `Authorization` header of a request.
    pub fn verify_request(&self, req: &HttpRequest) -> Result<TokenClaims, TokenError> {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .ok_or(TokenError::Missing)?
            .to_str()
            .map_err(|_| TokenError::NotBearer)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::NotBearer)?;
        self.verify(token)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    serde_json::to_vec(value)
        .map(|bytes| URL_SAFE_NO_PAD.encode(bytes))
        .map_err(|err| TokenError::Signing {
            message: err.to_string(),
        })
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Verified claims extracted from the request's bearer credential.
///
/// Taking this as a handler argument gates the route.
#[derive(Debug, Clone)]
pub struct BearerClaims(pub TokenClaims);

impl FromRequest for BearerClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<HttpState>>() else {
            return ready(Err(Error::internal("http state not configured").into()));
        };
        ready(
            state
                .tokens
                .verify_request(req)
                .map(BearerClaims)
                .map_err(|err| {
                    debug!(reason = %err, path = %req.path(), "bearer credential rejected");
                    Error::unauthorized(err.to_string()).into()
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Token issuance, verification and the bearer extractor.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn authority() -> TokenAuthority {
        TokenAuthority::new("test-secret")
    }

    #[rstest]
    fn issued_tokens_verify(authority: TokenAuthority) {
        let token = authority
            .issue("7", "ada@example.com", "Ada", Duration::hours(1))
            .expect("issue token");
        let claims = authority.verify(&token).expect("verify token");
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.name, "Ada");
    }

    #[rstest]
    fn expired_tokens_are_rejected(authority: TokenAuthority) {
        let token = authority
            .issue("7", "", "", Duration::seconds(-5))
            .expect("issue token");
        assert_eq!(authority.verify(&token), Err(TokenError::Expired));
    }

    #[rstest]
    fn tokens_from_another_secret_are_rejected(authority: TokenAuthority) {
        let token = TokenAuthority::new("other")
            .issue("7", "", "", Duration::hours(1))
            .expect("issue token");
        assert_eq!(authority.verify(&token), Err(TokenError::BadSignature));
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("a.b")]
    #[case("a.b.c.d")]
    fn structurally_invalid_tokens_are_malformed(authority: TokenAuthority, #[case] raw: &str) {
        assert_eq!(authority.verify(raw), Err(TokenError::Malformed));
    }

    #[rstest]
    fn non_hs256_headers_are_rejected(authority: TokenAuthority) {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"1","exp":99999999999}"#);
        let token = format!("{header}.{payload}.");
        assert_eq!(
            authority.verify(&token),
            Err(TokenError::UnsupportedAlgorithm)
        );
    }

    #[rstest]
    fn tampered_payloads_fail_signature_checks(authority: TokenAuthority) {
        let token = authority
            .issue("7", "", "", Duration::hours(1))
            .expect("issue token");
        let forged = URL_SAFE_NO_PAD.encode(br#"{"sub":"1","exp":99999999999}"#);
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged;
        assert_eq!(
            authority.verify(&parts.join(".")),
            Err(TokenError::BadSignature)
        );
    }

    #[rstest]
    #[case(None, TokenError::Missing)]
    #[case(Some("Basic abc"), TokenError::NotBearer)]
    #[case(Some("Bearer "), TokenError::NotBearer)]
    fn request_headers_must_carry_bearer_tokens(
        authority: TokenAuthority,
        #[case] header: Option<&str>,
        #[case] expected: TokenError,
    ) {
        let mut req = actix_web::test::TestRequest::default();
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        assert_eq!(authority.verify_request(&req.to_http_request()), Err(expected));
    }
}
