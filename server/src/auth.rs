//! Admin gate.
//!
//! Identity tokens are HS256 JWTs issued by the identity provider. A caller is
//! an admin when the token carries `admin: true`, or when its `email` matches
//! the configured fallback admin account.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account uid.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Admin claim set by the identity provider.
    #[serde(default)]
    pub admin: bool,
    pub exp: u64,
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
}

/// `aud` is either one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    #[must_use]
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::One(aud) => aud == audience,
            Self::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl Claims {
    pub fn new(uid: &str, email: Option<&str>, admin: bool, ttl_secs: u64) -> Self {
        let now = now_secs();
        Self {
            sub: uid.to_string(),
            email: email.map(str::to_string),
            admin,
            exp: now + ttl_secs,
            iat: now,
            iss: None,
            aud: None,
        }
    }
}

/// Identity attached to requests that passed the admin gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminContext {
    pub uid: String,
    pub email: Option<String>,
}

/// Verifies identity tokens and decides admin access.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
    issuer: Option<String>,
    audience: Option<String>,
    admin_email: Option<String>,
}

impl TokenVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
            audience: None,
            admin_email: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &sthana_config::AuthConfig) -> Self {
        let mut verifier = Self::new(config.jwt_secret.clone());
        if !config.issuer.is_empty() {
            verifier = verifier.with_issuer(config.issuer.clone());
        }
        if !config.audience.is_empty() {
            verifier = verifier.with_audience(config.audience.clone());
        }
        if let Some(email) = config.admin_email.as_deref().filter(|e| !e.is_empty()) {
            verifier = verifier.with_admin_email(email);
        }
        verifier
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    #[must_use]
    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into());
        self
    }

    /// Sign `claims`, filling in the configured issuer and audience.
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        let mut claims = claims.clone();
        if claims.iss.is_none() {
            claims.iss.clone_from(&self.issuer);
        }
        if claims.aud.is_none() {
            claims.aud = self.audience.clone().map(Audience::One);
        }
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;

        Ok(token_data.claims)
    }

    #[must_use]
    pub fn is_admin(&self, claims: &Claims) -> bool {
        if claims.admin {
            return true;
        }
        match (&self.admin_email, &claims.email) {
            (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
            _ => false,
        }
    }

    /// Full gate: parse the `Authorization` value, verify, check admin.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<AdminContext, ApiError> {
        let value =
            authorization.ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;
        let token = value
            .trim()
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::Unauthorized("Authorization header must use Bearer scheme".into())
            })?;

        let claims = self
            .decode(token)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))?;

        if !self.is_admin(&claims) {
            return Err(ApiError::Forbidden("Admin access required".into()));
        }

        Ok(AdminContext {
            uid: claims.sub,
            email: claims.email,
        })
    }
}

/// Middleware guarding `/api/admin/*`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    match state.verifier.authorize(authorization) {
        Ok(ctx) => {
            tracing::debug!(uid = %ctx.uid, "Admin request authorized");
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => {
            tracing::info!(path = %request.uri().path(), error = %e, "Admin request rejected");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new("test-secret-key-12345").with_admin_email("Owner@Example.org")
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn round_trip_claims() {
        let v = verifier();
        let claims = Claims::new("uid-1", Some("a@example.org"), true, 3600);
        let decoded = v.decode(&v.encode(&claims).unwrap()).unwrap();
        assert_eq!(decoded.sub, "uid-1");
        assert!(decoded.admin);
    }

    #[test]
    fn admin_claim_grants_access() {
        let v = verifier();
        let token = v.encode(&Claims::new("uid-1", None, true, 3600)).unwrap();
        let ctx = v.authorize(Some(&bearer(&token))).unwrap();
        assert_eq!(ctx.uid, "uid-1");
        assert_eq!(ctx.email, None);
    }

    #[test]
    fn fallback_email_grants_access_case_insensitively() {
        let v = verifier();
        let token = v
            .encode(&Claims::new("uid-2", Some("owner@example.ORG"), false, 3600))
            .unwrap();
        assert!(v.authorize(Some(&bearer(&token))).is_ok());
    }

    #[test]
    fn non_admin_is_forbidden() {
        let v = verifier();
        let token = v
            .encode(&Claims::new("uid-3", Some("visitor@example.org"), false, 3600))
            .unwrap();
        let err = v.authorize(Some(&bearer(&token))).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn no_fallback_configured_means_claim_only() {
        let v = TokenVerifier::new("s");
        let claims = Claims::new("uid", Some("owner@example.org"), false, 3600);
        assert!(!v.is_admin(&claims));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let v = verifier();
        let token = v.encode(&Claims::new("uid-1", None, true, 3600)).unwrap();
        for scheme in ["Bearer", "bearer", "BEARER"] {
            let ctx = v.authorize(Some(&format!("{scheme} {token}"))).unwrap();
            assert_eq!(ctx.uid, "uid-1", "{scheme}");
        }
    }

    #[test]
    fn missing_or_malformed_header_is_unauthorized() {
        let v = verifier();
        for header in [
            None,
            Some("Basic abc"),
            Some("Bearer "),
            Some("Bearer"),
            Some("Bearerx abc"),
            Some("Bearer not-a-jwt"),
        ] {
            let err = v.authorize(header).unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{header:?}");
        }
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = TokenVerifier::new("other")
            .encode(&Claims::new("uid", None, true, 3600))
            .unwrap();
        let err = verifier().authorize(Some(&bearer(&token))).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn expired_token_rejected() {
        let v = verifier();
        let mut claims = Claims::new("uid", None, true, 0);
        claims.exp = claims.iat - 1000;
        let token = v.encode(&claims).unwrap();
        assert!(v.decode(&token).is_err());
    }

    #[test]
    fn issuer_and_audience_are_enforced() {
        let strict = TokenVerifier::new("s")
            .with_issuer("https://id.example.org")
            .with_audience("sthana");
        let good = strict.encode(&Claims::new("uid", None, true, 3600)).unwrap();
        assert!(strict.decode(&good).is_ok());

        let mut claims = Claims::new("uid", None, true, 3600);
        claims.aud = Some(Audience::One("someone-else".into()));
        let bad = strict.encode(&claims).unwrap();
        assert!(strict.decode(&bad).is_err());

        let lax = TokenVerifier::new("s");
        assert!(lax.decode(&good).is_ok());
    }

    #[test]
    fn audience_list_is_accepted() {
        let strict = TokenVerifier::new("s").with_audience("sthana");
        let mut claims = Claims::new("uid", None, true, 3600);
        claims.aud = Some(Audience::Many(vec!["console".into(), "sthana".into()]));
        let token = strict.encode(&claims).unwrap();

        let decoded = strict.decode(&token).unwrap();
        assert!(decoded.aud.as_ref().is_some_and(|aud| aud.contains("sthana")));
        assert!(TokenVerifier::new("s").decode(&token).is_ok());

        claims.aud = Some(Audience::Many(vec!["console".into()]));
        let other = strict.encode(&claims).unwrap();
        assert!(strict.decode(&other).is_err());
    }
}
