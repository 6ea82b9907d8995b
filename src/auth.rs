use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::{AppConfig, AuthMode, PolicyKind},
    error::AppError,
};

/// Role
///
/// Role names issued by the identity service. Anything unrecognised deserializes to
/// `Guest`, which no tier accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Author,
    #[serde(other)]
    Guest,
}

/// Claims
///
/// Payload of a locally verified JWT (HS256).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's identifier in the identity service.
    pub sub: String,
    pub role: Role,
    /// Expiration time (seconds since epoch). Always validated.
    pub exp: usize,
    /// Issued at.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. The tier middleware stores it
/// in the request extensions for anything downstream that wants it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub subject: String,
    pub role: Role,
}

/// AuthError
///
/// Why a credential could not be turned into an `AuthUser`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credential: {0}")]
    Rejected(String),
    #[error("insufficient role: {0}")]
    Forbidden(String),
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Rejected(_) => AppError::unauthorized(err.to_string()),
            AuthError::Forbidden(_) => AppError::forbidden(err.to_string()),
            AuthError::Unavailable(_) => {
                tracing::error!("{}", err);
                AppError::internal(err.to_string())
            }
        }
    }
}

// --- Credential Verification ---

/// TokenVerifier
///
/// Turns a bearer token into an identity. Two deployments exist: local signature
/// checking (`JwtVerifier`) and delegation to the identity service
/// (`RemoteVerifier`).
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// VerifierState
///
/// The concrete type used to share the verifier across the application state.
pub type VerifierState = Arc<dyn TokenVerifier>;

/// JwtVerifier
///
/// Verifies HS256 tokens against a shared secret. Expiry is always enforced.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Rejected("token expired".into()),
                ErrorKind::InvalidSignature => AuthError::Rejected("bad signature".into()),
                _ => AuthError::Rejected("malformed token".into()),
            }
        })?;

        Ok(AuthUser {
            subject: data.claims.sub,
            role: data.claims.role,
        })
    }
}

/// IdentityResponse
///
/// Body the identity service answers a successful validation with.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub sub: String,
    pub role: Role,
}

/// RemoteVerifier
///
/// Delegates every check to the identity service: the bearer token is forwarded to
/// `GET {base}/api/v1/auth/validate`. 2xx resolves an identity, 401 and 403 are
/// passed through, anything else means the oracle is unavailable.
#[derive(Clone)]
pub struct RemoteVerifier {
    client: reqwest::Client,
    validate_url: String,
}

impl RemoteVerifier {
    pub fn new(identity_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            validate_url: format!(
                "{}/api/v1/auth/validate",
                identity_url.trim_end_matches('/')
            ),
        }
    }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(&self.validate_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let identity = response
                    .json::<IdentityResponse>()
                    .await
                    .map_err(|e| AuthError::Unavailable(format!("unreadable identity: {e}")))?;

                Ok(AuthUser {
                    subject: identity.sub,
                    role: identity.role,
                })
            }
            StatusCode::UNAUTHORIZED => Err(AuthError::Rejected(
                "rejected by identity service".into(),
            )),
            StatusCode::FORBIDDEN => Err(AuthError::Forbidden(
                "denied by identity service".into(),
            )),
            other => Err(AuthError::Unavailable(format!(
                "identity service answered {other}"
            ))),
        }
    }
}

/// verifier_from_config
///
/// Builds the verifier the configured auth mode asks for.
pub fn verifier_from_config(config: &AppConfig) -> VerifierState {
    match &config.auth_mode {
        AuthMode::Local => Arc::new(JwtVerifier::new(&config.jwt_secret)),
        AuthMode::Remote { identity_url } => Arc::new(RemoteVerifier::new(identity_url)),
    }
}

// --- Access Policy ---

/// CapabilityTier
///
/// The level of access a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTier {
    Read,
    Write,
}

/// AccessPolicy
///
/// Maps each capability tier to the roles it admits. One object covers both
/// deployment flavours instead of duplicating route tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPolicy {
    read: Vec<Role>,
    write: Vec<Role>,
}

impl AccessPolicy {
    pub fn new(read: Vec<Role>, write: Vec<Role>) -> Self {
        Self { read, write }
    }

    /// Admins and authors may read, only admins may write.
    pub fn tiered() -> Self {
        Self::new(vec![Role::Admin, Role::Author], vec![Role::Admin])
    }

    /// The same check on every author route.
    pub fn uniform() -> Self {
        let roles = vec![Role::Admin, Role::Author];
        Self::new(roles.clone(), roles)
    }

    pub fn from_kind(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::Tiered => Self::tiered(),
            PolicyKind::Uniform => Self::uniform(),
        }
    }

    pub fn roles_for(&self, tier: CapabilityTier) -> &[Role] {
        match tier {
            CapabilityTier::Read => &self.read,
            CapabilityTier::Write => &self.write,
        }
    }

    /// authorize
    ///
    /// `Forbidden` unless the user's role is admitted to `tier`.
    pub fn authorize(&self, tier: CapabilityTier, user: &AuthUser) -> Result<(), AppError> {
        if self.roles_for(tier).contains(&user.role) {
            Ok(())
        } else {
            tracing::warn!(subject = %user.subject, role = ?user.role, tier = ?tier, "access denied");
            Err(AppError::forbidden("insufficient role for this operation"))
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::tiered()
    }
}

// --- Extractor ---

/// bearer_token
///
/// Pulls the credential out of `Authorization: Bearer <token>`.
pub fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("malformed authorization header"))?;

    header_value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("authorization header must use Bearer scheme"))
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as an argument of the tier middleware (and of any
/// handler). The steps:
/// 1. Resolve the verifier from the application state.
/// 2. Extract the bearer token; absent or malformed headers are 401.
/// 3. Verify the token (locally or remotely).
///
/// Rejection: an `AppError` rendered as the standard error body.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    VerifierState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = VerifierState::from_ref(state);
        let token = bearer_token(parts)?.to_owned();

        verifier.verify(&token).await.map_err(AppError::from)
    }
}
