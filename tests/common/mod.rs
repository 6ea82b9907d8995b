#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use library_author_api::{
    AppConfig, AppError, AppState, AuthorService,
    auth::{AccessPolicy, Claims, JwtVerifier, Role},
    models::{AuthorPage, AuthorRequest, AuthorResponse, Pagination},
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::SystemTime,
};

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

// --- Mock Use Case Layer ---

/// In-memory stand-in for the Postgres service. Counts every call so tests can
/// assert that a rejected request never reached the use case layer.
#[derive(Default)]
pub struct MockAuthorService {
    pub authors: Mutex<Vec<AuthorResponse>>,
    pub calls: AtomicUsize,
    pub fail_with: Option<AppError>,
    pub last_pagination: Mutex<Option<Pagination>>,
}

impl MockAuthorService {
    pub fn failing(err: AppError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthorService for MockAuthorService {
    async fn create_author(&self, req: AuthorRequest) -> Result<AuthorResponse, AppError> {
        self.enter()?;
        let mut authors = self.authors.lock().unwrap();
        let now = Utc::now();
        let author = AuthorResponse {
            id: authors.len() as i64 + 1,
            user_id: req.user_id,
            name: req.name,
            bio: req.bio,
            created_at: now,
            updated_at: now,
        };
        authors.push(author.clone());
        Ok(author)
    }

    async fn get_detail_author(&self, id: i64) -> Result<AuthorResponse, AppError> {
        self.enter()?;
        self.authors
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found("author not found"))
    }

    async fn update_author(
        &self,
        id: i64,
        req: AuthorRequest,
    ) -> Result<AuthorResponse, AppError> {
        self.enter()?;
        let mut authors = self.authors.lock().unwrap();
        let author = authors
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::not_found("author not found"))?;
        author.user_id = req.user_id;
        author.name = req.name;
        author.bio = req.bio;
        author.updated_at = Utc::now();
        Ok(author.clone())
    }

    async fn delete_author(&self, id: i64) -> Result<(), AppError> {
        self.enter()?;
        let mut authors = self.authors.lock().unwrap();
        let before = authors.len();
        authors.retain(|a| a.id != id);
        if authors.len() == before {
            return Err(AppError::not_found("author not found"));
        }
        Ok(())
    }

    async fn get_all_authors(&self, pagination: Pagination) -> Result<AuthorPage, AppError> {
        self.enter()?;
        *self.last_pagination.lock().unwrap() = Some(pagination);
        let authors = self.authors.lock().unwrap();
        let page = authors
            .iter()
            .rev()
            .skip(pagination.offset() as usize)
            .take(pagination.page_size() as usize)
            .cloned()
            .collect();
        Ok(AuthorPage {
            authors: page,
            pagination: pagination.describe(authors.len() as i64),
        })
    }
}

// --- State & Credentials ---

pub fn test_state(service: Arc<MockAuthorService>) -> AppState {
    test_state_with_policy(service, AccessPolicy::tiered())
}

pub fn test_state_with_policy(service: Arc<MockAuthorService>, policy: AccessPolicy) -> AppState {
    AppState {
        authors: service,
        verifier: Arc::new(JwtVerifier::new(TEST_JWT_SECRET)),
        policy,
        config: AppConfig::default(),
    }
}

/// Signs a token for `role` that expires `exp_offset` seconds from now (negative
/// offsets produce already-expired tokens).
pub fn create_token_with(secret: &str, role: Role, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: "42".to_string(),
        role,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn create_token(role: Role) -> String {
    create_token_with(TEST_JWT_SECRET, role, 3600)
}

pub fn bearer(role: Role) -> String {
    format!("Bearer {}", create_token(role))
}

// --- Request Helpers ---

pub fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
