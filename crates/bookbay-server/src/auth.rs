//! Accounts and bearer-token sessions.
//!
//! Tokens are `base64url(claims).base64url(hmac_sha256(claims))`. A token is
//! only honoured while the session it names still exists in the store, so
//! signing out revokes it even before `exp`.

use crate::error::{ApiError, ApiResult};
use crate::metrics::OpTimer;
use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as b64, Engine};
use bookbay_core::{
    util::{new_salt, password_digest},
    validate, MarketError, Session, SessionId, User, UserId, UserProfile,
};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub sid: SessionId,
    pub exp: i64,
    pub nonce: String,
}

pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<Hmac<Sha256>, MarketError> {
        <Hmac<Sha256>>::new_from_slice(&self.secret)
            .map_err(|e| MarketError::Internal(e.to_string()))
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, MarketError> {
        let payload =
            serde_json::to_vec(claims).map_err(|e| MarketError::Internal(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(&payload);
        let sig = mac.finalize().into_bytes();
        Ok(format!("{}.{}", b64.encode(&payload), b64.encode(sig)))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, MarketError> {
        let bad = || MarketError::Unauthorized("bad token".into());
        let (payload, sig) = token.split_once('.').ok_or_else(bad)?;
        let payload = b64.decode(payload).map_err(|_| bad())?;
        let sig = b64.decode(sig).map_err(|_| bad())?;
        let mut mac = self.mac()?;
        mac.update(&payload);
        mac.verify_slice(&sig)
            .map_err(|_| MarketError::Unauthorized("bad signature".into()))?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| bad())?;
        if claims.exp < now.timestamp() {
            return Err(MarketError::Unauthorized("token expired".into()));
        }
        Ok(claims)
    }
}

fn bearer(headers: &HeaderMap) -> Result<&str, MarketError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MarketError::Unauthorized("missing token".into()))
}

/// The signed-in caller, resolved from the bearer token.
pub struct CurrentUser {
    pub user: User,
    pub session_id: SessionId,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let now = Utc::now();
        let claims = state.tokens.verify(bearer(&parts.headers)?, now)?;
        let ended = || MarketError::Unauthorized("session ended".into());
        let session = state
            .store
            .get_session(&claims.sid)
            .await
            .map_err(|_| ended())?;
        if session.user_id != claims.sub || session.is_expired(now) {
            return Err(ended().into());
        }
        let user = state
            .store
            .get_user(&session.user_id)
            .await
            .map_err(|_| ended())?;
        Ok(CurrentUser {
            user,
            session_id: session.id,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

pub async fn sign_up(
    State(app): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    let _t = OpTimer::start("sign_up");
    validate::sign_up(&req.email, &req.password, &req.full_name)?;
    if app.store.find_user_by_email(&req.email).await?.is_some() {
        return Err(MarketError::Conflict("email already registered".into()).into());
    }
    let salt = new_salt();
    let user = User {
        id: ulid::Ulid::new().to_string(),
        email: req.email.trim().to_string(),
        full_name: req.full_name.trim().to_string(),
        password_hash: password_digest(&salt, &req.password),
        salt,
        created_at: Utc::now(),
    };
    let user = app.store.create_user(user).await?;
    tracing::info!(user = %user.id, "account created");
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

pub async fn sign_in(
    State(app): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<Json<SignInResponse>> {
    let _t = OpTimer::start("sign_in");
    let denied = || MarketError::Unauthorized("invalid email or password".into());
    let user = app
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(denied)?;
    if password_digest(&user.salt, &req.password) != user.password_hash {
        return Err(denied().into());
    }

    let now = Utc::now();
    let ttl = chrono::Duration::from_std(app.config.session_ttl)
        .map_err(|e| MarketError::Internal(e.to_string()))?;
    let session = Session {
        id: ulid::Ulid::new().to_string(),
        user_id: user.id.clone(),
        created_at: now,
        expires_at: now + ttl,
    };
    let token = app.tokens.issue(&Claims {
        sub: user.id.clone(),
        sid: session.id.clone(),
        exp: session.expires_at.timestamp(),
        nonce: uuid::Uuid::new_v4().to_string(),
    })?;
    let expires_at = session.expires_at;
    app.store.put_session(session).await?;
    Ok(Json(SignInResponse {
        token,
        expires_at,
        user: UserProfile::from(&user),
    }))
}

pub async fn sign_out(State(app): State<AppState>, me: CurrentUser) -> ApiResult<StatusCode> {
    let _t = OpTimer::start("sign_out");
    match app.store.delete_session(&me.session_id).await {
        // already swept
        Ok(()) | Err(MarketError::NotFound) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into()),
    }
}

pub async fn me(me: CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&me.user))
}

#[derive(Debug, Deserialize, Default)]
pub struct UserSearch {
    #[serde(default)]
    pub q: String,
}

pub async fn search_users(
    State(app): State<AppState>,
    _me: CurrentUser,
    Query(params): Query<UserSearch>,
) -> ApiResult<Json<Vec<UserProfile>>> {
    let _t = OpTimer::start("search_users");
    let needle = params.q.trim().to_lowercase();
    let users = app.store.list_users().await?;
    Ok(Json(
        users
            .iter()
            .filter(|u| {
                needle.is_empty()
                    || u.full_name.to_lowercase().contains(&needle)
                    || u.email.to_lowercase().contains(&needle)
            })
            .map(UserProfile::from)
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: i64) -> Claims {
        Claims {
            sub: "u1".into(),
            sid: "s1".into(),
            exp,
            nonce: "n".into(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let signer = TokenSigner::new("secret");
        let now = Utc::now();
        let c = claims(now.timestamp() + 60);
        let token = signer.issue(&c).unwrap();
        assert_eq!(signer.verify(&token, now).unwrap(), c);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let now = Utc::now();
        let token = TokenSigner::new("a")
            .issue(&claims(now.timestamp() + 60))
            .unwrap();
        assert!(matches!(
            TokenSigner::new("b").verify(&token, now),
            Err(MarketError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_and_garbled_tokens_are_rejected() {
        let signer = TokenSigner::new("secret");
        let now = Utc::now();
        let token = signer.issue(&claims(now.timestamp() - 1)).unwrap();
        assert!(signer.verify(&token, now).is_err());
        assert!(signer.verify("not-a-token", now).is_err());
        assert!(signer.verify("abc.def", now).is_err());
    }

    #[tokio::test]
    async fn sign_out_of_swept_session_succeeds() {
        let app = AppState::new(
            std::sync::Arc::new(bookbay_storage::InMemoryStore::new()),
            std::sync::Arc::new(bookbay_storage::StaticCatalog::sample()),
            crate::config::Config::default(),
        );
        let me = CurrentUser {
            user: User {
                id: "u1".into(),
                email: "ada@bookbay.io".into(),
                full_name: "Ada".into(),
                password_hash: String::new(),
                salt: String::new(),
                created_at: Utc::now(),
            },
            session_id: "swept".into(),
        };
        let status = sign_out(State(app), me).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[test]
    fn bearer_requires_prefix() {
        let mut h = HeaderMap::new();
        assert!(bearer(&h).is_err());
        h.insert(AUTHORIZATION, "Token abc".parse().unwrap());
        assert!(bearer(&h).is_err());
        h.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer(&h).unwrap(), "abc");
    }
}
