use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::metrics::OpTimer;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bookbay_core::{MarketError, Message};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub messages: Vec<Message>,
    pub unread_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub content: String,
}

pub async fn inbox(State(app): State<AppState>, me: CurrentUser) -> ApiResult<Json<Inbox>> {
    let messages = app.store.list_messages(&me.user.id).await?;
    Ok(Json(Inbox {
        unread_count: messages.iter().filter(|m| m.unread).count(),
        messages,
    }))
}

pub async fn send(
    State(app): State<AppState>,
    me: CurrentUser,
    Json(req): Json<SendMessage>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let _t = OpTimer::start("message_send");
    if req.subject.trim().is_empty() {
        return Err(MarketError::Invalid("subject is required".into()).into());
    }
    let message = Message {
        id: format!("msg_{}", ulid::Ulid::new()),
        from: me.user.full_name.clone(),
        from_id: me.user.id.clone(),
        subject: req.subject.trim().to_string(),
        content: req.content,
        date: chrono::Utc::now().date_naive(),
        unread: true,
    };
    let message = app.store.push_message(&req.to, message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_read(
    State(app): State<AppState>,
    me: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    Ok(Json(app.store.mark_message_read(&me.user.id, &id).await?))
}

pub async fn delete(
    State(app): State<AppState>,
    me: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    app.store.delete_message(&me.user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
