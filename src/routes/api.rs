// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::models::{
    NewSubscription, Profile, ProfileUpdate, SpendingReport, Subscription, SubscriptionStatus,
    SubscriptionUpdate,
};
use crate::routes::auth::MessageResponse;
use crate::services::email::escape_html;
use crate::services::intake::{
    self, DetectedSubscription, IntakeError, UploadedFile, MAX_UPLOAD_BYTES,
};
use crate::services::reminders::{due_for_reminder, render_reminder_email};
use crate::services::session::ActiveSession;
use crate::services::spending::spending_report;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Multipart framing allowance on top of the largest accepted file.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// API routes (require an authenticated session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .route(
            "/api/subscriptions/{id}",
            put(update_subscription).delete(delete_subscription),
        )
        .route("/api/subscriptions/{id}/pause", post(pause_subscription))
        .route("/api/subscriptions/{id}/resume", post(resume_subscription))
        .route("/api/subscriptions/{id}/cancel", post(cancel_subscription))
        .route("/api/spending", get(get_spending))
        .route("/api/profile", get(get_profile).put(update_profile))
        .route(
            "/api/intake",
            post(intake_upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES as usize + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/api/reminders/send", post(send_reminders))
        .route("/api/support", post(submit_support))
}

// ─── Subscriptions ───────────────────────────────────────────

async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
) -> Result<Json<Vec<Subscription>>> {
    let subscriptions = state
        .db
        .list_subscriptions(&session.access_token, &session.user.id)
        .await?;
    Ok(Json(subscriptions))
}

async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Json(fields): Json<NewSubscription>,
) -> Result<(StatusCode, Json<Subscription>)> {
    fields.validate()?;

    let created = state
        .db
        .insert_subscription(&session.access_token, &session.user.id, &fields)
        .await?;

    tracing::info!(
        user_id = %session.user.id,
        subscription_id = %created.id,
        name = %created.name,
        "Subscription created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Path(id): Path<String>,
    Json(update): Json<SubscriptionUpdate>,
) -> Result<Json<Subscription>> {
    update.validate()?;

    let updated = state
        .db
        .update_subscription(&session.access_token, &session.user.id, &id, &update)
        .await?;
    Ok(Json(updated))
}

async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .db
        .delete_subscription(&session.access_token, &session.user.id, &id)
        .await?;

    tracing::info!(user_id = %session.user.id, subscription_id = %id, "Subscription deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn set_status(
    state: &AppState,
    session: &ActiveSession,
    id: &str,
    status: SubscriptionStatus,
) -> Result<Json<Subscription>> {
    let updated = state
        .db
        .update_subscription(
            &session.access_token,
            &session.user.id,
            id,
            &SubscriptionUpdate::status(status),
        )
        .await?;

    tracing::info!(
        user_id = %session.user.id,
        subscription_id = %id,
        status = ?status,
        "Subscription status changed"
    );
    Ok(Json(updated))
}

async fn pause_subscription(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>> {
    set_status(&state, &session, &id, SubscriptionStatus::Paused).await
}

async fn resume_subscription(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>> {
    set_status(&state, &session, &id, SubscriptionStatus::Active).await
}

async fn cancel_subscription(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>> {
    set_status(&state, &session, &id, SubscriptionStatus::Cancelled).await
}

// ─── Spending ────────────────────────────────────────────────

/// Chart data for the dashboard. Never fails; see [`spending_report`].
async fn get_spending(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
) -> Json<SpendingReport> {
    Json(
        spending_report(
            &state.db,
            state.config.backend_configured(),
            &session,
            Utc::now(),
        )
        .await,
    )
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
) -> Json<Profile> {
    Json(state.profiles.load(&session.user))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>> {
    update.validate()?;
    let profile = state.profiles.save(&session.user, update)?;
    Ok(Json(profile))
}

// ─── File Intake ─────────────────────────────────────────────

/// Pre-filled form values for an uploaded receipt or screenshot.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IntakeResponse {
    pub file_name: String,
    pub detected: DetectedSubscription,
}

/// Accept a multipart upload (field `file`) and derive subscription details.
///
/// Only the file name, declared type and size are inspected.
async fn intake_upload(
    Extension(session): Extension<ActiveSession>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<IntakeResponse>> {
    let content_length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(size) = content_length {
        if size > MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES as u64 {
            return Err(IntakeError::TooLarge { size }.into());
        }
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, "Invalid upload"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, "Failed to read upload"))?;

        let upload = UploadedFile {
            file_name,
            mime_type,
            size: bytes.len() as u64,
        };
        let detected = intake::analyze(&upload, Utc::now().date_naive())?;

        tracing::info!(
            user_id = %session.user.id,
            file_name = %upload.file_name,
            size = upload.size,
            "Processed intake upload"
        );
        return Ok(Json(IntakeResponse {
            file_name: upload.file_name,
            detected,
        }));
    }

    Err(AppError::BadRequest("Missing 'file' field".to_string()))
}

/// Bodies cut off by the upload limit are reported as oversized files.
fn upload_error(err: MultipartError, context: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::UploadTooLarge.into()
    } else {
        AppError::BadRequest(format!("{}: {}", context, err))
    }
}

// ─── Reminders ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReminderResponse {
    /// Subscriptions included in the digest
    pub reminded: usize,
}

/// Email the signed-in user a digest of upcoming renewals.
async fn send_reminders(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
) -> Result<Json<ReminderResponse>> {
    let to = session
        .user
        .email
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Account has no email address".to_string()))?;

    let subscriptions = state
        .db
        .list_subscriptions(&session.access_token, &session.user.id)
        .await?;
    let today = Utc::now().date_naive();
    let due = due_for_reminder(&subscriptions, today, state.config.reminder_days);

    if due.is_empty() {
        return Ok(Json(ReminderResponse { reminded: 0 }));
    }

    let (subject, html) = render_reminder_email(&due, today);
    state.email.send(to, &subject, &html).await?;

    tracing::info!(user_id = %session.user.id, count = due.len(), "Renewal reminder sent");
    Ok(Json(ReminderResponse {
        reminded: due.len(),
    }))
}

// ─── Support ─────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct SupportRequest {
    #[validate(length(min = 1, max = 200))]
    subject: String,
    #[validate(length(min = 1, max = 5000))]
    message: String,
}

/// Forward a support message to the support inbox.
async fn submit_support(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<ActiveSession>,
    Json(request): Json<SupportRequest>,
) -> Result<Json<MessageResponse>> {
    request.validate()?;

    let support_email = state
        .config
        .support_email
        .as_deref()
        .ok_or_else(|| AppError::NotConfigured("Support email address is not set".to_string()))?;

    let from = session.user.email.as_deref().unwrap_or("unknown");
    let html = format!(
        "<p><strong>From:</strong> {} ({})</p><p>{}</p>",
        escape_html(from),
        escape_html(&session.user.id),
        escape_html(&request.message).replace('\n', "<br>")
    );
    let subject = format!("[Support] {}", request.subject);

    state.email.send(support_email, &subject, &html).await?;

    tracing::info!(user_id = %session.user.id, "Support request submitted");
    Ok(Json(MessageResponse {
        message: "Support request sent".to_string(),
    }))
}
