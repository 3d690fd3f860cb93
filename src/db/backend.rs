// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Managed backend row-store client with typed operations.
//!
//! Speaks the backend's REST dialect (`/rest/v1/<table>` with `column=eq.value`
//! filters). Every call carries the public `apikey` plus a bearer token: the
//! signed-in user's access token for their own rows, or the service-role key
//! for administrative lookups.

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::db::tables;
use crate::error::AppError;
use crate::models::{NewSubscription, Subscription, SubscriptionStatus, SubscriptionUpdate};

#[derive(Clone)]
struct BackendClient {
    http: reqwest::Client,
    rest_url: String,
    anon_key: String,
}

/// Backend database client.
#[derive(Clone)]
pub struct BackendDb {
    client: Option<BackendClient>,
}

/// Minimal user record from the `users` view.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendUserRecord {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Serialize)]
struct SubscriptionInsert<'a> {
    user_id: &'a str,
    status: SubscriptionStatus,
    #[serde(flatten)]
    fields: &'a NewSubscription,
}

#[derive(Serialize)]
struct SubscriptionPatch<'a> {
    #[serde(flatten)]
    update: &'a SubscriptionUpdate,
    updated_at: String,
}

impl BackendDb {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Some(BackendClient {
                http: reqwest::Client::new(),
                rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
                anon_key: anon_key.to_string(),
            }),
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Whether this client points at a real backend.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&BackendClient, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Backend("Backend not connected (offline mode)".to_string()))
    }

    // ─── Subscription Operations ─────────────────────────────────

    /// List a user's subscriptions, newest first.
    pub async fn list_subscriptions(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let client = self.get_client()?;
        let response = client
            .http
            .get(format!("{}/{}", client.rest_url, tables::SUBSCRIPTIONS))
            .header("apikey", &client.anon_key)
            .bearer_auth(access_token)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        check_response_json(response).await
    }

    /// Fetch one subscription owned by `user_id`.
    pub async fn get_subscription(
        &self,
        access_token: &str,
        user_id: &str,
        subscription_id: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let client = self.get_client()?;
        let response = client
            .http
            .get(format!("{}/{}", client.rest_url, tables::SUBSCRIPTIONS))
            .header("apikey", &client.anon_key)
            .bearer_auth(access_token)
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{}", subscription_id)),
                ("user_id", format!("eq.{}", user_id)),
            ])
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<Subscription> = check_response_json(response).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a new active subscription and return the stored row.
    pub async fn insert_subscription(
        &self,
        access_token: &str,
        user_id: &str,
        fields: &NewSubscription,
    ) -> Result<Subscription, AppError> {
        let client = self.get_client()?;
        let body = SubscriptionInsert {
            user_id,
            status: SubscriptionStatus::Active,
            fields,
        };

        let response = client
            .http
            .post(format!("{}/{}", client.rest_url, tables::SUBSCRIPTIONS))
            .header("apikey", &client.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<Subscription> = check_response_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Backend("Insert returned no rows".to_string()))
    }

    /// Apply a partial update and return the updated row.
    pub async fn update_subscription(
        &self,
        access_token: &str,
        user_id: &str,
        subscription_id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<Subscription, AppError> {
        let client = self.get_client()?;
        let body = SubscriptionPatch {
            update,
            updated_at: Utc::now().to_rfc3339(),
        };

        let response = client
            .http
            .patch(format!("{}/{}", client.rest_url, tables::SUBSCRIPTIONS))
            .header("apikey", &client.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(access_token)
            .query(&[
                ("id", format!("eq.{}", subscription_id)),
                ("user_id", format!("eq.{}", user_id)),
            ])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<Subscription> = check_response_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Subscription {}", subscription_id)))
    }

    /// Delete a subscription row. Whether the backend archives or purges is its
    /// own policy.
    pub async fn delete_subscription(
        &self,
        access_token: &str,
        user_id: &str,
        subscription_id: &str,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let response = client
            .http
            .delete(format!("{}/{}", client.rest_url, tables::SUBSCRIPTIONS))
            .header("apikey", &client.anon_key)
            .bearer_auth(access_token)
            .query(&[
                ("id", format!("eq.{}", subscription_id)),
                ("user_id", format!("eq.{}", user_id)),
            ])
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        check_response(response).await
    }

    // ─── Administrative Operations (service role) ────────────────

    /// Look up a user record by email.
    pub async fn find_user_by_email(
        &self,
        service_key: &str,
        email: &str,
    ) -> Result<Option<BackendUserRecord>, AppError> {
        let client = self.get_client()?;
        let url = format!(
            "{}/{}?select=id,email&email=eq.{}",
            client.rest_url,
            tables::USERS,
            urlencoding::encode(email)
        );

        let response = client
            .http
            .get(url)
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        let rows: Vec<BackendUserRecord> = check_response_json(response).await?;
        Ok(rows.into_iter().next())
    }

    /// Invoke a stored procedure with a JSON argument object.
    pub async fn call_procedure<B: Serialize>(
        &self,
        service_key: &str,
        procedure: &str,
        args: &B,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let response = client
            .http
            .post(format!("{}/rpc/{}", client.rest_url, procedure))
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .json(args)
            .send()
            .await
            .map_err(|e| AppError::Backend(e.to_string()))?;

        check_response(response).await
    }
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(status_error(response).await)
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Backend(format!("JSON parse error: {}", e)))
}

async fn status_error(response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.as_u16() == 401 || status.as_u16() == 403 {
        tracing::warn!(status = %status, "Backend rejected credentials");
        return AppError::Backend(format!("{}: {}", AppError::BACKEND_AUTH_ERROR, body));
    }

    AppError::Backend(format!("HTTP {}: {}", status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_errors() {
        let db = BackendDb::new_mock();
        assert!(!db.is_connected());

        let err = db.list_subscriptions("token", "user").await.unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
        assert!(!err.is_backend_auth_error());
    }

    #[test]
    fn test_insert_body_flattens_fields() {
        let fields = NewSubscription {
            name: "Hulu".to_string(),
            description: None,
            cost: 7.99,
            currency: "USD".to_string(),
            billing_cycle: crate::models::BillingCycle::Monthly,
            next_billing: chrono::NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            category: Some("Entertainment".to_string()),
            color: None,
        };
        let body = serde_json::to_value(SubscriptionInsert {
            user_id: "u1",
            status: SubscriptionStatus::Active,
            fields: &fields,
        })
        .unwrap();

        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["status"], "active");
        assert_eq!(body["name"], "Hulu");
        assert_eq!(body["billing_cycle"], "monthly");
    }
}
