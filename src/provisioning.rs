use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;

/// ProvisioningError
///
/// Failures of privileged calls against the external auth provider. These are the
/// only typed errors in the service: everything else degrades in place, but
/// account provisioning must distinguish "email taken" from transport trouble so
/// the admin screens can react correctly.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("auth provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email already registered with an active profile")]
    EmailTaken,

    #[error("auth provider rejected the request ({0})")]
    Rejected(u16),

    #[error("unexpected auth provider response: {0}")]
    Malformed(String),
}

/// Minimal shape of the provider's user object; only the canonical id matters here.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderUserList {
    #[serde(default)]
    users: Vec<ProviderUser>,
}

/// AuthProviderClient
///
/// Thin HTTP client for the auth provider's account endpoints. The provider is an
/// opaque collaborator: this client only creates/deletes identities, looks one up
/// by email, and triggers the password-recovery mail. Passwords pass straight
/// through and are never persisted or logged by this application.
pub struct AuthProviderClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl AuthProviderClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.auth_url.clone(),
            service_key: config.auth_service_key.clone(),
        }
    }

    /// Public self-registration. Returns the canonical user id the local account
    /// record must mirror.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Uuid, ProvisioningError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/signup", self.base_url))
            .header("apikey", &self.service_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            // The provider rejects duplicates and weak passwords with a client error.
            return Err(ProvisioningError::Rejected(response.status().as_u16()));
        }

        let user: ProviderUser = response
            .json()
            .await
            .map_err(|e| ProvisioningError::Malformed(e.to_string()))?;
        Ok(user.id)
    }

    /// Privileged create (admin provisioning screen). The identity is created
    /// pre-confirmed; verification is our own flag, not the provider's.
    ///
    /// When the email is already registered, the caller is expected to attempt
    /// orphan recovery via `find_user_by_email` before giving up.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<Uuid, ProvisioningError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/admin/users", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: ProviderUser = response
                    .json()
                    .await
                    .map_err(|e| ProvisioningError::Malformed(e.to_string()))?;
                Ok(user.id)
            }
            status if status.is_client_error() => Err(ProvisioningError::EmailTaken),
            status => Err(ProvisioningError::Rejected(status.as_u16())),
        }
    }

    /// Looks up an existing provider identity by email. Used to link orphan
    /// identities (present at the provider, missing a local account record).
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Uuid>, ProvisioningError> {
        let response = self
            .http
            .get(format!("{}/auth/v1/admin/users", self.base_url))
            .query(&[("email", email)])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProvisioningError::Rejected(response.status().as_u16()));
        }

        let list: ProviderUserList = response
            .json()
            .await
            .map_err(|e| ProvisioningError::Malformed(e.to_string()))?;

        let needle = email.trim().to_lowercase();
        Ok(list
            .users
            .into_iter()
            .find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.trim().to_lowercase() == needle)
            })
            .map(|u| u.id))
    }

    /// Privileged delete. An identity already gone at the provider is treated as
    /// success so local cleanup can proceed.
    pub async fn delete_user(&self, id: Uuid) -> Result<(), ProvisioningError> {
        let response = self
            .http
            .delete(format!("{}/auth/v1/admin/users/{}", self.base_url, id))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status if status == reqwest::StatusCode::NOT_FOUND => Ok(()),
            status => Err(ProvisioningError::Rejected(status.as_u16())),
        }
    }

    /// Triggers the provider's password-recovery email. Fire-and-forget from the
    /// caller's perspective; the provider owns the rest of the flow.
    pub async fn send_recovery(&self, email: &str) -> Result<(), ProvisioningError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/recover", self.base_url))
            .header("apikey", &self.service_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProvisioningError::Rejected(response.status().as_u16()))
        }
    }
}
