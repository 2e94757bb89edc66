//! HTTP implementation of [`IdentityService`].

use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use revly_core::RevlyResult;
use revly_core::models::session::Session;
use revly_core::models::user::{SignUpAttrs, User};
use revly_core::services::{AuthedSession, IdentityService};

use crate::client::RemoteClient;
use crate::error::RemoteError;

/// Wire-side session shape. The backend reports a relative lifetime;
/// the domain type carries the absolute expiry.
#[derive(Debug, Deserialize)]
struct SessionRow {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: User,
}

impl SessionRow {
    fn into_authed(self) -> AuthedSession {
        AuthedSession {
            session: Session {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at: Utc::now() + Duration::seconds(self.expires_in),
            },
            user: self.user,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignUpRow {
    user: User,
}

/// HTTP implementation of the identity service.
#[derive(Debug, Clone)]
pub struct HttpIdentityService {
    client: RemoteClient,
}

impl HttpIdentityService {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

impl IdentityService for HttpIdentityService {
    async fn sign_in(&self, email: &str, password: &str) -> RevlyResult<AuthedSession> {
        let response = self
            .client
            .http()
            .post(self.client.url("/auth/v1/token?grant_type=password"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(RemoteError::from)?;

        // Credential rejections come back as 400 from the token
        // endpoint; surface them as authentication failures.
        let response = match RemoteClient::check(response).await {
            Ok(response) => response,
            Err(RemoteError::Api { status: 400, message }) => {
                return Err(RemoteError::Unauthorized(message).into());
            }
            Err(e) => return Err(e.into()),
        };

        let row: SessionRow = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(row.into_authed())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        attrs: SignUpAttrs,
    ) -> RevlyResult<User> {
        let response = self
            .client
            .http()
            .post(self.client.url("/auth/v1/signup"))
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": attrs.full_name },
            }))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        let row: SignUpRow = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(row.user)
    }

    async fn sign_out(&self, access_token: &str) -> RevlyResult<()> {
        let response = self
            .client
            .http()
            .post(self.client.url("/auth/v1/logout"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(RemoteError::from)?;

        RemoteClient::check(response).await?;
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> RevlyResult<Option<AuthedSession>> {
        let response = self
            .client
            .http()
            .get(self.client.url("/auth/v1/session"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(RemoteError::from)?;

        // An invalid or expired token is "no session", not an error.
        let response = match RemoteClient::check(response).await {
            Ok(response) => response,
            Err(RemoteError::Unauthorized(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let row: SessionRow = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(Some(row.into_authed()))
    }

    async fn refresh_session(&self, refresh_token: &str) -> RevlyResult<AuthedSession> {
        let response = self
            .client
            .http()
            .post(self.client.url("/auth/v1/token?grant_type=refresh_token"))
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        let row: SessionRow = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(row.into_authed())
    }
}
