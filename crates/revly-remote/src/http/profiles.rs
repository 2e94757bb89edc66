//! HTTP implementation of [`ProfileService`].

use serde_json::{Map, Value, json};
use uuid::Uuid;

use revly_core::RevlyResult;
use revly_core::models::profile::{Profile, UpdateProfile};
use revly_core::services::ProfileService;

use crate::client::RemoteClient;
use crate::error::RemoteError;

/// HTTP implementation of the profile lookup service against the
/// backend's row API.
#[derive(Debug, Clone)]
pub struct HttpProfileService {
    client: RemoteClient,
}

impl HttpProfileService {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

/// Build the wire body for a partial profile update. Tri-state fields
/// distinguish "set to null" from "leave unchanged" by emitting an
/// explicit JSON null only for the former.
fn update_body(input: &UpdateProfile) -> Value {
    let mut body = Map::new();
    if let Some(email) = &input.email {
        body.insert("email".into(), json!(email));
    }
    if let Some(full_name) = &input.full_name {
        body.insert("full_name".into(), json!(full_name));
    }
    Value::Object(body)
}

impl ProfileService for HttpProfileService {
    async fn fetch(&self, user_id: Uuid) -> RevlyResult<Option<Profile>> {
        let response = self
            .client
            .http()
            .get(self.client.url(&format!(
                "/rest/v1/profiles?id=eq.{user_id}&select=*"
            )))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        let rows: Vec<Profile> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn update(&self, user_id: Uuid, input: UpdateProfile) -> RevlyResult<Profile> {
        let response = self
            .client
            .http()
            .patch(self.client.url(&format!("/rest/v1/profiles?id=eq.{user_id}")))
            .header("Prefer", "return=representation")
            .json(&update_body(&input))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        let rows: Vec<Profile> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        rows.into_iter().next().ok_or_else(|| {
            RemoteError::NotFound {
                entity: "profile".into(),
                id: user_id.to_string(),
            }
            .into()
        })
    }
}
