//! HTTP implementation of [`TenantService`].

use serde_json::{Map, Value, json};
use uuid::Uuid;

use revly_core::RevlyResult;
use revly_core::models::metrics::TenantMetrics;
use revly_core::models::tenant::{CreateTenant, Tenant, UpdateTenant};
use revly_core::services::TenantService;

use crate::client::RemoteClient;
use crate::error::RemoteError;

/// HTTP implementation of the tenant service against the backend's
/// row API and RPC endpoints.
#[derive(Debug, Clone)]
pub struct HttpTenantService {
    client: RemoteClient,
}

impl HttpTenantService {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    async fn single_row(
        response: reqwest::Response,
        id: Uuid,
    ) -> Result<Tenant, RemoteError> {
        let rows: Vec<Tenant> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        rows.into_iter().next().ok_or_else(|| RemoteError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })
    }
}

fn update_body(input: &UpdateTenant) -> Value {
    let mut body = Map::new();
    if let Some(name) = &input.name {
        body.insert("name".into(), json!(name));
    }
    if let Some(domain) = &input.domain {
        body.insert("domain".into(), json!(domain));
    }
    if let Some(status) = &input.status {
        body.insert("status".into(), json!(status));
    }
    if let Some(plan) = &input.plan {
        body.insert("plan".into(), json!(plan));
    }
    if let Some(settings) = &input.settings {
        body.insert("settings".into(), json!(settings));
    }
    Value::Object(body)
}

impl TenantService for HttpTenantService {
    async fn current_for(&self, user_id: Uuid) -> RevlyResult<Option<Tenant>> {
        let response = self
            .client
            .http()
            .post(self.client.url("/rest/v1/rpc/current_tenant"))
            .json(&json!({ "user_id": user_id }))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        // The RPC returns the tenant row, or JSON null for a principal
        // with no tenant assignment — a valid state, not an error.
        let row: Option<Tenant> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(row)
    }

    async fn list_all(&self) -> RevlyResult<Vec<Tenant>> {
        let response = self
            .client
            .http()
            .get(self.client.url("/rest/v1/tenants?select=*&order=created_at.asc"))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        let rows: Vec<Tenant> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> RevlyResult<Tenant> {
        let response = self
            .client
            .http()
            .get(self.client.url(&format!("/rest/v1/tenants?id=eq.{id}&select=*")))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        Ok(Self::single_row(response, id).await?)
    }

    async fn metrics(&self, tenant_id: Uuid) -> RevlyResult<TenantMetrics> {
        let response = self
            .client
            .http()
            .post(self.client.url("/rest/v1/rpc/tenant_metrics"))
            .json(&json!({ "tenant_id": tenant_id }))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        let metrics: TenantMetrics = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(metrics)
    }

    async fn create(&self, input: CreateTenant) -> RevlyResult<Tenant> {
        let response = self
            .client
            .http()
            .post(self.client.url("/rest/v1/tenants"))
            .header("Prefer", "return=representation")
            .json(&input)
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        let rows: Vec<Tenant> = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        rows.into_iter().next().ok_or_else(|| {
            RemoteError::Decode("create returned no representation".into()).into()
        })
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> RevlyResult<Tenant> {
        let response = self
            .client
            .http()
            .patch(self.client.url(&format!("/rest/v1/tenants?id=eq.{id}")))
            .header("Prefer", "return=representation")
            .json(&update_body(&input))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let response = RemoteClient::check(response).await?;
        Ok(Self::single_row(response, id).await?)
    }

    async fn delete(&self, id: Uuid) -> RevlyResult<()> {
        let response = self
            .client
            .http()
            .delete(self.client.url(&format!("/rest/v1/tenants?id=eq.{id}")))
            .send()
            .await
            .map_err(RemoteError::from)?;

        RemoteClient::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revly_core::models::tenant::TenantStatus;

    #[test]
    fn update_body_serializes_only_set_fields() {
        let body = update_body(&UpdateTenant {
            status: Some(TenantStatus::Suspended),
            ..Default::default()
        });
        assert_eq!(body, json!({ "status": "suspended" }));
    }

    #[test]
    fn update_body_clears_domain_with_explicit_null() {
        let body = update_body(&UpdateTenant {
            domain: Some(None),
            ..Default::default()
        });
        assert_eq!(body, json!({ "domain": null }));
    }
}
