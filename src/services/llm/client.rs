use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::types::OperationKind;
use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// Transport to the external reasoning service. One request, one response, no state.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn invoke(&self, operation: OperationKind, payload: Value) -> Result<Value, ServiceError>;
}

/// Flow-server transport: `POST {base_url}/{flow}` with `{"data": ..}`, answered by `{"result": ..}`.
#[derive(Clone)]
pub struct HttpReasoningService {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct FlowResponse {
    result: Option<Value>,
}

impl HttpReasoningService {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs)) // Network-level timeout
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, operation: OperationKind) -> String {
        format!("{}/{}", self.base_url, operation.flow_name())
    }
}

#[async_trait]
impl ReasoningService for HttpReasoningService {
    async fn invoke(&self, operation: OperationKind, payload: Value) -> Result<Value, ServiceError> {
        let url = self.endpoint(operation);
        debug!(operation = operation.label(), %url, "dispatching flow request");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "data": payload }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }

        let body: FlowResponse = response.json().await?;
        body.result.ok_or(ServiceError::MissingResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_flow_name_without_double_slash() {
        let config = ServiceConfig {
            base_url: "http://localhost:3400/".to_string(),
            timeout_secs: 5,
        };
        let service = HttpReasoningService::new(&config).unwrap();
        assert_eq!(
            service.endpoint(OperationKind::RiskScoring),
            "http://localhost:3400/generateDementiaRiskScoreFlow"
        );
    }
}
