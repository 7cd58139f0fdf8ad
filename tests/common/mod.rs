#![allow(dead_code)]

use async_trait::async_trait;
use cogscreen::error::ServiceError;
use cogscreen::services::llm::types::OperationKind;
use cogscreen::services::llm::ReasoningService;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

enum Reply {
    Ok(Value),
    Status(u16),
}

/// Reasoning service that answers from a per-operation queue and records every payload.
#[derive(Default)]
pub struct ScriptedService {
    replies: Mutex<HashMap<OperationKind, VecDeque<Reply>>>,
    calls: Mutex<Vec<(OperationKind, Value)>>,
}

impl ScriptedService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, operation: OperationKind, result: Value) {
        self.push(operation, Reply::Ok(result));
    }

    pub fn fail(&self, operation: OperationKind) {
        self.push(operation, Reply::Status(500));
    }

    pub fn calls(&self) -> Vec<(OperationKind, Value)> {
        self.calls.lock().clone()
    }

    pub fn payloads_for(&self, operation: OperationKind) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    fn push(&self, operation: OperationKind, reply: Reply) {
        self.replies.lock().entry(operation).or_default().push_back(reply);
    }
}

#[async_trait]
impl ReasoningService for ScriptedService {
    async fn invoke(&self, operation: OperationKind, payload: Value) -> Result<Value, ServiceError> {
        self.calls.lock().push((operation, payload));
        let next = self
            .replies
            .lock()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Status(code)) => Err(ServiceError::Status(code)),
            None => Err(ServiceError::Unavailable("no scripted reply".into())),
        }
    }
}

pub fn as_service(service: &Arc<ScriptedService>) -> Arc<dyn ReasoningService> {
    service.clone()
}

pub fn risk_reply(score: f64) -> Value {
    json!({
        "riskScore": score,
        "riskFactors": "Slower recall than expected",
        "recommendations": "Repeat the screening in three months",
    })
}

pub fn speech_reply(indicators: &str) -> Value {
    json!({ "cognitiveDeclineIndicators": indicators })
}
