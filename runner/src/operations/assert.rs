//! Assert action
//!
//! Polls the referenced object until it contains every field of the expected
//! document. The enclosing operation's timeout bounds the wait.

use crate::cluster::{ClientError, ClusterClient, Namespacer, ObjectKey};
use crate::operations::create::to_object;
use crate::operations::{Action, OperationError, POLL_INTERVAL};
use async_trait::async_trait;
use common::{template, Bindings};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Whether `actual` contains everything in `expected`
///
/// Objects match key by key, arrays element by element with equal length,
/// scalars by equality.
pub fn is_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => expected.iter().all(|(key, value)| {
            actual
                .get(key)
                .is_some_and(|actual| is_subset(value, actual))
        }),
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected
                    .iter()
                    .zip(actual)
                    .all(|(expected, actual)| is_subset(expected, actual))
        }
        (expected, actual) => expected == actual,
    }
}

pub struct AssertAction {
    client: Arc<dyn ClusterClient>,
    expected: Value,
    namespacer: Option<Namespacer>,
}

impl AssertAction {
    pub fn new(client: Arc<dyn ClusterClient>, expected: Value, namespacer: Option<Namespacer>) -> Self {
        Self {
            client,
            expected,
            namespacer,
        }
    }
}

#[async_trait]
impl Action for AssertAction {
    async fn exec(&self, bindings: Bindings) -> Result<Bindings, OperationError> {
        let expected = template::convert_value(&self.expected, &bindings)?;
        let mut object = to_object(expected.clone())?;
        if let Some(namespacer) = &self.namespacer {
            namespacer.apply(&mut object).await?;
        }
        let key = ObjectKey::from_object(&object)?;

        loop {
            match self.client.get(&key).await {
                Ok(actual) => {
                    let actual = serde_json::to_value(&actual)
                        .map_err(|e| OperationError::Assertion(e.to_string()))?;
                    if is_subset(&expected, &actual) {
                        info!(object = %key, "✅ Assertion holds");
                        return Ok(bindings);
                    }
                    debug!(object = %key, "Object does not match yet");
                }
                Err(ClientError::NotFound(_)) => debug!(object = %key, "Object not found yet"),
                Err(e) => return Err(e.into()),
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
