//! Script evaluation and page bindings.

use serde_json::{json, Value};

use crate::cdp::error::CdpError;

use super::core::PageSession;

impl PageSession {
    /// Evaluate in the top frame and return the value by copy.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        self.runtime_evaluate(expression, None).await
    }

    /// Evaluate in the execution context `context_id`.
    pub async fn evaluate_in(&self, context_id: i64, expression: &str) -> Result<Value, CdpError> {
        self.runtime_evaluate(expression, Some(context_id)).await
    }

    async fn runtime_evaluate(&self, expression: &str, context_id: Option<i64>) -> Result<Value, CdpError> {
        let mut params = json!({
            "expression": expression,
            "returnByValue": true,
            "awaitPromise": true,
        });
        if let Some(id) = context_id {
            params["contextId"] = json!(id);
        }

        let mut reply = self.call("Runtime.evaluate", Some(params)).await?;
        if let Some(thrown) = reply.get("exceptionDetails") {
            return Err(CdpError::JavaScript(exception_text(thrown)));
        }
        Ok(reply
            .get_mut("result")
            .and_then(|result| result.get_mut("value"))
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({ "name": name })))
            .await
            .map(drop)
    }

    /// Install `source` for every future document. Returns the script identifier.
    pub async fn add_init_script(&self, source: &str) -> Result<String, CdpError> {
        let reply = self
            .call(
                "Page.addScriptToEvaluateOnNewDocument",
                Some(json!({ "source": source })),
            )
            .await?;
        match reply["identifier"].as_str() {
            Some(identifier) => Ok(identifier.to_string()),
            None => Err(CdpError::InvalidResponse(
                "addScriptToEvaluateOnNewDocument without identifier".to_string(),
            )),
        }
    }
}

/// Prefer the thrown value's description over the generic summary line.
fn exception_text(details: &Value) -> String {
    details["exception"]["description"]
        .as_str()
        .or_else(|| details["text"].as_str())
        .unwrap_or("uncaught exception")
        .to_string()
}
