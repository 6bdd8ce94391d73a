//! Remote tool invocation using a backend's own calling convention.
//!
//! Backend-agnostic: the caller fills in `server_name` on the result.

use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;

use super::errors::DispatchError;
use super::types::ToolCallResult;
use crate::config::{BackendDescriptor, PayloadMap};

/// Key holding the tool's output in a backend's call response.
const RESULT_FIELD: &str = "result";

/// Build the outbound body `{ tool_field: tool, args_field: arguments }`.
pub fn build_call_payload(map: &PayloadMap, tool_name: &str, arguments: &Value) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(
        map.tool_field().to_string(),
        Value::String(tool_name.to_string()),
    );
    body.insert(map.args_field().to_string(), arguments.clone());
    Value::Object(body)
}

/// POST a tool call to `descriptor` and normalise the answer.
pub async fn call_remote_tool(
    http: &HttpClient,
    descriptor: &BackendDescriptor,
    tool_name: &str,
    arguments: &Value,
) -> ToolCallResult {
    match send_call(http, descriptor, tool_name, arguments).await {
        Ok(result) => ToolCallResult::succeeded(result),
        Err(err) => ToolCallResult::failed(&err),
    }
}

async fn send_call(
    http: &HttpClient,
    descriptor: &BackendDescriptor,
    tool_name: &str,
    arguments: &Value,
) -> Result<Option<Value>, DispatchError> {
    let payload = build_call_payload(&descriptor.payload_map, tool_name, arguments);

    let response = http
        .post(descriptor.call_url())
        .timeout(descriptor.timeout_duration())
        .json(&payload)
        .send()
        .await
        .map_err(|e| DispatchError::from_reqwest(&e, descriptor.timeout))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(DispatchError::RemoteHttp {
            status: status.as_u16(),
        });
    }

    let mut body: Value = response
        .json()
        .await
        .map_err(|e| DispatchError::from_reqwest(&e, descriptor.timeout))?;

    Ok(body.get_mut(RESULT_FIELD).map(Value::take))
}
