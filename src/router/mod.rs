//! Tool router — dispatches calls to the backend that owns a tool.
//!
//! Resolution goes through the registry's read-only queries; the remote
//! call uses the backend's endpoint and payload mappings.

pub mod errors;
pub mod remote;
pub mod tool_router;
pub mod types;

pub use errors::{codes, DispatchError, RouterError};
pub use remote::{build_call_payload, call_remote_tool};
pub use tool_router::ToolRouter;
pub use types::{ToolCallResult, UNKNOWN_SERVER};
