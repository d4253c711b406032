//! Error type for node RPC exchanges.
use thiserror::Error;

/// Failure of a JSON-RPC exchange with the node.
///
/// Trait impls on [`NodeClient`](crate::NodeClient) fold these into the
/// capability error kinds; callers of the inherent methods see them
/// directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The node answered with a JSON-RPC error object.
    #[error("node rejected call: {message} (code {code})")]
    Node { code: i32, message: String },
    /// The request never completed.
    #[error("node transport failed: {0}")]
    Transport(String),
    /// The node answered with data this client cannot interpret.
    #[error("malformed node response: {0}")]
    InvalidResponse(String),
    /// A request parameter could not be serialized.
    #[error("invalid request parameter: {0}")]
    Params(String),
}
