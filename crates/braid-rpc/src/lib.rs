//! # braid-rpc
//! JSON-RPC plumbing for talking to a braid node.
//!
//! [`NodeClient`] implements the ledger-query, signer, broadcaster, and
//! assembler capabilities from [`braid_core::traits`] over HTTP, and
//! additionally exposes the node wallet's address listing. The [`json`]
//! module holds the wire DTOs and the hex bincode transaction codec.

pub mod client;
pub mod error;
pub mod json;

pub use client::NodeClient;
pub use error::RpcError;
