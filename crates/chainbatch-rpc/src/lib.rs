//! chainbatch-rpc — JSON-RPC backed request endpoints.
//!
//! [`RpcEndpoint`] implements `chainbatch_core::RequestEndpoint` against an
//! Ethereum node: fee probes are `eth_call`s, requests are
//! `eth_sendTransaction`s signed by the node for the executing account.
//! [`HttpRpcClient`] is the default [`RpcTransport`].

pub mod client;
pub mod endpoint;
pub mod error;
pub mod request;

pub use client::{HttpRpcClient, RpcTransport};
pub use endpoint::{RpcEndpoint, RpcEndpointConfig};
pub use error::RpcError;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, TransactionRequest};
