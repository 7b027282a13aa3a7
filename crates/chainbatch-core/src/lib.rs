//! chainbatch-core — batch validation and dispatch for validator requests.
//!
//! # Overview
//!
//! Consolidation, credential-switch and exit requests are normally sent one
//! at a time to the EIP-7251 and EIP-7002 system contracts. This crate
//! batches them:
//!
//! - [`BatchGuard`] — batch-level gate (caller, size, target, fee); fatal on failure
//! - [`validator`] — pure per-item checks returning a [`FailureReason`]
//! - [`codec`] — packed request payloads for the system contracts
//! - [`fee`] — fee probe with floor fallback and the batch fee models
//! - [`Dispatcher`] — sequential continue-on-error dispatch loop
//! - [`BatchEngine`] — the `batch_consolidation` / `batch_switch` / `batch_exit` entry points
//! - [`RequestEndpoint`] — the downstream contract seam, with [`MemoryEndpoint`] for tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use alloy_primitives::{Address, U256};
//! use chainbatch_core::{BatchEngine, CallContext, EngineConfig, ExitItem, MemoryEndpoint};
//!
//! # async fn run() {
//! let account = Address::repeat_byte(0x01);
//! let consolidation = MemoryEndpoint::new("consolidation", Address::repeat_byte(0x02), U256::from(1));
//! let exit = MemoryEndpoint::new("exit", Address::repeat_byte(0x03), U256::from(1));
//! let engine = BatchEngine::new(&EngineConfig::new(account), Arc::new(consolidation), Arc::new(exit));
//!
//! let ctx = CallContext::new(account, U256::from(1));
//! let report = engine
//!     .batch_exit(&ctx, &[ExitItem::new(vec![0u8; 48], 0, true)])
//!     .await
//!     .unwrap();
//! println!("{report}");
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod fee;
pub mod guard;
pub mod memory;
pub mod outcome;
pub mod types;
pub mod validator;

pub use config::EngineConfig;
pub use dispatcher::{Dispatchable, Dispatcher};
pub use endpoint::RequestEndpoint;
pub use engine::BatchEngine;
pub use error::{BatchError, EndpointError};
pub use fee::FeeModel;
pub use guard::{Admission, BatchGuard};
pub use memory::MemoryEndpoint;
pub use outcome::{BatchReport, FailureReason, FailureRecord, Outcome};
pub use types::{
    BatchKind, CallContext, ConsolidationItem, EndpointKind, ExitItem, Gwei, PubKey, SwitchItem,
};
