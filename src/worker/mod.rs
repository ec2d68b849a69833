// src/worker/mod.rs

//! The worker side of the remote execution contract.
//!
//! A worker is a small TCP service that runs shell commands for the
//! coordinator. The coordinator's client lives in
//! [`crate::exec::remote::TcpRemoteExecutor`].

pub mod codec;
pub mod protocol;
pub mod server;

pub use codec::{ClientCodec, ServerCodec, WireCodec};
pub use protocol::{WorkerRequest, WorkerResponse};
pub use server::WorkerServer;
