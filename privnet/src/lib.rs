//! privnet: lifecycle and instance membership of remote private networks.
//!
//! The controller reconciles a declared [`state::NetworkSpec`] against the
//! remote API:
//! - computes membership changes ([`reconciler::plan`])
//! - enables private networking on instances with bounded retry
//! - assigns/unassigns instances, removals first
//! - refreshes recorded [`state::NetworkState`] after every mutation

pub mod clients;
pub mod config;
pub mod controller;
pub mod error;
pub mod reconciler;
pub mod state;

pub use clients::{ApiClient, NetworkApi};
pub use config::{ClientConfig, ControllerConfig};
pub use controller::{DeleteOutcome, DrainFailure, NetworkController};
pub use error::{ApiError, ControllerError, ErrorKind};
pub use reconciler::retry::RetryPolicy;
pub use state::{NetworkSpec, NetworkState};
