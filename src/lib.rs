// Library root
// -----------
// Client for the Ada data-matching service. The binary (`main.rs`) builds
// an `AdaConfig` from flags and environment variables and hands it to the
// modules below.
//
// Module responsibilities:
// - `api`: HTTP calls against the service (login, upload, trigger) and the
//   records they return.
// - `config`: the explicit configuration passed into the client.
// - `error`: the typed errors every call returns instead of exiting.
// - `ui`: the command line flow (upload then trigger) with a spinner and
//   an optional password prompt.
pub mod api;
pub mod config;
pub mod error;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{monitor_url, AdaClient, Session, Trigger, TriggerAction, Upload};
pub use config::AdaConfig;
pub use error::{AdaError, Call, ParseTriggerActionError};
