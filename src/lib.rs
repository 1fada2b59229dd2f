//! aesbatch - batch file encryption with graceful cancellation.
//!
//! - [`key`] obtains the secret from a password, a key file or the terminal
//! - [`file`] maps inputs to outputs and cleans up partial output
//! - [`worker`] runs the engine on a cancellable background thread
//! - [`processor`] drives a whole batch, stopping at the first failure
//! - [`engine`] streams AES-256-GCM encryption behind the [`engine::Engine`] trait

pub mod app;
pub mod cipher;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod file;
pub mod key;
pub mod processor;
pub mod secret;
pub mod types;
pub mod ui;
pub mod worker;
