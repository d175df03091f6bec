//! Live terminal dashboard for multi-agent build pipelines.
//!
//! The backend pushes complete state snapshots over a WebSocket. This crate
//! keeps the latest one, derives progress, stuck and dependency views from
//! it against the wall clock, and renders them in the terminal.
//!
//! Data flows one way: [`connection`] → [`snapshot`] → [`derive`] →
//! [`view`] → [`ui`]. [`app`] wires those together for `watch`.

pub mod app;
pub mod config;
pub mod connection;
pub mod derive;
pub mod documents;
pub mod errors;
pub mod logging;
pub mod snapshot;
pub mod ui;
pub mod view;
