//! phyphox-mqtt: customized phyphox MQTT-connector experiment files
//!
//! Layers (inner to outer): `domain` (document model and template edits),
//! `application` (generator service), `infrastructure` (filesystem, wiring),
//! `cli` (argument parsing and dispatch).

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
