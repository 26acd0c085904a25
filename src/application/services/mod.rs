//! Application services

pub mod generator;

pub use generator::{PhyphoxGenerator, MIME_GENERATED, MIME_PASSTHROUGH};
