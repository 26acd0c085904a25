//! Domain layer: document model and template edits
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod document;
pub mod error;
pub mod params;
pub mod template;

pub use document::{Element, XmlDocument, XmlNode};
pub use error::{DomainError, DomainResult};
pub use params::{format_decimal, GeneratorParams, OptionalSensor};
pub use template::{BlockPlacement, PhyphoxTemplate, SensorBlock, PHYPHOX_NAMESPACE};

/// Expand `~`, `$VAR` and `${VAR}` in a path-like string.
///
/// Returns the input unchanged if a variable cannot be resolved.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
