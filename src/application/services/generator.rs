//! Phyphox template generator service
//!
//! Loads the base template fresh on every call, applies the user's settings
//! and returns the serialized document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{GeneratorParams, PhyphoxTemplate, XmlDocument};
use crate::infrastructure::traits::FileSystem;

/// MIME type for generated experiment files.
pub const MIME_GENERATED: &str = "application/octet-stream";

/// MIME type for the unmodified template.
pub const MIME_PASSTHROUGH: &str = "application/xml";

/// Service turning the base template plus [`GeneratorParams`] into a `.phyphox` file.
pub struct PhyphoxGenerator {
    fs: Arc<dyn FileSystem>,
    template_path: PathBuf,
    namespace: String,
}

impl PhyphoxGenerator {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        template_path: impl Into<PathBuf>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            template_path: template_path.into(),
            namespace: namespace.into(),
        }
    }

    pub fn from_settings(fs: Arc<dyn FileSystem>, settings: &Settings) -> Self {
        Self::new(fs, settings.template_path.clone(), settings.namespace.clone())
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Generate a customized experiment file.
    ///
    /// Fails with [`ApplicationError::TemplateMissing`] if the template does not
    /// exist, and with [`ApplicationError::Transformation`] for anything else.
    /// No bytes are produced on failure.
    #[instrument(skip(self), fields(template = %self.template_path.display()))]
    pub fn generate(&self, params: &GeneratorParams) -> ApplicationResult<Vec<u8>> {
        let mut template = PhyphoxTemplate::new(self.load()?);
        template.customize(params);

        let bytes = template
            .document()
            .to_bytes()
            .map_err(|e| ApplicationError::transformation("serialize document", e))?;
        info!(
            "generated {} ({} bytes, sensors: {:?})",
            params.file_name(),
            bytes.len(),
            params.enabled_sensors()
        );
        Ok(bytes)
    }

    /// The base template exactly as stored.
    #[instrument(skip(self), fields(template = %self.template_path.display()))]
    pub fn passthrough(&self) -> ApplicationResult<Vec<u8>> {
        self.ensure_template()?;
        self.fs
            .read(&self.template_path)
            .with_path_context("read template", &self.template_path)
    }

    fn ensure_template(&self) -> ApplicationResult<()> {
        if self.fs.is_file(&self.template_path) {
            Ok(())
        } else {
            Err(ApplicationError::TemplateMissing(self.template_path.clone()))
        }
    }

    fn load(&self) -> ApplicationResult<XmlDocument> {
        self.ensure_template()?;
        let text = self
            .fs
            .read_to_string(&self.template_path)
            .with_path_context("read template", &self.template_path)?;
        debug!("load: read {} bytes", text.len());

        XmlDocument::parse(&text, &self.namespace).map_err(|e| {
            ApplicationError::transformation(
                format!("parse template {}", self.template_path.display()),
                e,
            )
        })
    }
}
