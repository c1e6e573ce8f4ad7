//! Configuration types for document processing.
//!
//! All processing behaviour is controlled through [`ProcessorConfig`], built
//! via its [`ProcessorConfigBuilder`]. The bearer credential is part of the
//! config, so it is read once when the config is built instead of being looked
//! up from the environment on every call. Tests inject fake keys and mock
//! endpoints the same way.

use crate::error::DocprocError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Chat-completions endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Vision model used when none is configured.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-image-preview";

/// Value of the `HTTP-Referer` attribution header.
pub const DEFAULT_REFERER: &str = "http://localhost:8501";

/// Value of the `X-Title` attribution header.
pub const DEFAULT_APP_TITLE: &str = "VLM Document Processor";

/// Environment variable holding the bearer credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Configuration for a document processing run.
///
/// Built via [`ProcessorConfig::builder()`] or using
/// [`ProcessorConfig::default()`].
///
/// # Example
/// ```rust
/// use vlm_docproc::ProcessorConfig;
///
/// let config = ProcessorConfig::builder()
///     .api_key("sk-or-...")
///     .dpi(150)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ProcessorConfig {
    /// Bearer credential for the inference endpoint. `None` makes every
    /// file fail with [`crate::error::FileError::MissingApiKey`].
    pub api_key: Option<String>,

    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,

    /// Model identifier sent in the request body.
    pub model: String,

    /// `HTTP-Referer` header sent for upstream attribution.
    pub referer: String,

    /// `X-Title` header sent for upstream attribution.
    pub app_title: String,

    /// Replacement for [`crate::prompts::EXTRACTION_PROMPT`]. Default: None.
    pub prompt: Option<String>,

    /// Rendering DPI for the first PDF page. Range: 72–400. Default: 200.
    ///
    /// 200 DPI keeps receipt-sized print legible to the model.
    pub dpi: u32,

    /// Cap on either edge of the rendered page, in pixels. Default: 2400.
    ///
    /// Keeps a poster-sized PDF from producing a huge upload.
    pub max_rendered_pixels: u32,

    /// Per-request timeout in seconds. Default: None (transport default).
    pub api_timeout_secs: Option<u64>,

    /// Explicit path to the pdfium shared library. Default: None.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Receives per-file events while a batch runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            prompt: None,
            dpi: 200,
            max_rendered_pixels: 2400,
            api_timeout_secs: None,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("app_title", &self.app_title)
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ProcessorConfig {
    /// Create a new builder for `ProcessorConfig`.
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default config with the credential taken from `OPENROUTER_API_KEY`.
    ///
    /// The variable is read once, here. An empty value counts as absent.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()),
            ..Self::default()
        }
    }

    /// The configured credential, ignoring blank strings.
    pub fn bearer_token(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Builder for [`ProcessorConfig`].
#[derive(Debug)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.config.referer = referer.into();
        self
    }

    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.config.app_title = title.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessorConfig, DocprocError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(DocprocError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if !c.endpoint.starts_with("http://") && !c.endpoint.starts_with("https://") {
            return Err(DocprocError::InvalidConfig(format!(
                "Endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(DocprocError::InvalidConfig("Model must not be empty".into()));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(DocprocError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_endpoint() {
        let c = ProcessorConfig::default();
        assert_eq!(c.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.dpi, 200);
        assert!(c.api_key.is_none());
        assert!(c.api_timeout_secs.is_none());
    }

    #[test]
    fn builder_rejects_out_of_range_dpi() {
        let err = ProcessorConfig::builder().dpi(10).build().unwrap_err();
        assert!(err.to_string().contains("DPI"), "got: {err}");
    }

    #[test]
    fn builder_rejects_non_http_endpoint() {
        let err = ProcessorConfig::builder()
            .endpoint("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Endpoint"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let c = ProcessorConfig::builder().api_key("   ").build().unwrap();
        assert_eq!(c.bearer_token(), None);

        let c = ProcessorConfig::builder().api_key("sk-test").build().unwrap();
        assert_eq!(c.bearer_token(), Some("sk-test"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ProcessorConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
