//! # vlm-docproc
//!
//! Classify documents and extract their key entities as JSON using a Vision
//! Language Model (VLM).
//!
//! Upload a PDF, PNG or JPEG; PDFs are rasterised (first page) to PNG, the
//! image is sent with a fixed extraction prompt to a chat-completions
//! endpoint (OpenRouter by default), and the model's JSON reply comes back
//! with `category`, `extracted_content` and `description` keys, ready to
//! export as `<file>_output.json`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (bytes + media type)
//!  │
//!  ├─ 1. Normalise  PDF → PNG of page 1 via pdfium; images unchanged
//!  ├─ 2. Encode     base64 data URI
//!  ├─ 3. VLM        one POST, bearer auth, no retry
//!  ├─ 4. Parse      strip ```json fences, parse JSON
//!  └─ 5. Present    FileResult + optional indented-JSON export
//! ```
//!
//! Files in a batch run one after another; one file's failure never stops
//! the rest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vlm_docproc::{DocumentProcessor, ProcessorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read once from OPENROUTER_API_KEY
//!     let processor = DocumentProcessor::new(ProcessorConfig::from_env())?;
//!     let bytes = std::fs::read("invoice.pdf")?;
//!     let result = processor.process(&bytes, "application/pdf", "invoice.pdf").await;
//!     match result.into_result() {
//!         Ok(json) => println!("{json:#}"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docproc` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod extraction;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ProcessorConfig, ProcessorConfigBuilder};
pub use error::{DocprocError, FileError};
pub use export::{export_file_name, Export};
pub use extraction::{shape_warnings, Category};
pub use output::{BatchOutput, BatchStats, FileResult, UploadedFile, VlmResult};
pub use pipeline::normalize::{normalize, NormalizedImage};
pub use pipeline::vlm::VlmClient;
pub use process::{process_sync, DocumentProcessor};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::EXTRACTION_PROMPT;
pub use stream::{process_stream, FileStream};
