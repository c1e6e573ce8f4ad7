//! Pipeline stages for document extraction.
//!
//! Each submodule implements exactly one step, so each is testable without
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ normalize ──▶ encode ──▶ vlm ──▶ parse
//! (sniff)    (pdfium)     (base64)   (POST)   (fences → JSON)
//! ```
//!
//! 1. [`intake`]    — read a local file and detect its media type
//! 2. [`normalize`] — rasterise the first PDF page to PNG; images pass
//!    through. Runs pdfium in `spawn_blocking`
//! 3. [`encode`]    — wrap the image bytes in a base64 data URI
//! 4. [`vlm`]       — the chat-completions call; the only stage with network I/O
//! 5. [`parse`]     — strip JSON fences and parse the model's reply

pub mod encode;
pub mod intake;
pub mod normalize;
pub mod parse;
pub mod vlm;
