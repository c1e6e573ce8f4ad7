//! The extraction prompt sent alongside every document image.
//!
//! Kept in one place so prompt changes are a one-line diff and tests can
//! inspect the wording without a live model. Callers can replace it through
//! [`crate::config::ProcessorConfig::prompt`].

use crate::config::ProcessorConfig;

/// Default instruction asking the model for one classification JSON object.
pub const EXTRACTION_PROMPT: &str = "Analyze this document image. Identify its key entities, dates and relevant metadata, \
and answer with a single JSON object and nothing else: no explanations, no markdown, no code fences.\n\
The JSON object must have exactly three keys: \"category\", \"extracted_content\" and \"description\".\n\
1. \"category\": classify the document as exactly one of \"invoice\", \"marketplace_listing_screenshot\", \
\"chat_screenshot\", \"website_screenshot\" or \"other\". A photo of a physical item (a car, a lamp, a bicycle) \
with little or no surrounding text is most likely a marketplace_listing_screenshot, as is any image showing \
a model name, a price or a marketplace website address.\n\
2. \"extracted_content\": an object mapping entity names to values, e.g. names, dates, total amounts, \
item descriptions or addresses.\n\
3. \"description\": one sentence summarising what the document is for.";

/// The prompt to send: the configured override or [`EXTRACTION_PROMPT`].
pub fn extraction_prompt(config: &ProcessorConfig) -> &str {
    config.prompt.as_deref().unwrap_or(EXTRACTION_PROMPT)
}
