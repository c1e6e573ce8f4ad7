//! The shape the model is asked to return, and a non-fatal check against it.
//!
//! Model output is passed through unchanged. [`shape_warnings`] only reports
//! where a reply strays from the requested shape (unknown category, missing
//! keys) so callers can flag it; it never rewrites or rejects a result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of document categories named in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Invoice,
    MarketplaceListingScreenshot,
    ChatScreenshot,
    WebsiteScreenshot,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Invoice,
        Category::MarketplaceListingScreenshot,
        Category::ChatScreenshot,
        Category::WebsiteScreenshot,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Invoice => "invoice",
            Category::MarketplaceListingScreenshot => "marketplace_listing_screenshot",
            Category::ChatScreenshot => "chat_screenshot",
            Category::WebsiteScreenshot => "website_screenshot",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Read the category of a model reply, if it is one of the known labels.
pub fn category_of(value: &serde_json::Value) -> Option<Category> {
    value.get("category")?.as_str()?.parse().ok()
}

/// List the ways `value` differs from the requested object shape.
///
/// An empty list means the reply has a known `category`, an object
/// `extracted_content` and a string `description`.
pub fn shape_warnings(value: &serde_json::Value) -> Vec<String> {
    let Some(obj) = value.as_object() else {
        return vec![format!("expected a JSON object, got {}", json_kind(value))];
    };

    let mut warnings = Vec::new();

    match obj.get("category") {
        None => warnings.push("missing key 'category'".to_string()),
        Some(serde_json::Value::String(s)) => {
            if s.parse::<Category>().is_err() {
                warnings.push(format!(
                    "category '{s}' is not one of: {}",
                    Category::ALL.map(Category::as_str).join(", ")
                ));
            }
        }
        Some(other) => warnings.push(format!(
            "'category' should be a string, got {}",
            json_kind(other)
        )),
    }

    match obj.get("extracted_content") {
        None => warnings.push("missing key 'extracted_content'".to_string()),
        Some(v) if !v.is_object() => warnings.push(format!(
            "'extracted_content' should be an object, got {}",
            json_kind(v)
        )),
        Some(_) => {}
    }

    match obj.get("description") {
        None => warnings.push("missing key 'description'".to_string()),
        Some(v) if !v.is_string() => warnings.push(format!(
            "'description' should be a string, got {}",
            json_kind(v)
        )),
        Some(_) => {}
    }

    warnings
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
