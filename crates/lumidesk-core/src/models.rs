//! Core data models shared by the retrieval and answering pipeline.
//!
//! These types describe what flows through one user turn: items returned by
//! the retriever, the citations and context derived from them, and the
//! role-tagged messages sent to the completion service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse topical tag attached to every indexed chunk at ingestion time.
///
/// `Unknown` doubles as "no filter" when passed to retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Company,
    Customer,
    Service,
    #[default]
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Company => "company",
            Category::Customer => "customer",
            Category::Service => "service",
            Category::Unknown => "unknown",
        }
    }

    /// Returns the category as a retrieval filter, or `None` for `Unknown`.
    pub fn as_filter(self) -> Option<Category> {
        match self {
            Category::Unknown => None,
            other => Some(other),
        }
    }

    /// Infer a category from a document path such as `data/service/refund.pdf`.
    ///
    /// Matches on the `/company/`, `/customer/`, and `/service/` directory
    /// segments; backslashes are treated as separators.
    pub fn from_source_path(source: &str) -> Category {
        let normalized = format!("/{}", source.replace('\\', "/"));
        if normalized.contains("/company/") {
            Category::Company
        } else if normalized.contains("/customer/") {
            Category::Customer
        } else if normalized.contains("/service/") {
            Category::Service
        } else {
            Category::Unknown
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

    /// Parses a category name. Unrecognized names map to an error so that CLI
    /// input is validated; stored metadata uses [`Category::from_source_path`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "company" => Ok(Category::Company),
            "customer" => Ok(Category::Customer),
            "service" => Ok(Category::Service),
            "unknown" | "" => Ok(Category::Unknown),
            other => Err(format!(
                "unknown category '{}': expected company, customer, service, or unknown",
                other
            )),
        }
    }
}

/// Metadata stored alongside every indexed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// Path of the source PDF relative to the data root's parent (`data/service/x.pdf`).
    pub source: String,
    /// Raw 0-based page number, when the source provides one.
    pub page: Option<u32>,
    pub category: Category,
}

/// One ranked hit from the retriever. Lower `score` means more relevant
/// under distance semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedItem {
    pub text: String,
    pub metadata: ItemMetadata,
    pub score: f64,
}

/// Provenance record for one retrieved context segment.
///
/// `index` is 1-based and matches the position of the segment in
/// [`RetrievalResult::context`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub index: usize,
    pub category: Category,
    pub source: String,
    /// 1-based page number, or `None` when the source had no page.
    pub page: Option<u32>,
    pub quote: String,
    pub score: Option<f64>,
}

/// Output of [`assemble`](crate::assemble::assemble): the joined context, its
/// citations, and the best score across all hits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub context: String,
    pub citations: Vec<Citation>,
    pub best_score: Option<f64>,
}

impl RetrievalResult {
    /// True when the context holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.context.trim().is_empty()
    }
}

/// Role tag for completion messages and conversation history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single role-tagged message. Built fresh for each completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A contact address found in citation quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub value: String,
    /// File name of the citation's source (no directory).
    pub source: String,
    pub page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_path() {
        assert_eq!(
            Category::from_source_path("data/service/解約.pdf"),
            Category::Service
        );
        assert_eq!(
            Category::from_source_path("data\\company\\about.pdf"),
            Category::Company
        );
        assert_eq!(
            Category::from_source_path("customer/profile.pdf"),
            Category::Customer
        );
        assert_eq!(Category::from_source_path("data/misc.pdf"), Category::Unknown);
    }

    #[test]
    fn category_parse_and_filter() {
        assert_eq!("Service".parse::<Category>().unwrap(), Category::Service);
        assert!("billing".parse::<Category>().is_err());
        assert_eq!(Category::Unknown.as_filter(), None);
        assert_eq!(Category::Company.as_filter(), Some(Category::Company));
    }

    #[test]
    fn category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Customer).unwrap();
        assert_eq!(json, "\"customer\"");
    }
}
