//! Weak-match policy: decide whether a retrieval result is good enough to
//! reach the completion service.
//!
//! Both short-circuits are business outcomes, not errors. They produce
//! fixed texts ([`NOT_FOUND_MESSAGE`], [`CLARIFICATION_MENU`]) without any
//! completion call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::RetrievalResult;

/// Shown when retrieval produced no usable context.
pub const NOT_FOUND_MESSAGE: &str = "資料に記載がありません。該当するPDF名や用語（例：解約、返金、請求など）を少し具体的に教えてください。";

/// Static clarification prompt shown for weak matches.
pub const CLARIFICATION_MENU: &str = "資料だけでは特定できませんでした。次のどれに近いですか？

1) 解約したい（いつ解約が有効になるか知りたい）
2) 返金できるか知りたい（返金条件を確認したい）
3) 請求・支払いについて知りたい
4) アカウント/ログインについて知りたい
5) その他（状況をもう少し具体的に教えてください）

たとえば「2) 返金。契約開始日が○月○日で、今○日目です」のように書いてください。
";

/// Direction of the retriever's relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreType {
    /// Lower is more relevant.
    #[default]
    Distance,
    /// Higher is more relevant.
    Similarity,
}

impl ScoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreType::Distance => "distance",
            ScoreType::Similarity => "similarity",
        }
    }

    /// `true` when `score` is strictly worse than `threshold`.
    pub fn is_worse(&self, score: f64, threshold: f64) -> bool {
        match self {
            ScoreType::Distance => score > threshold,
            ScoreType::Similarity => score < threshold,
        }
    }

    /// The most relevant score in `scores`, or `None` when empty.
    pub fn best<I: IntoIterator<Item = f64>>(&self, scores: I) -> Option<f64> {
        scores.into_iter().fold(None, |best, s| match best {
            None => Some(s),
            Some(b) if self.is_worse(b, s) => Some(s),
            keep => keep,
        })
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" => Ok(ScoreType::Distance),
            "similarity" => Ok(ScoreType::Similarity),
            other => Err(format!(
                "unknown score type '{}' (expected 'distance' or 'similarity')",
                other
            )),
        }
    }
}

/// Outcome of [`WeakMatchPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Context was empty; answer with [`NOT_FOUND_MESSAGE`] and no citations.
    NoContext,
    /// Best score fails the threshold; answer with [`CLARIFICATION_MENU`].
    WeakMatch,
    /// Proceed to generation.
    Generate,
}

impl Disposition {
    /// Fixed reply for the short-circuit outcomes, `None` for [`Disposition::Generate`].
    pub fn canned_reply(&self) -> Option<&'static str> {
        match self {
            Disposition::NoContext => Some(NOT_FOUND_MESSAGE),
            Disposition::WeakMatch => Some(CLARIFICATION_MENU),
            Disposition::Generate => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WeakMatchPolicy {
    pub threshold: f64,
    pub score_type: ScoreType,
}

impl WeakMatchPolicy {
    pub fn new(threshold: f64, score_type: ScoreType) -> Self {
        Self {
            threshold,
            score_type,
        }
    }

    pub fn decide(&self, result: &RetrievalResult) -> Disposition {
        if result.is_blank() {
            return Disposition::NoContext;
        }
        match result.best_score {
            Some(best) if self.score_type.is_worse(best, self.threshold) => Disposition::WeakMatch,
            _ => Disposition::Generate,
        }
    }
}

impl Default for WeakMatchPolicy {
    fn default() -> Self {
        Self::new(0.25, ScoreType::Distance)
    }
}
