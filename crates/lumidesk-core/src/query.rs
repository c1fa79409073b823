//! Query preprocessing applied before retrieval.
//!
//! Both transforms are pure. [`guess_category`] picks a retrieval filter
//! from keyword lists; [`rewrite_query_for_search`] strips Japanese filler
//! and politeness phrases so the search string carries only the topic.

use crate::models::Category;

/// Keyword lists checked in priority order; the first list with a hit wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Customer,
        &["プロフィール", "顧客", "カスタマー", "ユーザー情報"],
    ),
    (
        Category::Service,
        &[
            "解約",
            "返金",
            "請求",
            "支払い",
            "アカウント",
            "ログイン",
            "料金",
            "プラン",
            "機能",
            "利用開始",
        ],
    ),
    (
        Category::Company,
        &["会社", "概要", "所在地", "沿革", "企業", "問い合わせ対応方針"],
    ),
];

/// Filler removed from questions. `方法は?` precedes `方法` so the longer
/// phrase is consumed first.
const FILLER_PHRASES: &[&str] = &[
    "教えて",
    "知りたい",
    "できますか",
    "お願いします",
    "方法は?",
    "方法",
    "について",
];

/// Classify a free-text question into a retrieval category.
///
/// Lists are checked customer, then service, then company; evaluation stops
/// at the first match. Returns [`Category::Unknown`] when nothing matches.
pub fn guess_category(question: &str) -> Category {
    let q = question.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| q.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Unknown)
}

/// Produce a terser search string from a raw question.
///
/// Removes filler phrases and trailing question marks (ASCII and
/// full-width). If nothing is left, the original question is returned
/// unmodified.
pub fn rewrite_query_for_search(question: &str) -> String {
    let mut q = question.trim().to_string();
    for phrase in FILLER_PHRASES {
        q = q.replace(phrase, "");
    }
    let q = q
        .trim()
        .trim_end_matches(|c: char| c == '?' || c == '？' || c.is_whitespace())
        .trim();

    if q.is_empty() {
        question.to_string()
    } else {
        q.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_service_keywords() {
        assert_eq!(guess_category("解約したい"), Category::Service);
        assert_eq!(guess_category("返金条件を教えて"), Category::Service);
    }

    #[test]
    fn guess_priority_customer_before_service() {
        // Contains both a customer and a service keyword.
        assert_eq!(guess_category("顧客のアカウントについて"), Category::Customer);
    }

    #[test]
    fn guess_company_keywords() {
        assert_eq!(guess_category("会社の所在地は？"), Category::Company);
    }

    #[test]
    fn guess_unknown_when_no_keyword() {
        assert_eq!(guess_category("hello"), Category::Unknown);
        assert_eq!(guess_category(""), Category::Unknown);
        assert_eq!(guess_category("天気はどうですか"), Category::Unknown);
    }

    #[test]
    fn rewrite_strips_filler() {
        let out = rewrite_query_for_search("解約方法について");
        assert_eq!(out, "解約");
        assert_ne!(out, "解約方法について");
    }

    #[test]
    fn rewrite_strips_trailing_question_marks() {
        assert_eq!(rewrite_query_for_search("返金条件を教えて？"), "返金条件を");
        assert_eq!(rewrite_query_for_search("請求書の再発行は??"), "請求書の再発行は");
    }

    #[test]
    fn rewrite_all_filler_returns_original() {
        assert_eq!(rewrite_query_for_search("教えて？"), "教えて？");
        assert_eq!(rewrite_query_for_search("について"), "について");
    }

    #[test]
    fn rewrite_without_filler_is_trimmed_only() {
        assert_eq!(rewrite_query_for_search("  料金プラン  "), "料金プラン");
    }
}
