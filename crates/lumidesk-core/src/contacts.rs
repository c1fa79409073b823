//! Contact-guidance extraction from citation quotes.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Citation, ContactInfo};

/// Question keywords that make contact guidance worth showing.
const TRIGGER_KEYWORDS: &[&str] = &[
    "返金",
    "申請",
    "請求",
    "解約",
    "アカウント",
    "不具合",
    "障害",
    "サポート",
    "問い合わせ",
    "refund",
    "cancel",
    "billing",
    "invoice",
    "account",
    "support",
    "contact",
];

fn email_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").ok())
        .as_ref()
}

/// True when `question` mentions a topic that usually ends in contacting
/// support (refunds, cancellation, billing, account trouble).
///
/// Japanese keywords match anywhere; English keywords must stand as whole
/// words, so "account" fires on "my account" but not on "accountant".
pub fn wants_contact_guidance(question: &str) -> bool {
    let q = question.to_lowercase();
    TRIGGER_KEYWORDS.iter().any(|k| {
        if k.is_ascii() {
            contains_word(&q, k)
        } else {
            q.contains(k)
        }
    })
}

fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(at, _)| {
        let before = text[..at].chars().next_back();
        let after = text[at + word.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// Collect email addresses from citation quotes in citation order.
///
/// Deduplicated by exact address; the first citation an address appears in
/// supplies its source and page. `source` is reduced to the file name.
pub fn extract_contacts(citations: &[Citation]) -> Vec<ContactInfo> {
    let Some(re) = email_regex() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for citation in citations {
        for m in re.find_iter(&citation.quote) {
            let value = m.as_str();
            if !seen.insert(value.to_string()) {
                continue;
            }
            out.push(ContactInfo {
                value: value.to_string(),
                source: file_name(&citation.source).to_string(),
                page: citation.page,
            });
        }
    }
    out
}

/// Last path segment, treating both `/` and `\` as separators.
pub fn file_name(source: &str) -> &str {
    source.rsplit(['/', '\\']).next().unwrap_or(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn citation(index: usize, source: &str, page: Option<u32>, quote: &str) -> Citation {
        Citation {
            index,
            category: Category::Service,
            source: source.to_string(),
            page,
            quote: quote.to_string(),
            score: Some(0.1),
        }
    }

    #[test]
    fn dedupes_in_first_seen_order() {
        let citations = vec![
            citation(1, "data/service/refund.pdf", Some(2), "連絡先: support@example.com まで"),
            citation(
                2,
                "data/service/billing.pdf",
                Some(5),
                "請求は billing@example.com 、その他は support@example.com",
            ),
        ];
        let contacts = extract_contacts(&citations);
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].value, "support@example.com");
        assert_eq!(contacts[0].source, "refund.pdf");
        assert_eq!(contacts[0].page, Some(2));
        assert_eq!(contacts[1].value, "billing@example.com");
        assert_eq!(contacts[1].source, "billing.pdf");
    }

    #[test]
    fn no_addresses_yields_empty() {
        let citations = vec![citation(1, "a.pdf", None, "no contact here")];
        assert!(extract_contacts(&citations).is_empty());
        assert!(extract_contacts(&[]).is_empty());
    }

    #[test]
    fn trigger_keywords() {
        assert!(wants_contact_guidance("返金条件を教えて"));
        assert!(wants_contact_guidance("How do I get a Refund?"));
        assert!(!wants_contact_guidance("会社の所在地は？"));
    }

    #[test]
    fn english_triggers_need_whole_words() {
        assert!(wants_contact_guidance("I cannot log in to my account."));
        assert!(wants_contact_guidance("billing/invoice question"));
        assert!(wants_contact_guidance("アカウントがロックされた"));
        assert!(!wants_contact_guidance("Do you employ an accountant?"));
        assert!(!wants_contact_guidance("accounting standards"));
        assert!(!wants_contact_guidance("supportive staff"));
    }

    #[test]
    fn file_name_handles_separators() {
        assert_eq!(file_name("data/service/x.pdf"), "x.pdf");
        assert_eq!(file_name("data\\company\\y.pdf"), "y.pdf");
        assert_eq!(file_name("z.pdf"), "z.pdf");
    }
}
