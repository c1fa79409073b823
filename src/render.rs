//! Text rendering for answers, citations, and contact guidance.

use std::fmt::Write as _;

use lumidesk_core::contacts::file_name;
use lumidesk_core::{Citation, ContactInfo, RetrievedItem};

use crate::pipeline::TurnOutcome;

/// Answer, then sources, then contact guidance when present.
pub fn render_outcome(outcome: &TurnOutcome) -> String {
    let mut out = String::new();
    out.push_str(outcome.answer.trim_end());
    out.push('\n');

    if !outcome.citations.is_empty() {
        out.push('\n');
        out.push_str(&render_citations(&outcome.citations));
    }
    if !outcome.contacts.is_empty() {
        out.push('\n');
        out.push_str(&render_contacts(&outcome.contacts));
    }
    out
}

pub fn render_citations(citations: &[Citation]) -> String {
    let mut out = String::from("Sources:\n");
    for c in citations {
        let _ = writeln!(
            out,
            "[{}] ({}) {}",
            c.index,
            c.category,
            file_name(&c.source)
        );
        let _ = writeln!(out, "    {}", page_label(c.page));
        let _ = writeln!(out, "    > {}", c.quote);
    }
    out
}

pub fn render_contacts(contacts: &[ContactInfo]) -> String {
    let mut out = String::from("Contact:\n");
    for c in contacts {
        let page = match c.page {
            Some(p) => format!("p.{}", p),
            None => "page unknown".to_string(),
        };
        let _ = writeln!(out, "- email: {} (source: {} / {})", c.value, c.source, page);
    }
    out
}

fn page_label(page: Option<u32>) -> String {
    match page {
        Some(p) => format!("page: {}", p),
        None => "page: unknown".to_string(),
    }
}

/// Raw ranked hits for `desk search`. Pages are shown 1-based.
pub fn render_hits(hits: &[RetrievedItem], quote_max_chars: usize) -> String {
    if hits.is_empty() {
        return "No results.\n".to_string();
    }
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. [{:.4}] ({}) {}  {}",
            i + 1,
            hit.score,
            hit.metadata.category,
            hit.metadata.source,
            page_label(hit.metadata.page.map(|p| p + 1))
        );
        let _ = writeln!(
            out,
            "    > {}",
            lumidesk_core::assemble::make_quote(&hit.text, quote_max_chars)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumidesk_core::models::ItemMetadata;
    use lumidesk_core::{Category, Disposition};

    fn outcome() -> TurnOutcome {
        TurnOutcome {
            question: "返金したい".to_string(),
            search_query: "返金したい".to_string(),
            category: Category::Service,
            disposition: Disposition::Generate,
            answer: "14日以内なら返金できます。\n".to_string(),
            citations: vec![
                Citation {
                    index: 1,
                    category: Category::Service,
                    source: "data/service/refund.pdf".to_string(),
                    page: Some(3),
                    quote: "返金は14日以内 support@example.com".to_string(),
                    score: Some(0.12),
                },
                Citation {
                    index: 2,
                    category: Category::Unknown,
                    source: "data/faq.md".to_string(),
                    page: None,
                    quote: "FAQ".to_string(),
                    score: Some(0.2),
                },
            ],
            contacts: vec![ContactInfo {
                value: "support@example.com".to_string(),
                source: "refund.pdf".to_string(),
                page: Some(3),
            }],
            best_score: Some(0.12),
        }
    }

    #[test]
    fn outcome_sections_in_order() {
        let text = render_outcome(&outcome());
        let answer_at = text.find("14日以内なら").unwrap();
        let sources_at = text.find("Sources:").unwrap();
        let contact_at = text.find("Contact:").unwrap();
        assert!(answer_at < sources_at && sources_at < contact_at);
        assert!(text.contains("[1] (service) refund.pdf"));
        assert!(text.contains("page: 3"));
        assert!(text.contains("[2] (unknown) faq.md"));
        assert!(text.contains("page: unknown"));
        assert!(text.contains("- email: support@example.com (source: refund.pdf / p.3)"));
    }

    #[test]
    fn no_citations_no_sections() {
        let mut o = outcome();
        o.citations.clear();
        o.contacts.clear();
        let text = render_outcome(&o);
        assert!(!text.contains("Sources:"));
        assert!(!text.contains("Contact:"));
    }

    #[test]
    fn hits_show_one_based_pages() {
        let hits = vec![RetrievedItem {
            text: "line one\nline two".to_string(),
            metadata: ItemMetadata {
                source: "data/service/a.pdf".to_string(),
                page: Some(0),
                category: Category::Service,
            },
            score: 0.5,
        }];
        let text = render_hits(&hits, 400);
        assert!(text.contains("1. [0.5000] (service) data/service/a.pdf  page: 1"));
        assert!(text.contains("> line one line two"));
        assert_eq!(render_hits(&[], 400), "No results.\n");
    }
}
