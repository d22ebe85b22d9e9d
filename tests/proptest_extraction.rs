//! Property-based tests for extraction invariants.
//!
//! Uses proptest to generate page shapes and comment streams and checks the
//! guarantees the extractors make regardless of input.

use pagelens::dom::Document;
use pagelens::extraction::{ContentExtractor, DensityMetrics, DensityScorer};
use pagelens::platform::{parse_number, Comment, CommentAccumulator, CommentAuthor};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// STRATEGIES
// ============================================================================

/// A block of plain text followed by anchor text
#[derive(Debug, Clone)]
struct Block {
    plain: usize,
    linked: usize,
}

fn arb_block() -> impl Strategy<Value = Block> {
    (0usize..400, 0usize..400).prop_map(|(plain, linked)| Block { plain, linked })
}

fn render(blocks: &[Block]) -> String {
    let body: String = blocks
        .iter()
        .map(|b| {
            format!(
                "<div><p>{}</p><a href='/x'>{}</a></div>",
                "t".repeat(b.plain),
                "l".repeat(b.linked)
            )
        })
        .collect();
    format!("<html><body>{body}</body></html>")
}

fn arb_comment() -> impl Strategy<Value = Comment> {
    (0usize..8, 0usize..3, 0u64..100).prop_map(|(content, author, likes)| Comment {
        id: 0,
        content: format!("comment {content}"),
        author: CommentAuthor {
            display_name: format!("user {author}"),
        },
        like_count: likes,
        display_time: String::new(),
        replies: Vec::new(),
    })
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_density_winner_is_always_a_candidate(blocks in prop::collection::vec(arb_block(), 0..8)) {
        let doc = Document::from_html(&render(&blocks));
        if let Some(best) = DensityScorer::best_candidate(&doc).unwrap() {
            let metrics = DensityMetrics::measure(best.element).unwrap();
            prop_assert!(metrics.is_candidate());
            prop_assert!(metrics.link_density < 0.3);
            prop_assert!(metrics.text_len > 100);
        }
    }

    #[test]
    fn prop_text_cap_and_counts(len in 0usize..20_000) {
        let text = "ab ".repeat(len / 3 + 1);
        let doc = Document::from_html(&format!("<article><p>{text}</p></article>"));
        let block = ContentExtractor::extract(&doc).unwrap();

        prop_assert!(block.text.chars().count() <= 15_000);
        prop_assert_eq!(block.truncated, block.char_count > 15_000);
        prop_assert!(block.char_count >= block.text.chars().count());
        prop_assert_eq!(block.word_count, text.split_whitespace().count());
    }

    #[test]
    fn prop_accumulator_keeps_first_of_each_key(
        batches in prop::collection::vec(prop::collection::vec(arb_comment(), 0..6), 0..6)
    ) {
        let mut acc = CommentAccumulator::default();
        let mut added = 0;
        let mut keys = HashSet::new();
        for batch in batches {
            keys.extend(batch.iter().map(Comment::key));
            added += acc.merge(batch);
        }

        prop_assert_eq!(acc.len(), keys.len());
        prop_assert_eq!(added, keys.len());

        let comments = acc.into_comments();
        let ids: Vec<usize> = comments.iter().map(|c| c.id).collect();
        let expected: Vec<usize> = (1..=comments.len()).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn prop_k_suffix_scales(n in 0u32..100_000) {
        prop_assert_eq!(parse_number(&format!("{n}k")), u64::from(n) * 1_000);
        prop_assert_eq!(parse_number(&format!("{n}K")), u64::from(n) * 1_000);
    }
}
