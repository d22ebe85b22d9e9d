//! Comment parsing and de-duplication
//!
//! [`CommentParser`] reads the comments currently present in a snapshot.
//! [`CommentAccumulator`] merges successive reads, dropping repeats and
//! numbering comments in the order they were first seen.

use crate::dom::text::{truncate_chars, visible_text};
use crate::dom::{is_rendered, select_within, Document, ElementTarget};
use crate::error::Result;
use crate::platform::chain::{first_matching, first_value, first_value_outside, Probe};
use crate::platform::numbers::parse_number;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Top-level comment blocks, most specific first
pub const ITEM_SELECTORS: &[&str] = &[".parent-comment", ".comment-item", ".comment-inner-container"];

/// Scrollable comment list
pub const CONTAINER_SELECTORS: &[&str] = &[".comments-container", ".comment-list", ".list-container"];

/// Controls that reveal more comments, matched by class
pub const LOAD_MORE_SELECTORS: &[&str] = &[".show-more", ".load-more", ".more-comments"];

/// Labels of controls that reveal more comments, matched case-insensitively
pub const LOAD_MORE_LABELS: &[&str] = &[
    "加载更多",
    "展开更多",
    "查看更多",
    "更多评论",
    "条回复",
    "load more",
    "show more",
    "view more",
];

/// Elements considered for label matching
const LABEL_CANDIDATES: &str = "button, a, span, div";

/// Labelled controls have short text
const MAX_LABEL_CHARS: usize = 20;

const CONTENT: &[Probe] = &[
    Probe::text(".note-text"),
    Probe::text(".content"),
    Probe::text(".comment-content"),
];

const AUTHOR: &[Probe] = &[
    Probe::text(".author .name"),
    Probe::text(".author-wrapper .name"),
    Probe::text(".name"),
    Probe::text(".user-name"),
];

const LIKES: &[Probe] = &[
    Probe::text(".like .count"),
    Probe::text(".like-wrapper .count"),
    Probe::text(".like"),
];

const TIME: &[Probe] = &[
    Probe::text(".info .date"),
    Probe::text(".date"),
    Probe::text(".time"),
];

const REPLY_SELECTORS: &[&str] = &[
    ".reply-container .comment-item-sub",
    ".comment-item-sub",
    ".reply-item",
];

/// Subtrees whose fields belong to replies, not to the enclosing comment
const REPLY_SCOPES: &[&str] = &[".reply-container", ".comment-item-sub", ".reply-item"];

/// Comment or reply author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    /// Name shown next to the comment
    pub display_name: String,
}

/// A reply under a comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Reply text
    pub content: String,
    /// Reply author
    pub author: CommentAuthor,
}

/// A top-level comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// 1-based position in accumulation order
    pub id: usize,
    /// Comment text, never empty
    pub content: String,
    /// Comment author
    pub author: CommentAuthor,
    /// Like count as parsed from the counter
    pub like_count: u64,
    /// Time as displayed ("3天前", "2024-05-01")
    pub display_time: String,
    /// Replies visible in the snapshot
    pub replies: Vec<Reply>,
}

impl Comment {
    /// Identity used for de-duplication across snapshots
    pub fn key(&self) -> (String, String) {
        (self.content.clone(), self.author.display_name.clone())
    }
}

/// Reads comments and comment controls from snapshots
pub struct CommentParser;

impl CommentParser {
    /// Comments present in the snapshot, numbered in document order.
    ///
    /// Items that fail to parse are logged and skipped; items without text
    /// are dropped.
    pub fn parse(doc: &Document) -> Result<Vec<Comment>> {
        let root = doc.html().root_element();
        let Some((selector, _)) = first_matching(root, ITEM_SELECTORS)? else {
            return Ok(Vec::new());
        };

        let mut comments = Vec::new();
        for item in select_within(root, selector)? {
            match Self::parse_item(item) {
                Ok(Some(mut comment)) => {
                    comment.id = comments.len() + 1;
                    comments.push(comment);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping comment: {}", e),
            }
        }

        debug!("Parsed {} comments via {}", comments.len(), selector);
        Ok(comments)
    }

    fn parse_item(item: ElementRef<'_>) -> Result<Option<Comment>> {
        let Some(content) = first_value_outside(item, CONTENT, REPLY_SCOPES)? else {
            return Ok(None);
        };

        let mut replies = Vec::new();
        if let Some((selector, _)) = first_matching(item, REPLY_SELECTORS)? {
            for reply in select_within(item, selector)? {
                if let Some(content) = first_value(reply, CONTENT)? {
                    replies.push(Reply {
                        content,
                        author: Self::author(reply)?,
                    });
                }
            }
        }

        Ok(Some(Comment {
            id: 0,
            content,
            author: CommentAuthor {
                display_name: first_value_outside(item, AUTHOR, REPLY_SCOPES)?.unwrap_or_default(),
            },
            like_count: first_value_outside(item, LIKES, REPLY_SCOPES)?
                .map_or(0, |t| parse_number(&t)),
            display_time: first_value_outside(item, TIME, REPLY_SCOPES)?.unwrap_or_default(),
            replies,
        }))
    }

    fn author(scope: ElementRef<'_>) -> Result<CommentAuthor> {
        Ok(CommentAuthor {
            display_name: first_value(scope, AUTHOR)?.unwrap_or_default(),
        })
    }

    /// The scrollable comment list, or the parent of the first comment
    pub fn locate_container(doc: &Document) -> Result<Option<ElementTarget>> {
        let root = doc.html().root_element();
        if let Some((selector, _)) = first_matching(root, CONTAINER_SELECTORS)? {
            return Ok(Some(ElementTarget::nth(selector, 0)));
        }
        Ok(first_matching(root, ITEM_SELECTORS)?
            .map(|(selector, _)| ElementTarget::nth(selector, 0).parent()))
    }

    /// A rendered control that reveals more comments.
    ///
    /// Class-based matches are tried first. Otherwise the innermost short
    /// element whose own text contains a known label is used.
    pub fn find_load_more(doc: &Document) -> Result<Option<ElementTarget>> {
        let root = doc.html().root_element();
        for &selector in LOAD_MORE_SELECTORS {
            let found = select_within(root, selector)?
                .into_iter()
                .position(is_rendered);
            if let Some(index) = found {
                return Ok(Some(ElementTarget::nth(selector, index)));
            }
        }

        let found = select_within(root, LABEL_CANDIDATES)?
            .into_iter()
            .position(|el| {
                is_rendered(el)
                    && has_label(el)
                    && !el.children().filter_map(ElementRef::wrap).any(has_label)
            });
        Ok(found.map(|index| ElementTarget::nth(LABEL_CANDIDATES, index)))
    }
}

fn has_label(el: ElementRef<'_>) -> bool {
    let text = visible_text(el);
    if text.is_empty() || text.chars().count() > MAX_LABEL_CHARS {
        return false;
    }
    let text = text.to_lowercase();
    LOAD_MORE_LABELS.iter().any(|label| text.contains(label))
}

/// Comments merged across snapshots, first occurrence wins
#[derive(Debug, Default)]
pub struct CommentAccumulator {
    comments: Vec<Comment>,
    seen: HashSet<(String, String)>,
}

impl CommentAccumulator {
    /// Add unseen comments, renumbering them; returns how many were new
    pub fn merge(&mut self, batch: Vec<Comment>) -> usize {
        let before = self.comments.len();
        for mut comment in batch {
            if self.seen.insert(comment.key()) {
                comment.id = self.comments.len() + 1;
                self.comments.push(comment);
            }
        }
        self.comments.len() - before
    }

    /// Number of distinct comments so far
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// No comments yet
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// The accumulated comments
    pub fn into_comments(self) -> Vec<Comment> {
        self.comments
    }
}

/// Top `limit` comments by likes, for compact summaries
pub fn top_by_likes(comments: &[Comment], limit: usize) -> Vec<&Comment> {
    let mut ranked: Vec<&Comment> = comments.iter().collect();
    ranked.sort_by(|a, b| b.like_count.cmp(&a.like_count));
    ranked.truncate(limit);
    ranked
}

/// Shorten a reply for compact summaries
pub fn clip_reply(reply: &Reply, max_chars: usize) -> String {
    truncate_chars(&reply.content, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const THREAD: &str = r#"
        <div class="comments-container">
          <div class="parent-comment">
            <div class="comment-item">
              <div class="author"><a class="name">Alice</a></div>
              <div class="note-text">First!</div>
              <div class="info"><span class="date">3天前</span>
                <span class="like"><span class="count">1.2万</span></span></div>
            </div>
            <div class="reply-container">
              <div class="comment-item comment-item-sub">
                <div class="author"><a class="name">Bob</a></div>
                <div class="note-text">Agreed</div>
              </div>
            </div>
          </div>
          <div class="parent-comment">
            <div class="comment-item">
              <div class="author"><a class="name">Carol</a></div>
              <div class="note-text">   </div>
            </div>
          </div>
          <div class="parent-comment">
            <div class="comment-item">
              <div class="author"><a class="name">Dan</a></div>
              <div class="note-text">Nice pics</div>
              <span class="like"><span class="count">赞</span></span>
            </div>
          </div>
        </div>"#;

    #[test]
    fn test_parse_thread() {
        let doc = Document::from_html(THREAD);
        let comments = CommentParser::parse(&doc).unwrap();
        assert_eq!(comments.len(), 2);

        let first = &comments[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.content, "First!");
        assert_eq!(first.author.display_name, "Alice");
        assert_eq!(first.like_count, 12_000);
        assert_eq!(first.display_time, "3天前");
        assert_eq!(
            first.replies,
            vec![Reply {
                content: "Agreed".into(),
                author: CommentAuthor {
                    display_name: "Bob".into()
                },
            }]
        );

        assert_eq!(comments[1].id, 2);
        assert_eq!(comments[1].content, "Nice pics");
        assert_eq!(comments[1].like_count, 0);
    }

    #[test]
    fn test_reply_fields_do_not_fill_empty_parent() {
        let doc = Document::from_html(
            r#"<div class="comments-container">
                 <div class="parent-comment">
                   <div class="comment-item">
                     <div class="author"><a class="name">Alice</a></div>
                     <div class="info"><span class="date">1天前</span></div>
                   </div>
                   <div class="reply-container">
                     <div class="comment-item comment-item-sub">
                       <div class="author"><a class="name">Bob</a></div>
                       <div class="note-text">reply from bob</div>
                       <span class="like"><span class="count">99</span></span>
                     </div>
                   </div>
                 </div>
               </div>"#,
        );
        assert_eq!(CommentParser::parse(&doc).unwrap(), Vec::<Comment>::new());
    }

    #[test]
    fn test_parent_likes_ignore_reply_counters() {
        let doc = Document::from_html(
            r#"<div class="parent-comment">
                 <div class="comment-item">
                   <div class="author"><a class="name">Alice</a></div>
                   <div class="note-text">photo dump</div>
                 </div>
                 <div class="reply-container">
                   <div class="comment-item-sub">
                     <div class="author"><a class="name">Bob</a></div>
                     <div class="note-text">wow</div>
                     <span class="like"><span class="count">99</span></span>
                   </div>
                 </div>
               </div>"#,
        );
        let comments = CommentParser::parse(&doc).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "photo dump");
        assert_eq!(comments[0].author.display_name, "Alice");
        assert_eq!(comments[0].like_count, 0);
        assert_eq!(comments[0].replies.len(), 1);
        assert_eq!(comments[0].replies[0].author.display_name, "Bob");
    }

    #[test]
    fn test_no_comments() {
        let doc = Document::from_html("<p>nothing</p>");
        assert!(CommentParser::parse(&doc).unwrap().is_empty());
        assert!(CommentParser::locate_container(&doc).unwrap().is_none());
    }

    #[test]
    fn test_container_falls_back_to_item_parent() {
        let doc = Document::from_html(
            "<section id='s'><div class='comment-item'><p class='content'>x</p></div></section>",
        );
        let target = CommentParser::locate_container(&doc).unwrap().unwrap();
        assert_eq!(target, ElementTarget::nth(".comment-item", 0).parent());
        assert_eq!(target.resolve(&doc).unwrap().unwrap().value().id(), Some("s"));
    }

    #[test]
    fn test_load_more_prefers_rendered_class_match() {
        let doc = Document::from_html(
            r#"<div class="show-more" data-pl-hidden="1">hidden</div>
               <div class="show-more">展开 5 条回复</div>"#,
        );
        assert_eq!(
            CommentParser::find_load_more(&doc).unwrap(),
            Some(ElementTarget::nth(".show-more", 1))
        );
    }

    #[test]
    fn test_load_more_by_label_picks_innermost() {
        let doc = Document::from_html(
            r#"<div><div>Some long paragraph of text that is clearly not a button at all</div>
               <div id="wrap"><span id="btn">Load More</span></div></div>"#,
        );
        let target = CommentParser::find_load_more(&doc).unwrap().unwrap();
        let el = target.resolve(&doc).unwrap().unwrap();
        assert_eq!(el.value().id(), Some("btn"));
    }

    #[test]
    fn test_load_more_ignores_hidden_ancestors() {
        let doc = Document::from_html(
            r#"<div data-pl-hidden="1"><button>加载更多</button></div>"#,
        );
        assert!(CommentParser::find_load_more(&doc).unwrap().is_none());
    }

    #[test]
    fn test_accumulator_dedups_and_renumbers() {
        let doc = Document::from_html(THREAD);
        let batch = CommentParser::parse(&doc).unwrap();

        let mut acc = CommentAccumulator::default();
        assert_eq!(acc.merge(batch.clone()), 2);
        assert_eq!(acc.merge(batch), 0);

        let late = CommentParser::parse(&Document::from_html(
            "<div class='parent-comment'><div class='author'><span class='name'>Eve</span></div>\
             <div class='note-text'>Late</div></div>",
        ))
        .unwrap();
        assert_eq!(late[0].id, 1);
        assert_eq!(acc.merge(late), 1);

        let comments = acc.into_comments();
        let ids: Vec<_> = comments.iter().map(|c| (c.id, c.content.as_str())).collect();
        assert_eq!(ids, vec![(1, "First!"), (2, "Nice pics"), (3, "Late")]);
    }

    #[test]
    fn test_same_text_different_author_is_distinct() {
        let mk = |author: &str| Comment {
            id: 1,
            content: "same".into(),
            author: CommentAuthor {
                display_name: author.into(),
            },
            like_count: 0,
            display_time: String::new(),
            replies: Vec::new(),
        };
        let mut acc = CommentAccumulator::default();
        assert_eq!(acc.merge(vec![mk("a"), mk("b"), mk("a")]), 2);
    }

    #[test]
    fn test_top_by_likes() {
        let doc = Document::from_html(THREAD);
        let comments = CommentParser::parse(&doc).unwrap();
        let top = top_by_likes(&comments, 1);
        assert_eq!(top[0].content, "First!");
    }
}
