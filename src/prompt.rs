//! Analysis prompts
//!
//! Renders an [`ExtractionPayload`] as the first user message of a chat
//! about the page.

use crate::dom::text::truncate_chars;
use crate::extraction::{ContentBlock, ImageDescriptor, PageInfo};
use crate::orchestrator::ExtractionPayload;
use crate::platform::comments::{clip_reply, top_by_likes};
use crate::platform::PlatformPost;
use std::fmt::Write;

/// System message sent ahead of every conversation
pub const SYSTEM_PROMPT: &str = "You are a web page analysis assistant. You summarize pages, \
extract key facts, explain the main arguments and answer follow-up questions about the page. \
Answer in the language of the page unless the user asks otherwise.";

/// Main text sent for generic pages
pub const GENERIC_TEXT_CHARS: usize = 8_000;
/// Post body sent for platform pages
pub const POST_BODY_CHARS: usize = 3_000;
/// Image URLs listed for platform pages
pub const POST_IMAGES: usize = 5;
/// Comments listed, by like count
pub const TOP_COMMENTS: usize = 20;
/// Replies listed under each comment
pub const REPLIES_PER_COMMENT: usize = 3;
/// Reply text length
pub const REPLY_CHARS: usize = 100;
/// Image context length
pub const IMAGE_CONTEXT_CHARS: usize = 100;

/// Builds analysis prompts
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt for either payload kind
    pub fn build(payload: &ExtractionPayload) -> String {
        match payload {
            ExtractionPayload::Generic {
                page_info,
                content,
                images,
                ..
            } => Self::generic(page_info, content, images),
            ExtractionPayload::Platform { post, .. } => Self::platform(post),
        }
    }

    /// Prompt for an article-like page
    pub fn generic(info: &PageInfo, content: &ContentBlock, images: &[ImageDescriptor]) -> String {
        let mut out = String::from("Please analyze the following web page.\n\n");
        let _ = writeln!(out, "Title: {}", info.title);
        let _ = writeln!(out, "URL: {}", info.url);
        if !info.description.is_empty() {
            let _ = writeln!(out, "Description: {}", info.description);
        }

        let _ = writeln!(
            out,
            "\n## Main content\n{}",
            truncate_chars(&content.text, GENERIC_TEXT_CHARS)
        );

        if !content.headings.is_empty() {
            out.push_str("\n## Outline\n");
            for heading in &content.headings {
                let indent = "  ".repeat(usize::from(heading.level.saturating_sub(1)));
                let _ = writeln!(out, "{indent}{}", heading.text);
            }
        }

        if !images.is_empty() {
            out.push_str("\n## Images\n");
            for (i, image) in images.iter().enumerate() {
                let alt = if image.alt.is_empty() {
                    "(no description)"
                } else {
                    image.alt.as_str()
                };
                let _ = writeln!(out, "{}. {} ({}x{})", i + 1, alt, image.width, image.height);
                if !image.context.is_empty() {
                    let _ = writeln!(
                        out,
                        "   Context: {}",
                        truncate_chars(&image.context, IMAGE_CONTEXT_CHARS)
                    );
                }
            }
        }

        out.push_str("\nPlease provide:\n");
        out.push_str("1. A short summary of the page\n");
        out.push_str("2. The key facts\n");
        out.push_str("3. The main arguments and conclusions\n");
        out.push_str("4. How the images relate to the text, if there are any\n");
        out
    }

    /// Prompt for a platform post and its comments
    pub fn platform(post: &PlatformPost) -> String {
        let mut out = String::from("Please analyze the following post and its comments.\n\n");

        let title = if post.title.is_empty() {
            "(untitled)"
        } else {
            post.title.as_str()
        };
        let or_unknown = |s: &str| if s.is_empty() { "unknown".to_string() } else { s.to_string() };
        out.push_str("## Post\n");
        let _ = writeln!(out, "- Title: {title}");
        let _ = writeln!(
            out,
            "- Author: @{} (id: {})",
            or_unknown(&post.author.display_name),
            or_unknown(&post.author.platform_user_id)
        );
        let _ = writeln!(out, "- Likes: {}", post.stats.likes);
        let _ = writeln!(out, "- Favorites: {}", post.stats.favorites);
        let _ = writeln!(out, "- Comments: {}", post.stats.comment_count);

        if !post.body_text.is_empty() {
            let _ = writeln!(
                out,
                "\n## Text\n{}",
                truncate_chars(&post.body_text, POST_BODY_CHARS)
            );
        }

        let images = &post.media.images;
        if !images.is_empty() {
            let _ = writeln!(out, "\n## Images ({})", images.len());
            for (i, image) in images.iter().take(POST_IMAGES).enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, image.url);
            }
        }
        for video in &post.media.videos {
            let _ = writeln!(out, "\nVideo: {}", video.url);
        }

        if post.comments.is_empty() {
            out.push_str("\nPlease provide:\n");
            out.push_str("1. The core topic and key points of the post\n");
            out.push_str("2. An assessment of content quality and style\n");
            out.push_str("3. The likely audience\n");
            out.push_str("4. Suggestions to improve the post\n");
            return out;
        }

        let _ = writeln!(out, "\n## Comments ({} collected)\n", post.comments.len());
        for (i, comment) in top_by_likes(&post.comments, TOP_COMMENTS).iter().enumerate() {
            let author = if comment.author.display_name.is_empty() {
                "anonymous"
            } else {
                comment.author.display_name.as_str()
            };
            let _ = writeln!(out, "Comment {}", i + 1);
            let _ = writeln!(out, "- User: @{author}");
            let _ = writeln!(out, "- Text: {}", comment.content);
            let _ = writeln!(out, "- Likes: {}", comment.like_count);
            if !comment.display_time.is_empty() {
                let _ = writeln!(out, "- Time: {}", comment.display_time);
            }
            if !comment.replies.is_empty() {
                let _ = writeln!(out, "- Replies: {}", comment.replies.len());
                for reply in comment.replies.iter().take(REPLIES_PER_COMMENT) {
                    let name = if reply.author.display_name.is_empty() {
                        "anonymous"
                    } else {
                        reply.author.display_name.as_str()
                    };
                    let _ = writeln!(out, "  -> @{name}: {}", clip_reply(reply, REPLY_CHARS));
                }
            }
            out.push('\n');
        }

        out.push_str("Please provide:\n");
        out.push_str("1. The core topic and key points of the post\n");
        out.push_str("2. Comment sentiment (share of positive, negative, neutral)\n");
        out.push_str("3. Topics and questions commenters care about\n");
        out.push_str("4. Useful feedback and suggestions from commenters\n");
        out.push_str("5. Which comments drew the most engagement\n");
        out.push_str("6. Suggestions to improve the post\n");
        out
    }
}
