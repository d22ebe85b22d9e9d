//! Xiaohongshu note pages
//!
//! Reads a note's title, body, author, engagement counters and media. Every
//! field goes through its own fallback chain so that older and newer page
//! layouts both resolve.

use crate::dom::{select_within, Document, Layout};
use crate::error::Result;
use crate::platform::chain::{first_matching, first_value, Probe};
use crate::platform::comments::{Comment, CommentAccumulator, CommentParser};
use crate::platform::loader::LoadReport;
use crate::platform::numbers::parse_number;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

const TITLE: &[Probe] = &[
    Probe::text("#detail-title"),
    Probe::text(".note-content .title"),
    Probe::text(".note-detail .title"),
    Probe::attr("meta[property='og:title']", "content"),
    Probe::text("title"),
];

const BODY: &[Probe] = &[
    Probe::text("#detail-desc"),
    Probe::text(".note-content .desc"),
    Probe::text(".note-detail .desc"),
    Probe::attr("meta[name='description']", "content"),
];

const AUTHOR_NAME: &[Probe] = &[
    Probe::text(".author-wrapper .username"),
    Probe::text(".author-container .name"),
    Probe::text(".note-detail .author .name"),
    Probe::text(".user-nickname"),
];

const AUTHOR_PROFILE: &[Probe] = &[
    Probe::attr(".author-wrapper a[href*='/user/profile/']", "href"),
    Probe::attr(".author-container a[href*='/user/profile/']", "href"),
    Probe::attr("a[href*='/user/profile/']", "href"),
];

const AUTHOR_AVATAR: &[Probe] = &[
    Probe::attr(".author-wrapper img.avatar-item", "src"),
    Probe::attr(".author-container .avatar img", "src"),
    Probe::attr(".author-wrapper img", "src"),
];

const LIKES: &[Probe] = &[
    Probe::text(".interact-container .like-wrapper .count"),
    Probe::text(".engage-bar .like-wrapper .count"),
    Probe::text(".note-interact .like .count"),
];

const FAVORITES: &[Probe] = &[
    Probe::text(".interact-container .collect-wrapper .count"),
    Probe::text(".engage-bar .collect-wrapper .count"),
    Probe::text("#note-page-collect-board-guide .count"),
];

const COMMENT_COUNT: &[Probe] = &[
    Probe::text(".interact-container .chat-wrapper .count"),
    Probe::text(".engage-bar .chat-wrapper .count"),
    Probe::text(".comments-container .total"),
];

/// Carousel or media areas holding note images
const MEDIA_CONTAINERS: &[&str] = &[".media-container", ".swiper-wrapper", ".note-slider"];

const IMAGE_SOURCE_ATTRS: &[&str] = &["src", "data-src"];

/// Note author
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    /// Nickname
    pub display_name: String,
    /// Id taken from the profile URL
    pub platform_user_id: String,
    /// Absolute avatar URL
    pub avatar_url: String,
    /// Absolute profile URL
    pub profile_url: String,
}

/// Engagement counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
    /// Likes
    pub likes: u64,
    /// Favorites ("collects")
    pub favorites: u64,
    /// Comments as counted by the platform
    pub comment_count: u64,
}

/// A note image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaImage {
    /// Absolute URL
    pub url: String,
    /// Best known width
    pub width: Option<f64>,
    /// Best known height
    pub height: Option<f64>,
}

/// A note video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaVideo {
    /// Video URL, possibly a `blob:` URL
    pub url: String,
    /// Poster image URL
    pub poster: String,
}

/// Images and videos of a note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMedia {
    /// Images in carousel order
    pub images: Vec<MediaImage>,
    /// Videos in document order
    pub videos: Vec<MediaVideo>,
}

/// Structured record of a platform post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPost {
    /// Note title
    pub title: String,
    /// Note text
    pub body_text: String,
    /// Note author
    pub author: PostAuthor,
    /// Engagement counters
    pub stats: EngagementStats,
    /// Images and videos
    pub media: PostMedia,
    /// Comments in accumulation order
    pub comments: Vec<Comment>,
    /// Present when comments were loaded incrementally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_loading: Option<LoadReport>,
}

/// Xiaohongshu note extraction
pub struct XiaohongshuExtractor;

impl XiaohongshuExtractor {
    /// Read every field from one snapshot, comments included
    #[instrument(skip(doc))]
    pub fn extract(doc: &Document) -> Result<PlatformPost> {
        let root = doc.html().root_element();
        let text = |probes: &[Probe]| -> Result<String> {
            Ok(first_value(root, probes)?.unwrap_or_default())
        };
        let count = |probes: &[Probe]| -> Result<u64> {
            Ok(first_value(root, probes)?.map_or(0, |t| parse_number(&t)))
        };

        let mut comments = CommentAccumulator::default();
        comments.merge(CommentParser::parse(doc)?);

        let post = PlatformPost {
            title: text(TITLE)?,
            body_text: text(BODY)?,
            author: Self::author(doc)?,
            stats: EngagementStats {
                likes: count(LIKES)?,
                favorites: count(FAVORITES)?,
                comment_count: count(COMMENT_COUNT)?,
            },
            media: PostMedia {
                images: Self::images(doc)?,
                videos: Self::videos(doc)?,
            },
            comments: comments.into_comments(),
            comment_loading: None,
        };

        debug!(
            "Note {:?}: {} images, {} videos, {} comments",
            post.title,
            post.media.images.len(),
            post.media.videos.len(),
            post.comments.len()
        );
        Ok(post)
    }

    fn author(doc: &Document) -> Result<PostAuthor> {
        let root = doc.html().root_element();
        let resolve = |raw: Option<String>| {
            raw.and_then(|r| doc.resolve(&r))
        };

        let profile = resolve(first_value(root, AUTHOR_PROFILE)?);
        Ok(PostAuthor {
            display_name: first_value(root, AUTHOR_NAME)?.unwrap_or_default(),
            platform_user_id: profile.as_ref().and_then(user_id).unwrap_or_default(),
            avatar_url: resolve(first_value(root, AUTHOR_AVATAR)?)
                .map(String::from)
                .unwrap_or_default(),
            profile_url: profile.map(String::from).unwrap_or_default(),
        })
    }

    /// Images of the first media container that has any
    fn images(doc: &Document) -> Result<Vec<MediaImage>> {
        let root = doc.html().root_element();
        for &container in MEDIA_CONTAINERS {
            let Some((_, scope)) = first_matching(root, &[container])? else {
                continue;
            };

            let mut seen = HashSet::new();
            let mut images = Vec::new();
            for img in select_within(scope, "img")? {
                let Some(url) = IMAGE_SOURCE_ATTRS
                    .iter()
                    .filter_map(|attr| img.value().attr(attr))
                    .find_map(|raw| doc.resolve(raw))
                else {
                    continue;
                };
                // carousels clone their first and last slides
                if !seen.insert(url.to_string()) {
                    continue;
                }
                let layout = Layout::of(img);
                images.push(MediaImage {
                    url: url.into(),
                    width: layout.best_width(),
                    height: layout.best_height(),
                });
            }

            if !images.is_empty() {
                return Ok(images);
            }
        }
        Ok(Vec::new())
    }

    fn videos(doc: &Document) -> Result<Vec<MediaVideo>> {
        let root = doc.html().root_element();
        let mut videos = Vec::new();
        for video in select_within(root, "video")? {
            let src = match video.value().attr("src") {
                Some(src) => Some(src.to_string()),
                None => first_value(video, &[Probe::attr("source", "src")])?,
            };
            let Some(url) = src.and_then(|s| doc.resolve(&s)) else {
                continue;
            };
            videos.push(MediaVideo {
                url: url.into(),
                poster: video
                    .value()
                    .attr("poster")
                    .and_then(|p| doc.resolve(p))
                    .map(String::from)
                    .unwrap_or_default(),
            });
        }
        Ok(videos)
    }
}

/// Path segment after `/user/profile/`, else the last non-empty segment
fn user_id(profile: &Url) -> Option<String> {
    let segments: Vec<&str> = profile.path_segments()?.filter(|s| !s.is_empty()).collect();
    let id = segments
        .iter()
        .position(|s| *s == "profile")
        .and_then(|i| segments.get(i + 1))
        .or_else(|| segments.last())?;
    Some(id.to_string())
}
