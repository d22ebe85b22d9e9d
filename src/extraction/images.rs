//! Image extraction
//!
//! Scans every `<img>` on the page, drops icons and duplicates, attaches a
//! caption-like context and flags likely hero images.

use crate::dom::text::{truncate_chars, visible_text};
use crate::dom::{
    closest, first_within, next_element_sibling, parent_element, parse_selector, Document, Layout,
    Viewport,
};
use crate::error::Result;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

/// Images smaller than this in either dimension are skipped
pub const MIN_DIMENSION: f64 = 100.0;

/// Dimension assumed when neither intrinsic nor rendered size is known
pub const ASSUMED_DIMENSION: f64 = 100.0;

/// At most this many images are returned
pub const MAX_IMAGES: usize = 10;

/// Context text is at most this long
pub const MAX_CONTEXT_CHARS: usize = 200;

/// `src` first, then common lazy-load attributes
const SOURCE_ATTRS: &[&str] = &["src", "data-src", "data-original", "data-lazy-src"];

/// Class names marking a lead image
const PRIMARY_CLASSES: &[&str] = &["featured", "hero", "main-image"];

/// Ids marking a lead image
const PRIMARY_IDS: &[&str] = &["main-image", "featured-image", "hero-image"];

/// An image found on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    /// Absolute source URL
    pub src: String,
    /// `alt` attribute
    pub alt: String,
    /// `title` attribute
    pub title: String,
    /// Width used for filtering and ranking
    pub width: f64,
    /// Height used for filtering and ranking
    pub height: f64,
    /// Caption or nearby text
    pub context: String,
    /// Heuristic lead-image flag
    pub is_primary: bool,
}

impl ImageDescriptor {
    /// Pixel area
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Image extraction functionality
pub struct ImageExtractor;

impl ImageExtractor {
    /// Collect, rank and cap the images of a document
    #[instrument(skip(doc))]
    pub fn extract(doc: &Document) -> Result<Vec<ImageDescriptor>> {
        let mut seen = HashSet::new();
        let mut images = Vec::new();
        let mut scanned = 0usize;
        let selector = parse_selector("img")?;

        for img in doc.html().select(&selector) {
            scanned += 1;
            match Self::describe(doc, img, &seen) {
                Ok(Some(image)) => {
                    seen.insert(image.src.clone());
                    images.push(image);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping image: {}", e),
            }
        }

        // stable: document order breaks ties
        images.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then_with(|| b.area().total_cmp(&a.area()))
        });
        images.truncate(MAX_IMAGES);

        debug!("Scanned {} images, kept {}", scanned, images.len());
        Ok(images)
    }

    /// Describe one image; `None` when it is unresolvable, already seen or too small
    fn describe(
        doc: &Document,
        img: ElementRef<'_>,
        seen: &HashSet<String>,
    ) -> Result<Option<ImageDescriptor>> {
        let el = img.value();
        let Some(src) = SOURCE_ATTRS
            .iter()
            .filter_map(|attr| el.attr(attr))
            .find_map(|raw| doc.resolve(raw))
        else {
            return Ok(None);
        };
        let src = String::from(src);
        if seen.contains(&src) {
            return Ok(None);
        }

        let layout = Layout::of(img);
        let width = layout.best_width().unwrap_or(ASSUMED_DIMENSION);
        let height = layout.best_height().unwrap_or(ASSUMED_DIMENSION);
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Ok(None);
        }

        let alt = el.attr("alt").unwrap_or_default().trim().to_string();
        Ok(Some(ImageDescriptor {
            context: Self::context(img, &alt)?,
            is_primary: Self::is_primary(img, &layout, width, height, doc.viewport()),
            src,
            title: el.attr("title").unwrap_or_default().trim().to_string(),
            alt,
            width,
            height,
        }))
    }

    /// Figure caption, else short parent text, else the following paragraph
    pub fn context(img: ElementRef<'_>, alt: &str) -> Result<String> {
        if let Some(figure) = closest(img, "figure") {
            if let Some(caption) = first_within(figure, "figcaption")? {
                let text = visible_text(caption);
                if !text.is_empty() {
                    return Ok(text);
                }
            }
        }

        let Some(parent) = parent_element(img) else {
            return Ok(String::new());
        };

        let parent_text = visible_text(parent);
        let parent_text = if alt.is_empty() {
            parent_text
        } else {
            parent_text.replacen(alt, "", 1).trim().to_string()
        };
        if !parent_text.is_empty() && parent_text.chars().count() < MAX_CONTEXT_CHARS {
            return Ok(parent_text);
        }

        if let Some(next) = next_element_sibling(parent) {
            if next.value().name() == "p" {
                return Ok(truncate_chars(&visible_text(next), MAX_CONTEXT_CHARS));
            }
        }

        Ok(String::new())
    }

    /// Marker class/id, or a wide banner-shaped image in the upper half of the viewport
    pub fn is_primary(
        img: ElementRef<'_>,
        layout: &Layout,
        width: f64,
        height: f64,
        viewport: Viewport,
    ) -> bool {
        let el = img.value();
        let marked = el.classes().any(|c| PRIMARY_CLASSES.contains(&c))
            || el.id().is_some_and(|id| PRIMARY_IDS.contains(&id));
        if marked {
            return true;
        }

        let Some(top) = layout.top else {
            return false;
        };
        let aspect = width / height;
        top < viewport.height * 0.5 && width > 400.0 && aspect > 1.2 && aspect < 2.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DocumentSnapshot;

    fn doc(body: &str) -> Document {
        Document::parse(&DocumentSnapshot::new(
            "https://example.com/post/",
            format!("<html><body>{body}</body></html>"),
        ))
    }

    #[test]
    fn test_same_url_yields_one_image() {
        let doc = doc(r#"<img src="/a.jpg" width="300" height="200"><img src="https://example.com/a.jpg" width="300" height="200">"#);
        let images = ImageExtractor::extract(&doc).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].src, "https://example.com/a.jpg");
    }

    #[test]
    fn test_small_images_skipped_unknown_sizes_kept() {
        let doc = doc(r#"<img src="icon.png" width="50" height="50"><img src="unknown.png">"#);
        let images = ImageExtractor::extract(&doc).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].src, "https://example.com/post/unknown.png");
        assert_eq!((images[0].width, images[0].height), (100.0, 100.0));
    }

    #[test]
    fn test_lazy_source_attribute() {
        let doc = doc(r#"<img data-src="/lazy.jpg" width="200" height="200">"#);
        let images = ImageExtractor::extract(&doc).unwrap();
        assert_eq!(images[0].src, "https://example.com/lazy.jpg");
    }

    #[test]
    fn test_context_priority() {
        let doc = doc(r#"
            <figure><div><img id="a" src="/a.jpg"></div><figcaption>The caption</figcaption></figure>
            <div><span>Short note</span><img id="b" src="/b.jpg" alt="alt text"></div>
            <div><img id="c" src="/c.jpg"></div><p>Following paragraph</p>
        "#);
        let ctx = |id: &str| {
            let img = doc.select_first(&format!("#{id}")).unwrap().unwrap();
            let alt = img.value().attr("alt").unwrap_or_default();
            ImageExtractor::context(img, alt).unwrap()
        };
        assert_eq!(ctx("a"), "The caption");
        assert_eq!(ctx("b"), "Short note");
        assert_eq!(ctx("c"), "Following paragraph");
    }

    #[test]
    fn test_primary_first_then_area() {
        let doc = doc(r#"
            <img src="/small.jpg" width="200" height="200">
            <img src="/big.jpg" width="1000" height="1000">
            <img class="hero" src="/hero.jpg" width="150" height="150">
            <img src="/banner.jpg" data-pl-w="800" data-pl-h="400" data-pl-top="10">
        "#);
        let images = ImageExtractor::extract(&doc).unwrap();
        let srcs: Vec<_> = images.iter().map(|i| i.src.rsplit('/').next().unwrap()).collect();
        assert_eq!(srcs, vec!["banner.jpg", "hero.jpg", "big.jpg", "small.jpg"]);
        assert!(images[0].is_primary && images[1].is_primary);
        assert!(!images[2].is_primary);
    }

    #[test]
    fn test_banner_heuristic_needs_upper_half() {
        let doc = doc(r#"<img src="/low.jpg" data-pl-w="800" data-pl-h="400" data-pl-top="900">"#);
        let images = ImageExtractor::extract(&doc).unwrap();
        assert!(!images[0].is_primary);
    }

    #[test]
    fn test_cap_at_ten() {
        let body: String = (0..15)
            .map(|i| format!("<img src='/{i}.jpg' width='200' height='200'>"))
            .collect();
        let doc = doc(&body);
        assert_eq!(ImageExtractor::extract(&doc).unwrap().len(), MAX_IMAGES);
    }
}
