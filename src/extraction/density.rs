//! Text-density scoring
//!
//! Scores block elements for how much they look like article body text:
//! `text_len × (1 − link_density) × text_density`. Short blocks and
//! link-heavy blocks are never candidates.

use crate::dom::{parse_selector, text::visible_len, Document};
use crate::error::Result;
use scraper::ElementRef;
use tracing::{debug, instrument};

/// Blocks with this many visible characters or fewer are never candidates
pub const MIN_CANDIDATE_TEXT: usize = 100;

/// Blocks whose link density reaches this value are never candidates
pub const MAX_LINK_DENSITY: f64 = 0.3;

const CANDIDATE_SELECTOR: &str = "p, div, section";

/// Measurements behind a density score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityMetrics {
    /// Visible text length in characters
    pub text_len: usize,
    /// Anchor text share of the visible text
    pub link_density: f64,
    /// Visible text length over serialized markup length
    pub text_density: f64,
}

impl DensityMetrics {
    /// Measure an element
    pub fn measure(element: ElementRef<'_>) -> Result<Self> {
        let text_len = visible_len(element);
        let markup_len = element.inner_html().chars().count().max(1);
        Ok(Self {
            text_len,
            link_density: link_density(element, text_len)?,
            text_density: text_len as f64 / markup_len as f64,
        })
    }

    /// Whether the element may be selected at all
    pub fn is_candidate(&self) -> bool {
        self.text_len > MIN_CANDIDATE_TEXT && self.link_density < MAX_LINK_DENSITY
    }

    /// The density score
    pub fn score(&self) -> f64 {
        self.text_len as f64 * (1.0 - self.link_density) * self.text_density
    }
}

/// Share of `text_len` that sits inside anchors
fn link_density(element: ElementRef<'_>, text_len: usize) -> Result<f64> {
    if text_len == 0 {
        return Ok(0.0);
    }
    let anchors = parse_selector("a")?;
    let link_len: usize = element.select(&anchors).map(visible_len).sum();
    Ok(link_len as f64 / text_len as f64)
}

/// A scored main-content candidate
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// The element
    pub element: ElementRef<'a>,
    /// Its density score
    pub score: f64,
}

/// Density-based main content detection
pub struct DensityScorer;

impl DensityScorer {
    /// Score one element; `None` when it is not a candidate
    pub fn score(element: ElementRef<'_>) -> Result<Option<f64>> {
        let metrics = DensityMetrics::measure(element)?;
        Ok(metrics.is_candidate().then(|| metrics.score()))
    }

    /// Highest-scoring `p`/`div`/`section` in the document.
    /// The earliest element wins ties.
    #[instrument(skip(doc))]
    pub fn best_candidate(doc: &Document) -> Result<Option<Candidate<'_>>> {
        let selector = parse_selector(CANDIDATE_SELECTOR)?;
        let mut best: Option<Candidate<'_>> = None;
        let mut evaluated = 0usize;

        for element in doc.html().select(&selector) {
            evaluated += 1;
            let Some(score) = Self::score(element)? else {
                continue;
            };
            if best.map_or(true, |b| score > b.score) {
                best = Some(Candidate { element, score });
            }
        }

        debug!(
            "Density scan: {} elements, best score {:?}",
            evaluated,
            best.map(|b| b.score)
        );
        Ok(best)
    }
}
