//! Layout stamps
//!
//! Geometry and computed visibility do not survive `outerHTML`. Before a
//! live snapshot is serialized the driver writes them into `data-pl-*`
//! attributes; this module reads them back.

use scraper::ElementRef;

/// Set on elements that are not rendered (display/visibility/opacity or a 0×0 box)
pub const HIDDEN_ATTR: &str = "data-pl-hidden";
/// Intrinsic image width
pub const NATURAL_WIDTH_ATTR: &str = "data-pl-natural-w";
/// Intrinsic image height
pub const NATURAL_HEIGHT_ATTR: &str = "data-pl-natural-h";
/// Rendered box width
pub const WIDTH_ATTR: &str = "data-pl-w";
/// Rendered box height
pub const HEIGHT_ATTR: &str = "data-pl-h";
/// Viewport-relative top edge
pub const TOP_ATTR: &str = "data-pl-top";

/// Attribute prefix shared by all stamps
pub const STAMP_PREFIX: &str = "data-pl-";

/// Geometry known for one element
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Layout {
    /// Intrinsic width (images)
    pub natural_width: Option<f64>,
    /// Intrinsic height (images)
    pub natural_height: Option<f64>,
    /// Rendered width, or the `width` attribute of an unstamped element
    pub width: Option<f64>,
    /// Rendered height, or the `height` attribute of an unstamped element
    pub height: Option<f64>,
    /// Viewport-relative top edge
    pub top: Option<f64>,
}

impl Layout {
    /// Read the layout of an element. Zero values count as unknown.
    pub fn of(element: ElementRef<'_>) -> Self {
        let el = element.value();
        let read = |name: &str| el.attr(name).and_then(parse_dimension);
        Self {
            natural_width: read(NATURAL_WIDTH_ATTR),
            natural_height: read(NATURAL_HEIGHT_ATTR),
            width: read(WIDTH_ATTR).or_else(|| read("width")),
            height: read(HEIGHT_ATTR).or_else(|| read("height")),
            top: el.attr(TOP_ATTR).and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Best known width: intrinsic, then rendered
    pub fn best_width(&self) -> Option<f64> {
        self.natural_width.or(self.width)
    }

    /// Best known height: intrinsic, then rendered
    pub fn best_height(&self) -> Option<f64> {
        self.natural_height.or(self.height)
    }
}

/// Whether the element was rendered when the snapshot was taken.
/// Unstamped elements are assumed visible.
pub fn is_visible(element: ElementRef<'_>) -> bool {
    element.value().attr(HIDDEN_ATTR).is_none()
}

/// Visible, and so is every ancestor
pub fn is_rendered(element: ElementRef<'_>) -> bool {
    is_visible(element)
        && element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .all(is_visible)
}

// "640", "640px", "640.5" -> Some; "", "0", "auto", "100%" -> None
fn parse_dimension(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let raw = raw.strip_suffix("px").unwrap_or(raw);
    raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}
