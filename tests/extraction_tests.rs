//! Extraction module tests
//!
//! These tests run the generic extraction path end to end over static
//! documents.

use pagelens::browser::StaticPage;
use pagelens::dom::{Document, DocumentSnapshot};
use pagelens::extraction::{
    ContentExtractor, ContentOrigin, DensityScorer, GenericExtractor, ImageExtractor, LinkExtractor,
    LinkType, PageStructureStats,
};
use pagelens::orchestrator::{ExtractOptions, ExtractionPayload, Orchestrator};
use pretty_assertions::assert_eq;

fn words(chars: usize) -> String {
    "lorem ipsum dolor sit amet ".repeat(chars / 27 + 1)[..chars].to_string()
}

fn article_page() -> String {
    format!(
        r#"<html><head><title>Field notes</title></head><body>
        <nav><a href="/">Home</a><a href="/about">About</a></nav>
        <article>
          <h1>Field notes</h1>
          <p>{}</p>
          <h2>Sources</h2>
          <p>See <a href="https://archive.example.org/a">the archive</a> and
             <a href="https://data.example.net/b">the dataset</a>.</p>
          <h3>Appendix</h3>
          <p>{}</p>
          <img src="/tiny.png" width="50" height="50">
        </article>
        <footer>© 2024</footer>
        </body></html>"#,
        words(2500),
        words(2500)
    )
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_article_page_end_to_end() {
    let page = StaticPage::new("https://example.com/notes", article_page());
    let result = Orchestrator::extract(&page, &ExtractOptions::default(), None).await;

    let Some(ExtractionPayload::Generic {
        page_info,
        content,
        images,
        structure,
    }) = result.payload()
    else {
        panic!("expected a generic payload, got {result:?}");
    };

    assert_eq!(page_info.title, "Field notes");
    assert_eq!(
        content.origin,
        ContentOrigin::Selector {
            selector: "article".into()
        }
    );
    assert!(content.char_count > 5000);
    assert_eq!(content.word_count, content.text.split_whitespace().count());
    assert_eq!(content.char_count, content.text.chars().count());
    assert!(!content.truncated);

    let levels: Vec<u8> = content.headings.iter().map(|h| h.level).collect();
    assert_eq!(levels, vec![1, 2, 3]);

    assert_eq!(content.links.len(), 2);
    assert!(content.links.iter().all(|l| l.link_type == LinkType::External));

    assert!(images.is_empty());
    assert!(structure.has_article);
    assert_eq!(structure.image_count, 1);
    assert_eq!(structure.heading_count, 3);
}

#[test]
fn test_long_text_truncated_but_counted_in_full() {
    let text = words(20_000);
    let doc = Document::from_html(&format!("<article><p>{text}</p></article>"));
    let block = ContentExtractor::extract(&doc).unwrap();

    assert!(block.truncated);
    assert_eq!(block.text.chars().count(), 15_000);
    assert_eq!(block.char_count, text.trim().chars().count());
    assert_eq!(block.word_count, text.split_whitespace().count());
}

#[test]
fn test_html_fragment_is_cleaned() {
    let doc = Document::from_html(&format!(
        r#"<article><script>alert(1)</script><style>p{{}}</style>
           <p onclick="steal()" class="lead">{}</p></article>"#,
        words(300)
    ));
    let block = ContentExtractor::extract(&doc).unwrap();
    assert!(!block.html.contains("script"));
    assert!(!block.html.contains("onclick"));
    assert!(!block.html.contains("p{}"));
    assert!(block.html.contains(r#"class="lead""#));
}

// ============================================================================
// Fallbacks
// ============================================================================

#[test]
fn test_density_fallback_skips_navigation() {
    let nav: String = (0..40)
        .map(|i| format!("<a href='/p{i}'>navigation entry {i}</a> "))
        .collect();
    let html = format!(
        "<body><div id='menu'>{nav}</div><div id='story'><p>{}</p></div></body>",
        words(1200)
    );
    let doc = Document::from_html(&html);

    let (root, origin) = ContentExtractor::find_main_content(&doc).unwrap();
    assert_eq!(origin, ContentOrigin::Density);
    assert_ne!(root.value().id(), Some("menu"));

    let menu = doc.select_first("#menu").unwrap().unwrap();
    assert_eq!(DensityScorer::score(menu).unwrap(), None);
}

#[test]
fn test_body_fallback_when_nothing_qualifies() {
    let doc = Document::from_html("<body><span>tiny</span></body>");
    let block = ContentExtractor::extract(&doc).unwrap();
    assert_eq!(block.origin, ContentOrigin::Body);
    assert_eq!(block.text, "tiny");
    assert!(block.headings.is_empty());
    assert!(block.links.is_empty());
}

// ============================================================================
// Links and images
// ============================================================================

#[test]
fn test_links_are_capped_and_deduplicated() {
    let links: String = (0..30)
        .map(|i| format!("<a href='/p{}'>link {i}</a>", i % 25))
        .collect();
    let snap = DocumentSnapshot::new("https://example.com/", format!("<body>{links}</body>"));
    let doc = snap.parse();
    let extracted = LinkExtractor::extract(&doc, doc.body()).unwrap();

    assert_eq!(extracted.len(), LinkExtractor::MAX_LINKS);
    assert_eq!(extracted[0].url, "https://example.com/p0");
    assert_eq!(extracted[0].link_type, LinkType::Internal);
}

#[test]
fn test_image_dedup_filter_and_order() {
    let snap = DocumentSnapshot::new(
        "https://example.com/",
        r#"<body>
            <img src="/a.jpg" data-pl-natural-w="300" data-pl-natural-h="300">
            <img src="/a.jpg" data-pl-natural-w="300" data-pl-natural-h="300">
            <img src="/b.jpg" data-pl-natural-w="90" data-pl-natural-h="900">
            <img src="/c.jpg" data-pl-natural-w="600" data-pl-natural-h="600">
           </body>"#,
    );
    let images = ImageExtractor::extract(&snap.parse()).unwrap();
    let srcs: Vec<&str> = images.iter().map(|i| i.src.as_str()).collect();
    assert_eq!(
        srcs,
        vec!["https://example.com/c.jpg", "https://example.com/a.jpg"]
    );
}

#[test]
fn test_generic_extractor_combines_content_and_images() {
    let snap = DocumentSnapshot::new("https://example.com/notes", article_page());
    let doc = snap.parse();
    let generic = GenericExtractor::extract(&doc).unwrap();
    assert_eq!(generic.content.headings.len(), 3);
    assert!(generic.images.is_empty());

    let stats = PageStructureStats::analyze(&doc).unwrap();
    assert_eq!(stats.link_count, 4);
    assert_eq!(stats.paragraph_count, 3);
}
