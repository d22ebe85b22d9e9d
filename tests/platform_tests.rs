//! Platform extraction tests
//!
//! Runs the orchestrator over saved note pages.

use pagelens::browser::StaticPage;
use pagelens::orchestrator::{ExtractOptions, ExtractionPayload, ExtractionResult, Orchestrator};
use pagelens::platform::{LoaderConfig, Platform, StopReason};
use pagelens::prompt::PromptBuilder;
use pretty_assertions::assert_eq;

const NOTE_URL: &str = "https://www.xiaohongshu.com/explore/66aa01";

const NOTE: &str = r#"<html><head>
    <title>城市骑行路线 - 小红书</title>
    <meta name="description" content="三条适合周末的骑行路线">
  </head><body>
  <div class="note-container">
    <div class="media-container">
      <img src="https://ci.xiaohongshu.com/1.jpg" data-pl-natural-w="1080" data-pl-natural-h="1440">
      <img src="https://ci.xiaohongshu.com/2.jpg">
    </div>
    <div class="author-wrapper">
      <a href="https://www.xiaohongshu.com/user/profile/60ab12"><img class="avatar-item" src="/avatar.jpg"></a>
      <span class="username">骑手阿杰</span>
    </div>
    <div class="note-content">
      <div id="detail-title">城市骑行路线</div>
      <div id="detail-desc">滨江、环湖、山道三条线路，附补给点。</div>
    </div>
    <div class="engage-bar">
      <span class="like-wrapper"><span class="count">2.3万</span></span>
      <span class="collect-wrapper"><span class="count">1k</span></span>
      <span class="chat-wrapper"><span class="count">88</span></span>
    </div>
    <div class="comments-container">
      <div class="parent-comment">
        <div class="author"><a class="name">小李</a></div>
        <div class="content"><span class="note-text">环湖那条真的很美</span></div>
        <div class="like"><span class="count">230</span></div>
        <div class="reply-container">
          <div class="comment-item-sub"><a class="name">骑手阿杰</a><span class="note-text">谢谢！</span></div>
        </div>
      </div>
      <div class="parent-comment">
        <div class="author"><a class="name">Amy</a></div>
        <div class="content"><span class="note-text">山道坡度大吗</span></div>
        <div class="like"><span class="count">5</span></div>
      </div>
    </div>
  </div></body></html>"#;

async fn extract(options: ExtractOptions) -> ExtractionResult {
    let page = StaticPage::new(NOTE_URL, NOTE);
    Orchestrator::extract(&page, &options, None).await
}

// ============================================================================
// Orchestration
// ============================================================================

#[tokio::test]
async fn test_note_takes_platform_path() {
    let result = extract(ExtractOptions::default()).await;
    let Some(ExtractionPayload::Platform {
        page_info,
        platform,
        post,
        structure,
    }) = result.payload()
    else {
        panic!("expected a platform payload, got {result:?}");
    };

    assert_eq!(*platform, Platform::Xiaohongshu);
    assert_eq!(page_info.description, "三条适合周末的骑行路线");
    assert_eq!(post.title, "城市骑行路线");
    assert_eq!(post.body_text, "滨江、环湖、山道三条线路，附补给点。");
    assert_eq!(post.author.display_name, "骑手阿杰");
    assert_eq!(post.author.platform_user_id, "60ab12");
    assert_eq!(post.author.avatar_url, "https://www.xiaohongshu.com/avatar.jpg");
    assert_eq!(post.stats.likes, 23_000);
    assert_eq!(post.stats.favorites, 1_000);
    assert_eq!(post.stats.comment_count, 88);
    assert_eq!(post.media.images.len(), 2);
    assert_eq!(post.comments.len(), 2);
    assert_eq!(post.comments[0].replies.len(), 1);
    assert_eq!(post.comments[0].replies[0].content, "谢谢！");
    assert!(post.comment_loading.is_none());
    assert_eq!(structure.image_count, 3);
}

#[tokio::test]
async fn test_platform_envelope_shape() {
    let result = extract(ExtractOptions::default()).await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["ok"], true);
    assert_eq!(json["payload"]["kind"], "platform");
    assert_eq!(json["payload"]["platform"], "xiaohongshu");
    assert_eq!(json["payload"]["post"]["stats"]["commentCount"], 88);
    assert_eq!(json["payload"]["post"]["comments"][1]["likeCount"], 5);
    assert!(json["payload"]["post"].get("commentLoading").is_none());

    let back: ExtractionResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}

#[tokio::test]
async fn test_auto_load_on_static_page_reports_exhausted() {
    let options = ExtractOptions::builder()
        .auto_load_comments(true)
        .loader(LoaderConfig::builder().no_delays().build())
        .build();
    let result = extract(options).await;
    let Some(ExtractionPayload::Platform { post, .. }) = result.payload() else {
        panic!("expected a platform payload, got {result:?}");
    };

    let report = post.comment_loading.expect("loader report");
    assert_eq!(report.stop_reason, StopReason::Exhausted);
    // one growing cycle, then three without growth
    assert_eq!(report.cycles, 4);
    assert!(report.completed);
    assert_eq!(post.comments.len(), 2);
    assert_eq!(post.comments[1].id, 2);
}

#[tokio::test]
async fn test_generic_host_ignores_note_markup() {
    let page = StaticPage::new("https://blog.example.com/rides", NOTE);
    let result = Orchestrator::extract(&page, &ExtractOptions::default(), None).await;
    assert!(matches!(
        result.payload(),
        Some(ExtractionPayload::Generic { .. })
    ));
}

// ============================================================================
// Prompt
// ============================================================================

#[tokio::test]
async fn test_platform_prompt_from_extraction() {
    let result = extract(ExtractOptions::default()).await;
    let prompt = PromptBuilder::build(result.payload().unwrap());

    assert!(prompt.contains("- Title: 城市骑行路线"));
    assert!(prompt.contains("- Author: @骑手阿杰 (id: 60ab12)"));
    assert!(prompt.contains("- Likes: 23000"));
    assert!(prompt.contains("## Comments (2 collected)"));
    // ranked by likes
    let first = prompt.find("环湖那条真的很美").unwrap();
    let second = prompt.find("山道坡度大吗").unwrap();
    assert!(first < second);
    assert!(prompt.contains("  -> @骑手阿杰: 谢谢！"));
}
