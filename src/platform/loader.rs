//! Incremental comment loading
//!
//! Comment threads load lazily: more items appear after scrolling the list
//! or clicking a "load more" control. [`CommentLoader`] repeats
//! snapshot, merge, scroll and click cycles until the thread stops growing,
//! a cycle cap is hit or the caller cancels.
//!
//! ```text
//! Searching ──no container──▶ Done(NoContainer)
//!     │
//!     ▼
//! Loading ◀──growth── Stalled(streak) ──streak == limit──▶ Done(Exhausted)
//!     │                    ▲
//!     └────no growth───────┘
//! ```

use crate::browser::PageDriver;
use crate::dom::ElementTarget;
use crate::error::Result;
use crate::platform::comments::{Comment, CommentAccumulator, CommentParser};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Shared flag to stop a running load between cycles
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A flag that is not tripped
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Comment loader settings
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Hard cap on cycles (default: 50)
    pub max_cycles: usize,
    /// Consecutive cycles without new comments before giving up (default: 3)
    pub stall_limit: usize,
    /// Pause after scrolling (default: 1500ms)
    pub scroll_delay: Duration,
    /// Pause after clicking a load-more control (default: 1000ms)
    pub click_delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_cycles: 50,
            stall_limit: 3,
            scroll_delay: Duration::from_millis(1500),
            click_delay: Duration::from_millis(1000),
        }
    }
}

impl LoaderConfig {
    /// Create a new config builder
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }
}

/// Builder for LoaderConfig
#[derive(Default)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    /// Set the cycle cap
    pub fn max_cycles(mut self, cycles: usize) -> Self {
        self.config.max_cycles = cycles;
        self
    }

    /// Set the stall limit (at least 1)
    pub fn stall_limit(mut self, cycles: usize) -> Self {
        self.config.stall_limit = cycles.max(1);
        self
    }

    /// Set the pause after scrolling
    pub fn scroll_delay(mut self, delay: Duration) -> Self {
        self.config.scroll_delay = delay;
        self
    }

    /// Set the pause after clicking
    pub fn click_delay(mut self, delay: Duration) -> Self {
        self.config.click_delay = delay;
        self
    }

    /// Zero both pauses
    pub fn no_delays(self) -> Self {
        self.scroll_delay(Duration::ZERO).click_delay(Duration::ZERO)
    }

    /// Build the config
    pub fn build(self) -> LoaderConfig {
        self.config
    }
}

/// Why loading stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// The thread stopped growing
    Exhausted,
    /// The cycle cap was reached while comments were still arriving
    CycleLimit,
    /// No comment list on the page; a single static read was used
    NoContainer,
    /// The caller cancelled
    Cancelled,
    /// A snapshot failed mid-run
    PageUnavailable,
}

impl StopReason {
    /// Whether everything the page would show was collected
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Exhausted | Self::NoContainer)
    }
}

/// Summary of a loader run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Cycles executed
    pub cycles: usize,
    /// Loading ran to its natural end
    pub completed: bool,
    /// Terminal condition
    pub stop_reason: StopReason,
}

/// Comments collected by a loader run
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Distinct comments in accumulation order
    pub comments: Vec<Comment>,
    /// How the run ended
    pub report: LoadReport,
}

#[derive(Debug)]
enum LoaderState {
    Searching,
    Loading { container: ElementTarget },
    Stalled { container: ElementTarget, streak: usize },
    Done(StopReason),
}

/// Drives a page until its comment thread is fully loaded
pub struct CommentLoader {
    config: LoaderConfig,
}

impl CommentLoader {
    /// Create a loader
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Loader settings
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load every comment the page will reveal.
    ///
    /// Never fails: a page that stops answering ends the run with
    /// [`StopReason::PageUnavailable`] and keeps what was collected.
    #[instrument(skip(self, driver, cancel))]
    pub async fn run<D: PageDriver>(&self, driver: &D, cancel: Option<&CancelFlag>) -> LoadOutcome {
        let mut acc = CommentAccumulator::default();
        let mut cycles = 0;
        let mut state = LoaderState::Searching;

        let reason = loop {
            state = match state {
                LoaderState::Searching => self.search(driver, &mut acc).await,
                LoaderState::Loading { container } => {
                    self.cycle(driver, container, 0, &mut cycles, &mut acc, cancel)
                        .await
                }
                LoaderState::Stalled { container, streak } => {
                    self.cycle(driver, container, streak, &mut cycles, &mut acc, cancel)
                        .await
                }
                LoaderState::Done(reason) => break reason,
            };
        };

        info!(
            "Comment loading stopped after {} cycles: {:?}, {} comments",
            cycles,
            reason,
            acc.len()
        );

        LoadOutcome {
            comments: acc.into_comments(),
            report: LoadReport {
                cycles,
                completed: reason.is_complete(),
                stop_reason: reason,
            },
        }
    }

    async fn search<D: PageDriver>(&self, driver: &D, acc: &mut CommentAccumulator) -> LoaderState {
        match self.locate(driver, acc).await {
            Ok(Some(container)) => {
                debug!("Comment container: {}", container);
                LoaderState::Loading { container }
            }
            Ok(None) => LoaderState::Done(StopReason::NoContainer),
            Err(e) => {
                warn!("Snapshot failed before comment loading: {}", e);
                LoaderState::Done(StopReason::PageUnavailable)
            }
        }
    }

    /// Container target; without one, the single static read is merged
    async fn locate<D: PageDriver>(
        &self,
        driver: &D,
        acc: &mut CommentAccumulator,
    ) -> Result<Option<ElementTarget>> {
        let doc = driver.snapshot().await?.parse();
        let container = CommentParser::locate_container(&doc)?;
        if container.is_none() {
            acc.merge(CommentParser::parse(&doc)?);
        }
        Ok(container)
    }

    async fn cycle<D: PageDriver>(
        &self,
        driver: &D,
        container: ElementTarget,
        streak: usize,
        cycles: &mut usize,
        acc: &mut CommentAccumulator,
        cancel: Option<&CancelFlag>,
    ) -> LoaderState {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            return LoaderState::Done(StopReason::Cancelled);
        }
        if *cycles >= self.config.max_cycles {
            return LoaderState::Done(StopReason::CycleLimit);
        }
        *cycles += 1;

        let added = match self.read_comments(driver, acc).await {
            Ok(added) => added,
            Err(e) => {
                warn!("Snapshot failed during comment loading: {}", e);
                return LoaderState::Done(StopReason::PageUnavailable);
            }
        };

        let streak = if added > 0 { 0 } else { streak + 1 };
        debug!(
            "Cycle {}: {} new, {} total, stall streak {}",
            cycles,
            added,
            acc.len(),
            streak
        );
        if streak >= self.config.stall_limit {
            return LoaderState::Done(StopReason::Exhausted);
        }

        if let Err(e) = driver.scroll_to_bottom(Some(&container)).await {
            warn!("Scroll failed: {}", e);
        }
        tokio::time::sleep(self.config.scroll_delay).await;

        match self.find_load_more(driver).await {
            Ok(Some(control)) => match driver.click(&control).await {
                Ok(()) => {
                    debug!("Clicked {}", control);
                    tokio::time::sleep(self.config.click_delay).await;
                }
                Err(e) => warn!("Click on {} failed: {}", control, e),
            },
            Ok(None) => {}
            Err(e) => {
                warn!("Snapshot failed during comment loading: {}", e);
                return LoaderState::Done(StopReason::PageUnavailable);
            }
        }

        if streak == 0 {
            LoaderState::Loading { container }
        } else {
            LoaderState::Stalled { container, streak }
        }
    }

    async fn read_comments<D: PageDriver>(
        &self,
        driver: &D,
        acc: &mut CommentAccumulator,
    ) -> Result<usize> {
        let snapshot = driver.snapshot().await?;
        let batch = CommentParser::parse(&snapshot.parse())?;
        Ok(acc.merge(batch))
    }

    async fn find_load_more<D: PageDriver>(&self, driver: &D) -> Result<Option<ElementTarget>> {
        let snapshot = driver.snapshot().await?;
        CommentParser::find_load_more(&snapshot.parse())
    }
}
