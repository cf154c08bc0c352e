use std::time::Duration;

use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::fetcher::PageFetcher;
use crate::parser;

/// Every this many pages the loop pauses before fetching, or the host starts timing out.
pub const THROTTLE_EVERY: u32 = 30;
pub const THROTTLE_PAUSE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Forbidden,
    FetchFailed,
    Empty,
    /// The host redirects out-of-range page numbers back to the last real page.
    Duplicate,
    PageLimit,
}

/// Pages collected for one address, in fetch order.
#[derive(Debug, Clone)]
pub struct Book {
    pub pages: Vec<String>,
    pub stop: StopReason,
}

impl Book {
    pub fn text(&self) -> String {
        self.pages.join("\n\n")
    }
}

pub fn page_url(base: &str, page: u32) -> String {
    if page <= 1 {
        return base.to_string();
    }
    format!("{}/page/{}", base.trim_end_matches('/'), page)
}

pub fn throttles_before(page: u32) -> bool {
    page % THROTTLE_EVERY == 0
}

pub struct Paginator<F> {
    fetcher: F,
    max_pages: Option<u32>,
    progress: ProgressBar,
}

impl<F: PageFetcher> Paginator<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_pages: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Stop once this many pages are collected. Unbounded by default.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Follow `{base}/page/{n}` until a stop condition. `None` if the first page is unreachable.
    pub async fn collect(&self, base: &str) -> Option<Book> {
        self.progress.set_message(format!("page 1: {}", base));
        let first = match self.fetcher.fetch(base).await {
            Ok(markup) => parser::process_page(&markup),
            Err(e) => {
                warn!(url = base, error = %e, "could not fetch first page");
                self.progress.finish_and_clear();
                return None;
            }
        };
        info!(page = 1, chars = first.len(), "collected page");
        self.progress.inc(1);

        let mut pages = vec![first];
        let mut page = 2u32;
        let stop = loop {
            if self.max_pages.is_some_and(|max| pages.len() as u32 >= max) {
                info!(pages = pages.len(), "page limit reached");
                break StopReason::PageLimit;
            }

            if throttles_before(page) {
                info!(page, pause_secs = THROTTLE_PAUSE.as_secs(), "throttling");
                self.progress.set_message(format!("page {}: pausing", page));
                tokio::time::sleep(THROTTLE_PAUSE).await;
            }

            let url = page_url(base, page);
            self.progress.set_message(format!("page {}: {}", page, url));
            let markup = match self.fetcher.fetch(&url).await {
                Ok(markup) => markup,
                Err(e) if e.is_forbidden() => {
                    warn!(page, url = %url, "access forbidden, stopping");
                    break StopReason::Forbidden;
                }
                Err(e) => {
                    warn!(page, url = %url, error = %e, "fetch failed, stopping");
                    break StopReason::FetchFailed;
                }
            };

            let text = parser::process_page(&markup);
            if text.trim().is_empty() {
                info!(page, "empty page, end of content");
                break StopReason::Empty;
            }
            let previous = pages.last().map(|p| p.trim()).unwrap_or_default();
            if text.trim() == previous {
                info!(page, "page repeats the previous one, end of content");
                break StopReason::Duplicate;
            }

            info!(page, chars = text.len(), "collected page");
            pages.push(text);
            self.progress.inc(1);
            page += 1;
        };

        self.progress.finish_and_clear();
        info!(pages = pages.len(), ?stop, "pagination finished");
        Some(Book { pages, stop })
    }
}
