//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator resolves a seed, then walks the site depth-first:
//! every page is scanned for the search patterns, its frames are descended
//! into, and on pages that follow hrefs the ranked href table is walked one
//! link at a time until a limit or a stop key ends the crawl.
//!
//! The walk runs on an explicit stack of [`Task`]s so that arbitrarily deep
//! frame nesting never grows the call stack.

use crate::cache::DiskCache;
use crate::config::{validate, Config};
use crate::crawler::fetcher::{build_http_client, resolve_scheme, FetchOptions, Fetcher};
use crate::crawler::parser::scan_page;
use crate::crawler::ranking::HrefTable;
use crate::output::CrawlReport;
use crate::search::SearchSpec;
use crate::state::CrawlState;
use crate::url::HrefRules;
use crate::{ConfigError, CrawlError, Limit};
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use url::Url;

/// Numeric bounds of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    pub max_frames: u32,
    pub max_hrefs: u32,
    pub max_branch_count: Option<u32>,
}

/// One pending step of the depth-first walk
#[derive(Debug)]
enum Task {
    /// Fetch and scan a page
    Visit { url: Url, follow_hrefs: bool },

    /// Descend into the frames of `page`, starting at index `next`
    Frames {
        page: Url,
        sources: Vec<String>,
        next: usize,
        follow_hrefs: bool,
    },

    /// Walk the href table, starting at index `next`
    ///
    /// `links` holds the raw links of `page` until the table has been
    /// consulted for this page.
    Hrefs {
        page: Url,
        links: Option<Vec<String>>,
        next: usize,
    },

    /// Set the stop flag if any stop key has matched
    StopCheck,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    client: Client,
    fetcher: Fetcher<DiskCache>,
    spec: SearchSpec,
    ranking: Vec<Regex>,
    rules: HrefRules,
    stop_keys: Vec<String>,
    limits: CrawlLimits,
}

impl Coordinator {
    /// Creates a new coordinator from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Configuration is valid and the HTTP client was built
    /// * `Err(CrawlError)` - Invalid configuration or client setup failure
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        validate(&config)?;

        let client = build_http_client(&config.crawler)?;
        let spec = SearchSpec::from_config(&config.search)?;
        let ranking = config
            .search
            .ranking
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|e| ConfigError::InvalidPattern(format!("ranking '{}': {}", pattern, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let options = FetchOptions {
            timeout: config.crawler.timeout(),
            skip_cache: !config.cache.enabled,
            max_cache_dir_size_mb: config.cache.max_size_mb,
            raise_errors: false,
        };
        let fetcher = Fetcher::new(
            client.clone(),
            DiskCache::new(&config.cache.directory),
            options,
        );

        Ok(Self {
            client,
            fetcher,
            spec,
            ranking,
            rules: HrefRules {
                valid_extensions: config.crawler.valid_extensions.clone(),
                max_depth: config.crawler.max_depth,
            },
            stop_keys: config.search.stop_on_found.clone(),
            limits: CrawlLimits {
                max_frames: config.crawler.max_frames,
                max_hrefs: config.crawler.max_hrefs,
                max_branch_count: config.crawler.max_branch_count,
            },
        })
    }

    pub fn spec(&self) -> &SearchSpec {
        &self.spec
    }

    pub fn limits(&self) -> CrawlLimits {
        self.limits
    }

    /// Crawls the site behind `seed` and reports what was found
    ///
    /// The seed may be given with or without scheme. A seed that answers
    /// neither over https nor http yields a report with `exists == false`.
    pub async fn start(&self, seed: &str) -> CrawlReport {
        let started_at = Utc::now();
        let mut state = CrawlState::new(&self.spec);

        let resolution = resolve_scheme(&self.client, seed).await;
        match &resolution.url {
            Some(url) => {
                tracing::info!("Start searching {}", url);
                state.mark_visited(url);
                self.recursive_pattern_search(url.clone(), true, &mut state)
                    .await;
                tracing::info!(
                    "Done searching {}: {} pages, {} hrefs followed, {} matches",
                    url,
                    state.visited().len(),
                    state.href_counter,
                    state.matches.total()
                );
            }
            None => tracing::warn!(
                "Could not resolve {} (status {:?}, connection error: {})",
                seed,
                resolution.status_code,
                resolution.connection_error
            ),
        }

        CrawlReport::new(seed, resolution, state, started_at)
    }

    /// Scans `url` and everything reachable from it within the limits
    ///
    /// With `follow_hrefs` the href table is walked after the page's frames;
    /// pages reached through an href never follow hrefs themselves.
    pub async fn recursive_pattern_search(
        &self,
        url: Url,
        follow_hrefs: bool,
        state: &mut CrawlState,
    ) {
        let mut tasks = vec![Task::Visit { url, follow_hrefs }];

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit { url, follow_hrefs } => {
                    self.visit(url, follow_hrefs, state, &mut tasks).await;
                }
                Task::Frames {
                    page,
                    sources,
                    next,
                    follow_hrefs,
                } => self.next_frame(page, sources, next, follow_hrefs, state, &mut tasks),
                Task::Hrefs { page, links, next } => {
                    self.follow_hrefs(page, links, next, state, &mut tasks)
                        .await;
                }
                Task::StopCheck => self.check_stop_keys(state),
            }
        }
    }

    async fn visit(
        &self,
        url: Url,
        follow_hrefs: bool,
        state: &mut CrawlState,
        tasks: &mut Vec<Task>,
    ) {
        if state.is_stopped() {
            tracing::debug!("Stop flag set, skipping {}", url);
            return;
        }

        let page = match self.fetcher.fetch(url.as_str()).await {
            Ok(Some(page)) if page.is_ok() => page,
            Ok(Some(page)) => {
                tracing::warn!("Page not found: {} (HTTP {})", url, page.status);
                return;
            }
            Ok(None) => {
                tracing::warn!("Page not found: {}", url);
                return;
            }
            Err(e) => {
                tracing::warn!("Page not found: {}: {}", url, e);
                return;
            }
        };

        state.exists = true;
        let scanned = scan_page(&page.body, &self.spec);
        state.matches.merge(scanned.matches);

        // frames run before hrefs, so they are pushed last
        if follow_hrefs {
            tasks.push(Task::Hrefs {
                page: url.clone(),
                links: Some(scanned.links),
                next: 0,
            });
        }
        if !scanned.frames.is_empty() {
            state.frame_counter += 1;
            tasks.push(Task::Frames {
                page: url,
                sources: scanned.frames,
                next: 0,
                follow_hrefs,
            });
        } else {
            tracing::debug!("No frames found for {}", url);
        }
    }

    fn next_frame(
        &self,
        page: Url,
        sources: Vec<String>,
        next: usize,
        follow_hrefs: bool,
        state: &mut CrawlState,
        tasks: &mut Vec<Task>,
    ) {
        let Some(src) = sources.get(next).cloned() else {
            return;
        };
        let frame = page.join(&src);
        tasks.push(Task::Frames {
            page,
            sources,
            next: next + 1,
            follow_hrefs,
        });

        if state.frame_counter > self.limits.max_frames {
            tracing::warn!(
                "{}",
                CrawlError::LimitExceeded {
                    limit: Limit::Frames,
                    count: state.frame_counter,
                    max: self.limits.max_frames,
                }
            );
            return;
        }

        match frame {
            Ok(url) if state.is_visited(&url) => {
                tracing::debug!("Skipping frame {}. Already visited it", url);
            }
            Ok(url) => {
                tracing::debug!("Descending into frame {}", url);
                state.mark_visited(&url);
                tasks.push(Task::Visit { url, follow_hrefs });
            }
            Err(e) => tracing::debug!("Skipping frame {}: {}", src, e),
        }
    }

    async fn follow_hrefs(
        &self,
        page: Url,
        links: Option<Vec<String>>,
        next: usize,
        state: &mut CrawlState,
        tasks: &mut Vec<Task>,
    ) {
        if state.is_stopped() {
            tracing::debug!("Stop flag set, not following hrefs on {}", page);
            return;
        }
        if let Some(links) = links {
            self.prepare_hrefs(&page, &links, state).await;
        }
        self.next_href(page, next, state, tasks);
    }

    /// Builds the href table on first use and records its external URLs
    async fn prepare_hrefs(&self, page: &Url, links: &[String], state: &mut CrawlState) {
        if state.href_table.is_none() {
            let table =
                HrefTable::build(&self.client, links, page, &self.rules, &self.ranking).await;
            state.href_table = Some(table);
        }

        let externals: Vec<Url> = state
            .href_table
            .iter()
            .flat_map(|table| table.externals().cloned())
            .collect();
        for url in &externals {
            tracing::debug!("Store external url {}", url);
            state.record_external(url);
        }
    }

    fn next_href(&self, page: Url, mut index: usize, state: &mut CrawlState, tasks: &mut Vec<Task>) {
        loop {
            if state.is_stopped() {
                tracing::debug!("Stop flag set, done following hrefs on {}", page);
                return;
            }

            let Some(record) = state.href_table.as_ref().and_then(|t| t.get(index)) else {
                tracing::debug!("Done following hrefs on {}", page);
                return;
            };
            let Some(url) = record.url.clone() else {
                index += 1;
                continue;
            };
            if state.is_visited(&url) {
                tracing::debug!("Skipping {}. Already followed it", url);
                index += 1;
                continue;
            }

            state.mark_visited(&url);
            state.href_counter += 1;
            if let Some(table) = state.href_table.as_mut() {
                table.record_click(index);
            }
            let branch_count = state.record_branch(&url);
            tracing::debug!("Found href {}: {}", state.href_counter, url);

            tasks.push(Task::Hrefs {
                page,
                links: None,
                next: index + 1,
            });
            tasks.push(Task::StopCheck);

            if state.href_counter > self.limits.max_hrefs {
                tracing::warn!(
                    "{}",
                    CrawlError::LimitExceeded {
                        limit: Limit::Hrefs,
                        count: state.href_counter,
                        max: self.limits.max_hrefs,
                    }
                );
            } else if let Some(max) = self
                .limits
                .max_branch_count
                .filter(|max| branch_count > *max)
            {
                tracing::warn!(
                    "{}",
                    CrawlError::LimitExceeded {
                        limit: Limit::Branch,
                        count: branch_count,
                        max,
                    }
                );
            } else {
                tasks.push(Task::Visit {
                    url,
                    follow_hrefs: false,
                });
            }
            return;
        }
    }

    fn check_stop_keys(&self, state: &mut CrawlState) {
        if let Some(key) = self
            .stop_keys
            .iter()
            .find(|key| state.matches.has_match(key))
        {
            tracing::debug!("Found a match for {}, stop following hrefs", key);
            state.stop();
        }
    }
}

/// Crawls every seed in turn with one coordinator
pub async fn run_crawl(config: Config, seeds: &[String]) -> Result<Vec<CrawlReport>, CrawlError> {
    let coordinator = Coordinator::new(config)?;
    let mut reports = Vec::with_capacity(seeds.len());
    for seed in seeds {
        reports.push(coordinator.start(seed).await);
    }
    Ok(reports)
}
