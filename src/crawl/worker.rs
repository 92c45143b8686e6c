// src/crawl/worker.rs
// =============================================================================
// This module implements the crawl loop.
//
// How one worker iteration goes:
// 1. Take the next URL from the frontier (None = crawl finished, stop)
// 2. Known trap? Mark it complete without fetching
// 3. Fetch it; anything but a 200 is marked complete and dropped
// 4. A redirect that lands outside the admission rules stops here
// 5. Extract links and tokens; a near-duplicate page stops here
// 6. Offer each link to the admission pipeline
// 7. Report statistics, mark complete, sleep the politeness delay
//
// Several workers can share one frontier and one pipeline. They run as
// futures on the same task (futures::join_all), so nothing here needs to be
// 'static, and each worker is strictly sequential on its own.
//
// Rust concepts:
// - Generics: CrawlWorker works with any Fetcher / Frontier / ResultsSink
// - Arc: shared ownership of the frontier, pipeline and results
// =============================================================================

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::Fetcher;
use super::frontier::{Frontier, MemoryFrontier};
use super::pipeline::{AdmissionPipeline, Verdict};
use super::stats::ResultsSink;
use crate::config::{CrawlConfig, QueryPolicy};
use crate::error::Result;
use crate::extract::{extract_links, page_tokens};
use crate::filter::normalize_absolute;

/// Per-worker counters, summed into the crawl total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub known_traps_skipped: usize,
    pub near_duplicates: usize,
    pub redirects_rejected: usize,
    pub links_scheduled: usize,
    pub links_rejected: usize,
}

impl CrawlSummary {
    fn merge(mut self, other: CrawlSummary) -> Self {
        self.pages_fetched += other.pages_fetched;
        self.fetch_failures += other.fetch_failures;
        self.known_traps_skipped += other.known_traps_skipped;
        self.near_duplicates += other.near_duplicates;
        self.redirects_rejected += other.redirects_rejected;
        self.links_scheduled += other.links_scheduled;
        self.links_rejected += other.links_rejected;
        self
    }
}

pub struct CrawlWorker<F, Q, R> {
    id: usize,
    fetcher: Arc<F>,
    frontier: Arc<Q>,
    pipeline: Arc<AdmissionPipeline>,
    results: Arc<R>,
    delay: Duration,
    policy: QueryPolicy,
}

impl<F, Q, R> CrawlWorker<F, Q, R>
where
    F: Fetcher,
    Q: Frontier,
    R: ResultsSink,
{
    pub fn new(
        id: usize,
        fetcher: Arc<F>,
        frontier: Arc<Q>,
        pipeline: Arc<AdmissionPipeline>,
        results: Arc<R>,
        config: &CrawlConfig,
    ) -> Self {
        Self {
            id,
            fetcher,
            frontier,
            pipeline,
            results,
            delay: Duration::from_millis(config.delay_ms),
            policy: config.query_policy,
        }
    }

    /// Run until the frontier reports it is empty.
    pub async fn run(&self) -> CrawlSummary {
        let mut summary = CrawlSummary::default();

        while let Some(url) = self.frontier.next_url().await {
            if self.pipeline.is_known_trap(&url) {
                debug!(worker = self.id, url = %url, "skipping known trap");
                summary.known_traps_skipped += 1;
                self.frontier.mark_complete(&url);
                continue;
            }

            self.process(&url, &mut summary).await;
            self.frontier.mark_complete(&url);

            // Polite crawling: pause between requests
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(worker = self.id, pages = summary.pages_fetched, "frontier is empty, stopping");
        summary
    }

    async fn process(&self, url: &Url, summary: &mut CrawlSummary) {
        let response = match self.fetcher.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(worker = self.id, error = %e, "fetch failed");
                summary.fetch_failures += 1;
                return;
            }
        };

        info!(worker = self.id, url = %url, status = response.status, "downloaded");
        if response.status != 200 {
            summary.fetch_failures += 1;
            return;
        }
        summary.pages_fetched += 1;

        // Redirect targets get the same treatment as any discovered link
        let page_url = match normalize_absolute(response.final_url.as_str(), self.policy) {
            Ok(final_url) => final_url,
            Err(e) => {
                warn!(worker = self.id, error = %e, "unusable redirect target");
                summary.redirects_rejected += 1;
                return;
            }
        };
        if page_url != *url {
            let verdict = self.pipeline.screen(&page_url);
            if verdict != Verdict::Scheduled {
                debug!(
                    worker = self.id,
                    from = %url,
                    to = %page_url,
                    ?verdict,
                    "redirect rejected"
                );
                summary.redirects_rejected += 1;
                return;
            }
        }
        let page_url = &page_url;

        let links = extract_links(page_url, &response.body, response.status, self.policy);
        let tokens = page_tokens(&response.body);

        if let Some(kind) = self.pipeline.check_page(page_url, &tokens) {
            debug!(worker = self.id, url = %page_url, ?kind, "not expanding near-duplicate page");
            summary.near_duplicates += 1;
            return;
        }

        for link in links {
            match self.pipeline.offer(link, self.frontier.as_ref()) {
                Verdict::Scheduled => summary.links_scheduled += 1,
                Verdict::Seen => {}
                Verdict::Rejected(_) | Verdict::Trap(_) => summary.links_rejected += 1,
            }
        }

        self.results.record_tokens(&tokens);
        self.results.record_page_length(page_url, tokens.len());
        if let Some(host) = page_url.host_str() {
            self.results.record_subdomain(host);
        }
        self.results.record_unique_page(page_url);
    }
}

/// Crawl from `seed` with `config.workers` workers until the frontier is empty.
pub async fn run_crawl<F, R>(
    seed: Url,
    config: &CrawlConfig,
    fetcher: Arc<F>,
    results: Arc<R>,
) -> Result<CrawlSummary>
where
    F: Fetcher,
    R: ResultsSink,
{
    config.validate()?;
    let pipeline = Arc::new(AdmissionPipeline::from_config(config)?);
    let frontier = Arc::new(MemoryFrontier::new(config.max_pages));
    pipeline.seed(seed, frontier.as_ref());

    let workers: Vec<_> = (0..config.workers)
        .map(|id| {
            CrawlWorker::new(
                id,
                Arc::clone(&fetcher),
                Arc::clone(&frontier),
                Arc::clone(&pipeline),
                Arc::clone(&results),
                config,
            )
        })
        .collect();

    let summaries = join_all(workers.iter().map(|worker| worker.run())).await;
    let total = summaries
        .into_iter()
        .fold(CrawlSummary::default(), CrawlSummary::merge);

    info!(
        pages = total.pages_fetched,
        completed = frontier.completed(),
        seen = pipeline.seen_count(),
        seen_fill = pipeline.seen_fill_ratio(),
        fingerprints = pipeline.fingerprint_count(),
        "crawl finished"
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::fetch::FetchResponse;
    use crate::crawl::stats::CrawlStats;
    use crate::error::CrawlError;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    // Serves canned pages and remembers every request
    #[derive(Default)]
    struct ScriptedFetcher {
        pages: HashMap<String, String>,
        redirects: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn redirect(mut self, from: &str, to: &str) -> Self {
            self.redirects.insert(from.to_string(), to.to_string());
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }

        fn times_fetched(&self, url: &str) -> usize {
            self.requests().iter().filter(|r| r.as_str() == url).count()
        }
    }

    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchResponse> {
            self.requests.lock().push(url.to_string());
            if url.path() == "/unreachable" {
                return Err(CrawlError::fetch(url.as_str(), "connection failed"));
            }
            let final_url = match self.redirects.get(url.as_str()) {
                Some(target) => Url::parse(target).unwrap(),
                None => url.clone(),
            };
            let (status, body) = match self.pages.get(final_url.as_str()) {
                Some(body) => (200, body.clone()),
                None => (404, String::new()),
            };
            Ok(FetchResponse {
                status,
                body,
                final_url,
            })
        }
    }

    fn config() -> CrawlConfig {
        CrawlConfig {
            delay_ms: 0,
            ..Default::default()
        }
    }

    fn seed(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_seed_page_with_fragment_duplicates() {
        let fetcher = Arc::new(ScriptedFetcher::default().page(
            "https://www.ics.uci.edu/",
            r#"<a href="/about">About</a> <a href="https://www.ics.uci.edu/about#team">Team</a>"#,
        ));
        let stats = Arc::new(CrawlStats::new());

        let summary = run_crawl(
            seed("https://www.ics.uci.edu/"),
            &config(),
            Arc::clone(&fetcher),
            Arc::clone(&stats),
        )
        .await
        .unwrap();

        assert_eq!(summary.links_scheduled, 1);
        assert_eq!(fetcher.times_fetched("https://www.ics.uci.edu/about"), 1);
        assert_eq!(
            fetcher.requests(),
            vec!["https://www.ics.uci.edu/", "https://www.ics.uci.edu/about"]
        );
    }

    #[tokio::test]
    async fn test_rejected_links_are_never_fetched() {
        let fetcher = Arc::new(ScriptedFetcher::default().page(
            "https://www.ics.uci.edu/",
            r#"
                <a href="/syllabus.pdf">PDF</a>
                <a href="https://www.google.com/">Elsewhere</a>
                <a href="/events/2023/2023/2023/">Loop</a>
                <a href="https://wiki.ics.uci.edu/doku.php">Wiki</a>
                <a href="mailto:someone@uci.edu">Mail</a>
                <a href="/people">People</a>
            "#,
        ));
        let stats = Arc::new(CrawlStats::new());

        let summary = run_crawl(
            seed("https://www.ics.uci.edu/"),
            &config(),
            Arc::clone(&fetcher),
            stats,
        )
        .await
        .unwrap();

        assert_eq!(summary.links_scheduled, 1);
        assert_eq!(summary.links_rejected, 4);
        assert_eq!(
            fetcher.requests(),
            vec!["https://www.ics.uci.edu/", "https://www.ics.uci.edu/people"]
        );
    }

    #[tokio::test]
    async fn test_known_trap_seed_is_not_fetched() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let stats = Arc::new(CrawlStats::new());

        let summary = run_crawl(
            seed("https://wiki.ics.uci.edu/doku.php?id=start"),
            &config(),
            Arc::clone(&fetcher),
            stats,
        )
        .await
        .unwrap();

        assert_eq!(summary.known_traps_skipped, 1);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_crawl() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page(
                    "https://www.ics.uci.edu/",
                    r#"<a href="/unreachable">x</a> <a href="/missing">y</a> <a href="/ok">z</a>"#,
                )
                .page("https://www.ics.uci.edu/ok", "<p>fine</p>"),
        );
        let stats = Arc::new(CrawlStats::new());

        let summary = run_crawl(
            seed("https://www.ics.uci.edu/"),
            &config(),
            Arc::clone(&fetcher),
            Arc::clone(&stats),
        )
        .await
        .unwrap();

        assert_eq!(summary.fetch_failures, 2);
        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(fetcher.times_fetched("https://www.ics.uci.edu/ok"), 1);
        assert_eq!(stats.unique_pages(), 2);
    }

    #[tokio::test]
    async fn test_near_duplicate_pages_are_not_expanded() {
        let archive = r#"
            <p>department news archive listing faculty awards student research
               highlights grants published papers events</p>
            <a href="more/">More</a>
        "#;
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page(
                    "https://www.ics.uci.edu/news/",
                    r#"<p>welcome to the news section</p>
                       <a href="archive/2019/">2019</a> <a href="archive/2020/">2020</a>"#,
                )
                .page("https://www.ics.uci.edu/news/archive/2019/", archive)
                .page("https://www.ics.uci.edu/news/archive/2020/", archive),
        );
        let stats = Arc::new(CrawlStats::new());

        let summary = run_crawl(
            seed("https://www.ics.uci.edu/news/"),
            &config(),
            Arc::clone(&fetcher),
            Arc::clone(&stats),
        )
        .await
        .unwrap();

        assert_eq!(summary.near_duplicates, 1);
        assert_eq!(fetcher.times_fetched("https://www.ics.uci.edu/news/archive/2019/more/"), 1);
        assert_eq!(fetcher.times_fetched("https://www.ics.uci.edu/news/archive/2020/more/"), 0);
        // The duplicate's words are not counted twice
        assert_eq!(stats.word_count("archive"), 1);
        assert_eq!(stats.unique_pages(), 2);
    }

    #[tokio::test]
    async fn test_textless_pages_are_still_expanded() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page(
                    "https://www.ics.uci.edu/gallery/",
                    r#"<a href="1/"><img src="a.jpg"></a> <a href="2/"><img src="b.jpg"></a>"#,
                )
                .page(
                    "https://www.ics.uci.edu/gallery/1/",
                    r#"<a href="/photos/alpha/"><img src="c.jpg"></a>"#,
                )
                .page(
                    "https://www.ics.uci.edu/gallery/2/",
                    r#"<a href="/photos/bravo/"><img src="d.jpg"></a>"#,
                ),
        );

        let summary = run_crawl(
            seed("https://www.ics.uci.edu/gallery/"),
            &config(),
            Arc::clone(&fetcher),
            Arc::new(CrawlStats::new()),
        )
        .await
        .unwrap();

        assert_eq!(summary.near_duplicates, 0);
        assert_eq!(fetcher.times_fetched("https://www.ics.uci.edu/photos/alpha/"), 1);
        assert_eq!(fetcher.times_fetched("https://www.ics.uci.edu/photos/bravo/"), 1);
    }

    #[tokio::test]
    async fn test_redirect_off_domain_is_not_counted() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page("https://www.ics.uci.edu/", r#"<a href="/login">Sign in</a>"#)
                .redirect(
                    "https://www.ics.uci.edu/login",
                    "https://login.uci.edu/sso?session=abc",
                )
                .page(
                    "https://login.uci.edu/sso?session=abc",
                    r#"<p>enter your credentials</p><a href="https://www.ics.uci.edu/x">x</a>"#,
                ),
        );
        let stats = Arc::new(CrawlStats::new());

        let summary = run_crawl(
            seed("https://www.ics.uci.edu/"),
            &config(),
            Arc::clone(&fetcher),
            Arc::clone(&stats),
        )
        .await
        .unwrap();

        assert_eq!(summary.redirects_rejected, 1);
        assert_eq!(stats.word_count("credentials"), 0);
        assert_eq!(stats.unique_pages(), 1);
        assert_eq!(fetcher.times_fetched("https://www.ics.uci.edu/x"), 0);
        let report = stats.report(10);
        assert!(report.subdomains.iter().all(|c| c.key != "login.uci.edu"));
    }

    #[tokio::test]
    async fn test_redirect_target_is_normalized() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .redirect(
                    "https://www.ics.uci.edu/old",
                    "https://www.ics.uci.edu/about/?ref=old#team",
                )
                .page(
                    "https://www.ics.uci.edu/about/?ref=old#team",
                    "<p>about the school of information and computer sciences</p>",
                ),
        );
        let stats = Arc::new(CrawlStats::new());

        let summary = run_crawl(
            seed("https://www.ics.uci.edu/old"),
            &config(),
            Arc::clone(&fetcher),
            Arc::clone(&stats),
        )
        .await
        .unwrap();

        assert_eq!(summary.redirects_rejected, 0);
        let longest = stats.report(0).longest_page.unwrap();
        assert_eq!(longest.url, "https://www.ics.uci.edu/about/");
    }

    #[tokio::test]
    async fn test_several_workers_fetch_each_page_once() {
        // Every page gets its own vocabulary so none look like duplicates
        let mut fetcher = ScriptedFetcher::default();
        let hub: String = (0..20)
            .map(|i| format!(r#"<a href="/p/{i}"></a><a href="/p/{}"></a>"#, (i + 1) % 20))
            .collect();
        fetcher = fetcher.page("https://www.ics.uci.edu/", &hub);
        for i in 0..20 {
            // Letters, not digits: digit runs are collapsed before fingerprinting
            let tag = (b'a' + i as u8) as char;
            let body = format!(
                r#"<p>alpha{tag} bravo{tag} charlie{tag} delta{tag} echo{tag} foxtrot{tag}</p>
                   <a href="/"></a><a href="/p/{}"></a>"#,
                (i + 7) % 20
            );
            fetcher = fetcher.page(&format!("https://www.ics.uci.edu/p/{i}"), &body);
        }
        let fetcher = Arc::new(fetcher);
        let stats = Arc::new(CrawlStats::new());
        let config = CrawlConfig {
            workers: 4,
            ..config()
        };

        let summary = run_crawl(
            seed("https://www.ics.uci.edu/"),
            &config,
            Arc::clone(&fetcher),
            Arc::clone(&stats),
        )
        .await
        .unwrap();

        assert_eq!(fetcher.requests().len(), 21);
        for i in 0..20 {
            assert_eq!(fetcher.times_fetched(&format!("https://www.ics.uci.edu/p/{i}")), 1);
        }
        assert_eq!(summary.links_scheduled, 20);
    }

    #[tokio::test]
    async fn test_page_budget_limits_fetches() {
        let fetcher = Arc::new(ScriptedFetcher::default().page(
            "https://www.ics.uci.edu/",
            r#"<a href="/a">a</a> <a href="/b">b</a> <a href="/c">c</a>"#,
        ));
        let config = CrawlConfig {
            max_pages: Some(2),
            ..config()
        };

        run_crawl(
            seed("https://www.ics.uci.edu/"),
            &config,
            Arc::clone(&fetcher),
            Arc::new(CrawlStats::new()),
        )
        .await
        .unwrap();

        assert_eq!(fetcher.requests().len(), 2);
    }
}
