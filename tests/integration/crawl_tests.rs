//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run complete
//! crawls end-to-end. Links on the mock pages are relative: an absolute link
//! to the mock server carries a port, which the href checks reject.

use pattern_crawl::config::Config;
use pattern_crawl::crawler::{crawl, Coordinator};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with the given presets and no page cache
fn create_test_config(presets: &[&str]) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = 1;
    config.crawler.max_hrefs = 5;
    config.search.presets = presets.iter().map(|p| p.to_string()).collect();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_expected(server: &MockServer, page: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_page_zip_search() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/page2.html">Contact</a>"#).await;
    mount_expected(&server, "/page2.html", "<p>Hoofdstraat 1, 1234 AB Utrecht</p>", 1).await;

    let report = crawl(create_test_config(&["zip"]), &server.uri())
        .await
        .unwrap();

    assert!(report.exists);
    assert_eq!(report.ssl, Some(false));
    assert_eq!(report.matches.get("zip").unwrap(), ["1234 AB"]);
    assert_eq!(report.href_counter, 1);

    let visited: Vec<&str> = report.visited.iter().map(|u| u.path()).collect();
    assert_eq!(visited, vec!["/", "/page2.html"]);
    assert!(report.to_string().contains("zip : [\"1234 AB\"]"));
}

#[tokio::test]
async fn test_matches_accumulate_across_pages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<p>Office 1111 AA</p><a href="a.html">A</a><a href="b.html">B</a>"#,
    )
    .await;
    mount_page(&server, "/a.html", "<p>Depot 2222 BB</p>").await;
    mount_page(&server, "/b.html", "<p>Office 1111 AA</p>").await;

    let report = crawl(create_test_config(&["zip"]), &server.uri())
        .await
        .unwrap();

    assert_eq!(
        report.matches.get("zip").unwrap(),
        ["1111 AA", "2222 BB", "1111 AA"]
    );
    assert_eq!(report.visited.len(), 3);
}

#[tokio::test]
async fn test_stop_key_halts_href_loop() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/about.html">About</a><a href="/news.html">News</a>"#,
    )
    .await;
    mount_expected(&server, "/about.html", "<p>KvK 12345678</p>", 1).await;
    mount_expected(&server, "/news.html", "<p>nothing</p>", 0).await;

    let mut config = create_test_config(&["kvk"]);
    config.search.stop_on_found = vec!["kvk".to_string()];

    let report = crawl(config, &server.uri()).await.unwrap();

    assert_eq!(report.matches.get("kvk").unwrap(), ["12345678"]);
    assert_eq!(report.href_counter, 1);
}

#[tokio::test]
async fn test_ranking_visits_preferred_hrefs_first() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="news.html">News</a><a href="contact.html">Contact</a>"#,
    )
    .await;
    mount_expected(&server, "/contact.html", "<p>KvK 87654321</p>", 1).await;
    mount_expected(&server, "/news.html", "<p>news</p>", 0).await;

    let mut config = create_test_config(&["kvk"]);
    config.search.stop_on_found = vec!["kvk".to_string()];
    config.search.ranking = vec!["contact".to_string()];

    let report = crawl(config, &server.uri()).await.unwrap();

    let table = report.hrefs.unwrap();
    assert_eq!(table.get(0).unwrap().href, "contact.html");
    assert_eq!(table.get(0).unwrap().ranking, 1);
    assert_eq!(table.get(0).unwrap().clicks, 1);
    assert_eq!(table.get(1).unwrap().clicks, 0);
}

#[tokio::test]
async fn test_deep_href_rejected_even_when_ranked() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/a/b/contact.html">Contact</a><a href="/plain.html">Plain</a>"#,
    )
    .await;
    mount_expected(&server, "/a/b/contact.html", "<p>1234 AB</p>", 0).await;
    mount_expected(&server, "/plain.html", "<p>plain</p>", 1).await;

    let mut config = create_test_config(&["zip"]);
    config.search.ranking = vec!["contact".to_string()];

    let report = crawl(config, &server.uri()).await.unwrap();

    assert!(report.matches.get("zip").unwrap().is_empty());
    assert_eq!(report.hrefs.unwrap().len(), 1);
    assert_eq!(report.href_counter, 1);
}

#[tokio::test]
async fn test_rejected_links_not_followed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r##"<a href="#">Top</a>
           <a href="search.html?q=1">Search</a>
           <a href="brochure.pdf">Brochure</a>
           <a href="mailto:info@example.com">Mail</a>
           <a href="tel:0101234567">Call</a>"##,
    )
    .await;
    mount_expected(&server, "/search.html", "", 0).await;
    mount_expected(&server, "/brochure.pdf", "", 0).await;

    let report = crawl(create_test_config(&["zip"]), &server.uri())
        .await
        .unwrap();

    assert_eq!(report.href_counter, 0);
    assert!(report.hrefs.unwrap().is_empty());
    assert_eq!(report.visited.len(), 1);
}

#[tokio::test]
async fn test_max_hrefs_limit() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="a.html">A</a><a href="b.html">B</a><a href="c.html">C</a>"#,
    )
    .await;
    mount_expected(&server, "/a.html", "<p>a</p>", 1).await;
    mount_expected(&server, "/b.html", "<p>b</p>", 0).await;
    mount_expected(&server, "/c.html", "<p>c</p>", 0).await;

    let mut config = create_test_config(&["zip"]);
    config.crawler.max_hrefs = 1;

    let report = crawl(config, &server.uri()).await.unwrap();

    // hrefs past the limit are counted but not fetched
    assert_eq!(report.href_counter, 3);
    assert_eq!(report.visited.len(), 4);
}

#[tokio::test]
async fn test_branch_count_limit() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/shop/a.html">A</a><a href="/shop/b.html">B</a><a href="/info.html">Info</a>"#,
    )
    .await;
    mount_expected(&server, "/shop/a.html", "<p>a</p>", 1).await;
    mount_expected(&server, "/shop/b.html", "<p>b</p>", 0).await;
    mount_expected(&server, "/info.html", "<p>info</p>", 1).await;

    let mut config = create_test_config(&["zip"]);
    config.crawler.max_branch_count = Some(1);

    let report = crawl(config, &server.uri()).await.unwrap();
    assert_eq!(report.href_counter, 3);
}

#[tokio::test]
async fn test_frames_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><frameset><frame src="menu.html"><frame src="main.html"></frameset></html>"#,
        ))
        .mount(&server)
        .await;
    mount_expected(&server, "/menu.html", r#"<a href="contact.html">Contact</a>"#, 1).await;
    mount_expected(&server, "/main.html", "<p>Welcome</p>", 1).await;
    mount_expected(&server, "/contact.html", "<p>Postbus 1, 9999 ZZ</p>", 1).await;

    let report = crawl(create_test_config(&["zip"]), &server.uri())
        .await
        .unwrap();

    assert_eq!(report.frame_counter, 1);
    assert_eq!(report.matches.get("zip").unwrap(), ["9999 ZZ"]);
    assert_eq!(report.href_counter, 1);
}

#[tokio::test]
async fn test_self_referencing_frameset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><frameset><frame src="/"><frame src="/inner.html"></frameset></html>"#,
        ))
        // once to resolve the seed, once to scan it
        .expect(2)
        .mount(&server)
        .await;
    mount_expected(&server, "/inner.html", "<p>1234 AB</p>", 1).await;

    let report = crawl(create_test_config(&["zip"]), &server.uri())
        .await
        .unwrap();

    assert_eq!(report.frame_counter, 1);
    assert_eq!(report.matches.get("zip").unwrap(), ["1234 AB"]);
    let visited: Vec<&str> = report.visited.iter().map(|u| u.path()).collect();
    assert_eq!(visited, vec!["/", "/inner.html"]);
}

#[tokio::test]
async fn test_frames_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><frameset><frame src="main.html"></frameset></html>"#,
        ))
        .mount(&server)
        .await;
    mount_expected(&server, "/main.html", "<p>1234 AB</p>", 0).await;

    let mut config = create_test_config(&["zip"]);
    config.crawler.max_frames = 0;

    let report = crawl(config, &server.uri()).await.unwrap();

    assert_eq!(report.frame_counter, 1);
    assert!(report.matches.get("zip").unwrap().is_empty());
}

#[tokio::test]
async fn test_cached_second_crawl() {
    let server = MockServer::start().await;
    // the seed is resolved live on every crawl
    mount_page(&server, "/", r#"<a href="page2.html">Next</a>"#).await;
    mount_expected(&server, "/page2.html", "<p>1234 AB</p>", 1).await;

    let cache_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&["zip"]);
    config.cache.enabled = true;
    config.cache.directory = cache_dir.path().to_string_lossy().to_string();

    let coordinator = Coordinator::new(config).unwrap();
    let first = coordinator.start(&server.uri()).await;
    let second = coordinator.start(&server.uri()).await;

    assert_eq!(first.matches, second.matches);
    assert_eq!(second.matches.get("zip").unwrap(), ["1234 AB"]);
    assert_eq!(second.visited, first.visited);
    assert_eq!(std::fs::read_dir(cache_dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn test_missing_page_does_not_stop_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="gone.html">Gone</a><a href="here.html">Here</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_expected(&server, "/here.html", "<p>1234 AB</p>", 1).await;

    let report = crawl(create_test_config(&["zip"]), &server.uri())
        .await
        .unwrap();

    assert_eq!(report.matches.get("zip").unwrap(), ["1234 AB"]);
    assert_eq!(report.href_counter, 2);
}

#[tokio::test]
async fn test_unresolvable_seed() {
    let report = crawl(create_test_config(&["zip"]), "127.0.0.1:9")
        .await
        .unwrap();

    assert!(!report.exists);
    assert!(report.url.is_none());
    assert!(report.connection_error);
    assert!(report.visited.is_empty());
    assert!(report.hrefs.is_none());
}

#[tokio::test]
async fn test_seed_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let report = crawl(create_test_config(&["zip"]), &server.uri())
        .await
        .unwrap();

    assert!(!report.exists);
    assert_eq!(report.status_code, Some(404));
}
