//! Integration tests for the full search pipeline.
//!
//! Catalogue sites are stood in for by a local `wiremock` server serving
//! fixture HTML, so these tests exercise real HTTP fetching, extraction,
//! dedup, ranking, broadening and truncation without touching the network.

use std::time::{Duration, Instant};

use tgscout_search::{GroupSearch, SearchConfig, SearchError, SourceConfig, SourceKind};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// tlgrm-style page with one `.channel-card` per entry.
fn tlgrm_page(cards: &[(&str, &str, u64)]) -> String {
    let body: String = cards
        .iter()
        .map(|(title, link, members)| {
            format!(
                r#"<div class="channel-card">
                     <h3 class="channel-title">{title}</h3>
                     <p class="channel-desc">Daily updates</p>
                     <span>{members} subscribers</span>
                     <a href="{link}">Join</a>
                   </div>"#
            )
        })
        .collect();
    format!("<html><body><main>{body}</main></body></html>")
}

/// Unstructured page with bare Telegram links.
fn store_page(links: &[(&str, &str)]) -> String {
    let body: String = links
        .iter()
        .map(|(title, link)| format!(r#"<div><a href="{link}">{title}</a></div>"#))
        .collect();
    format!("<html><body>{body}</body></html>")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn tlgrm_source(server: &MockServer) -> SourceConfig {
    SourceConfig::new(
        "tlgrm",
        SourceKind::Tlgrm,
        &format!("{}/tlgrm?search={{query}}", server.uri()),
    )
}

fn store_source(server: &MockServer) -> SourceConfig {
    SourceConfig::new(
        "telegram-store",
        SourceKind::TelegramStore,
        &format!("{}/store?q={{query}}", server.uri()),
    )
}

fn config(sources: Vec<SourceConfig>) -> SearchConfig {
    SearchConfig {
        sources,
        source_timeout_ms: 2_000,
        request_deadline_ms: 5_000,
        user_agent: Some("tgscout-test/1.0".into()),
        ..Default::default()
    }
}

fn links(result: &tgscout_search::SearchResult) -> Vec<&str> {
    result.records.iter().map(|r| r.link.as_str()).collect()
}

#[tokio::test]
async fn dedups_across_sources_and_ranks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .and(query_param("search", "crypto"))
        .respond_with(html(tlgrm_page(&[
            ("Crypto Signals", "https://t.me/cryptosignals", 500),
            ("Crypto News", "https://t.me/cryptonews", 15_000),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store"))
        .and(query_param("q", "crypto"))
        .respond_with(html(store_page(&[
            ("crypto news mirror", "https://t.me/CryptoNews/"),
            ("Bitcoin Chat", "https://t.me/btc_chat"),
        ])))
        .mount(&server)
        .await;

    let engine =
        GroupSearch::new(config(vec![tlgrm_source(&server), store_source(&server)])).expect("engine");
    let result = engine.search("crypto", 10).await.expect("search");

    assert_eq!(
        links(&result),
        ["https://t.me/cryptonews", "https://t.me/cryptosignals", "https://t.me/btc_chat"]
    );
    // The first-seen copy of the duplicate is kept.
    assert_eq!(result.records[0].source_id, "tlgrm");
    assert_eq!(result.records[0].title, "Crypto News");
    assert_eq!(result.records[0].member_count, 15_000);
    assert_eq!(result.sources_attempted, 2);
    assert_eq!(result.sources_succeeded, 2);
    assert!(!result.broadened);

    // Same input, same order.
    let again = engine.search("crypto", 10).await.expect("search");
    assert_eq!(links(&again), links(&result));
}

#[tokio::test]
async fn slow_source_is_cut_off_by_its_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .respond_with(html(tlgrm_page(&[("Slow", "https://t.me/slow_group", 0)])).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store"))
        .respond_with(html(store_page(&[
            ("Crypto One", "https://t.me/crypto_one"),
            ("Crypto Two", "https://t.me/crypto_two"),
            ("Crypto Three", "https://t.me/crypto_three"),
        ])))
        .mount(&server)
        .await;

    let mut tlgrm = tlgrm_source(&server);
    tlgrm.timeout_ms = Some(300);
    let engine = GroupSearch::new(config(vec![tlgrm, store_source(&server)])).expect("engine");

    let result = engine.search("crypto", 10).await.expect("search");
    assert!(result.elapsed < Duration::from_secs(2), "took {:?}", result.elapsed);
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.sources_succeeded, 1);
    assert!(result.records.iter().all(|r| r.source_id == "telegram-store"));
}

#[tokio::test]
async fn request_deadline_bounds_latency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .respond_with(html(tlgrm_page(&[("Slow", "https://t.me/slow_group", 0)])).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store"))
        .respond_with(html(store_page(&[
            ("Crypto One", "https://t.me/crypto_one"),
            ("Crypto Two", "https://t.me/crypto_two"),
            ("Crypto Three", "https://t.me/crypto_three"),
        ])))
        .mount(&server)
        .await;

    let engine = GroupSearch::new(SearchConfig {
        source_timeout_ms: 30_000,
        request_deadline_ms: 600,
        ..config(vec![tlgrm_source(&server), store_source(&server)])
    })
    .expect("engine");

    let result = engine.search("crypto", 10).await.expect("search");
    assert!(result.elapsed < Duration::from_secs(3), "took {:?}", result.elapsed);
    assert_eq!(result.sources_attempted, 2);
    assert_eq!(result.sources_succeeded, 1);
    assert_eq!(result.records.len(), 3);
}

#[tokio::test]
async fn results_truncated_to_requested_bound() {
    let server = MockServer::start().await;
    let cards: Vec<(String, String)> = (0..15)
        .map(|i| (format!("Crypto {i}"), format!("https://t.me/crypto_{i:02}")))
        .collect();
    let card_refs: Vec<(&str, &str, u64)> =
        cards.iter().map(|(t, l)| (t.as_str(), l.as_str(), 0)).collect();
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .respond_with(html(tlgrm_page(&card_refs)))
        .mount(&server)
        .await;

    let engine = GroupSearch::new(config(vec![tlgrm_source(&server)])).expect("engine");

    let result = engine.search("crypto", 5).await.expect("search");
    assert_eq!(result.records.len(), 5);
    assert_eq!(result.records[0].link, "https://t.me/crypto_00");

    // Below the floor is raised to 3.
    let result = engine.search("crypto", 1).await.expect("search");
    assert_eq!(result.records.len(), 3);
}

#[tokio::test]
async fn broadening_skipped_when_enough_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .and(query_param("search", "crypto"))
        .respond_with(html(tlgrm_page(&[
            ("Crypto A", "https://t.me/crypto_a", 0),
            ("Crypto B", "https://t.me/crypto_b", 0),
            ("Crypto C", "https://t.me/crypto_c", 0),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .and(query_param("search", "crypto group"))
        .respond_with(html(tlgrm_page(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let engine = GroupSearch::new(config(vec![tlgrm_source(&server)])).expect("engine");
    let result = engine.search("crypto", 10).await.expect("search");
    assert_eq!(result.records.len(), 3);
    assert!(!result.broadened);
}

#[tokio::test]
async fn broadening_fills_up_and_stops_at_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .and(query_param("search", "crypto"))
        .respond_with(html(tlgrm_page(&[("Crypto A", "https://t.me/crypto_a", 0)])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .and(query_param("search", "crypto group"))
        .respond_with(html(tlgrm_page(&[
            ("Crypto A", "https://t.me/crypto_a", 0),
            ("Crypto Group B", "https://t.me/crypto_b", 0),
            ("Crypto Group C", "https://t.me/crypto_c", 0),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .and(query_param("search", "crypto channel"))
        .respond_with(html(tlgrm_page(&[])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let engine =
        GroupSearch::new(config(vec![tlgrm_source(&server), store_source(&server)])).expect("engine");
    let result = engine.search("crypto", 10).await.expect("search");

    assert!(result.broadened);
    assert_eq!(
        links(&result),
        ["https://t.me/crypto_a", "https://t.me/crypto_b", "https://t.me/crypto_c"]
    );
    // Only the primary pass is counted.
    assert_eq!(result.sources_attempted, 2);
    assert_eq!(result.sources_succeeded, 1);
}

#[tokio::test]
async fn total_failure_is_an_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine =
        GroupSearch::new(config(vec![tlgrm_source(&server), store_source(&server)])).expect("engine");
    let result = engine.search("xyzzy123nonexistent", 10).await.expect("search");

    assert!(result.is_empty());
    assert!(result.broadened);
    assert_eq!(result.sources_attempted, 2);
    assert_eq!(result.sources_succeeded, 0);
}

#[tokio::test]
async fn invalid_query_sends_no_requests() {
    let server = MockServer::start().await;
    let engine =
        GroupSearch::new(config(vec![tlgrm_source(&server), store_source(&server)])).expect("engine");

    let err = engine.search("a", 10).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));
    let err = engine.search("   ", 10).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery(_)));

    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn direct_probe_reports_existing_identifiers() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/probe/rustjobs"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let probe = SourceConfig {
        max_records: 3,
        ..SourceConfig::new(
            "direct-probe",
            SourceKind::DirectProbe,
            &format!("{}/probe/{{query}}", server.uri()),
        )
    };
    let engine = GroupSearch::new(config(vec![probe])).expect("engine");
    let result = engine.search("Rust Jobs", 10).await.expect("search");

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].title, "@rustjobs");
    assert!(result.records[0].link.ends_with("/probe/rustjobs"));
    assert_eq!(result.records[0].member_count, 0);

    let heads = server.received_requests().await.expect("recording enabled");
    assert_eq!(heads.len(), 6, "every candidate is probed");
}

#[tokio::test]
async fn pages_are_fetched_with_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store"))
        .respond_with(html(store_page(&[("Crypto One", "https://t.me/crypto_one")])))
        .mount(&server)
        .await;

    let config = SearchConfig {
        user_agent: None,
        ..config(vec![store_source(&server)])
    };
    let engine = GroupSearch::new(config).expect("engine");
    engine.search("crypto", 10).await.expect("search");

    let requests = server.received_requests().await.expect("recording enabled");
    let first = requests.first().expect("page requested");
    let ua = first
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .expect("user agent sent");
    assert!(ua.starts_with("Mozilla/5.0"), "rotated browser UA, got {ua}");
    let referer = first
        .headers
        .get("referer")
        .and_then(|v| v.to_str().ok())
        .expect("referer sent");
    assert_eq!(referer, format!("{}/", server.uri()));
}

fn probe_source(template: &str) -> SourceConfig {
    SourceConfig {
        max_records: 3,
        ..SourceConfig::new("direct-probe", SourceKind::DirectProbe, template)
    }
}

#[tokio::test]
async fn direct_probe_keeps_hits_found_before_its_budget_runs_out() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/probe/rustjobs"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = SearchConfig {
        probe_timeout_ms: 1_500,
        probe_request_timeout_ms: 800,
        ..config(vec![probe_source(&format!("{}/probe/{{query}}", server.uri()))])
    };
    let engine = GroupSearch::new(config).expect("engine");
    let started = Instant::now();
    let result = engine.search("Rust Jobs", 10).await.expect("search");

    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].title, "@rustjobs");
    assert_eq!(result.sources_succeeded, 1);
}

#[tokio::test]
async fn direct_probe_with_no_answers_counts_as_failed() {
    // Nothing listens on the discard port, so every HEAD is refused.
    let engine = GroupSearch::new(config(vec![probe_source("http://127.0.0.1:9/{query}")]))
        .expect("engine");
    let result = engine.search("Rust Jobs", 10).await.expect("search");

    assert!(result.is_empty());
    assert_eq!(result.sources_attempted, 1);
    assert_eq!(result.sources_succeeded, 0);
}

#[tokio::test]
async fn direct_probe_skips_queries_without_latin_letters() {
    let server = MockServer::start().await;
    let engine = GroupSearch::new(config(vec![probe_source(&format!(
        "{}/probe/{{query}}",
        server.uri()
    ))]))
    .expect("engine");
    let result = engine.search("крипто клуб", 10).await.expect("search");

    assert!(result.is_empty());
    assert_eq!(result.sources_succeeded, 1);
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty(), "no identifier can be derived");
}

#[tokio::test]
async fn three_disjoint_sources_merge_into_one_ranked_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tlgrm"))
        .respond_with(html(tlgrm_page(&[
            ("Crypto Signals", "https://t.me/tl_signals", 800),
            ("Market Talk", "https://t.me/tl_market", 20_000),
            ("Crypto Whales", "https://t.me/tl_whales", 5_000),
            ("Daily Memes", "https://t.me/tl_memes", 100),
            ("Crypto Crypto News", "https://t.me/tl_news", 40),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store"))
        .respond_with(html(store_page(&[
            ("Crypto Traders", "https://t.me/st_traders"),
            ("Altcoin Club", "https://t.me/st_altcoin"),
            ("Crypto Jobs", "https://t.me/st_jobs"),
            ("NFT Corner", "https://t.me/st_nft"),
            ("DeFi Lounge", "https://t.me/st_defi"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generic"))
        .respond_with(html(store_page(&[
            ("Bitcoin Talk", "https://t.me/ge_bitcoin"),
            ("Crypto Mining", "https://t.me/ge_mining"),
            ("Ethereum Devs", "https://t.me/ge_eth"),
            ("Crypto Tax Help", "https://t.me/ge_tax"),
            ("Hodlers", "https://t.me/ge_hodl"),
        ])))
        .mount(&server)
        .await;

    let generic = SourceConfig::new(
        "generic",
        SourceKind::Generic,
        &format!("{}/generic?q={{query}}", server.uri()),
    );
    let engine = GroupSearch::new(config(vec![
        tlgrm_source(&server),
        store_source(&server),
        generic,
    ]))
    .expect("engine");
    let result = engine.search("crypto", 20).await.expect("search");

    assert_eq!(result.records.len(), 15);
    assert_eq!(result.sources_succeeded, 3);
    assert!(!result.broadened);
    assert!(
        result.records.windows(2).all(|pair| pair[0].score >= pair[1].score),
        "scores must not increase: {:?}",
        result.records.iter().map(|r| r.score).collect::<Vec<_>>()
    );
    // Title match, tlgrm bonus and member bonus stack on top.
    assert_eq!(result.records[0].link, "https://t.me/tl_whales");
}

#[tokio::test]
async fn search_for_remembers_last_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/store"))
        .respond_with(html(store_page(&[
            ("Crypto One", "https://t.me/crypto_one"),
            ("Crypto Two", "https://t.me/crypto_two"),
            ("Crypto Three", "https://t.me/crypto_three"),
        ])))
        .mount(&server)
        .await;

    let engine = GroupSearch::new(config(vec![store_source(&server)])).expect("engine");
    assert!(engine.last_result("chat-42").await.is_none());

    let result = engine.search_for("chat-42", "crypto", 10).await.expect("search");
    let cached = engine.last_result("chat-42").await.expect("cached");
    assert_eq!(cached.records, result.records);
    assert!(engine.last_result("chat-7").await.is_none());

    engine.shutdown();
    assert!(matches!(
        engine.search_for("chat-42", "crypto", 10).await,
        Err(SearchError::Closed)
    ));
}
