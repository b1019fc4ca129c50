use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use http::header::{CONTENT_TYPE, HOST};
use http::{Request, Response, StatusCode, request, response};
use pretty_assertions::assert_eq;
use relaybox::{
    CacheEngine, CacheError, CacheState, CacheSwitch, EngineConfig, KeyTemplate, Predicate,
    PredicateResult, RequestAction, RequestMeta, Rule, RuleSet, Status, Store, StreamContext,
};
use relaybox_core::CacheKey;
use relaybox_http::predicates::NeutralResponsePredicate;
use relaybox_http::predicates::response::StatusCodePredicate;
use relaybox_memory::MemoryStore;
use tokio::sync::Barrier;

const HEAD: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\n\r\n";

/// Request predicate that counts its evaluations.
#[derive(Clone)]
struct Counting {
    calls: Arc<AtomicUsize>,
    result: bool,
}

impl Counting {
    fn new(result: bool) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            result,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Predicate for Counting {
    type Subject = RequestMeta;

    async fn check(&self, _subject: &RequestMeta) -> PredicateResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PredicateResult::from_match(self.result)
    }
}

fn path_key() -> KeyTemplate {
    "path".parse().unwrap()
}

fn get(path: &str) -> request::Parts {
    Request::get(path)
        .header(HOST, "example.com")
        .body(())
        .unwrap()
        .into_parts()
        .0
}

fn status(code: u16) -> response::Parts {
    Response::builder()
        .status(code)
        .header(CONTENT_TYPE, "text/plain")
        .body(())
        .unwrap()
        .into_parts()
        .0
}

fn engine(rules: Vec<Rule>) -> CacheEngine<MemoryStore> {
    engine_with_store(MemoryStore::new(), rules)
}

fn engine_with_store(store: MemoryStore, rules: Vec<Rule>) -> CacheEngine<MemoryStore> {
    CacheEngine::builder(store).rules(RuleSet::new(rules)).build()
}

/// Feeds chunks the way a proxy does: whatever is not reported as
/// forwarded is offered again.
async fn forward<S: Store>(
    engine: &CacheEngine<S>,
    ctx: &mut StreamContext,
    chunks: &[&[u8]],
) -> Vec<u8> {
    let mut forwarded = Vec::new();
    for chunk in chunks {
        let mut rest: &[u8] = chunk;
        while !rest.is_empty() {
            let n = engine.on_body_chunk(ctx, rest).await;
            forwarded.extend_from_slice(&rest[..n]);
            rest = &rest[n..];
        }
    }
    forwarded
}

/// Runs one complete exchange and returns the bytes forwarded to the client.
async fn exchange<S: Store>(
    engine: &CacheEngine<S>,
    path: &str,
    code: u16,
    body: &[&[u8]],
) -> (CacheState, Vec<u8>) {
    let mut ctx = engine.attach().unwrap();
    if let RequestAction::ServeFromCache(entry) =
        engine.on_request_headers(&mut ctx, &get(path)).await
    {
        let state = ctx.state();
        engine.detach(ctx).await;
        return (state, entry.body().to_vec());
    }
    engine
        .on_response_headers(&mut ctx, &status(code), HEAD.len())
        .await;
    let mut chunks: Vec<&[u8]> = vec![HEAD];
    chunks.extend_from_slice(body);
    let forwarded = forward(engine, &mut ctx, &chunks).await;
    engine.on_body_end(&mut ctx).await;
    let state = ctx.state();
    engine.detach(ctx).await;
    (state, forwarded)
}

fn concat(chunks: &[&[u8]]) -> Vec<u8> {
    chunks.concat()
}

#[tokio::test]
async fn test_non_cacheable_method_bypasses_rules() {
    let predicate = Counting::new(true);
    let engine = engine(vec![Rule::builder("all").when(predicate.clone()).build()]);

    let mut ctx = engine.attach().unwrap();
    let request = Request::patch("/a").body(()).unwrap().into_parts().0;
    let action = engine.on_request_headers(&mut ctx, &request).await;

    assert!(matches!(action, RequestAction::Forward));
    assert_eq!(ctx.state(), CacheState::Bypass);
    assert!(ctx.stash().is_empty());
    assert_eq!(predicate.calls(), 0);

    engine.on_response_headers(&mut ctx, &status(200), 0).await;
    assert_eq!(ctx.state(), CacheState::Bypass);
    engine.detach(ctx).await;
    assert_eq!(engine.stats().snapshot().bypass, 1);
}

#[tokio::test]
async fn test_stash_has_one_entry_per_enabled_rule_in_order() {
    let engine = engine(vec![
        Rule::builder("r0").enabled(false).key(path_key()).build(),
        Rule::builder("r1").key(path_key()).when(Counting::new(false)).build(),
        Rule::builder("r2").when(Counting::new(false)).build(),
    ]);

    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/a")).await;

    assert_eq!(ctx.state(), CacheState::Init);
    let stashed: Vec<_> = ctx
        .stash()
        .iter()
        .map(|entry| {
            let name = engine.rules().get(entry.rule()).unwrap().name();
            (name, entry.key().as_str().to_owned())
        })
        .collect();
    assert_eq!(
        stashed,
        vec![
            ("r1", "path=/a".to_owned()),
            (
                "r2",
                "method=GET&scheme=http&host=example.com&uri=/a".to_owned()
            ),
        ]
    );
    engine.detach(ctx).await;
}

#[tokio::test]
async fn test_scenario_a_capture_and_finish() {
    let engine = engine(vec![
        Rule::builder("R0").enabled(false).key(path_key()).build(),
        Rule::builder("R1")
            .key(path_key())
            .codes(vec![StatusCode::OK])
            .build(),
    ]);
    let body: &[&[u8]] = &[b"hello ", b"world"];

    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/a")).await;
    assert_eq!(ctx.state(), CacheState::Pass);
    assert_eq!(ctx.stash().len(), 1);
    let (r1, _) = engine.rules().find("R1").unwrap();
    assert_eq!(ctx.matched_rule(), Some(r1));
    assert_eq!(ctx.stash().find(r1).unwrap().key().as_str(), "path=/a");

    engine
        .on_response_headers(&mut ctx, &status(200), HEAD.len())
        .await;
    assert_eq!(ctx.state(), CacheState::Create);
    assert_eq!(ctx.body_offset(), HEAD.len());

    let mut chunks: Vec<&[u8]> = vec![HEAD];
    chunks.extend_from_slice(body);
    let forwarded = forward(&engine, &mut ctx, &chunks).await;
    assert_eq!(forwarded, concat(&chunks));
    assert_eq!(ctx.captured(), 11);

    engine.on_body_end(&mut ctx).await;
    assert!(!ctx.has_open_entry());
    engine.detach(ctx).await;

    let entry = engine
        .store()
        .exists(&CacheKey::new("path=/a"))
        .await
        .unwrap()
        .expect("finished entry");
    assert_eq!(entry.body().as_ref(), b"hello world");
    assert_eq!(entry.head().headers()[CONTENT_TYPE], "text/plain");
    assert_eq!(engine.stats().snapshot().fetch, 1);
}

#[tokio::test]
async fn test_scenario_b_hit_skips_predicates() {
    let predicate = Counting::new(true);
    let engine = engine(vec![
        Rule::builder("R1")
            .key(path_key())
            .codes(vec![StatusCode::OK])
            .when(predicate.clone())
            .build(),
    ]);
    exchange(&engine, "/a", 200, &[b"cached"]).await;
    assert_eq!(predicate.calls(), 1);

    let mut ctx = engine.attach().unwrap();
    let action = engine.on_request_headers(&mut ctx, &get("/a")).await;
    let RequestAction::ServeFromCache(entry) = action else {
        panic!("expected a cache hit");
    };
    assert_eq!(entry.body().as_ref(), b"cached");
    assert_eq!(ctx.state(), CacheState::Hit);
    assert_eq!(predicate.calls(), 1);

    assert_eq!(engine.on_body_chunk(&mut ctx, b"anything").await, 8);
    engine.detach(ctx).await;
    assert_eq!(engine.stats().snapshot().hit, 1);
}

#[tokio::test]
async fn test_scenario_c_rejected_status_is_not_cached() {
    let engine = engine(vec![
        Rule::builder("R1")
            .key(path_key())
            .codes(vec![StatusCode::OK])
            .build(),
    ]);
    let body: &[&[u8]] = &[b"not ", b"found"];

    let (state, forwarded) = exchange(&engine, "/missing", 404, body).await;

    assert_eq!(state, CacheState::Pass);
    let mut expected = HEAD.to_vec();
    expected.extend_from_slice(b"not found");
    assert_eq!(forwarded, expected);
    assert_eq!(engine.store().creating_len(), 0);
    assert!(
        engine
            .store()
            .exists(&CacheKey::new("path=/missing"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_scenario_d_disconnect_aborts_capture() {
    let engine = engine(vec![Rule::builder("R1").key(path_key()).build()]);

    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/a")).await;
    engine
        .on_response_headers(&mut ctx, &status(200), HEAD.len())
        .await;
    forward(&engine, &mut ctx, &[HEAD, b"first half"]).await;
    assert_eq!(ctx.state(), CacheState::Create);
    assert!(engine.store().is_creating(&CacheKey::new("path=/a")));

    engine.detach(ctx).await;

    assert_eq!(engine.store().creating_len(), 0);
    assert!(
        engine
            .store()
            .exists(&CacheKey::new("path=/a"))
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(engine.stats().snapshot().abort, 1);
}

#[tokio::test]
async fn test_short_write_invalidates_but_keeps_forwarding() {
    let store = MemoryStore::builder().max_entry_bytes(4).build();
    let engine = engine_with_store(store, vec![Rule::builder("R1").key(path_key()).build()]);

    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/a")).await;
    engine
        .on_response_headers(&mut ctx, &status(200), HEAD.len())
        .await;

    let chunks: &[&[u8]] = &[HEAD, b"abc", b"defgh", b"ijk"];
    let forwarded = forward(&engine, &mut ctx, chunks).await;

    assert_eq!(forwarded, concat(chunks));
    assert_eq!(ctx.state(), CacheState::Invalid);
    assert!(matches!(
        ctx.error(),
        Some(CacheError::CaptureShortfall {
            offered: 5,
            written: 1
        })
    ));
    assert!(!ctx.has_open_entry());

    engine.on_body_end(&mut ctx).await;
    engine.detach(ctx).await;
    assert_eq!(engine.store().creating_len(), 0);
    assert!(engine.store().is_empty());
    assert_eq!(engine.stats().snapshot().abort, 0);
}

#[tokio::test]
async fn test_at_most_one_writer_per_key() {
    let engine = engine(vec![Rule::builder("R1").key(path_key()).build()]);

    let mut first = engine.attach().unwrap();
    let mut second = engine.attach().unwrap();
    engine.on_request_headers(&mut first, &get("/a")).await;
    engine.on_request_headers(&mut second, &get("/a")).await;

    engine.on_response_headers(&mut first, &status(200), 0).await;
    engine.on_response_headers(&mut second, &status(200), 0).await;

    assert_eq!(first.state(), CacheState::Create);
    assert_eq!(second.state(), CacheState::Pass);
    assert!(!second.has_open_entry());

    assert_eq!(engine.on_body_chunk(&mut second, b"body").await, 4);
    assert_eq!(engine.on_body_chunk(&mut first, b"body").await, 4);
    engine.on_body_end(&mut second).await;
    engine.on_body_end(&mut first).await;
    engine.detach(second).await;
    engine.detach(first).await;

    let entry = engine
        .store()
        .exists(&CacheKey::new("path=/a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.body().as_ref(), b"body");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_exchanges_never_share_a_writer() {
    let engine = Arc::new(engine(vec![Rule::builder("R1").key(path_key()).build()]));
    let barrier = Arc::new(Barrier::new(16));

    let tasks = (0..16).map(|_| {
        let engine = Arc::clone(&engine);
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            let mut ctx = engine.attach().unwrap();
            engine.on_request_headers(&mut ctx, &get("/shared")).await;
            engine.on_response_headers(&mut ctx, &status(200), 0).await;
            let state = ctx.state();
            barrier.wait().await;
            engine.detach(ctx).await;
            state
        })
    });
    let states = futures::future::join_all(tasks).await;

    let writers = states
        .into_iter()
        .map(|state| state.unwrap())
        .filter(|state| *state == CacheState::Create)
        .count();
    assert_eq!(writers, 1);
    assert_eq!(engine.store().creating_len(), 0);
}

#[tokio::test]
async fn test_response_only_rule_builds_key_late() {
    let engine = engine(vec![
        Rule::builder("ok")
            .key(path_key())
            .response(NeutralResponsePredicate::new().status_code(StatusCode::OK))
            .build(),
    ]);

    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/late")).await;
    assert_eq!(ctx.state(), CacheState::Init);
    assert_eq!(ctx.stash().len(), 1);

    engine.on_response_headers(&mut ctx, &status(200), 0).await;
    assert_eq!(ctx.state(), CacheState::Create);
    forward(&engine, &mut ctx, &[b"late body"]).await;
    engine.on_body_end(&mut ctx).await;
    engine.detach(ctx).await;

    assert!(
        engine
            .store()
            .exists(&CacheKey::new("path=/late"))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_unmatched_exchange_stays_init() {
    let engine = engine(vec![
        Rule::builder("never")
            .key(path_key())
            .when(Counting::new(false))
            .build(),
    ]);

    let (state, forwarded) = exchange(&engine, "/a", 200, &[b"body"]).await;
    assert_eq!(state, CacheState::Init);
    assert_eq!(forwarded, concat(&[HEAD, b"body"]));
    assert!(engine.store().is_empty());
}

#[tokio::test]
async fn test_key_build_failure_skips_rule() {
    let engine = engine(vec![
        Rule::builder("by-host").key("host.path".parse().unwrap()).build(),
        Rule::builder("by-path").key(path_key()).build(),
    ]);

    let mut ctx = engine.attach().unwrap();
    let request = Request::get("/a").body(()).unwrap().into_parts().0;
    engine.on_request_headers(&mut ctx, &request).await;

    let (by_path, _) = engine.rules().find("by-path").unwrap();
    assert_eq!(ctx.state(), CacheState::Pass);
    assert_eq!(ctx.matched_rule(), Some(by_path));
    assert_eq!(ctx.stash().len(), 1);
    assert!(matches!(ctx.error(), Some(CacheError::KeyBuild(_))));
    engine.detach(ctx).await;
}

#[tokio::test]
async fn test_first_matching_rule_wins() {
    let engine = engine(vec![
        Rule::builder("first").key("path".parse().unwrap()).build(),
        Rule::builder("second").key("uri".parse().unwrap()).build(),
    ]);

    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/a")).await;
    let (first, _) = engine.rules().find("first").unwrap();
    assert_eq!(ctx.matched_rule(), Some(first));
    assert_eq!(ctx.stash().len(), 1);
    engine.detach(ctx).await;
}

#[tokio::test]
async fn test_attach_declines_when_switched_off() {
    let switch = CacheSwitch::default();
    let engine = CacheEngine::builder(MemoryStore::new())
        .switch(switch.clone())
        .build();
    assert!(engine.attach().is_some());

    switch.disable();
    assert!(engine.attach().is_none());
    switch.enable();
    assert!(engine.attach().is_some());

    let off = CacheEngine::builder(MemoryStore::new())
        .config(EngineConfig {
            status: Status::Off,
            ..Default::default()
        })
        .build();
    assert!(off.attach().is_none());
}

#[tokio::test]
async fn test_request_phase_triggers_housekeeping() {
    let store = MemoryStore::new();
    let engine = engine_with_store(
        store,
        vec![
            Rule::builder("short")
                .key(path_key())
                .ttl(Some(Duration::from_millis(10)))
                .build(),
        ],
    );
    exchange(&engine, "/a", 200, &[b"body"]).await;
    assert_eq!(engine.store().len(), 1);

    tokio::time::sleep(Duration::from_millis(30)).await;
    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/other")).await;
    assert_eq!(engine.store().len(), 0);
    engine.detach(ctx).await;
}

#[tokio::test]
async fn test_header_and_body_in_one_buffer_are_split() {
    let engine = engine(vec![Rule::builder("R1").key(path_key()).build()]);

    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/a")).await;
    engine
        .on_response_headers(&mut ctx, &status(200), HEAD.len())
        .await;
    assert_eq!(ctx.body_offset(), HEAD.len());

    let buffer = [HEAD, b"hello".as_slice()].concat();
    assert_eq!(engine.on_body_chunk(&mut ctx, &buffer).await, HEAD.len());
    assert_eq!(ctx.body_offset(), 0);
    assert_eq!(ctx.captured(), 0);

    let rest = &buffer[HEAD.len()..];
    assert_eq!(engine.on_body_chunk(&mut ctx, rest).await, rest.len());
    assert_eq!(ctx.captured(), 5);

    engine.on_body_end(&mut ctx).await;
    engine.detach(ctx).await;

    let entry = engine
        .store()
        .exists(&CacheKey::new("path=/a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.body().as_ref(), b"hello");
}

#[tokio::test]
async fn test_dropped_context_holds_key_until_creating_timeout() {
    let store = MemoryStore::builder()
        .creating_timeout(Duration::from_millis(200))
        .build();
    let engine = engine_with_store(store, vec![Rule::builder("R1").key(path_key()).build()]);

    let mut ctx = engine.attach().unwrap();
    engine.on_request_headers(&mut ctx, &get("/a")).await;
    engine
        .on_response_headers(&mut ctx, &status(200), HEAD.len())
        .await;
    assert_eq!(ctx.state(), CacheState::Create);
    drop(ctx);
    assert!(engine.store().is_creating(&CacheKey::new("path=/a")));

    let (state, _) = exchange(&engine, "/a", 200, &[b"blocked"]).await;
    assert_eq!(state, CacheState::Pass);
    assert!(engine.store().is_creating(&CacheKey::new("path=/a")));

    tokio::time::sleep(Duration::from_millis(300)).await;
    let (state, _) = exchange(&engine, "/a", 200, &[b"fresh"]).await;
    assert_eq!(state, CacheState::Create);
    assert_eq!(engine.store().creating_len(), 0);
    let entry = engine
        .store()
        .exists(&CacheKey::new("path=/a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.body().as_ref(), b"fresh");
}
