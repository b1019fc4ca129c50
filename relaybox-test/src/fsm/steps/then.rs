use anyhow::{Error, anyhow};
use cucumber::then;
use relaybox::CacheState;
use relaybox_core::CacheKey;
use relaybox_store::Store;

use crate::fsm::world::FsmWorld;

fn parse_state(name: &str) -> Result<CacheState, Error> {
    let state = match name {
        "init" => CacheState::Init,
        "bypass" => CacheState::Bypass,
        "hit" => CacheState::Hit,
        "pass" => CacheState::Pass,
        "create" => CacheState::Create,
        "invalid" => CacheState::Invalid,
        _ => return Err(anyhow!("unknown cache state `{name}`")),
    };
    Ok(state)
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

// =============================================================================
// Exchange Assertions
// =============================================================================

#[then(expr = "the exchange state is {word}")]
fn exchange_state(world: &mut FsmWorld, expected: String) -> Result<(), Error> {
    let expected = parse_state(&expected)?;
    let actual = world.last_result()?.state;
    if actual != expected {
        return Err(anyhow!("Expected state {expected}, but got {actual}"));
    }
    Ok(())
}

#[then(expr = "the exchange went through {string}")]
fn exchange_transitions(world: &mut FsmWorld, expected: String) -> Result<(), Error> {
    let expected = split_list(&expected);
    let actual = world.collector.states();
    if actual != expected {
        return Err(anyhow!(
            "Expected transitions {:?}, but got {:?}",
            expected,
            actual
        ));
    }
    Ok(())
}

#[then(expr = "the response is served from the cache with body {string}")]
fn served_from_cache(world: &mut FsmWorld, body: String) -> Result<(), Error> {
    let result = world.last_result()?;
    match &result.served {
        Some(served) if served.as_ref() == body.as_bytes() => Ok(()),
        Some(served) => Err(anyhow!(
            "Expected cached body {:?}, but got {:?}",
            body,
            String::from_utf8_lossy(served)
        )),
        None => Err(anyhow!("Expected a cache hit, but the request was forwarded")),
    }
}

#[then(expr = "the request is forwarded upstream")]
fn forwarded_upstream(world: &mut FsmWorld) -> Result<(), Error> {
    if world.last_result()?.served.is_some() {
        return Err(anyhow!("Expected the request to be forwarded, but it was a hit"));
    }
    Ok(())
}

#[then(expr = "the client receives every byte the upstream sent")]
fn forwarded_unchanged(world: &mut FsmWorld) -> Result<(), Error> {
    let result = world.last_result()?;
    if result.forwarded != result.sent {
        return Err(anyhow!(
            "Forwarded bytes differ: sent {:?}, forwarded {:?}",
            String::from_utf8_lossy(&result.sent),
            String::from_utf8_lossy(&result.forwarded)
        ));
    }
    Ok(())
}

#[then(expr = "the stash holds {string}")]
fn stash_holds(world: &mut FsmWorld, expected: String) -> Result<(), Error> {
    let expected = split_list(&expected);
    let actual = &world.last_result()?.stash;
    if actual != &expected {
        return Err(anyhow!("Expected stash {:?}, but got {:?}", expected, actual));
    }
    Ok(())
}

#[then(expr = "the stash is empty")]
fn stash_empty(world: &mut FsmWorld) -> Result<(), Error> {
    let actual = &world.last_result()?.stash;
    if !actual.is_empty() {
        return Err(anyhow!("Expected an empty stash, but got {:?}", actual));
    }
    Ok(())
}

#[then(expr = "the exchange was not attached")]
fn not_attached(world: &mut FsmWorld) -> Result<(), Error> {
    if world.last_result()?.attached {
        return Err(anyhow!("Expected the exchange to run without caching"));
    }
    Ok(())
}

#[then(expr = "exactly {int} exchange(s) captured the response")]
fn captured_exchanges(world: &mut FsmWorld, expected: usize) -> Result<(), Error> {
    let actual = world
        .results
        .iter()
        .filter(|result| result.state == CacheState::Create)
        .count();
    if actual != expected {
        return Err(anyhow!(
            "Expected {} capturing exchange(s), but got {}",
            expected,
            actual
        ));
    }
    Ok(())
}

// =============================================================================
// Store Assertions
// =============================================================================

#[then(expr = "the store holds an entry for {string} with body {string}")]
async fn store_holds_entry(world: &mut FsmWorld, key: String, body: String) -> Result<(), Error> {
    let entry = world
        .store
        .inner
        .exists(&CacheKey::new(key.as_str()))
        .await?
        .ok_or_else(|| anyhow!("Expected a complete entry for `{key}`"))?;
    if entry.body().as_ref() != body.as_bytes() {
        return Err(anyhow!(
            "Expected entry body {:?}, but got {:?}",
            body,
            String::from_utf8_lossy(entry.body())
        ));
    }
    Ok(())
}

#[then(expr = "the store holds no entry for {string}")]
async fn store_holds_no_entry(world: &mut FsmWorld, key: String) -> Result<(), Error> {
    let key = CacheKey::new(key.as_str());
    if world.store.inner.exists(&key).await?.is_some() {
        return Err(anyhow!("Expected no entry for `{key}`"));
    }
    if world.store.inner.is_creating(&key) {
        return Err(anyhow!("Expected no entry in creation for `{key}`"));
    }
    Ok(())
}

#[then(expr = "no store entry is left in creation")]
fn nothing_creating(world: &mut FsmWorld) -> Result<(), Error> {
    let creating = world.store.creating_count();
    if creating != 0 {
        return Err(anyhow!("Expected no entry in creation, but found {creating}"));
    }
    Ok(())
}

#[then(expr = "store {word} was called {int} time(s)")]
fn store_calls(world: &mut FsmWorld, operation: String, expected: usize) -> Result<(), Error> {
    let actual = world
        .store
        .counters()
        .get(&operation)
        .ok_or_else(|| anyhow!("unknown store operation `{operation}`"))?;
    if actual != expected {
        return Err(anyhow!(
            "Expected store {} to be called {} time(s), but was called {} time(s)",
            operation,
            expected,
            actual
        ));
    }
    Ok(())
}

// =============================================================================
// Statistics Assertions
// =============================================================================

#[then(expr = "the stats count {int} {word}")]
fn stats_count(world: &mut FsmWorld, expected: u64, counter: String) -> Result<(), Error> {
    let engine = world.engine()?;
    let stats = engine.stats().snapshot();
    let actual = match counter.as_str() {
        "total" => stats.total,
        "hit" | "hits" => stats.hit,
        "fetch" | "fetches" => stats.fetch,
        "bypass" | "bypasses" => stats.bypass,
        "abort" | "aborts" => stats.abort,
        _ => return Err(anyhow!("unknown stats counter `{counter}`")),
    };
    if actual != expected {
        return Err(anyhow!(
            "Expected {} {}, but counted {}",
            expected,
            counter,
            actual
        ));
    }
    Ok(())
}
