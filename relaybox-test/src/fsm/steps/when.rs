use anyhow::Error;
use cucumber::when;

use crate::fsm::world::FsmWorld;

// =============================================================================
// Complete Exchanges
// =============================================================================

#[when(expr = "a {word} request for {string} receives a {int} response with body {string}")]
async fn full_exchange(
    world: &mut FsmWorld,
    method: String,
    path: String,
    status: u16,
    body: String,
) -> Result<(), Error> {
    world.exchange(&method, &path, status, &body).await
}

#[when(expr = "{int} concurrent requests for {string} receive a {int} response with body {string}")]
async fn concurrent_exchanges(
    world: &mut FsmWorld,
    count: usize,
    path: String,
    status: u16,
    body: String,
) -> Result<(), Error> {
    world.concurrent_exchanges(count, &path, status, &body).await
}

// =============================================================================
// Step-by-step Exchanges
// =============================================================================

#[when(expr = "a {word} request for {string} is sent")]
async fn request_sent(world: &mut FsmWorld, method: String, path: String) -> Result<(), Error> {
    world.send_request(&method, &path).await
}

#[when(expr = "the upstream responds with status {int}")]
async fn upstream_responds(world: &mut FsmWorld, status: u16) -> Result<(), Error> {
    world.respond(status).await
}

#[when(expr = "the upstream sends {string}")]
async fn upstream_sends(world: &mut FsmWorld, chunk: String) -> Result<(), Error> {
    world.send_body(&chunk).await
}

#[when(expr = "the response completes")]
async fn response_completes(world: &mut FsmWorld) -> Result<(), Error> {
    world.complete().await
}

#[when(expr = "the client disconnects")]
async fn client_disconnects(world: &mut FsmWorld) -> Result<(), Error> {
    world.disconnect().await
}
