use std::sync::Arc;

use anyhow::{Context as _, Error, anyhow};
use bytes::Bytes;
use cucumber::World;
use http::{Request, Response, request, response};
use relaybox::{CacheEngine, CacheState, CacheSwitch, RequestAction, StreamContext};
use relaybox_configuration::CacheConfig;
use tokio::sync::Barrier;
use tracing::instrument::WithSubscriber;

use crate::mock_store::MockStore;
use crate::tracing::{StateCollector, create_state_collector};

/// Header bytes the simulated proxy forwards ahead of every body.
pub const RESPONSE_HEAD: &[u8] = b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\n\r\n";

const DEFAULT_CONFIG: &str = "rules: []";

/// Outcome of one exchange as seen by the client and the cache.
#[derive(Debug, Clone, Default)]
pub struct ExchangeResult {
    pub state: CacheState,
    /// Body served from the cache on a hit.
    pub served: Option<Bytes>,
    /// Bytes the upstream produced, header bytes included.
    pub sent: Vec<u8>,
    /// Bytes the engine let through to the client.
    pub forwarded: Vec<u8>,
    /// Stashed keys, in stash order.
    pub stash: Vec<String>,
    /// Whether the exchange was attached at all.
    pub attached: bool,
}

/// An exchange driven step by step.
#[derive(Debug)]
pub struct OpenExchange {
    pub ctx: StreamContext,
    pub result: ExchangeResult,
    head_pending: bool,
}

#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct FsmWorld {
    pub config: String,
    pub store: MockStore,
    pub switch: CacheSwitch,
    pub engine: Option<Arc<CacheEngine<MockStore>>>,
    pub open: Option<OpenExchange>,
    /// Exchanges left in flight when a newer one was started.
    pub parked: Vec<OpenExchange>,
    pub results: Vec<ExchangeResult>,
    pub collector: StateCollector,
}

impl FsmWorld {
    pub fn new() -> Self {
        Self {
            config: DEFAULT_CONFIG.to_owned(),
            store: MockStore::new(),
            switch: CacheSwitch::default(),
            engine: None,
            open: None,
            parked: Vec::new(),
            results: Vec::new(),
            collector: create_state_collector(),
        }
    }

    /// The engine, built from the configured YAML on first use.
    pub fn engine(&mut self) -> Result<Arc<CacheEngine<MockStore>>, Error> {
        if let Some(engine) = &self.engine {
            return Ok(Arc::clone(engine));
        }
        let parts = CacheConfig::from_yaml(&self.config)?.into_parts()?;
        let engine = Arc::new(
            CacheEngine::builder(self.store.clone())
                .config(parts.config)
                .rules(parts.rules)
                .switch(self.switch.clone())
                .build(),
        );
        self.engine = Some(Arc::clone(&engine));
        Ok(engine)
    }

    pub fn last_result(&self) -> Result<&ExchangeResult, Error> {
        match &self.open {
            Some(open) => Ok(&open.result),
            None => self.results.last().context("no exchange was made"),
        }
    }

    /// Attaches a new exchange and runs its request phase.
    pub async fn send_request(&mut self, method: &str, path: &str) -> Result<(), Error> {
        let engine = self.engine()?;
        let request = build_request(method, path)?;
        self.collector.clear();
        if let Some(previous) = self.open.take() {
            self.parked.push(previous);
        }
        let open = start_exchange(&engine, &request)
            .with_subscriber(self.collector.dispatch().clone())
            .await;
        match open {
            Some(open) if open.result.served.is_some() => self.finish_open(open).await?,
            Some(open) => self.open = Some(open),
            None => self.results.push(ExchangeResult::default()),
        }
        Ok(())
    }

    pub async fn respond(&mut self, status: u16) -> Result<(), Error> {
        let engine = self.engine()?;
        let open = self.open.as_mut().context("no exchange in flight")?;
        let parts = build_response(status)?;
        engine
            .on_response_headers(&mut open.ctx, &parts, RESPONSE_HEAD.len())
            .with_subscriber(self.collector.dispatch().clone())
            .await;
        open.result.state = open.ctx.state();
        Ok(())
    }

    pub async fn send_body(&mut self, chunk: &str) -> Result<(), Error> {
        let engine = self.engine()?;
        let open = self.open.as_mut().context("no exchange in flight")?;
        let mut data = Vec::new();
        if open.head_pending {
            data.extend_from_slice(RESPONSE_HEAD);
            open.head_pending = false;
        }
        data.extend_from_slice(chunk.as_bytes());
        forward(&engine, open, &data)
            .with_subscriber(self.collector.dispatch().clone())
            .await;
        Ok(())
    }

    /// Body end followed by detach.
    pub async fn complete(&mut self) -> Result<(), Error> {
        let engine = self.engine()?;
        let mut open = self.open.take().context("no exchange in flight")?;
        if open.head_pending {
            forward(&engine, &mut open, RESPONSE_HEAD)
                .with_subscriber(self.collector.dispatch().clone())
                .await;
            open.head_pending = false;
        }
        engine
            .on_body_end(&mut open.ctx)
            .with_subscriber(self.collector.dispatch().clone())
            .await;
        self.finish_open(open).await
    }

    /// Detach without seeing the end of the body.
    pub async fn disconnect(&mut self) -> Result<(), Error> {
        let open = self.open.take().context("no exchange in flight")?;
        self.finish_open(open).await
    }

    async fn finish_open(&mut self, open: OpenExchange) -> Result<(), Error> {
        let engine = self.engine()?;
        let OpenExchange { ctx, mut result, .. } = open;
        result.state = ctx.state();
        engine
            .detach(ctx)
            .with_subscriber(self.collector.dispatch().clone())
            .await;
        self.results.push(result);
        Ok(())
    }

    /// Runs one complete exchange.
    pub async fn exchange(
        &mut self,
        method: &str,
        path: &str,
        status: u16,
        body: &str,
    ) -> Result<(), Error> {
        self.send_request(method, path).await?;
        if self.open.is_some() {
            self.respond(status).await?;
            self.send_body(body).await?;
            self.complete().await?;
        }
        Ok(())
    }

    /// Runs `count` exchanges for the same request at once. All of them
    /// reach the response phase before any of them completes.
    pub async fn concurrent_exchanges(
        &mut self,
        count: usize,
        path: &str,
        status: u16,
        body: &str,
    ) -> Result<(), Error> {
        let engine = self.engine()?;
        let request = build_request("GET", path)?;
        let response = build_response(status)?;
        let barrier = Arc::new(Barrier::new(count));

        let tasks = (0..count).map(|_| {
            let engine = Arc::clone(&engine);
            let barrier = Arc::clone(&barrier);
            let request = request.clone();
            let response = response.clone();
            let body = body.to_owned();
            let dispatch = self.collector.dispatch().clone();
            tokio::spawn(
                async move {
                    let mut open = start_exchange(&engine, &request).await;
                    if let Some(open) = open.as_mut()
                        && open.result.served.is_none()
                    {
                        engine
                            .on_response_headers(&mut open.ctx, &response, RESPONSE_HEAD.len())
                            .await;
                    }
                    barrier.wait().await;
                    let Some(mut open) = open else {
                        return ExchangeResult::default();
                    };
                    if open.result.served.is_none() {
                        let mut data = RESPONSE_HEAD.to_vec();
                        data.extend_from_slice(body.as_bytes());
                        forward(&engine, &mut open, &data).await;
                        engine.on_body_end(&mut open.ctx).await;
                    }
                    let OpenExchange { ctx, mut result, .. } = open;
                    result.state = ctx.state();
                    engine.detach(ctx).await;
                    result
                }
                .with_subscriber(dispatch),
            )
        });

        for result in futures::future::join_all(tasks).await {
            self.results.push(result.map_err(|error| anyhow!("exchange task failed: {error}"))?);
        }
        Ok(())
    }
}

impl Default for FsmWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn build_request(method: &str, path: &str) -> Result<request::Parts, Error> {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header(http::header::HOST, "example.com")
        .body(())?;
    Ok(request.into_parts().0)
}

fn build_response(status: u16) -> Result<response::Parts, Error> {
    let response = Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain")
        .body(())?;
    Ok(response.into_parts().0)
}

async fn start_exchange(
    engine: &CacheEngine<MockStore>,
    request: &request::Parts,
) -> Option<OpenExchange> {
    let mut ctx = engine.attach()?;
    let action = engine.on_request_headers(&mut ctx, request).await;
    let served = match action {
        RequestAction::ServeFromCache(entry) => Some(entry.body().clone()),
        RequestAction::Forward => None,
    };
    let result = ExchangeResult {
        state: ctx.state(),
        stash: ctx
            .stash()
            .iter()
            .map(|entry| entry.key().as_str().to_owned())
            .collect(),
        served,
        attached: true,
        ..Default::default()
    };
    Some(OpenExchange {
        ctx,
        result,
        head_pending: true,
    })
}

/// Offers `data` the way a proxy does: whatever is not reported as
/// forwarded is offered again.
async fn forward(engine: &CacheEngine<MockStore>, open: &mut OpenExchange, data: &[u8]) {
    open.result.sent.extend_from_slice(data);
    let mut rest = data;
    while !rest.is_empty() {
        let n = engine.on_body_chunk(&mut open.ctx, rest).await;
        open.result.forwarded.extend_from_slice(&rest[..n]);
        rest = &rest[n..];
    }
}
