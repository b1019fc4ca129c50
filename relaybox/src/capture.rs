//! Streaming capture of forwarded response bodies.

use relaybox_store::Store;
use tracing::{debug, warn};

use crate::{CacheEngine, CacheError, CacheState, StreamContext, metrics};

impl<S> CacheEngine<S>
where
    S: Store,
{
    /// Mirrors forwarded bytes into the open store entry.
    ///
    /// Returns how many bytes of `data` the proxy may forward. This is
    /// always `data.len()`, except right after the capture started: then
    /// the header bytes at the front of the buffer are reported alone, and
    /// the proxy calls again with the rest.
    ///
    /// A failed or short write abandons the entry. The bytes are still
    /// reported as forwardable.
    pub async fn on_body_chunk(&self, ctx: &mut StreamContext, data: &[u8]) -> usize {
        if ctx.state != CacheState::Create {
            return data.len();
        }

        if ctx.body_offset > 0 {
            let skip = ctx.body_offset.min(data.len());
            ctx.body_offset -= skip;
            if skip > 0 {
                return skip;
            }
        }

        if data.is_empty() {
            return 0;
        }
        let Some(handle) = ctx.entry.as_ref() else {
            return data.len();
        };

        let offered = data.len();
        let failure = match self.store.append(handle, data).await {
            Ok(written) if written == offered => {
                ctx.captured += written;
                metrics::record_captured(self.store.name(), written);
                None
            }
            Ok(written) => Some(CacheError::CaptureShortfall { offered, written }),
            Err(error) => {
                metrics::record_store_error(self.store.name(), "append");
                Some(error.into())
            }
        };

        if let Some(error) = failure {
            self.fail_capture(ctx, error);
            if let Some(handle) = ctx.entry.take()
                && let Err(error) = self.store.abort(handle).await
            {
                warn!(%error, store = self.store.name(), "failed to abort cache entry");
                metrics::record_store_error(self.store.name(), "abort");
            }
        }
        offered
    }

    /// Completes the capture after the whole body was forwarded.
    pub async fn on_body_end(&self, ctx: &mut StreamContext) {
        if ctx.state != CacheState::Create {
            return;
        }
        let Some(handle) = ctx.entry.take() else {
            return;
        };
        let key = handle.key().clone();
        match self.store.finish(handle).await {
            Ok(()) => {
                debug!(key = key.as_str(), bytes = ctx.captured, "cache entry finished");
            }
            Err(error) => {
                metrics::record_store_error(self.store.name(), "finish");
                self.fail_capture(ctx, error.into());
            }
        }
    }
}
