//! Tracing utilities for asserting on cache state transitions.
//!
//! The engine emits a `cache state` event with `from` and `to` fields on
//! every transition; [`StateCollector`] records them.

use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer, Registry};

const TRANSITION_MESSAGE: &str = "cache state";

/// One recorded state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: String,
    pub to: String,
}

#[derive(Default)]
struct TransitionVisitor {
    message: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

impl Visit for TransitionVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "from" => self.from = Some(value.to_string()),
            "to" => self.to = Some(value.to_string()),
            "message" => self.message = Some(value.to_string()),
            _ => {}
        }
    }
}

struct TransitionLayer {
    transitions: Arc<Mutex<Vec<Transition>>>,
}

impl<S: Subscriber> Layer<S> for TransitionLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = TransitionVisitor::default();
        event.record(&mut visitor);
        if visitor.message.as_deref() != Some(TRANSITION_MESSAGE) {
            return;
        }
        if let (Some(from), Some(to)) = (visitor.from, visitor.to)
            && let Ok(mut transitions) = self.transitions.lock()
        {
            transitions.push(Transition { from, to });
        }
    }
}

/// Collector for state transitions of one test world.
#[derive(Clone)]
pub struct StateCollector {
    transitions: Arc<Mutex<Vec<Transition>>>,
    dispatch: Dispatch,
}

impl std::fmt::Debug for StateCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCollector")
            .field("transitions", &self.transitions())
            .finish_non_exhaustive()
    }
}

/// Creates a collector with its own dispatch.
///
/// Futures run under [`StateCollector::dispatch`] report their transitions
/// to this collector only.
pub fn create_state_collector() -> StateCollector {
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let layer = TransitionLayer {
        transitions: transitions.clone(),
    };
    let subscriber = Registry::default().with(layer);
    StateCollector {
        transitions,
        dispatch: Dispatch::new(subscriber),
    }
}

impl StateCollector {
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn transitions(&self) -> Vec<Transition> {
        self.transitions
            .lock()
            .map(|transitions| transitions.clone())
            .unwrap_or_default()
    }

    /// States entered, in order.
    pub fn states(&self) -> Vec<String> {
        self.transitions().into_iter().map(|t| t.to).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut transitions) = self.transitions.lock() {
            transitions.clear();
        }
    }
}

/// Installs a global `fmt` subscriber honouring `RUST_LOG`.
///
/// Safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transitions_are_recorded() {
        let collector = create_state_collector();
        tracing::dispatcher::with_default(collector.dispatch(), || {
            tracing::debug!(from = "init", to = "pass", "cache state");
            tracing::debug!(key = "path=/a", "checking key");
            tracing::debug!(from = "pass", to = "create", "cache state");
        });

        assert_eq!(collector.states(), vec!["pass", "create"]);
        assert_eq!(
            collector.transitions()[0],
            Transition {
                from: "init".to_owned(),
                to: "pass".to_owned()
            }
        );
    }
}
