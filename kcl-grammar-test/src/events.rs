use std::collections::HashSet;

use kcl_grammar_test_harness::TraceEvent;
use tracing_subscriber::{Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt};

/// Set of trace events enabled for this run.
#[derive(Default)]
pub(crate) struct TraceEventConfig {
    enabled_trace_events: HashSet<TraceEvent>,
}

impl TraceEventConfig {
    pub fn init(enabled_trace_events: &[TraceEvent]) -> Self {
        let config = Self {
            enabled_trace_events: enabled_trace_events.iter().copied().collect(),
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(false)
            .with_filter(config.compose_filter());

        if tracing_subscriber::registry()
            .with(layer)
            .try_init()
            .is_err()
        {
            // Something went wrong; proceed on anyway but complain audibly.
            eprintln!("warning: failed to initialize tracing.");
        }

        config
    }

    fn compose_filter(&self) -> Targets {
        let filter = Targets::new().with_default(tracing_subscriber::filter::LevelFilter::WARN);

        filter.with_targets(
            self.enabled_trace_events
                .iter()
                .map(|event| (event.target(), tracing::Level::DEBUG)),
        )
    }

    pub fn enabled_events(&self) -> &HashSet<TraceEvent> {
        &self.enabled_trace_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_enables_requested_targets_only() {
        let config = TraceEventConfig {
            enabled_trace_events: [TraceEvent::Golden].into_iter().collect(),
        };

        let filter = config.compose_filter();
        assert!(filter.would_enable("golden", &tracing::Level::DEBUG));
        assert!(!filter.would_enable("discovery", &tracing::Level::DEBUG));
        assert!(filter.would_enable("discovery", &tracing::Level::WARN));
    }
}
