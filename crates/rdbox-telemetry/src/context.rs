//! Run-scoped tracing context.

use tracing::Span;

use crate::init::build_sha;

/// Build the span that wraps one reconciliation pass for `station`.
///
/// Every event emitted while the span is entered carries the station name and
/// the build identifier recorded during logging initialisation.
#[must_use]
pub fn run_span(station: &str) -> Span {
    tracing::info_span!("run", station = %station, build_sha = %build_sha())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_span_can_be_entered_without_subscriber() {
        let span = run_span("onair-1");
        let _entered = span.enter();
    }
}
