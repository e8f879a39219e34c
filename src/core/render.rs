//! Output seam for scan results
//!
//! The scanner pushes finished tables and status lines through a sink so the
//! pipeline stays independent of how results are shown.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::exchanges::registry::Exchange;

use super::types::{format_price, PriceRow};

pub trait RenderSink: Send + Sync {
    /// Full scan table for the current cycle.
    fn render_table(&self, exchanges: &[Arc<Exchange>], items: &[(Arc<str>, PriceRow)]);
    /// Saved-top view.
    fn render_saved(&self, items: &[(Arc<str>, PriceRow)]);
    /// One-line scanner status.
    fn status(&self, message: &str);
}

/// Sink that writes everything to the log. Row detail goes to debug so an
/// info-level run stays readable.
pub struct LogSink;

impl LogSink {
    fn side(row: &PriceRow, venue: Option<&str>) -> String {
        let Some(venue) = venue else {
            return "-".to_string();
        };
        let price = row.venues.get(venue).and_then(|cell| cell.price);
        format!("{} @ {}", venue, format_price(price))
    }
}

impl RenderSink for LogSink {
    fn render_table(&self, exchanges: &[Arc<Exchange>], items: &[(Arc<str>, PriceRow)]) {
        info!(
            exchanges = exchanges.len(),
            rows = items.len(),
            "scan table updated"
        );
        for (coin, row) in items {
            debug!(
                coin = %coin,
                pair = row.pair.as_deref().unwrap_or("-"),
                spread = %format!("{:.2}%", row.spread.unwrap_or(0.0)),
                buy = %Self::side(row, row.min_exchange.as_deref()),
                sell = %Self::side(row, row.max_exchange.as_deref()),
                route = row.route.label(),
                verify = row.verify.label(),
                "scan row"
            );
        }
    }

    fn render_saved(&self, items: &[(Arc<str>, PriceRow)]) {
        info!(rows = items.len(), "saved top updated");
        for (coin, row) in items {
            debug!(
                coin = %coin,
                spread = %format!("{:.2}%", row.spread.unwrap_or(0.0)),
                route = row.route.label(),
                "saved row"
            );
        }
    }

    fn status(&self, message: &str) {
        info!("{}", message);
    }
}

/// Sink that records everything it is given, for tests.
#[derive(Default)]
pub struct RecordingSink {
    tables: Mutex<Vec<Vec<(Arc<str>, PriceRow)>>>,
    saved: Mutex<Vec<Vec<(Arc<str>, PriceRow)>>>,
    statuses: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses().last().cloned()
    }

    pub fn last_table(&self) -> Option<Vec<(Arc<str>, PriceRow)>> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn table_count(&self) -> usize {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn last_saved(&self) -> Option<Vec<(Arc<str>, PriceRow)>> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl RenderSink for RecordingSink {
    fn render_table(&self, _exchanges: &[Arc<Exchange>], items: &[(Arc<str>, PriceRow)]) {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(items.to_vec());
    }

    fn render_saved(&self, items: &[(Arc<str>, PriceRow)]) {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(items.to_vec());
    }

    fn status(&self, message: &str) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.status("first");
        sink.status("second");
        assert_eq!(sink.statuses(), ["first", "second"]);
        assert_eq!(sink.last_status().as_deref(), Some("second"));
        assert!(sink.last_table().is_none());
    }

    #[test]
    fn test_log_sink_accepts_rows() {
        let sink = LogSink;
        let row = PriceRow::empty(&[Arc::from("a")]);
        sink.render_table(&[], &[(Arc::from("BTC"), row.clone())]);
        sink.render_saved(&[(Arc::from("BTC"), row)]);
        sink.status("ok");
    }
}
