//! Statistics recorder.
//!
//! Counters are grouped as `category.name` and kept in a private
//! Prometheus registry as one `IntGaugeVec`. Gauges rather than counters
//! because connection counts go down as well as up.

use prometheus::{IntGaugeVec, Opts, Registry};
use std::collections::BTreeMap;

use crate::TelemetryError;

/// `{category: {name: value}}`, serialised as the `stats` JSON document.
pub type StatsSnapshot = BTreeMap<String, BTreeMap<String, i64>>;

const METRIC_NAME: &str = "dl_core_stats";

/// Process-wide statistics, safe for concurrent updates.
#[derive(Clone)]
pub struct Stats {
    registry: Registry,
    values: IntGaugeVec,
}

impl Stats {
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();
        let values = IntGaugeVec::new(
            Opts::new(METRIC_NAME, "Core node statistics by category and name"),
            &["category", "name"],
        )?;
        registry.register(Box::new(values.clone()))?;
        Ok(Self { registry, values })
    }

    pub fn update_stats_increment(&self, category: &str, name: &str, value: i64) {
        self.values.with_label_values(&[category, name]).add(value);
    }

    pub fn update_stats_decrement(&self, category: &str, name: &str, value: i64) {
        self.values.with_label_values(&[category, name]).sub(value);
    }

    /// Current value; zero if never touched.
    pub fn get(&self, category: &str, name: &str) -> i64 {
        self.values.with_label_values(&[category, name]).get()
    }

    /// Snapshot every counter touched so far.
    pub fn get_stats(&self) -> StatsSnapshot {
        let mut snapshot = StatsSnapshot::new();
        for family in self.registry.gather() {
            for metric in family.get_metric() {
                let mut category = None;
                let mut name = None;
                for label in metric.get_label() {
                    match label.get_name() {
                        "category" => category = Some(label.get_value().to_string()),
                        "name" => name = Some(label.get_value().to_string()),
                        _ => {}
                    }
                }
                if let (Some(category), Some(name)) = (category, name) {
                    snapshot
                        .entry(category)
                        .or_default()
                        .insert(name, metric.get_gauge().get_value() as i64);
                }
            }
        }
        snapshot
    }

    /// Snapshot as a JSON document.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.get_stats()).unwrap_or_else(|_| "{}".to_string())
    }
}
