//! Tool call metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// How a dispatched call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Handler returned a successful result.
    Succeeded,
    /// Handler returned a failure result.
    Failed,
    /// Arguments did not match the schema; the handler never ran.
    Rejected,
}

/// Counters and per-tool latency for dispatched calls.
pub struct ToolMetrics {
    total_calls: AtomicU64,
    successful_calls: AtomicU64,
    failed_calls: AtomicU64,
    rejected_calls: AtomicU64,
    active_executions: AtomicU64,

    tool_latencies: DashMap<String, LatencyStats>,
}

impl ToolMetrics {
    pub fn new() -> Self {
        Self {
            total_calls: AtomicU64::new(0),
            successful_calls: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
            active_executions: AtomicU64::new(0),
            tool_latencies: DashMap::new(),
        }
    }

    pub fn record_call_start(&self, _tool: &str) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.active_executions.fetch_add(1, Ordering::Relaxed);
    }

    /// Pairs with [`record_call_start`](Self::record_call_start); runs even
    /// when the call future is dropped before completing.
    pub fn record_execution_end(&self) {
        self.active_executions.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_call_end(&self, tool: &str, outcome: CallOutcome, duration_ms: u64) {
        match outcome {
            CallOutcome::Succeeded => self.successful_calls.fetch_add(1, Ordering::Relaxed),
            CallOutcome::Failed => self.failed_calls.fetch_add(1, Ordering::Relaxed),
            CallOutcome::Rejected => {
                // Rejected calls never reached the backend; keep them out of latency.
                self.rejected_calls.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        if let Some(stats) = self.tool_latencies.get(tool) {
            stats.record(duration_ms);
            return;
        }
        self.tool_latencies
            .entry(tool.to_string())
            .or_insert_with(LatencyStats::new)
            .record(duration_ms);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_calls: self.total_calls.load(Ordering::Relaxed),
            successful_calls: self.successful_calls.load(Ordering::Relaxed),
            failed_calls: self.failed_calls.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
            active_executions: self.active_executions.load(Ordering::Relaxed),
        }
    }

    pub fn tool_latency(&self, tool: &str) -> Option<LatencySnapshot> {
        self.tool_latencies.get(tool).map(|stats| stats.snapshot())
    }

    /// Latency for every tool that has completed at least one call, sorted by name.
    pub fn all_tool_latencies(&self) -> Vec<(String, LatencySnapshot)> {
        let mut all: Vec<_> = self
            .tool_latencies
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

impl Default for ToolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-tool latency statistics.
pub struct LatencyStats {
    count: AtomicU64,
    total_ms: AtomicU64,
    min_ms: AtomicU64,
    max_ms: AtomicU64,
}

impl LatencyStats {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            total_ms: AtomicU64::new(0),
            min_ms: AtomicU64::new(u64::MAX),
            max_ms: AtomicU64::new(0),
        }
    }

    fn record(&self, ms: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_ms.fetch_add(ms, Ordering::Relaxed);
        self.min_ms.fetch_min(ms, Ordering::Relaxed);
        self.max_ms.fetch_max(ms, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LatencySnapshot {
        let count = self.count.load(Ordering::Relaxed);
        let total = self.total_ms.load(Ordering::Relaxed);
        let min = self.min_ms.load(Ordering::Relaxed);
        let max = self.max_ms.load(Ordering::Relaxed);

        LatencySnapshot {
            count,
            avg_ms: if count > 0 { total / count } else { 0 },
            min_ms: if min == u64::MAX { 0 } else { min },
            max_ms: max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub rejected_calls: u64,
    pub active_executions: u64,
}

impl MetricsSnapshot {
    /// Success rate over calls that reached a handler, as a percentage.
    pub fn success_rate(&self) -> f64 {
        let completed = self.successful_calls + self.failed_calls;
        if completed == 0 {
            100.0
        } else {
            (self.successful_calls as f64 / completed as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySnapshot {
    pub count: u64,
    pub avg_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
}
