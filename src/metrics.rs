use metrics::{counter, histogram};
use std::time::Duration;

use crate::error::ErrorKind;

/// Metrics collection and management
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    pub messages_created_total: &'static str,
    pub messages_deleted_total: &'static str,
    pub inference_requests_total: &'static str,
    pub inference_duration: &'static str,
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            messages_created_total: "doc_chat_messages_created_total",
            messages_deleted_total: "doc_chat_messages_deleted_total",
            inference_requests_total: "doc_chat_inference_requests_total",
            inference_duration: "doc_chat_inference_duration_seconds",
            errors_total: "doc_chat_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record a stored message
    pub fn record_message_created(&self) {
        counter!(self.messages_created_total).increment(1);
    }

    /// Record a deleted message
    pub fn record_message_deleted(&self) {
        counter!(self.messages_deleted_total).increment(1);
    }

    /// Record one inference call by call shape
    pub fn record_inference(&self, shape: &'static str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };
        counter!(self.inference_requests_total, "shape" => shape, "status" => status).increment(1);
        histogram!(self.inference_duration, "shape" => shape).record(duration.as_secs_f64());
    }

    /// Record a request that ended in an error envelope
    pub fn record_error(&self, kind: ErrorKind) {
        counter!(self.errors_total, "kind" => kind.as_str()).increment(1);
    }
}
