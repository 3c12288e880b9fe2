//! Prometheus request metrics
//!
//! - `http_requests_total` - Counter of handled requests (labels: path)
//!
//! The recorder is process-global. [`install_recorder`] installs it on first
//! use and hands out clones of the same handle afterwards.

use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder (once) and return a handle for rendering
pub fn install_recorder() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!("A metrics recorder is already installed, /prometheus will be empty");
            }
            describe_counter!(HTTP_REQUESTS_TOTAL, "Number of handled HTTP requests");
            handle
        })
        .clone()
}

/// Count one handled request for `path`
pub(crate) fn record_request(path: &str) {
    counter!(HTTP_REQUESTS_TOTAL, "path" => path.to_owned()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(rendered: &str, path: &str) -> u64 {
        let prefix = format!("{HTTP_REQUESTS_TOTAL}{{path=\"{path}\"}} ");
        rendered
            .lines()
            .find_map(|line| line.strip_prefix(&prefix))
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    #[test]
    fn test_record_request_increments_counter() {
        let handle = install_recorder();
        let before = count(&handle.render(), "/unit/metrics");

        record_request("/unit/metrics");
        record_request("/unit/metrics");

        assert_eq!(count(&handle.render(), "/unit/metrics"), before + 2);
    }

    #[test]
    fn test_install_is_idempotent() {
        let first = install_recorder();
        record_request("/unit/idempotent");
        let second = install_recorder();
        assert_eq!(count(&first.render(), "/unit/idempotent"), 1);
        assert_eq!(count(&second.render(), "/unit/idempotent"), 1);
    }
}
