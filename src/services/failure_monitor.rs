//! Locator failure tracking and alerting.
//!
//! Process-local state machine over two independent triggers: a
//! consecutive-failure counter and a rate-windowed trigger. Both are
//! gated by a cooldown; qualifying conditions during the cooldown bump a
//! suppressed counter instead of re-firing. Alert delivery fans out to
//! registered handlers concurrently, each fault-isolated.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use crate::error::Result;

/// Thresholds for the failure monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Consecutive failures before the first trigger fires
    pub consecutive_threshold: u32,
    /// Failure-rate trigger threshold (0.0 - 1.0)
    pub rate_threshold: f64,
    /// Minimum window samples before the rate trigger may fire
    pub min_samples: usize,
    /// Cooldown between alerts
    pub cooldown: Duration,
    /// Length of the rolling outcome window
    pub window: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            consecutive_threshold: 5,
            rate_threshold: 0.8,
            min_samples: 5,
            cooldown: Duration::minutes(60),
            window: Duration::minutes(15),
        }
    }
}

/// Which trigger fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ConsecutiveFailures,
    FailureRate,
}

/// Structured alert payload delivered to every handler.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub consecutive_failures: u32,
    pub window_failures: usize,
    pub window_successes: usize,
    pub failure_rate: f64,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

/// Alert delivery handler. Implementations must not assume the other
/// handlers succeeded.
#[async_trait]
pub trait AlertHandler: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<()>;
    fn name(&self) -> &str;
}

/// Rolling failure state.
#[derive(Debug, Default)]
struct FailureWindow {
    consecutive_failures: u32,
    recent: VecDeque<(DateTime<Utc>, bool)>,
    last_alert_at: Option<DateTime<Utc>>,
    suppressed_alerts: u64,
}

/// Serializable snapshot of the monitor state, served by the alerts API.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub consecutive_failures: u32,
    pub window_failures: usize,
    pub window_successes: usize,
    pub suppressed_alerts: u64,
    pub last_alert_at: Option<DateTime<Utc>>,
}

pub struct FailureMonitor {
    config: MonitorConfig,
    state: Mutex<FailureWindow>,
    handlers: Vec<Arc<dyn AlertHandler>>,
}

impl FailureMonitor {
    pub fn new(config: MonitorConfig, handlers: Vec<Arc<dyn AlertHandler>>) -> Self {
        Self {
            config,
            state: Mutex::new(FailureWindow::default()),
            handlers,
        }
    }

    /// Record a successful locator outcome. Resets the consecutive
    /// counter and feeds the rolling window.
    pub fn record_success(&self) {
        let now = Utc::now();
        let mut state = self.state.lock().expect("monitor lock poisoned");
        state.consecutive_failures = 0;
        state.recent.push_back((now, true));
        Self::prune(&mut state, now, self.config.window);
    }

    /// Record a failed locator outcome and dispatch an alert when a
    /// trigger fires outside the cooldown.
    pub async fn record_failure(&self, context: &str) {
        let alert = {
            let now = Utc::now();
            let mut state = self.state.lock().expect("monitor lock poisoned");
            state.consecutive_failures += 1;
            state.recent.push_back((now, false));
            Self::prune(&mut state, now, self.config.window);
            self.evaluate(&mut state, now, context)
        };

        if let Some(alert) = alert {
            self.dispatch(alert).await;
        }
    }

    /// Reset all counters and the window.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("monitor lock poisoned");
        *state = FailureWindow::default();
    }

    /// Current state, for operators.
    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.lock().expect("monitor lock poisoned");
        let failures = state.recent.iter().filter(|(_, ok)| !ok).count();
        MonitorSnapshot {
            consecutive_failures: state.consecutive_failures,
            window_failures: failures,
            window_successes: state.recent.len() - failures,
            suppressed_alerts: state.suppressed_alerts,
            last_alert_at: state.last_alert_at,
        }
    }

    fn prune(state: &mut FailureWindow, now: DateTime<Utc>, window: Duration) {
        while let Some((ts, _)) = state.recent.front() {
            if now - *ts > window {
                state.recent.pop_front();
            } else {
                break;
            }
        }
    }

    /// Evaluate both triggers; must be called with the lock held.
    fn evaluate(
        &self,
        state: &mut FailureWindow,
        now: DateTime<Utc>,
        context: &str,
    ) -> Option<Alert> {
        let window_failures = state.recent.iter().filter(|(_, ok)| !ok).count();
        let window_successes = state.recent.len() - window_failures;
        let total = state.recent.len();
        let failure_rate = if total > 0 {
            window_failures as f64 / total as f64
        } else {
            0.0
        };

        let alert_type = if state.consecutive_failures >= self.config.consecutive_threshold {
            Some(AlertType::ConsecutiveFailures)
        } else if total >= self.config.min_samples && failure_rate >= self.config.rate_threshold {
            Some(AlertType::FailureRate)
        } else {
            None
        };

        let alert_type = alert_type?;

        if let Some(last) = state.last_alert_at {
            if now - last < self.config.cooldown {
                state.suppressed_alerts += 1;
                return None;
            }
        }

        state.last_alert_at = Some(now);
        Some(Alert {
            alert_type,
            consecutive_failures: state.consecutive_failures,
            window_failures,
            window_successes,
            failure_rate,
            context: context.to_string(),
            timestamp: now,
        })
    }

    /// Fan out to every handler concurrently. A failing handler is logged
    /// and never blocks the others.
    async fn dispatch(&self, alert: Alert) {
        tracing::error!(
            alert_type = ?alert.alert_type,
            consecutive_failures = alert.consecutive_failures,
            failure_rate = alert.failure_rate,
            context = %alert.context,
            "Locator failure alert"
        );

        let sends = self.handlers.iter().map(|handler| {
            let handler = handler.clone();
            let alert = alert.clone();
            async move {
                if let Err(e) = handler.send(&alert).await {
                    tracing::warn!(handler = handler.name(), error = %e, "Alert handler failed");
                }
            }
        });
        join_all(sends).await;
    }
}

/// Handler that writes alerts to the log stream.
pub struct LogAlertHandler;

#[async_trait]
impl AlertHandler for LogAlertHandler {
    async fn send(&self, alert: &Alert) -> Result<()> {
        tracing::error!(
            alert_type = ?alert.alert_type,
            consecutive_failures = alert.consecutive_failures,
            window_failures = alert.window_failures,
            "ALERT: artifact locator failing"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Handler that POSTs the alert payload to an outbound webhook.
pub struct WebhookAlertHandler {
    client: reqwest::Client,
    url: String,
}

impl WebhookAlertHandler {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, url }
    }
}

#[async_trait]
impl AlertHandler for WebhookAlertHandler {
    async fn send(&self, alert: &Alert) -> Result<()> {
        self.client
            .post(&self.url)
            .json(alert)
            .send()
            .await?
            .error_for_status()
            .map_err(crate::error::AppError::from)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingHandler {
        alerts: Mutex<Vec<Alert>>,
    }

    impl RecordingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                alerts: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.alerts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AlertHandler for RecordingHandler {
        async fn send(&self, alert: &Alert) -> Result<()> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FailingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AlertHandler for FailingHandler {
        async fn send(&self, _alert: &Alert) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Internal("sink offline".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn monitor_with(handler: Arc<RecordingHandler>) -> FailureMonitor {
        FailureMonitor::new(MonitorConfig::default(), vec![handler])
    }

    #[tokio::test]
    async fn five_consecutive_failures_fire_exactly_one_alert() {
        let handler = RecordingHandler::new();
        let monitor = monitor_with(handler.clone());

        for _ in 0..5 {
            monitor.record_failure("verification failed").await;
        }

        assert_eq!(handler.count(), 1);
        let alert = handler.alerts.lock().unwrap()[0].clone();
        assert_eq!(alert.alert_type, AlertType::ConsecutiveFailures);
        assert_eq!(alert.consecutive_failures, 5);
    }

    #[tokio::test]
    async fn sixth_failure_within_cooldown_is_suppressed() {
        let handler = RecordingHandler::new();
        let monitor = monitor_with(handler.clone());

        for _ in 0..6 {
            monitor.record_failure("verification failed").await;
        }

        assert_eq!(handler.count(), 1);
        assert_eq!(monitor.snapshot().suppressed_alerts, 1);
    }

    #[tokio::test]
    async fn success_resets_consecutive_counter() {
        let handler = RecordingHandler::new();
        let monitor = monitor_with(handler.clone());

        for _ in 0..4 {
            monitor.record_failure("verification failed").await;
        }
        monitor.record_success();
        assert_eq!(monitor.snapshot().consecutive_failures, 0);

        // Four more failures after the reset stay below the threshold.
        for _ in 0..4 {
            monitor.record_failure("verification failed").await;
        }
        assert_eq!(handler.count(), 0);
    }

    #[tokio::test]
    async fn rate_trigger_fires_with_minimum_samples() {
        let handler = RecordingHandler::new();
        let monitor = monitor_with(handler.clone());

        // 4 failures + 1 success: rate 0.8 at 5 samples, consecutive only 2.
        monitor.record_failure("a").await;
        monitor.record_failure("b").await;
        monitor.record_success();
        monitor.record_failure("c").await;
        assert_eq!(handler.count(), 0); // 4 samples, below min_samples

        monitor.record_failure("d").await;
        assert_eq!(handler.count(), 1);
        let alert = handler.alerts.lock().unwrap()[0].clone();
        assert_eq!(alert.alert_type, AlertType::FailureRate);
    }

    #[tokio::test]
    async fn below_min_samples_rate_never_fires() {
        let handler = RecordingHandler::new();
        let monitor = FailureMonitor::new(
            MonitorConfig {
                consecutive_threshold: 100,
                ..MonitorConfig::default()
            },
            vec![handler.clone()],
        );

        for _ in 0..4 {
            monitor.record_failure("x").await;
        }
        // 4 samples at 100% failure rate, but min_samples is 5.
        assert_eq!(handler.count(), 0);
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_others() {
        let failing = Arc::new(FailingHandler {
            calls: AtomicUsize::new(0),
        });
        let recording = RecordingHandler::new();
        let monitor = FailureMonitor::new(
            MonitorConfig::default(),
            vec![failing.clone(), recording.clone()],
        );

        for _ in 0..5 {
            monitor.record_failure("x").await;
        }

        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(recording.count(), 1);
    }

    #[tokio::test]
    async fn reset_clears_all_state() {
        let handler = RecordingHandler::new();
        let monitor = monitor_with(handler.clone());

        for _ in 0..6 {
            monitor.record_failure("x").await;
        }
        monitor.reset();

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.window_failures, 0);
        assert_eq!(snapshot.suppressed_alerts, 0);
        assert!(snapshot.last_alert_at.is_none());
    }
}
