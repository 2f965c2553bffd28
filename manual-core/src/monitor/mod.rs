mod notifier;
mod sampler;

use std::{sync::Arc, time::Duration};

use log::{error, warn};
use thiserror::Error;
use tokio::{
    task::{spawn_blocking, JoinHandle},
    time::{interval_at, Instant, MissedTickBehavior},
};

pub use notifier::*;
pub use sampler::*;

use crate::{BoxedDatabase, DatabaseError, LogLevel, NewSystemLog};

/// Usage above this percentage of CPU triggers an alert
pub const CPU_THRESHOLD: f64 = 80.;
/// Usage above this percentage of memory triggers an alert
pub const MEMORY_THRESHOLD: f64 = 85.;
/// Usage above this percentage of disk space triggers an alert
pub const DISK_THRESHOLD: f64 = 90.;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// No messaging endpoint was configured to send alerts to
    #[error("Alert endpoint is not configured")]
    NotConfigured,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

/// Periodically samples host resources and alerts when they run high
pub struct Monitor {
    db: BoxedDatabase,
    sampler: Arc<dyn Sampler>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Monitor {
    pub fn new(
        db: &BoxedDatabase,
        sampler: Arc<dyn Sampler>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            db: db.clone(),
            sampler,
            notifier,
        }
    }

    /// Returns true if alerts can be delivered
    pub fn is_configured(&self) -> bool {
        self.notifier.is_some()
    }

    /// Takes a best-effort sample of the host resources
    pub async fn sample(&self) -> Sample {
        let sampler = self.sampler.clone();

        spawn_blocking(move || Sample::take(sampler.as_ref()))
            .await
            .unwrap_or_else(|e| {
                warn!("Sampling failed: {}", e);
                Sample::zeroed()
            })
    }

    /// Sends an alert and records it in the system log.
    ///
    /// A failed delivery is logged and swallowed, the attempt is recorded either way.
    pub async fn alert(&self, message: &str) -> Result<(), MonitorError> {
        let notifier = self.notifier.as_ref().ok_or(MonitorError::NotConfigured)?;

        let text = format!("DevOps Manual Alert:\n{}", message);
        if let Err(e) = notifier.send(&text).await {
            warn!("Could not deliver alert \"{}\": {}", message, e);
        }

        let sample = self.sample().await;
        self.record(LogLevel::Alert, message, &sample).await
    }

    /// Samples once and sends one alert per metric above its threshold
    pub async fn check_thresholds(&self) {
        let sample = self.sample().await;

        for message in breaches(&sample) {
            if let Err(e) = self.alert(&message).await {
                error!("Could not alert \"{}\": {}", message, e);
            }
        }
    }

    /// Spawns the monitoring loop, which checks thresholds and logs a sample every interval.
    /// The loop runs until the runtime shuts down.
    pub fn run(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }

    async fn tick(&self) {
        self.check_thresholds().await;

        let sample = self.sample().await;
        if let Err(e) = self
            .record(LogLevel::Info, "Routine metrics check", &sample)
            .await
        {
            error!("Could not record metrics: {}", e);
        }
    }

    async fn record(
        &self,
        level: LogLevel,
        message: &str,
        sample: &Sample,
    ) -> Result<(), MonitorError> {
        self.db
            .append_log(NewSystemLog {
                level,
                message: message.to_string(),
                metrics: sample.to_json(),
            })
            .await?;

        Ok(())
    }
}

/// Returns an alert message for every metric in the sample above its threshold
pub fn breaches(sample: &Sample) -> Vec<String> {
    let checks = [
        ("CPU", sample.cpu_usage, CPU_THRESHOLD),
        ("memory", sample.memory_usage, MEMORY_THRESHOLD),
        ("disk", sample.disk_usage, DISK_THRESHOLD),
    ];

    checks
        .into_iter()
        .filter(|(_, usage, threshold)| usage > threshold)
        .map(|(name, usage, _)| format!("High {} usage: {:.2}%", name, usage))
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::MemoryDatabase;

    struct FixedSampler(f64, f64, f64);

    impl Sampler for FixedSampler {
        fn cpu_percent(&self) -> Option<f64> {
            Some(self.0)
        }

        fn memory_percent(&self) -> Option<f64> {
            Some(self.1)
        }

        fn disk_percent(&self) -> Option<f64> {
            Some(self.2)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().push(text.to_string());

            if self.fail {
                return Err(NotifyError::Status(reqwest::StatusCode::BAD_GATEWAY));
            }

            Ok(())
        }
    }

    fn monitor(
        sample: (f64, f64, f64),
        notifier: Option<Arc<RecordingNotifier>>,
    ) -> (Arc<Monitor>, BoxedDatabase) {
        let db: BoxedDatabase = Arc::new(MemoryDatabase::new());
        let sampler = Arc::new(FixedSampler(sample.0, sample.1, sample.2));
        let notifier = notifier.map(|n| n as Arc<dyn Notifier>);

        (Arc::new(Monitor::new(&db, sampler, notifier)), db)
    }

    #[test]
    fn breaches_use_strict_thresholds() {
        let at_limit = Sample {
            cpu_usage: 80.,
            memory_usage: 85.,
            disk_usage: 90.,
            timestamp: 0,
        };
        assert!(breaches(&at_limit).is_empty());

        let over = Sample {
            cpu_usage: 85.,
            ..at_limit
        };
        assert_eq!(breaches(&over), vec!["High CPU usage: 85.00%"]);
    }

    #[tokio::test]
    async fn one_breach_sends_one_alert() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (monitor, db) = monitor((85., 50., 50.), Some(notifier.clone()));

        monitor.check_thresholds().await;

        let sent = notifier.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("High CPU usage: 85.00%"));

        let logs = db.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, LogLevel::Alert);
        assert_eq!(logs[0].metrics["cpu_usage"], 85.);
    }

    #[tokio::test]
    async fn every_breach_sends_an_alert() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (monitor, _) = monitor((95., 95., 95.), Some(notifier.clone()));

        monitor.check_thresholds().await;

        assert_eq!(notifier.sent.lock().len(), 3);
    }

    #[tokio::test]
    async fn unconfigured_alert_fails_fast() {
        let (monitor, db) = monitor((95., 10., 10.), None);

        let result = monitor.alert("test").await;
        assert!(matches!(result, Err(MonitorError::NotConfigured)));

        // Nothing is recorded when there is nowhere to send to
        monitor.check_thresholds().await;
        assert!(db.recent_logs(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_delivery_is_still_recorded() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let (monitor, db) = monitor((10., 10., 10.), Some(notifier.clone()));

        monitor.alert("New lab created: Intro").await.unwrap();

        let logs = db.recent_logs(10).await.unwrap();
        assert_eq!(notifier.sent.lock().len(), 1);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message, "New lab created: Intro");
    }

    #[tokio::test]
    async fn tick_logs_routine_sample() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (monitor, db) = monitor((90., 10., 10.), Some(notifier.clone()));

        monitor.tick().await;

        let logs = db.recent_logs(10).await.unwrap();
        let levels: Vec<_> = logs.iter().map(|l| l.level).collect();

        assert_eq!(levels, vec![LogLevel::Info, LogLevel::Alert]);
        assert_eq!(logs[0].message, "Routine metrics check");
        assert_eq!(notifier.sent.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_records_once_per_interval() {
        let (monitor, db) = monitor((10., 10., 10.), None);

        let handle = monitor.run(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(db.recent_logs(10).await.unwrap().is_empty());

        tokio::time::sleep(Duration::from_secs(120)).await;
        handle.abort();

        let logs = db.recent_logs(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.level == LogLevel::Info));
    }
}
