use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::{Error, Result};

/// When a scheduled job fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Once a day at the given local wall-clock time
    DailyAt(NaiveTime),
    /// On a fixed interval, measured from the end of the previous run
    Every(Duration),
}

type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type JobFn = Arc<dyn Fn() -> JobFuture + Send + Sync>;

struct Job {
    trigger: Trigger,
    run: JobFn,
}

/// Parse an "HH:MM" wall-clock time from configuration
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| Error::Config(format!("invalid time of day '{}', expected HH:MM", value)))
}

/// Delay until the next occurrence of a daily wall-clock time. A target
/// at or before now belongs to tomorrow.
fn next_daily_delay(now: DateTime<Local>, at: NaiveTime) -> Duration {
    let now = now.naive_local();
    let mut target = now.date().and_time(at);
    if target <= now {
        target += chrono::Duration::days(1);
    }
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// Background scheduler that runs named jobs until shutdown. Registering
/// a job under an existing name replaces the previous one. Each run is
/// bounded by the job timeout; a run that exceeds it is abandoned and the
/// job waits for its next trigger.
pub struct Scheduler {
    jobs: HashMap<String, Job>,
    job_timeout: Duration,
}

impl Scheduler {
    pub fn new(job_timeout: Duration) -> Self {
        Self {
            jobs: HashMap::new(),
            job_timeout,
        }
    }

    /// Register a job under a name, replacing any previous job with
    /// that name
    pub fn add_job<F, Fut>(&mut self, name: &str, trigger: Trigger, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job = Job {
            trigger,
            run: Arc::new(move || Box::pin(task()) as JobFuture),
        };

        if self.jobs.insert(name.to_string(), job).is_some() {
            debug!("Replaced scheduled job '{}'", name);
        }
    }

    /// Registered job names, sorted
    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Run all registered jobs until the shutdown signal flips to true
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        if self.jobs.is_empty() {
            info!("Scheduler has no jobs; waiting for shutdown");
            let mut shutdown = shutdown;
            let _ = shutdown.changed().await;
            return;
        }

        info!("Scheduler started with {} jobs", self.jobs.len());

        let mut join_set = JoinSet::new();
        for (name, job) in self.jobs {
            join_set.spawn(run_job(name, job, self.job_timeout, shutdown.clone()));
        }

        while join_set.join_next().await.is_some() {}

        info!("Scheduler stopped");
    }
}

async fn run_job(name: String, job: Job, ceiling: Duration, mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let delay = match job.trigger {
            Trigger::DailyAt(at) => next_daily_delay(Local::now(), at),
            Trigger::Every(interval) => interval,
        };

        debug!("Job '{}' sleeping for {}s", name, delay.as_secs());

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = tokio::time::sleep(delay) => {
                debug!("Running scheduled job '{}'", name);
                // A run gets its own task; a panic surfaces as a
                // JoinError instead of unwinding this loop
                match tokio::time::timeout(ceiling, tokio::spawn((job.run)())).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!("Job '{}' run panicked: {}", name, e);
                    }
                    Err(_) => {
                        error!(
                            "Job '{}' exceeded {}s and was abandoned until its next trigger",
                            name,
                            ceiling.as_secs()
                        );
                    }
                }
            }
        }
    }

    debug!("Job '{}' stopped", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("07:30").unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert!(parse_time_of_day("25:99").is_err());
        assert!(parse_time_of_day("seven").is_err());
    }

    #[test]
    fn test_next_daily_delay_before_and_after_target() {
        let at = NaiveTime::from_hms_opt(7, 30, 0).unwrap();

        let morning = Local.with_ymd_and_hms(2024, 6, 15, 6, 0, 0).unwrap();
        assert_eq!(next_daily_delay(morning, at), Duration::from_secs(90 * 60));

        let evening = Local.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap();
        assert_eq!(
            next_daily_delay(evening, at),
            Duration::from_secs(23 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn test_next_daily_delay_at_target_waits_a_day() {
        let at = NaiveTime::from_hms_opt(7, 30, 0).unwrap();
        let exactly = Local.with_ymd_and_hms(2024, 6, 15, 7, 30, 0).unwrap();

        assert_eq!(next_daily_delay(exactly, at), Duration::from_secs(24 * 3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_job_fires_on_interval() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new(Duration::from_secs(60));

        let task_counter = counter.clone();
        scheduler.add_job("tick", Trigger::Every(Duration::from_millis(50)), move || {
            let counter = task_counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        tokio::time::sleep(Duration::from_millis(120)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_job_replaces_previous_by_name() {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new(Duration::from_secs(60));

        let first_counter = first.clone();
        scheduler.add_job("refresh", Trigger::Every(Duration::from_millis(50)), move || {
            let counter = first_counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let second_counter = second.clone();
        scheduler.add_job("refresh", Trigger::Every(Duration::from_millis(50)), move || {
            let counter = second_counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(scheduler.job_names(), vec!["refresh"]);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        tokio::time::sleep(Duration::from_millis(70)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert!(second.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_run_is_abandoned_at_the_ceiling() {
        let started = Arc::new(AtomicU32::new(0));
        let finished = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new(Duration::from_secs(1));

        let started_counter = started.clone();
        let finished_counter = finished.clone();
        scheduler.add_job("stuck", Trigger::Every(Duration::from_millis(50)), move || {
            let started = started_counter.clone();
            let finished = finished_counter.clone();
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(600)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        });

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(started.load(Ordering::SeqCst) >= 1);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_run_does_not_stop_the_job() {
        let runs = Arc::new(AtomicU32::new(0));
        let mut scheduler = Scheduler::new(Duration::from_secs(60));

        let run_counter = runs.clone();
        scheduler.add_job("flaky", Trigger::Every(Duration::from_millis(50)), move || {
            let runs = run_counter.clone();
            async move {
                if runs.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first run blows up");
                }
            }
        });

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        tokio::time::sleep(Duration::from_millis(120)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_job_loops() {
        let mut scheduler = Scheduler::new(Duration::from_secs(60));
        scheduler.add_job("idle", Trigger::Every(Duration::from_secs(3600)), || async {});

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
