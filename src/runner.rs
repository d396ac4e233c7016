use std::time::{Duration, Instant};

use tokio::time;
use tracing::{debug, error, info};

use crate::jobs::Job;

struct JobContainer {
    job: Box<dyn Job>,
    run_frequency: Duration,
    last_run_time: Option<Instant>,
}

impl JobContainer {
    fn is_due(&self, now: Instant) -> bool {
        match self.last_run_time {
            Some(last) => now.duration_since(last) >= self.run_frequency,
            None => true,
        }
    }
}

/// Runs registered jobs one after another whenever their frequency has elapsed.
///
/// Jobs run to completion before the next one starts, so two ticks of the
/// same trigger never overlap.
pub struct JobRunner {
    jobs: Vec<JobContainer>,
    update_frequency: Duration,
}

impl JobRunner {
    pub fn new(update_frequency: Duration) -> Self {
        Self {
            jobs: Vec::new(),
            update_frequency,
        }
    }

    pub fn register(&mut self, job: Box<dyn Job>, run_frequency: Duration) {
        info!(
            "Registered job \"{}\" to run every {} seconds",
            job.name(),
            run_frequency.as_secs()
        );

        self.jobs.push(JobContainer {
            job,
            run_frequency,
            last_run_time: None,
        });
    }

    /// Executes every due job once. Returns how many ran.
    pub async fn run_pending(&mut self) -> usize {
        let mut executed = 0;

        for container in &mut self.jobs {
            let now = Instant::now();
            if !container.is_due(now) {
                continue;
            }

            let name = container.job.name();
            info!("Executing job \"{}\"", name);
            container.last_run_time = Some(now);
            executed += 1;

            match container.job.execute().await {
                Ok(()) => info!("Job \"{}\" finished successfully", name),
                Err(e) => error!("Job \"{}\" failed: {}", name, e),
            }
        }

        executed
    }

    pub async fn start(&mut self) -> ! {
        loop {
            let before = Instant::now();

            let executed = self.run_pending().await;
            debug!("Scheduler pass executed {} jobs", executed);

            let delta = before.elapsed();
            if delta < self.update_frequency {
                time::sleep(self.update_frequency - delta).await;
            }
        }
    }
}
