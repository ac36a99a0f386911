use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::error::PluginResult;
use crate::plugin::{Capabilities, Context, Flow, Hook, HookResult, Plugin};

/// Identifies a scheduled job.
pub type JobId = u64;

type Callback = Box<dyn FnMut(&mut Context<'_>) -> PluginResult<()> + Send>;

struct Job {
    id: JobId,
    /// `None` once the due time no longer fits in an `Instant`.
    due: Option<Instant>,
    every: Option<Duration>,
    callback: Callback,
}

/// Built-in plugin running callbacks on tick.
///
/// A job fires on the first tick at or after its due time, so the tick
/// interval bounds its precision.  Repeating jobs are rescheduled relative to
/// the tick that fired them.  A delay too large to represent leaves the job
/// pending but never due.
///
/// ```rust,ignore
/// let cron = ctx.plugins()?.get_plugin("Cron")?;
/// cron.with::<Cron, _>(|cron| {
///     cron.schedule_every(Duration::from_secs(3600), |ctx| ctx.privmsg("#brass", "hourly"))
/// })?;
/// ```
#[derive(Default)]
pub struct Cron {
    jobs: Vec<Job>,
    next_id: JobId,
}

impl Cron {
    pub const NAME: &'static str = "Cron";

    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `callback` once, `delay` from now.
    pub fn schedule<F>(&mut self, delay: Duration, callback: F) -> JobId
    where
        F: FnMut(&mut Context<'_>) -> PluginResult<()> + Send + 'static,
    {
        self.push(Instant::now().checked_add(delay), None, Box::new(callback))
    }

    /// Runs `callback` every `interval`, starting one interval from now.
    pub fn schedule_every<F>(&mut self, interval: Duration, callback: F) -> JobId
    where
        F: FnMut(&mut Context<'_>) -> PluginResult<()> + Send + 'static,
    {
        self.push(Instant::now().checked_add(interval), Some(interval), Box::new(callback))
    }

    fn push(&mut self, due: Option<Instant>, every: Option<Duration>, callback: Callback) -> JobId {
        let id = self.next_id;
        self.next_id += 1;
        if due.is_none() {
            warn!(job = id, "Job delay out of range, it will never fire");
        }
        self.jobs.push(Job {
            id,
            due,
            every,
            callback,
        });
        debug!(job = id, repeating = every.is_some(), "Job scheduled");
        id
    }

    /// Cancels a job.  Returns `false` if it already ran or never existed.
    pub fn cancel(&mut self, id: JobId) -> bool {
        let before = self.jobs.len();
        self.jobs.retain(|job| job.id != id);
        self.jobs.len() != before
    }

    /// Number of jobs waiting to fire.
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    /// Fires every job due at `now` and returns how many fired.
    ///
    /// A failing job is logged and does not keep the others from running;
    /// a fatal error is returned immediately.
    pub fn run_due(&mut self, ctx: &mut Context<'_>, now: Instant) -> PluginResult<usize> {
        let mut fired = 0;
        let mut i = 0;
        while i < self.jobs.len() {
            if self.jobs[i].due.is_none_or(|due| due > now) {
                i += 1;
                continue;
            }
            let job = &mut self.jobs[i];
            fired += 1;
            if let Err(e) = (job.callback)(&mut *ctx) {
                if e.is_fatal() {
                    return Err(e);
                }
                error!(job = job.id, error = %e, "Scheduled job failed");
            }
            match job.every {
                Some(every) => {
                    job.due = now.checked_add(every);
                    if job.due.is_none() {
                        warn!(job = job.id, "Job interval out of range, it will not fire again");
                    }
                    i += 1;
                }
                None => {
                    self.jobs.remove(i);
                }
            }
        }
        Ok(fired)
    }
}

impl fmt::Debug for Cron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cron")
            .field("pending", &self.jobs.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Plugin for Cron {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new().hook(Hook::Tick)
    }

    fn on_tick(&mut self, ctx: &mut Context<'_>) -> HookResult {
        self.run_due(ctx, Instant::now())?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use brass_core::{EventKind, EventQueue};

    use super::*;
    use crate::error::PluginError;
    use crate::handler::PluginHandler;
    use crate::plugin::PluginCatalog;

    #[test]
    fn test_one_shot_fires_once() {
        let mut cron = Cron::new();
        cron.schedule(Duration::ZERO, |ctx| ctx.privmsg("#brass", "once"));
        let mut queue = EventQueue::new();
        let mut ctx = Context::new(Cron::NAME).with_events(&mut queue);

        let now = Instant::now();
        assert_eq!(cron.run_due(&mut ctx, now).unwrap(), 1);
        assert_eq!(cron.run_due(&mut ctx, now).unwrap(), 0);
        assert_eq!(cron.pending(), 0);
        drop(ctx);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_repeating_job() {
        let mut cron = Cron::new();
        let start = Instant::now();
        let every = Duration::from_secs(10);
        cron.schedule_every(every, |ctx| ctx.notice("#brass", "ping"));
        let mut queue = EventQueue::new();
        let mut ctx = Context::new(Cron::NAME).with_events(&mut queue);

        assert_eq!(cron.run_due(&mut ctx, start).unwrap(), 0);
        let first = start + every + Duration::from_millis(5);
        assert_eq!(cron.run_due(&mut ctx, first).unwrap(), 1);
        assert_eq!(cron.run_due(&mut ctx, first + every / 2).unwrap(), 0);
        assert_eq!(cron.run_due(&mut ctx, first + every).unwrap(), 1);
        assert_eq!(cron.pending(), 1);
    }

    #[test]
    fn test_failed_job_does_not_block_others() {
        let mut cron = Cron::new();
        cron.schedule(Duration::ZERO, |_| Err(PluginError::hook("nope")));
        cron.schedule(Duration::ZERO, |ctx| ctx.join("#brass"));
        let mut queue = EventQueue::new();
        let mut ctx = Context::new(Cron::NAME).with_events(&mut queue);

        assert_eq!(cron.run_due(&mut ctx, Instant::now()).unwrap(), 2);
        drop(ctx);
        assert_eq!(queue.events()[0].kind(), EventKind::Join);
    }

    #[test]
    fn test_cancel() {
        let mut cron = Cron::new();
        let id = cron.schedule(Duration::from_secs(60), |_| Ok(()));
        assert!(cron.cancel(id));
        assert!(!cron.cancel(id));
    }

    #[test]
    fn test_huge_delay_never_fires() {
        let mut cron = Cron::new();
        cron.schedule(Duration::MAX, |ctx| ctx.privmsg("#brass", "never"));
        cron.schedule_every(Duration::MAX, |ctx| ctx.privmsg("#brass", "never"));
        let mut queue = EventQueue::new();
        let mut ctx = Context::new(Cron::NAME).with_events(&mut queue);

        assert_eq!(cron.run_due(&mut ctx, Instant::now()).unwrap(), 0);
        assert_eq!(cron.pending(), 2);
        drop(ctx);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_huge_interval_stops_after_first_run() {
        let mut cron = Cron::new();
        cron.schedule_every(Duration::ZERO, |ctx| ctx.notice("#brass", "ping"));
        cron.jobs[0].every = Some(Duration::MAX);
        let mut queue = EventQueue::new();
        let mut ctx = Context::new(Cron::NAME).with_events(&mut queue);

        let now = Instant::now();
        assert_eq!(cron.run_due(&mut ctx, now).unwrap(), 1);
        assert_eq!(cron.run_due(&mut ctx, now).unwrap(), 0);
        assert_eq!(cron.pending(), 1);
    }

    struct Reminder;

    impl Plugin for Reminder {
        fn name(&self) -> &str {
            "Reminder"
        }

        fn on_load(&mut self, ctx: &mut Context<'_>) -> PluginResult<()> {
            let cron = ctx.plugins()?.get_plugin(Cron::NAME)?;
            cron.with::<Cron, _>(|cron| {
                cron.schedule(Duration::ZERO, |ctx| ctx.privmsg("#brass", "stand-up time"))
            })?;
            Ok(())
        }
    }

    #[test]
    fn test_other_plugins_schedule_through_handle() {
        let mut handler = PluginHandler::new(PluginCatalog::new());
        handler.add_instance(Box::new(Cron::new())).unwrap();
        handler.add_instance(Box::new(Reminder)).unwrap();

        let mut queue = EventQueue::new();
        let mut ctx = Context::new("").with_events(&mut queue);
        handler.broadcast(&mut ctx, &Hook::Tick, &[], None).unwrap();
        drop(ctx);

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.events()[0].source(), "Cron");
        assert_eq!(queue.events()[0].args(), ["#brass", "stand-up time"]);
    }
}
