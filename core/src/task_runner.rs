//! Background worker pool for decode and other off-thread jobs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

type Job = Box<dyn FnOnce() + Send>;

/// Fixed pool of background workers.
///
/// Jobs are `FnOnce` closures with no return channel; results travel back
/// through whatever the job captures (typically a GL-thread
/// [`WorkerQueue`](crate::worker_queue::WorkerQueue)). Dropping the runner
/// closes the channel, lets workers drain remaining jobs, and joins them.
pub struct TaskRunner {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl TaskRunner {
    pub fn new(threads: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let count = threads.max(1);
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let receiver = Arc::clone(&receiver);
            workers.push(thread::spawn(move || worker_loop(index, receiver)));
        }
        log::debug!("task runner started with {count} workers");
        Self {
            sender: Some(sender),
            workers,
        }
    }

    /// Submit a job to the pool.
    ///
    /// Jobs submitted after shutdown are dropped with a warning.
    pub fn run(&self, job: impl FnOnce() + Send + 'static) {
        let Some(sender) = &self.sender else {
            log::warn!("task runner already shut down, job dropped");
            return;
        };
        if sender.send(Box::new(job)).is_err() {
            log::warn!("task runner workers gone, job dropped");
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(index: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) {
    loop {
        let job = match receiver.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => return,
        };
        match job {
            Ok(job) => {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    log::error!("background job panicked on worker {index}");
                }
            }
            Err(_) => return,
        }
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        log::debug!("task runner shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn executes_jobs_on_workers() {
        let runner = TaskRunner::new(4);
        let (done, results) = mpsc::channel();
        for i in 0..100 {
            let done = done.clone();
            runner.run(move || {
                done.send(i).unwrap();
            });
        }
        let mut got: Vec<i32> = results.iter().take(100).collect();
        got.sort_unstable();
        assert_eq!(got, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn panicking_job_does_not_kill_worker() {
        let runner = TaskRunner::new(1);
        let (done, results) = mpsc::channel();
        runner.run(|| panic!("boom"));
        runner.run(move || {
            done.send(42).unwrap();
        });
        assert_eq!(results.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn drop_drains_submitted_jobs() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let runner = TaskRunner::new(2);
            for _ in 0..20 {
                let counter = Arc::clone(&counter);
                runner.run(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn at_least_one_worker() {
        let runner = TaskRunner::new(0);
        assert_eq!(runner.worker_count(), 1);
    }
}
