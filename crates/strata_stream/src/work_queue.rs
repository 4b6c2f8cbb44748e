use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

/// A finished computation bound to its delivery callback
type Delivery<C> = Box<dyn FnOnce(&mut C) + Send>;

struct QueueState<C> {
    ready: VecDeque<Delivery<C>>,
    in_flight: usize,
}

struct Shared<C> {
    state: Mutex<QueueState<C>>,
    idle: Condvar,
    submitted: AtomicUsize,
}

impl<C> Shared<C> {
    fn lock(&self) -> MutexGuard<'_, QueueState<C>> {
        // Nothing panics while holding the lock, but don't let a poisoned
        // mutex take the main loop down with it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hands a finished worker's result back to the queue. Runs on drop so a
/// panicking producer still releases its in-flight slot.
struct Completion<C> {
    shared: Arc<Shared<C>>,
    delivery: Option<Delivery<C>>,
}

impl<C> Drop for Completion<C> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        match self.delivery.take() {
            Some(delivery) => state.ready.push_back(delivery),
            None => log::warn!("Worker failed before producing a result; its delivery is dropped"),
        }
        state.in_flight -= 1;
        self.shared.idle.notify_all();
    }
}

/// Runs pure computations on background threads and delivers their results
/// back on the thread that calls [`WorkQueue::drain`].
///
/// `C` is the main-timeline state deliveries get mutable access to. Clones
/// share the same queue.
pub struct WorkQueue<C> {
    shared: Arc<Shared<C>>,
}

impl<C> Clone for WorkQueue<C> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<C: 'static> Default for WorkQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> WorkQueue<C> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    ready: VecDeque::new(),
                    in_flight: 0,
                }),
                idle: Condvar::new(),
                submitted: AtomicUsize::new(0),
            }),
        }
    }

    /// Run `produce` on a fresh thread; `deliver` gets its result on a later
    /// [`drain`](Self::drain). No ordering between submissions, no cancellation.
    pub fn submit<T, P, D>(&self, produce: P, deliver: D)
    where
        T: Send + 'static,
        P: FnOnce() -> T + Send + 'static,
        D: FnOnce(T, &mut C) + Send + 'static,
    {
        self.shared.lock().in_flight += 1;
        self.shared.submitted.fetch_add(1, Ordering::Relaxed);

        let shared = Arc::clone(&self.shared);
        thread::spawn(move || {
            let mut completion = Completion { shared, delivery: None };
            let data = produce();
            completion.delivery = Some(Box::new(move |ctx: &mut C| deliver(data, ctx)));
        });
    }

    /// Run every delivery that is ready, oldest first, on the calling thread.
    /// Work submitted by a delivery is picked up by a later drain.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let ready = std::mem::take(&mut self.shared.lock().ready);
        let count = ready.len();
        for delivery in ready {
            delivery(ctx);
        }
        count
    }

    /// Block until no submission is running. Deliveries stay queued.
    pub fn wait_idle(&self) {
        let mut state = self.shared.lock();
        while state.in_flight > 0 {
            state = self.shared.idle.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wait and drain until nothing is running or queued, including work that
    /// deliveries submit along the way
    pub fn run_until_idle(&self, ctx: &mut C) {
        loop {
            self.wait_idle();
            if self.drain(ctx) == 0 && self.in_flight() == 0 {
                break;
            }
        }
    }

    /// Submissions still computing
    pub fn in_flight(&self) -> usize {
        self.shared.lock().in_flight
    }

    /// Results waiting for a drain
    pub fn pending(&self) -> usize {
        self.shared.lock().ready.len()
    }

    /// Total submissions since creation
    pub fn submitted(&self) -> usize {
        self.shared.submitted.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::ThreadId;
    use std::time::Duration;

    #[test]
    fn test_delivers_once_on_main_thread() {
        let queue: WorkQueue<Vec<(i32, ThreadId)>> = WorkQueue::new();
        let mut record = Vec::new();

        queue.submit(|| 42, |value, record: &mut Vec<(i32, ThreadId)>| {
            record.push((value, thread::current().id()));
        });

        queue.wait_idle();
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.drain(&mut record), 1);
        assert_eq!(record, vec![(42, thread::current().id())]);

        // Nothing left to deliver
        assert_eq!(queue.drain(&mut record), 0);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_produce_runs_off_main_thread() {
        let queue: WorkQueue<Vec<ThreadId>> = WorkQueue::new();
        let mut ids = Vec::new();

        queue.submit(|| thread::current().id(), |id, ids: &mut Vec<ThreadId>| ids.push(id));
        queue.run_until_idle(&mut ids);

        assert_eq!(ids.len(), 1);
        assert_ne!(ids[0], thread::current().id());
    }

    #[test]
    fn test_delivery_order_is_completion_order() {
        let queue: WorkQueue<Vec<u32>> = WorkQueue::new();
        let mut order = Vec::new();

        queue.submit(
            || {
                thread::sleep(Duration::from_millis(150));
                1
            },
            |v, order: &mut Vec<u32>| order.push(v),
        );
        queue.submit(|| 2, |v, order: &mut Vec<u32>| order.push(v));

        queue.run_until_idle(&mut order);
        assert_eq!(order, vec![2, 1]);
        assert_eq!(queue.submitted(), 2);
    }

    #[test]
    fn test_deliveries_can_submit_more_work() {
        let queue: WorkQueue<Vec<u32>> = WorkQueue::new();
        let chained = queue.clone();
        let mut values = Vec::new();

        queue.submit(
            || 1,
            move |v, values: &mut Vec<u32>| {
                values.push(v);
                chained.submit(|| 2, |v, values: &mut Vec<u32>| values.push(v));
            },
        );

        queue.run_until_idle(&mut values);
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_panicking_worker_is_contained() {
        let queue: WorkQueue<Vec<u32>> = WorkQueue::new();
        let mut values = Vec::new();

        queue.submit(|| -> u32 { panic!("bad grid") }, |v, values: &mut Vec<u32>| values.push(v));
        queue.submit(|| 7, |v, values: &mut Vec<u32>| values.push(v));

        queue.run_until_idle(&mut values);
        assert_eq!(values, vec![7]);
        assert_eq!(queue.in_flight(), 0);
    }
}
