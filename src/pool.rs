//! A bounded, blocking object pool.

use parking_lot::{Condvar, Mutex};

/// A bounded pool of reusable objects.
///
/// [`get`](WaitPool::get) hands out a pooled object, constructing one when
/// the free list is empty. When the pool is bounded and all objects are in
/// use, `get` blocks until another thread returns one with
/// [`put`](WaitPool::put). Safe for arbitrary concurrent use.
pub struct WaitPool<T> {
    state: Mutex<State<T>>,
    returned: Condvar,
    max: usize,
    make: Box<dyn Fn() -> T + Send + Sync>,
}

struct State<T> {
    free: Vec<T>,
    in_use: usize,
}

impl<T> WaitPool<T> {
    /// Creates a pool holding at most `max` objects; `max == 0` means
    /// unbounded. `make` constructs an object when the free list is empty.
    pub fn new(max: usize, make: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new(State {
                free: Vec::new(),
                in_use: 0,
            }),
            returned: Condvar::new(),
            max,
            make: Box::new(make),
        }
    }

    /// Takes an object from the pool, blocking while a bounded pool is
    /// exhausted.
    pub fn get(&self) -> T {
        let mut state = self.state.lock();
        if self.max != 0 {
            while state.in_use >= self.max {
                self.returned.wait(&mut state);
            }
        }
        state.in_use += 1;
        match state.free.pop() {
            Some(obj) => obj,
            None => {
                // Construct outside the lock.
                drop(state);
                (self.make)()
            }
        }
    }

    /// Returns an object to the pool and wakes one blocked `get`.
    pub fn put(&self, obj: T) {
        let mut state = self.state.lock();
        state.free.push(obj);
        state.in_use = state.in_use.saturating_sub(1);
        drop(state);
        self.returned.notify_one();
    }

    /// Number of objects currently handed out.
    pub fn count(&self) -> usize {
        self.state.lock().in_use
    }
}
