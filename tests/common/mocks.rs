use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use validate_json::{CancelToken, Result, Rule, Value};

/// Factory that records how many target objects were created
#[derive(Clone, Default)]
pub struct CountingFactory {
    created: Arc<AtomicUsize>,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory<T: Default>(&self) -> impl Fn() -> T + Send + Sync + 'static {
        let created = Arc::clone(&self.created);
        move || {
            created.fetch_add(1, Ordering::SeqCst);
            T::default()
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

/// Wraps a rule and counts every invocation
#[derive(Clone)]
pub struct CountingRule<R> {
    inner: R,
    calls: Arc<AtomicUsize>,
}

impl<R: Rule> CountingRule<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl<R: Rule> Rule for CountingRule<R> {
    type Output = R::Output;

    fn validate(&self, value: &Value) -> Result<Self::Output> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.validate(value)
    }

    fn validate_with(&self, value: &Value, token: &CancelToken) -> Result<Self::Output> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.validate_with(value, token)
    }
}

/// Holds every validation until the gate is opened
#[derive(Clone)]
pub struct GateRule<R> {
    inner: R,
    gate: Arc<(Mutex<bool>, Condvar)>,
    entered: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl<R: Rule> GateRule<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            gate: Arc::new((Mutex::new(false), Condvar::new())),
            entered: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open(&self) {
        let (lock, signal) = &*self.gate;
        *lock.lock().unwrap() = true;
        signal.notify_all();
    }

    /// Number of validations that reached the gate
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Number of validations that passed the gate and returned
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Block until at least `count` validations are waiting at the gate
    pub fn wait_entered(&self, count: usize) {
        while self.entered() < count {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl<R: Rule> Rule for GateRule<R> {
    type Output = R::Output;

    fn validate(&self, value: &Value) -> Result<Self::Output> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let (lock, signal) = &*self.gate;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = signal.wait(open).unwrap();
        }
        drop(open);
        let result = self.inner.validate(value);
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Sleeps before validating the nodes selected by `slow_when`
#[derive(Clone)]
pub struct SlowRule<R> {
    inner: R,
    delay: Duration,
    slow_when: fn(&Value) -> bool,
}

impl<R: Rule> SlowRule<R> {
    /// Delay every validation
    pub fn new(inner: R, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            slow_when: |_| true,
        }
    }

    /// Delay only the nodes matching `slow_when`
    pub fn only_when(mut self, slow_when: fn(&Value) -> bool) -> Self {
        self.slow_when = slow_when;
        self
    }
}

impl<R: Rule> Rule for SlowRule<R> {
    type Output = R::Output;

    fn validate(&self, value: &Value) -> Result<Self::Output> {
        if (self.slow_when)(value) {
            thread::sleep(self.delay);
        }
        self.inner.validate(value)
    }

    fn validate_with(&self, value: &Value, token: &CancelToken) -> Result<Self::Output> {
        if (self.slow_when)(value) {
            thread::sleep(self.delay);
        }
        self.inner.validate_with(value, token)
    }
}
