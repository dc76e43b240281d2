//! Shared helpers for breaker integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use circuit_breaker::{CircuitBreaker, ExecuteError, Settings, StateType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fail")]
pub struct Fail;

pub async fn fail(cb: &CircuitBreaker) -> Result<(), ExecuteError<Fail>> {
    cb.execute(|| async { Err(Fail) }).await
}

pub async fn succeed(cb: &CircuitBreaker) -> Result<(), ExecuteError<Fail>> {
    cb.execute(|| async { Ok(()) }).await
}

/// Work that panics instead of returning.
pub async fn explode() -> Result<(), Fail> {
    panic!("oops")
}

/// Succeed or fail after `delay`.
pub async fn finish_later(
    cb: &CircuitBreaker,
    delay: Duration,
    ok: bool,
) -> Result<(), ExecuteError<Fail>> {
    cb.execute(|| async move {
        tokio::time::sleep(delay).await;
        if ok {
            Ok(())
        } else {
            Err(Fail)
        }
    })
    .await
}

pub async fn fail_times(cb: &CircuitBreaker, n: usize) {
    for _ in 0..n {
        let _ = fail(cb).await;
    }
}

/// Records every `(name, from, to)` passed to the notification hook.
#[derive(Clone, Default)]
pub struct ChangeRecorder {
    changes: Arc<Mutex<Vec<(String, StateType, StateType)>>>,
}

impl ChangeRecorder {
    pub fn attach(&self, settings: Settings) -> Settings {
        let changes = self.changes.clone();
        settings.on_state_change(move |name, from, to| {
            changes.lock().unwrap().push((name.to_string(), from, to));
        })
    }

    pub fn changes(&self) -> Vec<(String, StateType, StateType)> {
        self.changes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(StateType, StateType)> {
        self.changes.lock().unwrap().last().map(|(_, f, t)| (*f, *t))
    }
}

/// Trip a default-predicate breaker and wait out its open timeout.
pub async fn into_half_open(cb: &CircuitBreaker, timeout: Duration) {
    fail_times(cb, 6).await;
    assert_eq!(cb.state(), StateType::Open);
    tokio::time::sleep(timeout + Duration::from_millis(100)).await;
    assert_eq!(cb.state(), StateType::HalfOpen);
}
