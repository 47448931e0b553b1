//! Blocking-call offload executor.
//!
//! `submit(op, completion)` runs `op` on a fresh, detached OS thread and
//! invokes `completion(result)` on the control thread.
//!
//! ```text
//! control thread                      worker thread
//! ──────────────                      ─────────────
//! park(deliver) → id
//! spawn ───────────────────────────→  result = op()        (panic → ECANCELED)
//!                                     slot.fill(result)
//!                                     remote.complete(id)  (queue push + wake)
//! run_once: pop id → deliver()
//!           └ completion(slot.take())
//! ```
//!
//! **Contract:**
//! - Exactly one `completion` call per successful `submit`.
//! - No ordering between submissions.
//! - A spawn failure is returned from `submit`; `completion` is dropped
//!   without being called.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use nnb_core::error::{BridgeError, NnError, Result};
use tracing::{error, trace};

use crate::event_loop::LoopHandle;

/// Single-shot result cell written by the worker, read by the loop.
struct ResultSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T> ResultSlot<T> {
    fn new() -> Self {
        Self { value: Mutex::new(None) }
    }

    fn fill(&self, value: T) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    fn take(&self) -> Option<T> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

fn panic_text(payload: Box<dyn Any + Send>) -> String {
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned());
    format!("offloaded operation panicked: {msg}")
}

impl LoopHandle {
    /// Run `op` off the control thread and deliver its result back here.
    pub fn submit<T, Op, Done>(&self, op: Op, completion: Done) -> Result<()>
    where
        T: Send + 'static,
        Op: FnOnce() -> std::result::Result<T, NnError> + Send + 'static,
        Done: FnOnce(std::result::Result<T, NnError>) + 'static,
    {
        let slot = Arc::new(ResultSlot::new());
        let reader = Arc::clone(&slot);
        let id = self.park_offload(Box::new(move || match reader.take() {
            Some(result) => completion(result),
            None => error!("offload signalled without a result"),
        }));

        let remote = Arc::clone(&self.shared().remote);
        let config = self.config();
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", config.worker_name, id))
            .stack_size(config.worker_stack_size)
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(op))
                    .unwrap_or_else(|payload| Err(NnError::new(libc::ECANCELED, panic_text(payload))));
                slot.fill(result);
                remote.complete(id);
            });

        match spawned {
            Ok(_) => {
                trace!(offload = id, "offload submitted");
                Ok(())
            }
            Err(e) => {
                self.unpark_offload(id);
                Err(BridgeError::Spawn(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::event_loop::EventLoop;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn value_is_delivered_on_the_loop_thread() {
        let mut ev = EventLoop::with_config(BridgeConfig::new()).unwrap();
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        let control = thread::current().id();
        ev.handle()
            .submit(
                || Ok::<_, NnError>(thread::current().name().map(str::to_owned)),
                move |r| {
                    assert_eq!(thread::current().id(), control);
                    *sink.borrow_mut() = Some(r);
                },
            )
            .unwrap();
        assert_eq!(ev.pending_offloads(), 1);
        assert!(ev.run_until(|| got.borrow().is_some(), Duration::from_secs(5)).unwrap());
        let name = got.borrow_mut().take().unwrap().unwrap().unwrap();
        assert!(name.starts_with("nnb-offload-"));
        assert!(ev.is_idle());
    }

    #[test]
    fn panic_becomes_ecanceled() {
        let mut ev = EventLoop::with_config(BridgeConfig::new()).unwrap();
        let got = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&got);
        ev.handle()
            .submit(|| -> std::result::Result<(), NnError> { panic!("boom") }, move |r| {
                *sink.borrow_mut() = Some(r)
            })
            .unwrap();
        ev.run().unwrap();
        let err = got.borrow_mut().take().unwrap().unwrap_err();
        assert_eq!(err.code(), libc::ECANCELED);
        assert!(err.description().contains("boom"));
    }
}
