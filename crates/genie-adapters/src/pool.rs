//! Fixed-size blocking bag of invokers (spec §4.7), ported from the
//! `InvokersPool` context manager in
//! `examples/original_source/ai_state_machine/environment.py`: a queue of
//! `nr_invokers` identically-configured invokers, `acquire` blocking until
//! one is free and returning it to the queue when the lease drops.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::{Semaphore, SemaphorePermit};

use genie_core::invoker::Invoker;

pub struct InvokerBag {
    queue: Mutex<VecDeque<Arc<dyn Invoker>>>,
    available: Semaphore,
}

impl InvokerBag {
    pub fn new(invokers: Vec<Arc<dyn Invoker>>) -> Self {
        let available = Semaphore::new(invokers.len());
        Self { queue: Mutex::new(invokers.into()), available }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Blocks until an invoker is available, then leases it exclusively.
    pub async fn acquire(&self) -> InvokerLease<'_> {
        let permit = self.available.acquire().await.expect("InvokerBag semaphore never closed");
        let invoker = self.queue.lock().unwrap().pop_front().expect("permit implies a queued invoker");
        InvokerLease { bag: self, invoker: Some(invoker), _permit: permit }
    }
}

pub struct InvokerLease<'a> {
    bag: &'a InvokerBag,
    invoker: Option<Arc<dyn Invoker>>,
    _permit: SemaphorePermit<'a>,
}

impl<'a> std::ops::Deref for InvokerLease<'a> {
    type Target = dyn Invoker;

    fn deref(&self) -> &Self::Target {
        self.invoker.as_deref().expect("invoker present for lease lifetime")
    }
}

impl<'a> Drop for InvokerLease<'a> {
    fn drop(&mut self) {
        if let Some(invoker) = self.invoker.take() {
            self.bag.queue.lock().unwrap().push_back(invoker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use genie_core::invoker::InvokerError;

    struct Echo;

    #[async_trait]
    impl Invoker for Echo {
        async fn invoke(&self, content: &str) -> Result<String, InvokerError> {
            Ok(content.to_string())
        }
    }

    #[tokio::test]
    async fn acquire_returns_invoker_to_queue_on_drop() {
        let bag = InvokerBag::new(vec![Arc::new(Echo), Arc::new(Echo)]);
        assert_eq!(bag.len(), 2);
        {
            let lease = bag.acquire().await;
            assert_eq!(bag.len(), 1);
            assert_eq!(lease.invoke("x").await.unwrap(), "x");
        }
        assert_eq!(bag.len(), 2);
    }
}
