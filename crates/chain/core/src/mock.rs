//! Mock chain transport for testing without a node.
//!
//! Call responses are scripted per operation: a queue is keyed by a payload
//! data prefix (in practice the 4-byte selector), and each matching call
//! pops the next scripted result. Within one operation that matches the
//! strictly sequential read ordering the cycles guarantee. Every payload
//! that reaches the mock is recorded for assertions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::traits::ChainTransport;
use crate::types::{BlockNumber, CallPayload, TransactionId, TransactionPayload};

type ScriptedResult = Result<Vec<u8>, String>;

#[derive(Default)]
struct Inner {
    call_routes: Vec<(Vec<u8>, VecDeque<ScriptedResult>)>,
    submit_script: VecDeque<Result<TransactionId, String>>,
    calls: Vec<CallPayload>,
    submissions: Vec<TransactionPayload>,
    tx_counter: u64,
    block: u64,
    submits_in_flight: u32,
    max_submits_in_flight: u32,
}

impl Inner {
    fn route_mut(&mut self, prefix: &[u8]) -> &mut VecDeque<ScriptedResult> {
        if let Some(position) = self.call_routes.iter().position(|(p, _)| p == prefix) {
            return &mut self.call_routes[position].1;
        }
        self.call_routes.push((prefix.to_vec(), VecDeque::new()));
        &mut self.call_routes.last_mut().unwrap().1
    }
}

/// In-memory [`ChainTransport`] with scripted responses.
#[derive(Clone, Default)]
pub struct MockChainTransport {
    inner: Arc<Mutex<Inner>>,
    submit_delay: Option<Duration>,
}

impl MockChainTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `submit` take this long before completing. Used to widen
    /// the window in which an overlapping submission could be observed.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    /// Queue a successful response for calls whose data starts with `prefix`.
    pub fn enqueue_call_response(&self, prefix: &[u8], bytes: Vec<u8>) {
        self.inner
            .lock()
            .unwrap()
            .route_mut(prefix)
            .push_back(Ok(bytes));
    }

    /// Queue a transport failure for calls whose data starts with `prefix`.
    pub fn enqueue_call_failure(&self, prefix: &[u8], reason: &str) {
        self.inner
            .lock()
            .unwrap()
            .route_mut(prefix)
            .push_back(Err(reason.to_string()));
    }

    /// Queue a transport failure for the next submission. Submissions with
    /// no scripted result succeed with a generated transaction id.
    pub fn enqueue_submit_failure(&self, reason: &str) {
        self.inner
            .lock()
            .unwrap()
            .submit_script
            .push_back(Err(reason.to_string()));
    }

    pub fn set_block_number(&self, block: u64) {
        self.inner.lock().unwrap().block = block;
    }

    /// Every call payload received, in arrival order.
    pub fn recorded_calls(&self) -> Vec<CallPayload> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Every transaction payload received, in arrival order.
    pub fn recorded_submissions(&self) -> Vec<TransactionPayload> {
        self.inner.lock().unwrap().submissions.clone()
    }

    /// Highest number of submissions that were ever in flight at once.
    pub fn max_submits_in_flight(&self) -> u32 {
        self.inner.lock().unwrap().max_submits_in_flight
    }

    fn next_tx_id(inner: &mut Inner) -> TransactionId {
        inner.tx_counter += 1;
        TransactionId::from_bytes(inner.tx_counter.to_be_bytes().to_vec())
    }
}

#[async_trait]
impl ChainTransport for MockChainTransport {
    async fn call(&self, payload: &CallPayload) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(payload.clone());
        let scripted = inner
            .call_routes
            .iter_mut()
            .find(|(prefix, _)| payload.data.starts_with(prefix))
            .and_then(|(_, queue)| queue.pop_front());
        match scripted {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(reason)) => Err(TransportError::Network(reason)),
            None => Err(TransportError::Network("no scripted response".to_string())),
        }
    }

    async fn submit(&self, payload: &TransactionPayload) -> Result<TransactionId, TransportError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.submits_in_flight += 1;
            inner.max_submits_in_flight = inner.max_submits_in_flight.max(inner.submits_in_flight);
        }

        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.submits_in_flight -= 1;
        inner.submissions.push(payload.clone());
        match inner.submit_script.pop_front() {
            Some(Ok(tx_id)) => Ok(tx_id),
            Some(Err(reason)) => Err(TransportError::Rejected(reason)),
            None => Ok(Self::next_tx_id(&mut inner)),
        }
    }

    async fn block_number(&self) -> Result<BlockNumber, TransportError> {
        Ok(BlockNumber(self.inner.lock().unwrap().block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;

    #[tokio::test]
    async fn scripted_responses_pop_in_order_per_route() {
        let transport = MockChainTransport::new();
        transport.enqueue_call_response(&[0xde, 0xad], vec![1]);
        transport.enqueue_call_failure(&[0xde, 0xad], "node down");
        transport.enqueue_call_response(&[0xbe, 0xef], vec![2]);

        let first = CallPayload {
            to: Address::ZERO,
            data: vec![0xde, 0xad, 0x00, 0x01],
        };
        let other = CallPayload {
            to: Address::ZERO,
            data: vec![0xbe, 0xef],
        };

        assert_eq!(transport.call(&first).await.unwrap(), vec![1]);
        assert_eq!(transport.call(&other).await.unwrap(), vec![2]);
        assert!(transport.call(&first).await.is_err());
        // Exhausted route keeps failing rather than panicking.
        assert!(transport.call(&other).await.is_err());
        assert_eq!(transport.recorded_calls().len(), 4);
    }

    #[tokio::test]
    async fn submissions_get_fresh_transaction_ids() {
        let transport = MockChainTransport::new();
        let payload = TransactionPayload {
            from: Address::ZERO,
            to: Address::ZERO,
            data: vec![],
            gas_limit: 21_000,
        };

        let first = transport.submit(&payload).await.unwrap();
        let second = transport.submit(&payload).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(transport.recorded_submissions().len(), 2);
    }
}
