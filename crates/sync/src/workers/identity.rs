//! Identity resolution cycle.
//!
//! A static provider (local key) resolves once at session start and the
//! task ends. An external provider is polled: the exposed account can
//! change or disappear between ticks, and an absent account clears the
//! active address.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{info, warn};

use chain_core::{Address, IdentityProvider};

use crate::events::{EventBus, IdentityEvent, SyncEvent};
use crate::session::SessionContext;

pub(crate) struct IdentityWorker {
    identity: Arc<dyn IdentityProvider>,
    ctx: Arc<SessionContext>,
    event_bus: EventBus,
    warmup: Duration,
    steady: Duration,
}

impl IdentityWorker {
    pub(crate) fn new(
        identity: Arc<dyn IdentityProvider>,
        ctx: Arc<SessionContext>,
        event_bus: EventBus,
        warmup: Duration,
        steady: Duration,
    ) -> Self {
        Self {
            identity,
            ctx,
            event_bus,
            warmup,
            steady,
        }
    }

    pub(crate) async fn run(self) {
        if self.identity.is_static() {
            match self.identity.current_address().await {
                Ok(address) => {
                    info!("resolved local identity: {:?}", address.map(|a| a.to_string()));
                    self.apply(address);
                }
                Err(error) => warn!("local identity resolution failed: {error}"),
            }
            // Resolved once; never polled again.
            return;
        }

        let mut interval = self.warmup;
        loop {
            time::sleep(interval).await;
            interval = self.steady;

            match self.identity.current_address().await {
                Ok(address) => self.apply(address),
                Err(error) => warn!("external identity poll failed: {error}"),
            }
        }
    }

    fn apply(&self, address: Option<Address>) {
        if self.ctx.set_active_address(address) {
            self.event_bus
                .publish(SyncEvent::Identity(IdentityEvent::AddressChanged {
                    address,
                }));
        }
    }
}
