//! Mailer runtime context
//!
//! [`MailerRuntime`] owns everything that was process-wide mutable state in
//! older designs: the delivery mode, the interceptor chain, the test-mode
//! capture list, and the live transport. Mailers hold an `Arc` to one; tests
//! construct isolated instances instead of mutating a shared global.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::warn;

use crate::interceptor::{Interceptor, InterceptorChain};
use crate::ses::DeliveryTransport;
use crate::types::{DeliveryRecord, MessagePayload};

/// Whether deliveries transmit or get captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Gated deliveries are appended to the capture list; nothing transmits.
    Test,
    /// Gated deliveries go to the live transport.
    Live,
}

/// Ordered, in-memory record of test-mode deliveries.
///
/// Never reset automatically; test harnesses call [`DeliveryCapture::clear`]
/// between scenarios.
#[derive(Default)]
pub struct DeliveryCapture {
    records: Mutex<Vec<DeliveryRecord>>,
}

impl DeliveryCapture {
    /// Append a delivery, returning the stored record.
    pub fn record(&self, message: MessagePayload, template: &str) -> DeliveryRecord {
        let record = DeliveryRecord {
            message,
            template: template.to_string(),
        };
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        record
    }

    /// Snapshot of all captured deliveries, in append order.
    pub fn list(&self) -> Vec<DeliveryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Shared context for a family of mailers.
pub struct MailerRuntime {
    mode: DeliveryMode,
    interceptors: Mutex<InterceptorChain>,
    capture: DeliveryCapture,
    transport: Option<Arc<dyn DeliveryTransport>>,
}

impl MailerRuntime {
    /// Runtime that captures gated deliveries instead of transmitting.
    pub fn test() -> Arc<Self> {
        Arc::new(Self {
            mode: DeliveryMode::Test,
            interceptors: Mutex::new(InterceptorChain::new()),
            capture: DeliveryCapture::default(),
            transport: None,
        })
    }

    /// Runtime that transmits gated deliveries through `transport`.
    pub fn live(transport: Arc<dyn DeliveryTransport>) -> Arc<Self> {
        Arc::new(Self {
            mode: DeliveryMode::Live,
            interceptors: Mutex::new(InterceptorChain::new()),
            capture: DeliveryCapture::default(),
            transport: Some(transport),
        })
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Append an interceptor to this runtime's chain. Cumulative; there is no
    /// de-registration.
    pub fn register_interceptor(&self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register(interceptor);
    }

    /// Evaluate the full chain against an assembled payload.
    pub fn allows(&self, message: &MessagePayload) -> bool {
        self.interceptors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .allows(message)
    }

    pub fn capture(&self) -> &DeliveryCapture {
        &self.capture
    }

    pub fn transport(&self) -> Option<Arc<dyn DeliveryTransport>> {
        self.transport.clone()
    }

    /// The process-wide default runtime.
    ///
    /// Starts in test mode until [`MailerRuntime::install_global`] replaces it
    /// with a configured instance, so a missing install can never leak live
    /// email.
    pub fn global() -> Arc<MailerRuntime> {
        global_cell().get_or_init(MailerRuntime::test).clone()
    }

    /// Install the process-wide default runtime. Effective only before the
    /// first [`MailerRuntime::global`] call; returns `false` (and logs) if the
    /// default was already initialized.
    pub fn install_global(runtime: Arc<MailerRuntime>) -> bool {
        let installed = global_cell().set(runtime).is_ok();
        if !installed {
            warn!("global mailer runtime already initialized; install ignored");
        }
        installed
    }
}

fn global_cell() -> &'static OnceLock<Arc<MailerRuntime>> {
    static GLOBAL: OnceLock<Arc<MailerRuntime>> = OnceLock::new();
    &GLOBAL
}
