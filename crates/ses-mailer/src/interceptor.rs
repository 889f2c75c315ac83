//! Delivery interceptors
//!
//! An interceptor is a delivery gate consulted with the fully assembled
//! payload before any transmission or capture. Every registered interceptor
//! must agree for the delivery to proceed.

use std::sync::Arc;

use crate::types::MessagePayload;

/// A delivery gate. Consulted read-only; must not assume it is the only gate.
pub trait Interceptor: Send + Sync {
    /// `true` allows the delivery, `false` vetoes it.
    fn decide(&self, message: &MessagePayload) -> bool;
}

impl<F> Interceptor for F
where
    F: Fn(&MessagePayload) -> bool + Send + Sync,
{
    fn decide(&self, message: &MessagePayload) -> bool {
        self(message)
    }
}

/// Ordered, append-only list of interceptors.
///
/// `allows` is the logical AND over all registered gates, vacuously true when
/// empty, short-circuiting on the first veto.
#[derive(Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn allows(&self, message: &MessagePayload) -> bool {
        self.interceptors
            .iter()
            .all(|interceptor| interceptor.decide(message))
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessagePayload, SendOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn payload() -> MessagePayload {
        MessagePayload::build(
            &SendOptions::new().to("a@example.com").template("welcome"),
            "{}".to_string(),
        )
    }

    #[test]
    fn test_empty_chain_allows() {
        assert!(InterceptorChain::new().allows(&payload()));
    }

    #[test]
    fn test_chain_is_logical_and() {
        let mut chain = InterceptorChain::new();
        chain.register(Arc::new(|_: &MessagePayload| true));
        chain.register(Arc::new(|_: &MessagePayload| true));
        assert!(chain.allows(&payload()));

        chain.register(Arc::new(|_: &MessagePayload| false));
        assert!(!chain.allows(&payload()));
    }

    #[test]
    fn test_chain_short_circuits_on_first_veto() {
        let calls = Arc::new(AtomicUsize::new(0));

        let mut chain = InterceptorChain::new();
        chain.register(Arc::new(|_: &MessagePayload| false));
        let counter = calls.clone();
        chain.register(Arc::new(move |_: &MessagePayload| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }));

        assert!(!chain.allows(&payload()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_interceptor_sees_assembled_payload() {
        struct DomainGate;
        impl Interceptor for DomainGate {
            fn decide(&self, message: &MessagePayload) -> bool {
                message
                    .destination
                    .to_addresses
                    .iter()
                    .any(|email| email.ends_with("@example.com"))
            }
        }

        let mut chain = InterceptorChain::new();
        chain.register(Arc::new(DomainGate));
        assert!(chain.allows(&payload()));

        let external = MessagePayload::build(
            &SendOptions::new().to("a@other.org").template("welcome"),
            "{}".to_string(),
        );
        assert!(!chain.allows(&external));
    }
}
