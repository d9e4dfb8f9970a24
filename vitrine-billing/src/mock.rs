//! Mock billing gateway for tests and offline development

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use vitrine_interfaces::{
    BillingError, BillingGateway, CheckoutSessionRequest, CheckoutSessionResponse, PortalSessionResponse,
};

/// In-memory gateway that fabricates provider ids and records calls
#[derive(Default)]
pub struct MockBillingGateway {
    counter: AtomicUsize,
    /// Checkout requests received, for assertions
    pub checkout_requests: Mutex<Vec<CheckoutSessionRequest>>,
    /// When set, every call fails with a provider error
    pub fail: std::sync::atomic::AtomicBool,
}

impl MockBillingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> usize {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), BillingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BillingError::Provider {
                message: "mock provider failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BillingGateway for MockBillingGateway {
    async fn create_customer(&self, _email: &str, tenant_code: &str) -> Result<String, BillingError> {
        self.check_failure()?;
        Ok(format!("cus_mock_{}_{}", tenant_code, self.next()))
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionResponse, BillingError> {
        self.check_failure()?;
        let n = self.next();
        self.checkout_requests.lock().expect("mock lock").push(request);
        Ok(CheckoutSessionResponse {
            session_id: format!("cs_mock_{n}"),
            url: format!("https://checkout.mock/session/{n}"),
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        _return_url: &str,
    ) -> Result<PortalSessionResponse, BillingError> {
        self.check_failure()?;
        Ok(PortalSessionResponse {
            url: format!("https://portal.mock/{customer_id}"),
        })
    }

    fn publishable_key(&self) -> Option<&str> {
        Some("pk_test_mock")
    }
}
