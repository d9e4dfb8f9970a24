//! Provider webhook event payloads
//!
//! Only the fields the reconciliation machine reads are modeled; everything
//! else in the provider payload is ignored by serde.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Envelope of a provider webhook delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Provider-side creation time (unix seconds); used for stale-event
    /// arbitration since subscription payloads carry no updated_at
    pub created: i64,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEventData {
    pub object: StripeEventObject,
}

impl StripeEvent {
    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.created, 0).single().unwrap_or_else(Utc::now)
    }
}

/// The `data.object` of the event, shaped by event type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripeEventObject {
    pub id: String,
    /// Customer id (checkout session, invoice, subscription)
    pub customer: Option<String>,
    /// Subscription id carried by checkout sessions and invoices
    pub subscription: Option<String>,
    /// Provider subscription status (`customer.subscription.*` events)
    pub status: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl Default for StripeEventObject {
    fn default() -> Self {
        Self {
            id: String::new(),
            customer: None,
            subscription: None,
            status: None,
            metadata: HashMap::new(),
        }
    }
}

impl StripeEventObject {
    /// Subscription id: `data.object.subscription` on sessions/invoices, the
    /// object's own id on `customer.subscription.*` events
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription.as_deref().or({
            if self.id.starts_with("sub_") {
                Some(self.id.as_str())
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checkout_completed() {
        let raw = serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": 1700000000,
            "data": {"object": {
                "id": "cs_123",
                "customer": "cus_9",
                "subscription": "sub_7",
                "metadata": {"tenant_code": "acme", "plan_code": "starter", "billing_cycle": "monthly"}
            }}
        });
        let event: StripeEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data.object.subscription_id(), Some("sub_7"));
        assert_eq!(event.data.object.metadata["tenant_code"], "acme");
    }

    #[test]
    fn test_subscription_event_uses_own_id() {
        let raw = serde_json::json!({
            "id": "evt_2",
            "type": "customer.subscription.updated",
            "created": 1700000100,
            "data": {"object": {"id": "sub_7", "customer": "cus_9", "status": "past_due"}}
        });
        let event: StripeEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.data.object.subscription_id(), Some("sub_7"));
        assert_eq!(event.data.object.status.as_deref(), Some("past_due"));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let raw = serde_json::json!({
            "id": "evt_3",
            "type": "invoice.paid",
            "created": 1700000200,
            "livemode": false,
            "data": {"object": {"id": "in_1", "subscription": "sub_7", "amount_paid": 4200}}
        });
        assert!(serde_json::from_value::<StripeEvent>(raw).is_ok());
    }
}
