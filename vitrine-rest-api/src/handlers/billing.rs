//! Billing endpoints: checkout hand-off, portal, webhook ingestion, config

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::context::BillingContext;
use crate::models::billing::{CheckoutSessionRequest, PortalSessionRequest};
use vitrine_api_types::BillingCycle;
use vitrine_billing::service::BillingServiceError;
use vitrine_billing::{verify_signature, StripeEvent};
use vitrine_web::{ApiResponse, AuthContext, WebError, WebResult};

const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Start hosted checkout: `POST /billing/create-checkout-session`
pub async fn create_checkout_session(
    State(ctx): State<BillingContext>,
    Json(request): Json<CheckoutSessionRequest>,
) -> WebResult<impl IntoResponse> {
    let tenant_code = request
        .tenant_code
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WebError::missing_field("tenant_code"))?;
    let plan = request
        .plan
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WebError::missing_field("plan"))?;
    let cycle: BillingCycle = request
        .billing_cycle
        .as_deref()
        .unwrap_or("monthly")
        .parse()
        .map_err(|e| WebError::invalid_field("billing_cycle", e))?;

    let session = ctx
        .service
        .create_checkout_session(tenant_code, plan, cycle)
        .await
        .map_err(map_service_error)?;
    Ok(ApiResponse::new("checkout_url", session.url).field("session_id", session.session_id))
}

/// Open the self-service portal: `POST /billing/create-portal-session`
///
/// Requires an authenticated caller whose company owns a tenant.
pub async fn create_portal_session(
    State(ctx): State<BillingContext>,
    auth: AuthContext,
    Json(request): Json<PortalSessionRequest>,
) -> WebResult<impl IntoResponse> {
    auth.require_authenticated()?;
    let company_id = auth.company_id.ok_or_else(WebError::tenant_not_found)?;
    let tenant = ctx
        .repositories
        .tenant_repository()
        .find_by_company(company_id)
        .await?
        .ok_or_else(WebError::tenant_not_found)?;

    let return_url = request
        .return_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WebError::missing_field("return_url"))?;

    let session = ctx
        .service
        .create_portal_session(&tenant.code, return_url)
        .await
        .map_err(map_service_error)?;
    Ok(ApiResponse::new("portal_url", session.url))
}

/// Ingest provider webhooks: `POST /billing/webhooks`
///
/// The raw body is read before any parsing so the signature covers the
/// exact bytes the provider signed. Unknown events are acknowledged 200 to
/// avoid retry storms; processing failures return 5xx without writing
/// state so the provider retries.
pub async fn webhooks(
    State(ctx): State<BillingContext>,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<impl IntoResponse> {
    match &ctx.webhook_secret {
        Some(secret) => {
            let signature = headers
                .get(SIGNATURE_HEADER)
                .and_then(|h| h.to_str().ok())
                .ok_or_else(WebError::invalid_signature)?;
            let valid = verify_signature(&body, signature, secret, Utc::now().timestamp())
                .map_err(|_| WebError::invalid_signature())?;
            if !valid {
                warn!("webhook delivery rejected: signature mismatch");
                return Err(WebError::invalid_signature());
            }
        }
        None => {
            // Deployment error, not a supported mode
            error!("STRIPE_WEBHOOK_SECRET not configured; processing UNVERIFIED webhook delivery");
        }
    }

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| WebError::invalid_field("body", format!("unparseable event: {e}")))?;

    info!(event = %event.id, event_type = %event.event_type, "webhook received");
    let outcome = ctx.processor.process(&event).await?;
    Ok(ApiResponse::new("received", json!(true)).field("outcome", format!("{outcome:?}")))
}

/// Publishable key for the frontend: `GET /billing/config`
pub async fn config(State(ctx): State<BillingContext>) -> WebResult<impl IntoResponse> {
    let key = ctx
        .service
        .publishable_key()
        .ok_or_else(|| WebError::new(vitrine_api_types::ErrorCode::BillingNotConfigured, "billing provider is not configured"))?;
    Ok(ApiResponse::new("publishable_key", key))
}

fn map_service_error(err: BillingServiceError) -> WebError {
    match err {
        BillingServiceError::TenantNotFound { .. } => WebError::tenant_not_found(),
        BillingServiceError::PlanNotFound { code } => WebError::invalid_field("plan", format!("unknown plan {code}")),
        BillingServiceError::Billing(err) => err.into(),
        BillingServiceError::Database(err) => err.into(),
    }
}
