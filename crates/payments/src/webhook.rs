//! Provider webhook payloads.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use oysters_orders::PaymentProvider;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed webhook body: {0}")]
    Malformed(String),
}

/// A confirmed payment referencing one of our orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotice {
    pub provider: PaymentProvider,
    /// Our order id as echoed back by the provider.
    pub order_ref: String,
    pub payment_id: String,
}

/// String or number in provider JSON, as a trimmed string.
fn id_string(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

#[derive(Debug, Deserialize)]
struct CloudPaymentsBody {
    #[serde(rename = "Type")]
    kind: Option<String>,
    #[serde(rename = "InvoiceId")]
    invoice_id: Option<Value>,
    #[serde(rename = "TransactionId")]
    transaction_id: Option<Value>,
}

/// Only `Pay` with both ids produces a notice. `Check` runs before the charge
/// and, like every other event, is acknowledged without one.
pub fn parse_cloudpayments(body: &[u8]) -> Result<Option<PaymentNotice>, WebhookError> {
    let data: CloudPaymentsBody =
        serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

    if data.kind.as_deref() != Some("Pay") {
        return Ok(None);
    }

    Ok(
        match (id_string(data.invoice_id.as_ref()), id_string(data.transaction_id.as_ref())) {
            (Some(order_ref), Some(payment_id)) => Some(PaymentNotice {
                provider: PaymentProvider::CloudPayments,
                order_ref,
                payment_id,
            }),
            _ => None,
        },
    )
}

#[derive(Debug, Deserialize)]
struct YooKassaBody {
    event: Option<String>,
    object: Option<YooKassaObject>,
}

#[derive(Debug, Deserialize)]
struct YooKassaObject {
    id: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// `payment.succeeded` with `object.metadata.orderId` and `object.id`.
pub fn parse_yookassa(body: &[u8]) -> Result<Option<PaymentNotice>, WebhookError> {
    let data: YooKassaBody =
        serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

    if data.event.as_deref() != Some("payment.succeeded") {
        return Ok(None);
    }
    let Some(object) = data.object else {
        return Ok(None);
    };

    let order_ref = id_string(object.metadata.as_ref().and_then(|m| m.get("orderId")));
    Ok(match (order_ref, id_string(object.id.as_ref())) {
        (Some(order_ref), Some(payment_id)) => Some(PaymentNotice {
            provider: PaymentProvider::YooKassa,
            order_ref,
            payment_id,
        }),
        _ => None,
    })
}
