use url::Url;

use oysters_core::Money;
use oysters_orders::OrderId;

const WIDGET_BASE: &str = "https://widget.cloudpayments.ru/pay";

/// Link to the CloudPayments hosted payment form for an order.
pub fn cloudpayments_widget_url(
    public_id: &str,
    order_id: OrderId,
    amount: Money,
    order_number: &str,
) -> Result<String, url::ParseError> {
    let url = Url::parse_with_params(
        WIDGET_BASE,
        &[
            ("publicId", public_id.to_string()),
            ("invoiceId", order_id.to_string()),
            ("amount", amount.to_decimal_string()),
            ("currency", "RUB".to_string()),
            ("description", format!("Order {order_number}")),
        ],
    )?;
    Ok(url.into())
}
