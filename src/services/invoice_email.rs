//! Invoice email rendering
//!
//! Builds the HTML and plain-text invoice bodies from a persisted order.
//! Everything user-supplied goes through `esc` before landing in HTML.

use crate::db::models::Order;
use crate::services::mailer::{MailerService, OutgoingMail};
use crate::utils::AppResult;
use crate::utils::money::format_amount;

/// Minimal HTML entity escaping for interpolated user text
fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_invoice_html(store_name: &str, order: &Order) -> String {
    let rows: String = order
        .items
        .iter()
        .map(|item| {
            format!(
                r#"<tr>
  <td style="padding: 8px; border-bottom: 1px solid #eee;">{title}</td>
  <td style="padding: 8px; border-bottom: 1px solid #eee; text-align: center;">{qty}</td>
  <td style="padding: 8px; border-bottom: 1px solid #eee; text-align: right;">{unit}</td>
  <td style="padding: 8px; border-bottom: 1px solid #eee; text-align: right;">{line}</td>
</tr>"#,
                title = esc(&item.title),
                qty = item.qty,
                unit = format_amount(&order.currency, item.unit_price_in_fils),
                line = format_amount(&order.currency, item.line_total_in_fils),
            )
        })
        .collect();

    let shipping = if order.shipping_in_fils == 0 {
        "Free".to_string()
    } else {
        format_amount(&order.currency, order.shipping_in_fils)
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Invoice {invoice_no}</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #111;">{store_name}</h2>
    <p>Thank you for your order, {customer_name}!</p>
    <p><strong>Invoice:</strong> {invoice_no}<br>
       <strong>Date:</strong> {date}</p>
    <table style="width: 100%; border-collapse: collapse;">
      <thead>
        <tr style="background: #f5f5f5;">
          <th style="padding: 8px; text-align: left;">Item</th>
          <th style="padding: 8px; text-align: center;">Qty</th>
          <th style="padding: 8px; text-align: right;">Unit</th>
          <th style="padding: 8px; text-align: right;">Total</th>
        </tr>
      </thead>
      <tbody>{rows}</tbody>
    </table>
    <p style="text-align: right; margin-top: 16px;">
      Subtotal: {subtotal}<br>
      Shipping: {shipping}<br>
      <strong>Total: {total}</strong>
    </p>
    <p><strong>Deliver to:</strong><br>{address}</p>
    <p style="color: #666; font-size: 14px;">Payment: {payment}</p>
  </div>
</body>
</html>"#,
        store_name = esc(store_name),
        customer_name = esc(&order.customer.name),
        invoice_no = esc(&order.invoice_no),
        date = order.created_at.format("%Y-%m-%d"),
        subtotal = format_amount(&order.currency, order.subtotal_in_fils),
        total = format_amount(&order.currency, order.total_in_fils),
        address = esc(&order.shipping_address.formatted()),
        payment = esc(payment_description(&order.payment_method)),
    )
}

pub fn render_invoice_text(store_name: &str, order: &Order) -> String {
    let mut out = format!(
        "{store_name}\nInvoice {}\nDate: {}\n\n",
        order.invoice_no,
        order.created_at.format("%Y-%m-%d")
    );
    for item in &order.items {
        out.push_str(&format!(
            "{} x{} @ {} = {}\n",
            item.title,
            item.qty,
            format_amount(&order.currency, item.unit_price_in_fils),
            format_amount(&order.currency, item.line_total_in_fils),
        ));
    }
    out.push_str(&format!(
        "\nSubtotal: {}\nShipping: {}\nTotal: {}\n\nDeliver to: {}\nPayment: {}\n",
        format_amount(&order.currency, order.subtotal_in_fils),
        if order.shipping_in_fils == 0 {
            "Free".to_string()
        } else {
            format_amount(&order.currency, order.shipping_in_fils)
        },
        format_amount(&order.currency, order.total_in_fils),
        order.shipping_address.formatted(),
        payment_description(&order.payment_method),
    ));
    out
}

/// Human label for a payment method code
pub fn payment_description(method: &str) -> &str {
    match method {
        "cod" | "" => "Cash on delivery",
        other => other,
    }
}

/// Render and send the invoice for a freshly placed order
pub async fn send_order_invoice_email(
    mailer: &MailerService,
    store_name: &str,
    order: &Order,
) -> AppResult<()> {
    let mail = OutgoingMail {
        to: order.customer.email.clone(),
        subject: format!("{store_name} order {}", order.invoice_no),
        html: render_invoice_html(store_name, order),
        text: render_invoice_text(store_name, order),
    };
    mailer.send(mail).await
}
