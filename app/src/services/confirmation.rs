// src/services/confirmation.rs

//! The pledge confirmation message, in plain text and HTML.

use crate::config::RemittanceDetails;
use crate::money::format_rand;
use crate::services::mailer::OutgoingEmail;

pub const SUBJECT: &str = "Thank You for Your Thanksgiving Pledge! 🙏";

#[derive(Debug, Clone)]
pub struct PledgeConfirmation {
  pub reference: String,
  pub full_name: String,
  pub email: String,
  pub item_name: String,
  pub item_total_cents: i64,
  pub is_full: bool,
  pub amount_cents: i64,
}

impl PledgeConfirmation {
  fn pledge_type(&self) -> &'static str {
    if self.is_full {
      "Full Amount"
    } else {
      "Partial Amount"
    }
  }

  pub fn to_email(&self, remit: &RemittanceDetails) -> OutgoingEmail {
    OutgoingEmail {
      to_email: self.email.clone(),
      to_name: self.full_name.clone(),
      subject: SUBJECT.to_string(),
      text_body: render_text(self, remit),
      html_body: render_html(self, remit),
    }
  }
}

pub fn render_text(c: &PledgeConfirmation, remit: &RemittanceDetails) -> String {
  format!(
    "Dear {name},

Thank you for your generous pledge for Thanksgiving to the Lord!

YOUR PLEDGE DETAILS:
Item: {item}
Item Total Cost: {total}
Pledge Type: {kind}
Pledge Reference: {reference}
Your Pledge Amount: {amount}

BANK TRANSFER DETAILS:
Account Name: {account_name}
Bank: {bank}
Account Number: {account_number}
Branch: {branch}
Reference: {reference}

Your generosity is deeply appreciated!

This confirmation serves as a record of your pledge. We will be in touch with further details about fulfilling your commitment.

If you have any questions or concerns, please don't hesitate to reach out to us.

With gratitude,
TESDA Church

---
This email was sent in accordance with the Protection of Personal Information Act (POPI Act) of South Africa.
Your details will only be used for the purpose of processing this Thanksgiving pledge.
",
    name = c.full_name,
    item = c.item_name,
    total = format_rand(c.item_total_cents),
    kind = c.pledge_type(),
    reference = c.reference,
    amount = format_rand(c.amount_cents),
    account_name = remit.account_name,
    bank = remit.bank,
    account_number = remit.account_number,
    branch = remit.branch,
  )
}

fn detail_row(label: &str, value: &str) -> String {
  format!(
    "      <div class=\"detail-row\"><span class=\"detail-label\">{}:</span> <span class=\"detail-value\">{}</span></div>\n",
    label,
    escape_html(value)
  )
}

pub fn render_html(c: &PledgeConfirmation, remit: &RemittanceDetails) -> String {
  let pledge_rows = [
    detail_row("Item", &c.item_name),
    detail_row("Item Total Cost", &format_rand(c.item_total_cents)),
    detail_row("Pledge Type", c.pledge_type()),
    detail_row("Pledge Reference", &c.reference),
    detail_row("Your Pledge Amount", &format_rand(c.amount_cents)),
  ]
  .concat();
  let bank_rows = [
    detail_row("Account Name", &remit.account_name),
    detail_row("Bank", &remit.bank),
    detail_row("Account Number", &remit.account_number),
    detail_row("Branch", &remit.branch),
    detail_row("Reference", &c.reference),
  ]
  .concat();

  format!(
    r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <style>
    body {{ font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: #456380; color: white; padding: 30px 20px; text-align: center; border-radius: 8px 8px 0 0; }}
    .content {{ padding: 30px 20px; border: 1px solid #e5e7eb; border-top: none; }}
    .pledge-details {{ background: #fef3c7; border-left: 4px solid #456380; padding: 20px; margin: 20px 0; border-radius: 4px; }}
    .detail-row {{ margin: 10px 0; padding: 8px 0; border-bottom: 1px solid #fde68a; }}
    .detail-label {{ color: #78350f; font-weight: 500; }}
    .detail-value {{ color: #92400e; font-weight: 600; }}
    .footer {{ background: #f9fafb; padding: 20px; text-align: center; color: #6b7280; font-size: 14px; }}
  </style>
</head>
<body>
  <div class="header"><h1>🙏 Thank You for Your Pledge!</h1></div>
  <div class="content">
    <p>Dear {name},</p>
    <p>Thank you for your generous pledge for Thanksgiving to the Lord. Your offering makes a real difference in the Mission.</p>
    <div class="pledge-details">
      <h2>Your Pledge Details</h2>
{pledge_rows}    </div>
    <div class="pledge-details">
      <h2>Bank Transfer Details</h2>
{bank_rows}    </div>
    <p>Your generosity is deeply appreciated! ❤️</p>
    <p>This confirmation serves as a record of your pledge. We will be in touch with further details about fulfilling your commitment.</p>
    <p>If you have any questions or concerns, please don't hesitate to reach out to us.</p>
    <p>With gratitude,<br><strong>TESDA Church</strong></p>
  </div>
  <div class="footer">
    <p>This email was sent in accordance with the Protection of Personal Information Act (POPI Act) of South Africa.</p>
    <p>Your details will only be used for the purpose of processing this Thanksgiving pledge.</p>
  </div>
</body>
</html>
"#,
    name = escape_html(&c.full_name),
    pledge_rows = pledge_rows,
    bank_rows = bank_rows,
  )
}

pub fn escape_html(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for ch in raw.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}
