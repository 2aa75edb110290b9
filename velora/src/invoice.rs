//! Plain-text invoice rendering for narrow receipt printers.
//!
//! The rendered text is returned to the caller; printing is the client's business.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::db::models::companies::CompanyDBResponse;
use crate::types::SaleId;

const RULE: &str = "=====================";
const DIVIDER: &str = "---------------------";
const NAME_WIDTH: usize = 12;

/// The store block printed at the top of every invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceHeader {
    pub store_name: String,
    pub address: String,
    pub locality: String,
    pub phone: String,
}

impl Default for InvoiceHeader {
    fn default() -> Self {
        Self {
            store_name: "VELORA STORE".to_string(),
            address: "123 Business Street".to_string(),
            locality: "City, State - 123456".to_string(),
            phone: "9876543210".to_string(),
        }
    }
}

impl InvoiceHeader {
    /// Header for a company, keeping the default for any part the company has not filled in.
    pub fn for_company(company: &CompanyDBResponse) -> Self {
        let default = Self::default();
        let locality = match (&company.city, &company.state, &company.pin_code) {
            (Some(city), Some(state), Some(pin)) => Some(format!("{city}, {state} - {pin}")),
            (Some(city), Some(state), None) => Some(format!("{city}, {state}")),
            (Some(city), None, _) => Some(city.clone()),
            _ => None,
        };
        Self {
            store_name: company.name.to_uppercase(),
            address: company.address.clone().unwrap_or(default.address),
            locality: locality.unwrap_or(default.locality),
            phone: company.phone.clone().unwrap_or(default.phone),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceLine {
    pub item_name: String,
    pub quantity: i32,
    pub selling_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct Invoice {
    pub sale_id: SaleId,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: String,
    pub lines: Vec<InvoiceLine>,
    pub total: Decimal,
}

/// `INV` + two-digit year + two-digit month + last four characters of the sale id, uppercased.
pub fn invoice_number(sale_id: &SaleId, created_at: DateTime<Utc>) -> String {
    let id = sale_id.simple().to_string();
    let tail = &id[id.len() - 4..];
    format!("INV{:02}{:02}{}", created_at.year() % 100, created_at.month(), tail.to_uppercase())
}

fn item_row(line: &InvoiceLine) -> String {
    let name: String = line.item_name.chars().take(NAME_WIDTH).collect();
    let amount = (Decimal::from(line.quantity) * line.selling_rate).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{name:<4}{:>3}{:>5}", line.quantity, amount).trim().to_string()
}

pub fn render_invoice(header: &InvoiceHeader, invoice: &Invoice) -> String {
    let mut lines = vec![
        RULE.to_string(),
        header.store_name.clone(),
        header.address.clone(),
        header.locality.clone(),
        format!("Phone: {}", header.phone),
        RULE.to_string(),
        "INVOICE".to_string(),
        RULE.to_string(),
        format!("InvoiceNo: {}", invoice_number(&invoice.sale_id, invoice.created_at)),
        format!("Date: {}", invoice.created_at.format("%-d/%-m/%Y")),
        DIVIDER.to_string(),
        "BILL TO:".to_string(),
        invoice.customer_name.clone(),
        format!("Phone: {}", invoice.customer_phone),
        DIVIDER.to_string(),
        "ITEMS:".to_string(),
        "Name Qty Amt".to_string(),
        DIVIDER.to_string(),
    ];
    lines.extend(invoice.lines.iter().map(item_row));
    lines.extend([
        DIVIDER.to_string(),
        format!("TOTAL: Rs {:.2}", invoice.total),
        RULE.to_string(),
        "Thank you for shopping".to_string(),
        "Visit us again soon".to_string(),
        RULE.to_string(),
        // paper feed
        String::new(),
        String::new(),
        String::new(),
    ]);
    lines.join("\n")
}
