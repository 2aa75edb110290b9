//! Sale pricing.
//!
//! Per line:
//!
//! ```text
//! gross           = quantity × selling_rate
//! discount_amount = gross × discount% / 100
//! taxable         = gross − discount_amount
//! tax_amount      = taxable × tax% / 100
//! line_total      = taxable + tax_amount
//! ```
//!
//! Intermediate amounts keep full precision. Only the sale total is rounded, to two decimal
//! places with halves rounded away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Inputs needed to price one sale line.
#[derive(Debug, Clone, Copy)]
pub struct LineInput {
    pub quantity: i32,
    pub selling_rate: Decimal,
    pub discount_percent: Decimal,
    pub tax_percent: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    pub gross: Decimal,
    pub discount_amount: Decimal,
    pub taxable: Decimal,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
}

pub fn price_line(input: &LineInput) -> LineAmounts {
    let hundred = Decimal::ONE_HUNDRED;
    let gross = Decimal::from(input.quantity) * input.selling_rate;
    let discount_amount = gross * input.discount_percent / hundred;
    let taxable = gross - discount_amount;
    let tax_amount = taxable * input.tax_percent / hundred;

    LineAmounts {
        gross,
        discount_amount,
        taxable,
        tax_amount,
        line_total: taxable + tax_amount,
    }
}

/// Round a currency amount to paise.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Total of a sale: the sum of its line totals, rounded once.
pub fn sale_total<'a>(lines: impl IntoIterator<Item = &'a LineAmounts>) -> Decimal {
    round_currency(lines.into_iter().map(|line| line.line_total).sum())
}
