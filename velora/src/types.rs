//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability:
//!
//! - [`AdminId`], [`CompanyId`]: records in the global database
//! - [`ItemId`], [`CustomerId`], [`SaleId`], [`CategoryId`], [`TaxRateId`], [`UnitId`]: records
//!   inside a tenant database
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use uuid::Uuid;

// Global database
pub type AdminId = Uuid;
pub type CompanyId = Uuid;

// Tenant databases
pub type ItemId = Uuid;
pub type CustomerId = Uuid;
pub type SaleId = Uuid;
pub type SaleLineId = Uuid;
pub type CategoryId = Uuid;
pub type TaxRateId = Uuid;
pub type UnitId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
