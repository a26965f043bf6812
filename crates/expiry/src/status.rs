use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use molino_lots::Lot;

/// Days-to-expiry threshold at or below which a lot counts as near expiry.
pub const NEAR_EXPIRY_WINDOW_DAYS: i64 = 7;

/// Shelf-life classification of a lot on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    /// Expiry date strictly in the past.
    Expired,
    /// Expires today or within [`NEAR_EXPIRY_WINDOW_DAYS`] days.
    NearExpiry,
    Valid,
    /// No expiry date recorded.
    Unknown,
}

/// Signed days until the lot expires: negative when already past, zero on
/// the expiry day itself, `None` when the lot carries no expiry date.
pub fn days_to_expiry(lot: &Lot, today: NaiveDate) -> Option<i64> {
    lot.expiry_date.map(|expiry| (expiry - today).num_days())
}

pub fn classify(lot: &Lot, today: NaiveDate) -> ExpiryStatus {
    match days_to_expiry(lot, today) {
        None => ExpiryStatus::Unknown,
        Some(days) if days < 0 => ExpiryStatus::Expired,
        Some(days) if days <= NEAR_EXPIRY_WINDOW_DAYS => ExpiryStatus::NearExpiry,
        Some(_) => ExpiryStatus::Valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use molino_core::{LotId, OrderId, ProductId, Quantity};
    use molino_lots::LotNumber;
    use rust_decimal_macros::dec;

    fn lot_expiring(expiry: Option<NaiveDate>) -> Lot {
        let production_date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let order_id = OrderId::new();
        Lot {
            id: LotId::new(),
            lot_number: LotNumber::derive(production_date, order_id),
            product_id: ProductId::new(),
            order_id,
            production_date,
            expiry_date: expiry,
            initial_quantity: Quantity::new(dec!(10)),
        }
    }

    #[test]
    fn classification_boundaries() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        let cases = [
            // Day before today: expired.
            (NaiveDate::from_ymd_opt(2026, 8, 29), ExpiryStatus::Expired),
            // Expiry day itself still counts as near expiry, not expired.
            (NaiveDate::from_ymd_opt(2026, 8, 30), ExpiryStatus::NearExpiry),
            // Exactly seven days out: near expiry.
            (NaiveDate::from_ymd_opt(2026, 9, 6), ExpiryStatus::NearExpiry),
            // Eight days out: valid.
            (NaiveDate::from_ymd_opt(2026, 9, 7), ExpiryStatus::Valid),
        ];
        for (expiry, expected) in cases {
            assert_eq!(classify(&lot_expiring(expiry), today), expected);
        }

        assert_eq!(classify(&lot_expiring(None), today), ExpiryStatus::Unknown);
    }

    #[test]
    fn days_to_expiry_is_signed() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let lot = lot_expiring(NaiveDate::from_ymd_opt(2026, 8, 27));
        assert_eq!(days_to_expiry(&lot, today), Some(-3));
        assert_eq!(days_to_expiry(&lot_expiring(None), today), None);
    }
}
