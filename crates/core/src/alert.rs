//! Low-stock alert rules.
//!
//! Each material has at most one `ACTIVA` alert. Stores call [`sync`] after
//! every stock change and apply the returned [`AlertAction`].

use crate::stock::StockLevel;

pub const KIND_LOW_STOCK: &str = "STOCK_BAJO";
pub const KIND_OUT_OF_STOCK: &str = "SIN_STOCK";

pub const STATE_ACTIVE: &str = "ACTIVA";
pub const STATE_CLOSED: &str = "CERRADA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    LowStock,
    OutOfStock,
}

impl AlertKind {
    pub fn code(self) -> &'static str {
        match self {
            AlertKind::LowStock => KIND_LOW_STOCK,
            AlertKind::OutOfStock => KIND_OUT_OF_STOCK,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            KIND_LOW_STOCK => Some(AlertKind::LowStock),
            KIND_OUT_OF_STOCK => Some(AlertKind::OutOfStock),
            _ => None,
        }
    }
}

/// Which alert, if any, a stock level calls for.
pub fn evaluate(level: &StockLevel) -> Option<AlertKind> {
    if !level.is_low() {
        return None;
    }
    if level.current <= 0 {
        Some(AlertKind::OutOfStock)
    } else {
        Some(AlertKind::LowStock)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    Keep,
    Open(AlertKind),
    Retype(AlertKind),
    Close,
}

/// Decide how the material's active alert (if any) must change.
pub fn sync(level: &StockLevel, active: Option<AlertKind>) -> AlertAction {
    match (evaluate(level), active) {
        (None, None) => AlertAction::Keep,
        (None, Some(_)) => AlertAction::Close,
        (Some(kind), None) => AlertAction::Open(kind),
        (Some(kind), Some(current)) if kind == current => AlertAction::Keep,
        (Some(kind), Some(_)) => AlertAction::Retype(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_stock_needs_no_alert() {
        assert_eq!(evaluate(&StockLevel::new(10, 5, 0)), None);
        assert_eq!(evaluate(&StockLevel::new(0, 0, 0)), None);
    }

    #[test]
    fn low_and_empty_stock_kinds() {
        assert_eq!(
            evaluate(&StockLevel::new(3, 5, 0)),
            Some(AlertKind::LowStock)
        );
        assert_eq!(
            evaluate(&StockLevel::new(0, 5, 0)),
            Some(AlertKind::OutOfStock)
        );
    }

    #[test]
    fn sync_actions() {
        let low = StockLevel::new(3, 5, 0);
        let empty = StockLevel::new(0, 5, 0);
        let healthy = StockLevel::new(9, 5, 0);

        assert_eq!(sync(&low, None), AlertAction::Open(AlertKind::LowStock));
        assert_eq!(sync(&low, Some(AlertKind::LowStock)), AlertAction::Keep);
        assert_eq!(
            sync(&empty, Some(AlertKind::LowStock)),
            AlertAction::Retype(AlertKind::OutOfStock)
        );
        assert_eq!(sync(&healthy, Some(AlertKind::LowStock)), AlertAction::Close);
        assert_eq!(sync(&healthy, None), AlertAction::Keep);
    }
}
