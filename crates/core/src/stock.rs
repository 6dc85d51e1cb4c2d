//! Stock counter arithmetic for a single material.
//!
//! Every store backend funnels stock mutations through [`StockLevel`] so the
//! invariant `0 <= reserved <= current` holds no matter which path changed the
//! counters.

use crate::error::CoreError;
use crate::types::Quantity;

/// The three counters tracked per material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub current: Quantity,
    pub minimum: Quantity,
    pub reserved: Quantity,
}

impl StockLevel {
    pub fn new(current: Quantity, minimum: Quantity, reserved: Quantity) -> Self {
        Self {
            current,
            minimum,
            reserved,
        }
    }

    /// Units that can still be promised to a new reservation or shipment.
    pub fn available(&self) -> Quantity {
        self.current - self.reserved
    }

    /// Goods received: add to the current stock.
    pub fn receive(self, quantity: Quantity) -> Result<Self, CoreError> {
        ensure_positive(quantity)?;
        let current = self
            .current
            .checked_add(quantity)
            .ok_or_else(|| CoreError::Validation("Stock quantity overflow".into()))?;
        Ok(Self { current, ..self })
    }

    /// Hold `quantity` units for a reservation or a pending shipment.
    pub fn reserve(self, quantity: Quantity) -> Result<Self, CoreError> {
        ensure_positive(quantity)?;
        if quantity > self.available() {
            return Err(CoreError::InvalidState(format!(
                "Insufficient stock: {} available, {quantity} requested",
                self.available()
            )));
        }
        Ok(Self {
            reserved: self.reserved + quantity,
            ..self
        })
    }

    /// Give back a hold without shipping it.
    pub fn release(self, quantity: Quantity) -> Result<Self, CoreError> {
        ensure_positive(quantity)?;
        if self.reserved < quantity {
            return Err(CoreError::InvalidState(format!(
                "Reserved stock is lower than the quantity to release: {} reserved, {quantity} requested",
                self.reserved
            )));
        }
        Ok(Self {
            reserved: self.reserved - quantity,
            ..self
        })
    }

    /// Check that a hold of `quantity` units exists, without changing it.
    ///
    /// Used when a reservation's hold is handed over to an outbound movement.
    pub fn ensure_reserved(&self, quantity: Quantity) -> Result<(), CoreError> {
        ensure_positive(quantity)?;
        if self.reserved < quantity {
            return Err(CoreError::InvalidState(format!(
                "Insufficient reserved stock: {} reserved, {quantity} required",
                self.reserved
            )));
        }
        Ok(())
    }

    /// Replace an existing hold of `held` units with one of `wanted` units.
    ///
    /// Only the difference touches the counters. `held` may be zero for a
    /// material the old hold did not cover, `wanted` may be zero to drop it.
    pub fn rehold(self, held: Quantity, wanted: Quantity) -> Result<Self, CoreError> {
        if held > 0 {
            self.ensure_reserved(held)?;
        }
        if wanted > held {
            self.reserve(wanted - held)
        } else if wanted < held {
            self.release(held - wanted)
        } else {
            Ok(self)
        }
    }

    /// Ship previously held units: both counters drop by `quantity`.
    pub fn ship_reserved(self, quantity: Quantity) -> Result<Self, CoreError> {
        self.ensure_reserved(quantity)?;
        // reserved <= current, so current cannot go negative here.
        Ok(Self {
            current: self.current - quantity,
            reserved: self.reserved - quantity,
            ..self
        })
    }

    /// Overwrite the current stock (manual correction from the material form).
    pub fn adjust_current(self, current: Quantity) -> Result<Self, CoreError> {
        if current < 0 {
            return Err(CoreError::Validation(
                "Current stock cannot be negative".into(),
            ));
        }
        if current < self.reserved {
            return Err(CoreError::InvalidState(format!(
                "Current stock cannot drop below the reserved stock ({})",
                self.reserved
            )));
        }
        Ok(Self { current, ..self })
    }

    /// Change the low-stock threshold.
    pub fn with_minimum(self, minimum: Quantity) -> Result<Self, CoreError> {
        if minimum < 0 {
            return Err(CoreError::Validation(
                "Minimum stock cannot be negative".into(),
            ));
        }
        Ok(Self { minimum, ..self })
    }

    /// Below the minimum threshold.
    pub fn is_low(&self) -> bool {
        self.current < self.minimum
    }
}

fn ensure_positive(quantity: Quantity) -> Result<(), CoreError> {
    if quantity <= 0 {
        return Err(CoreError::InvalidState(
            "Quantity must be greater than zero".into(),
        ));
    }
    Ok(())
}
