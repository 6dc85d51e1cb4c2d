//! Reservation ("apartado") lifecycle rules.
//!
//! A reservation holds stock for a client until it is converted, exactly once,
//! into an outbound movement. After conversion its lines are frozen.

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::movement::MovementLine;
use crate::types::Quantity;

pub const STATE_ACTIVE: &str = "ACT";
pub const STATE_CANCELLED: &str = "CAN";
pub const STATE_FINISHED: &str = "FIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    Active,
    Cancelled,
    Finished,
}

impl ReservationState {
    pub fn code(self) -> &'static str {
        match self {
            ReservationState::Active => STATE_ACTIVE,
            ReservationState::Cancelled => STATE_CANCELLED,
            ReservationState::Finished => STATE_FINISHED,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            STATE_ACTIVE => Some(ReservationState::Active),
            STATE_CANCELLED => Some(ReservationState::Cancelled),
            STATE_FINISHED => Some(ReservationState::Finished),
            _ => None,
        }
    }

    /// Parse a client-supplied state code.
    pub fn parse(code: &str) -> Result<Self, CoreError> {
        Self::from_code(code).ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid reservation state '{code}'. Must be one of: {STATE_ACTIVE}, {STATE_CANCELLED}, {STATE_FINISHED}"
            ))
        })
    }
}

/// State of a newly created reservation. Only `ACT` (or nothing) is accepted;
/// the other states are reached through [`transition`].
pub fn initial_state(code: Option<&str>) -> Result<ReservationState, CoreError> {
    match code.map(ReservationState::parse).transpose()? {
        None | Some(ReservationState::Active) => Ok(ReservationState::Active),
        Some(other) => Err(CoreError::Validation(format!(
            "A new reservation must start in state {STATE_ACTIVE}, not {}",
            other.code()
        ))),
    }
}

/// Error for any second attempt to turn a reservation into an outbound movement.
pub fn already_generated() -> CoreError {
    CoreError::InvalidState(
        "The outbound movement was already generated for this reservation".into(),
    )
}

/// What a store must do after a state change has been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub next: ReservationState,
    /// Give back every line's hold on the materials.
    pub release_holds: bool,
}

/// Lines can only change while the reservation is active and not yet converted.
pub fn ensure_lines_mutable(state: ReservationState, converted: bool) -> Result<(), CoreError> {
    if converted {
        return Err(already_generated());
    }
    if state != ReservationState::Active {
        return Err(CoreError::InvalidState("The reservation is not active".into()));
    }
    Ok(())
}

/// A reserved quantity must be strictly positive.
pub fn ensure_quantity(quantity: Quantity) -> Result<(), CoreError> {
    if quantity <= 0 {
        return Err(CoreError::InvalidState(
            "Quantity must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Preconditions for turning a reservation into an outbound movement.
pub fn ensure_convertible(
    state: ReservationState,
    converted: bool,
    line_count: usize,
) -> Result<(), CoreError> {
    if state != ReservationState::Active {
        return Err(CoreError::InvalidState("The reservation is not active".into()));
    }
    if converted {
        return Err(already_generated());
    }
    if line_count == 0 {
        return Err(CoreError::InvalidState(
            "The reservation has no materials".into(),
        ));
    }
    Ok(())
}

/// How one material's hold changes when a manual outbound movement takes over
/// a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldChange {
    pub material_code: String,
    /// Units the reservation was holding (zero if it did not cover the material).
    pub held: Quantity,
    /// Units the outbound movement needs (zero if it leaves the material out).
    pub wanted: Quantity,
}

/// Pair the reservation's holds with the outbound lines, ordered by material
/// code. Each change is meant for [`StockLevel::rehold`](crate::stock::StockLevel::rehold).
pub fn hold_changes(held: &BTreeMap<String, Quantity>, lines: &[MovementLine]) -> Vec<HoldChange> {
    let mut changes: BTreeMap<&str, (Quantity, Quantity)> = held
        .iter()
        .map(|(code, quantity)| (code.as_str(), (*quantity, 0)))
        .collect();
    for line in lines {
        changes.entry(line.material_code.as_str()).or_insert((0, 0)).1 += line.quantity;
    }
    changes
        .into_iter()
        .map(|(code, (held, wanted))| HoldChange {
            material_code: code.to_string(),
            held,
            wanted,
        })
        .collect()
}

/// Validate a manual state change.
///
/// Only active reservations move. Cancelling requires that no outbound movement
/// was generated and releases the holds; finishing requires the conversion.
pub fn transition(
    from: ReservationState,
    to: ReservationState,
    converted: bool,
) -> Result<StateChange, CoreError> {
    if from != ReservationState::Active {
        return Err(CoreError::InvalidState(
            "Only active reservations can change state".into(),
        ));
    }
    match to {
        ReservationState::Active => Err(CoreError::InvalidState(
            "The reservation is already active".into(),
        )),
        ReservationState::Cancelled if converted => Err(CoreError::InvalidState(
            "A converted reservation cannot be cancelled".into(),
        )),
        ReservationState::Cancelled => Ok(StateChange {
            next: to,
            release_holds: true,
        }),
        ReservationState::Finished if !converted => Err(CoreError::InvalidState(
            "Generate the outbound movement before finishing the reservation".into(),
        )),
        ReservationState::Finished => Ok(StateChange {
            next: to,
            release_holds: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_known_codes() {
        assert_eq!(ReservationState::parse("ACT").unwrap(), ReservationState::Active);
        assert_matches!(ReservationState::parse("ZZZ"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn new_reservations_start_active() {
        assert_eq!(initial_state(None).unwrap(), ReservationState::Active);
        assert_eq!(initial_state(Some("ACT")).unwrap(), ReservationState::Active);
        assert_matches!(
            initial_state(Some("FIN")),
            Err(CoreError::Validation(msg)) if msg.contains("FIN")
        );
        assert_matches!(initial_state(Some("CAN")), Err(CoreError::Validation(_)));
        assert_matches!(initial_state(Some("ZZZ")), Err(CoreError::Validation(_)));
    }

    #[test]
    fn lines_frozen_after_conversion() {
        assert!(ensure_lines_mutable(ReservationState::Active, false).is_ok());
        assert_matches!(
            ensure_lines_mutable(ReservationState::Active, true),
            Err(CoreError::InvalidState(_))
        );
        assert_matches!(
            ensure_lines_mutable(ReservationState::Cancelled, false),
            Err(CoreError::InvalidState(_))
        );
    }

    #[test]
    fn zero_quantity_rejected() {
        assert!(ensure_quantity(0).is_err());
        assert!(ensure_quantity(-3).is_err());
        assert!(ensure_quantity(1).is_ok());
    }

    #[test]
    fn conversion_preconditions() {
        assert!(ensure_convertible(ReservationState::Active, false, 2).is_ok());
        assert_matches!(
            ensure_convertible(ReservationState::Active, true, 2),
            Err(CoreError::InvalidState(msg)) if msg.contains("already generated")
        );
        assert_matches!(
            ensure_convertible(ReservationState::Active, false, 0),
            Err(CoreError::InvalidState(msg)) if msg.contains("no materials")
        );
        assert_matches!(
            ensure_convertible(ReservationState::Cancelled, false, 1),
            Err(CoreError::InvalidState(msg)) if msg.contains("not active")
        );
    }

    #[test]
    fn hold_changes_cover_both_sides_in_code_order() {
        let held = BTreeMap::from([("MAT-2".to_string(), 5), ("MAT-3".to_string(), 2)]);
        let lines = vec![
            MovementLine {
                material_code: "MAT-2".into(),
                quantity: 3,
                notes: None,
            },
            MovementLine {
                material_code: "MAT-1".into(),
                quantity: 4,
                notes: None,
            },
        ];
        let changes = hold_changes(&held, &lines);
        let summary: Vec<_> = changes
            .iter()
            .map(|c| (c.material_code.as_str(), c.held, c.wanted))
            .collect();
        assert_eq!(summary, [("MAT-1", 0, 4), ("MAT-2", 5, 3), ("MAT-3", 2, 0)]);
    }

    #[test]
    fn cancel_releases_holds() {
        let change =
            transition(ReservationState::Active, ReservationState::Cancelled, false).unwrap();
        assert!(change.release_holds);
        assert!(transition(ReservationState::Active, ReservationState::Cancelled, true).is_err());
    }

    #[test]
    fn finish_requires_conversion() {
        assert!(transition(ReservationState::Active, ReservationState::Finished, false).is_err());
        let change =
            transition(ReservationState::Active, ReservationState::Finished, true).unwrap();
        assert!(!change.release_holds);
    }

    #[test]
    fn only_active_reservations_move() {
        assert!(
            transition(ReservationState::Cancelled, ReservationState::Finished, true).is_err()
        );
        assert!(transition(ReservationState::Active, ReservationState::Active, false).is_err());
    }
}
