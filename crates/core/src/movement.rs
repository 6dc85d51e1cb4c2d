//! Inbound ("entrada") and outbound ("salida") movement rules.
//!
//! A movement is a header plus one or more material lines, created in a single
//! transaction in state [`MovementState::Pending`] and later approved.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Quantity;

/// Which way goods flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "ENTRADA")]
    Inbound,
    #[serde(rename = "SALIDA")]
    Outbound,
}

impl Direction {
    /// Code stored in history rows and accepted by the `tipo` filter.
    pub fn code(self) -> &'static str {
        match self {
            Direction::Inbound => "ENTRADA",
            Direction::Outbound => "SALIDA",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ENTRADA" => Some(Direction::Inbound),
            "SALIDA" => Some(Direction::Outbound),
            _ => None,
        }
    }

    /// Entity name used in not-found errors.
    pub fn entity(self) -> &'static str {
        match self {
            Direction::Inbound => "Entrada",
            Direction::Outbound => "Salida",
        }
    }
}

/// Movement approval state. The only transition is `PEN -> APR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementState {
    Pending,
    Approved,
}

pub const STATE_PENDING: &str = "PEN";
pub const STATE_APPROVED: &str = "APR";

impl MovementState {
    pub fn code(self) -> &'static str {
        match self {
            MovementState::Pending => STATE_PENDING,
            MovementState::Approved => STATE_APPROVED,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            STATE_PENDING => Some(MovementState::Pending),
            STATE_APPROVED => Some(MovementState::Approved),
            _ => None,
        }
    }

    /// Validate the approval transition from `self`.
    pub fn approve(self) -> Result<MovementState, CoreError> {
        match self {
            MovementState::Pending => Ok(MovementState::Approved),
            MovementState::Approved => Err(not_pending()),
        }
    }
}

/// Error returned when an approval targets a movement that is not pending.
pub fn not_pending() -> CoreError {
    CoreError::InvalidState("Only pending movements can be approved".into())
}

/// A line as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineDraft {
    #[serde(rename = "codigoMaterial")]
    pub material_code: Option<String>,
    #[serde(rename = "cantidad")]
    pub quantity: Option<Quantity>,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
}

/// A validated movement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementLine {
    pub material_code: String,
    pub quantity: Quantity,
    pub notes: Option<String>,
}

/// Validate every submitted line, rejecting the whole batch on the first bad one.
///
/// Lines with a blank code, a missing or non-positive quantity, or a material
/// code already seen earlier in the batch are reported with their index.
/// Valid lines come back ordered by material code, which is also the order in
/// which stores lock the material rows.
pub fn validate_lines(drafts: Vec<LineDraft>) -> Result<Vec<MovementLine>, CoreError> {
    if drafts.is_empty() {
        return Err(CoreError::Validation(
            "At least one material line is required".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut lines = Vec::with_capacity(drafts.len());

    for (index, draft) in drafts.into_iter().enumerate() {
        let code = draft
            .material_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                CoreError::Validation(format!("Line {index}: codigoMaterial is required"))
            })?;

        let quantity = match draft.quantity {
            Some(q) if q > 0 => q,
            Some(_) => {
                return Err(CoreError::Validation(format!(
                    "Line {index}: cantidad must be greater than zero"
                )))
            }
            None => {
                return Err(CoreError::Validation(format!(
                    "Line {index}: cantidad is required"
                )))
            }
        };

        if !seen.insert(code.clone()) {
            return Err(CoreError::Validation(format!(
                "Line {index}: material {code} appears more than once"
            )));
        }

        lines.push(MovementLine {
            material_code: code,
            quantity,
            notes: draft.notes.filter(|n| !n.trim().is_empty()),
        });
    }

    lines.sort_by(|a, b| a.material_code.cmp(&b.material_code));
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn draft(code: &str, quantity: Quantity) -> LineDraft {
        LineDraft {
            material_code: Some(code.to_string()),
            quantity: Some(quantity),
            notes: None,
        }
    }

    #[test]
    fn approve_pending_moves_to_approved() {
        assert_eq!(
            MovementState::Pending.approve().unwrap(),
            MovementState::Approved
        );
    }

    #[test]
    fn approve_approved_is_invalid_state() {
        let err = MovementState::Approved.approve().unwrap_err();
        assert_matches!(err, CoreError::InvalidState(msg) if msg.contains("pending"));
    }

    #[test]
    fn state_codes_round_trip() {
        assert_eq!(MovementState::from_code("PEN"), Some(MovementState::Pending));
        assert_eq!(MovementState::from_code("APR"), Some(MovementState::Approved));
        assert_eq!(MovementState::from_code("XXX"), None);
        assert_eq!(Direction::from_code("SALIDA"), Some(Direction::Outbound));
    }

    #[test]
    fn valid_lines_pass_through() {
        let lines = validate_lines(vec![draft("MAT-1", 5), draft(" MAT-2 ", 1)]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].material_code, "MAT-2");
    }

    #[test]
    fn lines_come_back_in_material_code_order() {
        let lines =
            validate_lines(vec![draft("MAT-9", 1), draft("MAT-1", 2), draft("MAT-5", 3)]).unwrap();
        let codes: Vec<_> = lines.iter().map(|l| l.material_code.as_str()).collect();
        assert_eq!(codes, ["MAT-1", "MAT-5", "MAT-9"]);
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn line_draft_serializes_with_wire_names() {
        let value = serde_json::to_value(draft("MAT-1", 4)).unwrap();
        assert_eq!(value["codigoMaterial"], "MAT-1");
        assert_eq!(value["cantidad"], 4);
    }

    #[test]
    fn empty_batch_rejected() {
        assert_matches!(validate_lines(vec![]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn malformed_line_rejects_batch_with_index() {
        let err = validate_lines(vec![draft("MAT-1", 5), draft("", 2)]).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.starts_with("Line 1"));

        let err = validate_lines(vec![draft("MAT-1", 0)]).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("greater than zero"));

        let missing_qty = LineDraft {
            material_code: Some("MAT-1".into()),
            quantity: None,
            notes: None,
        };
        assert_matches!(
            validate_lines(vec![missing_qty]),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn duplicate_material_rejected() {
        let err = validate_lines(vec![draft("MAT-1", 1), draft("MAT-1", 2)]).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("more than once"));
    }
}
