//! Order status shared by lab and imaging requests.

use crate::error::{ClinicalError, ClinicalResult};
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a lab or imaging request.
///
/// Allowed moves: `draft -> requested`, `draft -> ordered`, `requested -> ordered`,
/// `ordered -> done`. Everything else is rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    #[default]
    Draft,
    Requested,
    Ordered,
    Done,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Draft => "draft",
            OrderState::Requested => "requested",
            OrderState::Ordered => "ordered",
            OrderState::Done => "done",
        }
    }

    pub fn can_transition_to(self, next: OrderState) -> bool {
        matches!(
            (self, next),
            (OrderState::Draft, OrderState::Requested)
                | (OrderState::Draft, OrderState::Ordered)
                | (OrderState::Requested, OrderState::Ordered)
                | (OrderState::Ordered, OrderState::Done)
        )
    }

    /// Returns `next` if the move is allowed for record `id` of `model`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::IllegalStateTransition` otherwise.
    pub fn transition(
        self,
        next: OrderState,
        model: &'static str,
        id: &RecordId,
    ) -> ClinicalResult<OrderState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ClinicalError::IllegalStateTransition {
                model,
                id: id.clone(),
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderState; 4] = [
        OrderState::Draft,
        OrderState::Requested,
        OrderState::Ordered,
        OrderState::Done,
    ];

    #[test]
    fn test_allowed_transitions() {
        let allowed: Vec<_> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();
        assert_eq!(
            allowed,
            vec![
                (OrderState::Draft, OrderState::Requested),
                (OrderState::Draft, OrderState::Ordered),
                (OrderState::Requested, OrderState::Ordered),
                (OrderState::Ordered, OrderState::Done),
            ]
        );
    }

    #[test]
    fn test_transition_reports_both_states() {
        let id = RecordId::new();
        let err = OrderState::Done
            .transition(OrderState::Ordered, "lab.request", &id)
            .unwrap_err();
        match err {
            ClinicalError::IllegalStateTransition { model, from, to, .. } => {
                assert_eq!(model, "lab.request");
                assert_eq!(from, OrderState::Done);
                assert_eq!(to, OrderState::Ordered);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(OrderState::Requested).unwrap(),
            "requested"
        );
        assert_eq!(OrderState::default(), OrderState::Draft);
    }
}
