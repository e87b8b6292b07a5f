//! Exclusivity rule between the regular cart and the preorder slot.
//!
//! The rule is pure: it looks at what the basket currently holds and what
//! kind of add was requested, and says whether the add may go ahead or
//! which conflict prompt to show. Resolving the prompt is the user's call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the basket holds. Holding both kinds is not a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasketState {
    Empty,
    RegularOnly,
    PreorderOnly,
}

/// Kind of item an add request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddKind {
    Regular,
    Preorder,
}

/// Why an add was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Regular add while a preorder is held.
    PreorderBlocksRegular,
    /// Preorder add while the regular cart has items.
    RegularBlocksPreorder,
    /// Preorder add while another preorder is held.
    PreorderReplace,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictKind::PreorderBlocksRegular => "preorder_blocks_regular",
            ConflictKind::RegularBlocksPreorder => "regular_blocks_preorder",
            ConflictKind::PreorderReplace => "preorder_replace",
        };
        f.write_str(s)
    }
}

/// Result of evaluating an add request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Conflict(ConflictKind),
}

/// A choice offered by a conflict prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Empty the blocking store, then perform the held add.
    ClearAndProceed,
    /// Drop the held add and go finish the existing basket.
    GoToCheckout,
}

/// Prompt shown when an add is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPrompt {
    pub kind: ConflictKind,
}

impl ConflictPrompt {
    pub fn new(kind: ConflictKind) -> Self {
        Self { kind }
    }

    /// The two options, in display order. There is no merge option.
    pub fn resolutions(&self) -> [Resolution; 2] {
        [Resolution::ClearAndProceed, Resolution::GoToCheckout]
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            ConflictKind::PreorderBlocksRegular => "You have a preorder in progress",
            ConflictKind::RegularBlocksPreorder => "Your cart already has items",
            ConflictKind::PreorderReplace => "You already have a preorder",
        }
    }

    /// Label for a resolution button.
    pub fn label(&self, resolution: Resolution) -> &'static str {
        match (self.kind, resolution) {
            (ConflictKind::PreorderBlocksRegular, Resolution::ClearAndProceed) => {
                "Remove preorder and add to cart"
            }
            (ConflictKind::RegularBlocksPreorder, Resolution::ClearAndProceed) => {
                "Clear cart and preorder"
            }
            (ConflictKind::PreorderReplace, Resolution::ClearAndProceed) => "Replace preorder",
            (ConflictKind::RegularBlocksPreorder, Resolution::GoToCheckout) => {
                "Checkout cart first"
            }
            (_, Resolution::GoToCheckout) => "Complete preorder",
        }
    }
}

impl BasketState {
    /// Evaluate an add of `kind` against this state.
    pub fn evaluate(self, kind: AddKind) -> GateDecision {
        evaluate(self, kind)
    }
}

/// Decide whether an add may proceed.
pub fn evaluate(state: BasketState, kind: AddKind) -> GateDecision {
    match (state, kind) {
        (BasketState::PreorderOnly, AddKind::Regular) => {
            GateDecision::Conflict(ConflictKind::PreorderBlocksRegular)
        }
        (BasketState::RegularOnly, AddKind::Preorder) => {
            GateDecision::Conflict(ConflictKind::RegularBlocksPreorder)
        }
        (BasketState::PreorderOnly, AddKind::Preorder) => {
            GateDecision::Conflict(ConflictKind::PreorderReplace)
        }
        (BasketState::Empty, _) | (BasketState::RegularOnly, AddKind::Regular) => {
            GateDecision::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use AddKind::*;
        use BasketState::*;

        assert_eq!(evaluate(Empty, Regular), GateDecision::Proceed);
        assert_eq!(evaluate(Empty, Preorder), GateDecision::Proceed);
        assert_eq!(evaluate(RegularOnly, Regular), GateDecision::Proceed);
        assert_eq!(
            evaluate(RegularOnly, Preorder),
            GateDecision::Conflict(ConflictKind::RegularBlocksPreorder)
        );
        assert_eq!(
            evaluate(PreorderOnly, Regular),
            GateDecision::Conflict(ConflictKind::PreorderBlocksRegular)
        );
        assert_eq!(
            evaluate(PreorderOnly, Preorder),
            GateDecision::Conflict(ConflictKind::PreorderReplace)
        );
    }

    #[test]
    fn test_prompt_has_exactly_two_options() {
        let prompt = ConflictPrompt::new(ConflictKind::PreorderReplace);
        assert_eq!(
            prompt.resolutions(),
            [Resolution::ClearAndProceed, Resolution::GoToCheckout]
        );
        assert_eq!(prompt.label(Resolution::ClearAndProceed), "Replace preorder");
    }

    #[test]
    fn test_conflict_kind_display() {
        assert_eq!(
            ConflictKind::RegularBlocksPreorder.to_string(),
            "regular_blocks_preorder"
        );
    }
}
