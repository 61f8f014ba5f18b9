//! Action-state classifier.
//!
//! The primary button's state is derived from an ordered rule table. Every
//! rule is evaluated and each matching rule overwrites the result of the ones
//! before it, so the last matching rule wins. Rules 1 and 2 lay down the
//! Submit/Cancel baseline; rules 3 to 13 may override it.

use super::predicates::{
    all_completed, any_cancelled, any_completed, any_processing, any_submitted, count_submitted,
    no_unsubmitted,
};
use super::record::{LanguageCollection, SelectedLanguages};
use serde::Serialize;
use tracing::debug;

/// The single action the primary button offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ActionState {
    #[default]
    Submit,
    Cancel,
    StartOver,
    CancelAndStartOver,
    /// No action button is shown.
    Removed,
}

impl ActionState {
    /// Whether the button should not be rendered at all.
    pub fn is_removed(self) -> bool {
        self == ActionState::Removed
    }
}

/// Predicate values a rule guard may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facts {
    pub no_unsubmitted: bool,
    pub any_submitted: bool,
    pub any_processing: bool,
    pub any_completed: bool,
    pub any_cancelled: bool,
    pub all_completed: bool,
    pub selected_count: usize,
    pub submitted_count: usize,
}

impl Facts {
    pub fn gather(collection: &LanguageCollection, selected: &SelectedLanguages) -> Self {
        Self {
            no_unsubmitted: no_unsubmitted(collection),
            any_submitted: any_submitted(collection),
            any_processing: any_processing(collection),
            any_completed: any_completed(collection),
            any_cancelled: any_cancelled(collection),
            all_completed: all_completed(collection),
            selected_count: selected.len(),
            submitted_count: count_submitted(collection),
        }
    }
}

/// One row of the rule table.
pub struct Rule {
    /// 1-based position in the table
    pub order: u8,
    pub guard: fn(&Facts) -> bool,
    pub result: ActionState,
}

/// The rule table, in evaluation order. Do not reorder or merge rows.
pub static RULES: [Rule; 13] = [
    // Newly selected languages on top of submitted ones bring Submit back
    Rule {
        order: 1,
        guard: |f| f.any_submitted && f.selected_count > f.submitted_count,
        result: ActionState::Submit,
    },
    Rule {
        order: 2,
        guard: |f| f.any_submitted && f.selected_count <= f.submitted_count,
        result: ActionState::Cancel,
    },
    // ---------- Submit ----------
    Rule {
        order: 3,
        guard: |f| f.no_unsubmitted && f.any_completed && f.any_processing && f.any_cancelled,
        result: ActionState::Submit,
    },
    Rule {
        order: 4,
        guard: |f| !f.no_unsubmitted && f.any_processing && f.any_completed && !f.any_cancelled,
        result: ActionState::Submit,
    },
    Rule {
        order: 5,
        guard: |f| !f.no_unsubmitted && f.any_processing && !f.any_completed && !f.any_cancelled,
        result: ActionState::Submit,
    },
    // ---------- Start over ----------
    Rule {
        order: 6,
        guard: |f| f.no_unsubmitted && f.any_completed && !f.any_processing && f.any_cancelled,
        result: ActionState::StartOver,
    },
    Rule {
        order: 7,
        guard: |f| !f.no_unsubmitted && !f.any_processing && f.any_completed && !f.any_cancelled,
        result: ActionState::StartOver,
    },
    Rule {
        order: 8,
        guard: |f| !f.no_unsubmitted && f.any_completed && !f.any_processing && f.any_cancelled,
        result: ActionState::StartOver,
    },
    Rule {
        order: 9,
        guard: |f| f.no_unsubmitted && !f.any_processing && f.all_completed && !f.any_cancelled,
        result: ActionState::StartOver,
    },
    // ---------- Cancel and start over ----------
    Rule {
        order: 10,
        guard: |f| {
            (f.no_unsubmitted && f.any_completed && !f.any_processing && !f.any_cancelled)
                && !f.all_completed
        },
        result: ActionState::CancelAndStartOver,
    },
    Rule {
        order: 11,
        guard: |f| {
            !f.no_unsubmitted
                && f.any_submitted
                && !f.any_processing
                && f.any_completed
                && !f.any_cancelled
        },
        result: ActionState::CancelAndStartOver,
    },
    // ---------- Removed ----------
    Rule {
        order: 12,
        guard: |f| f.no_unsubmitted && f.any_processing && !f.any_completed && !f.any_cancelled,
        result: ActionState::Removed,
    },
    Rule {
        order: 13,
        guard: |f| f.no_unsubmitted && f.any_completed && f.any_processing && !f.any_cancelled,
        result: ActionState::Removed,
    },
];

/// Positions of every rule whose guard holds, in evaluation order.
pub fn matching_rules(facts: &Facts) -> Vec<u8> {
    RULES
        .iter()
        .filter(|rule| (rule.guard)(facts))
        .map(|rule| rule.order)
        .collect()
}

/// Evaluate the rule table against precomputed facts.
pub fn classify_facts(facts: &Facts) -> ActionState {
    let mut state = ActionState::default();

    for rule in RULES.iter() {
        if (rule.guard)(facts) {
            state = rule.result;
        }
    }

    state
}

/// Derive the primary action for a collection and the current selection.
pub fn classify(collection: &LanguageCollection, selected: &SelectedLanguages) -> ActionState {
    let facts = Facts::gather(collection, selected);
    let state = classify_facts(&facts);

    debug!(
        "Classified {} languages ({} selected) as {:?}, matched rules {:?}",
        collection.len(),
        selected.len(),
        state,
        matching_rules(&facts)
    );

    state
}
