//! Status derivation for the localization workflow.
//!
//! # Architecture
//!
//! - `record`: Per-language lifecycle records and the collection holding them
//! - `predicates`: Aggregate boolean facts over a collection
//! - `classifier`: Ordered rule table mapping facts to an [`ActionState`]
//! - `transitions`: Submit, cancel and start-over operations
//!
//! Everything here is pure. Persistence and timers live in `session` and
//! `poller`.
//!
//! # Example
//!
//! ```rust,ignore
//! use phrase_sidebar::lifecycle::{classify, submit_selected, ActionState};
//!
//! let next = submit_selected(&collection, &selected, now);
//! assert_eq!(classify(&next, &selected), ActionState::Cancel);
//! ```

mod classifier;
pub mod predicates;
mod record;
mod transitions;

pub use classifier::{classify, classify_facts, matching_rules, ActionState, Facts, Rule, RULES};
pub use record::{LanguageCollection, LanguageRecord, Phase, SelectedLanguages, Timestamp};
pub use transitions::{
    cancel_and_start_over, cancel_selected, derive_selection, is_submittable, start_over,
    submit_selected,
};
