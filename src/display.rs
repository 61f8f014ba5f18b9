//! User-facing copy and the view model handed to the rendering layer.
//!
//! Nothing here decides workflow state; it only describes state that the
//! lifecycle module has already derived.

use crate::lifecycle::predicates::{any_completed, any_processing, any_submitted, is_acp_engaged};
use crate::lifecycle::{ActionState, LanguageCollection, LanguageRecord, Phase};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// All user-facing strings of the sidebar.
#[derive(Debug, Clone)]
pub struct SidebarStrings {
    // ==================== Headings ====================
    pub heading: &'static str,

    // ==================== Information Copy ====================
    /// Shown while no language is submitted, processing or completed
    pub info_select: &'static str,

    /// Shown while languages wait to be picked up
    pub info_submitted: &'static str,

    /// Shown while a localization job is running
    pub info_in_progress: &'static str,

    /// Shown once results are available
    pub info_completed: &'static str,
    pub info_start_over_hint: &'static str,

    /// Shown below the list while nothing is engaged
    pub engagement_note: &'static str,

    /// Shown when the stored document changed underneath the session
    pub stale_notice: &'static str,

    // ==================== Selection Links ====================
    pub select_all: &'static str,
    pub select_none: &'static str,

    // ==================== Action Labels ====================
    pub action_submit: &'static str,
    pub action_cancel: &'static str,
    pub action_start_over: &'static str,
    pub action_cancel_and_start_over: &'static str,

    // ==================== Badges ====================
    pub badge_completed: &'static str,
    pub badge_in_progress: &'static str,
    pub badge_submitted: &'static str,
    pub badge_cancelled: &'static str,

    /// Prefix of the relative "last updated" text
    pub updated_prefix: &'static str,
}

pub const STRINGS: SidebarStrings = SidebarStrings {
    heading: "Localize content",

    info_select: "Please select the target languages to localize this content into:",
    info_submitted: "The content has been submitted for localization, and you can follow the progress below.",
    info_in_progress: "The content is currently being localized, and you can follow the progress below.",
    info_completed: "Localization completed. You can now view the localized content here in Contentful.",
    info_start_over_hint: "Not satisfied with the results? Start over.",
    engagement_note: "Note: Once a Phrase translation project has been created with the submitted languages, they cannot be cancelled within the app.",
    stale_notice: "This entry's localization data was changed elsewhere. Please refresh to see the latest state.",

    select_all: "Select all",
    select_none: "Select none",

    action_submit: "Submit",
    action_cancel: "Cancel",
    action_start_over: "Start Over",
    action_cancel_and_start_over: "Cancel and Start Over",

    badge_completed: "Completed",
    badge_in_progress: "In Progress",
    badge_submitted: "Submitted",
    badge_cancelled: "Cancelled",

    updated_prefix: "Updated",
};

// ==================== Action Button ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    Primary,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub state: ActionState,
    pub label: &'static str,
    pub variant: ButtonVariant,
    pub enabled: bool,
}

/// Button label for an action state. `None` when no button is shown.
pub fn action_label(state: ActionState) -> Option<&'static str> {
    match state {
        ActionState::Submit => Some(STRINGS.action_submit),
        ActionState::Cancel => Some(STRINGS.action_cancel),
        ActionState::StartOver => Some(STRINGS.action_start_over),
        ActionState::CancelAndStartOver => Some(STRINGS.action_cancel_and_start_over),
        ActionState::Removed => None,
    }
}

/// Cancelling actions are styled as dangerous.
pub fn action_variant(state: ActionState) -> ButtonVariant {
    match state {
        ActionState::Cancel | ActionState::CancelAndStartOver => ButtonVariant::Negative,
        _ => ButtonVariant::Primary,
    }
}

pub fn action_button(state: ActionState, enabled: bool) -> Option<ActionButton> {
    action_label(state).map(|label| ActionButton {
        state,
        label,
        variant: action_variant(state),
        enabled,
    })
}

// ==================== Badges ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Positive,
    Warning,
    Secondary,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: &'static str,
    pub variant: BadgeVariant,
}

/// Badge for a record: Completed, then In Progress, then Submitted, then
/// Cancelled. Unsubmitted records get none.
pub fn badge(record: &LanguageRecord) -> Option<Badge> {
    let (text, variant) = match record.phase() {
        Phase::Completed => (STRINGS.badge_completed, BadgeVariant::Positive),
        Phase::Processing => (STRINGS.badge_in_progress, BadgeVariant::Warning),
        Phase::Submitted => (STRINGS.badge_submitted, BadgeVariant::Secondary),
        Phase::Cancelled => (STRINGS.badge_cancelled, BadgeVariant::Negative),
        Phase::Unsubmitted => return None,
    };
    Some(Badge { text, variant })
}

// ==================== Relative Time ====================

/// "Updated 5 minutes ago" for the record's last-updated timestamp.
pub fn updated_text(record: &LanguageRecord, now: DateTime<Utc>) -> Option<String> {
    let at = record.last_updated()?;
    let at = Utc.timestamp_opt(at, 0).single()?;
    Some(format!("{} {}", STRINGS.updated_prefix, from_now(at, now)))
}

/// Humanised distance between `at` and `now`, e.g. "a minute ago" or "in 3 days".
pub fn from_now(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(at).num_seconds();
    let phrase = humanize(delta.unsigned_abs());

    if delta >= 0 {
        format!("{} ago", phrase)
    } else {
        format!("in {}", phrase)
    }
}

fn humanize(seconds: u64) -> String {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = 60.0 * MINUTE;
    const DAY: f64 = 24.0 * HOUR;
    // Gregorian averages over a 400-year cycle
    const DAYS_PER_MONTH: f64 = 146_097.0 / 4_800.0;
    const DAYS_PER_YEAR: f64 = 146_097.0 / 400.0;

    let secs = seconds as f64;
    let minutes = (secs / MINUTE).round();
    let hours = (secs / HOUR).round();
    let days = (secs / DAY).round();
    let months = (secs / (DAY * DAYS_PER_MONTH)).round();
    let years = (secs / (DAY * DAYS_PER_YEAR)).round();

    if secs < 45.0 {
        "a few seconds".to_string()
    } else if minutes < 2.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes)
    } else if hours < 2.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours)
    } else if days < 2.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days)
    } else if months < 2.0 {
        "a month".to_string()
    } else if months < 11.0 {
        format!("{} months", months)
    } else if years < 2.0 {
        "a year".to_string()
    } else {
        format!("{} years", years)
    }
}

// ==================== Information Copy ====================

/// Paragraphs shown above the language list. First matching case wins.
pub fn info_messages(collection: &LanguageCollection) -> Vec<&'static str> {
    let submitted = any_submitted(collection);
    let processing = any_processing(collection);
    let completed = any_completed(collection);

    if !is_acp_engaged(collection) {
        vec![STRINGS.info_select]
    } else if submitted && !processing && !completed {
        vec![STRINGS.info_submitted]
    } else if processing || (submitted && completed) {
        vec![STRINGS.info_in_progress]
    } else if completed {
        vec![STRINGS.info_completed, STRINGS.info_start_over_hint]
    } else {
        Vec::new()
    }
}

// ==================== View Model ====================

/// One language row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRow {
    pub code: String,
    pub name: String,
    pub checked: bool,
    pub disabled: bool,
    pub badge: Option<Badge>,
    pub updated: Option<String>,
}

/// Everything the rendering layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarView {
    pub heading: &'static str,
    pub info: Vec<&'static str>,
    /// "Select all" / "Select none", only while nothing is engaged
    pub selection_link: Option<&'static str>,
    pub rows: Vec<LanguageRow>,
    pub note: Option<&'static str>,
    pub action: Option<ActionButton>,
    pub stale_notice: Option<&'static str>,
}

impl SidebarView {
    /// Plain-text rendering for terminals and logs.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("== {} ==\n", self.heading));
        if let Some(notice) = self.stale_notice {
            out.push_str(&format!("!! {}\n", notice));
        }
        for line in &self.info {
            out.push_str(line);
            out.push('\n');
        }
        if let Some(link) = self.selection_link {
            out.push_str(&format!("[{}]\n", link));
        }

        for row in &self.rows {
            let mark = match (row.checked, row.disabled) {
                (true, true) => "[#]",
                (true, false) => "[x]",
                (false, _) => "[ ]",
            };
            out.push_str(&format!("{} {} ({})", mark, row.name, row.code));
            if let Some(badge) = row.badge {
                out.push_str(&format!("  <{}>", badge.text));
            }
            if let Some(updated) = &row.updated {
                out.push_str(&format!("  {}", updated));
            }
            out.push('\n');
        }

        if let Some(note) = self.note {
            out.push_str(note);
            out.push('\n');
        }
        match &self.action {
            Some(button) if button.enabled => out.push_str(&format!("<< {} >>\n", button.label)),
            Some(button) => out.push_str(&format!("<< {} (disabled) >>\n", button.label)),
            None => {}
        }

        out
    }
}
