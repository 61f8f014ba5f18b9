//! Locale catalog: the host's locale list for the current session.
//!
//! The catalog is built once when a session opens and is passed explicitly to
//! whatever needs it. There is no process-wide registry.

use anyhow::{bail, Result};

/// A locale as enumerated by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// Host locale code (e.g., "en-US", "de")
    pub code: String,

    /// Display name shown next to the checkbox (e.g., "German")
    pub name: String,
}

/// Host locales in host order, plus the designated default locale.
///
/// The default locale is the source of the content and is never a
/// localization target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleCatalog {
    locales: Vec<Locale>,
    default_code: String,
}

impl LocaleCatalog {
    /// Create a catalog from `(code, name)` pairs.
    ///
    /// # Arguments
    /// * `names` - Locale codes and display names, in host order
    /// * `default_code` - Code of the default locale
    ///
    /// # Returns
    /// * `Err` if a code is empty or duplicated, or the default code is not listed
    pub fn new(names: Vec<(String, String)>, default_code: &str) -> Result<Self> {
        let mut locales: Vec<Locale> = Vec::with_capacity(names.len());

        for (code, name) in names {
            if code.is_empty() {
                bail!("Locale code must not be empty");
            }
            if locales.iter().any(|l| l.code == code) {
                bail!("Duplicate locale code: '{}'", code);
            }
            locales.push(Locale { code, name });
        }

        if !locales.iter().any(|l| l.code == default_code) {
            bail!("Default locale '{}' is not among the host locales", default_code);
        }

        Ok(Self {
            locales,
            default_code: default_code.to_string(),
        })
    }

    /// Code of the default (source) locale.
    pub fn default_code(&self) -> &str {
        &self.default_code
    }

    /// Localization targets: every host locale except the default one.
    pub fn targets(&self) -> impl Iterator<Item = &Locale> {
        self.locales
            .iter()
            .filter(move |l| l.code != self.default_code)
    }
}
