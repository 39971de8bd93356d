use std::fmt;

use serde::{Deserialize, Serialize};

/// Regional dictionary flavors the importer knows how to provision.
///
/// The set is closed on purpose: every variant maps to a vetted directory in
/// the upstream dictionary repository, and the pipeline refuses identifiers
/// outside this list before any network traffic happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Variant {
    EnUs,
    EnGb,
    DeDe,
    FrFr,
    EsEs,
    ItIt,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::EnUs,
        Variant::EnGb,
        Variant::DeDe,
        Variant::FrFr,
        Variant::EsEs,
        Variant::ItIt,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::EnUs => "en-US",
            Variant::EnGb => "en-GB",
            Variant::DeDe => "de-DE",
            Variant::FrFr => "fr-FR",
            Variant::EsEs => "es-ES",
            Variant::ItIt => "it-IT",
        }
    }

    /// Directory name of this variant inside the upstream repository.
    #[must_use]
    pub fn upstream_dir(self) -> &'static str {
        match self {
            Variant::EnUs => "en",
            Variant::EnGb => "en-GB",
            Variant::DeDe => "de",
            Variant::FrFr => "fr",
            Variant::EsEs => "es",
            Variant::ItIt => "it",
        }
    }

    /// Human-readable label used for registry entries.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Variant::EnUs => "English (US)",
            Variant::EnGb => "English (UK)",
            Variant::DeDe => "Deutsch",
            Variant::FrFr => "Français",
            Variant::EsEs => "Español",
            Variant::ItIt => "Italiano",
        }
    }

    /// Parses a variant identifier, rejecting anything outside the closed set.
    ///
    /// # Errors
    ///
    /// Returns the offending input so callers can report it verbatim.
    pub fn parse(input: &str) -> Result<Self, String> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str() == input)
            .ok_or_else(|| input.to_string())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Variant {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Variant::parse(&value)
    }
}

impl From<Variant> for String {
    fn from(value: Variant) -> Self {
        value.as_str().to_string()
    }
}
