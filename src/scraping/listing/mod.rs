//! Field extraction engine.
//!
//! Every field group is an ordered chain of strategies over a [`Scope`]
//! (one listing card, or the whole document of a detail page). The
//! structured-data normalizer seeds the record first; each chain then only
//! runs for columns that are still empty, so a semantic selector match beats
//! a free-text pattern and neither overrides structured data.

mod address;
mod commercial;
mod contact;
mod detail;
mod jsonld;
mod media;
mod page;
mod patterns;
mod registry;
mod social;

pub use address::{compose_address, split_address, AddressParts};
pub use jsonld::{business_entities, faq_services, normalize, structured_blocks};
pub use social::Platform;

use crate::core::config::SiteProfile;
use crate::scraping::dom::inner_text;
use scraper::ElementRef;

/// Whether `text` shows a French phone number.
pub fn has_phone(text: &str) -> bool {
    patterns::phone().is_match(text)
}

/// The element an extraction pass reads from.
pub(crate) struct Scope<'a> {
    pub element: ElementRef<'a>,
    /// Rendered text, line structure kept.
    pub text: String,
    pub markup: String,
    pub profile: &'a SiteProfile,
}

impl<'a> Scope<'a> {
    pub fn new(element: ElementRef<'a>, profile: &'a SiteProfile) -> Self {
        Self {
            text: inner_text(element),
            markup: element.inner_html(),
            element,
            profile,
        }
    }

    /// Put `lead` ahead of the rendered text so its matches are found first.
    pub fn with_leading_text(mut self, lead: Option<String>) -> Self {
        if let Some(lead) = lead.filter(|l| !l.trim().is_empty()) {
            self.text = format!("{lead}\n{}", self.text);
        }
        self
    }
}

/// One way of deriving a value from a scope.
pub(crate) type Strategy<T> = fn(&Scope<'_>) -> Option<T>;

/// Result of the first strategy that yields a value.
pub(crate) fn first_hit<T>(scope: &Scope<'_>, chain: &[Strategy<T>]) -> Option<T> {
    chain.iter().find_map(|strategy| strategy(scope))
}

/// Run `chain` into `slot` unless the slot already holds a value.
pub(crate) fn fill_text(slot: &mut String, scope: &Scope<'_>, chain: &[Strategy<String>]) {
    if slot.is_empty() {
        if let Some(value) = first_hit(scope, chain) {
            *slot = value;
        }
    }
}

/// Turns rendered pages into records for one directory site.
#[derive(Debug, Clone, Default)]
pub struct ListingExtractor {
    profile: SiteProfile,
}

impl ListingExtractor {
    pub fn new(profile: SiteProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }
}
