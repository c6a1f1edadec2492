use super::Scope;
use crate::core::types::Record;
use crate::scraping::dom::{parse_selector, within_class};
use url::Url;

/// Markers of a share action rather than a profile.
const SHARE_MARKERS: &[&str] = &["share", "intent/"];
/// Ancestor classes of share widgets.
const SHARE_CONTAINERS: &[&str] = &["partage", "share-btn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Facebook,
    Twitter,
    Linkedin,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Facebook,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Instagram,
    ];

    pub fn for_host(host: &str) -> Option<Self> {
        let host = host.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        let on = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if on("facebook.com") || on("fb.com") {
            Some(Platform::Facebook)
        } else if on("twitter.com") || on("x.com") {
            Some(Platform::Twitter)
        } else if on("linkedin.com") {
            Some(Platform::Linkedin)
        } else if on("instagram.com") {
            Some(Platform::Instagram)
        } else {
            None
        }
    }

    /// Platform of an absolute profile URL; share-action URLs never qualify.
    pub fn for_profile_url(href: &str) -> Option<Self> {
        let lowered = href.to_ascii_lowercase();
        if SHARE_MARKERS.iter().any(|m| lowered.contains(m)) {
            return None;
        }
        let parsed = Url::parse(href.trim()).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        Self::for_host(parsed.host_str()?)
    }

    pub fn slot(self, record: &mut Record) -> &mut String {
        match self {
            Platform::Facebook => &mut record.facebook,
            Platform::Twitter => &mut record.twitter,
            Platform::Linkedin => &mut record.linkedin,
            Platform::Instagram => &mut record.instagram,
        }
    }
}

/// First profile link per platform, in document order.
///
/// Links inside share widgets are skipped even when their URL looks like a
/// profile.
pub(super) fn profile_links(scope: &Scope<'_>) -> Vec<(Platform, String)> {
    let Some(selector) = parse_selector("a[href]") else {
        return Vec::new();
    };

    let mut found: Vec<(Platform, String)> = Vec::new();
    for link in scope.element.select(&selector) {
        let Some(href) = link.value().attr("href").map(str::trim) else {
            continue;
        };
        let Some(platform) = Platform::for_profile_url(href) else {
            continue;
        };
        if found.iter().any(|(p, _)| *p == platform) || within_class(link, SHARE_CONTAINERS) {
            continue;
        }
        found.push((platform, href.to_string()));
        if found.len() == Platform::ALL.len() {
            break;
        }
    }
    found
}

pub(super) fn fill_social(scope: &Scope<'_>, record: &mut Record) {
    for (platform, href) in profile_links(scope) {
        let slot = platform.slot(record);
        if slot.is_empty() {
            *slot = href;
        }
    }
}
