use super::{fill_text, Scope, Strategy};
use crate::core::types::{Record, MAX_PHOTOS};
use crate::scraping::dom::parse_selector;
use aho_corasick::AhoCorasick;
use std::sync::OnceLock;

/// Path fragments of directory chrome (logos, placeholders, upsell banners).
const EXCLUDED_MARKERS: &[&str] = &["logo", "/assets/", "placeholder", "Ajouter-", "Referencer-"];
/// Images narrower than this are icons.
const MIN_PHOTO_WIDTH: u32 = 100;

fn excluded_markers() -> &'static AhoCorasick {
    static AC: OnceLock<AhoCorasick> = OnceLock::new();
    AC.get_or_init(|| AhoCorasick::new(EXCLUDED_MARKERS).expect("valid marker set"))
}

/// Whether an image source qualifies as a business photo.
///
/// `width` is only known when the markup declares it.
pub(super) fn keep_photo(src: &str, width: Option<u32>) -> bool {
    let absolute = src.starts_with("http://") || src.starts_with("https://");
    absolute
        && !excluded_markers().is_match(src)
        && width.map_or(true, |w| w >= MIN_PHOTO_WIDTH)
}

fn image_source(img: &scraper::node::Element, attrs: &[&str]) -> Option<String> {
    attrs
        .iter()
        .filter_map(|a| img.attr(a))
        .map(str::trim)
        .find(|s| s.starts_with("http"))
        .map(str::to_string)
}

fn declared_width(img: &scraper::node::Element) -> Option<u32> {
    img.attr("width")?.trim().trim_end_matches("px").parse().ok()
}

const LOGOS: &[Strategy<String>] = &[logo_image];

fn logo_image(scope: &Scope<'_>) -> Option<String> {
    let selector = parse_selector(r#"img[class*="logo"]"#)?;
    scope
        .element
        .select(&selector)
        .find_map(|img| image_source(img.value(), &["src", "data-src"]))
}

pub(super) fn fill_logo(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.logo, scope, LOGOS);
}

pub(super) fn photos(scope: &Scope<'_>) -> Vec<String> {
    let Some(selector) = parse_selector("img") else {
        return Vec::new();
    };

    let mut found: Vec<String> = Vec::new();
    for img in scope.element.select(&selector) {
        let el = img.value();
        let Some(src) = image_source(el, &["src", "data-src"]) else {
            continue;
        };
        if keep_photo(&src, declared_width(el)) && !found.contains(&src) {
            found.push(src);
            if found.len() == MAX_PHOTOS {
                break;
            }
        }
    }
    found
}

pub(super) fn fill_photos(scope: &Scope<'_>, record: &mut Record) {
    if record.photos.is_empty() {
        record.photos = photos(scope);
    }
}
