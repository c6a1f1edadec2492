use super::{fill_text, patterns, Scope, Strategy};
use crate::core::types::Record;
use crate::scraping::dom::{all_texts, first_text, first_text_or_attr, parse_selector};

const HOURS_SELECTOR: &str = r#"[itemprop="openingHours"], .opening-hours, [class*="horaire"], [class*="hours"], [data-hours]"#;
/// Weekday lines kept by the free-text hours fallback.
const MAX_HOURS_LINES: usize = 7;

const CATEGORIES: &[Strategy<String>] = &[category];
const RATINGS: &[Strategy<String>] = &[rating];
const REVIEW_COUNTS: &[Strategy<String>] = &[review_count];
const DESCRIPTIONS: &[Strategy<String>] = &[description];
const SERVICES: &[Strategy<String>] = &[services];
const EQUIPMENT: &[Strategy<String>] = &[equipment];
const PAYMENT: &[Strategy<String>] = &[payment];
const BRANDS: &[Strategy<String>] = &[brands];
const LANGUAGES: &[Strategy<String>] = &[languages];
const CERTIFICATIONS: &[Strategy<String>] = &[certifications];
const PRICES: &[Strategy<String>] = &[prices];
const AVERAGE_PRICES: &[Strategy<String>] = &[average_price];
const HOURS: &[Strategy<String>] = &[hours_block];
const DETAIL_HOURS: &[Strategy<String>] = &[hours_block, hours_in_text];

fn category(scope: &Scope<'_>) -> Option<String> {
    first_text(
        scope.element,
        r#"[class*="categorie"], [class*="rubrique"], [class*="activite"]"#,
    )
}

fn rating(scope: &Scope<'_>) -> Option<String> {
    first_text_or_attr(
        scope.element,
        r#"[itemprop="ratingValue"], [class*="note"]"#,
        &["content", "data-rating"],
    )
}

fn review_count(scope: &Scope<'_>) -> Option<String> {
    first_text_or_attr(
        scope.element,
        r#"[itemprop="reviewCount"], [class*="nb-avis"]"#,
        &["content"],
    )
}

fn description(scope: &Scope<'_>) -> Option<String> {
    first_text_or_attr(
        scope.element,
        r#"[itemprop="description"], [class*="description"]"#,
        &["content"],
    )
}

fn joined(scope: &Scope<'_>, css: &str) -> Option<String> {
    let mut items = all_texts(scope.element, css);
    items.dedup();
    (!items.is_empty()).then(|| items.join(", "))
}

fn services(scope: &Scope<'_>) -> Option<String> {
    joined(scope, r#"[class*="service"], [class*="prestation"]"#)
}

fn equipment(scope: &Scope<'_>) -> Option<String> {
    joined(scope, r#"[class*="equipement"]"#)
}

fn payment(scope: &Scope<'_>) -> Option<String> {
    first_text(scope.element, r#"[class*="paiement"]"#)
}

fn brands(scope: &Scope<'_>) -> Option<String> {
    first_text(scope.element, r#"[class*="marque"]"#)
}

fn languages(scope: &Scope<'_>) -> Option<String> {
    first_text(scope.element, r#"[class*="langue"]"#)
}

/// `[class*="label"]` also matches the map link caption, which is not a label.
fn certifications(scope: &Scope<'_>) -> Option<String> {
    let text = first_text(scope.element, r#"[class*="certification"], [class*="label"]"#)?;
    (!patterns::view_map().is_match(&text)).then_some(text)
}

fn prices(scope: &Scope<'_>) -> Option<String> {
    first_text(scope.element, r#"[class*="tarif"], [class*="prix"]"#)
}

fn average_price(scope: &Scope<'_>) -> Option<String> {
    let tariffs = prices(scope)?;
    let caps = patterns::euro_amount().captures(&tariffs)?;
    Some(caps[1].to_string())
}

fn hours_block(scope: &Scope<'_>) -> Option<String> {
    let selector = parse_selector(HOURS_SELECTOR)?;
    scope.element.select(&selector).find_map(|el| {
        let text = crate::scraping::dom::inner_text(el);
        if !text.is_empty() {
            return Some(text);
        }
        ["content", "data-hours"]
            .iter()
            .filter_map(|a| el.value().attr(a))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}

fn hours_in_text(scope: &Scope<'_>) -> Option<String> {
    let lines: Vec<&str> = patterns::weekday_hours()
        .find_iter(&scope.text)
        .take(MAX_HOURS_LINES)
        .map(|m| m.as_str().trim())
        .collect();
    (!lines.is_empty()).then(|| lines.join(" | "))
}

pub(super) fn fill_reputation(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.rating, scope, RATINGS);
    fill_text(&mut record.review_count, scope, REVIEW_COUNTS);
}

pub(super) fn fill_hours(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.horaires_ouverture, scope, HOURS);
}

/// Detail pages fall back to weekday lines in the page text.
pub(super) fn fill_detail_hours(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.horaires_ouverture, scope, DETAIL_HOURS);
}

pub(super) fn fill_commercial(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.activite, scope, CATEGORIES);
    if record.categorie.is_empty() {
        record.categorie = record.activite.clone();
    }
    fill_text(&mut record.description, scope, DESCRIPTIONS);
    fill_text(&mut record.services, scope, SERVICES);
    fill_text(&mut record.equipements, scope, EQUIPMENT);
    fill_text(&mut record.moyens_paiement, scope, PAYMENT);
    fill_text(&mut record.marques, scope, BRANDS);
    fill_text(&mut record.langues, scope, LANGUAGES);
    fill_text(&mut record.certifications, scope, CERTIFICATIONS);
    fill_text(&mut record.tarifs, scope, PRICES);
    fill_text(&mut record.prix_moyen, scope, AVERAGE_PRICES);
}
