use super::social::Platform;
use super::{fill_text, first_hit, patterns, Scope, Strategy};
use crate::core::types::{normalize_phone, Record};
use crate::scraping::dom::{inner_text, parse_selector};
use url::Url;

const PHONE_ATTRIBUTES: &[&str] = &["data-phone", "data-tel", "data-telephone"];
const WEBSITE_SELECTOR: &str =
    r#"a[class*="site-internet"], a[class*="website"], a[itemprop="url"], a[title*="site"]"#;

// ── Telephone ───────────────────────────────────────────────────────────────

const PHONES: &[Strategy<Vec<String>>] = &[phone_links_and_attributes, phones_in_text];

/// Push `candidate` when it carries a valid number not seen yet.
fn push_phone(found: &mut Vec<String>, candidate: &str) -> bool {
    let Some(m) = patterns::phone().find(candidate) else {
        return false;
    };
    let number = m.as_str().trim();
    let raw = normalize_phone(number);
    if !found.iter().any(|p| normalize_phone(p) == raw) {
        found.push(number.to_string());
    }
    true
}

fn phone_links_and_attributes(scope: &Scope<'_>) -> Option<Vec<String>> {
    let mut found = Vec::new();

    if let Some(selector) = parse_selector(r#"a[href^="tel:"]"#) {
        for link in scope.element.select(&selector) {
            let label = inner_text(link);
            let href = link
                .value()
                .attr("href")
                .unwrap_or_default()
                .trim_start_matches("tel:");
            if !push_phone(&mut found, &label) {
                push_phone(&mut found, href);
            }
        }
    }

    if let Some(selector) = parse_selector("[data-phone], [data-tel], [data-telephone]") {
        for el in scope.element.select(&selector) {
            for attr in PHONE_ATTRIBUTES {
                if let Some(value) = el.value().attr(attr) {
                    push_phone(&mut found, value);
                }
            }
        }
    }

    (!found.is_empty()).then_some(found)
}

fn phones_in_text(scope: &Scope<'_>) -> Option<Vec<String>> {
    let mut found = Vec::new();
    for m in patterns::phone().find_iter(&scope.text) {
        push_phone(&mut found, m.as_str());
    }
    (!found.is_empty()).then_some(found)
}

pub(super) fn fill_phones(scope: &Scope<'_>, record: &mut Record) {
    if !record.telephone.is_empty() {
        return;
    }
    if let Some(phones) = first_hit(scope, PHONES) {
        record.set_phones(&phones);
    }
}

const LINKED_PHONES: &[Strategy<Vec<String>>] = &[phone_links_and_attributes];

/// Detail pages only trust the first linked number; their text lists unrelated ones.
pub(super) fn fill_first_phone(scope: &Scope<'_>, record: &mut Record) {
    if !record.telephone.is_empty() {
        return;
    }
    if let Some(first) = first_hit(scope, LINKED_PHONES).and_then(|p| p.into_iter().next()) {
        record.set_phones(&[first]);
    }
}

// ── Email ───────────────────────────────────────────────────────────────────

const EMAILS: &[Strategy<String>] = &[mailto_link, email_in_markup];

fn mailto_link(scope: &Scope<'_>) -> Option<String> {
    let selector = parse_selector(r#"a[href^="mailto:"]"#)?;
    scope.element.select(&selector).find_map(|link| {
        let href = link.value().attr("href")?;
        let address = href.trim_start_matches("mailto:");
        let address = address.split('?').next().unwrap_or_default().trim();
        patterns::email().is_match(address).then(|| address.to_string())
    })
}

fn email_in_markup(scope: &Scope<'_>) -> Option<String> {
    patterns::email()
        .find(&scope.markup)
        .map(|m| m.as_str().to_string())
}

pub(super) fn fill_email(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.email, scope, EMAILS);
}

// ── Website ─────────────────────────────────────────────────────────────────

const WEBSITES: &[Strategy<String>] = &[labeled_website, first_external_link];
const LABELED_WEBSITES: &[Strategy<String>] = &[labeled_website];

/// Absolute link leaving the directory that is not a social profile.
fn external_href(scope: &Scope<'_>, href: &str) -> Option<String> {
    let parsed = Url::parse(href.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    let map_link = host.starts_with("maps.") || parsed.path().starts_with("/maps");
    if map_link
        || host.contains(&scope.profile.directory_host)
        || Platform::for_host(host).is_some()
    {
        return None;
    }
    Some(href.trim().to_string())
}

fn labeled_website(scope: &Scope<'_>) -> Option<String> {
    let selector = parse_selector(WEBSITE_SELECTOR)?;
    scope
        .element
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| external_href(scope, href))
}

fn first_external_link(scope: &Scope<'_>) -> Option<String> {
    let selector = parse_selector("a[href]")?;
    scope
        .element
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| external_href(scope, href))
}

pub(super) fn fill_website(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.site_web, scope, WEBSITES);
}

/// Only explicitly labeled links count on detail pages, which carry unrelated outbound links.
pub(super) fn fill_labeled_website(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.site_web, scope, LABELED_WEBSITES);
}

#[cfg(test)]
mod tests {
    use super::super::tests::card_record;

    #[test]
    fn test_phone_from_card_text() {
        let r = card_record(
            r#"<li><h3><a href="/pros/1">Garage Martin</a></h3>
               <p>Réparation toutes marques, entretien et carrosserie depuis 1990.</p>
               <p>Tél : 01 23 45 67 89</p></li>"#,
        );
        assert_eq!(r.telephone, "01 23 45 67 89");
        assert_eq!(r.telephone_raw, "0123456789");
    }

    #[test]
    fn test_registration_number_is_not_a_phone() {
        let r = card_record(
            r#"<li><h3><a href="/pros/1">Garage Martin</a></h3>
               <p>Réparation toutes marques, entretien et carrosserie depuis 1990.</p>
               <p>SIRET 80312345678900</p></li>"#,
        );
        assert_eq!(r.telephone, "");
        assert_eq!(r.telephone_raw, "");

        let r = card_record(
            r#"<li><h3><a href="/pros/1">Garage Martin</a></h3>
               <p>Réparation toutes marques, entretien et carrosserie depuis 1990.</p>
               <p>SIRET 80312345678900</p><p>Tél : 04 78 00 00 01</p></li>"#,
        );
        assert_eq!(r.telephone, "04 78 00 00 01");
    }

    #[test]
    fn test_tel_links_and_attributes_are_distinct_in_order() {
        let r = card_record(
            r#"<li><h3><a href="/pros/1">Garage Martin</a></h3>
               <p>Réparation toutes marques, entretien et carrosserie depuis 1990.</p>
               <a href="tel:+33123456789">Appeler</a>
               <span data-phone="06 11 22 33 44"></span>
               <span data-tel="+33 1 23 45 67 89"></span>
               <p>Fax 01 99 99 99 99</p></li>"#,
        );
        assert_eq!(r.telephone, "+33123456789 ; 06 11 22 33 44");
        assert_eq!(r.telephone_raw, "+33123456789;0611223344");
    }

    #[test]
    fn test_email_and_website() {
        let r = card_record(
            r#"<li><h3><a href="/pros/1">Atelier Lune</a></h3>
               <p>Création de bijoux artisanaux sur mesure, réparations et gravures.</p>
               <a href="mailto:contact@atelier-lune.fr?subject=Devis">Écrire</a>
               <a href="https://www.pagesjaunes.fr/pros/1/avis">Avis</a>
               <a href="https://www.facebook.com/atelierlune">Facebook</a>
               <a href="https://atelier-lune.fr">Site</a></li>"#,
        );
        assert_eq!(r.email, "contact@atelier-lune.fr");
        assert_eq!(r.site_web, "https://atelier-lune.fr");
        assert_eq!(r.facebook, "https://www.facebook.com/atelierlune");
    }
}
