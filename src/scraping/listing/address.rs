use super::{fill_text, first_hit, patterns, Scope, Strategy};
use crate::core::types::Record;
use crate::scraping::dom::{first_text, non_empty, parse_selector};

const ADDRESS_SELECTOR: &str =
    r#"[itemprop="streetAddress"], [class*="adresse"], [class*="address"]"#;
const MAP_LINK_SELECTOR: &str = r#"a[href*="maps"], a[href*="plan"]"#;

/// A one-line address split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub full: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

/// Clean a raw address and split its trailing `<5-digit code> <locality>`.
///
/// "Voir le plan" boilerplate is removed and whitespace collapsed first;
/// without a recognizable suffix the whole text is the street.
pub fn split_address(raw: &str) -> AddressParts {
    let cleaned = patterns::view_map().replace_all(raw, " ");
    let full = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    let suffix = patterns::postal_suffix().captures(&full).map(|caps| {
        let start = caps.get(0).map_or(full.len(), |m| m.start());
        (
            full[..start].trim().to_string(),
            caps[1].to_string(),
            caps[2].trim().to_string(),
        )
    });

    match suffix {
        Some((street, postal_code, city)) => AddressParts {
            full,
            street,
            postal_code,
            city,
        },
        None => AddressParts {
            street: full.clone(),
            full,
            ..Default::default()
        },
    }
}

/// Inverse of [`split_address`] for sources that already carry the parts.
pub fn compose_address(street: &str, postal_code: &str, city: &str) -> String {
    [street, postal_code, city]
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

const RAW_ADDRESS: &[Strategy<String>] = &[address_block];

fn address_block(scope: &Scope<'_>) -> Option<String> {
    let raw = first_text(scope.element, ADDRESS_SELECTOR)?;
    non_empty(split_address(&raw).full)
}

pub(super) fn fill_address(scope: &Scope<'_>, record: &mut Record) {
    // Structured parts, when present, are kept; the split only backfills.
    fill_text(&mut record.adresse_full_long, scope, RAW_ADDRESS);
    let parts = split_address(&record.adresse_full_long);
    backfill(&mut record.adresse, parts.street);
    backfill(&mut record.code_postal, parts.postal_code);
    backfill(&mut record.ville, parts.city);
}

fn backfill(slot: &mut String, value: String) {
    if slot.is_empty() {
        *slot = value;
    }
}

const COORDINATES: &[Strategy<(String, String)>] = &[coordinate_attributes, map_link_coordinates];

fn coordinate_attributes(scope: &Scope<'_>) -> Option<(String, String)> {
    let own = scope.element.value();
    let pair = |lat: Option<&str>, lng: Option<&str>| -> Option<(String, String)> {
        Some((non_empty(lat?)?, non_empty(lng?)?))
    };

    pair(own.attr("data-lat"), own.attr("data-lng"))
        .or_else(|| pair(own.attr("data-latitude"), own.attr("data-longitude")))
        .or_else(|| {
            let selector = parse_selector("[data-lat], [data-latitude]")?;
            scope.element.select(&selector).find_map(|el| {
                let el = el.value();
                pair(
                    el.attr("data-lat").or_else(|| el.attr("data-latitude")),
                    el.attr("data-lng").or_else(|| el.attr("data-longitude")),
                )
            })
        })
}

fn map_link_coordinates(scope: &Scope<'_>) -> Option<(String, String)> {
    let selector = parse_selector(MAP_LINK_SELECTOR)?;
    scope.element.select(&selector).find_map(|link| {
        let href = link.value().attr("href")?;
        let caps = patterns::map_coords().captures(href)?;
        Some((caps[1].to_string(), caps[2].to_string()))
    })
}

pub(super) fn fill_geo(scope: &Scope<'_>, record: &mut Record) {
    if !record.latitude.is_empty() && !record.longitude.is_empty() {
        return;
    }
    if let Some((lat, lng)) = first_hit(scope, COORDINATES) {
        record.latitude = lat;
        record.longitude = lng;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_trailing_postal_code_and_city() {
        let parts = split_address("12 Rue de la Paix 75002 Paris");
        assert_eq!(parts.postal_code, "75002");
        assert_eq!(parts.city, "Paris");
        assert_eq!(parts.street, "12 Rue de la Paix");
    }

    #[test]
    fn test_split_locality_with_apostrophe_or_cedex() {
        let parts = split_address("1 rue Paul Doumer 59650 Villeneuve-d'Ascq");
        assert_eq!(parts.postal_code, "59650");
        assert_eq!(parts.city, "Villeneuve-d'Ascq");
        assert_eq!(parts.street, "1 rue Paul Doumer");

        let parts = split_address("4 quai du Point du Jour 92100 Boulogne-Billancourt Cedex 3");
        assert_eq!(parts.postal_code, "92100");
        assert_eq!(parts.city, "Boulogne-Billancourt Cedex 3");
        assert_eq!(parts.street, "4 quai du Point du Jour");

        let parts = split_address("Place d’Armes 78000 Versailles CEDEX");
        assert_eq!(parts.city, "Versailles CEDEX");
    }

    #[test]
    fn test_split_strips_map_boilerplate() {
        let parts = split_address("3  avenue Foch\n69006 Lyon  Voir le plan");
        assert_eq!(parts.full, "3 avenue Foch 69006 Lyon");
        assert_eq!(parts.city, "Lyon");
        assert_eq!(parts.street, "3 avenue Foch");
    }

    #[test]
    fn test_split_without_suffix_keeps_street() {
        let parts = split_address("Zone artisanale des Prés");
        assert_eq!(parts.street, "Zone artisanale des Prés");
        assert!(parts.postal_code.is_empty());
        assert!(parts.city.is_empty());
    }

    #[test]
    fn test_compose_skips_blank_parts() {
        assert_eq!(compose_address("1 rue A", "", "Nantes"), "1 rue A Nantes");
    }
}
