use super::address::{compose_address, split_address};
use super::media::keep_photo;
use super::patterns;
use super::social::Platform;
use crate::core::types::{Record, MAX_PHOTOS};
use crate::scraping::dom::{non_empty, parse_selector};
use scraper::ElementRef;
use serde_json::{Map, Value};
use tracing::debug;

/// schema.org types treated as a business entity.
const BUSINESS_TYPES: &[&str] = &[
    "LocalBusiness",
    "Restaurant",
    "FoodEstablishment",
    "Store",
    "ProfessionalService",
    "HomeAndConstructionBusiness",
    "AutomotiveBusiness",
    "AutoRepair",
    "HealthAndBeautyBusiness",
    "LodgingBusiness",
    "MedicalBusiness",
    "LegalService",
    "FinancialService",
    "RealEstateAgent",
    "EntertainmentBusiness",
    "SportsActivityLocation",
    "Dentist",
    "Physician",
    "Plumber",
    "Electrician",
    "HairSalon",
    "Bakery",
    "CafeOrCoffeeShop",
    "Hotel",
];

/// Parsed `application/ld+json` blocks under `root`. Malformed blocks are skipped.
pub fn structured_blocks(root: ElementRef<'_>) -> Vec<Value> {
    let Some(selector) = parse_selector(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    root.select(&selector)
        .filter_map(|script| {
            let text = script.inner_html();
            if text.trim().is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("skipping malformed ld+json block: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Business entities in declaration order, looking through arrays and `@graph`.
pub fn business_entities(blocks: &[Value]) -> Vec<&Map<String, Value>> {
    let mut out = Vec::new();
    for block in blocks {
        collect_entities(block, &mut out);
    }
    out
}

fn collect_entities<'a>(value: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_entities(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect_entities(graph, out);
            }
            if declares_type(map, is_business_type) {
                out.push(map);
            }
        }
        _ => {}
    }
}

fn is_business_type(name: &str) -> bool {
    BUSINESS_TYPES.contains(&name) || name.ends_with("Business")
}

/// `@type` may be a single name or a list of names.
fn declares_type(map: &Map<String, Value>, accept: impl Fn(&str) -> bool) -> bool {
    match map.get("@type") {
        Some(Value::String(t)) => accept(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(accept),
        _ => false,
    }
}

/// Detail-page URL an entity describes, when it declares one.
pub fn entity_url(entity: &Map<String, Value>) -> Option<String> {
    json_string(entity.get("url")).or_else(|| json_string(entity.get("@id")))
}

/// Map one business entity onto the canonical schema.
pub fn normalize(entity: &Map<String, Value>) -> Record {
    let mut record = Record::default();

    record.denomination = json_string(entity.get("name")).unwrap_or_default();

    let phones = json_strings(entity.get("telephone"));
    if !phones.is_empty() {
        record.set_phones(&phones);
    }

    record.email = json_string(entity.get("email"))
        .map(|e| e.trim_start_matches("mailto:").to_string())
        .filter(|e| patterns::email().is_match(e))
        .unwrap_or_default();

    match entity.get("address") {
        Some(Value::Object(address)) => {
            record.adresse = json_string(address.get("streetAddress")).unwrap_or_default();
            record.code_postal = json_string(address.get("postalCode")).unwrap_or_default();
            record.ville = json_string(address.get("addressLocality")).unwrap_or_default();
            record.adresse_full_long =
                compose_address(&record.adresse, &record.code_postal, &record.ville);
        }
        Some(Value::String(raw)) => {
            let parts = split_address(raw);
            record.adresse = parts.street;
            record.code_postal = parts.postal_code;
            record.ville = parts.city;
            record.adresse_full_long = parts.full;
        }
        _ => {}
    }

    if let Some(Value::Object(geo)) = entity.get("geo") {
        if let (Some(lat), Some(lng)) = (
            json_string(geo.get("latitude")),
            json_string(geo.get("longitude")),
        ) {
            record.latitude = lat;
            record.longitude = lng;
        }
    }

    if let Some(Value::Object(rating)) = entity.get("aggregateRating") {
        record.rating = json_string(rating.get("ratingValue")).unwrap_or_default();
        record.review_count = json_string(rating.get("reviewCount"))
            .or_else(|| json_string(rating.get("ratingCount")))
            .unwrap_or_default();
    }

    record.horaires_ouverture = opening_hours(entity);

    if let Some(price) = json_string(entity.get("priceRange")) {
        record.prix_moyen = price.clone();
        record.tarifs = price;
    }

    record.description = json_string(entity.get("description")).unwrap_or_default();

    let images: Vec<String> = ["image", "photo"]
        .iter()
        .flat_map(|key| image_urls(entity.get(*key)))
        .collect();
    record.logo = image_urls(entity.get("logo"))
        .into_iter()
        .next()
        .or_else(|| images.first().cloned())
        .unwrap_or_default();
    for src in images {
        if record.photos.len() >= MAX_PHOTOS {
            break;
        }
        if keep_photo(&src, None) && !record.photos.contains(&src) {
            record.photos.push(src);
        }
    }

    for link in json_strings(entity.get("sameAs")) {
        if let Some(platform) = Platform::for_profile_url(&link) {
            let slot = platform.slot(&mut record);
            if slot.is_empty() {
                *slot = link;
            }
        }
    }

    record
}

fn opening_hours(entity: &Map<String, Value>) -> String {
    let direct = json_strings(entity.get("openingHours"));
    if !direct.is_empty() {
        return direct.join(", ");
    }

    let Some(Value::Array(specs)) = entity.get("openingHoursSpecification") else {
        return String::new();
    };
    specs
        .iter()
        .filter_map(|spec| {
            let days = json_strings(spec.get("dayOfWeek"))
                .into_iter()
                .map(|d| d.rsplit('/').next().unwrap_or_default().to_string())
                .collect::<Vec<_>>()
                .join(",");
            let opens = json_string(spec.get("opens"))?;
            let closes = json_string(spec.get("closes"))?;
            Some(format!("{days} {opens}-{closes}").trim().to_string())
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Answer text of the first FAQ question about services or prestations.
pub fn faq_services(blocks: &[Value]) -> Option<String> {
    blocks.iter().find_map(faq_answer)
}

fn faq_answer(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(faq_answer),
        Value::Object(map) => {
            if let Some(found) = map.get("@graph").and_then(faq_answer) {
                return Some(found);
            }
            if !declares_type(map, |t| t == "FAQPage") {
                return None;
            }
            let questions = match map.get("mainEntity") {
                Some(Value::Array(items)) => items.as_slice(),
                Some(single @ Value::Object(_)) => std::slice::from_ref(single),
                _ => return None,
            };
            questions.iter().find_map(|q| {
                let name = json_string(q.get("name"))?;
                if !patterns::services_question().is_match(&name) {
                    return None;
                }
                let answer = json_string(q.get("acceptedAnswer")?.get("text"))?;
                let plain = patterns::markup_tag().replace_all(&answer, " ");
                non_empty(plain.split_whitespace().collect::<Vec<_>>().join(" "))
            })
        }
        _ => None,
    }
}

/// Scalar as trimmed text; the first usable element for arrays.
fn json_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s.trim()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(|item| json_string(Some(item))),
        _ => None,
    }
}

fn json_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| json_string(Some(item)))
            .collect(),
        other => json_string(other).into_iter().collect(),
    }
}

/// `image` / `photo` / `logo` may be a URL, an `ImageObject`, or a list of either.
fn image_urls(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => non_empty(s.trim()).into_iter().collect(),
        Some(Value::Object(obj)) => json_string(obj.get("url"))
            .or_else(|| json_string(obj.get("contentUrl")))
            .into_iter()
            .collect(),
        Some(Value::Array(items)) => items.iter().flat_map(|i| image_urls(Some(i))).collect(),
        _ => Vec::new(),
    }
}
