use super::jsonld::{business_entities, entity_url, normalize, structured_blocks};
use super::{address, commercial, contact, media, registry, social, ListingExtractor, Scope};
use crate::core::config::SelectorChain;
use crate::core::result_set::dedup_records;
use crate::core::types::Record;
use crate::scraping::dom::{first_attr, first_text, inner_text, parse_selector};
use scraper::{ElementRef, Html};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

/// Cards rendering this little text are layout fragments, not businesses.
const MIN_CARD_TEXT_CHARS: usize = 50;

/// Resolve `href` against the page URL; absolute links pass through.
fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    Some(resolved.into())
}

impl ListingExtractor {
    /// Extract every business card of a rendered listing page.
    ///
    /// Card selectors are tried in order and the first one yielding a real
    /// card wins. Records keep document order and repeated
    /// `url + denomination` keys are dropped.
    pub fn extract_page(&self, html: &str, page_url: &str, cards: &SelectorChain) -> Vec<Record> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();
        let page_blocks = structured_blocks(document.root_element());
        let page_entities = business_entities(&page_blocks);

        let candidates = self.card_candidates(&document, cards);
        let found = candidates.len();

        let records: Vec<Record> = candidates
            .into_iter()
            .filter_map(|card| self.extract_card(card, base.as_ref(), &page_entities))
            .collect();
        let records = dedup_records(records);

        debug!(
            "{}: {} card(s), {} record(s) after filtering",
            page_url,
            found,
            records.len()
        );
        records
    }

    fn card_candidates<'a>(&self, document: &'a Html, cards: &SelectorChain) -> Vec<ElementRef<'a>> {
        let Some(detail_link) = parse_selector(&self.profile.detail_link_selector()) else {
            return Vec::new();
        };

        for css in cards.iter() {
            let Some(selector) = parse_selector(css) else {
                continue;
            };
            let found: Vec<ElementRef<'a>> = document
                .select(&selector)
                .filter(|card| card.select(&detail_link).next().is_some())
                .filter(|card| inner_text(*card).chars().count() > MIN_CARD_TEXT_CHARS)
                .collect();
            if !found.is_empty() {
                debug!("card selector '{}' matched {} card(s)", css, found.len());
                return found;
            }
        }
        Vec::new()
    }

    /// Structured entity describing this card: a block nested in the card,
    /// else a page-level entity whose URL is the card's detail page.
    fn card_structured(
        card: ElementRef<'_>,
        card_url: &str,
        base: Option<&Url>,
        page_entities: &[&Map<String, Value>],
    ) -> Record {
        let nested = structured_blocks(card);
        if let Some(entity) = business_entities(&nested).first() {
            return normalize(entity);
        }
        page_entities
            .iter()
            .find(|entity| {
                entity_url(entity)
                    .and_then(|u| resolve(base, &u))
                    .is_some_and(|u| u == card_url)
            })
            .map(|entity| normalize(entity))
            .unwrap_or_default()
    }

    fn extract_card(
        &self,
        card: ElementRef<'_>,
        base: Option<&Url>,
        page_entities: &[&Map<String, Value>],
    ) -> Option<Record> {
        let name_selector = format!(
            r#"{}, h2 a, h3 a, [class*="denom"]"#,
            self.profile.detail_link_selector()
        );
        let denomination = first_text(card, &name_selector)
            .map(|name| name.lines().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        let url = first_attr(card, &self.profile.detail_link_selector(), "href")
            .and_then(|href| resolve(base, &href))
            .unwrap_or_default();

        let mut record = Self::card_structured(card, &url, base, page_entities);
        record.denomination = denomination;
        record.url = url;
        if !record.has_identity() {
            debug!("skipping card without identity ({:?})", record.denomination);
            return None;
        }

        let scope = Scope::new(card, &self.profile);
        contact::fill_phones(&scope, &mut record);
        contact::fill_email(&scope, &mut record);
        contact::fill_website(&scope, &mut record);
        address::fill_address(&scope, &mut record);
        address::fill_geo(&scope, &mut record);
        registry::fill_identifiers(&scope, &mut record);
        commercial::fill_commercial(&scope, &mut record);
        commercial::fill_reputation(&scope, &mut record);
        commercial::fill_hours(&scope, &mut record);
        social::fill_social(&scope, &mut record);
        media::fill_logo(&scope, &mut record);
        media::fill_photos(&scope, &mut record);

        Some(record)
    }
}
