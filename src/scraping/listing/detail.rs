use super::jsonld::{business_entities, faq_services, normalize, structured_blocks};
use super::registry::LEGAL_BLOCK_SELECTOR;
use super::{address, commercial, contact, registry, social, ListingExtractor, Scope};
use crate::core::types::Record;
use crate::scraping::dom::first_text;
use scraper::Html;

impl ListingExtractor {
    /// Extract what a business detail page adds to its listing record.
    ///
    /// The first business entity in the page metadata seeds the result; the
    /// legal block is read ahead of the page text so its mentions win over
    /// stray numbers elsewhere. Identity columns are always left empty.
    pub fn extract_detail(&self, html: &str) -> Record {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let blocks = structured_blocks(root);

        let mut record = business_entities(&blocks)
            .first()
            .map(|entity| normalize(entity))
            .unwrap_or_default();
        record.denomination.clear();
        record.url.clear();

        if record.services.is_empty() {
            if let Some(services) = faq_services(&blocks) {
                record.services = services;
            }
        }

        let legal_block = first_text(root, LEGAL_BLOCK_SELECTOR);
        let scope = Scope::new(root, &self.profile).with_leading_text(legal_block);

        registry::fill_identifiers(&scope, &mut record);
        registry::fill_legal(&scope, &mut record);
        contact::fill_first_phone(&scope, &mut record);
        contact::fill_email(&scope, &mut record);
        contact::fill_labeled_website(&scope, &mut record);
        address::fill_address(&scope, &mut record);
        address::fill_geo(&scope, &mut record);
        commercial::fill_detail_hours(&scope, &mut record);
        commercial::fill_reputation(&scope, &mut record);
        social::fill_social(&scope, &mut record);

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_PAGE: &str = r#"<html><head>
        <script type="application/ld+json">
        {"@context":"https://schema.org","@type":"AutoRepair","name":"Garage Martin",
         "url":"https://www.pagesjaunes.fr/pros/1",
         "geo":{"latitude":"45.76","longitude":"4.83"}}
        </script>
        <script type="application/ld+json">
        {"@type":"FAQPage","mainEntity":[{"@type":"Question","name":"Quels services ?",
          "acceptedAnswer":{"text":"<p>Vidange, <b>freinage</b></p>"}}]}
        </script></head>
        <body>
          <header><a href="tel:0472000000">04 72 00 00 00</a><a href="tel:0800000000">Service client</a></header>
          <p>Ref annonce 11112222333344</p>
          <div class="share-btn"><a href="https://www.facebook.com/pagesjaunes">f</a></div>
          <a href="https://www.linkedin.com/company/garage-martin">in</a>
          <div id="bloc-infos-legales">
            <p>SIRET : 552 100 554 00025</p>
            <p>Code NAF : 4520A</p>
            <p>Forme juridique : SAS</p>
            <p>Capital : 5 000 €</p>
            <p>Président : Marie Martin</p>
          </div>
          <ul><li>Lundi 08h00 - 18h00</li><li>Samedi 09h00 - 12h00</li></ul>
        </body></html>"#;

    #[test]
    fn test_detail_extraction() {
        let r = ListingExtractor::default().extract_detail(DETAIL_PAGE);
        assert!(r.denomination.is_empty());
        assert!(r.url.is_empty());
        assert_eq!(r.latitude, "45.76");
        assert_eq!(r.services, "Vidange, freinage");
        assert_eq!(r.telephone, "04 72 00 00 00");
        assert_eq!(r.telephone_raw, "0472000000");
        assert_eq!(r.siret, "55210055400025");
        assert_eq!(r.siren, "552100554");
        assert_eq!(r.code_naf, "4520A");
        assert_eq!(r.forme_juridique, "SAS");
        assert_eq!(r.capital, "5000");
        assert_eq!(r.dirigeant, "Marie Martin");
        assert_eq!(r.facebook, "");
        assert_eq!(r.linkedin, "https://www.linkedin.com/company/garage-martin");
        assert_eq!(
            r.horaires_ouverture,
            "Lundi 08h00 - 18h00 | Samedi 09h00 - 12h00"
        );
    }

    #[test]
    fn test_detail_without_metadata_is_empty() {
        let r = ListingExtractor::default().extract_detail("<html><body><p>Rien</p></body></html>");
        assert_eq!(r, Record::default());
    }
}
