use super::{fill_text, patterns, Scope, Strategy};
use crate::core::types::Record;

/// Blocks holding the legal mentions on detail pages.
pub(super) const LEGAL_BLOCK_SELECTOR: &str =
    "#bloc-infos-legales, .legal-info, .infos-juridiques, .bi-bloc-infos";

fn digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

// SIRET: labeled, then the spaced `### ### ### #####` layout, then a bare
// 14-digit run. A later form only counts when no earlier one matched.
const SIRETS: &[Strategy<String>] = &[labeled_siret, spaced_siret, bare_siret];

fn labeled_siret(scope: &Scope<'_>) -> Option<String> {
    patterns::siret_labeled()
        .captures_iter(&scope.text)
        .map(|caps| digits(&caps[1]))
        .find(|d| d.len() >= 14)
        .map(|d| d[..14].to_string())
}

fn spaced_siret(scope: &Scope<'_>) -> Option<String> {
    patterns::siret_spaced()
        .find(&scope.text)
        .map(|m| digits(m.as_str()))
}

fn bare_siret(scope: &Scope<'_>) -> Option<String> {
    patterns::siret_bare()
        .captures(&scope.text)
        .map(|caps| caps[1].to_string())
}

const NAF_CODES: &[Strategy<String>] = &[labeled_naf, bare_naf];

fn labeled_naf(scope: &Scope<'_>) -> Option<String> {
    let caps = patterns::naf_labeled().captures(&scope.text)?;
    Some(
        caps[1]
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase(),
    )
}

fn bare_naf(scope: &Scope<'_>) -> Option<String> {
    patterns::naf_bare()
        .captures(&scope.text)
        .map(|caps| caps[1].to_string())
}

pub(super) fn fill_identifiers(scope: &Scope<'_>, record: &mut Record) {
    if record.siret.is_empty() {
        let mut siret = String::new();
        fill_text(&mut siret, scope, SIRETS);
        record.set_siret(&siret);
    }
    fill_text(&mut record.code_naf, scope, NAF_CODES);
}

// ── Legal mentions (detail pages) ───────────────────────────────────────────

const CAPITAL: &[Strategy<String>] = &[capital];
const LEGAL_FORM: &[Strategy<String>] = &[legal_form];
const DIRECTOR: &[Strategy<String>] = &[director];
const CREATION_DATE: &[Strategy<String>] = &[creation_date];
const HEADCOUNT: &[Strategy<String>] = &[headcount];

fn first_capture(re: &regex::Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    let value = caps.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn capital(scope: &Scope<'_>) -> Option<String> {
    let amount = first_capture(patterns::capital(), &scope.text)?;
    let compact: String = amount.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = compact.trim_end_matches('.');
    (!compact.is_empty()).then(|| compact.to_string())
}

fn legal_form(scope: &Scope<'_>) -> Option<String> {
    first_capture(patterns::legal_form(), &scope.text)
}

fn director(scope: &Scope<'_>) -> Option<String> {
    first_capture(patterns::director(), &scope.text)
}

fn creation_date(scope: &Scope<'_>) -> Option<String> {
    first_capture(patterns::creation_date(), &scope.text)
}

fn headcount(scope: &Scope<'_>) -> Option<String> {
    first_capture(patterns::headcount(), &scope.text)
}

pub(super) fn fill_legal(scope: &Scope<'_>, record: &mut Record) {
    fill_text(&mut record.capital, scope, CAPITAL);
    fill_text(&mut record.forme_juridique, scope, LEGAL_FORM);
    fill_text(&mut record.dirigeant, scope, DIRECTOR);
    fill_text(&mut record.date_creation, scope, CREATION_DATE);
    fill_text(&mut record.effectif, scope, HEADCOUNT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SiteProfile;
    use scraper::Html;

    fn extract(html: &str) -> Record {
        let doc = Html::parse_fragment(html);
        let profile = SiteProfile::default();
        let scope = Scope::new(doc.root_element(), &profile);
        let mut record = Record::default();
        fill_identifiers(&scope, &mut record);
        fill_legal(&scope, &mut record);
        record
    }

    #[test]
    fn test_labeled_siret_beats_bare_number() {
        let r = extract("<p>Réf 99999999999999</p><p>SIRET : 123 456 789 00012</p>");
        assert_eq!(r.siret, "12345678900012");
        assert_eq!(r.siren, "123456789");
    }

    #[test]
    fn test_spaced_then_bare_siret() {
        assert_eq!(extract("<p>n° 552 100 554 00025</p>").siret, "55210055400025");
        assert_eq!(extract("<p>id 55210055400025</p>").siret, "55210055400025");
        let none = extract("<p>aucun identifiant</p>");
        assert!(none.siret.is_empty());
        assert!(none.siren.is_empty());
    }

    #[test]
    fn test_naf_labeled_then_bare() {
        assert_eq!(extract("<p>Code NAF : 56.10a</p>").code_naf, "5610A");
        assert_eq!(extract("<p>Activité 4520A garage</p>").code_naf, "4520A");
    }

    #[test]
    fn test_legal_mentions() {
        let r = extract(
            "<div><p>Forme juridique : SARL</p><p>Capital social : 10 000 €</p>\
             <p>Gérant : Jean Dupont</p><p>Date de création : 12/03/2004</p>\
             <p>Effectif : 6 à 9 salariés</p></div>",
        );
        assert_eq!(r.forme_juridique, "SARL");
        assert_eq!(r.capital, "10000");
        assert_eq!(r.dirigeant, "Jean Dupont");
        assert_eq!(r.date_creation, "12/03/2004");
        assert_eq!(r.effectif, "6 à 9 salariés");
    }
}
