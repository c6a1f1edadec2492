//! Compiled free-text patterns shared by the field strategies.

use regex::Regex;
use std::sync::OnceLock;

macro_rules! pattern {
    ($(#[$doc:meta])* $name:ident => $re:expr) => {
        $(#[$doc])*
        pub(crate) fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($re).expect(concat!("valid pattern ", stringify!($name))))
        }
    };
}

pattern! {
    /// French national or `+33` number: a leading digit then four grouped pairs.
    /// Word boundaries keep it from matching inside a longer digit run.
    phone => r"(?:\+33|\b0)\s*[1-9](?:[\s.\-]?\d{2}){4}\b"
}

pattern! {
    email => r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}"
}

pattern! {
    /// Trailing `<postal code> <locality>` of a one-line address. The locality
    /// may hold apostrophes and end with a numbered `Cedex` mention.
    postal_suffix => r"(\d{5})\s+([A-Za-zÀ-ÿ'’\s\-]+(?:\s(?i:cedex)(?:\s*\d{1,3})?)?)$"
}

pattern! {
    view_map => r"(?i)voir le plan"
}

pattern! {
    siret_labeled => r"(?i:SIRET)\s*[:.]?\s*(\d[\d \x{A0}]{13,})"
}

pattern! {
    siret_spaced => r"\b\d{3}\s\d{3}\s\d{3}\s\d{5}\b"
}

pattern! {
    siret_bare => r"\b(\d{14})\b"
}

pattern! {
    naf_labeled => r"(?i:(?:code\s+)?(?:NAF|APE)(?:\s*/\s*APE)?)\s*[:.]?\s*(\d{2}\.?\d{2}\s?[A-Za-z])\b"
}

pattern! {
    naf_bare => r"\b(\d{4}[A-Z])\b"
}

pattern! {
    capital => r"(?i:Capital(?:\s+social)?)\s*[:.]?\s*(\d[\d .\x{A0}\x{202F}]*)\s*(?:€|EUR|euros?)?"
}

pattern! {
    legal_form => r"(?i:Forme\s*juridique)\s*[:.]?\s*([A-Z]{2,})"
}

pattern! {
    director => r"(?i)(?:Gérant|Président|Directeur|Dirigeant)[^:\n]*[:.]\s*([^\n]+)"
}

pattern! {
    creation_date => r"(?i:Date\s+de\s+création)\s*[:.]?\s*(\d[\d/]*)"
}

pattern! {
    headcount => r"(?i:Effectif)\s*[:.]?\s*([^\n]+)"
}

pattern! {
    weekday_hours => r"(?i)(?:Lundi|Mardi|Mercredi|Jeudi|Vendredi|Samedi|Dimanche)[^\n]{0,100}(?:\d{1,2}h\d{2}|\d{1,2}:\d{2})"
}

pattern! {
    map_coords => r"@(-?\d+\.\d+),(-?\d+\.\d+)"
}

pattern! {
    euro_amount => r"(\d+)\s*€"
}

pattern! {
    markup_tag => r"<[^>]+>"
}

pattern! {
    services_question => r"(?i)prestations|services"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_pattern_accepts_common_layouts() {
        for sample in [
            "01 23 45 67 89",
            "0123456789",
            "06.11.22.33.44",
            "+33 1 23 45 67 89",
            "+33123456789",
        ] {
            assert!(phone().is_match(sample), "{sample}");
        }
        assert!(!phone().is_match("00 23 45 67 89"));
        assert!(!phone().is_match("75002"));
    }

    #[test]
    fn test_phone_pattern_ignores_longer_digit_runs() {
        assert!(!phone().is_match("SIRET 80312345678900"));
        assert!(!phone().is_match("réf. 012345678912"));
        let found: Vec<_> = phone()
            .find_iter("SIRET 80312345678900, tél. 04 78 00 00 01")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["04 78 00 00 01"]);
    }

    #[test]
    fn test_registry_patterns() {
        let caps = siret_labeled().captures("SIRET : 123 456 789 00012").unwrap();
        assert_eq!(caps[1].trim(), "123 456 789 00012");
        assert!(siret_spaced().is_match("n° 123 456 789 00012"));
        assert_eq!(&naf_labeled().captures("Code NAF : 56.10A").unwrap()[1], "56.10A");
        assert_eq!(&naf_bare().captures("activité 5610A").unwrap()[1], "5610A");
    }

    #[test]
    fn test_weekday_hours_is_greedy_within_line() {
        let m = weekday_hours()
            .find("Lundi 09h00 - 12h00, 14h00 - 18h00\nMardi fermé")
            .unwrap();
        assert_eq!(m.as_str(), "Lundi 09h00 - 12h00, 14h00 - 18h00");
    }
}
