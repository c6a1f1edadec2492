use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

/// Separator between display phone numbers in `telephone`.
pub const PHONE_SEPARATOR: &str = " ; ";
/// Separator between normalized numbers in `telephone_raw`.
pub const RAW_PHONE_SEPARATOR: &str = ";";
/// Upper bound on `photos`.
pub const MAX_PHOTOS: usize = 10;

/// Columns a detail-page visit may overwrite even when already populated.
pub const OVERWRITABLE_COLUMNS: &[&str] = &[
    "siret",
    "siren",
    "code_naf",
    "capital",
    "dirigeant",
    "date_creation",
    "effectif",
    "services",
    "facebook",
    "instagram",
    "twitter",
    "linkedin",
];

/// Columns never sourced on their own: they follow `siret` / `telephone`.
const DERIVED_COLUMNS: &[&str] = &["siren", "telephone_raw"];

macro_rules! record_schema {
    ($( $field:ident => $column:literal ),+ $(,)?) => {
        /// One business listing in canonical form.
        ///
        /// Every text column defaults to the empty string; `photos` is the only
        /// list. Serialized column names match the historical export format.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct Record {
            $(
                #[serde(rename = $column)]
                pub $field: String,
            )+
            #[serde(deserialize_with = "deserialize_photos")]
            pub photos: Vec<String>,
        }

        impl Record {
            /// Export column order (text columns, then `photos`).
            pub const COLUMNS: &'static [&'static str] = &[$($column,)+ "photos"];

            /// Text columns paired with their values, in export order.
            pub fn text_fields(&self) -> Vec<(&'static str, &str)> {
                vec![$(($column, self.$field.as_str())),+]
            }

            fn text_fields_mut(&mut self) -> Vec<(&'static str, &mut String)> {
                vec![$(($column, &mut self.$field)),+]
            }
        }
    };
}

record_schema! {
    denomination => "denomination",
    url => "url",
    email => "email",
    telephone => "telephone",
    telephone_raw => "telephone_raw",
    site_web => "site_web",
    adresse => "adresse",
    code_postal => "codePostal",
    ville => "ville",
    adresse_full_long => "adresse_full_long",
    latitude => "latitude",
    longitude => "longitude",
    siret => "siret",
    siren => "siren",
    code_naf => "code_naf",
    capital => "capital",
    forme_juridique => "forme_juridique",
    dirigeant => "dirigeant",
    date_creation => "date_creation",
    effectif => "effectif",
    nombre_employes => "nombre_employes",
    chiffre_affaires => "chiffre_affaires",
    activite => "activite",
    categorie => "categorie",
    description => "description",
    services => "services",
    equipements => "equipements",
    moyens_paiement => "moyens_paiement",
    marques => "marques",
    langues => "langues",
    certifications => "certifications",
    tarifs => "tarifs",
    prix_moyen => "prix_moyen",
    rating => "basicInfo_place_rating",
    review_count => "basicInfo_place_nb_review",
    horaires_ouverture => "horaires_ouverture",
    facebook => "facebook",
    twitter => "twitter",
    linkedin => "linkedin",
    instagram => "instagram",
    logo => "logo",
}

fn noise_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\d+\s+photos?$").expect("valid noise regex"))
}

/// Strip display separators from a phone number, keeping a leading `+`.
pub fn normalize_phone(display: &str) -> String {
    let trimmed = display.trim();
    let mut raw = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        raw.push('+');
    }
    raw.extend(trimmed.chars().filter(|c| c.is_ascii_digit()));
    raw
}

impl Record {
    /// Identity check applied before a record joins any result set.
    pub fn has_identity(&self) -> bool {
        let name = self.denomination.trim();
        !name.is_empty() && !self.url.trim().is_empty() && !noise_name_re().is_match(name)
    }

    /// Key used by page-level and traversal-level deduplication.
    pub fn dedup_key(&self) -> (String, String) {
        (self.url.clone(), self.denomination.clone())
    }

    /// Set `telephone` and its normalized twin from an ordered list of numbers.
    pub fn set_phones(&mut self, phones: &[String]) {
        let phones: Vec<&str> = phones
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        self.telephone = phones.join(PHONE_SEPARATOR);
        self.telephone_raw = phones
            .iter()
            .map(|p| normalize_phone(p))
            .collect::<Vec<_>>()
            .join(RAW_PHONE_SEPARATOR);
    }

    /// Set `siret` and re-derive `siren` from it.
    pub fn set_siret(&mut self, siret: &str) {
        self.siret = siret.trim().to_string();
        self.sync_siren();
    }

    /// `siren` is the first 9 characters of a non-empty `siret`, empty otherwise.
    pub fn sync_siren(&mut self) {
        self.siren = if self.siret.is_empty() {
            String::new()
        } else {
            self.siret.chars().take(9).collect()
        };
    }

    /// Display numbers held in `telephone`, in order.
    pub fn phones(&self) -> impl Iterator<Item = &str> {
        self.telephone
            .split(PHONE_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Number of entries in `telephone` / `telephone_raw` (always equal).
    pub fn phone_count(&self) -> usize {
        self.phones().count()
    }

    /// Copy non-empty values from `patch` into `self`.
    ///
    /// A populated column is only replaced when it is listed in
    /// [`OVERWRITABLE_COLUMNS`]. `telephone_raw` travels with `telephone`
    /// and `siren` is re-derived from `siret`. Returns the columns that changed.
    pub fn merge_from(&mut self, patch: &Record) -> Vec<&'static str> {
        let mut changed = Vec::new();

        for ((column, current), (_, incoming)) in self
            .text_fields_mut()
            .into_iter()
            .zip(patch.text_fields())
        {
            if incoming.is_empty() || DERIVED_COLUMNS.contains(&column) {
                continue;
            }
            let may_write = current.is_empty() || OVERWRITABLE_COLUMNS.contains(&column);
            if may_write && current.as_str() != incoming {
                *current = incoming.to_string();
                changed.push(column);
            }
        }

        if changed.contains(&"telephone") {
            let patch_raw_count = patch.telephone_raw.split(RAW_PHONE_SEPARATOR).count();
            self.telephone_raw = if !patch.telephone_raw.is_empty()
                && patch_raw_count == patch.phone_count()
            {
                patch.telephone_raw.clone()
            } else {
                self.phones()
                    .map(normalize_phone)
                    .collect::<Vec<_>>()
                    .join(RAW_PHONE_SEPARATOR)
            };
            changed.push("telephone_raw");
        }

        if changed.contains(&"siret") {
            self.sync_siren();
            changed.push("siren");
        }

        if self.photos.is_empty() && !patch.photos.is_empty() {
            self.photos = patch.photos.iter().take(MAX_PHOTOS).cloned().collect();
            changed.push("photos");
        }

        changed
    }

    /// Flat `(column, value)` view used by the CSV writer.
    pub fn flat_values(&self) -> Vec<(&'static str, String)> {
        let mut values: Vec<(&'static str, String)> = self
            .text_fields()
            .into_iter()
            .map(|(column, value)| (column, value.to_string()))
            .collect();
        values.push(("photos", self.photos.join(", ")));
        values
    }
}

/// Accepts `photos` either as a JSON array or as a `", "`-joined string.
fn deserialize_photos<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Photos {
        List(Vec<String>),
        Joined(String),
        Missing(Option<()>),
    }

    Ok(match Photos::deserialize(deserializer)? {
        Photos::List(list) => list,
        Photos::Joined(joined) => joined
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Photos::Missing(_) => Vec::new(),
    })
}

/// How a freshly produced batch combines with the set accumulated so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnrichMode {
    /// The new batch replaces the accumulated set.
    #[default]
    Replace,
    /// New records are appended unless their `url` is already present.
    Append,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, url: &str) -> Record {
        Record {
            denomination: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_rejects_photo_counters_and_blanks() {
        assert!(named("Boulangerie Martin", "https://x.fr/pros/1").has_identity());
        assert!(!named("12 photos", "https://x.fr/pros/1").has_identity());
        assert!(!named("1 Photo", "https://x.fr/pros/1").has_identity());
        assert!(!named("", "https://x.fr/pros/1").has_identity());
        assert!(!named("Boulangerie", "").has_identity());
    }

    #[test]
    fn test_set_phones_keeps_raw_cardinality() {
        let mut r = Record::default();
        r.set_phones(&["01 23 45 67 89".to_string(), "06.11.22.33.44".to_string()]);
        assert_eq!(r.telephone, "01 23 45 67 89 ; 06.11.22.33.44");
        assert_eq!(r.telephone_raw, "0123456789;0611223344");
        assert_eq!(r.phone_count(), 2);
        assert_eq!(r.phone_count(), r.telephone_raw.split(RAW_PHONE_SEPARATOR).count());
    }

    #[test]
    fn test_phone_count_splits_on_display_separator() {
        let mut r = named("A", "u");
        r.telephone = "04 78 00 00 01;04 78 00 00 02".to_string();
        assert_eq!(r.phone_count(), 1);
        r.telephone = "04 78 00 00 01 ; 04 78 00 00 02".to_string();
        assert_eq!(r.phone_count(), 2);
        r.telephone.clear();
        assert_eq!(r.phone_count(), 0);
    }

    #[test]
    fn test_merge_rebuilds_raw_phones_from_display_entries() {
        let mut target = named("A", "u");
        let patch = Record {
            telephone: "01 23 45 67 89 ; +33 6 11 22 33 44".to_string(),
            ..Default::default()
        };
        target.merge_from(&patch);
        assert_eq!(target.telephone_raw, "0123456789;+33611223344");
    }

    #[test]
    fn test_normalize_phone_keeps_international_prefix() {
        assert_eq!(normalize_phone("+33 1 23 45 67 89"), "+33123456789");
        assert_eq!(normalize_phone("01-23-45-67-89"), "0123456789");
    }

    #[test]
    fn test_siren_follows_siret() {
        let mut r = Record::default();
        r.set_siret("12345678900012");
        assert_eq!(r.siren, "123456789");
        r.set_siret("");
        assert_eq!(r.siren, "");
    }

    #[test]
    fn test_merge_fills_only_empty_columns() {
        let mut target = named("Chez Paul", "https://x.fr/pros/1");
        target.ville = "Lyon".into();
        target.facebook = "https://facebook.com/old".into();

        let mut patch = Record::default();
        patch.ville = "Paris".into();
        patch.code_postal = "75002".into();
        patch.facebook = "https://facebook.com/chezpaul".into();
        patch.set_siret("12345678900012");

        let changed = target.merge_from(&patch);
        assert_eq!(target.ville, "Lyon");
        assert_eq!(target.code_postal, "75002");
        assert_eq!(target.facebook, "https://facebook.com/chezpaul");
        assert_eq!(target.siren, "123456789");
        assert!(changed.contains(&"siret"));
        assert!(!changed.contains(&"ville"));
    }

    #[test]
    fn test_merge_never_touches_identity() {
        let mut target = named("Chez Paul", "https://x.fr/pros/1");
        let patch = named("Autre nom", "https://x.fr/pros/2");
        assert!(target.merge_from(&patch).is_empty());
        assert_eq!(target.denomination, "Chez Paul");
    }

    #[test]
    fn test_merge_phone_pair_moves_together() {
        let mut target = named("A", "u");
        let mut patch = Record::default();
        patch.set_phones(&["+33 1 23 45 67 89".to_string()]);
        target.merge_from(&patch);
        assert_eq!(target.telephone, "+33 1 23 45 67 89");
        assert_eq!(target.telephone_raw, "+33123456789");
    }

    #[test]
    fn test_photos_accept_joined_string() {
        let r: Record = serde_json::from_str(
            r#"{"denomination":"A","url":"u","photos":"https://a/1.jpg, https://a/2.jpg"}"#,
        )
        .unwrap();
        assert_eq!(r.photos, vec!["https://a/1.jpg", "https://a/2.jpg"]);

        let r: Record = serde_json::from_str(r#"{"denomination":"A","photos":null}"#).unwrap();
        assert!(r.photos.is_empty());
    }

    #[test]
    fn test_serialized_column_names() {
        let mut r = named("A", "u");
        r.code_postal = "75002".into();
        r.rating = "4.5".into();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["codePostal"], "75002");
        assert_eq!(json["basicInfo_place_rating"], "4.5");
        assert_eq!(Record::COLUMNS.len(), r.flat_values().len());
    }
}
