//! JSON / CSV writers and the run summaries printed after each command.

use crate::core::error::Result;
use crate::core::types::Record;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Pretty-printed JSON array of records.
pub fn write_json(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    info!("wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// CSV text: header row in column order, every value quoted.
pub fn to_csv(records: &[Record]) -> String {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(
        Record::COLUMNS
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in records {
        rows.push(
            record
                .flat_values()
                .iter()
                .map(|(_, value)| quote(value))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    rows.join("\n")
}

/// Write the CSV export. An empty set writes nothing and returns `false`.
pub fn write_csv(path: &Path, records: &[Record]) -> Result<bool> {
    if records.is_empty() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_csv(records))?;
    info!("wrote CSV to {}", path.display());
    Ok(true)
}

/// `<dir>/<prefix>_<UTC timestamp>.json` and `.csv`, creating `dir`.
pub fn timestamped_paths(dir: &Path, prefix: &str) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let stamp = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let stem = format!("{prefix}_{stamp}");
    Ok((
        dir.join(format!("{stem}.json")),
        dir.join(format!("{stem}.csv")),
    ))
}

/// `<input stem>_enriched.json` beside the input file.
pub fn enriched_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    input.with_file_name(format!("{stem}_enriched.json"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    pub total: usize,
    pub pages: usize,
    pub with_phone: usize,
    pub with_email: usize,
    pub with_website: usize,
}

impl ScrapeStats {
    pub fn collect(records: &[Record], pages: usize) -> Self {
        Self {
            total: records.len(),
            pages,
            with_phone: records.iter().filter(|r| !r.telephone.is_empty()).count(),
            with_email: records.iter().filter(|r| !r.email.is_empty()).count(),
            with_website: records.iter().filter(|r| !r.site_web.is_empty()).count(),
        }
    }
}

impl fmt::Display for ScrapeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records:  {} ({} page(s))", self.total, self.pages)?;
        writeln!(f, "Phone:    {}", self.with_phone)?;
        writeln!(f, "Email:    {}", self.with_email)?;
        write!(f, "Website:  {}", self.with_website)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub total: usize,
    pub processed: usize,
    pub enriched: usize,
    pub with_siret: usize,
    pub with_gps: usize,
    pub with_hours: usize,
}

impl EnrichStats {
    pub fn collect(records: &[Record], processed: usize, enriched: usize) -> Self {
        Self {
            total: records.len(),
            processed,
            enriched,
            with_siret: records.iter().filter(|r| !r.siret.is_empty()).count(),
            with_gps: records
                .iter()
                .filter(|r| !r.latitude.is_empty() && !r.longitude.is_empty())
                .count(),
            with_hours: records
                .iter()
                .filter(|r| !r.horaires_ouverture.is_empty())
                .count(),
        }
    }
}

impl fmt::Display for EnrichStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records:   {}", self.total)?;
        writeln!(f, "Processed: {}", self.processed)?;
        writeln!(f, "Enriched:  {}", self.enriched)?;
        writeln!(f, "SIRET:     {}", self.with_siret)?;
        writeln!(f, "GPS:       {}", self.with_gps)?;
        write!(f, "Hours:     {}", self.with_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("annuaire-scout-{}", uuid::Uuid::new_v4()))
    }

    fn sample() -> Record {
        Record {
            denomination: "Le \"Petit\" Zinc".to_string(),
            url: "https://www.pagesjaunes.fr/pros/1".to_string(),
            telephone: "01 23 45 67 89".to_string(),
            telephone_raw: "0123456789".to_string(),
            photos: vec!["https://img.fr/a.jpg".to_string(), "https://img.fr/b.jpg".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_csv_quotes_every_value() {
        let csv = to_csv(&[sample()]);
        let mut lines = csv.split('\n');
        let header = lines.next().unwrap();
        assert!(header.starts_with("\"denomination\","));
        assert!(header.ends_with("\"photos\""));
        assert_eq!(header.split(',').count(), Record::COLUMNS.len());

        let row = lines.next().unwrap();
        assert!(row.starts_with(r#""Le ""Petit"" Zinc","#));
        assert!(row.ends_with(r#""https://img.fr/a.jpg, https://img.fr/b.jpg""#));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_set_writes_no_csv() {
        let dir = scratch_dir();
        let path = dir.join("out.csv");
        assert!(!write_csv(&path, &[]).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_json_export_reloads() {
        let dir = scratch_dir();
        let path = dir.join("out.json");
        write_json(&path, &[sample()]).unwrap();
        let back: Vec<Record> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![sample()]);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_output_paths() {
        let dir = scratch_dir();
        let (json, csv) = timestamped_paths(&dir, "annuaire").unwrap();
        assert!(dir.is_dir());
        let name = json.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("annuaire_") && name.ends_with(".json"));
        assert_eq!(json.with_extension("csv"), csv);
        std::fs::remove_dir_all(dir).ok();

        assert_eq!(
            enriched_output_path(Path::new("/data/garages.json")),
            PathBuf::from("/data/garages_enriched.json")
        );
    }

    #[test]
    fn test_stats() {
        let mut other = sample();
        other.telephone.clear();
        other.latitude = "48.1".to_string();
        other.longitude = "2.3".to_string();
        let s = ScrapeStats::collect(&[sample(), other.clone()], 2);
        assert_eq!((s.total, s.with_phone, s.with_email), (2, 1, 0));
        let e = EnrichStats::collect(&[sample(), other], 2, 1);
        assert_eq!(e.with_gps, 1);
        assert_eq!(e.with_siret, 0);
    }
}
