//! JSON and delimited (CSV/TSV) writers for scraped records.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use bottledb_core::{DetailBottleRecord, FlavorTier};
use serde::Serialize;

/// Positional flavor columns per secondary/tertiary tier.
const FLAVOR_SLOTS: usize = 4;

/// Column order of the delimited output.
pub(crate) const HEADER: [&str; 32] = [
    "href",
    "brand",
    "name",
    "category",
    "rating",
    "price",
    "style",
    "region",
    "country",
    "distillery",
    "alcoholPercent",
    "volume",
    "age",
    "singleCask",
    "maturation",
    "totalRatings",
    "reviewRatings",
    "nonReviewRatings",
    "avgReviewRatingValue",
    "flavors.primary",
    "flavors.secondary.1",
    "flavors.secondary.2",
    "flavors.secondary.3",
    "flavors.secondary.4",
    "flavors.tertiary.1",
    "flavors.tertiary.2",
    "flavors.tertiary.3",
    "flavors.tertiary.4",
    "appearance",
    "flavor",
    "smell",
    "finish",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
    Csv,
    Tsv,
}

impl Delimiter {
    fn separator(self) -> char {
        match self {
            Delimiter::Csv => ',',
            Delimiter::Tsv => '\t',
        }
    }
}

/// Writes `value` as pretty-printed JSON, creating parent directories.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value).context("failed to serialize records")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote JSON output");
    Ok(())
}

/// Writes the header and one row per record to `path`.
pub(crate) fn write_delimited_file(
    path: &Path,
    records: &[DetailBottleRecord],
    delimiter: Delimiter,
) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_delimited(&mut writer, records, delimiter)
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = records.len(), "wrote delimited output");
    Ok(())
}

pub(crate) fn write_delimited<W: Write>(
    mut w: W,
    records: &[DetailBottleRecord],
    delimiter: Delimiter,
) -> io::Result<()> {
    let sep = delimiter.separator();
    let header: Vec<String> = HEADER.iter().map(|h| (*h).to_owned()).collect();
    write_row(&mut w, &header, sep)?;
    for record in records {
        write_row(&mut w, &record_to_row(record), sep)?;
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{sep}")?;
        }
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

/// Empty for NaN and infinities.
fn number_cell(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

fn text_cell(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn flavor_slots(record: &DetailBottleRecord, tier: FlavorTier) -> Vec<String> {
    let bucket = record.flavor_spiral.bucket(tier);
    if bucket.len() > FLAVOR_SLOTS {
        tracing::warn!(
            href = %record.basic.href,
            tier = ?tier,
            count = bucket.len(),
            omitted = bucket.len() - FLAVOR_SLOTS,
            "more flavors than delimited columns; extras only appear in JSON"
        );
    }
    let mut slots: Vec<String> = bucket.iter().take(FLAVOR_SLOTS).cloned().collect();
    slots.resize(FLAVOR_SLOTS, String::new());
    slots
}

/// Flattens a record into cells in [`HEADER`] order.
pub(crate) fn record_to_row(record: &DetailBottleRecord) -> Vec<String> {
    let basic = &record.basic;
    let mut row = vec![
        basic.href.clone(),
        basic.brand.clone(),
        basic.name.clone(),
        basic.category.clone(),
        number_cell(basic.rating),
        number_cell(basic.price),
        text_cell(record.style.as_ref()),
        text_cell(record.region.as_ref()),
        text_cell(record.country.as_ref()),
        text_cell(record.distillery.as_ref()),
        text_cell(record.alcohol_percent.as_ref()),
        text_cell(record.volume.as_ref()),
        text_cell(record.age.as_ref()),
        text_cell(record.single_cask.as_ref()),
        text_cell(record.maturation.as_ref()),
    ];

    match &record.ratings {
        Some(stats) => row.extend([
            stats.total_ratings.to_string(),
            stats.review_ratings.to_string(),
            stats.non_review_ratings.to_string(),
            number_cell(stats.avg_review_rating_value),
        ]),
        None => row.extend(std::iter::repeat_n(String::new(), 4)),
    }

    row.push(record.flavor_spiral.primary.join("; "));
    row.extend(flavor_slots(record, FlavorTier::Secondary));
    row.extend(flavor_slots(record, FlavorTier::Tertiary));

    let notes = &record.tasting_notes;
    row.extend([
        text_cell(notes.appearance.as_ref()),
        text_cell(notes.flavor.as_ref()),
        text_cell(notes.smell.as_ref()),
        text_cell(notes.finish.as_ref()),
    ]);
    row
}

#[cfg(test)]
mod tests {
    use bottledb_core::{BasicBottleRecord, FlavorSpiral, RatingStatistics, TastingNotes};

    use super::*;

    fn record() -> DetailBottleRecord {
        DetailBottleRecord {
            basic: BasicBottleRecord {
                href: "https://flaviar.com/oban-14".into(),
                brand: "Oban".into(),
                name: "Oban 14 Year Old".into(),
                category: "Scotch".into(),
                rating: 8.3,
                price: 74.99,
            },
            style: Some("Single Malt".into()),
            region: Some("Highlands".into()),
            country: Some("Scotland".into()),
            distillery: Some("Oban".into()),
            alcohol_percent: Some("43%".into()),
            volume: Some("0.7l".into()),
            age: Some("14 years".into()),
            single_cask: None,
            maturation: None,
            ratings: Some(RatingStatistics {
                total_ratings: 855,
                review_ratings: 205,
                non_review_ratings: 650,
                avg_review_rating_value: 8.5,
            }),
            flavor_spiral: FlavorSpiral {
                primary: vec!["Peat".into(), "Smoke".into()],
                secondary: vec!["Sea Salt".into()],
                tertiary: vec![
                    "Oak".into(),
                    "Brine".into(),
                    "Lemon".into(),
                    "Honey".into(),
                    "Heather".into(),
                ],
            },
            tasting_notes: TastingNotes {
                appearance: Some("Golden amber".into()),
                smell: Some("Peat, sea salt".into()),
                flavor: Some("Dried fruit".into()),
                finish: None,
            },
        }
    }

    fn cell<'a>(row: &'a [String], column: &str) -> &'a str {
        let index = HEADER.iter().position(|h| *h == column).unwrap();
        &row[index]
    }

    #[test]
    fn row_matches_header_width() {
        assert_eq!(record_to_row(&record()).len(), HEADER.len());
    }

    #[test]
    fn row_cells_follow_header_order() {
        let row = record_to_row(&record());
        assert_eq!(cell(&row, "href"), "https://flaviar.com/oban-14");
        assert_eq!(cell(&row, "price"), "74.99");
        assert_eq!(cell(&row, "singleCask"), "");
        assert_eq!(cell(&row, "nonReviewRatings"), "650");
        assert_eq!(cell(&row, "avgReviewRatingValue"), "8.5");
        assert_eq!(cell(&row, "flavors.primary"), "Peat; Smoke");
        assert_eq!(cell(&row, "flavors.secondary.1"), "Sea Salt");
        assert_eq!(cell(&row, "flavors.secondary.2"), "");
        assert_eq!(cell(&row, "flavors.tertiary.4"), "Honey");
        assert_eq!(cell(&row, "smell"), "Peat, sea salt");
        assert_eq!(cell(&row, "finish"), "");
    }

    #[test]
    fn tertiary_overflow_is_omitted() {
        let row = record_to_row(&record());
        assert!(!row.iter().any(|c| c == "Heather"));
    }

    #[test]
    fn nan_and_missing_statistics_are_empty_cells() {
        let mut r = record();
        r.basic.price = f64::NAN;
        r.ratings = None;
        let row = record_to_row(&r);
        assert_eq!(cell(&row, "price"), "");
        assert_eq!(cell(&row, "totalRatings"), "");
        assert_eq!(cell(&row, "avgReviewRatingValue"), "");
    }

    #[test]
    fn csv_quotes_cells_containing_separator() {
        let mut out = Vec::new();
        write_delimited(&mut out, &[record()], Delimiter::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), HEADER.join(","));
        let data = lines.next().unwrap();
        assert!(data.starts_with("https://flaviar.com/oban-14,Oban,Oban 14 Year Old,Scotch,8.3,74.99,"));
        assert!(data.contains(",\"Peat, sea salt\","));
    }

    #[test]
    fn tsv_leaves_commas_unquoted() {
        let mut out = Vec::new();
        write_delimited(&mut out, &[record()], Delimiter::Tsv).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("href\tbrand\tname"));
        assert!(text.contains("\tPeat, sea salt\t"));
    }

    #[test]
    fn quotes_are_doubled() {
        let mut out = Vec::new();
        write_row(&mut out, &["say \"hi\"".to_string(), "plain".to_string()], ',').unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"say \"\"hi\"\"\",plain\n");
    }

    #[test]
    fn json_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("output.json");
        write_json(&path, &[record()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"nonReviewRatings\": 650"));
        let back: Vec<DetailBottleRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, vec![record()]);
    }

    #[test]
    fn delimited_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.tsv");
        write_delimited_file(&path, &[record(), record()], Delimiter::Tsv).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
