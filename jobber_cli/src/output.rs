use anyhow::Result;
use jobber_lib::{FeedOutcome, Posting, PostingRow};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

const TITLE_WIDTH: usize = 60;

#[derive(Tabled, Serialize)]
struct StoredRow {
    #[tabled(rename = "Stored")]
    #[serde(rename = "Stored")]
    created_at: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    payment_type: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Query")]
    #[serde(rename = "Query")]
    search_query: String,
    #[tabled(rename = "URL")]
    #[serde(rename = "URL")]
    url: String,
}

#[derive(Tabled, Serialize)]
struct ExtractedRow {
    #[tabled(rename = "Title")]
    #[serde(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    payment_type: String,
    #[tabled(rename = "Price")]
    #[serde(rename = "Price")]
    price: String,
    #[tabled(rename = "Duration")]
    #[serde(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Skills")]
    #[serde(rename = "Skills")]
    skills: String,
    #[tabled(rename = "Excluded By")]
    #[serde(rename = "Excluded By")]
    excluded_by: String,
    #[tabled(rename = "URL")]
    #[serde(rename = "URL")]
    url: String,
}

#[derive(Tabled, Serialize)]
struct ReportRow {
    #[tabled(rename = "Feed")]
    #[serde(rename = "Feed")]
    feed: String,
    #[tabled(rename = "Candidates")]
    #[serde(rename = "Candidates")]
    candidates: usize,
    #[tabled(rename = "Invalid")]
    #[serde(rename = "Invalid")]
    invalid: usize,
    #[tabled(rename = "Excluded")]
    #[serde(rename = "Excluded")]
    excluded: usize,
    #[tabled(rename = "Duplicates")]
    #[serde(rename = "Duplicates")]
    duplicates: usize,
    #[tabled(rename = "Persisted")]
    #[serde(rename = "Persisted")]
    persisted: usize,
    #[tabled(rename = "Notified")]
    #[serde(rename = "Notified")]
    notified: usize,
    #[tabled(rename = "Failed Sends")]
    #[serde(rename = "Failed Sends")]
    delivery_failures: usize,
    #[tabled(rename = "Error")]
    #[serde(rename = "Error")]
    error: String,
}

/// A posting from an offline parse plus the phrase that excluded it, if any.
pub struct Extracted<'a> {
    pub posting: &'a Posting,
    pub excluded_by: Option<&'a str>,
}

// -- Row builders --

fn build_stored_rows(rows: &[PostingRow]) -> Vec<StoredRow> {
    rows.iter()
        .map(|r| StoredRow {
            created_at: r.created_at_utc.format("%Y-%m-%d %H:%M").to_string(),
            payment_type: r.payment_type.to_string(),
            price: r.price.clone().unwrap_or_default(),
            title: truncate(r.title.as_deref().unwrap_or_default(), TITLE_WIDTH),
            search_query: r.search_query.clone(),
            url: r.url.clone(),
        })
        .collect()
}

fn build_extracted_rows(items: &[Extracted<'_>]) -> Vec<ExtractedRow> {
    items
        .iter()
        .map(|item| ExtractedRow {
            title: truncate(&item.posting.title, TITLE_WIDTH),
            payment_type: item.posting.payment_type.to_string(),
            price: item.posting.price.clone(),
            duration: item.posting.duration.clone(),
            skills: item.posting.skills.join(", "),
            excluded_by: item.excluded_by.unwrap_or_default().to_string(),
            url: item.posting.url.clone(),
        })
        .collect()
}

fn build_report_rows(outcomes: &[FeedOutcome]) -> Vec<ReportRow> {
    outcomes
        .iter()
        .map(|o| {
            let report = o.result.as_ref().ok().cloned().unwrap_or_default();
            ReportRow {
                feed: o.feed.clone(),
                candidates: report.candidates,
                invalid: report.invalid,
                excluded: report.excluded,
                duplicates: report.duplicates,
                persisted: report.persisted,
                notified: report.notified,
                delivery_failures: report.delivery_failures,
                error: o
                    .result
                    .as_ref()
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

// -- Printers --

pub fn print_stored(rows: &[PostingRow], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&rows),
        _ => print_rows(build_stored_rows(rows), format)?,
    }
    Ok(())
}

pub fn print_extracted(items: &[Extracted<'_>], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct JsonItem<'a> {
                #[serde(flatten)]
                posting: &'a Posting,
                excluded_by: Option<&'a str>,
            }
            let data: Vec<JsonItem<'_>> = items
                .iter()
                .map(|i| JsonItem {
                    posting: i.posting,
                    excluded_by: i.excluded_by,
                })
                .collect();
            print_json(&data);
        }
        _ => print_rows(build_extracted_rows(items), format)?,
    }
    Ok(())
}

pub fn print_reports(outcomes: &[FeedOutcome], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct JsonOutcome<'a> {
                feed: &'a str,
                report: Option<&'a jobber_lib::RunReport>,
                error: Option<String>,
            }
            let data: Vec<JsonOutcome<'_>> = outcomes
                .iter()
                .map(|o| JsonOutcome {
                    feed: &o.feed,
                    report: o.result.as_ref().ok(),
                    error: o.result.as_ref().err().map(|e| e.to_string()),
                })
                .collect();
            print_json(&data);
        }
        _ => print_rows(build_report_rows(outcomes), format)?,
    }
    Ok(())
}

fn print_rows<T: Tabled + Serialize>(rows: Vec<T>, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", Table::new(rows));
        }
    }
    Ok(())
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}
