//! Row parser for the results listing
//!
//! Extracts the listing-visible fields of one candidate record from one table
//! row. The listing markup is inconsistent across site revisions, so each
//! field falls back through a small ordered list of heuristics. Rows without
//! a detail link (or with too few cells) are discarded rather than partially
//! recorded. No network I/O happens here.

use crate::record::{ResultRecord, Status};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use url::Url;

/// Rows with fewer cells than this are not result rows (header, spacer, ads)
const MIN_COLUMNS: usize = 4;

/// Marker shared by every record's detail link
const DETAIL_LINK_MARKER: &str = "/result/";

static STATUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Accepted|Rejected|Interview|Wait\s?listed|Other)\b(?:\s+on\s+(.+))?")
        .expect("status regex is valid")
});

/// Parses one listing row into a [`ResultRecord`]
///
/// Returns `None` when the row has no detail link or fewer than the minimum
/// expected number of columns. All detail-only fields start unset.
pub fn parse_row(row: ElementRef<'_>, base_url: &Url) -> Option<ResultRecord> {
    let td_selector = Selector::parse("td").ok()?;
    let cells: Vec<ElementRef<'_>> = row.select(&td_selector).collect();
    if cells.len() < MIN_COLUMNS {
        return None;
    }

    // The detail link is the record's identity; without it the row is dropped
    let entry_url = extract_detail_link(row, base_url)?;

    let university = extract_university(&cells[0]);
    let (program_name, degree_level) = extract_program(&cells[1]);
    let date_added = non_empty(cell_text(&cells[2]));
    let (status, status_date) = extract_status(&cells[3]);

    Some(ResultRecord::from_listing(
        program_name,
        university,
        date_added,
        Some(entry_url),
        status,
        status_date,
        degree_level,
    ))
}

/// Finds the row's detail link and resolves it against the listing URL
fn extract_detail_link(row: ElementRef<'_>, base_url: &Url) -> Option<String> {
    let a_selector = Selector::parse("a[href]").ok()?;
    for anchor in row.select(&a_selector) {
        if let Some(href) = anchor.value().attr("href") {
            if href.contains(DETAIL_LINK_MARKER) {
                if let Ok(resolved) = base_url.join(href) {
                    return Some(resolved.to_string());
                }
            }
        }
    }
    None
}

/// Extracts the university name from the first cell
///
/// Tries the known label classes first; falls back to the first non-empty
/// text line of the cell.
fn extract_university(cell: &ElementRef<'_>) -> Option<String> {
    let marker_selector =
        Selector::parse("div.tw-font-medium, div.font-medium, span.font-medium").ok()?;

    if let Some(marked) = cell.select(&marker_selector).next() {
        return non_empty(collapse_whitespace(&text_of(&marked)));
    }

    cell.text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .and_then(|line| non_empty(collapse_whitespace(line)))
}

/// Extracts program name and degree level from the second cell
///
/// The structured form nests two spans inside a div (program, then degree);
/// when absent, the cell's raw text becomes the program name alone.
fn extract_program(cell: &ElementRef<'_>) -> (Option<String>, Option<String>) {
    if let Ok(span_selector) = Selector::parse("div span") {
        let spans: Vec<ElementRef<'_>> = cell.select(&span_selector).collect();
        if !spans.is_empty() {
            let program = non_empty(collapse_whitespace(&text_of(&spans[0])));
            let degree = spans
                .get(1)
                .and_then(|s| non_empty(collapse_whitespace(&text_of(s))));
            return (program, degree);
        }
    }

    (non_empty(cell_text(cell)), None)
}

/// Extracts the decision status and its optional date from the fourth cell
fn extract_status(cell: &ElementRef<'_>) -> (Option<Status>, Option<String>) {
    let block = cell_text(cell);
    match STATUS_RE.captures(&block) {
        Some(caps) => {
            let status = caps.get(1).and_then(|m| Status::parse(m.as_str()));
            let status_date = caps
                .get(2)
                .and_then(|m| non_empty(collapse_whitespace(m.as_str())));
            (status, status_date)
        }
        None => (None, None),
    }
}

/// Concatenated text of an element's descendants
fn text_of(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Cell text with inner whitespace collapsed to single spaces
fn cell_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
