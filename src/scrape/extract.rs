//! Detail-page field extraction
//!
//! One [`FieldExtractor`] runs an ordered cascade of strategies over a detail
//! page: a structured pass over label/value markup first, then a regex pass
//! over the visible text. The first strategy that yields a valid value wins
//! for that field, independent of the other fields. Numeric values outside
//! their domain ranges are expected noise in scraped data and are discarded
//! silently, leaving the field unset.

use crate::record::{Citizenship, DetailFields, Status};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Label synonyms for the structured strategy, matched case-insensitively
/// as substrings of the label text.
const GPA_LABELS: &[&str] = &["gpa", "grade point average"];
const VERBAL_LABELS: &[&str] = &["gre v", "verbal"];
const QUANT_LABELS: &[&str] = &["gre q", "quant"];
const WRITING_LABELS: &[&str] = &["gre aw", "writing", "analytical"];
const TERM_LABELS: &[&str] = &["term", "season", "semester"];
const CITIZENSHIP_LABELS: &[&str] = &["citizenship", "student type", "country of origin"];
const TOTAL_LABELS: &[&str] = &["gre total"];
const COMMENT_LABELS: &[&str] = &["comment", "note"];

/// Comments shorter than this are assumed to be labels or navigation noise
const MIN_COMMENT_LEN: usize = 30;
const MAX_COMMENT_LEN: usize = 5000;

/// Boilerplate markers that disqualify a text block as a comment
const COMMENT_DENYLIST: &[&str] = &[
    "copyright",
    "all rights reserved",
    "privacy policy",
    "terms of use",
    "search results",
    "sign up",
    "log in",
];

static GPA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)GPA[:\s]+(\d+\.?\d*)").expect("gpa regex is valid"));
static VERBAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:GRE\s+)?V(?:erbal)?[:\s]+(\d{3})").expect("verbal regex is valid")
});
static QUANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:GRE\s+)?Q(?:uant)?[:\s]+(\d{3})").expect("quant regex is valid")
});
static WRITING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:GRE\s+)?(?:AW|Writing)[:\s]+(\d+\.?\d*)").expect("writing regex is valid")
});
static TERM_LABELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Term|Season|Semester)[:\s]+((?:Fall|Spring|Summer|Winter)\s+\d{4})")
        .expect("labeled term regex is valid")
});
static TERM_BARE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b((?:Fall|Spring|Summer|Winter)\s+\d{4})\b").expect("term regex is valid")
});
static TERM_SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(su|f|s|w)\s*(\d{2})$").expect("short term regex is valid"));
static TERM_FULL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(fall|spring|summer|winter)\s+(\d{2,4})$").expect("full term regex is valid")
});
static INTERNATIONAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\binternational\b").expect("citizenship regex is valid"));
static AMERICAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:american|domestic|u\.?s\.?)\b").expect("citizenship regex is valid")
});
static FIRST_FLOAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.?\d*)").expect("float regex is valid"));
static FIRST_INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("int regex is valid"));
static LABEL_ECHO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(gpa|gre|term|season|semester|citizenship|student type)\b.{0,50}$")
        .expect("label echo regex is valid")
});

type Strategy = fn(&Html, &str) -> DetailFields;

/// Cascading field extractor for detail pages
///
/// Consolidates what used to be many near-identical parser variants into one
/// ordered strategy list; each strategy is independently testable.
pub struct FieldExtractor {
    strategies: Vec<Strategy>,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self {
            strategies: vec![extract_structured, extract_from_text],
        }
    }

    /// Extracts detail-only fields from one detail page's HTML
    ///
    /// Always returns a [`DetailFields`]; a page that yields nothing comes
    /// back all-null, never as an error that would abort the caller.
    pub fn extract(&self, html: &str) -> DetailFields {
        let doc = Html::parse_document(html);
        let text = visible_text(&doc);

        let mut fields = DetailFields::default();
        for strategy in &self.strategies {
            fields.fill_missing(strategy(&doc, &text));
        }

        if fields.comments.is_none() {
            fields.comments = extract_comment_block(&doc);
        }

        // Derived total: verbal + quant, unless a structured total was found
        if fields.gre_total.is_none() {
            if let (Some(v), Some(q)) = (fields.gre_verbal, fields.gre_quant) {
                fields.gre_total = Some(v + q);
            }
        }

        fields
    }
}

// ===== Strategy A: structured label/value markup =====

/// Extracts fields from definition lists, two-column tables, and short
/// `Label: Value` text elements.
fn extract_structured(doc: &Html, _text: &str) -> DetailFields {
    let pairs = collect_label_values(doc);
    let mut fields = DetailFields::default();

    fields.gpa = lookup(&pairs, GPA_LABELS).and_then(|v| first_float(&v)).and_then(valid_gpa);
    fields.gre_verbal = lookup(&pairs, VERBAL_LABELS)
        .and_then(|v| first_int(&v))
        .and_then(valid_gre_subscore);
    fields.gre_quant = lookup(&pairs, QUANT_LABELS)
        .and_then(|v| first_int(&v))
        .and_then(valid_gre_subscore);
    fields.gre_aw = lookup(&pairs, WRITING_LABELS)
        .and_then(|v| first_float(&v))
        .and_then(valid_gre_aw);
    fields.gre_total = lookup(&pairs, TOTAL_LABELS)
        .and_then(|v| first_int(&v))
        .filter(|&v| v > 200);
    fields.term = lookup(&pairs, TERM_LABELS).and_then(|v| normalize_term(&v));
    fields.citizenship = lookup(&pairs, CITIZENSHIP_LABELS)
        // A decision status in the citizenship slot is misaligned markup
        .filter(|v| Status::parse(v).is_none())
        .and_then(|v| Citizenship::canonicalize(&v));
    fields.comments = lookup(&pairs, COMMENT_LABELS).filter(|v| v.len() > 10);

    fields
}

/// Collects (label, value) pairs from the page's structured markup,
/// in document order with labels lowercased.
fn collect_label_values(doc: &Html) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    // Two-column table rows
    if let (Ok(row_sel), Ok(cell_sel)) = (Selector::parse("table tr"), Selector::parse("td, th")) {
        for row in doc.select(&row_sel) {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            if cells.len() >= 2 {
                push_pair(&mut pairs, &element_text(&cells[0]), &element_text(&cells[1]));
            }
        }
    }

    // Definition lists
    if let (Ok(dl_sel), Ok(dt_sel), Ok(dd_sel)) = (
        Selector::parse("dl"),
        Selector::parse("dt"),
        Selector::parse("dd"),
    ) {
        for dl in doc.select(&dl_sel) {
            let dts: Vec<ElementRef<'_>> = dl.select(&dt_sel).collect();
            let dds: Vec<ElementRef<'_>> = dl.select(&dd_sel).collect();
            for (dt, dd) in dts.iter().zip(dds.iter()) {
                push_pair(&mut pairs, &element_text(dt), &element_text(dd));
            }
        }
    }

    // Short "Label: Value" elements
    if let Ok(labeled_sel) = Selector::parse("div, span, p, li") {
        for el in doc.select(&labeled_sel) {
            let text = element_text(&el);
            if text.len() < 200 {
                if let Some((label, value)) = text.split_once(':') {
                    push_pair(&mut pairs, label, value);
                }
            }
        }
    }

    pairs
}

fn push_pair(pairs: &mut Vec<(String, String)>, label: &str, value: &str) {
    let label = label.trim().to_lowercase();
    let value = value.trim().to_string();
    if !label.is_empty() && !value.is_empty() {
        pairs.push((label, value));
    }
}

/// Returns the value of the first pair whose label contains any synonym
fn lookup(pairs: &[(String, String)], synonyms: &[&str]) -> Option<String> {
    pairs
        .iter()
        .find(|(label, _)| synonyms.iter().any(|syn| label.contains(syn)))
        .map(|(_, value)| value.clone())
}

// ===== Strategy B: regex over visible text =====

/// Extracts fields by scanning the full visible text with per-field patterns
fn extract_from_text(_doc: &Html, text: &str) -> DetailFields {
    let mut fields = DetailFields::default();

    fields.gpa = GPA_RE
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .and_then(valid_gpa);
    fields.gre_verbal = VERBAL_RE
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
        .and_then(valid_gre_subscore);
    fields.gre_quant = QUANT_RE
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
        .and_then(valid_gre_subscore);
    fields.gre_aw = WRITING_RE
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .and_then(valid_gre_aw);

    fields.term = TERM_LABELED_RE
        .captures(text)
        .or_else(|| TERM_BARE_RE.captures(text))
        .and_then(|c| normalize_term(&c[1]));

    fields.citizenship = if INTERNATIONAL_RE.is_match(text) {
        Some(Citizenship::International)
    } else if AMERICAN_RE.is_match(text) {
        Some(Citizenship::American)
    } else {
        None
    };

    fields
}

// ===== Validation =====

/// GPA domain is (0, 4.5]; exact 0 is a placeholder, not a real grade
fn valid_gpa(v: f64) -> Option<f64> {
    (v > 0.0 && v <= 4.5).then_some(v)
}

/// GRE verbal/quant domain is [130, 170]
fn valid_gre_subscore(v: u32) -> Option<u32> {
    (130..=170).contains(&v).then_some(v)
}

/// GRE analytical writing domain is [0, 6]
fn valid_gre_aw(v: f64) -> Option<f64> {
    (0.0..=6.0).contains(&v).then_some(v)
}

fn first_float(text: &str) -> Option<f64> {
    let cleaned = text.replace("n/a", "").replace("N/A", "");
    FIRST_FLOAT_RE
        .captures(&cleaned)
        .and_then(|c| c[1].parse().ok())
}

fn first_int(text: &str) -> Option<u32> {
    let cleaned = text.replace("n/a", "").replace("N/A", "");
    FIRST_INT_RE
        .captures(&cleaned)
        .and_then(|c| c[1].parse().ok())
}

// ===== Term normalization =====

/// Normalizes a raw term signal to canonical `"{Season} {YYYY}"`
///
/// Accepts full forms in any case ("fall 2026", "FALL  2026") and compact
/// forms with 2-digit years ("F26" -> "Fall 2026", "Su25" -> "Summer 2025").
pub fn normalize_term(raw: &str) -> Option<String> {
    let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(caps) = TERM_FULL_RE.captures(&trimmed) {
        let season = capitalize_season(&caps[1])?;
        let year = expand_year(&caps[2])?;
        return Some(format!("{} {}", season, year));
    }

    if let Some(caps) = TERM_SHORT_RE.captures(&trimmed) {
        let season = match caps[1].to_lowercase().as_str() {
            "f" => "Fall",
            "s" => "Spring",
            "su" => "Summer",
            "w" => "Winter",
            _ => return None,
        };
        let year = expand_year(&caps[2])?;
        return Some(format!("{} {}", season, year));
    }

    None
}

fn capitalize_season(raw: &str) -> Option<&'static str> {
    match raw.to_lowercase().as_str() {
        "fall" => Some("Fall"),
        "spring" => Some("Spring"),
        "summer" => Some("Summer"),
        "winter" => Some("Winter"),
        _ => None,
    }
}

/// Expands 2-digit years into the 2000s; 4-digit years pass through
fn expand_year(raw: &str) -> Option<u32> {
    let year: u32 = raw.parse().ok()?;
    match raw.len() {
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

// ===== Comments =====

/// Finds the first substantial text block that is not boilerplate
fn extract_comment_block(doc: &Html) -> Option<String> {
    let block_sel = Selector::parse("div, p, blockquote, td").ok()?;

    for el in doc.select(&block_sel) {
        if in_page_chrome(&el) {
            continue;
        }
        let text = element_text(&el);
        if text.len() < MIN_COMMENT_LEN || text.len() >= MAX_COMMENT_LEN {
            continue;
        }
        let lower = text.to_lowercase();
        if COMMENT_DENYLIST.iter().any(|marker| lower.contains(marker)) {
            continue;
        }
        if LABEL_ECHO_RE.is_match(&text) {
            continue;
        }
        return Some(text);
    }

    None
}

/// True when the element sits inside navigation, header, footer, or scripts
fn in_page_chrome(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "nav" | "header" | "footer" | "script"))
}

// ===== Shared helpers =====

fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn visible_text(doc: &Html) -> String {
    doc.root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}
