//! Data model for admission-outcome records
//!
//! A [`ResultRecord`] is created by the row parser with all detail-only
//! fields unset, then enriched in place by the detail fetch pool. The merge
//! is monotonic: a non-null field is never overwritten with null.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Admission decision as shown on the results listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Accepted,
    Rejected,
    Interview,
    Waitlisted,
    Other,
}

impl Status {
    /// Parses a status from listing text, normalizing "Wait listed" to
    /// [`Status::Waitlisted`]. Matching is case-insensitive.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase();
        match normalized.as_str() {
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "interview" => Some(Self::Interview),
            "wait listed" | "waitlisted" => Some(Self::Waitlisted),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Interview => "Interview",
            Self::Waitlisted => "Waitlisted",
            Self::Other => "Other",
        };
        write!(f, "{}", s)
    }
}

/// Canonical citizenship classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Citizenship {
    American,
    International,
    Other,
}

impl Citizenship {
    /// Canonicalizes a free-text citizenship signal.
    ///
    /// Substring match, case-insensitive: "international" wins over the
    /// American markers, any other non-empty signal maps to Other, and an
    /// empty signal yields None.
    pub fn canonicalize(text: &str) -> Option<Self> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if lower.contains("international") {
            Some(Self::International)
        } else if lower.contains("american") || lower.contains("domestic") || lower.contains("u.s")
        {
            Some(Self::American)
        } else {
            Some(Self::Other)
        }
    }
}

/// One admission-outcome entry, keyed by `entry_url`
///
/// Listing-origin fields are filled by the row parser; detail-origin fields
/// stay `None` until the detail fetch pool merges extracted values in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub program_name: Option<String>,
    pub university: Option<String>,
    pub date_added: Option<String>,
    /// Unique, stable key: the absolute URL of the record's detail page.
    pub entry_url: Option<String>,
    pub status: Option<Status>,
    pub status_date: Option<String>,
    pub degree_level: Option<String>,
    pub comments: Option<String>,
    /// Canonical `"{Season} {YYYY}"`, e.g. "Fall 2026".
    pub term: Option<String>,
    pub citizenship: Option<Citizenship>,
    /// Accepted only in (0, 4.5].
    pub gpa: Option<f64>,
    /// Sum of verbal and quant when both are present.
    pub gre_total: Option<u32>,
    /// Accepted only in [130, 170].
    pub gre_verbal: Option<u32>,
    /// Accepted only in [130, 170].
    pub gre_quant: Option<u32>,
    /// Accepted only in [0, 6].
    pub gre_aw: Option<f64>,
}

impl ResultRecord {
    /// Creates a record with only listing-visible fields set.
    pub fn from_listing(
        program_name: Option<String>,
        university: Option<String>,
        date_added: Option<String>,
        entry_url: Option<String>,
        status: Option<Status>,
        status_date: Option<String>,
        degree_level: Option<String>,
    ) -> Self {
        Self {
            program_name,
            university,
            date_added,
            entry_url,
            status,
            status_date,
            degree_level,
            comments: None,
            term: None,
            citizenship: None,
            gpa: None,
            gre_total: None,
            gre_verbal: None,
            gre_quant: None,
            gre_aw: None,
        }
    }

    /// Merges extracted detail fields into this record.
    ///
    /// Monotonic: each field is overwritten only when the extracted value is
    /// non-null. An all-null [`DetailFields`] leaves the record unchanged.
    pub fn merge_detail(&mut self, detail: &DetailFields) {
        if detail.comments.is_some() {
            self.comments = detail.comments.clone();
        }
        if detail.term.is_some() {
            self.term = detail.term.clone();
        }
        if detail.citizenship.is_some() {
            self.citizenship = detail.citizenship;
        }
        if detail.gpa.is_some() {
            self.gpa = detail.gpa;
        }
        if detail.gre_total.is_some() {
            self.gre_total = detail.gre_total;
        }
        if detail.gre_verbal.is_some() {
            self.gre_verbal = detail.gre_verbal;
        }
        if detail.gre_quant.is_some() {
            self.gre_quant = detail.gre_quant;
        }
        if detail.gre_aw.is_some() {
            self.gre_aw = detail.gre_aw;
        }
    }
}

/// Detail-only fields extracted from one detail page
///
/// All fields are optional; a page that yields nothing (or cannot be fetched
/// at all) is represented by the default all-null value, never by an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailFields {
    pub comments: Option<String>,
    pub term: Option<String>,
    pub citizenship: Option<Citizenship>,
    pub gpa: Option<f64>,
    pub gre_total: Option<u32>,
    pub gre_verbal: Option<u32>,
    pub gre_quant: Option<u32>,
    pub gre_aw: Option<f64>,
}

impl DetailFields {
    /// Fills unset fields from `other`, keeping existing values.
    ///
    /// Used by the extraction cascade: the first strategy that yields a value
    /// wins for that field, independent of the other fields.
    pub fn fill_missing(&mut self, other: DetailFields) {
        if self.comments.is_none() {
            self.comments = other.comments;
        }
        if self.term.is_none() {
            self.term = other.term;
        }
        if self.citizenship.is_none() {
            self.citizenship = other.citizenship;
        }
        if self.gpa.is_none() {
            self.gpa = other.gpa;
        }
        if self.gre_total.is_none() {
            self.gre_total = other.gre_total;
        }
        if self.gre_verbal.is_none() {
            self.gre_verbal = other.gre_verbal;
        }
        if self.gre_quant.is_none() {
            self.gre_quant = other.gre_quant;
        }
        if self.gre_aw.is_none() {
            self.gre_aw = other.gre_aw;
        }
    }

    /// Returns true when every field is unset.
    pub fn is_empty(&self) -> bool {
        self.comments.is_none()
            && self.term.is_none()
            && self.citizenship.is_none()
            && self.gpa.is_none()
            && self.gre_total.is_none()
            && self.gre_verbal.is_none()
            && self.gre_quant.is_none()
            && self.gre_aw.is_none()
    }
}
