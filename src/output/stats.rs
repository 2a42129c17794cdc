//! Field coverage statistics
//!
//! Scraped detail fields are sparse; the coverage report shows how many
//! records actually carry each normalized field, which is the fastest way to
//! spot a broken extraction heuristic after a site revision.

use crate::record::ResultRecord;

/// Per-field population counts over one record set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCoverage {
    pub total: usize,
    pub comments: usize,
    pub term: usize,
    pub citizenship: usize,
    pub gpa: usize,
    pub gre_verbal: usize,
    pub gre_quant: usize,
    pub gre_aw: usize,
    pub gre_total: usize,
    pub status: usize,
}

impl FieldCoverage {
    /// Percentage of records carrying the given count, 0 when empty
    pub fn percent(&self, count: usize) -> usize {
        if self.total == 0 {
            0
        } else {
            count * 100 / self.total
        }
    }
}

/// Computes coverage over a record set
pub fn compute_coverage(records: &[ResultRecord]) -> FieldCoverage {
    let mut coverage = FieldCoverage {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        if record.comments.is_some() {
            coverage.comments += 1;
        }
        if record.term.is_some() {
            coverage.term += 1;
        }
        if record.citizenship.is_some() {
            coverage.citizenship += 1;
        }
        if record.gpa.is_some() {
            coverage.gpa += 1;
        }
        if record.gre_verbal.is_some() {
            coverage.gre_verbal += 1;
        }
        if record.gre_quant.is_some() {
            coverage.gre_quant += 1;
        }
        if record.gre_aw.is_some() {
            coverage.gre_aw += 1;
        }
        if record.gre_total.is_some() {
            coverage.gre_total += 1;
        }
        if record.status.is_some() {
            coverage.status += 1;
        }
    }

    coverage
}

/// Prints a human-readable coverage table
pub fn print_coverage(coverage: &FieldCoverage) {
    println!("Total records: {}", coverage.total);
    println!();
    println!("Field coverage:");

    let rows = [
        ("Status", coverage.status),
        ("Comments", coverage.comments),
        ("Term", coverage.term),
        ("Citizenship", coverage.citizenship),
        ("GPA", coverage.gpa),
        ("GRE Verbal", coverage.gre_verbal),
        ("GRE Quant", coverage.gre_quant),
        ("GRE AW", coverage.gre_aw),
        ("GRE Total", coverage.gre_total),
    ];

    for (name, count) in rows {
        println!(
            "  {:12} {:5} / {} ({:3}%)",
            name,
            count,
            coverage.total,
            coverage.percent(count)
        );
    }
}
