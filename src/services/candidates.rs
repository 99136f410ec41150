//! Candidate NAS path generation.
//!
//! Pure and deterministic: the same inputs always produce the same
//! candidate list in the same order, so verification short-circuits on
//! the most likely directory first.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::PathCandidate;

/// Date hint for candidate generation.
#[derive(Debug, Clone)]
pub enum DateHint {
    /// The CI server reported the build start time; the publish folder is
    /// expected under that exact date.
    Exact(DateTime<Utc>),
    /// No reliable timestamp; generate a window around this date to absorb
    /// clock skew between CI and storage.
    Window(NaiveDate),
}

/// Generates plausible NAS directory paths for a build.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    base_path: String,
    date_spread: i64,
}

impl CandidateGenerator {
    pub fn new(base_path: impl Into<String>, date_spread: i64) -> Self {
        Self {
            base_path: base_path.into(),
            date_spread,
        }
    }

    /// NAS version-folder naming convention: `mr<version>`
    pub fn version_folder(version: &str) -> String {
        format!("mr{version}")
    }

    /// Fixed 6-digit YYMMDD folder name
    pub fn date_folder(date: NaiveDate) -> String {
        date.format("%y%m%d").to_string()
    }

    /// Generate ordered candidates for a build.
    ///
    /// An exact hint yields that date only. A window hint yields the hint
    /// date first, then alternating earlier/later days out to the spread.
    pub fn generate(&self, version: &str, build_number: i32, hint: &DateHint) -> Vec<PathCandidate> {
        match hint {
            DateHint::Exact(ts) => self.for_dates(version, build_number, &[ts.date_naive()]),
            DateHint::Window(center) => {
                let mut dates = vec![*center];
                for offset in 1..=self.date_spread {
                    dates.push(*center - chrono::Duration::days(offset));
                    dates.push(*center + chrono::Duration::days(offset));
                }
                self.for_dates(version, build_number, &dates)
            }
        }
    }

    /// Candidates for an explicit date list, in the order given.
    /// Duplicate dates are collapsed, keeping the first occurrence.
    pub fn for_dates(
        &self,
        version: &str,
        build_number: i32,
        dates: &[NaiveDate],
    ) -> Vec<PathCandidate> {
        let folder = Self::version_folder(version);
        let mut seen = Vec::new();
        let mut candidates = Vec::new();

        for &date in dates {
            if seen.contains(&date) {
                continue;
            }
            seen.push(date);
            let date_folder = Self::date_folder(date);
            candidates.push(PathCandidate {
                nas_path: format!(
                    "{}/{}/{}/{}",
                    self.base_path, folder, date_folder, build_number
                ),
                date_folder,
                build_number,
                date,
            });
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn generator() -> CandidateGenerator {
        CandidateGenerator::new("/release/product", 3)
    }

    #[test]
    fn exact_hint_yields_single_candidate() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 10, 17, 39, 0).unwrap();
        let candidates = generator().generate("3.0.0", 26, &DateHint::Exact(ts));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].nas_path, "/release/product/mr3.0.0/250310/26");
        assert_eq!(candidates[0].date_folder, "250310");
        assert_eq!(candidates[0].build_number, 26);
    }

    #[test]
    fn window_hint_orders_most_likely_first() {
        let center = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let candidates = generator().generate("3.0.0", 26, &DateHint::Window(center));
        let folders: Vec<&str> = candidates.iter().map(|c| c.date_folder.as_str()).collect();
        assert_eq!(
            folders,
            vec!["250310", "250309", "250311", "250308", "250312", "250307", "250313"]
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 10, 17, 39, 0).unwrap();
        let a = generator().generate("3.0.0", 26, &DateHint::Exact(ts));
        let b = generator().generate("3.0.0", 26, &DateHint::Exact(ts));
        assert_eq!(a, b);
    }

    #[test]
    fn window_spans_month_boundaries() {
        let center = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let candidates = generator().generate("3.0.0", 7, &DateHint::Window(center));
        assert_eq!(candidates[1].date_folder, "250228");
        assert_eq!(candidates[1].nas_path, "/release/product/mr3.0.0/250228/7");
    }

    #[test]
    fn explicit_dates_collapse_duplicates() {
        let d1 = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let candidates = generator().for_dates("3.0.0", 26, &[d1, d2, d1]);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn version_folder_convention() {
        assert_eq!(CandidateGenerator::version_folder("3.0.0"), "mr3.0.0");
    }
}
