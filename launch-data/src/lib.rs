use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header names of the input file. The loader resolves them positionally once
/// and then reads cells by index.
pub const COL_SITE: &str = "Launch Site";
pub const COL_PAYLOAD: &str = "Payload Mass (kg)";
pub const COL_OUTCOME: &str = "class";
pub const COL_BOOSTER: &str = "Booster Version Category";

/// Sentinel dropdown value meaning "no site filter applied".
pub const ALL_SITES: &str = "ALL";

/// Binary launch outcome, stored as `1`/`0` in the `class` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn from_class(value: u8) -> Option<Self> {
        match value {
            1 => Some(Outcome::Success),
            0 => Some(Outcome::Failure),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Outcome::Success => 1,
            Outcome::Failure => 0,
        }
    }

    /// Stable label used for chart slices.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "Success",
            Outcome::Failure => "Failure",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One launch event. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub site: String,
    pub payload_mass_kg: f64,
    pub outcome: Outcome,
    pub booster_category: Option<String>,
}

/// Closed payload-mass interval `[low, high]` in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayloadRange {
    pub low: f64,
    pub high: f64,
}

impl PayloadRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Membership in the closed interval. An inverted range (`low > high`)
    /// contains nothing, so a caller error degrades to an empty result.
    pub fn contains(&self, mass_kg: f64) -> bool {
        mass_kg >= self.low && mass_kg <= self.high
    }
}

/// Site selection: the `ALL` sentinel or one concrete site name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteFilter {
    All,
    Site(String),
}

impl SiteFilter {
    pub fn parse(value: &str) -> Self {
        if value == ALL_SITES {
            SiteFilter::All
        } else {
            SiteFilter::Site(value.to_string())
        }
    }

    pub fn matches(&self, record: &LaunchRecord) -> bool {
        match self {
            SiteFilter::All => true,
            SiteFilter::Site(site) => record.site == *site,
        }
    }
}

/// Loader failures. Any of these is fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read dataset file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column {0:?} is missing")]
    MissingColumn(&'static str),
    #[error("row {row}: cannot parse {column:?} value {value:?}")]
    BadCell {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: negative payload mass {value}")]
    NegativePayload { row: usize, value: f64 },
    #[error("row {row}: outcome class {value} is not 0 or 1")]
    BadOutcome { row: usize, value: u8 },
    #[error("dataset contains no records")]
    Empty,
}

/// The loaded dataset: records plus derived values cached at construction.
/// Never mutated after load, so shared read-only handles need no locking.
#[derive(Debug, Clone)]
pub struct LaunchTable {
    records: Vec<LaunchRecord>,
    payload_bounds: PayloadRange,
    sites: Vec<String>,
}

impl LaunchTable {
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader(reader: impl Read) -> Result<Self, LoadError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();
        let column = |name: &'static str| -> Result<usize, LoadError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(LoadError::MissingColumn(name))
        };

        let site_idx = column(COL_SITE)?;
        let payload_idx = column(COL_PAYLOAD)?;
        let outcome_idx = column(COL_OUTCOME)?;
        // Optional column: absent header means no record carries a category.
        let booster_idx = headers.iter().position(|h| h == COL_BOOSTER);

        let mut records = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            // Data rows are 1-based after the header line.
            let row = i + 1;
            let raw = result?;

            let site = raw.get(site_idx).unwrap_or_default().trim().to_string();

            let payload_cell = raw.get(payload_idx).unwrap_or_default().trim();
            let payload_mass_kg: f64 =
                payload_cell.parse().map_err(|_| LoadError::BadCell {
                    row,
                    column: COL_PAYLOAD,
                    value: payload_cell.to_string(),
                })?;
            if payload_mass_kg < 0.0 {
                return Err(LoadError::NegativePayload {
                    row,
                    value: payload_mass_kg,
                });
            }

            let outcome_cell = raw.get(outcome_idx).unwrap_or_default().trim();
            let class: u8 = outcome_cell.parse().map_err(|_| LoadError::BadCell {
                row,
                column: COL_OUTCOME,
                value: outcome_cell.to_string(),
            })?;
            let outcome =
                Outcome::from_class(class).ok_or(LoadError::BadOutcome { row, value: class })?;

            let booster_category = booster_idx
                .and_then(|idx| raw.get(idx))
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(str::to_string);

            records.push(LaunchRecord {
                site,
                payload_mass_kg,
                outcome,
                booster_category,
            });
        }

        Self::from_records(records)
    }

    /// Build a table from already-parsed records (tests, fixtures).
    pub fn from_records(records: Vec<LaunchRecord>) -> Result<Self, LoadError> {
        if records.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;
        let mut sites: Vec<String> = Vec::new();
        for record in &records {
            low = low.min(record.payload_mass_kg);
            high = high.max(record.payload_mass_kg);
            if !sites.iter().any(|s| s == &record.site) {
                sites.push(record.site.clone());
            }
        }

        Ok(Self {
            records,
            payload_bounds: PayloadRange::new(low, high),
            sites,
        })
    }

    pub fn records(&self) -> &[LaunchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Global min/max payload mass, computed once at load.
    pub fn payload_bounds(&self) -> PayloadRange {
        self.payload_bounds
    }

    /// Distinct site names, ordered by first appearance in the file.
    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    /// The shared filtering path both chart handlers go through.
    pub fn filtered<'a>(
        &'a self,
        site: &'a SiteFilter,
        range: Option<&'a PayloadRange>,
    ) -> impl Iterator<Item = &'a LaunchRecord> + 'a {
        self.records.iter().filter(move |record| {
            site.matches(record)
                && range.is_none_or(|r| r.contains(record.payload_mass_kg))
        })
    }

    pub fn total_successes(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Outcome::Success)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Launch Site,Payload Mass (kg),class,Booster Version Category
CCAFS LC-40,2500,1,v1.0
CCAFS LC-40,500,0,v1.0
VAFB SLC-4E,3200,1,FT
KSC LC-39A,6100,1,
CCAFS LC-40,4000,0,B4
";

    fn sample_table() -> LaunchTable {
        LaunchTable::from_csv_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn loads_records_and_derived_values() {
        let table = sample_table();
        assert_eq!(table.len(), 5);
        assert_eq!(table.payload_bounds(), PayloadRange::new(500.0, 6100.0));
        assert_eq!(
            table.sites(),
            &["CCAFS LC-40", "VAFB SLC-4E", "KSC LC-39A"]
        );
        assert_eq!(table.total_successes(), 3);
    }

    #[test]
    fn empty_booster_cell_is_none() {
        let table = sample_table();
        assert_eq!(table.records()[3].booster_category, None);
        assert_eq!(table.records()[0].booster_category.as_deref(), Some("v1.0"));
    }

    #[test]
    fn booster_column_is_optional() {
        let csv = "Launch Site,Payload Mass (kg),class\nCCAFS LC-40,100,1\n";
        let table = LaunchTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records()[0].booster_category, None);
    }

    #[test]
    fn missing_required_column_fails() {
        let csv = "Launch Site,class\nCCAFS LC-40,1\n";
        let err = LaunchTable::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(COL_PAYLOAD)));
    }

    #[test]
    fn non_binary_outcome_fails() {
        let csv = "Launch Site,Payload Mass (kg),class\nCCAFS LC-40,100,2\n";
        let err = LaunchTable::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::BadOutcome { row: 1, value: 2 }));
    }

    #[test]
    fn negative_payload_fails() {
        let csv = "Launch Site,Payload Mass (kg),class\nCCAFS LC-40,-5,1\n";
        let err = LaunchTable::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::NegativePayload { row: 1, .. }));
    }

    #[test]
    fn unparseable_payload_fails() {
        let csv = "Launch Site,Payload Mass (kg),class\nCCAFS LC-40,heavy,1\n";
        let err = LaunchTable::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::BadCell {
                column: COL_PAYLOAD,
                ..
            }
        ));
    }

    #[test]
    fn header_only_file_is_empty_error() {
        let csv = "Launch Site,Payload Mass (kg),class,Booster Version Category\n";
        let err = LaunchTable::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }

    #[test]
    fn range_is_closed_and_inverted_range_is_empty() {
        let range = PayloadRange::new(500.0, 3200.0);
        assert!(range.contains(500.0));
        assert!(range.contains(3200.0));
        assert!(!range.contains(3200.1));

        let inverted = PayloadRange::new(3200.0, 500.0);
        assert!(!inverted.contains(1000.0));
    }

    #[test]
    fn filtered_applies_site_and_range() {
        let table = sample_table();
        let site = SiteFilter::parse("CCAFS LC-40");
        let range = PayloadRange::new(1000.0, 5000.0);

        let hits: Vec<_> = table.filtered(&site, Some(&range)).collect();
        assert_eq!(hits.len(), 2);
        assert!(hits
            .iter()
            .all(|r| r.site == "CCAFS LC-40" && range.contains(r.payload_mass_kg)));

        // Sentinel applies no site filter.
        let all: Vec<_> = table.filtered(&SiteFilter::All, None).collect();
        assert_eq!(all.len(), table.len());
    }

    #[test]
    fn full_range_returns_every_record() {
        let table = sample_table();
        let bounds = table.payload_bounds();
        let count = table.filtered(&SiteFilter::All, Some(&bounds)).count();
        assert_eq!(count, table.len());
    }
}
