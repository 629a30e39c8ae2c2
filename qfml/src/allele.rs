use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::BufRead;

use log::{debug, info, warn};

use crate::growable::{GrowError, GrowableBuffer};
use crate::key_index::KeyIndex;
use crate::params::PipelineParams;
use crate::tsv::{parse_prefixed_id, TsvReader, TsvReaderError};

/// Error occurring when loading the site/allele/probability table.
#[derive(Debug)]
pub enum AlleleLoaderError {
    Reader(TsvReaderError),
    Grow(GrowError),
    /// A line has fewer than three fields.
    MissingField { line: usize, field: &'static str },
    /// The probability field is not a floating-point number.
    InvalidProbability { line: usize, value: String },
    /// The rows of a site are not contiguous.
    UnsortedSites { site: String, line: usize },
    /// The number of sites differs from the number of genotype columns.
    SiteCountMismatch { expected: usize, actual: usize },
}

impl AlleleLoaderError {
    #[must_use]
    pub fn missing_field(line: usize, field: &'static str) -> Self {
        Self::MissingField { line, field }
    }

    #[must_use]
    pub fn invalid_probability<T: Into<String>>(line: usize, value: T) -> Self {
        Self::InvalidProbability {
            line,
            value: value.into(),
        }
    }
}

impl From<TsvReaderError> for AlleleLoaderError {
    fn from(e: TsvReaderError) -> Self {
        Self::Reader(e)
    }
}

impl From<GrowError> for AlleleLoaderError {
    fn from(e: GrowError) -> Self {
        Self::Grow(e)
    }
}

impl Display for AlleleLoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AlleleLoaderError::Reader(e) => {
                write!(f, "Could not read allele probability table: {}", e)
            }
            AlleleLoaderError::Grow(e) => write!(f, "Could not grow allele buffer: {}", e),
            AlleleLoaderError::MissingField { line, field } => {
                write!(f, "Missing {} field at line {}", field, line)
            }
            AlleleLoaderError::InvalidProbability { line, value } => {
                write!(f, "Invalid probability `{}` at line {}", value, line)
            }
            AlleleLoaderError::UnsortedSites { site, line } => write!(
                f,
                "Site `{}` reappears at line {}; rows of a site must be contiguous",
                site, line
            ),
            AlleleLoaderError::SiteCountMismatch { expected, actual } => write!(
                f,
                "Site count mismatch: the genotype table has {} sites, the allele table has {}",
                expected, actual
            ),
        }
    }
}

impl Error for AlleleLoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AlleleLoaderError::Reader(e) => Some(e),
            AlleleLoaderError::Grow(e) => Some(e),
            _ => None,
        }
    }
}

/// A candidate allele at a site, with its probability.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AlleleProb {
    pub id: u32,
    pub prob: f64,
}

impl AlleleProb {
    #[must_use]
    pub fn new(id: u32, prob: f64) -> Self {
        Self { id, prob }
    }
}

/// All candidate alleles of a single site, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    id: String,
    alleles: Vec<AlleleProb>,
}

impl SiteRecord {
    #[must_use]
    pub fn new<T: Into<String>>(id: T, alleles: Vec<AlleleProb>) -> Self {
        Self {
            id: id.into(),
            alleles,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn alleles(&self) -> &[AlleleProb] {
        &self.alleles
    }

    #[inline]
    #[must_use]
    pub fn num_alleles(&self) -> usize {
        self.alleles.len()
    }
}

/// Site records in file order, indexed by site identifier.
#[derive(Debug, Clone, Default)]
pub struct SiteTable {
    sites: Vec<SiteRecord>,
    index: KeyIndex<usize>,
}

impl SiteTable {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Returns the `n`-th site in file order.
    #[must_use]
    pub fn get(&self, n: usize) -> Option<&SiteRecord> {
        self.sites.get(n)
    }

    /// Returns the position of the site with the given identifier.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.lookup(id).copied()
    }

    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&SiteRecord> {
        self.position(id).map(|n| &self.sites[n])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SiteRecord> {
        self.sites.iter()
    }

    /// Total number of alleles over all sites.
    #[must_use]
    pub fn total_alleles(&self) -> usize {
        self.sites.iter().map(SiteRecord::num_alleles).sum()
    }

    fn push(&mut self, site: SiteRecord, start_line: usize) -> Result<(), AlleleLoaderError> {
        self.index
            .insert(site.id.as_str(), self.sites.len())
            .map_err(|e| AlleleLoaderError::UnsortedSites {
                site: e.0,
                line: start_line,
            })?;
        self.sites.push(site);

        Ok(())
    }
}

/// Alleles of the site currently being read. Nothing reads the buffer until
/// it is flushed into a [`SiteRecord`].
#[derive(Debug)]
struct SiteAccumulator {
    site: Option<(String, usize)>,
    alleles: GrowableBuffer<AlleleProb>,
}

impl SiteAccumulator {
    fn new(initial_alleles: usize) -> Result<Self, GrowError> {
        Ok(Self {
            site: None,
            alleles: GrowableBuffer::with_capacity(initial_alleles)?,
        })
    }

    fn is_current(&self, site_id: &str) -> bool {
        matches!(&self.site, Some((id, _)) if id == site_id)
    }

    fn open(&mut self, site_id: &str, line: usize) {
        self.site = Some((site_id.to_owned(), line));
    }

    /// Moves the accumulated alleles into `table`. The allele buffer is
    /// replaced by a fresh allocation, so no two records share storage.
    fn flush(&mut self, table: &mut SiteTable) -> Result<(), AlleleLoaderError> {
        if let Some((id, start_line)) = self.site.take() {
            let mut alleles = self.alleles.take()?;
            alleles.shrink_to_fit();
            debug!("Site `{}` has {} alleles", id, alleles.len());

            table.push(SiteRecord::new(id, alleles), start_line)?;
        }

        Ok(())
    }
}

/// Streams an allele probability table into a [`SiteTable`].
///
/// The rows of every site must be contiguous. Each row holds a site
/// identifier, a `<prefix><integer-id>` allele token and a probability.
#[derive(Debug)]
pub struct AlleleGroupLoader<'a> {
    params: &'a PipelineParams,
}

impl<'a> AlleleGroupLoader<'a> {
    #[must_use]
    pub fn new(params: &'a PipelineParams) -> Self {
        Self { params }
    }

    /// Loads the table and checks that it describes exactly
    /// `expected_sites` sites.
    pub fn load<R: BufRead>(
        &self,
        reader: R,
        expected_sites: usize,
    ) -> Result<SiteTable, AlleleLoaderError> {
        let notifier = self.params.progress_notifier();
        let mut tsv_reader = TsvReader::new(reader);
        notifier.processed_bytes(tsv_reader.skip_header()?);

        let mut table = SiteTable::default();
        let mut accumulator = SiteAccumulator::new(self.params.initial_alleles)?;

        while let Some(line) = tsv_reader.read_line()? {
            let mut fields = line.fields();
            let site_id = fields
                .next()
                .ok_or_else(|| AlleleLoaderError::missing_field(line.number(), "site"))?;
            let allele_token = fields
                .next()
                .ok_or_else(|| AlleleLoaderError::missing_field(line.number(), "allele"))?;
            let prob_str = fields
                .next()
                .ok_or_else(|| AlleleLoaderError::missing_field(line.number(), "probability"))?;

            let allele_id = parse_prefixed_id(allele_token);
            if allele_id.is_lenient() {
                warn!(
                    "Malformed allele token `{}` at line {}; using {}",
                    allele_token,
                    line.number(),
                    allele_id.value()
                );
            }
            let prob: f64 = prob_str
                .parse()
                .map_err(|_| AlleleLoaderError::invalid_probability(line.number(), prob_str))?;

            if !accumulator.is_current(site_id) {
                accumulator.flush(&mut table)?;
                accumulator.open(site_id, line.number());
            }
            accumulator
                .alleles
                .push(AlleleProb::new(allele_id.value(), prob))?;

            notifier.processed_bytes(line.size());
        }
        notifier.processed_bytes(tsv_reader.take_trailing_bytes());
        accumulator.flush(&mut table)?;

        info!(
            "Loaded {} alleles at {} sites",
            table.total_alleles(),
            table.len()
        );
        if table.len() != expected_sites {
            return Err(AlleleLoaderError::SiteCountMismatch {
                expected: expected_sites,
                actual: table.len(),
            });
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use approx::assert_relative_eq;

    use crate::_internal_test_data::{MANY_ALLELES_TSV, SIMPLE_ALLELES_TSV};
    use crate::allele::{AlleleGroupLoader, AlleleLoaderError, AlleleProb, SiteTable};
    use crate::growable::GrowError;
    use crate::params::PipelineParams;

    fn load(input: &str, expected_sites: usize) -> Result<SiteTable, AlleleLoaderError> {
        let params = PipelineParams::default();
        AlleleGroupLoader::new(&params).load(input.as_bytes(), expected_sites)
    }

    #[test]
    fn groups_contiguous_rows() {
        let table = load("site\tallele\tprob\nS1\tR-1\t0.2\nS1\tR-2\t0.8\nS2\tR-1\t1.0\n", 2).unwrap();

        assert_eq!(table.len(), 2);
        let s1 = table.get(0).unwrap();
        assert_eq!(s1.id(), "S1");
        assert_eq!(s1.alleles(), &[AlleleProb::new(1, 0.2), AlleleProb::new(2, 0.8)]);
        let s2 = table.get(1).unwrap();
        assert_eq!(s2.id(), "S2");
        assert_eq!(s2.alleles(), &[AlleleProb::new(1, 1.0)]);
    }

    #[test]
    fn sites_are_indexed_by_id() {
        let table = load(SIMPLE_ALLELES_TSV, 2).unwrap();

        assert_eq!(table.position("site_1"), Some(0));
        assert_eq!(table.position("site_2"), Some(1));
        assert_eq!(table.lookup("site_2").unwrap().num_alleles(), 2);
        assert!(table.lookup("site_3").is_none());
        assert_eq!(table.total_alleles(), 5);
    }

    #[test]
    fn allele_buffer_grows_past_initial_capacity() {
        let params = PipelineParams::builder().initial_alleles(2).build();
        let table = AlleleGroupLoader::new(&params)
            .load(MANY_ALLELES_TSV.as_bytes(), 2)
            .unwrap();

        let big = table.lookup("big").unwrap();
        assert_eq!(big.num_alleles(), 9);
        for (n, allele) in big.alleles().iter().enumerate() {
            assert_eq!(allele.id, n as u32);
            assert_relative_eq!(allele.prob, n as f64 / 10.0);
        }
        assert_eq!(table.lookup("small").unwrap().alleles(), &[AlleleProb::new(3, 1.0)]);
    }

    #[test]
    fn unsorted_sites_are_rejected() {
        let error = load("h\nS1\tR-1\t0.5\nS2\tR-1\t0.5\nS1\tR-2\t0.5\n", 2).unwrap_err();

        assert!(matches!(
            error,
            AlleleLoaderError::UnsortedSites { ref site, line: 4 } if site == "S1"
        ));
    }

    #[test]
    fn site_count_mismatch() {
        let error = load(SIMPLE_ALLELES_TSV, 3).unwrap_err();

        assert!(matches!(
            error,
            AlleleLoaderError::SiteCountMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn empty_table() {
        let table = load("site\tallele\tprob\n", 0).unwrap();

        assert!(table.is_empty());
    }

    #[test]
    fn missing_probability() {
        let error = load("h\nS1\tR-1\n", 1).unwrap_err();

        assert!(matches!(
            error,
            AlleleLoaderError::MissingField {
                line: 2,
                field: "probability"
            }
        ));
    }

    #[test]
    fn tab_only_lines_are_skipped() {
        let table = load("h\n\t\t\nS1\tR-1\t1.0\n", 1).unwrap();

        assert_eq!(table.get(0).unwrap().alleles(), &[AlleleProb::new(1, 1.0)]);
    }

    #[test]
    fn invalid_probability() {
        let error = load("h\nS1\tR-1\tabc\n", 1).unwrap_err();

        assert!(matches!(
            error,
            AlleleLoaderError::InvalidProbability { line: 2, ref value } if value == "abc"
        ));
    }

    #[test]
    fn malformed_allele_token_reads_as_zero() {
        let table = load("h\nS1\tRX\t0.5\n", 1).unwrap();

        assert_eq!(table.get(0).unwrap().alleles(), &[AlleleProb::new(0, 0.5)]);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", AlleleLoaderError::missing_field(3, "allele")),
            "Missing allele field at line 3"
        );
        assert_eq!(
            format!("{}", AlleleLoaderError::invalid_probability(4, "x")),
            "Invalid probability `x` at line 4"
        );
        assert_eq!(
            format!(
                "{}",
                AlleleLoaderError::SiteCountMismatch {
                    expected: 1,
                    actual: 2
                }
            ),
            "Site count mismatch: the genotype table has 1 sites, the allele table has 2"
        );
    }

    #[test]
    fn test_error_source() {
        assert!(AlleleLoaderError::from(GrowError::CapacityOverflow)
            .source()
            .is_some());
        assert!(AlleleLoaderError::missing_field(1, "site").source().is_none());
    }
}
