use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::BufRead;

use log::{info, warn};

use crate::growable::{GrowError, GrowableBuffer, GrowableMatrix};
use crate::params::PipelineParams;
use crate::tsv::{parse_prefixed_id, TsvReader, TsvReaderError};

/// Error occurring when loading the cell/site genotype table.
#[derive(Debug)]
pub enum GenotypeLoaderError {
    Reader(TsvReaderError),
    Grow(GrowError),
}

impl From<TsvReaderError> for GenotypeLoaderError {
    fn from(e: TsvReaderError) -> Self {
        Self::Reader(e)
    }
}

impl From<GrowError> for GenotypeLoaderError {
    fn from(e: GrowError) -> Self {
        Self::Grow(e)
    }
}

impl Display for GenotypeLoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GenotypeLoaderError::Reader(e) => write!(f, "Could not read genotype table: {}", e),
            GenotypeLoaderError::Grow(e) => write!(f, "Could not grow genotype matrix: {}", e),
        }
    }
}

impl Error for GenotypeLoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GenotypeLoaderError::Reader(e) => Some(e),
            GenotypeLoaderError::Grow(e) => Some(e),
        }
    }
}

/// Genotype calls of every cell at every site.
#[derive(Debug, Clone)]
pub struct GenotypeTable {
    matrix: GrowableMatrix<u32>,
    cell_ids: Vec<String>,
    num_sites: usize,
    lenient_tokens: usize,
}

impl GenotypeTable {
    #[inline]
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cell_ids.len()
    }

    /// Number of site columns; the width of the widest row.
    #[inline]
    #[must_use]
    pub fn num_sites(&self) -> usize {
        self.num_sites
    }

    /// Identifiers of the cells, in row order.
    #[must_use]
    pub fn cell_ids(&self) -> &[String] {
        &self.cell_ids
    }

    #[must_use]
    pub fn cell_id(&self, cell: usize) -> &str {
        &self.cell_ids[cell]
    }

    /// Returns the state code of `cell` at `site`. Sites past the end of a
    /// shorter row read as 0.
    #[inline]
    #[must_use]
    pub fn get(&self, cell: usize, site: usize) -> u32 {
        debug_assert!(cell < self.num_cells() && site < self.num_sites);
        self.matrix.get(cell, site)
    }

    #[must_use]
    pub fn row(&self, cell: usize) -> &[u32] {
        &self.matrix.row(cell)[..self.num_sites]
    }

    /// Iterates over `(cell id, state codes)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.cell_ids
            .iter()
            .enumerate()
            .map(move |(cell, id)| (id.as_str(), self.row(cell)))
    }

    /// Number of genotype tokens whose integer suffix was malformed.
    #[must_use]
    pub fn lenient_tokens(&self) -> usize {
        self.lenient_tokens
    }
}

/// Streams a genotype table into a [`GenotypeTable`].
///
/// The first line is a header and is skipped. Every other line holds a cell
/// identifier followed by `<prefix><integer-id>` tokens, one per site.
#[derive(Debug)]
pub struct GenotypeTableLoader<'a> {
    params: &'a PipelineParams,
}

impl<'a> GenotypeTableLoader<'a> {
    #[must_use]
    pub fn new(params: &'a PipelineParams) -> Self {
        Self { params }
    }

    pub fn load<R: BufRead>(&self, reader: R) -> Result<GenotypeTable, GenotypeLoaderError> {
        let notifier = self.params.progress_notifier();
        let mut tsv_reader = TsvReader::new(reader);
        notifier.processed_bytes(tsv_reader.skip_header()?);

        let mut matrix =
            GrowableMatrix::new(self.params.initial_rows, self.params.initial_columns)?;
        let mut cell_ids = GrowableBuffer::with_capacity(self.params.initial_rows)?;
        let mut values = GrowableBuffer::with_capacity(self.params.initial_columns)?;
        let mut num_sites = 0;
        let mut lenient_tokens = 0;

        while let Some(line) = tsv_reader.read_line()? {
            let mut fields = line.fields();
            let cell_id = fields.next().unwrap_or_default();

            values.clear();
            for (site, token) in fields.enumerate() {
                let parsed = parse_prefixed_id(token);
                if parsed.is_lenient() {
                    warn!(
                        "Malformed genotype token `{}` at line {}, site {}; using {}",
                        token,
                        line.number(),
                        site,
                        parsed.value()
                    );
                    lenient_tokens += 1;
                }
                values.push(parsed.value())?;
            }

            let row = cell_ids.len();
            if row == matrix.row_capacity() {
                matrix.grow_rows()?;
            }
            while values.len() > matrix.col_capacity() {
                matrix.grow_columns()?;
            }
            for (site, &value) in values.iter().enumerate() {
                matrix.set(row, site, value);
            }

            cell_ids.push(cell_id.to_owned())?;
            num_sites = num_sites.max(values.len());
            notifier.processed_bytes(line.size());
        }
        notifier.processed_bytes(tsv_reader.take_trailing_bytes());

        let cell_ids = cell_ids.into_vec();
        info!(
            "Loaded genotypes of {} cells at {} sites",
            cell_ids.len(),
            num_sites
        );
        if lenient_tokens > 0 {
            warn!(
                "{} genotype tokens were malformed and read leniently",
                lenient_tokens
            );
        }

        Ok(GenotypeTable {
            matrix,
            cell_ids,
            num_sites,
            lenient_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::error::Error;
    use std::io::ErrorKind::NotFound;
    use std::rc::Rc;

    use crate::_internal_test_data::{SIMPLE_GENOTYPES_TSV, WIDE_GENOTYPES_TSV};
    use crate::genotype::{GenotypeLoaderError, GenotypeTableLoader};
    use crate::growable::GrowError;
    use crate::params::PipelineParams;
    use crate::progress::{ByteNum, ProgressNotifier};
    use crate::tsv::TsvReaderError;

    #[derive(Debug, Default)]
    struct ByteCounter(Cell<usize>);

    impl ProgressNotifier for ByteCounter {
        fn processed_bytes(&self, bytes: ByteNum) {
            self.0.set(self.0.get() + bytes.get());
        }

        fn set_tip_total(&self, _num_tips: u64) {}

        fn tip_registered(&self) {}
    }

    #[test]
    fn loads_simple_table() {
        let params = PipelineParams::default();
        let table = GenotypeTableLoader::new(&params)
            .load(SIMPLE_GENOTYPES_TSV.as_bytes())
            .unwrap();

        assert_eq!(table.num_cells(), 3);
        assert_eq!(table.num_sites(), 2);
        assert_eq!(table.cell_ids(), &["cell_a", "cell_b", "cell_c"]);
        assert_eq!(table.row(0), &[1, 2]);
        assert_eq!(table.row(1), &[0, 3]);
        assert_eq!(table.get(2, 0), 5);
        assert_eq!(table.lenient_tokens(), 0);
    }

    #[test]
    fn grows_rows_and_columns() {
        let params = PipelineParams::builder()
            .initial_rows(1)
            .initial_columns(1)
            .build();
        let table = GenotypeTableLoader::new(&params)
            .load(WIDE_GENOTYPES_TSV.as_bytes())
            .unwrap();

        assert_eq!(table.num_cells(), 5);
        assert_eq!(table.num_sites(), 5);
        for (cell, (id, row)) in table.rows().enumerate() {
            assert_eq!(id, format!("c{}", cell));
            let expected: Vec<u32> = (0..5).map(|site| (cell * 10 + site) as u32).collect();
            assert_eq!(row, expected.as_slice());
        }
    }

    #[test]
    fn shorter_rows_are_zero_filled() {
        let params = PipelineParams::builder().initial_columns(1).build();
        let input = "cell\ts1\ts2\ts3\nx\tR-1\ny\tR-2\tR-3\tR-4\n";
        let table = GenotypeTableLoader::new(&params)
            .load(input.as_bytes())
            .unwrap();

        assert_eq!(table.num_sites(), 3);
        assert_eq!(table.row(0), &[1, 0, 0]);
        assert_eq!(table.row(1), &[2, 3, 4]);
    }

    #[test]
    fn malformed_tokens_are_counted() {
        let params = PipelineParams::default();
        let input = "cell\ts1\ts2\nx\tR-abc\tR-4z\n";
        let table = GenotypeTableLoader::new(&params)
            .load(input.as_bytes())
            .unwrap();

        assert_eq!(table.row(0), &[0, 4]);
        assert_eq!(table.lenient_tokens(), 2);
    }

    #[test]
    fn header_only_table_is_empty() {
        let params = PipelineParams::default();
        let table = GenotypeTableLoader::new(&params)
            .load("cell\ts1\n".as_bytes())
            .unwrap();

        assert_eq!(table.num_cells(), 0);
        assert_eq!(table.num_sites(), 0);
    }

    #[test]
    fn skipped_lines_are_reported_as_processed() {
        let counter = Rc::new(ByteCounter::default());
        let params = PipelineParams::builder()
            .progress_notifier(counter.clone())
            .build();
        let input = "cell\ts1\n\t\t\nx\tR-1\n\n\n";
        let table = GenotypeTableLoader::new(&params)
            .load(input.as_bytes())
            .unwrap();

        assert_eq!(table.cell_ids(), &["x"]);
        assert_eq!(table.row(0), &[1]);
        assert_eq!(counter.0.get(), input.len());
    }

    #[test]
    fn header_is_never_parsed() {
        let params = PipelineParams::default();
        let table = GenotypeTableLoader::new(&params)
            .load("x\tR-9\ny\tR-1\n".as_bytes())
            .unwrap();

        assert_eq!(table.cell_ids(), &["y"]);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!(
                "{}",
                GenotypeLoaderError::from(TsvReaderError::InvalidUtf8 { line: 2 })
            ),
            "Could not read genotype table: Line 2 is not valid UTF-8"
        );
        assert_eq!(
            format!("{}", GenotypeLoaderError::from(GrowError::CapacityOverflow)),
            "Could not grow genotype matrix: Requested capacity overflows"
        );
    }

    #[test]
    fn test_error_source() {
        let error = GenotypeLoaderError::from(TsvReaderError::from(std::io::Error::from(NotFound)));

        assert!(error.source().is_some());
    }
}
