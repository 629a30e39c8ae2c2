use std::rc::Rc;

use crate::progress::{DummyProgressNotifier, ProgressNotifier};

/// Initial number of cell rows allocated for the genotype matrix.
pub const DEFAULT_INITIAL_ROWS: usize = 1000;
/// Initial number of site columns allocated for the genotype matrix.
pub const DEFAULT_INITIAL_COLUMNS: usize = 10;
/// Initial capacity of the per-site allele buffer.
pub const DEFAULT_INITIAL_ALLELES: usize = 3000;
pub const DEFAULT_RATE_CATEGORIES: u32 = 1;

/// Which genotype columns are registered into partitions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum SiteMode {
    /// Only the first site column, in a single partition.
    #[default]
    FirstSite,
    /// Every site column, one partition per site.
    AllSites,
}

/// A builder for [`PipelineParams`].
#[derive(Debug, Clone)]
pub struct PipelineParamsBuilder {
    initial_rows: usize,
    initial_columns: usize,
    initial_alleles: usize,
    rate_categories: u32,
    site_mode: SiteMode,
    progress_notifier: Rc<dyn ProgressNotifier>,
}

impl PipelineParamsBuilder {
    /// Returns a new instance of `PipelineParamsBuilder`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            initial_rows: DEFAULT_INITIAL_ROWS,
            initial_columns: DEFAULT_INITIAL_COLUMNS,
            initial_alleles: DEFAULT_INITIAL_ALLELES,
            rate_categories: DEFAULT_RATE_CATEGORIES,
            site_mode: SiteMode::default(),
            progress_notifier: Rc::new(DummyProgressNotifier),
        }
    }

    /// Sets the number of cell rows allocated before the matrix has to grow.
    pub fn initial_rows(&mut self, initial_rows: usize) -> &mut Self {
        self.initial_rows = initial_rows;
        self
    }

    /// Sets the number of site columns allocated before the matrix has to
    /// grow.
    pub fn initial_columns(&mut self, initial_columns: usize) -> &mut Self {
        self.initial_columns = initial_columns;
        self
    }

    /// Sets the number of alleles a site buffer holds before it has to grow.
    pub fn initial_alleles(&mut self, initial_alleles: usize) -> &mut Self {
        self.initial_alleles = initial_alleles;
        self
    }

    /// Sets the number of rate categories of the created partitions.
    pub fn rate_categories(&mut self, rate_categories: u32) -> &mut Self {
        self.rate_categories = rate_categories;
        self
    }

    pub fn site_mode(&mut self, site_mode: SiteMode) -> &mut Self {
        self.site_mode = site_mode;
        self
    }

    pub fn progress_notifier(&mut self, progress_notifier: Rc<dyn ProgressNotifier>) -> &mut Self {
        self.progress_notifier = progress_notifier;
        self
    }

    /// Builds and returns [`PipelineParams`].
    #[must_use]
    pub fn build(&self) -> PipelineParams {
        PipelineParams {
            initial_rows: self.initial_rows,
            initial_columns: self.initial_columns,
            initial_alleles: self.initial_alleles,
            rate_categories: self.rate_categories,
            site_mode: self.site_mode,
            progress_notifier: self.progress_notifier.clone(),
        }
    }
}

impl Default for PipelineParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Tunables of the loading pipeline.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub(crate) initial_rows: usize,
    pub(crate) initial_columns: usize,
    pub(crate) initial_alleles: usize,
    pub(crate) rate_categories: u32,
    pub(crate) site_mode: SiteMode,
    pub(crate) progress_notifier: Rc<dyn ProgressNotifier>,
}

impl PipelineParams {
    /// Returns new builder for `PipelineParams`.
    ///
    /// # Examples
    /// ```
    /// use qfml::params::{PipelineParams, SiteMode};
    ///
    /// let params = PipelineParams::builder()
    ///     .initial_rows(16)
    ///     .site_mode(SiteMode::AllSites)
    ///     .build();
    ///
    /// assert_eq!(params.initial_rows(), 16);
    /// assert_eq!(params.site_mode(), SiteMode::AllSites);
    /// ```
    #[must_use]
    pub fn builder() -> PipelineParamsBuilder {
        PipelineParamsBuilder::new()
    }

    #[must_use]
    pub fn initial_rows(&self) -> usize {
        self.initial_rows
    }

    #[must_use]
    pub fn initial_columns(&self) -> usize {
        self.initial_columns
    }

    #[must_use]
    pub fn initial_alleles(&self) -> usize {
        self.initial_alleles
    }

    #[must_use]
    pub fn rate_categories(&self) -> u32 {
        self.rate_categories
    }

    #[must_use]
    pub fn site_mode(&self) -> SiteMode {
        self.site_mode
    }

    #[must_use]
    pub fn progress_notifier(&self) -> &dyn ProgressNotifier {
        self.progress_notifier.as_ref()
    }
}

impl Default for PipelineParams {
    fn default() -> Self {
        PipelineParamsBuilder::default().build()
    }
}

#[cfg(test)]
mod tests {
    use crate::params::{
        PipelineParams, SiteMode, DEFAULT_INITIAL_ALLELES, DEFAULT_INITIAL_COLUMNS,
        DEFAULT_INITIAL_ROWS,
    };

    #[test]
    fn default_params() {
        let params = PipelineParams::default();

        assert_eq!(params.initial_rows(), DEFAULT_INITIAL_ROWS);
        assert_eq!(params.initial_columns(), DEFAULT_INITIAL_COLUMNS);
        assert_eq!(params.initial_alleles(), DEFAULT_INITIAL_ALLELES);
        assert_eq!(params.rate_categories(), 1);
        assert_eq!(params.site_mode(), SiteMode::FirstSite);
    }

    #[test]
    fn builder_overrides() {
        let params = PipelineParams::builder()
            .initial_rows(1)
            .initial_columns(2)
            .initial_alleles(3)
            .rate_categories(4)
            .build();

        assert_eq!(params.initial_rows(), 1);
        assert_eq!(params.initial_columns(), 2);
        assert_eq!(params.initial_alleles(), 3);
        assert_eq!(params.rate_categories(), 4);
    }
}
