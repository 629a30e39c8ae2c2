use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use qfml::params::{
    DEFAULT_INITIAL_ALLELES, DEFAULT_INITIAL_COLUMNS, DEFAULT_INITIAL_ROWS, DEFAULT_RATE_CATEGORIES,
};

use crate::opts::{input_file, InputFile};

/// Load single-cell genotypes and allele probabilities into per-site
/// phylogenetic partitions
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Don't display a progress bar/spinner
    #[clap(long, value_parser)]
    pub no_progress: bool,

    /// Tree file in Newick format; its tips are the cell identifiers
    #[clap(value_parser = input_file)]
    pub tree: InputFile,

    /// Genotype table (TSV) with a header line, then a cell identifier and
    /// one `<prefix><allele id>` token per site on each line
    #[clap(value_parser = input_file)]
    pub genotypes: InputFile,

    /// Allele probability table (TSV) with a header line, then site
    /// identifier, `<prefix><allele id>` token and probability on each line.
    /// The rows of a site must be contiguous
    #[clap(value_parser = input_file)]
    pub alleles: InputFile,

    /// Register every site column, one partition per site, instead of only
    /// the first one
    #[clap(long, value_parser)]
    pub all_sites: bool,

    /// Number of cell rows to allocate before the genotype matrix grows
    #[clap(default_value_t = DEFAULT_INITIAL_ROWS, long, value_parser)]
    pub initial_rows: usize,

    /// Number of site columns to allocate before the genotype matrix grows
    #[clap(default_value_t = DEFAULT_INITIAL_COLUMNS, long, value_parser)]
    pub initial_columns: usize,

    /// Number of alleles per site to allocate before the allele buffer grows
    #[clap(default_value_t = DEFAULT_INITIAL_ALLELES, long, value_parser)]
    pub initial_alleles: usize,

    /// Number of rate categories of the created partitions
    #[clap(
        default_value_t = DEFAULT_RATE_CATEGORIES,
        long,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub rate_categories: u32,

    /// Print the loaded sites and their alleles as TSV to the standard output
    #[clap(long, value_parser)]
    pub print_sites: bool,

    /// Print the loaded genotype matrix as TSV to the standard output
    #[clap(long, value_parser)]
    pub print_matrix: bool,
}
