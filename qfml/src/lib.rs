pub mod allele;
pub mod genotype;
pub mod growable;
pub mod join;
pub mod key_index;
pub mod params;
pub mod partition;
pub mod pipeline;
pub mod progress;
pub mod state;
pub mod tree;
pub mod tsv;

#[doc(hidden)]
pub mod _internal_test_data;
