use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::BufRead;

use log::info;

use crate::allele::{AlleleGroupLoader, AlleleLoaderError, SiteTable};
use crate::genotype::{GenotypeLoaderError, GenotypeTable, GenotypeTableLoader};
use crate::join::{JoinDriver, JoinError, SitePartition};
use crate::key_index::DuplicateKeyError;
use crate::params::PipelineParams;
use crate::partition::{Partition, PartitionDims};
use crate::tree::PhyloTree;

/// Error occurring in any stage of the loading pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Two tips of the tree share a label.
    DuplicateTip(DuplicateKeyError),
    Genotypes(GenotypeLoaderError),
    Alleles(AlleleLoaderError),
    Join(JoinError),
}

impl From<DuplicateKeyError> for PipelineError {
    fn from(e: DuplicateKeyError) -> Self {
        Self::DuplicateTip(e)
    }
}

impl From<GenotypeLoaderError> for PipelineError {
    fn from(e: GenotypeLoaderError) -> Self {
        Self::Genotypes(e)
    }
}

impl From<AlleleLoaderError> for PipelineError {
    fn from(e: AlleleLoaderError) -> Self {
        Self::Alleles(e)
    }
}

impl From<JoinError> for PipelineError {
    fn from(e: JoinError) -> Self {
        Self::Join(e)
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::DuplicateTip(e) => write!(f, "Invalid tree tips: {}", e),
            PipelineError::Genotypes(e) => write!(f, "{}", e),
            PipelineError::Alleles(e) => write!(f, "{}", e),
            PipelineError::Join(e) => write!(f, "{}", e),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::DuplicateTip(e) => Some(e),
            PipelineError::Genotypes(e) => Some(e),
            PipelineError::Alleles(e) => Some(e),
            PipelineError::Join(e) => Some(e),
        }
    }
}

/// Everything produced by a pipeline run.
#[derive(Debug)]
pub struct LoadedData<P> {
    pub genotypes: GenotypeTable,
    pub sites: SiteTable,
    pub partitions: Vec<SitePartition<P>>,
}

/// Loads the genotype and allele tables, joins them against the tree and
/// fills the partitions.
#[derive(Debug)]
pub struct Pipeline<'a> {
    params: &'a PipelineParams,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(params: &'a PipelineParams) -> Self {
        Self { params }
    }

    pub fn run<G, A, P, F>(
        &self,
        tree: &PhyloTree,
        genotype_reader: G,
        allele_reader: A,
        create_partition: F,
    ) -> Result<LoadedData<P>, PipelineError>
    where
        G: BufRead,
        A: BufRead,
        P: Partition,
        F: FnMut(PartitionDims) -> P,
    {
        let tip_index = tree.tip_index()?;

        info!("Loading genotype table");
        let genotypes = GenotypeTableLoader::new(self.params).load(genotype_reader)?;

        info!("Loading allele probabilities");
        let sites =
            AlleleGroupLoader::new(self.params).load(allele_reader, genotypes.num_sites())?;

        info!("Registering tip states");
        let partitions = JoinDriver::new(tree, &tip_index, &genotypes, &sites, self.params)
            .run(create_partition)?;

        Ok(LoadedData {
            genotypes,
            sites,
            partitions,
        })
    }
}
