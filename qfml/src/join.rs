use std::error::Error;
use std::fmt::{Display, Formatter};

use log::{debug, info, trace};

use crate::allele::SiteTable;
use crate::genotype::GenotypeTable;
use crate::params::{PipelineParams, SiteMode};
use crate::partition::{Partition, PartitionDims, PartitionError};
use crate::state::{StateEncoder, ALLELE_STATE_ENCODER};
use crate::tree::{PhyloTree, TipIndex};

/// Error occurring when joining the genotype table against the tree.
#[derive(Debug)]
pub enum JoinError {
    /// The genotype table or the allele table has no sites.
    NoSites,
    /// The number of genotype columns differs from the number of sites.
    SiteCountMismatch { columns: usize, sites: usize },
    /// A cell of the genotype table is not a tip of the tree.
    CellNotInTree(String),
    /// Two cells resolve to the same tip.
    DuplicateCell { cell: String, tip: u32 },
    /// The partition rejected the observed state of a cell.
    Partition { cell: String, source: PartitionError },
    /// The number of cells differs from the number of tips.
    TipCountMismatch { cells: usize, tips: usize },
}

impl Display for JoinError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinError::NoSites => write!(f, "No sites to register"),
            JoinError::SiteCountMismatch { columns, sites } => write!(
                f,
                "Site count mismatch: {} genotype columns, {} sites",
                columns, sites
            ),
            JoinError::CellNotInTree(cell) => {
                write!(f, "Cell with ID `{}` doesn't appear in the tree", cell)
            }
            JoinError::DuplicateCell { cell, tip } => {
                write!(f, "Cell `{}` resolves to tip {} twice", cell, tip)
            }
            JoinError::Partition { cell, source } => {
                write!(f, "Could not register cell `{}`: {}", cell, source)
            }
            JoinError::TipCountMismatch { cells, tips } => write!(
                f,
                "Cell count mismatch: {} cells in the genotype table, {} tips in the tree",
                cells, tips
            ),
        }
    }
}

impl Error for JoinError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            JoinError::Partition { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A partition holding the observed states of every cell at one site.
#[derive(Debug, Clone)]
pub struct SitePartition<P> {
    site: String,
    partition: P,
}

impl<P> SitePartition<P> {
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    #[must_use]
    pub fn partition(&self) -> &P {
        &self.partition
    }

    #[must_use]
    pub fn into_partition(self) -> P {
        self.partition
    }
}

/// Registers the genotype of every cell as the tip state of the matching
/// tree tip.
#[derive(Debug)]
pub struct JoinDriver<'a> {
    tree: &'a PhyloTree,
    tip_index: &'a TipIndex,
    genotypes: &'a GenotypeTable,
    sites: &'a SiteTable,
    params: &'a PipelineParams,
    encoder: &'a StateEncoder,
}

impl<'a> JoinDriver<'a> {
    #[must_use]
    pub fn new(
        tree: &'a PhyloTree,
        tip_index: &'a TipIndex,
        genotypes: &'a GenotypeTable,
        sites: &'a SiteTable,
        params: &'a PipelineParams,
    ) -> Self {
        Self {
            tree,
            tip_index,
            genotypes,
            sites,
            params,
            encoder: &ALLELE_STATE_ENCODER,
        }
    }

    /// Replaces the character to state map used to encode genotypes.
    #[must_use]
    pub fn with_encoder(mut self, encoder: &'a StateEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Creates one partition per selected site column with
    /// `create_partition` and registers every cell in it.
    ///
    /// Site column `j` corresponds to the `j`-th site of the allele table in
    /// file order. The cell count is checked against the tip count once all
    /// cells are registered.
    pub fn run<P, F>(&self, mut create_partition: F) -> Result<Vec<SitePartition<P>>, JoinError>
    where
        P: Partition,
        F: FnMut(PartitionDims) -> P,
    {
        if self.genotypes.num_sites() == 0 || self.sites.is_empty() {
            return Err(JoinError::NoSites);
        }
        if self.genotypes.num_sites() != self.sites.len() {
            return Err(JoinError::SiteCountMismatch {
                columns: self.genotypes.num_sites(),
                sites: self.sites.len(),
            });
        }
        let columns = match self.params.site_mode {
            SiteMode::FirstSite => 1,
            SiteMode::AllSites => self.genotypes.num_sites(),
        };

        let notifier = self.params.progress_notifier();
        notifier.set_tip_total((columns * self.genotypes.num_cells()) as u64);

        let mut partitions = Vec::with_capacity(columns);
        for (column, site) in self.sites.iter().take(columns).enumerate() {
            let dims =
                PartitionDims::for_site(self.tree, site.num_alleles(), self.params.rate_categories);
            debug!("Creating partition for site `{}`: {:?}", site.id(), dims);
            let mut partition = create_partition(dims);
            self.register_column(&mut partition, column)?;

            partitions.push(SitePartition {
                site: site.id().to_owned(),
                partition,
            });
        }

        if self.genotypes.num_cells() != self.tree.tip_count() {
            return Err(JoinError::TipCountMismatch {
                cells: self.genotypes.num_cells(),
                tips: self.tree.tip_count(),
            });
        }

        info!(
            "Registered {} cells in {} partitions",
            self.genotypes.num_cells(),
            partitions.len()
        );
        Ok(partitions)
    }

    fn register_column<P: Partition>(
        &self,
        partition: &mut P,
        column: usize,
    ) -> Result<(), JoinError> {
        let notifier = self.params.progress_notifier();
        let mut registered = vec![false; self.tree.tip_count()];

        for (cell, cell_id) in self.genotypes.cell_ids().iter().enumerate() {
            let tip = *self
                .tip_index
                .lookup(cell_id)
                .ok_or_else(|| JoinError::CellNotInTree(cell_id.clone()))?;
            if let Some(seen) = registered.get_mut(tip as usize) {
                if *seen {
                    return Err(JoinError::DuplicateCell {
                        cell: cell_id.clone(),
                        tip,
                    });
                }
                *seen = true;
            }

            let state = self.genotypes.get(cell, column).to_string();
            trace!("Cell `{}` -> tip {}: state {}", cell_id, tip, state);
            partition
                .set_tip_states(tip, self.encoder, &state)
                .map_err(|source| JoinError::Partition {
                    cell: cell_id.clone(),
                    source,
                })?;

            notifier.tip_registered();
        }

        Ok(())
    }
}
