use std::io;
use std::rc::Rc;

use anyhow::Context;
use log::info;
use qfml::params::{PipelineParams, SiteMode};
use qfml::partition::{Partition, TipStatePartition};
use qfml::pipeline::Pipeline;
use qfml::tree::PhyloTree;

use crate::cli::Cli;
use crate::dump::{write_matrix, write_sites};
use crate::PROGRESS_BAR;

pub(crate) fn load(cli: &Cli) -> anyhow::Result<()> {
    info!("Parsing newick formatted tree...");
    cli.tree.ensure_readable()?;
    let tree = PhyloTree::from_newick_file(cli.tree.path())?;

    let genotype_reader = cli.genotypes.as_reader()?;
    let allele_reader = cli.alleles.as_reader()?;
    PROGRESS_BAR.set_total_bytes(cli.genotypes.length()? + cli.alleles.length()?);

    let site_mode = if cli.all_sites {
        SiteMode::AllSites
    } else {
        SiteMode::FirstSite
    };
    let params = PipelineParams::builder()
        .initial_rows(cli.initial_rows)
        .initial_columns(cli.initial_columns)
        .initial_alleles(cli.initial_alleles)
        .rate_categories(cli.rate_categories)
        .site_mode(site_mode)
        .progress_notifier(Rc::new(PROGRESS_BAR.clone()))
        .build();

    let data = Pipeline::new(&params)
        .run(
            &tree,
            genotype_reader,
            allele_reader,
            TipStatePartition::new,
        )
        .context("Failed to load the genotype data")?;
    PROGRESS_BAR.finish();

    for site_partition in &data.partitions {
        let dims = site_partition.partition().dims();
        info!(
            "Partition for site `{}`: {} tips, {} states, {} patterns, {} rate categories",
            site_partition.site(),
            dims.tips,
            dims.states,
            dims.patterns,
            dims.rate_categories
        );
    }
    if data.genotypes.lenient_tokens() > 0 {
        info!(
            "{} genotype tokens were read leniently",
            data.genotypes.lenient_tokens()
        );
    }

    if cli.print_sites {
        write_sites(io::stdout(), &data.sites).context("Failed to print the sites")?;
    }
    if cli.print_matrix {
        write_matrix(io::stdout(), &data.genotypes, &data.sites)
            .context("Failed to print the genotype matrix")?;
    }

    Ok(())
}
