use std::io::Write;
use std::iter;

use itertools::Itertools;
use qfml::allele::SiteTable;
use qfml::genotype::GenotypeTable;

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(writer)
}

/// Writes one row per site: identifier, allele count, then an
/// allele/probability pair for each allele.
pub(crate) fn write_sites<W: Write>(writer: W, sites: &SiteTable) -> anyhow::Result<()> {
    let mut writer = tsv_writer(writer);

    for site in sites.iter() {
        let alleles = site
            .alleles()
            .iter()
            .flat_map(|allele| [format!("R-{}", allele.id), format!("{:e}", allele.prob)]);
        let record = iter::once(site.id().to_owned())
            .chain(iter::once(site.num_alleles().to_string()))
            .chain(alleles)
            .collect_vec();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the genotype matrix with a header naming the sites in column
/// order.
pub(crate) fn write_matrix<W: Write>(
    writer: W,
    genotypes: &GenotypeTable,
    sites: &SiteTable,
) -> anyhow::Result<()> {
    let mut writer = tsv_writer(writer);

    let header = iter::once("cell").chain(sites.iter().map(|site| site.id()));
    writer.write_record(header)?;
    for (cell_id, row) in genotypes.rows() {
        let record = iter::once(cell_id.to_owned())
            .chain(row.iter().map(u32::to_string))
            .collect_vec();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
