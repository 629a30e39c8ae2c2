use itertools::Itertools;
use lazy_static::lazy_static;

pub const SIMPLE_GENOTYPES_TSV: &str = "cell\tsite_1\tsite_2
cell_a\tR-1\tR-2
cell_b\tR-0\tR-3
cell_c\tR-5\tR-1
";

pub const SIMPLE_ALLELES_TSV: &str = "site\tallele\tprob
site_1\tR-0\t0.1
site_1\tR-1\t0.6
site_1\tR-5\t0.3
site_2\tR-2\t0.25
site_2\tR-3\t0.75
";

pub const SIMPLE_TREE_NEWICK: &str = "((cell_a:0.1,cell_b:0.2):0.05,cell_c:0.3);\n";

fn genotype_row(cell: usize, sites: usize) -> String {
    let tokens = (0..sites).map(|site| format!("R-{}", cell * 10 + site));
    format!("c{}\t{}", cell, tokens.format("\t"))
}

lazy_static! {
    /// Five cells at five sites; the value at `(cell, site)` is
    /// `cell * 10 + site`.
    pub static ref WIDE_GENOTYPES_TSV: String = {
        let header = format!("cell\t{}", (0..5).map(|site| format!("s{}", site)).format("\t"));
        let rows = (0..5).map(|cell| genotype_row(cell, 5));
        format!("{}\n", std::iter::once(header).chain(rows).join("\n"))
    };

    /// Site `big` with nine alleles (`R-n` with probability `n / 10`)
    /// followed by site `small` with one.
    pub static ref MANY_ALLELES_TSV: String = {
        let big = (0..9).map(|n| format!("big\tR-{}\t0.{}", n, n));
        let rows = big
            .chain(std::iter::once("small\tR-3\t1.0".to_owned()))
            .join("\n");
        format!("site\tallele\tprob\n{}\n", rows)
    };
}
