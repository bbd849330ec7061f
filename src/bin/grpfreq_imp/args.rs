use clap::Parser;
use grpfreq::config::{GenotypeScope, LabelScope};
use std::path::PathBuf;

/// A population-specific SNP frequency calculator that lets you specify
/// different population groups
#[derive(Parser, Debug)]
#[command(name = "grpfreq", author, version, about, long_about = None)]
pub struct Cli {
    /// Input VCF file; may be gzipped/bgzipped (`.gz`, `.bgz`)
    #[arg(long)]
    pub vcf: PathBuf,
    /// Grouping file: whitespace-separated, with a header; each row is one
    /// individual followed by its label in each grouping system
    #[arg(long)]
    pub groups: PathBuf,
    /// Path to the output table
    #[arg(long)]
    pub output: PathBuf,
    /// Use the family ID (second-to-last token after splitting sample names on
    /// '_') instead of the individual ID (last token) for group lookup
    #[arg(long, default_value_t = false)]
    pub use_fid: bool,
    /// Optional TOML file with `id-policy`, `label-scope`, `genotype-scope`
    /// and `missing`; command line flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// `flat`: equal labels of different grouping systems form one group;
    /// `system`: groups are named `system:label`
    #[arg(long, value_enum)]
    pub label_scope: Option<LabelScope>,
    /// `whole`: count digits of the whole genotype field;
    /// `gt`: only the text before the first ':'
    #[arg(long, value_enum)]
    pub genotype_scope: Option<GenotypeScope>,
    /// Text written for a frequency when a group has no called allele
    #[arg(long)]
    pub missing: Option<String>,
}
