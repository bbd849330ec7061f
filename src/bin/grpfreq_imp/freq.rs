use super::args::Cli;
use grpfreq::config::{self, ConfigFile, IdPolicy, RunConfig};
use grpfreq::vcf;
use log::info;
use snafu::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    // non-local
    #[snafu(transparent)]
    Config { source: config::Error },
    #[snafu(transparent)]
    Vcf { source: vcf::Error },
}

type Result<T> = std::result::Result<T, Error>;

/// config file values overlaid by the flags given on the command line
pub fn build_config(args: &Cli) -> Result<RunConfig> {
    let mut cfg = RunConfig::default();
    if let Some(p) = &args.config {
        info!("read config file {}", p.display());
        cfg = cfg.merge_file(ConfigFile::from_toml_file(p)?);
    }
    if args.use_fid {
        cfg.id_policy = IdPolicy::Family;
    }
    if let Some(x) = args.label_scope {
        cfg.label_scope = x;
    }
    if let Some(x) = args.genotype_scope {
        cfg.genotype_scope = x;
    }
    if let Some(x) = &args.missing {
        cfg.missing = x.clone();
    }
    Ok(cfg)
}

pub fn main_freq(args: &Cli) -> Result<()> {
    let cfg = build_config(args)?;
    info!("{cfg:?}");
    let summary = vcf::run(&args.vcf, &args.groups, &args.output, &cfg)?;
    info!(
        "wrote {} rows for {} groups over {} samples to {}",
        summary.rows,
        summary.groups,
        summary.samples,
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use grpfreq::config::{GenotypeScope, LabelScope};
    use std::io::Write;

    #[test]
    fn test_flags_override_config_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "label-scope = \"system\"\ngenotype-scope = \"gt\"\nmissing = \"-\"").unwrap();
        let cfg_path = f.path().to_string_lossy().to_string();
        let args = Cli::parse_from([
            "grpfreq",
            "--vcf",
            "in.vcf",
            "--groups",
            "g.txt",
            "--output",
            "o.tsv",
            "--use-fid",
            "--config",
            &cfg_path,
            "--genotype-scope",
            "whole",
        ]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.id_policy, IdPolicy::Family);
        assert_eq!(cfg.label_scope, LabelScope::System);
        assert_eq!(cfg.genotype_scope, GenotypeScope::Whole);
        assert_eq!(cfg.missing, "-");
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = Cli::parse_from([
            "grpfreq", "--vcf", "in.vcf", "--groups", "g.txt", "--output", "o.tsv",
        ]);
        assert_eq!(build_config(&args).unwrap(), RunConfig::default());
    }
}
