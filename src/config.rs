use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::backtrace::Backtrace;
use std::path::Path;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("cannot read config file {path}"))]
    ReadConfig {
        path: String,
        source: std::io::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("invalid config file {path}"))]
    ParseConfig {
        path: String,
        #[snafu(source(from(toml::de::Error, Box::new)))]
        source: Box<toml::de::Error>,
        backtrace: Option<Backtrace>,
    },
}

type Result<T> = std::result::Result<T, Error>;

/// Which `_`-delimited token of a VCF sample name is used as the grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum IdPolicy {
    /// last token, e.g. `IND03` in `COHORT1_FAM07_IND03`
    #[default]
    Individual,
    /// second-to-last token, e.g. `FAM07` in `COHORT1_FAM07_IND03`
    Family,
}

/// How group labels from different grouping systems are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LabelScope {
    /// one namespace for all systems; equal labels in two systems are one group
    #[default]
    Flat,
    /// groups are keyed by (system, label) and named `system:label`
    System,
}

/// Which part of a genotype field is scanned for allele digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GenotypeScope {
    /// the whole field, including any `:`-separated annotations
    #[default]
    Whole,
    /// only the text before the first `:`
    Gt,
}

pub const DEFAULT_MISSING: &str = "NA";

/// Settings of a run after merging the config file with command line flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub id_policy: IdPolicy,
    pub label_scope: LabelScope,
    pub genotype_scope: GenotypeScope,
    pub missing: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            id_policy: IdPolicy::default(),
            label_scope: LabelScope::default(),
            genotype_scope: GenotypeScope::default(),
            missing: DEFAULT_MISSING.to_owned(),
        }
    }
}

/// On-disk form of the config; every key is optional
#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub id_policy: Option<IdPolicy>,
    pub label_scope: Option<LabelScope>,
    pub genotype_scope: Option<GenotypeScope>,
    pub missing: Option<String>,
}

impl ConfigFile {
    pub fn from_toml_file(p: impl AsRef<Path>) -> Result<Self> {
        let path = p.as_ref().to_string_lossy().to_string();
        let s = std::fs::read_to_string(p.as_ref()).context(ReadConfigSnafu { path: &path })?;
        toml::from_str(&s).context(ParseConfigSnafu { path })
    }
}

impl RunConfig {
    /// overlay the values present in a config file
    pub fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(x) = file.id_policy {
            self.id_policy = x;
        }
        if let Some(x) = file.label_scope {
            self.label_scope = x;
        }
        if let Some(x) = file.genotype_scope {
            self.genotype_scope = x;
        }
        if let Some(x) = file.missing {
            self.missing = x;
        }
        self
    }
}
