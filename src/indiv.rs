use crate::config::IdPolicy;
use crate::group::table::GroupingTable;
use snafu::prelude::*;
use std::backtrace::Backtrace;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "sample {sample:?} resolves to individual {key:?}, which is not in the grouping file"
    ))]
    UnresolvedSample {
        sample: String,
        key: String,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("sample {sample:?} has no {policy:?} token when split on '_'"))]
    UnresolvableSampleName {
        sample: String,
        policy: IdPolicy,
        backtrace: Option<Backtrace>,
    },
}

type Result<T> = std::result::Result<T, Error>;

impl IdPolicy {
    /// pick the grouping key out of a VCF sample name
    ///
    /// `COHORT1_FAM07_IND03` gives `IND03` for `Individual` and `FAM07` for `Family`.
    pub fn resolve<'a>(&self, sample: &'a str) -> Option<&'a str> {
        let mut tokens = sample.rsplit('_');
        match self {
            IdPolicy::Individual => tokens.next(),
            IdPolicy::Family => tokens.nth(1),
        }
    }
}

/// Resolved individual ids of the genotype columns of a VCF, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOrder {
    samples: Vec<String>,
    ids: Vec<String>,
}

impl SampleOrder {
    /// resolve every sample name and check the result exists in `table`
    pub fn resolve<'a>(
        samples: impl IntoIterator<Item = &'a str>,
        policy: IdPolicy,
        table: &GroupingTable,
    ) -> Result<Self> {
        let mut names = Vec::new();
        let mut ids = Vec::new();
        for sample in samples {
            let key = policy
                .resolve(sample)
                .context(UnresolvableSampleNameSnafu { sample, policy })?;
            ensure!(table.contains(key), UnresolvedSampleSnafu { sample, key });
            names.push(sample.to_owned());
            ids.push(key.to_owned());
        }
        Ok(Self {
            samples: names,
            ids,
        })
    }

    /// resolved ids
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// sample names as written in the VCF header
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table() -> GroupingTable {
        let s = "ID pop\nIND03 AFR\nFAM07 EUR\nA AMR\n";
        GroupingTable::from_reader(Cursor::new(s.as_bytes()), "test").unwrap()
    }

    #[test]
    fn test_policy_tokens() {
        let name = "COHORT1_FAM07_IND03";
        assert_eq!(IdPolicy::Individual.resolve(name), Some("IND03"));
        assert_eq!(IdPolicy::Family.resolve(name), Some("FAM07"));
        assert_eq!(IdPolicy::Individual.resolve("A"), Some("A"));
        assert_eq!(IdPolicy::Family.resolve("A"), None);
        assert_eq!(IdPolicy::Family.resolve("FAM_A"), Some("FAM"));
    }

    #[test]
    fn test_resolve_individual_and_family() {
        let t = table();
        let samples = ["COHORT1_FAM07_IND03", "X_A"];
        let so = SampleOrder::resolve(samples, IdPolicy::Individual, &t).unwrap();
        assert_eq!(so.ids(), &["IND03".to_string(), "A".to_string()]);
        assert_eq!(so.samples()[0], "COHORT1_FAM07_IND03");

        let so = SampleOrder::resolve(["COHORT1_FAM07_IND03"], IdPolicy::Family, &t).unwrap();
        assert_eq!(so.ids(), &["FAM07".to_string()]);
    }

    #[test]
    fn test_unknown_individual_names_sample() {
        let t = table();
        let err = SampleOrder::resolve(["X_A", "COHORT1_FAM07_IND99"], IdPolicy::Individual, &t)
            .unwrap_err();
        match err {
            Error::UnresolvedSample { sample, key, .. } => {
                assert_eq!(sample, "COHORT1_FAM07_IND99");
                assert_eq!(key, "IND99");
            }
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn test_family_policy_needs_two_tokens() {
        let t = table();
        let err = SampleOrder::resolve(["A"], IdPolicy::Family, &t).unwrap_err();
        assert!(matches!(err, Error::UnresolvableSampleName { .. }));
    }
}
