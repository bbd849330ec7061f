use crate::config::GenotypeScope;
use crate::group::index::GroupIndex;

/// Allele tallies of one group at one variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupCount {
    /// number of `1` characters
    pub allele_hits: u32,
    /// number of decimal digit characters
    pub call_total: u32,
}

impl GroupCount {
    /// `None` when no call was counted
    pub fn afreq(&self) -> Option<f64> {
        if self.call_total == 0 {
            None
        } else {
            Some(self.allele_hits as f64 / self.call_total as f64)
        }
    }

    pub fn add_field(&mut self, field: &[u8], scope: GenotypeScope) {
        let field = match scope {
            GenotypeScope::Whole => field,
            GenotypeScope::Gt => field.split(|b| *b == b':').next().unwrap_or(field),
        };
        for b in field {
            if b.is_ascii_digit() {
                self.call_total += 1;
                if *b == b'1' {
                    self.allele_hits += 1;
                }
            }
        }
    }
}

/// Per-group allele frequencies of variant records.
///
/// Counting is character based: every ASCII digit of a genotype field is a
/// call and every `1` is an alternate allele, so `0/1`, `1|1` and `./.`
/// contribute (1, 2), (2, 2) and (0, 0) hits/calls. With `GenotypeScope::Whole`
/// digits in per-sample annotations (`0/1:35`) are counted as well.
#[derive(Debug, Clone)]
pub struct FreqCalculator {
    scope: GenotypeScope,
    counts: Vec<GroupCount>,
}

impl FreqCalculator {
    pub fn new(scope: GenotypeScope) -> Self {
        Self {
            scope,
            counts: Vec::new(),
        }
    }

    /// Tally the genotype fields of one record; results are in the order of
    /// `GroupIndex::names`.
    ///
    /// `genotypes` must hold one field per sample of the index; positions past
    /// its end are not counted.
    pub fn calc<T: AsRef<[u8]>>(&mut self, index: &GroupIndex, genotypes: &[T]) -> &[GroupCount] {
        self.counts.clear();
        self.counts.resize(index.len(), GroupCount::default());
        for (g, cnt) in self.counts.iter_mut().enumerate() {
            for &i in index.positions(g) {
                if let Some(field) = genotypes.get(i) {
                    cnt.add_field(field.as_ref(), self.scope);
                }
            }
        }
        &self.counts
    }
}
