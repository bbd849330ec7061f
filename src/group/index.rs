use crate::config::LabelScope;
use crate::group::table::GroupingTable;
use crate::indiv::SampleOrder;
use ahash::{HashMap, HashMapExt};

/// Genotype column positions of every group, in the order groups were first seen.
///
/// Positions are 0-based indices into the genotype fields of a data line
/// (the fields after FORMAT). Each position list is ascending and free of
/// duplicates. A position is listed under every group its individual belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    names: Vec<String>,
    positions: Vec<Vec<usize>>,
}

impl GroupIndex {
    /// Walk samples in column order and, for each, its systems in header order.
    ///
    /// Individuals missing from `table` contribute nothing; `SampleOrder::resolve`
    /// has already rejected them.
    pub fn build(order: &SampleOrder, table: &GroupingTable, scope: LabelScope) -> Self {
        let mut names = Vec::<String>::new();
        let mut positions = Vec::<Vec<usize>>::new();
        let mut slots = HashMap::<String, usize>::new();

        for (i, id) in order.ids().iter().enumerate() {
            let Some(labels) = table.get(id) else {
                continue;
            };
            for (system, label) in table.systems().iter().zip(labels.iter()) {
                let key = match scope {
                    LabelScope::Flat => label.to_owned(),
                    LabelScope::System => format!("{system}:{label}"),
                };
                let slot = match slots.get(&key) {
                    Some(slot) => *slot,
                    None => {
                        let slot = names.len();
                        slots.insert(key.clone(), slot);
                        names.push(key);
                        positions.push(Vec::new());
                        slot
                    }
                };
                // samples are visited in increasing order, so only the tail can repeat
                let v = &mut positions[slot];
                if v.last() != Some(&i) {
                    v.push(i);
                }
            }
        }

        Self { names, positions }
    }

    /// group names in output order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn positions(&self, group: usize) -> &[usize] {
        &self.positions[group]
    }

    /// look a group up by name
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&[usize]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.positions[i].as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.names
            .iter()
            .map(|s| s.as_str())
            .zip(self.positions.iter().map(|v| v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
