use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use bstr::ByteSlice;
use itertools::Itertools;
use log::{debug, warn};
use snafu::prelude::*;
use std::backtrace::Backtrace;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("cannot read grouping file {path}"))]
    StdIo {
        path: String,
        source: std::io::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("grouping file {path} is empty; a header line is required"))]
    EmptyGroupingFile {
        path: String,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display(
        "grouping file {path} line {line_no}: expected {expected} fields as in the header, found {found}: {line:?}"
    ))]
    GroupingFormat {
        path: String,
        line_no: usize,
        expected: usize,
        found: usize,
        line: String,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("grouping file {path} line {line_no} is not valid UTF-8"))]
    Utf8 {
        path: String,
        line_no: usize,
        source: bstr::Utf8Error,
        backtrace: Option<Backtrace>,
    },
}

type Result<T> = std::result::Result<T, Error>;

/// Group membership of individuals under one or more grouping systems.
///
/// The grouping file is whitespace delimited:
/// - the header is `<ignored> <system_1> <system_2> ...`
/// - each row is `<individual_id> <label_1> <label_2> ...`
/// - every row has exactly as many fields as the header
///
/// Labels of an individual are kept in the order of the systems in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingTable {
    systems: Vec<String>,
    labels: HashMap<String, Vec<String>>,
    system_labels: Vec<HashSet<String>>,
}

impl GroupingTable {
    pub fn from_txt_file(p: impl AsRef<Path>) -> Result<Self> {
        let path = p.as_ref().to_string_lossy().to_string();
        let file = File::open(p.as_ref()).context(StdIoSnafu { path: &path })?;
        Self::from_reader(BufReader::new(file), &path)
    }

    /// `path` is only used for diagnostics
    pub fn from_reader(mut reader: impl BufRead, path: &str) -> Result<Self> {
        let mut buf = Vec::<u8>::new();
        let mut line_no = 0usize;

        // header
        let mut systems: Option<Vec<String>> = None;
        while systems.is_none() {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .context(StdIoSnafu { path })?;
            if n == 0 {
                return EmptyGroupingFileSnafu { path }.fail();
            }
            line_no += 1;
            let line = buf.to_str().context(Utf8Snafu { path, line_no })?;
            let mut fields = line.split_whitespace();
            if fields.next().is_some() {
                systems = Some(fields.map(|s| s.to_owned()).collect());
            }
        }
        let systems = systems.unwrap_or_default();
        let nfields = systems.len() + 1;

        let mut labels = HashMap::<String, Vec<String>>::new();
        let mut system_labels = vec![HashSet::<String>::new(); systems.len()];

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .context(StdIoSnafu { path })?;
            if n == 0 {
                break;
            }
            line_no += 1;
            let line = buf.to_str().context(Utf8Snafu { path, line_no })?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            ensure!(
                fields.len() == nfields,
                GroupingFormatSnafu {
                    path,
                    line_no,
                    expected: nfields,
                    found: fields.len(),
                    line: line.trim_end(),
                }
            );
            for (set, label) in system_labels.iter_mut().zip(&fields[1..]) {
                set.insert((*label).to_owned());
            }
            let row: Vec<String> = fields[1..].iter().map(|s| (*s).to_owned()).collect();
            if labels.insert(fields[0].to_owned(), row).is_some() {
                warn!(
                    "individual {} is listed more than once in {path}; line {line_no} wins",
                    fields[0]
                );
            }
        }

        for (name, set) in systems.iter().zip(system_labels.iter()) {
            debug!("grouping system {name}: {}", set.iter().sorted().join(","));
        }

        Ok(Self {
            systems,
            labels,
            system_labels,
        })
    }

    /// grouping system names in header order
    pub fn systems(&self) -> &[String] {
        &self.systems
    }

    /// labels of an individual, one per grouping system in header order
    pub fn get(&self, individual: &str) -> Option<&[String]> {
        self.labels.get(individual).map(|v| v.as_slice())
    }

    pub fn contains(&self, individual: &str) -> bool {
        self.labels.contains_key(individual)
    }

    /// number of individuals
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// each grouping system with the distinct labels observed for it
    pub fn system_labels(&self) -> impl Iterator<Item = (&str, &HashSet<String>)> {
        self.systems
            .iter()
            .map(|s| s.as_str())
            .zip(self.system_labels.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn load(s: &str) -> Result<GroupingTable> {
        GroupingTable::from_reader(Cursor::new(s.as_bytes()), "test")
    }

    #[test]
    fn test_two_systems() {
        let t = load("ID\tpop\tsex\nA\tAFR\tmale\nB\tEUR\tfemale\nC\tAFR\tfemale\n").unwrap();
        assert_eq!(t.systems(), &["pop".to_string(), "sex".to_string()]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get("A").unwrap(), &["AFR".to_string(), "male".to_string()]);
        assert!(t.get("D").is_none());

        let sl: Vec<_> = t.system_labels().collect();
        assert_eq!(sl[0].0, "pop");
        assert_eq!(sl[0].1.len(), 2);
        assert_eq!(sl[1].0, "sex");
        assert!(sl[1].1.contains("female"));
    }

    #[test]
    fn test_mixed_whitespace_and_blank_lines() {
        let t = load("ID  SYS1\n\nA x\n   \nB\ty\r\n").unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("B").unwrap(), &["y".to_string()]);
    }

    #[test]
    fn test_last_row_wins() {
        let t = load("ID SYS1\nA x\nA y\n").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("A").unwrap(), &["y".to_string()]);
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let err = load("ID pop sex\nA AFR male\nB EUR\n").unwrap_err();
        match err {
            Error::GroupingFormat {
                line_no,
                expected,
                found,
                ..
            } => {
                assert_eq!(line_no, 3);
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            e => panic!("unexpected error {e:?}"),
        }
    }

    #[test]
    fn test_extra_field_is_fatal() {
        let err = load("ID pop\nA AFR male\n").unwrap_err();
        assert!(matches!(err, Error::GroupingFormat { found: 3, .. }));
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(load(""), Err(Error::EmptyGroupingFile { .. })));
        assert!(matches!(load("\n\n"), Err(Error::EmptyGroupingFile { .. })));
    }

    #[test]
    fn test_missing_file() {
        let res = GroupingTable::from_txt_file("no_such_groups.txt");
        assert!(matches!(res, Err(Error::StdIo { .. })));
    }
}
