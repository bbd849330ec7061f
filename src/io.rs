use crate::genotype::afreq::GroupCount;
use crate::group::index::GroupIndex;
use rust_htslib::bgzf;
use snafu::prelude::*;
use std::backtrace::Backtrace;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

type Result<T> = std::result::Result<T, Error>;

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("cannot open {path}"))]
    OpenInput {
        path: String,
        source: std::io::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("cannot open compressed input {path}"))]
    BgzRead {
        path: String,
        source: rust_htslib::errors::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("cannot create output {path}"))]
    CreateOutput {
        path: String,
        source: std::io::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("failed writing output"))]
    CsvWrite {
        source: csv::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("failed writing output"))]
    StdIo {
        source: std::io::Error,
        backtrace: Option<Backtrace>,
    },
}

/// the five leading VCF columns copied to the output
pub const FIXED_COLUMNS: [&str; 5] = ["Chr", "Position", "rsID", "Ref", "Alt"];

/// Open a text file for line reading; `.gz` and `.bgz` files go through bgzf.
pub fn open_text_reader(p: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = p.as_ref().to_string_lossy().to_string();
    let compressed = matches!(
        p.as_ref().extension().and_then(|e| e.to_str()),
        Some("gz") | Some("bgz")
    );
    if compressed {
        let reader = bgzf::Reader::from_path(p.as_ref()).context(BgzReadSnafu { path })?;
        Ok(Box::new(BufReader::new(reader)))
    } else {
        let file = File::open(p.as_ref()).context(OpenInputSnafu { path })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Tab-delimited writer of the frequency table.
///
/// Fields are written unquoted; each call writes exactly one output line.
pub struct FreqWriter<W: Write> {
    writer: csv::Writer<W>,
    missing: String,
    buf: Vec<u8>,
    nrows: usize,
}

impl FreqWriter<BufWriter<File>> {
    pub fn create(p: impl AsRef<Path>, missing: &str) -> Result<Self> {
        let path = p.as_ref().to_string_lossy().to_string();
        let file = File::create(p.as_ref()).context(CreateOutputSnafu { path })?;
        Ok(Self::new(BufWriter::new(file), missing))
    }
}

impl<W: Write> FreqWriter<W> {
    pub fn new(w: W, missing: &str) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .has_headers(false)
            .from_writer(w);
        Self {
            writer,
            missing: missing.to_owned(),
            buf: Vec::new(),
            nrows: 0,
        }
    }

    /// `Chr Position rsID Ref Alt` then `{group}_freq {group}_count` per group
    pub fn write_header(&mut self, index: &GroupIndex) -> Result<()> {
        for col in FIXED_COLUMNS {
            self.writer.write_field(col).context(CsvWriteSnafu)?;
        }
        for name in index.names() {
            self.writer
                .write_field(format!("{name}_freq"))
                .context(CsvWriteSnafu)?;
            self.writer
                .write_field(format!("{name}_count"))
                .context(CsvWriteSnafu)?;
        }
        self.end_line()
    }

    /// fixed columns verbatim, then frequency and call count per group
    pub fn write_row<T: AsRef<[u8]>>(
        &mut self,
        fixed: &[T],
        counts: &[GroupCount],
    ) -> Result<()> {
        for f in fixed {
            self.writer.write_field(f.as_ref()).context(CsvWriteSnafu)?;
        }
        for cnt in counts {
            self.buf.clear();
            match cnt.afreq() {
                Some(f) => {
                    // Display never switches to exponent notation
                    write!(self.buf, "{f}").context(StdIoSnafu)?;
                    if !self.buf.contains(&b'.') {
                        self.buf.extend_from_slice(b".0");
                    }
                }
                None => self.buf.extend_from_slice(self.missing.as_bytes()),
            }
            self.writer.write_field(&self.buf).context(CsvWriteSnafu)?;

            self.buf.clear();
            write!(self.buf, "{}", cnt.call_total).context(StdIoSnafu)?;
            self.writer.write_field(&self.buf).context(CsvWriteSnafu)?;
        }
        self.end_line()?;
        self.nrows += 1;
        Ok(())
    }

    fn end_line(&mut self) -> Result<()> {
        self.writer.write_record(None::<&[u8]>).context(CsvWriteSnafu)
    }

    /// number of data rows written
    pub fn rows(&self) -> usize {
        self.nrows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context(StdIoSnafu)
    }

    /// flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context(StdIoSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenotypeScope, IdPolicy, LabelScope};
    use crate::genotype::afreq::FreqCalculator;
    use crate::group::table::GroupingTable;
    use crate::indiv::SampleOrder;
    use std::io::{Cursor, Read};
    use tempfile::NamedTempFile;

    fn index() -> GroupIndex {
        let t = GroupingTable::from_reader(Cursor::new(b"ID SYS1\nA x\nB y\nC x\n"), "test")
            .unwrap();
        let so = SampleOrder::resolve(["A", "B", "C"], IdPolicy::Individual, &t).unwrap();
        GroupIndex::build(&so, &t, LabelScope::Flat)
    }

    #[test]
    fn test_header_and_rows() {
        let idx = index();
        let mut calc = FreqCalculator::new(GenotypeScope::Whole);
        let mut w = FreqWriter::new(Vec::new(), "NA");
        w.write_header(&idx).unwrap();
        let counts = calc.calc(&idx, &["0/1", "1/1", "0/0"]);
        w.write_row(&["1", "100", "rs1", "A", "T"], counts).unwrap();
        let counts = calc.calc(&idx, &["./.", "0/1", "./."]);
        w.write_row(&["1", "200", ".", "G", "C"], counts).unwrap();
        assert_eq!(w.rows(), 2);

        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        let expected = "Chr\tPosition\trsID\tRef\tAlt\tx_freq\tx_count\ty_freq\ty_count\n\
                        1\t100\trs1\tA\tT\t0.25\t4\t1.0\t2\n\
                        1\t200\t.\tG\tC\tNA\t0\t0.5\t2\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_fields_are_never_quoted() {
        let idx = index();
        let mut calc = FreqCalculator::new(GenotypeScope::Whole);
        let mut w = FreqWriter::new(Vec::new(), "NA");
        let counts = calc.calc(&idx, &["0/0", "0/0", "0/0"]);
        w.write_row(&["1", "5", "rs\"q", "A", "T,C"], counts).unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(out, "1\t5\trs\"q\tA\tT,C\t0.0\t4\t0.0\t2\n");
    }

    #[test]
    fn test_third_frequency_formatting() {
        let idx = index();
        let mut calc = FreqCalculator::new(GenotypeScope::Whole);
        let mut w = FreqWriter::new(Vec::new(), "nan");
        let counts = calc.calc(&idx, &["0/1", "./.", "0"]);
        w.write_row(&["1", "5", ".", "A", "T"], counts).unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(out, "1\t5\t.\tA\tT\t0.3333333333333333\t3\tnan\t0\n");
    }

    #[test]
    fn test_small_frequency_has_no_exponent() {
        let mut w = FreqWriter::new(Vec::new(), "NA");
        let counts = [
            GroupCount {
                allele_hits: 1,
                call_total: 20000,
            },
            GroupCount {
                allele_hits: 3,
                call_total: 40000,
            },
            GroupCount {
                allele_hits: 7,
                call_total: 7,
            },
        ];
        w.write_row(&["1", "5", ".", "A", "T"], &counts).unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "1\t5\t.\tA\tT\t0.00005\t20000\t0.000075\t40000\t1.0\t7\n"
        );
    }

    #[test]
    fn test_open_plain_and_bgzf() {
        let text = "#CHROM\tPOS\nchr1\t1\n";

        let mut plain = NamedTempFile::new().unwrap();
        plain.write_all(text.as_bytes()).unwrap();
        let mut s = String::new();
        open_text_reader(plain.path())
            .unwrap()
            .read_to_string(&mut s)
            .unwrap();
        assert_eq!(s, text);

        let dir = tempfile::tempdir().unwrap();
        let gz = dir.path().join("x.vcf.gz");
        {
            let mut w = bgzf::Writer::from_path(&gz).unwrap();
            w.write_all(text.as_bytes()).unwrap();
        }
        let mut s = String::new();
        open_text_reader(&gz)
            .unwrap()
            .read_to_string(&mut s)
            .unwrap();
        assert_eq!(s, text);
    }

    #[test]
    fn test_open_missing_input() {
        assert!(matches!(
            open_text_reader("no_such_input.vcf"),
            Err(Error::OpenInput { .. })
        ));
        assert!(matches!(
            open_text_reader("no_such_input.vcf.gz"),
            Err(Error::BgzRead { .. })
        ));
    }
}
