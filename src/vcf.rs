use crate::config::RunConfig;
use crate::genotype::afreq::FreqCalculator;
use crate::group::index::GroupIndex;
use crate::group::table::{self, GroupingTable};
use crate::indiv::{self, SampleOrder};
use crate::io::{self as gio, open_text_reader, FreqWriter};
use crate::utils::path::check_exists;
use bstr::ByteSlice;
use log::{debug, info, warn};
use snafu::prelude::*;
use std::backtrace::Backtrace;
use std::io::{BufRead, Write};
use std::path::Path;

/// number of fixed columns before the first genotype column
pub const N_FIXED_VCF_COLUMNS: usize = 9;
/// number of leading columns copied to the output
pub const N_OUTPUT_VCF_COLUMNS: usize = 5;
pub const SAMPLE_HEADER_PREFIX: &[u8] = b"#CHROM";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{path} does not exist; please check the specified input"))]
    InputNotFound {
        path: String,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("VCF line {line_no}: data line before the #CHROM header line"))]
    DataBeforeHeader {
        line_no: usize,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("VCF line {line_no}: a second #CHROM header line"))]
    DuplicateHeader {
        line_no: usize,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("VCF line {line_no}: #CHROM line has {found} columns, at least 9 expected"))]
    ShortHeader {
        line_no: usize,
        found: usize,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display(
        "VCF line {line_no}: {found} genotype fields, but the header names {expected} samples"
    ))]
    SampleCountMismatch {
        line_no: usize,
        expected: usize,
        found: usize,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("VCF line {line_no}: sample names are not valid UTF-8"))]
    Utf8 {
        line_no: usize,
        source: bstr::Utf8Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(display("failed reading VCF"))]
    ReadVcf {
        source: std::io::Error,
        backtrace: Option<Backtrace>,
    },
    #[snafu(transparent)]
    Grouping {
        #[snafu(source(from(table::Error, Box::new)))]
        source: Box<table::Error>,
    },
    #[snafu(transparent)]
    Sample {
        #[snafu(source(from(indiv::Error, Box::new)))]
        source: Box<indiv::Error>,
    },
    #[snafu(transparent)]
    Output {
        #[snafu(source(from(gio::Error, Box::new)))]
        source: Box<gio::Error>,
    },
}

type Result<T> = std::result::Result<T, Error>;

/// Counts reported after a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub samples: usize,
    pub groups: usize,
    pub rows: usize,
}

/// Where the stream is relative to the `#CHROM` line
#[derive(Debug)]
pub enum StreamState {
    AwaitingHeader,
    Ready { index: GroupIndex, nsamples: usize },
}

/// Line-by-line frequency transform of a VCF text stream.
///
/// `##` meta lines are skipped. The `#CHROM` line resolves the samples and
/// builds the group index; only then are data lines accepted. Each data line
/// produces one output line immediately.
pub struct FreqStream<'a, W: Write> {
    table: &'a GroupingTable,
    config: &'a RunConfig,
    writer: FreqWriter<W>,
    calc: FreqCalculator,
    state: StreamState,
    line_no: usize,
}

impl<'a, W: Write> FreqStream<'a, W> {
    pub fn new(table: &'a GroupingTable, config: &'a RunConfig, writer: FreqWriter<W>) -> Self {
        Self {
            table,
            config,
            writer,
            calc: FreqCalculator::new(config.genotype_scope),
            state: StreamState::AwaitingHeader,
            line_no: 0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Consume one line (without or with its line terminator)
    pub fn push_line(&mut self, line: &[u8]) -> Result<()> {
        self.line_no += 1;
        let line = line.trim_end();
        if line.is_empty() {
            return Ok(());
        }
        if line.starts_with(SAMPLE_HEADER_PREFIX) {
            self.on_header(line)
        } else if line.starts_with(b"#") {
            Ok(())
        } else {
            self.on_record(line)
        }
    }

    fn on_header(&mut self, line: &[u8]) -> Result<()> {
        let line_no = self.line_no;
        ensure!(
            matches!(self.state, StreamState::AwaitingHeader),
            DuplicateHeaderSnafu { line_no }
        );
        let line = line.to_str().context(Utf8Snafu { line_no })?;
        let columns: Vec<&str> = line.split('\t').collect();
        ensure!(
            columns.len() >= N_FIXED_VCF_COLUMNS,
            ShortHeaderSnafu {
                line_no,
                found: columns.len()
            }
        );

        info!("resolve {} samples", columns.len() - N_FIXED_VCF_COLUMNS);
        let order = SampleOrder::resolve(
            columns[N_FIXED_VCF_COLUMNS..].iter().copied(),
            self.config.id_policy,
            self.table,
        )?;
        if let (Some(first), Some(last)) = (order.samples().first(), order.samples().last()) {
            debug!("genotype columns {first} .. {last}");
        }
        let index = GroupIndex::build(&order, self.table, self.config.label_scope);
        info!("group index: {} groups", index.len());
        for (name, pos) in index.iter() {
            debug!("group {name}: {} samples", pos.len());
        }

        self.writer.write_header(&index)?;
        self.state = StreamState::Ready {
            index,
            nsamples: order.len(),
        };
        Ok(())
    }

    fn on_record(&mut self, line: &[u8]) -> Result<()> {
        let line_no = self.line_no;
        let StreamState::Ready { index, nsamples } = &self.state else {
            return DataBeforeHeaderSnafu { line_no }.fail();
        };

        let fields: Vec<&[u8]> = line.split_str(b"\t").collect();
        let found = fields.len().saturating_sub(N_FIXED_VCF_COLUMNS);
        ensure!(
            fields.len() >= N_FIXED_VCF_COLUMNS && found == *nsamples,
            SampleCountMismatchSnafu {
                line_no,
                expected: *nsamples,
                found,
            }
        );

        let counts = self.calc.calc(index, &fields[N_FIXED_VCF_COLUMNS..]);
        self.writer.write_row(&fields[..N_OUTPUT_VCF_COLUMNS], counts)?;
        Ok(())
    }

    /// Consume every line of `reader`
    pub fn push_reader(&mut self, mut reader: impl BufRead) -> Result<()> {
        let mut buf = Vec::<u8>::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf).context(ReadVcfSnafu)?;
            if n == 0 {
                break;
            }
            self.push_line(&buf)?;
        }
        Ok(())
    }

    /// push everything written so far to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// flush the output and report what was written
    pub fn finish(mut self) -> Result<(RunSummary, W)> {
        self.writer.flush()?;
        let (samples, groups) = match &self.state {
            StreamState::AwaitingHeader => {
                warn!("no #CHROM header line found; nothing was written");
                (0, 0)
            }
            StreamState::Ready { index, nsamples } => (*nsamples, index.len()),
        };
        let summary = RunSummary {
            samples,
            groups,
            rows: self.writer.rows(),
        };
        let w = self.writer.into_inner()?;
        Ok((summary, w))
    }
}

/// Compute group frequencies of `vcf` using the grouping file `groups` and
/// write the table to `output`.
pub fn run(
    vcf: impl AsRef<Path>,
    groups: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &RunConfig,
) -> Result<RunSummary> {
    for p in [vcf.as_ref(), groups.as_ref()] {
        ensure!(
            check_exists(p),
            InputNotFoundSnafu {
                path: p.to_string_lossy()
            }
        );
    }

    info!("read grouping file");
    let table = GroupingTable::from_txt_file(groups)?;
    info!(
        "{} individuals in {} grouping systems",
        table.len(),
        table.systems().len()
    );

    let reader = open_text_reader(vcf.as_ref())?;
    let writer = FreqWriter::create(output, &config.missing)?;
    let mut stream = FreqStream::new(&table, config, writer);
    info!("compute frequencies");
    if let Err(e) = stream.push_reader(reader) {
        // rows written before the bad line stay in the output
        if let Err(fe) = stream.flush() {
            warn!("failed to flush partial output: {fe}");
        }
        return Err(e);
    }
    let (summary, _) = stream.finish()?;
    Ok(summary)
}
