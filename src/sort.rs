//! External sorter.

use log;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io::{self, prelude::*};
use std::path::Path;

use bytesize::ByteSize;

use crate::buffer::ChunkBuffer;
use crate::chunk::{RunId, RunStore, TmpDirRunStore};
use crate::line::{write_line, Lines};
use crate::merger::BinaryHeapMerger;

/// Default chunk size limit (400 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 400 * 1024 * 1024;

/// Sorting phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Splitting the input into sorted runs.
    Split,
    /// Merging the sorted runs into the output.
    Merge,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Split => write!(f, "splitting"),
            Phase::Merge => write!(f, "merging"),
        }
    }
}

/// Sorting error. Any of them aborts the sort.
#[derive(Debug)]
pub enum SortError {
    /// Chunk size limit is zero.
    InvalidChunkSize,
    /// Temporary directory creation error.
    TempDir(io::Error),
    /// Input stream or run read error.
    ReadFailure(Phase, io::Error),
    /// Run persisting or output stream write error.
    WriteFailure(Phase, io::Error),
}

impl SortError {
    /// Returns the phase the error occurred in.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SortError::ReadFailure(phase, _) | SortError::WriteFailure(phase, _) => Some(*phase),
            SortError::InvalidChunkSize | SortError::TempDir(_) => None,
        }
    }
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::InvalidChunkSize => None,
            SortError::TempDir(err) => Some(err),
            SortError::ReadFailure(_, err) => Some(err),
            SortError::WriteFailure(_, err) => Some(err),
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::InvalidChunkSize => write!(f, "chunk size must be greater than zero"),
            SortError::TempDir(err) => write!(f, "temporary directory not created: {}", err),
            SortError::ReadFailure(phase, err) => write!(f, "{} failed, read error: {}", phase, err),
            SortError::WriteFailure(phase, err) => write!(f, "{} failed, write error: {}", phase, err),
        }
    }
}

/// Temporary object that could not be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupTarget {
    Run(RunId),
    Container,
}

impl Display for CleanupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupTarget::Run(id) => write!(f, "run {}", id),
            CleanupTarget::Container => write!(f, "temporary directory"),
        }
    }
}

/// Temporary data removal error.
/// It is reported after a successful merge and does not affect the sorting result.
#[derive(Debug)]
pub struct CleanupError {
    target: CleanupTarget,
    source: io::Error,
}

impl CleanupError {
    pub fn new(target: CleanupTarget, source: io::Error) -> Self {
        CleanupError { target, source }
    }

    pub fn target(&self) -> CleanupTarget {
        self.target
    }
}

impl Error for CleanupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for CleanupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not removed: {}", self.target, self.source)
    }
}

/// Result of a successful sort.
#[derive(Debug, Default)]
pub struct SortSummary {
    /// Number of sorted runs the input was split into.
    pub runs: usize,
    /// Number of lines written to the output.
    pub lines: u64,
    /// Temporary data removal errors.
    pub cleanup_errors: Vec<CleanupError>,
}

impl SortSummary {
    /// Checks that all temporary data has been removed.
    pub fn is_clean(&self) -> bool {
        self.cleanup_errors.is_empty()
    }
}

/// External sorter builder. Provides methods for [`ExternalSorter`] initialization.
#[derive(Clone)]
pub struct ExternalSorterBuilder {
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Chunk size limit in bytes.
    chunk_size: u64,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        ExternalSorterBuilder::default()
    }

    /// Builds an [`ExternalSorter`] instance using provided configuration.
    pub fn build(self) -> Result<ExternalSorter, SortError> {
        ExternalSorter::new(self.tmp_dir.as_deref(), self.chunk_size, self.rw_buf_size)
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> ExternalSorterBuilder {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets chunk size limit in bytes.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> ExternalSorterBuilder {
        self.chunk_size = chunk_size;
        return self;
    }

    /// Sets run file read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> ExternalSorterBuilder {
        self.rw_buf_size = Some(buf_size);
        return self;
    }
}

impl Default for ExternalSorterBuilder {
    fn default() -> Self {
        ExternalSorterBuilder {
            tmp_dir: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            rw_buf_size: None,
        }
    }
}

/// External line sorter.
///
/// Sorting is performed in two passes. The first one splits the input into chunks limited by the chunk size,
/// sorts each of them in memory and saves it to the temporary store as a run. The second one merges all runs
/// into the output keeping only one line per run in memory.
pub struct ExternalSorter {
    /// Directory to be used to store temporary data.
    tmp_dir: Option<Box<Path>>,
    /// Chunk size limit in bytes.
    chunk_size: u64,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl ExternalSorter {
    /// Creates a new external sorter instance.
    ///
    /// # Arguments
    /// * `tmp_path` - Directory to be used to store temporary data. If paramater is [`None`] default OS temporary
    ///   directory will be used.
    /// * `chunk_size` - Chunk size limit in bytes, must be greater than zero.
    /// * `rw_buf_size` - Run files read/write buffer size.
    pub fn new(tmp_path: Option<&Path>, chunk_size: u64, rw_buf_size: Option<usize>) -> Result<Self, SortError> {
        if chunk_size == 0 {
            return Err(SortError::InvalidChunkSize);
        }

        return Ok(ExternalSorter {
            tmp_dir: tmp_path.map(Into::into),
            chunk_size,
            rw_buf_size,
        });
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Sorts lines from the input and writes them to the output.
    /// Runs are stored in a new temporary directory which is removed when the sort is finished.
    ///
    /// # Arguments
    /// * `input` - Input stream lines to be fetched from
    /// * `output` - Output stream sorted lines to be written to
    pub fn sort<R, W>(&self, input: R, output: W) -> Result<SortSummary, SortError>
    where
        R: BufRead,
        W: Write,
    {
        let store = TmpDirRunStore::new(self.tmp_dir.as_deref(), self.rw_buf_size).map_err(SortError::TempDir)?;

        self.sort_with_store(input, output, store)
    }

    /// Sorts lines from the input using a custom run store.
    /// The store is released when the sort is finished, whether it succeeded or not.
    ///
    /// # Arguments
    /// * `input` - Input stream lines to be fetched from
    /// * `output` - Output stream sorted lines to be written to
    /// * `store` - Temporary store runs to be saved to
    pub fn sort_with_store<R, W, S>(&self, input: R, output: W, mut store: S) -> Result<SortSummary, SortError>
    where
        R: BufRead,
        W: Write,
        S: RunStore,
    {
        let result = self.create_runs(input, &mut store).and_then(|runs| {
            let lines = Self::merge_runs(&runs, &store, output)?;
            Ok((runs, lines))
        });

        match result {
            Ok((runs, lines)) => {
                let cleanup_errors = Self::cleanup(store, &runs);
                log::info!("sorting done ({} lines, {} runs)", lines, runs.len());

                Ok(SortSummary {
                    runs: runs.len(),
                    lines,
                    cleanup_errors,
                })
            }
            Err(err) => {
                if let Err(release_err) = store.release() {
                    log::warn!("{}", CleanupError::new(CleanupTarget::Container, release_err));
                }
                Err(err)
            }
        }
    }

    fn create_runs<R, S>(&self, input: R, store: &mut S) -> Result<Vec<RunId>, SortError>
    where
        R: BufRead,
        S: RunStore,
    {
        log::info!("splitting input (chunk size: {})", ByteSize(self.chunk_size));

        let mut chunk_buf = ChunkBuffer::new(self.chunk_size);
        let mut runs = Vec::new();

        for line in Lines::crlf(input) {
            match line {
                Ok(line) => chunk_buf.push(line),
                Err(err) => return Err(SortError::ReadFailure(Phase::Split, err)),
            }

            if chunk_buf.is_full() {
                runs.push(Self::create_run(&mut chunk_buf, runs.len(), store)?);
            }
        }

        if !chunk_buf.is_empty() {
            runs.push(Self::create_run(&mut chunk_buf, runs.len(), store)?);
        }

        log::info!("splitting done ({} runs)", runs.len());

        return Ok(runs);
    }

    fn create_run<S: RunStore>(buffer: &mut ChunkBuffer, index: usize, store: &mut S) -> Result<RunId, SortError> {
        let id = RunId::new(index);

        log::debug!(
            "sorting {} data ({} lines, {}) ...",
            id,
            buffer.len(),
            ByteSize(buffer.mem_size())
        );
        buffer.sort();

        log::debug!("saving {} data", id);
        let written = store
            .persist(id, buffer.lines())
            .map_err(|err| SortError::WriteFailure(Phase::Split, err))?;
        log::debug!("{} saved ({})", id, ByteSize(written));

        buffer.clear();

        return Ok(id);
    }

    fn merge_runs<S, W>(runs: &[RunId], store: &S, mut output: W) -> Result<u64, SortError>
    where
        S: RunStore,
        W: Write,
    {
        log::info!("merging {} runs", runs.len());

        let chunks = runs
            .iter()
            .map(|&id| store.cursor(id))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|err| SortError::ReadFailure(Phase::Merge, err))?;
        for chunk in &chunks {
            log::debug!("{} opened for merging", chunk.id());
        }

        let merger = BinaryHeapMerger::new(chunks);
        log::debug!("merge fan-in: {}", merger.fan_in());

        let mut lines = 0;
        for line in merger {
            let line = line.map_err(|err| SortError::ReadFailure(Phase::Merge, err))?;
            write_line(&mut output, &line).map_err(|err| SortError::WriteFailure(Phase::Merge, err))?;
            lines += 1;
        }

        output
            .flush()
            .map_err(|err| SortError::WriteFailure(Phase::Merge, err))?;

        log::info!("merging done");

        return Ok(lines);
    }

    fn cleanup<S: RunStore>(mut store: S, runs: &[RunId]) -> Vec<CleanupError> {
        let mut errors = Vec::new();

        for &id in runs {
            if let Err(err) = store.remove(id) {
                errors.push(CleanupError::new(CleanupTarget::Run(id), err));
            }
        }

        if let Err(err) = store.release() {
            errors.push(CleanupError::new(CleanupTarget::Container, err));
        }

        // reported twice: as warnings right away and in the summary for the caller
        for err in &errors {
            log::warn!("{}", err);
        }

        return errors;
    }
}
