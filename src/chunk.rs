//! Sorted runs persisted to a temporary store.

use std::fmt;
use std::fs;
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};

use tempfile;

use crate::line::{serialized_size, write_line, Line, Lines};

/// Identifier of a run persisted to a [`RunStore`].
/// Runs are numbered sequentially in creation order, the number has no bearing on the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(usize);

impl RunId {
    pub fn new(index: usize) -> Self {
        RunId(index)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk_{}", self.0)
    }
}

/// Temporary run store interface.
///
/// A store is exclusively owned by a single sort invocation: it is created before the runs are produced
/// and released once they are merged (or a fatal error occurs).
pub trait RunStore {
    type Writer: Write;
    type Reader: BufRead;

    /// Creates a new run and returns its writer.
    fn create(&mut self, id: RunId) -> io::Result<Self::Writer>;

    /// Opens an existing run for reading.
    fn open(&self, id: RunId) -> io::Result<Self::Reader>;

    /// Deletes a run.
    fn remove(&mut self, id: RunId) -> io::Result<()>;

    /// Deletes the store container along with everything left in it.
    fn release(self) -> io::Result<()>;

    /// Persists sorted lines as a newline-terminated run.
    /// Returns the number of bytes written.
    fn persist<'a>(&mut self, id: RunId, lines: impl IntoIterator<Item = &'a Line>) -> io::Result<u64> {
        let mut writer = self.create(id).map_err(|err| with_run_context(id, "creation", err))?;

        let mut written = 0;
        for line in lines.into_iter() {
            write_line(&mut writer, line).map_err(|err| with_run_context(id, "write", err))?;
            written += serialized_size(line);
        }
        writer.flush().map_err(|err| with_run_context(id, "write", err))?;

        return Ok(written);
    }

    /// Opens a run as a merge source.
    fn cursor(&self, id: RunId) -> io::Result<ExternalChunk<Self::Reader>> {
        let reader = self.open(id).map_err(|err| with_run_context(id, "opening", err))?;

        return Ok(ExternalChunk::new(id, reader));
    }
}

fn with_run_context(id: RunId, action: &str, err: io::Error) -> io::Error {
    io::Error::new(err.kind(), format!("{} {} error: {}", id, action, err))
}

/// Run store backed by a temporary directory.
/// Each run is stored as a file named after its identifier.
pub struct TmpDirRunStore {
    dir: tempfile::TempDir,
    /// Run file read/write buffer size.
    rw_buf_size: Option<usize>,
}

impl TmpDirRunStore {
    /// Creates a new uniquely named temporary directory.
    ///
    /// # Arguments
    /// * `tmp_path` - Directory the store is created in. If the parameter is [`None`] default OS temporary
    ///   directory will be used.
    /// * `rw_buf_size` - Run file read/write buffer size.
    pub fn new(tmp_path: Option<&Path>, rw_buf_size: Option<usize>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("line-sort-");

        let dir = if let Some(tmp_path) = tmp_path {
            builder.tempdir_in(tmp_path)
        } else {
            builder.tempdir()
        }?;

        log::info!("using {} as a temporary directory", dir.path().display());

        return Ok(TmpDirRunStore { dir, rw_buf_size });
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run_path(&self, id: RunId) -> PathBuf {
        self.dir.path().join(id.to_string())
    }
}

impl RunStore for TmpDirRunStore {
    type Writer = io::BufWriter<fs::File>;
    type Reader = io::BufReader<fs::File>;

    fn create(&mut self, id: RunId) -> io::Result<Self::Writer> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.run_path(id))?;

        return Ok(match self.rw_buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        });
    }

    fn open(&self, id: RunId) -> io::Result<Self::Reader> {
        let file = fs::File::open(self.run_path(id))?;

        return Ok(match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        });
    }

    fn remove(&mut self, id: RunId) -> io::Result<()> {
        fs::remove_file(self.run_path(id))
    }

    fn release(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Forward-only reader over a persisted run.
/// Read errors are annotated with the run identifier.
pub struct ExternalChunk<R> {
    id: RunId,
    lines: Lines<R>,
}

impl<R: BufRead> ExternalChunk<R> {
    pub fn new(id: RunId, reader: R) -> Self {
        ExternalChunk {
            id,
            lines: Lines::new(reader),
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }
}

impl<R: BufRead> Iterator for ExternalChunk<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.id;
        self.lines
            .next()
            .map(|line| line.map_err(|err| with_run_context(id, "read", err)))
    }
}
