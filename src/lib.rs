//! `line-sort` is an external sort implementation for line-oriented text files.
//!
//! External sorting is required when the data being sorted do not fit into the main memory (RAM) of a computer
//! and instead must be resided in slower external memory, usually a hard disk drive. Sorting is achieved in two
//! passes. During the first pass it splits the input into chunks that each fit in a configurable memory budget,
//! sorts them and saves them to a temporary directory as runs. During the second pass it merges the sorted runs
//! together holding only one line per run in memory. For more information see
//! [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! * **Byte-wise ordering:**
//!   lines are compared as raw bytes, no locale-aware collation is performed and no UTF-8 validation is required.
//! * **Memory limit support:**
//!   the chunk size limit bounds the serialized size of lines held in memory during the first pass.
//! * **Pluggable temporary storage:**
//!   runs are stored in a temporary directory by default, a custom [`RunStore`] can be provided instead.
//!
//! # Example
//!
//! ```no_run
//! use std::fs;
//! use std::io;
//! use std::path;
//!
//! use log;
//!
//! use line_sort::ExternalSorterBuilder;
//!
//! fn main() {
//!     let input_reader = io::BufReader::new(fs::File::open("input.txt").unwrap());
//!     let output_writer = io::BufWriter::new(fs::File::create("output.txt").unwrap());
//!
//!     let sorter = ExternalSorterBuilder::new()
//!         .with_tmp_dir(path::Path::new("./"))
//!         .with_chunk_size(50 * 1024 * 1024)
//!         .build()
//!         .unwrap();
//!
//!     let summary = sorter.sort(input_reader, output_writer).unwrap();
//!     for err in &summary.cleanup_errors {
//!         log::warn!("{}", err);
//!     }
//! }
//! ```

pub mod buffer;
pub mod chunk;
pub mod line;
pub mod merger;
pub mod sort;

pub use buffer::ChunkBuffer;
pub use chunk::{ExternalChunk, RunId, RunStore, TmpDirRunStore};
pub use line::{Line, Lines};
pub use merger::BinaryHeapMerger;
pub use sort::{
    CleanupError, CleanupTarget, ExternalSorter, ExternalSorterBuilder, Phase, SortError, SortSummary,
    DEFAULT_CHUNK_SIZE,
};
