use std::fs;
use std::io;

use rand::seq::SliceRandom;
use rstest::*;

use line_sort::ExternalSorterBuilder;

#[fixture]
fn work_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

#[rstest]
#[case(16, None)]
#[case(256, Some(8))]
#[case(1 << 20, None)]
fn test_sort_file(work_dir: tempfile::TempDir, #[case] chunk_size: u64, #[case] rw_buf_size: Option<usize>) {
    let tmp_dir = work_dir.path().join("tmp");
    fs::create_dir(&tmp_dir).unwrap();

    let mut lines: Vec<String> = (0..1000).map(|i| format!("line-{:04}", i % 700)).collect();
    let mut expected = lines.clone();
    expected.sort();
    lines.shuffle(&mut rand::thread_rng());

    let input_path = work_dir.path().join("input.txt");
    let output_path = work_dir.path().join("output.txt");
    fs::write(&input_path, lines.join("\n")).unwrap();

    let mut builder = ExternalSorterBuilder::new()
        .with_tmp_dir(&tmp_dir)
        .with_chunk_size(chunk_size);
    if let Some(rw_buf_size) = rw_buf_size {
        builder = builder.with_rw_buf_size(rw_buf_size);
    }
    let sorter = builder.build().unwrap();

    let input = io::BufReader::new(fs::File::open(&input_path).unwrap());
    let output = io::BufWriter::new(fs::File::create(&output_path).unwrap());
    let summary = sorter.sort(input, output).unwrap();

    let actual = fs::read_to_string(&output_path).unwrap();
    assert_eq!(actual, format!("{}\n", expected.join("\n")));
    assert_eq!(summary.lines, 1000);
    assert!(summary.is_clean());
    assert_eq!(fs::read_dir(&tmp_dir).unwrap().count(), 0);
}
