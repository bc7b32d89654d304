//! Newline-delimited line reading and writing.

use std::io::{self, prelude::*};

/// A single line without its terminating newline.
/// Lines are compared byte-wise, so no UTF-8 validation is performed.
pub type Line = Vec<u8>;

/// Iterator over newline-delimited lines of a buffered reader.
///
/// Unlike [`BufRead::lines`] it yields raw bytes without UTF-8 validation.
/// The last line of the stream is returned even if it is not terminated by a newline.
pub struct Lines<R> {
    reader: R,
    strip_cr: bool,
}

impl<R: BufRead> Lines<R> {
    /// Splits the stream on `\n` only, carriage returns are kept as line content.
    pub fn new(reader: R) -> Self {
        Lines {
            reader,
            strip_cr: false,
        }
    }

    /// Splits the stream on `\n` treating a preceding `\r` as part of the terminator.
    pub fn crlf(reader: R) -> Self {
        Lines { reader, strip_cr: true }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = io::Result<Line>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                    if self.strip_cr && line.last() == Some(&b'\r') {
                        line.pop();
                    }
                }
                Some(Ok(line))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// Writes a line followed by a newline.
pub fn write_line<W: Write + ?Sized>(writer: &mut W, line: &[u8]) -> io::Result<()> {
    writer.write_all(line)?;
    writer.write_all(b"\n")
}

/// Serialized line size: its content plus one newline separator.
pub fn serialized_size(line: &[u8]) -> u64 {
    line.len() as u64 + 1
}

#[cfg(test)]
mod test {
    use std::io;

    use rstest::*;

    use super::{write_line, Line, Lines};

    #[rstest]
    #[case("", &[])]
    #[case("\n", &[""])]
    #[case("a\nb\n", &["a", "b"])]
    #[case("a\nb", &["a", "b"])]
    #[case("a\n\n\nb\n", &["a", "", "", "b"])]
    #[case("a\r\nb\n", &["a", "b"])]
    #[case("a\r\nb\r\n", &["a", "b"])]
    #[case("a\r\r\nb", &["a\r", "b"])]
    #[case("a\rb\n", &["a\rb"])]
    #[case("a\r", &["a\r"])]
    fn test_crlf_lines(#[case] input: &str, #[case] expected: &[&str]) {
        let actual: Vec<Line> = Lines::crlf(input.as_bytes()).collect::<io::Result<_>>().unwrap();
        let expected: Vec<Line> = expected.iter().map(|line| line.as_bytes().to_vec()).collect();

        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case("a\nb", &["a", "b"])]
    #[case("a\r\nb\n", &["a\r", "b"])]
    #[case("\r\n\n", &["\r", ""])]
    fn test_lines(#[case] input: &str, #[case] expected: &[&str]) {
        let actual: Vec<Line> = Lines::new(input.as_bytes()).collect::<io::Result<_>>().unwrap();
        let expected: Vec<Line> = expected.iter().map(|line| line.as_bytes().to_vec()).collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_lines_non_utf8() {
        let input: &[u8] = b"\xff\xfe\nok\n";
        let actual: Vec<Line> = Lines::new(input).collect::<io::Result<_>>().unwrap();

        assert_eq!(actual, vec![vec![0xff, 0xfe], b"ok".to_vec()]);
    }

    #[test]
    fn test_write_line() {
        let mut output = Vec::new();
        write_line(&mut output, b"apple").unwrap();
        write_line(&mut output, b"").unwrap();

        assert_eq!(output, b"apple\n\n");
    }
}
