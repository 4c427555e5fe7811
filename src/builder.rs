use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bstr::io::BufReadExt;
use bstr::ByteSlice;
use csvparse_core::{count_fields, tokenize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::table::{Table, TableStorage};

const DEFAULT_BUFFER_CAPACITY: usize = 8 * (1 << 10);

/// Builds a `Table` from CSV text.
///
/// The first line of the input is the header. A blank first line is a
/// header with one empty field. Every following non-blank
/// line is a data row that must have exactly as many fields as the header.
/// Lines end with `\n` or `\r\n`, and a line is cut at its first `\r` or
/// `\n`. Blank lines are skipped and do not count as rows.
///
/// Two strategies are available. `from_seekable` makes a sizing pass over
/// the input to count rows, rewinds, and then fills storage that was reserved
/// up front. `from_reader` works on any reader by growing storage as rows
/// arrive. Both produce identical tables.
///
/// # Example
///
/// ```
/// use std::io;
///
/// use csvparse::TableBuilder;
///
/// let data = "name,age\nAlice,30\n\nBob,25\n";
/// let table = TableBuilder::new()
///     .from_seekable(io::Cursor::new(data))
///     .unwrap();
/// assert_eq!(table.header(), &["name", "age"]);
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.column(0).unwrap(), &["Alice", "Bob"]);
/// ```
#[derive(Clone, Debug)]
pub struct TableBuilder {
    capacity: usize,
}

impl Default for TableBuilder {
    fn default() -> TableBuilder {
        TableBuilder { capacity: DEFAULT_BUFFER_CAPACITY }
    }
}

impl TableBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> TableBuilder {
        TableBuilder::default()
    }

    /// Set the capacity (in bytes) of the buffer used to read lines.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut TableBuilder {
        self.capacity = capacity;
        self
    }

    /// Parse the CSV file at the given path.
    ///
    /// Files are seekable, so this uses the two-pass strategy.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        self.from_seekable(File::open(path)?)
    }

    /// Parse CSV data from a seekable reader.
    ///
    /// Parsing starts at the reader's current position. The sizing pass reads
    /// to the end of the input and then seeks back to that position before
    /// the header is read.
    pub fn from_seekable<R: Read + Seek>(&self, mut rdr: R) -> Result<Table> {
        let start = rdr.seek(SeekFrom::Current(0))?;
        let nrows =
            count_rows(BufReader::with_capacity(self.capacity, &mut rdr))?;
        rdr.seek(SeekFrom::Start(start))?;
        debug!(start, rows = nrows, "sizing pass complete");

        let rdr = BufReader::with_capacity(self.capacity, rdr);
        let table = self.build(rdr, nrows)?;
        if table.row_count() != nrows {
            debug!(
                counted = nrows,
                read = table.row_count(),
                "input changed between sizing and row passes"
            );
        }
        Ok(table)
    }

    /// Parse CSV data from any reader, without a sizing pass.
    pub fn from_reader<R: Read>(&self, rdr: R) -> Result<Table> {
        self.build(BufReader::with_capacity(self.capacity, rdr), 0)
    }

    fn build<R: BufRead>(&self, rdr: R, nrows: usize) -> Result<Table> {
        let result = read_table(&mut Lines::new(rdr), nrows);
        if let Err(ref err) = result {
            debug!(error = %err, "parse failed, partial table discarded");
        }
        result
    }
}

/// Run the header pass and the row pass.
///
/// Storage for `nrows` rows is reserved before the row pass starts. Any
/// error drops the storage, and with it every string allocated so far.
fn read_table<R: BufRead>(lines: &mut Lines<R>, nrows: usize) -> Result<Table> {
    let header = match lines.next_line() {
        Err(Error::Io(err)) => {
            debug!(error = %err, "header line is unreadable");
            return Err(Error::EmptyFile);
        }
        Err(err) => return Err(err),
        Ok(None) => return Err(Error::EmptyFile),
        Ok(Some((n, line))) => {
            tokenize(line, count_fields(line))
                .map_err(|err| Error::from_core(err, n))?
        }
    };
    debug!(fields = header.len(), "parsed header");

    let mut storage = TableStorage::new(header, nrows)?;
    while let Some((n, line)) = lines.next_line()? {
        if line.is_empty() {
            trace!(line = n, "skipping blank line");
            continue;
        }
        let expected = storage.field_count();
        let found = count_fields(line);
        if found != expected {
            return Err(Error::Parse {
                line: n,
                expected: expected as u64,
                found: found as u64,
            });
        }
        let fields =
            tokenize(line, expected).map_err(|err| Error::from_core(err, n))?;
        storage.push_row(n, fields)?;
    }
    trace!(rows = storage.row_count(), "row pass complete");
    Ok(storage.finish())
}

/// The sizing pass: count the non-blank lines after the header.
///
/// The first line is always the header, even when it is blank. A final line
/// without a terminator still counts. If the header line cannot be read at
/// all, then this returns `Error::EmptyFile`.
fn count_rows<R: BufRead>(rdr: R) -> Result<usize> {
    let mut seen_header = false;
    let mut rows: usize = 0;
    let res = rdr.for_byte_line(|line| {
        if !seen_header {
            seen_header = true;
        } else if !strip(line).is_empty() {
            rows += 1;
        }
        Ok(true)
    });
    match res {
        Ok(()) => Ok(rows),
        Err(err) if !seen_header => {
            debug!(error = %err, "header line is unreadable");
            Err(Error::EmptyFile)
        }
        Err(err) => Err(Error::Io(err)),
    }
}

/// Cut a line at its first `\r` or `\n`.
fn strip(line: &[u8]) -> &[u8] {
    match line.find_byteset(b"\r\n") {
        None => line,
        Some(i) => &line[..i],
    }
}

/// Reads stripped, UTF-8 validated lines while tracking line numbers.
///
/// The line buffer is reused for every line.
#[derive(Debug)]
struct Lines<R> {
    rdr: R,
    buf: Vec<u8>,
    line: u64,
}

impl<R: BufRead> Lines<R> {
    fn new(rdr: R) -> Lines<R> {
        Lines { rdr, buf: vec![], line: 0 }
    }

    /// Return the next line and its 1-based line number, or `None` at the
    /// end of the input.
    fn next_line(&mut self) -> Result<Option<(u64, &str)>> {
        self.buf.clear();
        if self.rdr.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        let n = self.line;
        let line = strip(&self.buf);
        match line.to_str() {
            Ok(line) => Ok(Some((n, line))),
            Err(err) => {
                debug!(line = n, text = ?line.as_bstr(), "invalid UTF-8");
                Err(Error::Utf8 { line: n, valid_up_to: err.valid_up_to() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read, Seek, SeekFrom};

    use crate::table::TableStorage;

    use crate::error::Error;
    use crate::table::Table;

    use super::{count_rows, strip, TableBuilder};

    fn parse_both(data: &str) -> Result<Table, Error> {
        let seek = TableBuilder::new().from_seekable(io::Cursor::new(data));
        let stream = TableBuilder::new().from_reader(data.as_bytes());
        match (seek, stream) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a, b, "strategies disagree");
                Ok(a)
            }
            (Err(a), Err(b)) => {
                assert_eq!(a.kind(), b.kind(), "strategies disagree");
                Err(a)
            }
            (a, b) => panic!("strategies disagree: {:?} vs {:?}", a, b),
        }
    }

    macro_rules! parses_to {
        (
            $name:ident, $data:expr,
            [$($h:expr),*],
            [$([$($field:expr),*]),*]
        ) => {
            #[test]
            fn $name() {
                let table = parse_both($data).unwrap();
                let header: Vec<&str> = vec![$($h),*];
                let rows: Vec<Vec<&str>> = vec![$(vec![$($field),*]),*];
                assert_eq!(table.header(), &*header);
                assert_eq!(table.field_count(), header.len());
                assert_eq!(table.row_count(), rows.len());
                let got: Vec<Vec<&str>> =
                    table.rows().map(|r| r.iter().collect()).collect();
                assert_eq!(got, rows);
            }
        };
    }

    macro_rules! parse_error {
        ($name:ident, $data:expr, $line:expr, $expected:expr, $found:expr) => {
            #[test]
            fn $name() {
                match parse_both($data) {
                    Err(Error::Parse { line, expected, found }) => {
                        assert_eq!(line, $line, "line");
                        assert_eq!(expected, $expected, "expected");
                        assert_eq!(found, $found, "found");
                    }
                    res => panic!("expected parse error, got {:?}", res),
                }
            }
        };
    }

    macro_rules! empty_file {
        ($name:ident, $data:expr) => {
            #[test]
            fn $name() {
                match parse_both($data) {
                    Err(Error::EmptyFile) => {}
                    res => panic!("expected empty file, got {:?}", res),
                }
            }
        };
    }

    parses_to!(
        people,
        "name,age\nAlice,30\nBob,25\n",
        ["name", "age"],
        [["Alice", "30"], ["Bob", "25"]]
    );
    parses_to!(
        crlf,
        "name,age\r\nAlice,30\r\nBob,25\r\n",
        ["name", "age"],
        [["Alice", "30"], ["Bob", "25"]]
    );
    parses_to!(
        no_trailing_newline,
        "a,b\n1,2",
        ["a", "b"],
        [["1", "2"]]
    );
    parses_to!(header_only, "a,b,c\n", ["a", "b", "c"], []);
    parses_to!(header_only_no_newline, "a,b,c", ["a", "b", "c"], []);
    parses_to!(
        blank_lines_skipped,
        "a,b\n\n1,2\n\r\n\n3,4\n\n",
        ["a", "b"],
        [["1", "2"], ["3", "4"]]
    );
    parses_to!(
        quoted_comma,
        "a,b\n\"x,y\",z\n",
        ["a", "b"],
        [["\"x,y\"", "z"]]
    );
    parses_to!(
        quoted_header,
        "\"last, first\",age\n\"Doe, J\",40\n",
        ["\"last, first\"", "age"],
        [["\"Doe, J\"", "40"]]
    );
    parses_to!(
        empty_fields,
        "a,b,c\n,,\n1,,3\n",
        ["a", "b", "c"],
        [["", "", ""], ["1", "", "3"]]
    );
    parses_to!(
        single_column,
        "name\nAlice\nBob\n",
        ["name"],
        [["Alice"], ["Bob"]]
    );
    parses_to!(
        lone_cr_cuts_line,
        "a,b\n1,2\rjunk\n",
        ["a", "b"],
        [["1", "2"]]
    );
    parses_to!(
        unicode,
        "città,naïve\nRoma,日本\n",
        ["città", "naïve"],
        [["Roma", "日本"]]
    );

    parse_error!(too_many_fields, "name,age\nAlice,30,oops\n", 2, 2, 3);
    parse_error!(too_few_fields, "a,b,c\n1,2,3\n4,5\n", 3, 3, 2);
    parse_error!(line_numbers_count_blanks, "a,b\n\n\n1\n", 4, 2, 1);
    parse_error!(
        quote_state_is_per_line,
        "a,b\n\"1,2\n3,4\n",
        2,
        2,
        1
    );

    parses_to!(blank_header, "\n1\n2\n", [""], [["1"], ["2"]]);
    parses_to!(blank_header_crlf, "\r\n", [""], []);
    parses_to!(blank_header_then_blanks, "\n\n1\n\n", [""], [["1"]]);
    parse_error!(blank_header_is_one_field, "\na,b\n", 2, 1, 2);

    empty_file!(empty, "");

    /// A reader that fails every read. It can be rewound, but never read.
    struct Unreadable;

    impl Read for Unreadable {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "unreadable"))
        }
    }

    impl Seek for Unreadable {
        fn seek(&mut self, _: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    /// A reader that yields `data` once and then fails every read.
    struct FailsAfter(&'static [u8]);

    impl Read for FailsAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() {
                return Err(io::Error::new(io::ErrorKind::Other, "gone"));
            }
            let n = std::cmp::min(buf.len(), self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn unreadable_first_line_is_empty_file() {
        match TableBuilder::new().from_reader(Unreadable) {
            Err(Error::EmptyFile) => {}
            res => panic!("expected empty file, got {:?}", res),
        }
        match TableBuilder::new().from_seekable(Unreadable) {
            Err(Error::EmptyFile) => {}
            res => panic!("expected empty file, got {:?}", res),
        }
        match count_rows(io::BufReader::new(Unreadable)) {
            Err(Error::EmptyFile) => {}
            res => panic!("expected empty file, got {:?}", res),
        }
    }

    #[test]
    fn read_failure_after_header_is_io() {
        let err = TableBuilder::new()
            .from_reader(FailsAfter(b"a,b\n"))
            .unwrap_err();
        assert!(err.is_io_error(), "{:?}", err);
    }

    #[test]
    fn storage_out_of_memory() {
        let header = vec!["a".to_string()];
        match TableStorage::new(header, usize::MAX) {
            Err(Error::OutOfMemory) => {}
            res => panic!("expected out of memory, got {:?}", res),
        }
    }

    #[test]
    fn invalid_utf8() {
        let data: &[u8] = b"a,b\n1,\xFF\n";
        let err = TableBuilder::new().from_reader(data).unwrap_err();
        match err {
            Error::Utf8 { line, valid_up_to } => {
                assert_eq!(line, 2);
                assert_eq!(valid_up_to, 2);
            }
            err => panic!("unexpected error: {:?}", err),
        }
    }

    #[test]
    fn sizing_counts_non_blank_lines() {
        let count = |s: &str| count_rows(s.as_bytes()).unwrap();
        assert_eq!(count(""), 0);
        assert_eq!(count("a,b\n"), 0);
        assert_eq!(count("\n1\n\n2"), 2);
        assert_eq!(count("a,b\n1,2"), 1);
        assert_eq!(count("a,b\n1,2\n\n\r\n3,4\n"), 2);
    }

    #[test]
    fn sizing_pass_reserves_rows() {
        let data = "a,b\n1,2\n\n3,4\n";
        let table =
            TableBuilder::new().from_seekable(io::Cursor::new(data)).unwrap();
        assert_eq!(table.row_count(), 2);
        for col in 0..table.field_count() {
            assert_eq!(table.column(col).unwrap().len(), 2);
        }
    }

    #[test]
    fn rewinds_to_start_position() {
        let data = "garbage line\na,b\n1,2\n";
        let mut cur = io::Cursor::new(data);
        let mut skip = [0; 13];
        cur.read_exact(&mut skip).unwrap();
        let table = TableBuilder::new().from_seekable(&mut cur).unwrap();
        assert_eq!(table.header(), &["a", "b"]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(cur.seek(SeekFrom::Current(0)).unwrap(), data.len() as u64);
    }

    #[test]
    fn tiny_buffer() {
        let data = "name,age\nAlice,30\nBob,25\n";
        let table = TableBuilder::new()
            .buffer_capacity(1)
            .from_seekable(io::Cursor::new(data))
            .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1, 1), Some("25"));
    }

    #[test]
    fn strip_cuts_at_first_terminator() {
        assert_eq!(strip(b"abc\n"), b"abc");
        assert_eq!(strip(b"abc\r\n"), b"abc");
        assert_eq!(strip(b"a\rb\n"), b"a");
        assert_eq!(strip(b"abc"), b"abc");
        assert_eq!(strip(b"\n"), b"");
    }
}
