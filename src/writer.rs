use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::Result;
use crate::table::Table;

const DEFAULT_BUFFER_CAPACITY: usize = 8 * (1 << 10);

/// A record terminator.
///
/// The default is `LF`. Both terminators are understood by the parser.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// Writes `\n` after each record.
    LF,
    /// Writes `\r\n` after each record.
    CRLF,
}

impl Terminator {
    fn as_bytes(&self) -> &'static [u8] {
        match *self {
            Terminator::LF => b"\n",
            Terminator::CRLF => b"\r\n",
        }
    }
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::LF
    }
}

/// Builds a CSV writer with various configuration knobs.
#[derive(Debug)]
pub struct WriterBuilder {
    capacity: usize,
    term: Terminator,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            capacity: DEFAULT_BUFFER_CAPACITY,
            term: Terminator::default(),
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV writing.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration that writes data to `wtr`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer {
            wtr: io::BufWriter::with_capacity(self.capacity, wtr),
            term: self.term,
        }
    }

    /// Build a CSV writer from this configuration that writes data to the
    /// given file path. The file is truncated if it already exists.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        Ok(self.from_writer(File::create(path)?))
    }

    /// The record terminator to use when writing CSV.
    ///
    /// The default is `Terminator::LF`.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.term = term;
        self
    }

    /// Set the capacity (in bytes) of the internal buffer.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut WriterBuilder {
        self.capacity = capacity;
        self
    }
}

/// A CSV writer.
///
/// This writer renders each record as its fields joined by `,` followed by
/// the record terminator. Fields are written verbatim: nothing is quoted or
/// escaped. A table whose cells contain no `,`, `"` or line terminator reads
/// back as an identical table.
///
/// Output is buffered. Call `flush` (or drop the writer) to make sure
/// everything reaches the underlying writer.
///
/// # Example
///
/// ```
/// use csvparse::Writer;
///
/// let mut wtr = Writer::from_writer(vec![]);
/// wtr.write_record(&["a", "b"]).unwrap();
/// wtr.write_record(&["1", "2"]).unwrap();
///
/// let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "a,b\n1,2\n");
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: io::BufWriter<W>,
    term: Terminator,
}

impl Writer<File> {
    /// Build a CSV writer with a default configuration that writes data to
    /// the given file path. The file is truncated if it already exists.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    /// Build a CSV writer with a default configuration that writes data to
    /// `wtr`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Write a single record.
    ///
    /// Fields are separated by `,` and the record is followed by the
    /// configured terminator. There is never a trailing `,`.
    pub fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        for (i, field) in record.into_iter().enumerate() {
            if i > 0 {
                io::Write::write_all(&mut self.wtr, b",")?;
            }
            io::Write::write_all(&mut self.wtr, field.as_ref())?;
        }
        io::Write::write_all(&mut self.wtr, self.term.as_bytes())?;
        Ok(())
    }

    /// Write a table: its header line followed by every row in order.
    pub fn write_table(&mut self, table: &Table) -> Result<()> {
        self.write_record(table.header())?;
        for row in table.rows() {
            self.write_record(row)?;
        }
        Ok(())
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut self.wtr)
    }

    /// Return a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.wtr.get_ref()
    }

    /// Flush the internal buffer and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.wtr.into_inner().map_err(|err| err.into_error().into())
    }
}
