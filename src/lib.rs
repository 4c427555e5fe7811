/*!
The `csvparse` crate reads CSV text into an in-memory [`Table`] and writes
tables back out as CSV.

The dialect is deliberately small. Fields are separated by `,`. A `"`
toggles a quoted region in which `,` does not separate fields, and the
quote characters themselves are kept in the field values. Lines end with
`\n` or `\r\n`. The first line is the header, and every other non-blank
line is a row with exactly as many fields as the header. Blank lines are
skipped. Every value is text.

Parsing is all-or-nothing. Either a complete, rectangular table is returned,
or an [`Error`] is returned and nothing that was allocated along the way
survives.

# Example

```
use std::io;

let data = "name,age\nAlice,30\nBob,25\n";
let table = csvparse::parse(io::Cursor::new(data)).unwrap();
assert_eq!(table.header(), &["name", "age"]);
assert_eq!(table.row_count(), 2);
assert_eq!(table.column(0).unwrap(), &["Alice", "Bob"]);
assert_eq!(table.column(1).unwrap(), &["30", "25"]);

let mut out = vec![];
csvparse::write(&table, &mut out).unwrap();
assert_eq!(out, data.as_bytes());
csvparse::release(table);
```

A line with the wrong number of fields fails the whole parse:

```
use csvparse::ErrorKind;

let data = "name,age\nAlice,30,oops\n";
let err = csvparse::parse_reader(data.as_bytes()).unwrap_err();
assert_eq!(err.kind(), ErrorKind::Parse);
```
*/

#![deny(missing_docs)]

use std::io;
use std::path::Path;

pub use crate::builder::TableBuilder;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::table::{Row, RowIter, Rows, Table};
pub use crate::writer::{Terminator, Writer, WriterBuilder};

mod builder;
mod error;
mod table;
mod writer;

/// Parse CSV data from a seekable reader using the two-pass strategy.
///
/// See [`TableBuilder::from_seekable`].
pub fn parse<R: io::Read + io::Seek>(rdr: R) -> Result<Table> {
    TableBuilder::new().from_seekable(rdr)
}

/// Parse CSV data from any reader, growing storage as rows arrive.
///
/// See [`TableBuilder::from_reader`].
pub fn parse_reader<R: io::Read>(rdr: R) -> Result<Table> {
    TableBuilder::new().from_reader(rdr)
}

/// Parse the CSV file at the given path.
pub fn parse_path<P: AsRef<Path>>(path: P) -> Result<Table> {
    TableBuilder::new().from_path(path)
}

/// Write a table to `wtr` as CSV and flush it.
///
/// The header line comes first, followed by each row. Fields are written
/// verbatim, without quoting.
pub fn write<W: io::Write>(table: &Table, wtr: W) -> Result<()> {
    let mut wtr = Writer::from_writer(wtr);
    wtr.write_table(table)?;
    wtr.flush()?;
    Ok(())
}

/// Free a table and everything it owns.
///
/// Dropping a table has the same effect. Since this takes the table by
/// value, a table can never be released twice.
pub fn release(table: Table) {
    table.release();
}
