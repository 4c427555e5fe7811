use std::ops;

use crate::error::{Error, Result};

/// A fully parsed CSV table.
///
/// A table consists of a header and a rectangular grid of cells. Cells are
/// stored column-major: there are exactly `field_count` columns and each
/// column holds exactly `row_count` values. This invariant is established
/// when the table is built and cannot be broken afterwards, since a table
/// exposes no way to mutate its contents.
///
/// A table owns all of its text. Dropping it, or calling `release`, frees
/// every header name and every cell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Table {
    header: Vec<String>,
    columns: Vec<Vec<String>>,
    nrows: usize,
}

impl Table {
    /// Build a table from a header and a sequence of rows.
    ///
    /// Every row must have exactly as many fields as the header. If one does
    /// not, then a parse error is returned whose line number is the line the
    /// row would occupy when written (the header is line `1`). If the header
    /// has no fields, then `Error::EmptyFile` is returned.
    ///
    /// # Example
    ///
    /// ```
    /// use csvparse::Table;
    ///
    /// let table = Table::from_rows(
    ///     vec!["name", "age"],
    ///     vec![vec!["Alice", "30"], vec!["Bob", "25"]],
    /// ).unwrap();
    /// assert_eq!(table.row_count(), 2);
    /// assert_eq!(table.column(1).unwrap(), &["30", "25"]);
    /// ```
    pub fn from_rows<I, R, S>(header: R, rows: I) -> Result<Table>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        if header.is_empty() {
            return Err(Error::EmptyFile);
        }
        let mut storage = TableStorage::new(header, 0)?;
        for (i, row) in rows.into_iter().enumerate() {
            let fields = row.into_iter().map(Into::into).collect();
            storage.push_row(i as u64 + 2, fields)?;
        }
        Ok(storage.finish())
    }

    /// The header names, in source column order.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// The number of fields in the header, and therefore in every row.
    pub fn field_count(&self) -> usize {
        self.header.len()
    }

    /// The number of data rows. Blank lines in the source are not rows.
    pub fn row_count(&self) -> usize {
        self.nrows
    }

    /// Returns true if and only if this table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// Return all values in column `i`, in row order.
    pub fn column(&self, i: usize) -> Option<&[String]> {
        self.columns.get(i).map(|col| &**col)
    }

    /// Return all values of the first column whose header is `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&[String]> {
        let i = self.header.iter().position(|h| h == name)?;
        self.column(i)
    }

    /// Return the cell at the given row and column.
    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|col| col.get(row))
            .map(|cell| &**cell)
    }

    /// Return a view of row `i`.
    pub fn row(&self, i: usize) -> Option<Row<'_>> {
        if i < self.nrows {
            Some(Row { table: self, index: i })
        } else {
            None
        }
    }

    /// Returns an iterator over all rows in this table.
    pub fn rows(&self) -> Rows<'_> {
        Rows { table: self, next: 0 }
    }

    /// Free this table and everything it owns.
    ///
    /// This is the same as dropping the table.
    pub fn release(self) {}
}

impl<'a> IntoIterator for &'a Table {
    type IntoIter = Rows<'a>;
    type Item = Row<'a>;

    fn into_iter(self) -> Rows<'a> {
        self.rows()
    }
}

/// A borrowed view of one row in a table.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    /// The 0-based index of this row in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The number of fields in this row. This always equals the table's
    /// field count.
    pub fn len(&self) -> usize {
        self.table.field_count()
    }

    /// Returns true if and only if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the field at index `i`.
    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.table.get(self.index, i)
    }

    /// Returns an iterator over all fields in this row.
    pub fn iter(&self) -> RowIter<'a> {
        RowIter { row: *self, field: 0 }
    }
}

impl<'a> ops::Index<usize> for Row<'a> {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        &self.table.columns[i][self.index]
    }
}

impl<'a> IntoIterator for Row<'a> {
    type IntoIter = RowIter<'a>;
    type Item = &'a str;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

/// An iterator over the fields of a row.
#[derive(Clone, Debug)]
pub struct RowIter<'a> {
    row: Row<'a>,
    field: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let field = self.row.get(self.field)?;
        self.field += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.row.len() - self.field;
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for RowIter<'a> {}

/// An iterator over the rows of a table.
#[derive(Clone, Debug)]
pub struct Rows<'a> {
    table: &'a Table,
    next: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Row<'a>> {
        let row = self.table.row(self.next)?;
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.table.row_count() - self.next;
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for Rows<'a> {}

/// Column storage for a table under construction.
///
/// This is never exposed. If building fails, the storage is simply dropped,
/// which frees the header and every cell pushed so far.
#[derive(Debug)]
pub(crate) struct TableStorage {
    header: Vec<String>,
    columns: Vec<Vec<String>>,
    nrows: usize,
}

impl TableStorage {
    /// Reserve one column per header field, each with room for `rows`
    /// values.
    pub(crate) fn new(header: Vec<String>, rows: usize) -> Result<TableStorage> {
        let mut columns = Vec::new();
        columns.try_reserve_exact(header.len())?;
        for _ in 0..header.len() {
            let mut column = Vec::new();
            column.try_reserve_exact(rows)?;
            columns.push(column);
        }
        Ok(TableStorage { header, columns, nrows: 0 })
    }

    pub(crate) fn field_count(&self) -> usize {
        self.header.len()
    }

    pub(crate) fn row_count(&self) -> usize {
        self.nrows
    }

    /// Append one row, distributing its fields across the columns.
    ///
    /// `line` is only used for error reporting. Room for the new cells is
    /// reserved in every column before any cell is moved, so a failure
    /// never leaves the columns with different lengths.
    pub(crate) fn push_row(
        &mut self,
        line: u64,
        fields: Vec<String>,
    ) -> Result<()> {
        if fields.len() != self.header.len() {
            return Err(Error::Parse {
                line,
                expected: self.header.len() as u64,
                found: fields.len() as u64,
            });
        }
        for column in &mut self.columns {
            column.try_reserve(1)?;
        }
        for (column, field) in self.columns.iter_mut().zip(fields) {
            column.push(field);
        }
        self.nrows += 1;
        Ok(())
    }

    pub(crate) fn finish(self) -> Table {
        debug_assert!(self.columns.iter().all(|c| c.len() == self.nrows));
        Table { header: self.header, columns: self.columns, nrows: self.nrows }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::ser::{Serialize, SerializeSeq, SerializeStruct, Serializer};

    use super::{Row, Table};

    struct SerializeRows<'a>(&'a Table);

    impl Serialize for Table {
        fn serialize<S: Serializer>(
            &self,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut st = serializer.serialize_struct("Table", 2)?;
            st.serialize_field("header", &self.header)?;
            st.serialize_field("rows", &SerializeRows(self))?;
            st.end()
        }
    }

    impl<'a> Serialize for SerializeRows<'a> {
        fn serialize<S: Serializer>(
            &self,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.0.row_count()))?;
            for row in self.0.rows() {
                seq.serialize_element(&row)?;
            }
            seq.end()
        }
    }

    impl<'a> Serialize for Row<'a> {
        fn serialize<S: Serializer>(
            &self,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for field in self.iter() {
                seq.serialize_element(field)?;
            }
            seq.end()
        }
    }
}
