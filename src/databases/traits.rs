use super::table::{Row, TableInfo};

pub trait DBInfoProvider {
    fn table_exists(&mut self, table: &str) -> anyhow::Result<bool>;

    fn get_table_info(&mut self, table: &str, no_count: bool) -> anyhow::Result<TableInfo>;

    /// Names of all tables visible to the connection, sorted.
    fn get_tables(&mut self) -> anyhow::Result<Vec<String>>;
}

pub type ReaderIterator<'a> = Box<dyn Iterator<Item = anyhow::Result<Row>> + 'a>;

pub trait DBReader: DBInfoProvider {
    /// Streams rows of `target_format.name` restricted to the columns of
    /// `target_format`, in that column order.
    fn read_iter(&mut self, target_format: TableInfo) -> anyhow::Result<ReaderIterator<'_>>;
}

pub trait DBWriter: DBInfoProvider {
    /// Clears `target_format.name` and fills it with `rows` (laid out as the
    /// columns of `target_format`) in a single transaction. Nothing is
    /// committed unless every row was written. Returns the number of rows
    /// written.
    fn replace_rows(
        &mut self,
        target_format: &TableInfo,
        rows: ReaderIterator<'_>,
        batch_size: usize,
    ) -> anyhow::Result<u64>;
}
