use schema_remap::uri::URI;

use super::row::TestRow;

pub trait TestableDatabase {
    fn get_uri(&self) -> URI;

    fn execute(&mut self, query: &str);

    /// Table with columns (id, name, amount, payload)
    fn create_test_table(&mut self, table_name: &str);

    fn fill_test_table(&mut self, table_name: &str, num_rows: usize);

    fn get_all_rows(&mut self, table_name: &str) -> Vec<TestRow>;

    fn query_count(&mut self, query: &str) -> u64;

    fn count_rows(&mut self, table_name: &str) -> u64 {
        return self.query_count(&format!("SELECT count(1) FROM {table_name}"));
    }
}
