use fake::{Fake, Faker};
use postgres::{Client, NoTls};
use schema_remap::uri::URI;
use testcontainers::{Container, runners::SyncRunner};

use super::{row::TestRow, testable_database::TestableDatabase};

pub struct TestPostgresDatabase {
    pub uri: String,
    pub client: Client,
    container: Container<testcontainers_modules::postgres::Postgres>,
}

impl TestPostgresDatabase {
    pub fn new() -> Self {
        let container = testcontainers_modules::postgres::Postgres::default()
            .start()
            .unwrap();

        let uri = format!(
            "postgres://postgres:postgres@{}:{}/postgres",
            container.get_host().unwrap(),
            container.get_host_port_ipv4(5432).unwrap(),
        );
        let client = Client::connect(&uri, NoTls)
            .expect("Unable to connect to the database created for tests");

        return Self {
            uri,
            client,
            container,
        };
    }
}

impl TestableDatabase for TestPostgresDatabase {
    fn get_uri(&self) -> URI {
        return URI::Postgres(self.uri.clone());
    }

    fn execute(&mut self, query: &str) {
        self.client.batch_execute(query).unwrap();
    }

    fn create_test_table(&mut self, name: &str) {
        let query = format!(
            "CREATE TABLE {name} (id BIGINT PRIMARY KEY, name TEXT, amount DOUBLE PRECISION, payload BYTEA)"
        );
        self.client
            .execute(&query, &[])
            .expect("Failed to create table");
    }

    fn fill_test_table(&mut self, name: &str, num_rows: usize) {
        let mut trx = self.client.transaction().unwrap();
        let query = format!("INSERT INTO {name} VALUES ($1, $2, $3, $4)");
        let stmt = trx.prepare(&query).unwrap();
        for i in 0..num_rows {
            let mut row: TestRow = Faker.fake();
            row.id = i as i64;
            trx.execute(&stmt, &[&row.id, &row.name, &row.amount, &row.payload])
                .unwrap();
        }
        trx.commit().unwrap();
    }

    fn get_all_rows(&mut self, table_name: &str) -> Vec<TestRow> {
        let query = format!("SELECT id, name, amount, payload FROM {table_name} ORDER BY id");

        return self
            .client
            .query(&query, &[])
            .unwrap()
            .into_iter()
            .map(|row| row.into())
            .collect();
    }

    fn query_count(&mut self, query: &str) -> u64 {
        let count: i64 = self.client.query_one(query, &[]).unwrap().get(0);
        return count as u64;
    }
}
