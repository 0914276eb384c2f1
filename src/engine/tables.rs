use crate::config::DataFrameLink;
use crate::error::{DuckPanelError, Result, TableError};
use duckdb::Connection;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

static ALIAS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("alias pattern regex is valid"));

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn validate_alias(alias: &str) -> Result<()> {
    if ALIAS_PATTERN.is_match(alias) {
        Ok(())
    } else {
        Err(DuckPanelError::InvalidAlias(alias.to_string()))
    }
}

pub fn create_table_sql(link: &DataFrameLink) -> Result<String> {
    validate_alias(&link.alias)?;
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {alias} AS (SELECT * FROM {url})",
        alias = quote_identifier(&link.alias),
        url = quote_literal(&link.url),
    ))
}

/// Creates one table per link, attempting every link before reporting.
///
/// Tables created before a failure are kept. Existing tables are left as
/// they are, so the first declaration of an alias wins.
pub(crate) fn bootstrap_tables(conn: &Connection, links: &[DataFrameLink]) -> Result<()> {
    let mut failures = Vec::new();

    for link in links {
        let result = create_table_sql(link).and_then(|sql| {
            debug!(alias = %link.alias, %sql, "Creating table");
            conn.execute_batch(&sql).map_err(DuckPanelError::from)
        });

        match result {
            Ok(()) => info!(alias = %link.alias, url = %link.url, "Table ready"),
            Err(error) => {
                warn!(alias = %link.alias, url = %link.url, %error, "Table bootstrap failed");
                failures.push(TableError {
                    alias: link.alias.clone(),
                    url: link.url.clone(),
                    error,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(DuckPanelError::TableBootstrap(failures))
    }
}

pub(crate) fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = 'main' ORDER BY table_name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_csv(dir: &Path, name: &str, content: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_create_table_sql_quotes_inputs() {
        let link = DataFrameLink::new(1, "https://host/it's.csv", "prices");
        assert_eq!(
            create_table_sql(&link).unwrap(),
            r#"CREATE TABLE IF NOT EXISTS "prices" AS (SELECT * FROM 'https://host/it''s.csv')"#
        );
    }

    #[test]
    fn test_invalid_alias_rejected() {
        for alias in ["", "1prices", "drop table x", "a\"b"] {
            let link = DataFrameLink::new(1, "x.csv", alias);
            assert!(matches!(
                create_table_sql(&link),
                Err(DuckPanelError::InvalidAlias(_))
            ));
        }
    }

    #[test]
    fn test_bootstrap_same_link_twice_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let url = write_csv(dir.path(), "prices.csv", "a,b\n1,2\n");
        let conn = Connection::open_in_memory().unwrap();
        let link = DataFrameLink::new(1, url, "prices");

        bootstrap_tables(&conn, &[link.clone()]).unwrap();
        bootstrap_tables(&conn, &[link]).unwrap();

        assert_eq!(list_tables(&conn).unwrap(), vec!["prices".to_string()]);
    }

    #[test]
    fn test_duplicate_alias_first_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_csv(dir.path(), "first.csv", "v\n1\n");
        let second = write_csv(dir.path(), "second.csv", "v\n2\n");
        let conn = Connection::open_in_memory().unwrap();

        bootstrap_tables(
            &conn,
            &[
                DataFrameLink::new(1, first, "data"),
                DataFrameLink::new(2, second, "data"),
            ],
        )
        .unwrap();

        let v: i64 = conn.query_row("SELECT v FROM data", [], |r| r.get(0)).unwrap();
        assert_eq!(v, 1);
    }

    #[test]
    fn test_failures_collected_and_successes_kept() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_csv(dir.path(), "good.csv", "v\n1\n");
        let missing = dir.path().join("missing.csv").to_string_lossy().into_owned();
        let conn = Connection::open_in_memory().unwrap();

        let err = bootstrap_tables(
            &conn,
            &[
                DataFrameLink::new(1, missing, "absent"),
                DataFrameLink::new(2, "x.csv", "bad alias"),
                DataFrameLink::new(3, good, "good"),
            ],
        )
        .unwrap_err();

        match err {
            DuckPanelError::TableBootstrap(failures) => {
                let aliases: Vec<&str> = failures.iter().map(|f| f.alias.as_str()).collect();
                assert_eq!(aliases, vec!["absent", "bad alias"]);
                assert!(matches!(failures[0].error, DuckPanelError::DuckDb(_)));
                assert!(matches!(failures[1].error, DuckPanelError::InvalidAlias(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(list_tables(&conn).unwrap(), vec!["good".to_string()]);
    }

    #[test]
    fn test_empty_links() {
        let conn = Connection::open_in_memory().unwrap();
        bootstrap_tables(&conn, &[]).unwrap();
        assert!(list_tables(&conn).unwrap().is_empty());
    }
}
