//! ClickHouse backend over the HTTP interface

use crate::error::{DbError, DbResult};
use crate::traits::{Connection, Connector};
use ct_core::{Column, Schema, SessionConfig};
use reqwest::blocking::Client;

/// Opens HTTP "connections" to a ClickHouse server.
///
/// The HTTP interface is stateless, so opening a connection only checks that
/// the server answers `/ping`.
#[derive(Debug, Clone)]
pub struct ClickHouseConnector {
    client: Client,
}

impl ClickHouseConnector {
    pub fn new() -> DbResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Connector for ClickHouseConnector {
    fn open(&self, config: &SessionConfig) -> DbResult<Box<dyn Connection>> {
        let scheme = if config.secure { "https" } else { "http" };
        let url = format!("{}://{}:{}/", scheme, config.host, config.port);

        self.client
            .get(format!("{}ping", url))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| DbError::Connection(format!("{}: {}", url, e)))?;

        Ok(Box::new(ClickHouseConnection {
            client: self.client.clone(),
            url,
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.database().map(str::to_string),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "clickhouse"
    }
}

/// A single-operation handle to a ClickHouse server
#[derive(Debug)]
pub struct ClickHouseConnection {
    client: Client,
    url: String,
    user: String,
    password: String,
    database: Option<String>,
}

impl ClickHouseConnection {
    /// POST a statement and return the response body
    fn post(&self, sql: &str) -> DbResult<String> {
        let mut request = self
            .client
            .post(&self.url)
            .header("X-ClickHouse-User", &self.user)
            .body(sql.to_string());
        if !self.password.is_empty() {
            request = request.header("X-ClickHouse-Key", &self.password);
        }
        if let Some(db) = &self.database {
            request = request.query(&[("database", db.as_str())]);
        }

        let response = request.send().map_err(|e| DbError::store(sql, e))?;
        let status = response.status();
        let body = response.text().map_err(|e| DbError::store(sql, e))?;
        if !status.is_success() {
            return Err(DbError::Store {
                statement: sql.to_string(),
                message: format!("HTTP {}: {}", status.as_u16(), body.trim()),
            });
        }
        Ok(body)
    }
}

impl Connection for ClickHouseConnection {
    fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.post(sql).map(|_| ())
    }

    fn list_tables(&mut self) -> DbResult<Vec<String>> {
        let body = self.post("SHOW TABLES FORMAT TabSeparated")?;
        Ok(body
            .lines()
            .filter(|l| !l.is_empty())
            .map(unescape_tsv_field)
            .collect())
    }

    fn describe(&mut self, query: &str) -> DbResult<Schema> {
        let sql = format!("DESCRIBE TABLE ({}) FORMAT TabSeparated", query);
        let body = self.post(&sql)?;
        parse_describe_tsv(&body)
    }

    fn close(self: Box<Self>) -> DbResult<()> {
        Ok(())
    }
}

/// Parse `DESCRIBE ... FORMAT TabSeparated` output: name, type, then
/// columns we do not need.
pub(crate) fn parse_describe_tsv(body: &str) -> DbResult<Schema> {
    body.lines()
        .filter(|l| !l.is_empty())
        .map(|line| {
            let mut fields = line.split('\t');
            match (fields.next(), fields.next()) {
                (Some(name), Some(ty)) if !name.is_empty() => {
                    Ok(Column::new(unescape_tsv_field(name), unescape_tsv_field(ty)))
                }
                _ => Err(DbError::Protocol(format!(
                    "malformed DESCRIBE row: {:?}",
                    line
                ))),
            }
        })
        .collect::<DbResult<Vec<_>>>()
        .map(Schema::new)
}

/// Undo TabSeparated escaping
pub(crate) fn unescape_tsv_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_describe() {
        let body = "id\tUInt64\t\t\t\t\t\namount\tNullable(Float64)\t\t\t\t\t\n";
        let schema = parse_describe_tsv(body).unwrap();
        assert_eq!(schema.names(), vec!["id", "amount"]);
        assert_eq!(schema.columns()[1].data_type, "Nullable(Float64)");
    }

    #[test]
    fn test_parse_describe_rejects_garbage() {
        assert!(matches!(
            parse_describe_tsv("just one field\n"),
            Err(DbError::Protocol(_))
        ));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_tsv_field(r"a\tb\\c\'d"), "a\tb\\c'd");
        assert_eq!(unescape_tsv_field("trailing\\"), "trailing\\");
        assert_eq!(
            unescape_tsv_field(r"Map(String, Array(String))"),
            "Map(String, Array(String))"
        );
    }

    #[test]
    fn test_open_unreachable_server() {
        let connector = ClickHouseConnector::new().unwrap();
        let config = SessionConfig {
            host: "127.0.0.1".into(),
            port: 1,
            ..Default::default()
        };
        assert!(matches!(
            connector.open(&config),
            Err(DbError::Connection(_))
        ));
    }
}
