//! The abstract bulk-load sink (§6): the only surface the core depends
//! on for talking to a shard. The wire protocol itself is out of core
//! scope, but a concrete Postgres adapter is provided since the pipe end
//! the Sender writes into has to terminate somewhere.

use std::io::{Read, Write};

use crate::err::ShardLoadError;

/// Opens sessions against one shard. A Job creates one `BulkSink` per
/// shard at start and calls [`BulkSink::open`] once per Sender.
pub trait BulkSink: Send + Sync {
    /// The open session type this sink produces.
    type Session: BulkSinkSession;

    /// Opens a new session against the shard. Connect failures are
    /// fatal (`SinkError`, §7).
    fn open(&self) -> Result<Self::Session, ShardLoadError>;
}

/// A single streaming bulk-load session. The Sender calls
/// [`BulkSinkSession::copy_from`] exactly once for the whole Job, passing
/// the Drain-fed pipe as `data`, then [`BulkSinkSession::close`].
pub trait BulkSinkSession {
    /// Streams `data` to EOF as the body of `command`, returning the
    /// number of rows the sink reports inserted.
    fn copy_from(&mut self, command: &str, data: impl Read) -> Result<u64, ShardLoadError>;

    /// Closes the session. Called only after `copy_from` has returned
    /// successfully — never used to abort an in-flight load (§4.6:
    /// "MUST NOT be closed... before the sink signals completion").
    fn close(self) -> Result<(), ShardLoadError>;
}

/// Quotes a SQL identifier: wraps it in double quotes, doubles any
/// embedded double quote, and truncates at the first NUL byte (§4.6).
pub fn quote_ident(ident: &str) -> String {
    let truncated = ident.split('\0').next().unwrap_or("");
    let mut out = String::with_capacity(truncated.len() + 2);
    out.push('"');
    for c in truncated.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Builds the `COPY ... FROM STDIN` command for a table load (§6's
/// grammar: `COPY <qschema>.<qtable> (<qcol>[, <qcol>]*) FROM STDIN WITH
/// CSV [HEADER] [ENCODING '<enc>'] NULL AS 'NULL'`).
pub fn copy_command(
    schema: &str,
    table: &str,
    columns: &[String],
    csv_header: bool,
    encoding: Option<&str>,
) -> String {
    let cols = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut cmd = format!(
        "COPY {}.{} ({}) FROM STDIN WITH CSV",
        quote_ident(schema),
        quote_ident(table),
        cols
    );
    if csv_header {
        cmd.push_str(" HEADER");
    }
    if let Some(enc) = encoding {
        cmd.push_str(&format!(" ENCODING '{}'", enc.replace('\'', "''")));
    }
    cmd.push_str(" NULL AS 'NULL'");
    cmd
}

/// A [`BulkSink`] backed by the `postgres` crate's synchronous
/// `Client::copy_in`, whose writer implements [`Write`] directly for
/// text-mode `COPY`.
pub struct PostgresSink {
    conn_string: String,
    shard: usize,
}

impl PostgresSink {
    pub fn new(shard: usize, conn_string: impl Into<String>) -> Self {
        PostgresSink {
            conn_string: conn_string.into(),
            shard,
        }
    }
}

impl BulkSink for PostgresSink {
    type Session = PostgresSession;

    fn open(&self) -> Result<Self::Session, ShardLoadError> {
        let client = postgres::Client::connect(&self.conn_string, postgres::NoTls)
            .map_err(|source| ShardLoadError::Sink {
                shard: self.shard,
                message: source.to_string(),
            })?;
        Ok(PostgresSession {
            client,
            shard: self.shard,
        })
    }
}

/// An open Postgres connection, ready for one `copy_from` call.
pub struct PostgresSession {
    client: postgres::Client,
    shard: usize,
}

impl BulkSinkSession for PostgresSession {
    fn copy_from(&mut self, command: &str, mut data: impl Read) -> Result<u64, ShardLoadError> {
        let mut writer = self
            .client
            .copy_in(command)
            .map_err(|source| ShardLoadError::Postgres { shard: self.shard, source })?;
        std::io::copy(&mut data, &mut writer).map_err(ShardLoadError::Io)?;
        writer
            .finish()
            .map_err(|source| ShardLoadError::Postgres { shard: self.shard, source })
    }

    fn close(self) -> Result<(), ShardLoadError> {
        Ok(())
    }
}

/// An in-memory [`BulkSink`] for tests: every `copy_from` call drains
/// `data` and appends it to a shared buffer, rather than touching the
/// network.
#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub struct MockSink {
        pub received: Arc<Mutex<Vec<u8>>>,
        pub commands: Arc<Mutex<Vec<String>>>,
    }

    impl MockSink {
        pub fn new() -> Self {
            MockSink::default()
        }
    }

    impl BulkSink for MockSink {
        type Session = MockSession;

        fn open(&self) -> Result<Self::Session, ShardLoadError> {
            Ok(MockSession {
                received: self.received.clone(),
                commands: self.commands.clone(),
            })
        }
    }

    pub struct MockSession {
        received: Arc<Mutex<Vec<u8>>>,
        commands: Arc<Mutex<Vec<String>>>,
    }

    impl BulkSinkSession for MockSession {
        fn copy_from(&mut self, command: &str, mut data: impl Read) -> Result<u64, ShardLoadError> {
            self.commands.lock().unwrap().push(command.to_string());
            let mut buf = Vec::new();
            data.read_to_end(&mut buf).map_err(ShardLoadError::Io)?;
            let rows = buf.iter().filter(|&&b| b == b'\n').count() as u64;
            self.received.lock().unwrap().extend_from_slice(&buf);
            Ok(rows)
        }

        fn close(self) -> Result<(), ShardLoadError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifier_and_doubles_internal_quotes() {
        assert_eq!(quote_ident("orders"), "\"orders\"");
        assert_eq!(quote_ident("weird\"name"), "\"weird\"\"name\"");
    }

    #[test]
    fn truncates_identifier_at_nul() {
        assert_eq!(quote_ident("trunc\0ated"), "\"trunc\"");
    }

    #[test]
    fn builds_copy_command_with_header_and_encoding() {
        let cmd = copy_command(
            "public",
            "orders",
            &["id".to_string(), "amount".to_string()],
            true,
            Some("UTF8"),
        );
        assert_eq!(
            cmd,
            "COPY \"public\".\"orders\" (\"id\", \"amount\") FROM STDIN WITH CSV HEADER ENCODING 'UTF8' NULL AS 'NULL'"
        );
    }

    #[test]
    fn builds_copy_command_without_header_or_encoding() {
        let cmd = copy_command("s", "t", &["a".to_string()], false, None);
        assert_eq!(cmd, "COPY \"s\".\"t\" (\"a\") FROM STDIN WITH CSV NULL AS 'NULL'");
    }

    #[test]
    fn mock_sink_accumulates_copied_bytes() {
        use mock::MockSink;
        let sink = MockSink::new();
        let mut session = sink.open().unwrap();
        let rows = session
            .copy_from("COPY t FROM STDIN", &b"1,a\n2,b\n"[..])
            .unwrap();
        assert_eq!(rows, 2);
        assert_eq!(&*sink.received.lock().unwrap(), b"1,a\n2,b\n");
    }
}
