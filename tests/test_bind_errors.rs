//! Error paths: malformed binds, values over maxSize, backend errors and
//! call timeouts.

mod common;

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use common::{random_string, TestContext, LONG_INSERT, LONG_OUT_PROC, LONG_TABLE};
use oracle_binds::protocol::{DataMessage, ExecuteReply};
use oracle_binds::{
    Backend, BindDescriptor, BindSet, BindType, Connection, ConnectionConfig, Error,
    MemoryBackend, Result,
};
use tokio_test::{assert_err, assert_ok};

/// Passes calls through to a memory database, but answers the next call
/// with a value longer than any sensible bind.
struct OverflowingBackend {
    inner: MemoryBackend,
    overflow_next: bool,
}

impl Backend for OverflowingBackend {
    fn execute(&mut self, request: Bytes) -> impl Future<Output = Result<Bytes>> + Send {
        let overflow = std::mem::take(&mut self.overflow_next);
        let reply = self.inner.execute(request);
        async move {
            let reply = reply.await?;
            if !overflow {
                return Ok(reply);
            }
            ExecuteReply::success(vec![(1, Some(Bytes::from(vec![b'x'; 11])))], 0).to_data_bytes()
        }
    }
}

/// Answers only after `delay`.
struct SlowBackend {
    inner: MemoryBackend,
    delay: Duration,
}

impl Backend for SlowBackend {
    fn execute(&mut self, request: Bytes) -> impl Future<Output = Result<Bytes>> + Send {
        let delay = self.delay;
        let reply = self.inner.execute(request);
        async move {
            tokio::time::sleep(delay).await;
            reply.await
        }
    }
}

fn out_binds(id: i64, max_size: Option<u32>) -> BindSet {
    BindSet::new()
        .bind("i", BindDescriptor::input(id))
        .bind("c", BindDescriptor::output(BindType::String, max_size))
}

#[tokio::test]
async fn test_malformed_binds() {
    let mut ctx = TestContext::long().await;
    let cases = [
        ("c", out_binds(1, None)),
        ("c", out_binds(1, Some(0))),
        ("c", out_binds(1, Some((1 << 30) + 1))),
        (
            "c",
            BindSet::new().bind(
                "c",
                BindDescriptor::input_output(BindType::String, "abcdef", Some(5)),
            ),
        ),
        (
            "i",
            BindSet::new().bind("i", BindDescriptor::typed_input(BindType::Number, "1e")),
        ),
        (
            "C",
            BindSet::new()
                .bind("c", BindDescriptor::input(1))
                .bind(":C", BindDescriptor::input(2)),
        ),
    ];
    for (expected, binds) in cases {
        match ctx.execute(LONG_OUT_PROC, binds).await {
            Err(Error::InvalidBind { name, .. }) => assert_eq!(name, expected),
            other => panic!("Expected InvalidBind on :{}, got {:?}", expected, other),
        }
    }
    assert_eq!(ctx.db.row_count(LONG_TABLE).await.unwrap(), 0);
}

#[tokio::test]
async fn test_buffer_too_small_then_reuse() {
    let mut ctx = TestContext::long().await;
    let id = ctx.insert_long("0123456789").await;

    let backend = OverflowingBackend {
        inner: ctx.db.clone(),
        overflow_next: true,
    };
    let mut conn = Connection::new(backend);
    match conn.execute(LONG_OUT_PROC, out_binds(id, Some(10))).await {
        Err(Error::BufferTooSmall {
            name,
            needed,
            max_size,
        }) => {
            assert_eq!(name, "c");
            assert_eq!(needed, 11);
            assert_eq!(max_size, 10);
        }
        other => panic!("Expected BufferTooSmall, got {:?}", other),
    }

    let result = assert_ok!(conn.execute(LONG_OUT_PROC, out_binds(id, Some(10))).await);
    assert_eq!(result.out_str("c"), Some("0123456789"));
}

#[tokio::test]
async fn test_server_buffer_too_small() {
    let mut ctx = TestContext::long().await;
    let id = ctx.insert_long(random_string(11)).await;

    let err = assert_err!(ctx.execute(LONG_OUT_PROC, out_binds(id, Some(10))).await);
    assert_eq!(err.oracle_code(), Some(6502));
    assert!(err
        .to_string()
        .contains("character string buffer too small"));
}

#[tokio::test]
async fn test_missing_procedure() {
    let mut ctx = TestContext::long().await;
    let err = assert_err!(
        ctx.execute("BEGIN nodb_no_such_proc (:i, :c); END;", out_binds(1, Some(10)))
            .await
    );
    assert_eq!(err.oracle_code(), Some(6550));

    ctx.db.unregister(LONG_OUT_PROC).await.unwrap();
    let err = assert_err!(ctx.execute(LONG_OUT_PROC, out_binds(1, Some(10))).await);
    assert_eq!(err.oracle_code(), Some(6550));
}

#[tokio::test]
async fn test_dropped_table() {
    let mut ctx = TestContext::long().await;
    ctx.db.drop_table(LONG_TABLE).await.unwrap();
    let binds = BindSet::new()
        .bind("i", BindDescriptor::input(1))
        .bind("c", BindDescriptor::input("x"));
    let err = assert_err!(ctx.execute(LONG_INSERT, binds).await);
    assert_eq!(err.oracle_code(), Some(942));
    assert_eq!(
        ctx.db.drop_table(LONG_TABLE).await.unwrap_err().oracle_code(),
        Some(942)
    );
}

#[tokio::test]
async fn test_unbound_name() {
    let mut ctx = TestContext::long().await;
    let binds = BindSet::new().bind("i", BindDescriptor::input(1));
    let err = assert_err!(ctx.execute(LONG_INSERT, binds).await);
    assert_eq!(err.oracle_code(), Some(1008));
}

#[tokio::test]
async fn test_call_timeout() {
    let ctx = TestContext::long().await;
    let backend = SlowBackend {
        inner: ctx.db.clone(),
        delay: Duration::from_secs(5),
    };
    let config = ConnectionConfig::new().with_call_timeout(Duration::from_millis(50));
    let mut conn = Connection::with_config(backend, config);

    match conn.execute(LONG_OUT_PROC, out_binds(1, Some(10))).await {
        Err(Error::CallTimeout { timeout }) => assert_eq!(timeout, Duration::from_millis(50)),
        other => panic!("Expected CallTimeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_connections() {
    let ctx = TestContext::long().await;
    let mut first = Connection::new(ctx.db.clone());
    let mut second = Connection::new(ctx.db.clone());

    let insert = |id: i64| {
        BindSet::new()
            .bind("i", BindDescriptor::input(id))
            .bind("c", BindDescriptor::input(random_string(200)))
    };
    let (a, b) = futures::join!(
        first.execute(LONG_INSERT, insert(1)),
        second.execute(LONG_INSERT, insert(2)),
    );
    assert_eq!(assert_ok!(a).rows_affected, 1);
    assert_eq!(assert_ok!(b).rows_affected, 1);
    assert_eq!(ctx.db.row_count(LONG_TABLE).await.unwrap(), 2);
}
