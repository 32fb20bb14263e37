//! IN/OUT binds carrying logical UROWIDs of index-organized tables.

mod common;

use common::{
    random_string, TestContext, UROWID_INOUT_PROC, UROWID_NORMAL_TABLE, UROWID_UPDATE_PROC,
    VARCHAR2_INOUT_PROC,
};
use oracle_binds::{BindDescriptor, BindSet, BindType};
use tokio_test::assert_ok;

const ROWID_MAX_SIZE: u32 = 5000;

async fn bind_inout(ctx: &mut TestContext, proc: &str, key_len: usize) {
    let id = ctx.next_id();
    let urowid = ctx.indexed_rowid(id, key_len).await;
    assert!(urowid.starts_with('*'));
    assert!(
        urowid.len() > key_len,
        "row id of {} characters for a key of {}",
        urowid.len(),
        key_len
    );

    let binds = BindSet::new()
        .bind("i", BindDescriptor::typed_input(BindType::Number, id))
        .bind(
            "c",
            BindDescriptor::input_output(BindType::String, urowid.clone(), Some(ROWID_MAX_SIZE)),
        );
    let result = assert_ok!(ctx.execute(proc, binds).await);
    assert_eq!(result.out_str("c"), Some(urowid.as_str()));
}

async fn bind_inout_update(ctx: &mut TestContext, proc: &str, len_1: usize, len_2: usize) {
    let id_1 = ctx.next_id();
    let urowid_1 = ctx.indexed_rowid(id_1, len_1).await;
    assert!(urowid_1.len() > len_1);
    let id_2 = ctx.next_id();
    let urowid_2 = ctx.indexed_rowid(id_2, len_2).await;
    assert!(urowid_2.len() > len_2);

    let binds = BindSet::new()
        .bind("i", BindDescriptor::typed_input(BindType::Number, id_1))
        .bind(
            "c1",
            BindDescriptor::input_output(BindType::String, urowid_1, Some(ROWID_MAX_SIZE)),
        )
        .bind(
            "c2",
            BindDescriptor::input_output(BindType::String, urowid_2.clone(), Some(ROWID_MAX_SIZE)),
        );
    let result = assert_ok!(ctx.execute(proc, binds).await);
    assert_eq!(result.out_str("c1"), Some(urowid_2.as_str()));
    assert_eq!(result.out_str("c2"), Some(urowid_2.as_str()));
    ctx.skip_ids(10);
}

#[tokio::test]
async fn test_bind_inout_as_urowid() {
    let mut ctx = TestContext::urowid().await;
    for len in [500, 1000, 2000] {
        bind_inout(&mut ctx, UROWID_INOUT_PROC, len).await;
    }
}

#[tokio::test]
async fn test_bind_inout_as_string() {
    let mut ctx = TestContext::urowid().await;
    for len in [500, 1000, 2000] {
        bind_inout(&mut ctx, VARCHAR2_INOUT_PROC, len).await;
    }
}

#[tokio::test]
async fn test_bind_inout_update() {
    let mut ctx = TestContext::urowid().await;
    for len in [500, 1000, 2000] {
        bind_inout_update(&mut ctx, UROWID_UPDATE_PROC, 20, len).await;
    }
}

#[tokio::test]
async fn test_rowid_matches_direct_lookup() {
    let mut ctx = TestContext::urowid().await;
    let id = ctx.next_id();
    let urowid = ctx.indexed_rowid(id, 700).await;
    let direct = ctx
        .db
        .rowid(common::UROWID_INDEXED_TABLE, "c1", id)
        .await
        .unwrap();
    assert_eq!(urowid, direct);
}

#[tokio::test]
async fn test_duplicate_key_is_rejected() {
    let mut ctx = TestContext::urowid().await;
    let key = random_string(30);
    let insert = |key: &str| {
        BindSet::new()
            .bind("i", BindDescriptor::input(1))
            .bind("s", BindDescriptor::input(key))
    };
    assert_ok!(ctx.execute(common::UROWID_INDEXED_INSERT, insert(&key)).await);
    let err = ctx
        .execute(common::UROWID_INDEXED_INSERT, insert(&key))
        .await
        .unwrap_err();
    assert_eq!(err.oracle_code(), Some(1));
}

#[tokio::test]
async fn test_failed_procedure_leaves_no_row() {
    let mut ctx = TestContext::urowid().await;
    let id = ctx.next_id();
    // Over the UROWID(4000) column limit.
    let binds = BindSet::new()
        .bind("i", BindDescriptor::input(id))
        .bind(
            "c",
            BindDescriptor::input_output(BindType::String, random_string(4500), Some(ROWID_MAX_SIZE)),
        );
    let err = ctx.execute(UROWID_INOUT_PROC, binds).await.unwrap_err();
    assert_eq!(err.oracle_code(), Some(12899));
    assert_eq!(ctx.db.row_count(UROWID_NORMAL_TABLE).await.unwrap(), 0);
}

#[tokio::test]
async fn test_inout_value_larger_than_max_size() {
    let mut ctx = TestContext::urowid().await;
    let binds = BindSet::new()
        .bind("i", BindDescriptor::input(1))
        .bind(
            "c",
            BindDescriptor::input_output(BindType::String, random_string(5001), Some(ROWID_MAX_SIZE)),
        );
    match ctx.execute(UROWID_INOUT_PROC, binds).await {
        Err(oracle_binds::Error::InvalidBind { name, .. }) => assert_eq!(name, "c"),
        other => panic!("Expected InvalidBind, got {:?}", other),
    }
}
