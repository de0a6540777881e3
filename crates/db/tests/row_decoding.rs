//! Row decoding against a live PostgreSQL.
//!
//! The stored procedures are not part of this repository, so these tests
//! build rows with plain `SELECT`s whose columns all share one name. Only
//! the column order may be relied on.
//!
//! Run with `DATABASE_URL` set: `cargo test -p mercuria-db -- --ignored`.

use std::time::Duration;

use mercuria_core::event_graph::FlatRow;
use mercuria_db::models::event::EventRow;
use mercuria_db::models::user::ResolvedUser;
use mercuria_db::DbPool;
use uuid::Uuid;

async fn pool() -> DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    mercuria_db::create_pool(&url, 1, Duration::from_secs(5))
        .await
        .expect("Failed to connect to test database")
}

const EVENT_ROW: &str = "SELECT
    $1::uuid AS c, 'Picnic'::text AS c, now() AS c, $2::uuid AS c, NULL::text AS c,
    $2::uuid AS c, 'sub-1'::text AS c, 'Owner'::text AS c, 'https://cdn.test/1.png'::text AS c,
        'owner@test.com'::text AS c,
    7::int4 AS c, $3::uuid AS c, $1::uuid AS c, now() AS c,
    NULL::uuid AS c, NULL::text AS c, NULL::text AS c, NULL::text AS c, NULL::uuid AS c,
        NULL::uuid AS c, NULL::timestamptz AS c,
    $3::uuid AS c, 'sub-2'::text AS c, 'Member'::text AS c, 'https://cdn.test/2.png'::text AS c,
        'member@test.com'::text AS c";

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn event_row_decodes_by_position() {
    let pool = pool().await;
    let (event_id, owner_id, member_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let row = sqlx::query_as::<_, EventRow>(EVENT_ROW)
        .bind(event_id)
        .bind(owner_id)
        .bind(member_id)
        .fetch_one(&pool)
        .await
        .unwrap();

    let flat = FlatRow::try_from(row).unwrap();
    assert_eq!(flat.event.id, event_id);
    assert_eq!(flat.event.name, "Picnic");
    assert_eq!(flat.owner.id, owner_id);
    assert_eq!(flat.owner.email, "owner@test.com");
    assert_eq!(flat.like.map(|l| (l.id, l.user_id)), Some((7, member_id)));
    assert!(flat.photo.is_none());
    assert_eq!(flat.member.id, member_id);
    assert_eq!(flat.member.name, "Member");
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn short_event_row_is_rejected() {
    let pool = pool().await;

    let result = sqlx::query_as::<_, EventRow>("SELECT $1::uuid AS id, 'Picnic'::text AS name")
        .bind(Uuid::new_v4())
        .fetch_one(&pool)
        .await;

    assert!(matches!(result, Err(sqlx::Error::Decode(_))));
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn resolved_user_decodes_by_position() {
    let pool = pool().await;
    let id = Uuid::new_v4();

    let user = sqlx::query_as::<_, ResolvedUser>(
        "SELECT $1::uuid AS get_or_create_user, 'Ada'::text AS x, 'https://cdn.test/a.png'::text AS x",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(user.id, id);
    assert_eq!(user.name, "Ada");
    assert_eq!(user.avatar_url, "https://cdn.test/a.png");
}
