//! Repository tests against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a scratch server and `--ignored`.

use bizhub_db::models::session::ClientMeta;
use bizhub_db::models::user::CreateUser;
use bizhub_db::repositories::{SessionRepo, UserRepo};
use chrono::{Duration, Utc};
use sqlx::PgPool;

async fn create_user(pool: &PgPool, email: &str) -> i64 {
    let input = CreateUser {
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
        .id
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn provisional_session_becomes_active_after_finalize(pool: PgPool) {
    let user_id = create_user(&pool, "finalize@test.com").await;
    let meta = ClientMeta {
        ip_address: Some("10.0.0.1".into()),
        user_agent: Some("integration-test".into()),
    };

    let id = SessionRepo::create_provisional(&pool, user_id, &meta, Utc::now() + Duration::minutes(5))
        .await
        .unwrap();
    assert!(SessionRepo::find_active(&pool, id, user_id).await.unwrap().is_none());

    let bound = SessionRepo::finalize(&pool, id, "hash-1", Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert!(bound);

    let session = SessionRepo::find_active(&pool, id, user_id)
        .await
        .unwrap()
        .expect("finalized session should be active");
    assert_eq!(session.token_hash.as_deref(), Some("hash-1"));
    assert_eq!(session.user_agent.as_deref(), Some("integration-test"));
    assert!(session.issued_at.is_some());

    // A second bind must not overwrite the first.
    let rebound = SessionRepo::finalize(&pool, id, "hash-2", Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert!(!rebound);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn revoke_is_idempotent_and_scoped_to_owner(pool: PgPool) {
    let owner = create_user(&pool, "owner@test.com").await;
    let stranger = create_user(&pool, "stranger@test.com").await;

    let id = SessionRepo::create_provisional(&pool, owner, &ClientMeta::default(), Utc::now() + Duration::minutes(5))
        .await
        .unwrap();
    SessionRepo::finalize(&pool, id, "hash", Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    assert!(!SessionRepo::revoke(&pool, id, stranger).await.unwrap());
    assert!(SessionRepo::revoke(&pool, id, owner).await.unwrap());
    assert!(!SessionRepo::revoke(&pool, id, owner).await.unwrap());
    assert!(SessionRepo::find_active(&pool, id, owner).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn revoke_all_spares_one_and_cleanup_removes_the_rest(pool: PgPool) {
    let user_id = create_user(&pool, "many@test.com").await;
    let mut ids = Vec::new();
    for hash in ["a", "b", "c"] {
        let id = SessionRepo::create_provisional(
            &pool,
            user_id,
            &ClientMeta::default(),
            Utc::now() + Duration::minutes(5),
        )
        .await
        .unwrap();
        SessionRepo::finalize(&pool, id, hash, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        ids.push(id);
    }

    let revoked = SessionRepo::revoke_all_for_user(&pool, user_id, Some(ids[1]))
        .await
        .unwrap();
    assert_eq!(revoked, 2);

    let purged = SessionRepo::cleanup_expired(&pool).await.unwrap();
    assert_eq!(purged, 2);

    let remaining = SessionRepo::list_active_for_user(&pool, user_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ids[1]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn deactivate_flips_the_active_flag_once(pool: PgPool) {
    let user_id = create_user(&pool, "Deact@Test.com").await;

    assert!(UserRepo::deactivate(&pool, user_id).await.unwrap());
    assert!(!UserRepo::deactivate(&pool, user_id).await.unwrap());

    let user = UserRepo::find_by_email(&pool, "deact@test.com")
        .await
        .unwrap()
        .expect("lookup is case-insensitive");
    assert!(!user.is_active);
}
