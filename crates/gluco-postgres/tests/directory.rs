//! Directory queries against a live database.
//!
//! Run with `POSTGRES_URL=postgresql://... cargo test -p gluco-postgres -- --ignored`.

use gluco_core::ConnectionDirectory;
use gluco_core::crypto::{CredentialCodec, EncryptionKey};
use gluco_core::types::{ProviderType, Region, UserId};
use gluco_postgres::model::{NewProviderConnection, NewUser};
use gluco_postgres::query::{ConnectionRepository, UserRepository};
use gluco_postgres::{PgClient, PgClientMigrationExt, PgConfig, PgConnectionDirectory};

async fn client() -> PgClient {
    let url = std::env::var("POSTGRES_URL").expect("POSTGRES_URL must be set");
    let client = PgClient::new_with_test(PgConfig::new(url)).await.unwrap();
    client.run_pending_migrations().await.unwrap();
    client
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn lists_active_connections_of_one_provider() {
    let client = client().await;
    let codec = CredentialCodec::new(EncryptionKey::generate());
    let mut conn = client.get_connection().await.unwrap();

    let suffix = jiff::Timestamp::now().as_nanosecond();
    let user = conn
        .create_user(NewUser {
            email: format!("directory-{suffix}@example.com"),
            password: "hash".to_owned(),
            ..NewUser::default()
        })
        .await
        .unwrap();
    let user_id = UserId::new(user.id);

    let dexcom = conn
        .create_connection(NewProviderConnection::new(
            user_id,
            ProviderType::Dexcom,
            &Region::new("us"),
            "alice",
            codec.encrypt("secret").unwrap(),
        ))
        .await
        .unwrap();
    let deleted = conn
        .create_connection(NewProviderConnection::new(
            user_id,
            ProviderType::Dexcom,
            &Region::new("ous"),
            "bob",
            codec.encrypt("secret").unwrap(),
        ))
        .await
        .unwrap();
    let libre = conn
        .create_connection(NewProviderConnection::new(
            user_id,
            ProviderType::Libre,
            &Region::default(),
            "alice@example.com",
            codec.encrypt("secret").unwrap(),
        ))
        .await
        .unwrap();
    assert!(conn.delete_connection(deleted.id).await.unwrap());
    drop(conn);

    let directory = PgConnectionDirectory::new(client.clone());
    let records = directory
        .get_connections_by_type(ProviderType::Dexcom)
        .await
        .unwrap();
    let ids: Vec<i64> = records.iter().map(|r| r.id.get()).collect();

    assert!(ids.contains(&dexcom.id));
    assert!(!ids.contains(&deleted.id));
    assert!(!ids.contains(&libre.id));

    let record = records.iter().find(|r| r.id.get() == dexcom.id).unwrap();
    assert_eq!(codec.open(record).unwrap().password(), "secret");
    assert!(directory.health_check().await.unwrap().is_operational());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL instance
async fn provider_names_match_case_insensitively() {
    let client = client().await;
    let codec = CredentialCodec::new(EncryptionKey::generate());
    let mut conn = client.get_connection().await.unwrap();

    let suffix = jiff::Timestamp::now().as_nanosecond();
    let user = conn
        .create_user(NewUser {
            email: format!("casing-{suffix}@example.com"),
            password: "hash".to_owned(),
            ..NewUser::default()
        })
        .await
        .unwrap();

    let mut capitalized = NewProviderConnection::new(
        UserId::new(user.id),
        ProviderType::Dexcom,
        &Region::new("us"),
        "carol",
        codec.encrypt("secret").unwrap(),
    );
    capitalized.provider = "Dexcom".to_owned();
    let stored = conn.create_connection(capitalized.clone()).await.unwrap();
    assert_eq!(stored.provider, "Dexcom");

    let mut unknown = capitalized;
    unknown.username = "dave".to_owned();
    unknown.provider = "medtronic".to_owned();
    assert!(conn.create_connection(unknown).await.is_err());
    drop(conn);

    let records = PgConnectionDirectory::new(client)
        .get_connections_by_type(ProviderType::Dexcom)
        .await
        .unwrap();
    let record = records.iter().find(|r| r.id.get() == stored.id).unwrap();
    assert_eq!(record.provider_type, ProviderType::Dexcom);
}
