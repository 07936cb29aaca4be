//! End-to-end checks of the async DAO layer over an on-disk database.

use parley_shared::constants::ME_ID;
use parley_shared::SyncStatus;
use parley_store::{
    Channel, ChannelDao, Database, Message, MessageDao, SqliteStore, User, UserDao, UserRecord,
};

fn open_store(dir: &tempfile::TempDir) -> SqliteStore {
    let db = Database::open_at(&dir.path().join("parley.db")).expect("open database");
    SqliteStore::new(db)
}

#[tokio::test]
async fn users_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = open_store(&dir);
        UserDao::insert_many(&store, vec![User::new("alice"), User::new("bob")])
            .await
            .unwrap();
    }

    let store = open_store(&dir);
    let alice = UserDao::select(&store, "alice").await.unwrap();
    assert_eq!(alice.map(|u| u.id), Some("alice".to_string()));
}

#[tokio::test]
async fn sentinel_record_keeps_original_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let mut me = User::new(ME_ID);
    me.name = Some("Alice".into());
    store
        .insert_record(UserRecord {
            user: me,
            original_id: Some("alice".into()),
        })
        .await
        .unwrap();

    let record = store.select_record(ME_ID).await.unwrap().unwrap();
    assert_eq!(record.user.id, ME_ID);
    assert_eq!(record.original_id.as_deref(), Some("alice"));
}

#[tokio::test]
async fn pending_channels_page_through_dao() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let channels: Vec<Channel> = (0..5)
        .map(|i| Channel {
            sync_status: if i % 2 == 0 {
                SyncStatus::SyncNeeded
            } else {
                SyncStatus::Completed
            },
            ..Channel::new("messaging", format!("c{i}"))
        })
        .collect();
    ChannelDao::insert_many(&store, channels).await.unwrap();

    let pending = ChannelDao::select_by_sync_status(&store, SyncStatus::SyncNeeded, None, 2)
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|c| c.sync_status == SyncStatus::SyncNeeded));

    let cids = store
        .select_cids_by_sync_status(SyncStatus::SyncNeeded)
        .await
        .unwrap();
    assert_eq!(cids, vec!["messaging:c0", "messaging:c2", "messaging:c4"]);
}

#[tokio::test]
async fn clear_all_empties_messages() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let message = Message {
        id: "m1".into(),
        cid: "messaging:general".into(),
        user: User::new("alice"),
        ..Default::default()
    };
    MessageDao::insert_many(&store, vec![message]).await.unwrap();
    assert_eq!(store.clear_all().await.unwrap(), 1);
    assert!(MessageDao::select(&store, "m1").await.unwrap().is_none());
}
