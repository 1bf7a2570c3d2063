//! End-to-end CRUD scenario against the repository
//!
//! Runs on the in-memory store by default. The MongoDB variant is ignored
//! unless requested:
//!   MONGODB_URI=mongodb://localhost:27017 cargo test -p circulation-core -- --ignored

use std::sync::Arc;

use circulation_core::bson::{doc, Document};
use circulation_core::{
    CirculationRecord, CirculationRepo, ConnectionMode, MemoryStore, StoreConfig, StoreError,
    ID_FIELD,
};

fn dataset() -> Vec<Document> {
    [
        ("USA Today", 2_192_098, 1_674_306, -24, 1, 1, 2),
        ("Wall Street Journal", 2_101_017, 2_378_827, 13, 30, 20, 50),
        ("New York Times", 1_119_027, 1_865_318, 67, 55, 62, 117),
        ("Los Angeles Times", 983_727, 653_868, -34, 44, 41, 85),
        ("Washington Post", 760_034, 474_767, -38, 52, 48, 100),
        ("Le Monde diplomatique \u{e9}dition", 100_000, 90_000, -10, 0, 0, 0),
    ]
    .into_iter()
    .map(|(name, c2004, c2013, change, p1, p2, p3)| {
        CirculationRecord {
            id: None,
            newspaper: name.to_string(),
            daily_circulation_2004: c2004,
            daily_circulation_2013: c2013,
            change_2004_2013: change,
            pulitzers_1990_2003: p1,
            pulitzers_2004_2014: p2,
            pulitzers_1990_2014: p3,
        }
        .to_record()
        .unwrap()
    })
    .collect()
}

async fn run_scenario(repo: &CirculationRepo) {
    let data = dataset();

    let loaded = repo.load_data(data.clone()).await.unwrap();
    assert_eq!(loaded.inserted_count, data.len());

    let all = repo.get(None, None).await.unwrap();
    assert_eq!(all.len(), data.len());

    let sample = all[4].clone();
    let newspaper = sample.get_str("Newspaper").unwrap();
    let filtered = repo
        .get(Some(doc! { "Newspaper": newspaper }), None)
        .await
        .unwrap();
    assert_eq!(filtered, vec![sample.clone()]);

    let limited = repo.get(Some(doc! {}), Some(3)).await.unwrap();
    assert_eq!(limited.len(), 3);

    let sample_id = sample.get_object_id(ID_FIELD).unwrap().to_hex();
    let by_id = repo.get_by_id(&sample_id).await.unwrap();
    assert_eq!(by_id, Some(sample));

    let new_item = doc! { "Newspaper": "X", "field": 1 };
    let id = repo.add(new_item.clone()).await.unwrap();
    let added = repo.get_by_id(&id.to_string()).await.unwrap().unwrap();
    let mut expected = new_item;
    expected.insert(ID_FIELD, id.as_bson().clone());
    assert_eq!(added, expected);

    repo.update(&id.to_string(), doc! { "Newspaper": "Y", "field": 1 })
        .await
        .unwrap();
    let updated = repo.get_by_id(&id.to_string()).await.unwrap().unwrap();
    assert_eq!(updated.get_str("Newspaper").unwrap(), "Y");

    assert!(repo.remove(&id.to_string()).await.unwrap());
    assert_eq!(repo.get_by_id(&id.to_string()).await.unwrap(), None);
    assert!(!repo.remove(&id.to_string()).await.unwrap());

    let err = repo.get_by_id("not-an-object-id").await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidIdentifier { .. }));
}

#[tokio::test]
async fn scenario_on_memory_store() {
    let store = Arc::new(MemoryStore::new("circulation_scenario"));
    let repo = CirculationRepo::new(store.clone());

    run_scenario(&repo).await;

    repo.store().drop_database().await.unwrap();
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn typed_records_read_back_from_store() {
    let repo = CirculationRepo::new(Arc::new(MemoryStore::default()));
    repo.load_data(dataset()).await.unwrap();

    let stored = repo
        .get(Some(doc! { "Newspaper": "New York Times" }), None)
        .await
        .unwrap();
    let typed = CirculationRecord::from_record(&stored[0]).unwrap();

    assert!(typed.id.is_some());
    assert_eq!(typed.change_2004_2013, 67);
    assert_eq!(typed.pulitzers_1990_2014, 117);
}

async fn live_repo(database: &str, mode: ConnectionMode) -> CirculationRepo {
    let mut config = StoreConfig::default();
    config.apply_overrides(|key| std::env::var(key).ok());
    config.database = database.to_string();
    config.connection_mode = mode;
    CirculationRepo::connect(config).await.expect("connect failed")
}

#[tokio::test]
#[ignore = "requires database"]
async fn scenario_on_mongodb_pooled() {
    let repo = live_repo("circulation_scenario_pooled", ConnectionMode::Pooled).await;
    repo.store().drop_database().await.unwrap();

    run_scenario(&repo).await;

    repo.store().drop_database().await.unwrap();
    repo.close().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn scenario_on_mongodb_per_operation() {
    let repo = live_repo("circulation_scenario_per_op", ConnectionMode::PerOperation).await;
    repo.store().drop_database().await.unwrap();

    run_scenario(&repo).await;

    repo.store().drop_database().await.unwrap();
}
