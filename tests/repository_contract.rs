use std::collections::HashSet;

use identity_api::{id, IdentityRepository, MemoryStore, NewRecord, RecordPatch};

#[tokio::test]
async fn each_insert_adds_exactly_one_record_with_unseen_id() {
    let repo = IdentityRepository::with_store(MemoryStore::new()).await;
    let mut seen = HashSet::new();

    for i in 0..5 {
        let name = format!("user{}", i);
        let fields = NewRecord::new(name.clone(), format!("u{}@x.com", i), "pw");
        assert!(repo.insert(fields).await.unwrap());

        let records = repo.list_all().await.unwrap();
        assert_eq!(records.len(), i + 1);
        let fresh: Vec<_> = records.iter().filter(|r| !seen.contains(&r.id)).collect();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].name.as_deref(), Some(name.as_str()));
        seen.insert(fresh[0].id.clone());
    }
}

#[tokio::test]
async fn listed_ids_round_trip_through_the_codec() {
    let repo = IdentityRepository::with_store(MemoryStore::new()).await;
    repo.insert(NewRecord::new("A", "a@x.com", "p")).await.unwrap();

    for record in repo.list_all().await.unwrap() {
        let native = id::decode(&record.id).expect("listed ids decode");
        assert_eq!(id::encode(&native), record.id);
        assert_eq!(repo.get_one(&record.id).await.unwrap(), Some(record));
    }
}

#[tokio::test]
async fn update_then_delete_lifecycle() {
    let repo = IdentityRepository::with_store(MemoryStore::new()).await;
    repo.insert(NewRecord::new("A", "a@x.com", "p")).await.unwrap();
    let id = repo.list_all().await.unwrap()[0].id.clone();

    let patch = RecordPatch::from(NewRecord::new("B", "b@x.com", "q"));
    assert!(repo.update(&id, patch).await.unwrap());
    let record = repo.get_one(&id).await.unwrap().unwrap();
    assert_eq!(
        (record.name, record.email, record.password),
        (Some("B".into()), Some("b@x.com".into()), Some("q".into()))
    );

    assert!(repo.delete(&id).await.unwrap());
    assert_eq!(repo.get_one(&id).await.unwrap(), None);
    assert!(repo.store().is_empty());
}

#[tokio::test]
async fn malformed_ids_are_absent_or_false() {
    let repo = IdentityRepository::with_store(MemoryStore::new()).await;
    for bad in ["", "not-a-valid-id", "garbage-id", "65a1b2c3d4e5f60718293a4"] {
        assert_eq!(repo.get_one(bad).await.unwrap(), None);
        assert!(!repo.update(bad, RecordPatch::default()).await.unwrap());
        assert!(!repo.delete(bad).await.unwrap());
    }
}
