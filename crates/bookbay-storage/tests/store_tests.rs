use bookbay_core::{
    Cart, DeliveryAddress, MarketError, Message, Order, OrderStatus, PaymentMethod, Session, User,
};
use bookbay_storage::persistent::{load_state, Manifest};
use bookbay_storage::{InMemoryStore, PersistentStore, Storage};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

fn user(id: &str, email: &str) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        full_name: format!("Reader {}", id),
        password_hash: "hash".into(),
        salt: "salt".into(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn message(id: &str, from: &User) -> Message {
    Message {
        id: id.to_string(),
        from: from.full_name.clone(),
        from_id: from.id.clone(),
        subject: "Is it still available?".into(),
        content: "Asking about the Gatsby copy.".into(),
        date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        unread: true,
    }
}

fn order(id: &str, user_id: &str) -> Order {
    Order {
        id: id.to_string(),
        user_id: user_id.to_string(),
        lines: vec![],
        subtotal: 9.99,
        shipping: 4.99,
        discount: 0.0,
        total: 14.98,
        coupon: None,
        delivery: DeliveryAddress::default(),
        payment_method: PaymentMethod::Card,
        status: OrderStatus::Placed,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let store = InMemoryStore::new();
    store.create_user(user("u1", "ada@bookbay.io")).await.unwrap();
    let err = store
        .create_user(user("u2", "ADA@bookbay.io"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Conflict(_)));
    let found = store.find_user_by_email(" Ada@BookBay.io ").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some("u1".to_string()));
}

#[tokio::test]
async fn inbox_operations_are_scoped_to_owner() {
    let store = InMemoryStore::new();
    let ada = store.create_user(user("u1", "ada@bookbay.io")).await.unwrap();
    let bob = store.create_user(user("u2", "bob@bookbay.io")).await.unwrap();
    store.push_message(&bob.id, message("msg_1", &ada)).await.unwrap();

    assert_eq!(
        store.mark_message_read(&ada.id, "msg_1").await.unwrap_err(),
        MarketError::NotFound
    );
    assert_eq!(
        store.delete_message(&ada.id, "msg_1").await.unwrap_err(),
        MarketError::NotFound
    );
    let read = store.mark_message_read(&bob.id, "msg_1").await.unwrap();
    assert!(!read.unread);
    store.delete_message(&bob.id, "msg_1").await.unwrap();
    assert!(store.list_messages(&bob.id).await.unwrap().is_empty());

    let err = store
        .push_message("nobody", message("msg_2", &ada))
        .await
        .unwrap_err();
    assert_eq!(err, MarketError::NotFound);
}

#[tokio::test]
async fn expired_sessions_are_swept() {
    let store = InMemoryStore::new();
    let now = Utc::now();
    for (id, ttl) in [("s-old", -10), ("s-live", 3600)] {
        store
            .put_session(Session {
                id: id.into(),
                user_id: "u1".into(),
                created_at: now - Duration::seconds(7200),
                expires_at: now + Duration::seconds(ttl),
            })
            .await
            .unwrap();
    }
    assert_eq!(store.sweep_expired_sessions(now).await.unwrap(), 1);
    assert!(store.get_session("s-old").await.is_err());
    assert!(store.get_session("s-live").await.is_ok());
}

#[tokio::test]
async fn persistent_store_replays_wal() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
        let ada = store.create_user(user("u1", "ada@bookbay.io")).await.unwrap();
        let bob = store.create_user(user("u2", "bob@bookbay.io")).await.unwrap();
        let mut cart = Cart::default();
        cart.add("3", 2).unwrap();
        store.put_cart(&ada.id, cart).await.unwrap();
        store.append_order(order("ord_1", &ada.id)).await.unwrap();
        store.push_message(&bob.id, message("msg_1", &ada)).await.unwrap();
        store.push_message(&bob.id, message("msg_2", &ada)).await.unwrap();
        store.mark_message_read(&bob.id, "msg_1").await.unwrap();
        store.delete_message(&bob.id, "msg_2").await.unwrap();
    }

    let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
    assert_eq!(store.list_users().await.unwrap().len(), 2);
    assert_eq!(store.get_cart("u1").await.unwrap().quantity_of("3"), Some(2));
    assert_eq!(store.list_orders("u1").await.unwrap()[0].id, "ord_1");
    let inbox = store.list_messages("u2").await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(!inbox[0].unread);
}

#[tokio::test]
async fn snapshot_rotates_wal_and_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
    store.create_user(user("u1", "ada@bookbay.io")).await.unwrap();
    store.append_order(order("ord_1", "u1")).await.unwrap();
    let before = Manifest::load(dir.path()).segments;

    let snap = store.admin_snapshot().await.unwrap();
    let after = Manifest::load(dir.path());
    assert_eq!(after.current_snapshot.as_deref(), Some(snap.as_str()));
    assert_eq!(after.segments.len(), 1);
    assert_ne!(after.segments, before);
    assert!(!dir.path().join("wal").join(&before[0]).exists());

    // writes after the snapshot land in the new segment
    store.append_order(order("ord_2", "u1")).await.unwrap();
    drop(store);

    let (mem, _) = load_state(dir.path()).unwrap();
    let ids: Vec<String> = mem.orders("u1").into_iter().map(|o| o.id).collect();
    assert_eq!(ids, vec!["ord_1".to_string(), "ord_2".to_string()]);
    assert_eq!(mem.snapshot_stats().users, 1);
}

#[tokio::test]
async fn missing_manifest_falls_back_to_wal_scan() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
        store.create_user(user("u1", "ada@bookbay.io")).await.unwrap();
    }
    std::fs::remove_file(Manifest::path(dir.path())).unwrap();
    let store = PersistentStore::open(dir.path().to_path_buf()).unwrap();
    assert!(store.get_user("u1").await.is_ok());
}
