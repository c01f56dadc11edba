mod common;

use std::num::NonZeroU32;
use std::sync::Arc;

use tempfile::tempdir;

use postdeck::application::admin::{AdminService, USER_TABLE_STORAGE_KEY, UserTableQuery};
use postdeck::application::pagination::{
    PaginationOptions, PaginationStorage, PaginationStore,
};
use postdeck::domain::users::{SortOrder, UserSortColumn};
use postdeck::infra::memory::SeedData;
use postdeck::infra::storage::{JsonFileStorage, MemoryStorage};

use common::{RecordingBackend, client_for, user};

fn n(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).expect("non-zero")
}

#[test]
fn saved_state_is_restored_with_a_live_total() {
    let storage: Arc<dyn PaginationStorage> = Arc::new(MemoryStorage::new());

    let mut store =
        PaginationStore::new(Arc::clone(&storage), "k", PaginationOptions::default(), 30);
    store.change(n(2), n(50));

    let restored = PaginationStore::new(storage, "k", PaginationOptions::default(), 7);
    let state = restored.state();
    assert_eq!(state.current.get(), 2);
    assert_eq!(state.page_size.get(), 50);
    assert_eq!(state.total, 7);
}

#[test]
fn twenty_five_rows_at_ten_per_page() {
    let storage: Arc<dyn PaginationStorage> = Arc::new(MemoryStorage::new());
    let rows: Vec<u32> = (1..=25).collect();

    let mut store = PaginationStore::new(storage, "rows", PaginationOptions::default(), rows.len());
    assert_eq!(store.page_count(), 3);
    assert_eq!(store.slice(&rows), &rows[..10]);

    store.change(n(3), n(10));
    assert_eq!(store.slice(&rows), &[21, 22, 23, 24, 25]);

    store.change(n(4), n(10));
    assert!(store.slice(&rows).is_empty());
}

#[test]
fn file_storage_survives_a_restart() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("state").join("pagination.json");

    {
        let storage: Arc<dyn PaginationStorage> = Arc::new(JsonFileStorage::new(&path));
        let mut users = PaginationStore::new(
            Arc::clone(&storage),
            "users",
            PaginationOptions::default(),
            100,
        );
        users.change(n(4), n(20));
        let mut other = PaginationStore::new(storage, "other", PaginationOptions::default(), 5);
        other.change(n(1), n(100));
    }

    let storage: Arc<dyn PaginationStorage> = Arc::new(JsonFileStorage::new(&path));
    let users = PaginationStore::new(Arc::clone(&storage), "users", PaginationOptions::default(), 100);
    assert_eq!(users.state().current.get(), 4);
    assert_eq!(users.state().page_size.get(), 20);

    let other = PaginationStore::new(storage, "other", PaginationOptions::default(), 5);
    assert_eq!(other.state().page_size.get(), 100);
}

fn admin_over(users: usize) -> (AdminService, Arc<dyn PaginationStorage>) {
    let seed = SeedData {
        users: (1..=users as i64)
            .map(|id| user(id, &format!("User{id:02}"), "Tester"))
            .collect(),
        blog_posts: Vec::new(),
    };
    let backend = Arc::new(RecordingBackend::new(seed));
    let storage: Arc<dyn PaginationStorage> = Arc::new(MemoryStorage::new());
    let admin = AdminService::new(
        client_for(&backend),
        Arc::clone(&storage),
        PaginationOptions::default(),
    );
    (admin, storage)
}

#[tokio::test]
async fn user_table_remembers_its_page() {
    let (admin, storage) = admin_over(25);

    let page = admin
        .user_page(UserTableQuery {
            page: Some(n(3)),
            ..UserTableQuery::default()
        })
        .await
        .expect("page");
    assert_eq!(page.current, 3);
    assert_eq!(page.page_size, 10);
    assert_eq!(page.total, 25);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.page_size_options, ["10", "20", "50", "100"]);

    let saved = storage
        .load(USER_TABLE_STORAGE_KEY)
        .expect("load")
        .expect("saved state");
    assert_eq!(saved, r#"{"current":3,"pageSize":10}"#);

    let page = admin.user_page(UserTableQuery::default()).await.expect("page");
    assert_eq!(page.current, 3);
    assert_eq!(page.items.first().map(|user| user.id), Some(21));
}

#[tokio::test]
async fn user_table_searches_and_sorts_before_paging() {
    let (admin, _) = admin_over(25);

    let page = admin
        .user_page(UserTableQuery {
            search: Some("user1".to_string()),
            sort: Some(UserSortColumn::Id),
            order: Some(SortOrder::Descend),
            ..UserTableQuery::default()
        })
        .await
        .expect("page");

    assert_eq!(page.total, 10);
    assert_eq!(
        page.items.iter().map(|user| user.id).collect::<Vec<_>>(),
        [19, 18, 17, 16, 15, 14, 13, 12, 11, 10]
    );
}
