//! End-to-end flows against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port, so server state
//! (sessions, likes) never leaks between tests. The client uses the real
//! `UreqTransport`, including its cookie jar.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use blog_core::{
    ApiClient, ApiError, BlogStore, ClientConfig, FileStore, KvStore, LoadingSignal, MemoryStore, UreqTransport,
    UserStore,
};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client_for(addr: SocketAddr) -> Arc<ApiClient> {
    let config = ClientConfig {
        base_url: format!("http://{addr}/api"),
        ..ClientConfig::default()
    };
    Arc::new(ApiClient::from_config(&config))
}

fn stores(client: &Arc<ApiClient>, storage: Arc<dyn KvStore>) -> (BlogStore, UserStore) {
    (
        BlogStore::new(client.clone(), storage.clone()),
        UserStore::new(client.clone(), storage),
    )
}

#[test]
fn ping_reaches_server() {
    let client = client_for(start_server());
    let env = client.blogs().ping().unwrap();
    assert!(env.is_success());
    assert_eq!(env.data.as_deref(), Some("pong"));
    assert!(!client.loading().is_active());
}

#[test]
fn browse_login_and_like() {
    let client = client_for(start_server());
    let (mut blogs, mut users) = stores(&client, Arc::new(MemoryStore::new()));

    // Anonymous browsing.
    let list = blogs.fetch_list().unwrap();
    assert_eq!(list.len(), 4);
    assert!(list.iter().all(|b| !b.has_thumb));
    let newest: Vec<i64> = blogs.sorted_by_create_time().iter().map(|b| b.id()).collect();
    assert_eq!(newest, vec![3, 2, 1, 4]);

    // Liking needs a session.
    let err = blogs.thumb(2).unwrap_err();
    assert!(matches!(err, ApiError::Domain { code: 40100, .. }));
    assert_eq!(err.to_string(), "not logged in");
    assert_eq!(blogs.blogs()[1].thumb_count(), 0);

    // No session yet.
    let env = users.fetch_current_user().unwrap();
    assert!(env.data.is_none());
    assert!(!users.is_authenticated());

    let user = users.login(1).unwrap();
    assert_eq!(user.username, "alice");
    let env = users.fetch_current_user().unwrap();
    assert_eq!(env.data.unwrap().id, 1);

    // Like with optimistic update, then check against the server.
    blogs.fetch_detail(2).unwrap();
    assert!(blogs.thumb(2).unwrap());
    assert_eq!(blogs.blogs()[1].thumb_count(), 1);
    assert!(blogs.blogs()[1].has_thumb);
    assert_eq!(blogs.current().unwrap().thumb_count(), 1);

    let fresh = blogs.fetch_detail(2).unwrap();
    assert_eq!(fresh.thumb_count(), 1);
    assert!(fresh.has_thumb);

    // Second like is rejected by the server and changes nothing locally.
    let err = blogs.thumb(2).unwrap_err();
    assert_eq!(err.to_string(), "user already thumbed");
    assert_eq!(blogs.current().unwrap().thumb_count(), 1);

    assert!(blogs.unthumb(2).unwrap());
    assert_eq!(blogs.current().unwrap().thumb_count(), 0);
    assert!(!blogs.current().unwrap().has_thumb);

    assert_eq!(blogs.recent_viewed(), &[2]);
    assert!(!client.loading().is_active());
}

#[test]
fn login_unknown_user_clears_session() {
    let client = client_for(start_server());
    let (_, mut users) = stores(&client, Arc::new(MemoryStore::new()));

    users.login(3).unwrap();
    let err = users.login(999).unwrap_err();
    assert_eq!(err.to_string(), "user not found");
    assert!(users.current_user().is_none());
    assert!(!users.is_authenticated());
}

#[test]
fn missing_blog_clears_current() {
    let client = client_for(start_server());
    let (mut blogs, _) = stores(&client, Arc::new(MemoryStore::new()));

    blogs.fetch_detail(1).unwrap();
    let err = blogs.fetch_detail(99).unwrap_err();
    assert_eq!(err.to_string(), "blog not found");
    assert!(blogs.current().is_none());
    assert_eq!(blogs.recent_viewed(), &[1]);
}

#[test]
fn unknown_route_is_server_error() {
    let client = client_for(start_server());
    let err = client.get::<String>("/does-not-exist", &[]).unwrap_err();
    assert_eq!(err.to_string(), "server error (404): unknown");
    assert!(matches!(err, ApiError::Server { status: 404, .. }));
}

#[test]
fn unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let loading = LoadingSignal::new();
    let client = Arc::new(ApiClient::new(
        &format!("http://{addr}/api"),
        UreqTransport::new(Duration::from_secs(2)),
        loading.clone(),
    ));
    let (mut blogs, mut users) = stores(&client, Arc::new(MemoryStore::new()));

    let err = blogs.fetch_list().unwrap_err();
    assert_eq!(err.to_string(), "network error: could not reach server");
    assert!(blogs.blogs().is_empty());

    let err = blogs.fetch_detail(1).unwrap_err();
    assert_eq!(err.to_string(), "network error: could not reach server");
    assert!(blogs.current().is_none());

    let err = users.login(1).unwrap_err();
    assert_eq!(err.to_string(), "network error: could not reach server");
    assert!(!users.is_authenticated());

    assert!(!loading.is_active());
}

#[test]
fn state_survives_restart_with_file_store() {
    let addr = start_server();
    let dir = tempfile::tempdir().unwrap();

    {
        let client = client_for(addr);
        let storage: Arc<dyn KvStore> = Arc::new(FileStore::open(dir.path()).unwrap());
        let (mut blogs, mut users) = stores(&client, storage);
        users.login(2).unwrap();
        blogs.fetch_detail(4).unwrap();
        blogs.fetch_detail(1).unwrap();
    }

    let client = client_for(addr);
    let storage: Arc<dyn KvStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let (blogs, users) = stores(&client, storage);
    assert_eq!(blogs.recent_viewed(), &[1, 4]);
    assert_eq!(users.current_user().unwrap().username, "bob");
    assert!(users.is_authenticated());
    assert!(blogs.current().is_none());
    assert!(blogs.blogs().is_empty());
}

#[test]
fn overlapping_detail_requests_apply_latest_only() {
    let client = client_for(start_server());
    let (mut blogs, _) = stores(&client, Arc::new(MemoryStore::new()));

    let (first, first_req) = blogs.begin_detail(1).unwrap();
    let (second, second_req) = blogs.begin_detail(3).unwrap();

    // The newer request resolves first; the older one arrives late.
    let second_outcome = client.execute(second_req);
    blogs.finish_detail(second, second_outcome).unwrap();
    let first_outcome = client.execute(first_req);
    let err = blogs.finish_detail(first, first_outcome).unwrap_err();

    assert!(matches!(err, ApiError::Stale { .. }));
    assert_eq!(blogs.current().unwrap().id(), 3);
    assert_eq!(blogs.recent_viewed(), &[3]);
}
