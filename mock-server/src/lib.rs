use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const SUCCESS: i64 = 0;
pub const PARAMS_ERROR: i64 = 40000;
pub const NOT_LOGIN_ERROR: i64 = 40100;
pub const NOT_FOUND_ERROR: i64 = 40400;
pub const OPERATION_ERROR: i64 = 50000;

pub const SESSION_COOKIE: &str = "SESSION";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub data: Option<T>,
    pub message: String,
}

fn ok<T>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        code: SUCCESS,
        data: Some(data),
        message: "ok".to_string(),
    })
}

fn ok_empty<T>() -> Json<Envelope<T>> {
    Json(Envelope {
        code: SUCCESS,
        data: None,
        message: "ok".to_string(),
    })
}

fn fail<T>(code: i64, message: &str) -> Json<Envelope<T>> {
    Json(Envelope {
        code,
        data: None,
        message: message.to_string(),
    })
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub cover_img: Option<String>,
    pub content: String,
    pub thumb_count: u32,
    pub create_time: String,
    pub update_time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogVo {
    #[serde(flatten)]
    pub blog: Blog,
    pub username: Option<String>,
    pub user_avatar: Option<String>,
    pub has_thumb: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogIdQuery {
    pub blog_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbRequest {
    pub blog_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct Db {
    pub users: HashMap<i64, User>,
    pub blogs: BTreeMap<i64, Blog>,
    /// `(user_id, blog_id)` pairs.
    pub thumbs: HashSet<(i64, i64)>,
    /// Session token to user id.
    pub sessions: HashMap<String, i64>,
}

impl Db {
    /// Three users and four posts.
    pub fn seeded() -> Self {
        let mut db = Db::default();
        for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
            db.users.insert(
                id,
                User {
                    id,
                    username: name.to_string(),
                },
            );
        }
        let posts = [
            (1, 1, "Getting started", 5, "2025-04-17 18:00:00"),
            (2, 2, "Notes on caching", 0, "2025-04-18 09:30:00"),
            (3, 1, "Counting likes", 12, "2025-04-19 21:15:00"),
            (4, 3, "A quiet post", 1, "2025-04-16 07:45:00"),
        ];
        for (id, user_id, title, thumb_count, time) in posts {
            db.blogs.insert(
                id,
                Blog {
                    id,
                    user_id,
                    title: title.to_string(),
                    cover_img: None,
                    content: format!("{title}: body"),
                    thumb_count,
                    create_time: time.to_string(),
                    update_time: time.to_string(),
                },
            );
        }
        db
    }

    fn view(&self, blog: &Blog, viewer: Option<i64>) -> BlogVo {
        BlogVo {
            blog: blog.clone(),
            username: self.users.get(&blog.user_id).map(|u| u.username.clone()),
            user_avatar: None,
            has_thumb: viewer.is_some_and(|user_id| self.thumbs.contains(&(user_id, blog.id))),
        }
    }

    fn session_user(&self, headers: &HeaderMap) -> Option<i64> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, token)| self.sessions.get(token).copied())
    }
}

pub type SharedDb = Arc<RwLock<Db>>;

pub fn app() -> Router {
    app_with(Db::seeded())
}

pub fn app_with(db: Db) -> Router {
    let db: SharedDb = Arc::new(RwLock::new(db));
    let api = Router::new()
        .route("/ping", get(ping))
        .route("/blog/list", get(list_blogs))
        .route("/blog/get", get(get_blog))
        .route("/thumb/do", post(do_thumb))
        .route("/thumb/undo", post(undo_thumb))
        .route("/user/login", get(login))
        .route("/user/get/login", get(current_user))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn ping() -> Json<Envelope<String>> {
    ok("pong".to_string())
}

async fn list_blogs(State(db): State<SharedDb>, headers: HeaderMap) -> Json<Envelope<Vec<BlogVo>>> {
    let db = db.read().await;
    let viewer = db.session_user(&headers);
    ok(db.blogs.values().map(|blog| db.view(blog, viewer)).collect())
}

async fn get_blog(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Query(query): Query<BlogIdQuery>,
) -> Json<Envelope<BlogVo>> {
    let Some(blog_id) = query.blog_id else {
        return fail(PARAMS_ERROR, "params error");
    };
    let db = db.read().await;
    let viewer = db.session_user(&headers);
    match db.blogs.get(&blog_id) {
        Some(blog) => ok(db.view(blog, viewer)),
        None => fail(NOT_FOUND_ERROR, "blog not found"),
    }
}

async fn do_thumb(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<ThumbRequest>,
) -> Json<Envelope<bool>> {
    let Some(blog_id) = input.blog_id else {
        return fail(PARAMS_ERROR, "params error");
    };
    let mut db = db.write().await;
    let Some(user_id) = db.session_user(&headers) else {
        return fail(NOT_LOGIN_ERROR, "not logged in");
    };
    if !db.thumbs.insert((user_id, blog_id)) {
        return fail(OPERATION_ERROR, "user already thumbed");
    }
    match db.blogs.get_mut(&blog_id) {
        Some(blog) => {
            blog.thumb_count += 1;
            tracing::debug!(user_id, blog_id, count = blog.thumb_count, "thumb added");
            ok(true)
        }
        None => {
            db.thumbs.remove(&(user_id, blog_id));
            fail(NOT_FOUND_ERROR, "blog not found")
        }
    }
}

async fn undo_thumb(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(input): Json<ThumbRequest>,
) -> Json<Envelope<bool>> {
    let Some(blog_id) = input.blog_id else {
        return fail(PARAMS_ERROR, "params error");
    };
    let mut db = db.write().await;
    let Some(user_id) = db.session_user(&headers) else {
        return fail(NOT_LOGIN_ERROR, "not logged in");
    };
    if !db.thumbs.remove(&(user_id, blog_id)) {
        return fail(OPERATION_ERROR, "user has not thumbed");
    }
    match db.blogs.get_mut(&blog_id) {
        Some(blog) => {
            blog.thumb_count = blog.thumb_count.saturating_sub(1);
            tracing::debug!(user_id, blog_id, count = blog.thumb_count, "thumb removed");
            ok(true)
        }
        None => fail(NOT_FOUND_ERROR, "blog not found"),
    }
}

async fn login(State(db): State<SharedDb>, Query(query): Query<UserIdQuery>) -> Response {
    let Some(user_id) = query.user_id else {
        return fail::<User>(PARAMS_ERROR, "params error").into_response();
    };
    let mut db = db.write().await;
    let Some(user) = db.users.get(&user_id).cloned() else {
        return fail::<User>(NOT_FOUND_ERROR, "user not found").into_response();
    };
    let token = Uuid::new_v4().to_string();
    db.sessions.insert(token.clone(), user.id);
    tracing::info!(user_id = user.id, "user logged in");
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly");
    ([(header::SET_COOKIE, cookie)], ok(user)).into_response()
}

/// Anonymous callers get `code 0` with `data: null`.
async fn current_user(State(db): State<SharedDb>, headers: HeaderMap) -> Json<Envelope<User>> {
    let db = db.read().await;
    match db.session_user(&headers).and_then(|id| db.users.get(&id)) {
        Some(user) => ok(user.clone()),
        None => ok_empty(),
    }
}
