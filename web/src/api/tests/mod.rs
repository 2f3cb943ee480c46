use crate::{API_PREFIX, state::AppState, test_app};
use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use libvenue::user::User;
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use test_log::test;
use tower::Service;

mod event;

const PASSWORD: &str = "topsecret123";

fn api_url(path: &str) -> String {
    [API_PREFIX, "/", path.trim_start_matches('/')].join("")
}

/// give a fixture user a real password so that they can log in
async fn set_password(state: &AppState, username: &str) -> Result<()> {
    let mut user = User::load_by_username(username, &state.db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no fixture user '{username}'"))?;
    user.change_password(PASSWORD)?;
    user.update(&state.db).await?;
    Ok(())
}

/// logs the user into the api and returns a cookie value that can be used in
/// subsequent requests
async fn login(app: &mut Router, state: &AppState, username: &str) -> Result<String> {
    set_password(state, username).await?;
    let request = Request::builder()
        .uri(api_url("/auth/login"))
        .method("POST")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"username": username, "password": PASSWORD}).to_string(),
        ))?;
    let response = app.as_service().call(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(response
        .headers()
        .get("set-cookie")
        .expect("no set-cookie header")
        .to_str()?
        .to_string())
}

/// Send a request to the api and return the status along with the decoded json
/// body. An empty body is returned as [Value::Null].
async fn send(
    app: &mut Router,
    method: Method,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().uri(api_url(path)).method(method);
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };
    let response = app.as_service().call(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn get(app: &mut Router, path: &str, cookie: &str) -> Result<(StatusCode, Value)> {
    send(app, Method::GET, path, Some(cookie), None).await
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .expect("expected a json array")
        .iter()
        .filter_map(|v| v["id"].as_i64())
        .collect()
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(path = "../../../../db/fixtures", scripts("users", "locations"))
))]
async fn test_login(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");

    // everything but the login itself requires a session
    let (status, body) = send(&mut app, Method::GET, "/locations", None, None)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Authentication required"}));

    set_password(&state, "testuser")
        .await
        .expect("failed to set password");
    let (status, body) = send(
        &mut app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": "testuser", "password": "wrong password"})),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username or password");

    let (status, _) = send(
        &mut app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": "nobody", "password": PASSWORD})),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = login(&mut app, &state, "testuser")
        .await
        .expect("Failed to log in");
    let (status, me) = get(&mut app, "/auth/me", &cookie)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "testuser");
    assert_eq!(me["role"], "user");
    assert!(me.get("pwhash").is_none());

    let (status, body) = send(&mut app, Method::POST, "/auth/logout", Some(&cookie), None)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");
    let (status, _) = get(&mut app, "/auth/me", &cookie)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(path = "../../../../db/fixtures", scripts("users"))
))]
async fn test_rejections_are_json(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");
    let cookie = login(&mut app, &state, "testuser")
        .await
        .expect("Failed to log in");

    // malformed json body
    let request = Request::builder()
        .uri(api_url("/comments"))
        .method("POST")
        .header("Cookie", cookie.clone())
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(request)
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    let body: Value = serde_json::from_slice(&bytes).expect("body is not json");
    assert!(body["error"].is_string());

    // ids in the path must be numeric
    let (status, body) = get(&mut app, "/locations/abc", &cookie)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
