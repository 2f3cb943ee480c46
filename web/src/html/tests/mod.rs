use crate::{state::AppState, test_app, util::app_url};
use anyhow::Result;
use axum::{
    Router,
    body::{Body, Bytes, HttpBody},
    http::{Request, StatusCode, header::CONTENT_TYPE, header::LOCATION},
};
use http_body_util::BodyExt;
use libvenue::{
    comment::Comment,
    core::loadable::Loadable,
    event::Event,
    favorite::Favorite,
    location::Location,
    user::{Role, User},
};
use sqlx::{Pool, Sqlite};
use test_log::test;
use tower::Service;

const PASSWORD: &str = "topsecret123";

async fn body_text<B>(body: B) -> String
where
    B: HttpBody<Data = Bytes>,
    B::Error: std::fmt::Debug,
{
    let bytes = body.collect().await.expect("failed to collect body").to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

/// logs the given user into the app and returns a cookie value that can be
/// used in subsequent requests
async fn login_as(app: &mut Router, state: &AppState, username: &str) -> Result<String> {
    let mut user = User::load_by_username(username, &state.db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no user named {username}"))?;
    user.change_password(PASSWORD)?;
    user.update(&state.db).await?;

    let creds = serde_urlencoded::to_string([
        ("username", username),
        ("password", PASSWORD),
        ("next", "/app/favorites"),
    ])?;
    let request = Request::builder()
        .uri(app_url("/auth/login"))
        .method("POST")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(creds))?;
    let response = app.as_service().call(request).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).map(|v| v.as_bytes()),
        Some("/app/favorites".as_bytes())
    );
    // extract cookie
    Ok(response
        .headers()
        .get("set-cookie")
        .expect("no set-cookie header")
        .to_str()?
        .to_string())
}

async fn login(app: &mut Router, state: &AppState) -> Result<String> {
    login_as(app, state, "testuser").await
}

/// an app url the way it appears in an escaped template attribute
fn html_url(path: &str) -> String {
    app_url(path).replace('/', "&#x2f;")
}

async fn get_page(app: &mut Router, path: &str, cookie: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().uri(app_url(path)).method("GET");
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    let req = builder.body(Body::empty()).expect("Failed to build request");
    let response = app
        .as_service()
        .call(req)
        .await
        .expect("Failed to execute request");
    let status = response.status();
    (status, body_text(response.into_body()).await)
}

async fn post_form(
    app: &mut Router,
    path: &str,
    cookie: &str,
    form: &[(&str, &str)],
) -> (StatusCode, Option<String>) {
    let req = Request::builder()
        .uri(app_url(path))
        .method("POST")
        .header("Cookie", cookie)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            serde_urlencoded::to_string(form).expect("failed to serialize form"),
        ))
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(req)
        .await
        .expect("Failed to execute request");
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (response.status(), location)
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(path = "../../../../db/fixtures", scripts("users", "locations"))
))]
async fn test_login(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");

    // protected pages show the login form to anonymous visitors
    let (status, body) = get_page(&mut app, "/locations", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("name=\"password\""));
    assert!(body.contains("name=\"next\""));

    let (status, _) = get_page(&mut app, "/auth/login", None).await;
    assert_eq!(status, StatusCode::OK);

    let cookie = login(&mut app, &state).await.expect("Failed to log in");

    // ...but we can see them with the cookie
    let (status, _) = get_page(&mut app, "/locations", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);

    let bad = serde_urlencoded::to_string([("username", "testuser"), ("password", "nope")])
        .expect("failed to serialize form");
    let req = Request::builder()
        .uri(app_url("/auth/login"))
        .method("POST")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(bad))
        .expect("Failed to build request");
    let response = app
        .as_service()
        .call(req)
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_text(response.into_body()).await;
    assert!(body.contains("Invalid username or password"));
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(
        path = "../../../../db/fixtures",
        scripts("users", "locations", "events", "comments", "favorites")
    )
))]
async fn test_location_pages(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");
    let cookie = login(&mut app, &state).await.expect("Failed to log in");

    let (status, body) = get_page(&mut app, "/locations?keyword=hall&sort=events", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let city_hall = body.find("Hong Kong City Hall").expect("City Hall missing");
    let sha_tin = body.find("Sha Tin Town Hall").expect("Sha Tin missing");
    assert!(city_hall < sha_tin);
    assert!(!body.contains("Hong Kong Cultural Centre"));
    // the column headers re-sort while keeping the current filter
    assert!(body.contains("keyword=hall&amp;sort=distance"));
    assert!(body.contains("keyword=hall&amp;sort=name"));

    let (status, body) = get_page(&mut app, "/locations/1", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hong Kong Cultural Centre"));
    assert!(body.contains("Symphony Under the Stars"));
    assert!(body.contains("Seats were a bit cramped"));

    let (status, body) = get_page(&mut app, "/locations/99", Some(&cookie)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Location not found"));

    let (status, location) = post_form(
        &mut app,
        "/locations/3/comment",
        &cookie,
        &[("text", "Good sight lines"), ("rating", "4")],
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/locations/3"));
    let (_, body) = get_page(&mut app, "/locations/3", Some(&cookie)).await;
    assert!(body.contains("Good sight lines"));

    let (status, _) = post_form(&mut app, "/locations/3/comment", &cookie, &[("text", "  ")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(
        path = "../../../../db/fixtures",
        scripts("users", "locations", "events", "favorites")
    )
))]
async fn test_favorite_pages(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");
    let cookie = login(&mut app, &state).await.expect("Failed to log in");

    let (status, body) = get_page(&mut app, "/favorites", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hong Kong City Hall"));
    assert!(!body.contains("Sha Tin Town Hall"));

    let (status, location) = post_form(&mut app, "/favorites", &cookie, &[("location_id", "2")]).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/locations/2"));
    assert!(Favorite::is_favorited(1, 2, &state.db).await.expect("check failed"));

    let (status, _) = post_form(&mut app, "/favorites", &cookie, &[("location_id", "2")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, location) = post_form(&mut app, "/favorites/2/remove", &cookie, &[]).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/favorites"));
    assert!(!Favorite::is_favorited(1, 2, &state.db).await.expect("check failed"));

    let (status, body) = get_page(&mut app, "/events/random", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Random event"));
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(
        path = "../../../../db/fixtures",
        scripts("users", "locations", "events", "comments")
    )
))]
async fn test_delete_comment_page(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");
    let cookie = login_as(&mut app, &state, "otheruser").await.expect("Failed to log in");

    // otheruser sees the delete form only on their own comment
    let (status, body) = get_page(&mut app, "/locations/1", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&html_url("/locations/1/comments/2/delete")));
    assert!(!body.contains(&html_url("/locations/1/comments/1/delete")));

    let (status, _) = post_form(&mut app, "/locations/1/comments/1/delete", &cookie, &[]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(Comment::load(1, &state.db).await.is_ok());

    let (status, location) =
        post_form(&mut app, "/locations/1/comments/2/delete", &cookie, &[]).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/locations/1"));
    assert!(Comment::load(2, &state.db).await.is_err());

    let (status, _) = post_form(&mut app, "/locations/1/comments/99/delete", &cookie, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // administrators may remove anybody's comment
    let admin = login_as(&mut app, &state, "admin").await.expect("Failed to log in");
    let (_, body) = get_page(&mut app, "/locations/1", Some(&admin)).await;
    assert!(body.contains(&html_url("/locations/1/comments/1/delete")));
    assert!(body.contains(&html_url("/locations/1/comments/3/delete")));
    let (status, _) = post_form(&mut app, "/locations/1/comments/1/delete", &admin, &[]).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(Comment::load(1, &state.db).await.is_err());
    let (_, body) = get_page(&mut app, "/locations/1", Some(&admin)).await;
    assert!(!body.contains("Great acoustics"));
    assert!(body.contains("Easy to reach by ferry"));
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(
        path = "../../../../db/fixtures",
        scripts("users", "locations", "events")
    )
))]
async fn test_admin_pages(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");

    // regular users can't see or use the admin pages
    let cookie = login(&mut app, &state).await.expect("Failed to log in");
    let (_, body) = get_page(&mut app, "/locations", Some(&cookie)).await;
    assert!(!body.contains("Manage users"));
    for page in ["/admin/locations", "/admin/events", "/admin/users"] {
        let (status, body) = get_page(&mut app, page, Some(&cookie)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{page}");
        assert!(body.contains("Admin access required"));
    }
    let (status, _) = post_form(&mut app, "/admin/users/3/delete", &cookie, &[]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(User::load(3, &state.db).await.is_ok());

    let admin = login_as(&mut app, &state, "admin").await.expect("Failed to log in");
    let (_, body) = get_page(&mut app, "/locations", Some(&admin)).await;
    assert!(body.contains("Manage users"));

    // locations
    let (status, body) = get_page(&mut app, "/admin/locations", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hong Kong Cultural Centre"));
    assert!(body.contains("Sha Tin Town Hall"));

    let (status, location) = post_form(
        &mut app,
        "/admin/locations",
        &admin,
        &[
            ("venue_id", "99001"),
            ("name", "Kwai Tsing Theatre"),
            ("latitude", "22.3568"),
            ("longitude", "114.1273"),
            ("area", "Kwai Tsing"),
            ("event_count", ""),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/admin/locations"));
    let (_, body) = get_page(&mut app, "/admin/locations", Some(&admin)).await;
    assert!(body.contains("Kwai Tsing Theatre"));
    let created = Location::load_all(None, &state.db)
        .await
        .expect("failed to load locations")
        .into_iter()
        .find(|l| l.name == "Kwai Tsing Theatre")
        .expect("new location missing");
    assert_eq!(created.event_count, 0);

    let (status, _) = post_form(
        &mut app,
        "/admin/locations",
        &admin,
        &[("venue_id", "99002"), ("name", "Nowhere"), ("latitude", ""), ("longitude", "")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, location) = post_form(
        &mut app,
        &format!("/admin/locations/{}/delete", created.id),
        &admin,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/admin/locations"));
    assert!(Location::load(created.id, &state.db).await.is_err());
    let (status, _) = post_form(&mut app, "/admin/locations/999/delete", &admin, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // events
    let (status, body) = get_page(&mut app, "/admin/events", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Symphony Under the Stars"));
    let before = Event::load_all(&state.db).await.expect("failed to load events").len();

    let (status, location) = post_form(
        &mut app,
        "/admin/events",
        &admin,
        &[
            ("location_id", "2"),
            ("title", "Lunchtime Organ Recital"),
            ("date", "2025-06-01"),
            ("time", "12:30"),
            ("presenter", ""),
            ("description", ""),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/admin/events"));
    let events = Event::load_all(&state.db).await.expect("failed to load events");
    assert_eq!(events.len(), before + 1);
    let recital = events
        .iter()
        .find(|e| e.title == "Lunchtime Organ Recital")
        .expect("new event missing");
    assert_eq!(recital.location.id(), 2);
    assert_eq!(recital.presenter, None);
    let (_, body) = get_page(&mut app, "/admin/events", Some(&admin)).await;
    assert!(body.contains("Lunchtime Organ Recital"));

    let (status, _) = post_form(
        &mut app,
        "/admin/events",
        &admin,
        &[("location_id", "2"), ("title", "Bad date"), ("date", "June first")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_form(
        &mut app,
        "/admin/events",
        &admin,
        &[("location_id", "999"), ("title", "Lost"), ("date", "2025-06-01")],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_form(
        &mut app,
        &format!("/admin/events/{}/delete", recital.id),
        &admin,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        Event::load_all(&state.db).await.expect("failed to load events").len(),
        before
    );
    let (status, _) = post_form(&mut app, "/admin/events/999/delete", &admin, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // users
    let (status, body) = get_page(&mut app, "/admin/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("otheruser"));
    assert!(body.contains(&html_url("/admin/users/3/delete")));
    // no button to delete yourself
    assert!(!body.contains(&html_url("/admin/users/2/delete")));

    let (status, location) = post_form(
        &mut app,
        "/admin/users",
        &admin,
        &[
            ("username", "curator"),
            ("email", ""),
            ("password", "longenough"),
            ("role", "admin"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/admin/users"));
    let curator = User::load_by_username("curator", &state.db)
        .await
        .expect("failed to load user")
        .expect("new user missing");
    assert_eq!(curator.role, Role::Admin);
    assert_eq!(curator.email, None);
    assert!(curator.verify_password("longenough").is_ok());

    let (status, _) = post_form(
        &mut app,
        "/admin/users",
        &admin,
        &[("username", "curator"), ("password", "longenough")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_form(
        &mut app,
        "/admin/users",
        &admin,
        &[("username", "shortpw"), ("password", "short")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        User::load_by_username("shortpw", &state.db)
            .await
            .expect("failed to load user")
            .is_none()
    );

    let (status, _) = post_form(&mut app, "/admin/users/2/delete", &admin, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(User::load(2, &state.db).await.is_ok());
    let (status, location) = post_form(&mut app, "/admin/users/3/delete", &admin, &[]).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/app/admin/users"));
    assert!(User::load(3, &state.db).await.is_err());
    let (status, _) = post_form(&mut app, "/admin/users/3/delete", &admin, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
