use super::*;
use test_log::test;

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(
        path = "../../../../db/fixtures",
        scripts("users", "locations", "events")
    )
))]
async fn test_list_and_pick(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");
    let cookie = login(&mut app, &state, "testuser")
        .await
        .expect("Failed to log in");

    let (status, body) = get(&mut app, "/events/location/2", &cookie)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![4, 5]);
    assert_eq!(body[0]["title"], "Jazz Night");
    assert_eq!(body[0]["date"], "2024-04-01");

    let (_, body) = get(&mut app, "/events/location/3", &cookie)
        .await
        .expect("request failed");
    assert_eq!(body, json!([]));

    for _ in 0..10 {
        let (status, event) = get(&mut app, "/events/random/pick", &cookie)
            .await
            .expect("request failed");
        assert_eq!(status, StatusCode::OK);
        let id = event["id"].as_i64().expect("event has no id");
        assert!((1..=6).contains(&id));
        // the location is populated rather than just its id
        assert!(event["locationId"]["name"].is_string());
    }
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(path = "../../../../db/fixtures", scripts("users", "locations"))
))]
async fn test_pick_without_events(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");
    let cookie = login(&mut app, &state, "testuser")
        .await
        .expect("Failed to log in");

    let (status, body) = get(&mut app, "/events/random/pick", &cookie)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[test(sqlx::test(
    migrations = "../db/migrations/",
    fixtures(
        path = "../../../../db/fixtures",
        scripts("users", "locations", "events")
    )
))]
async fn test_modify_events(pool: Pool<Sqlite>) {
    let (mut app, state) = test_app(pool).await.expect("failed to create test app");
    let user_cookie = login(&mut app, &state, "testuser")
        .await
        .expect("Failed to log in");
    let admin_cookie = login(&mut app, &state, "admin")
        .await
        .expect("Failed to log in");

    let new_event = json!({
        "locationId": 3,
        "title": "Lunar New Year Concert",
        "date": "2025-01-29",
        "time": "15:00",
    });

    let (status, _) = send(
        &mut app,
        Method::POST,
        "/events",
        Some(&user_cookie),
        Some(new_event.clone()),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &mut app,
        Method::POST,
        "/events",
        Some(&admin_cookie),
        Some(json!({"locationId": 3, "title": "No date"})),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Location, title and date required");

    let (status, body) = send(
        &mut app,
        Method::POST,
        "/events",
        Some(&admin_cookie),
        Some(json!({"locationId": 99, "title": "Nowhere", "date": "2025-01-29"})),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Location not found");

    let (status, created) = send(
        &mut app,
        Method::POST,
        "/events",
        Some(&admin_cookie),
        Some(new_event),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 7);
    assert_eq!(created["locationId"], 3);
    assert_eq!(created["presenter"], Value::Null);

    let (status, _) = send(
        &mut app,
        Method::PUT,
        "/events/7",
        Some(&admin_cookie),
        Some(json!({})),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &mut app,
        Method::PUT,
        "/events/7",
        Some(&admin_cookie),
        Some(json!({"presenter": "Tuen Mun Youth Orchestra", "date": "2025-01-30"})),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["presenter"], "Tuen Mun Youth Orchestra");
    assert_eq!(body["date"], "2025-01-30");
    assert_eq!(body["title"], "Lunar New Year Concert");

    let (status, _) = send(
        &mut app,
        Method::PUT,
        "/events/7",
        Some(&admin_cookie),
        Some(json!({"locationId": 42})),
    )
    .await
    .expect("request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(&mut app, "/events/location/3", &user_cookie)
        .await
        .expect("request failed");
    assert_eq!(ids(&body), vec![7]);

    let (status, _) = send(&mut app, Method::DELETE, "/events/7", Some(&admin_cookie), None)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&mut app, Method::DELETE, "/events/7", Some(&admin_cookie), None)
        .await
        .expect("request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");
}
