//! Leaderboards over walks recorded through the API.

use axum::http::StatusCode;
use serde_json::{Value, json};

use energy_plus_core::Role;
use energy_plus_integration_tests::TestApp;

fn usernames(board: &Value) -> Vec<&str> {
    board
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["username"].as_str()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_global_ranking_orders_by_energy() {
    let app = TestApp::new();

    for (username, name, distances) in [
        ("ana.costa", "Ana Costa", vec![10.0, 22.1]),
        ("maria.silva", "Maria Silva", vec![45.3]),
        ("joao.santos", "João Santos", vec![38.7]),
    ] {
        let (_, mut client) = app.login_as(username, name, Role::Citizen).await;
        for distance in distances {
            let (status, _) = client.walk(distance).await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }
    app.create_user("pedro.lima", "Pedro Lima", Role::Citizen)
        .await;

    let (status, board) = app.client().get("/api/ranking").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        usernames(&board),
        ["maria.silva", "joao.santos", "ana.costa", "pedro.lima"]
    );

    let first = &board[0];
    assert_eq!(first["position"], 1);
    assert_eq!(first["name"], "Maria Silva");
    assert_eq!(first["walks"], 1);
    assert!((first["energy"].as_f64().unwrap_or_default() - 2265.0).abs() < 1e-6);

    let third = &board[2];
    assert_eq!(third["position"], 3);
    assert_eq!(third["walks"], 2);
    assert!((third["distance"].as_f64().unwrap_or_default() - 32.1).abs() < 1e-9);

    let last = &board[3];
    assert_eq!(last["position"], 4);
    assert_eq!(last["walks"], 0);
    assert_eq!(last["energy"], json!(0.0));
}

#[tokio::test]
async fn test_friends_ranking() {
    let app = TestApp::new();
    let (maria, mut maria_client) = app
        .login_as("maria.silva", "Maria Silva", Role::Citizen)
        .await;
    let (_, mut joao_client) = app
        .login_as("joao.santos", "João Santos", Role::Citizen)
        .await;
    let (_, mut ana_client) = app
        .login_as("ana.costa", "Ana Costa", Role::Citizen)
        .await;

    maria_client.walk(5.0).await;
    joao_client.walk(8.0).await;
    ana_client.walk(20.0).await;

    let (status, request) = maria_client
        .post("/api/friends/request", json!({ "username": "joao.santos" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = joao_client
        .put(&format!("/api/friends/{}/accept", request["id"]))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Explicit user id.
    let (status, board) = app
        .client()
        .get(&format!("/api/ranking?friendsOnly=true&userId={}", maria.id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usernames(&board), ["joao.santos", "maria.silva"]);
    assert_eq!(board[1]["position"], 2);

    // Defaults to the logged-in user.
    let (_, board) = maria_client.get("/api/ranking?friendsOnly=true").await;
    assert_eq!(usernames(&board), ["joao.santos", "maria.silva"]);

    // Ana has no friends: only herself.
    let (_, board) = ana_client.get("/api/ranking?friendsOnly=true").await;
    assert_eq!(usernames(&board), ["ana.costa"]);

    // Anonymous friends-only request falls back to the global board.
    let (_, board) = app.client().get("/api/ranking?friendsOnly=true").await;
    assert_eq!(usernames(&board), ["ana.costa", "joao.santos", "maria.silva"]);
}

#[tokio::test]
async fn test_profile_totals() {
    let app = TestApp::new();
    let (maria, mut client) = app
        .login_as("maria.silva", "Maria Silva", Role::Citizen)
        .await;
    client.walk(1.5).await;
    client.walk(2.5).await;

    let (status, profile) = client.get(&format!("/api/users/{}", maria.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["user"]["username"], "maria.silva");
    assert_eq!(profile["totalWalks"], 2);
    assert_eq!(profile["totalDistance"], json!(4.0));
    assert_eq!(profile["totalEnergy"], json!(200.0));
    assert_eq!(profile["friendsCount"], 0);

    let (status, totals) = client
        .get(&format!("/api/users/{}/totals", maria.id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(totals["totalWalks"], 2);

    let (status, user) = client.get("/api/users/by-username/maria.silva").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], json!(maria.id));

    let (status, _) = client.get("/api/users/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = client.get("/api/users/by-username/Not%20Valid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
