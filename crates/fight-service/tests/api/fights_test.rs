use axum::{body::Body, http::Request};
use fight_core::Fight;
use hyper::StatusCode;
use serde_json::json;

use crate::helpers::spawn_app;

fn locked_fight() -> Fight {
    serde_json::from_value(json!({
        "teamA": "Batman",
        "teamB": "Superman",
        "votes": { "teamA": 10, "teamB": 4, "draw": 1 },
        "status": "locked",
    }))
    .unwrap()
}

#[tokio::test]
async fn get_fight_returns_derived_view() {
    let test_app = spawn_app();

    let (status, body) = test_app.get("/api/v1/fights/demo-fight", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["teams"].as_array().unwrap().len(), 3);
    assert_eq!(body["teams"][1]["members"][1]["name"], "Genos");
    assert_eq!(
        body["teams"][2]["members"][0]["name"],
        "Batman (Earth-1, 1939)"
    );
    assert_eq!(body["totalVotes"], 27);
    assert_eq!(body["teams"][0]["tally"]["percentage"], 44);
    assert_eq!(body["votingOpen"], true);
    assert_eq!(body["bettingEligible"], true);
    assert_eq!(body["myVote"], serde_json::Value::Null);
    assert_eq!(body["teams"][0]["members"][0]["image"], "/characters/goku.png");
    assert_eq!(body["teams"][1]["members"][1].get("image"), None);
}

#[tokio::test]
async fn post_named_preview_is_served() {
    let test_app = spawn_app();
    test_app
        .backend
        .insert_fight("preview", "Preview night", locked_fight());

    let (status, body) = test_app.get("/api/v1/fights/preview", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winner"], "0");
}

#[tokio::test]
async fn rejected_bodies_use_error_shape() {
    let test_app = spawn_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/fights/demo-fight/vote")
        .header("authorization", "Bearer t1")
        .header("content-type", "application/json")
        .body(Body::from("{\"team\": "))
        .unwrap();
    let (status, body) = test_app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = test_app
        .post(
            "/api/v1/fights/demo-fight/bet",
            json!({ "prediction": "A", "amount": -5 }),
            Some("t1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = test_app
        .post(
            "/api/v1/fights/demo-fight/bet",
            json!({ "amount": 10 }),
            Some("t1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let test_app = spawn_app();

    let (status, body) = test_app.get("/api/v1/fights/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn malformed_post_id_is_bad_request() {
    let test_app = spawn_app();

    let (status, _) = test_app.get("/api/v1/fights/bad.id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vote_round_trip() {
    let test_app = spawn_app();

    let (status, body) = test_app
        .post(
            "/api/v1/fights/demo-fight/vote",
            json!({ "team": "fighter2" }),
            Some("t1"),
            Some("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["myVote"], "1");
    assert_eq!(body["teams"][1]["tally"]["votes"], 10);
    assert_eq!(body["totalVotes"], 28);

    let (status, body) = test_app.get("/api/v1/fights/demo-fight", Some("t1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["myVote"], "1");

    // one vote per user, enforced upstream
    let (status, body) = test_app
        .post(
            "/api/v1/fights/demo-fight/vote",
            json!({ "team": "A" }),
            Some("t1"),
            Some("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already voted on this fight");
}

#[tokio::test]
async fn vote_needs_a_choice() {
    let test_app = spawn_app();

    let (status, _) = test_app
        .post("/api/v1/fights/demo-fight/vote", json!({}), Some("t1"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = test_app
        .post(
            "/api/v1/fights/demo-fight/vote",
            json!({ "team": "spectator" }),
            Some("t1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = test_app
        .post(
            "/api/v1/fights/demo-fight/vote",
            json!({ "team": 3 }),
            Some("t1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn anonymous_vote_is_refused_upstream() {
    let test_app = spawn_app();

    let (status, _) = test_app
        .post(
            "/api/v1/fights/demo-fight/vote",
            json!({ "team": "draw" }),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn locked_fight_rejects_votes_and_bets() {
    let test_app = spawn_app();
    test_app
        .backend
        .insert_fight("locked-fight", "Rematch", locked_fight());

    let (status, body) = test_app.get("/api/v1/fights/locked-fight", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winner"], "0");
    assert_eq!(body["votingOpen"], false);

    let (status, _) = test_app
        .post(
            "/api/v1/fights/locked-fight/vote",
            json!({ "team": "B" }),
            Some("t1"),
            Some("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = test_app
        .post(
            "/api/v1/fights/locked-fight/bet",
            json!({ "predictedWinner": "B", "betAmount": 10 }),
            Some("t1"),
            Some("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(test_app.backend.balance("t1"), 1000);
}

#[tokio::test]
async fn bet_round_trip() {
    let test_app = spawn_app();

    let (status, body) = test_app
        .post(
            "/api/v1/fights/demo-fight/bet",
            json!({ "predictedWinner": "draw", "betAmount": 100 }),
            Some("t1"),
            Some("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "draw");
    assert_eq!(body["odds"], 3.0);
    assert_eq!(body["potentialWinnings"], 300);
    assert_eq!(body["newBalance"], 900);
    assert_eq!(body["bet"]["prediction"], "draw");
}

#[tokio::test]
async fn bet_validation() {
    let test_app = spawn_app();

    let (status, _) = test_app
        .post(
            "/api/v1/fights/demo-fight/bet",
            json!({ "prediction": "A", "amount": 10 }),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = test_app
        .post(
            "/api/v1/fights/demo-fight/bet",
            json!({ "prediction": "A", "amount": 0 }),
            Some("t1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = test_app
        .post(
            "/api/v1/fights/demo-fight/bet",
            json!({ "prediction": "A", "amount": 5000 }),
            Some("t1"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Insufficient eurodolary");
}

#[tokio::test]
async fn preview_shapes_posted_snapshot() {
    let test_app = spawn_app();

    let (status, body) = test_app
        .post(
            "/api/v1/fight-preview",
            json!({
                "teams": [
                    [{ "name": "Goku", "image": "/goku.png" }, { "characterName": "Vegeta" }],
                    "Saitama",
                ],
                "votes": { "0": 3, "1": "1" },
                "votesHidden": true,
                "myVote": "teamA",
            }),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["teams"][0]["members"][0]["image"], "/goku.png");
    assert_eq!(body["teams"][0]["members"][1]["name"], "Vegeta");
    assert_eq!(body["teams"][0]["tally"], serde_json::Value::Null);
    assert_eq!(body["votesHidden"], true);
    assert_eq!(body["totalVotes"], 0);
    assert_eq!(body["myVote"], "0");
    assert_eq!(body["votingOpen"], true);
    assert_eq!(body["bettingEligible"], false);
}

#[tokio::test]
async fn characters_are_fetched_once() {
    let test_app = spawn_app();

    let (status, body) = test_app.get("/api/v1/characters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[0]["name"], "Goku");

    let (status, _) = test_app.get("/api/v1/characters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(test_app.backend.character_fetches(), 1);
}
