use hyper::StatusCode;
use serde_json::{json, Value};

use crate::helpers::spawn_app;

fn entry<'a>(body: &'a Value, id: &str) -> &'a Value {
    body.as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["id"] == id)
        .unwrap()
}

#[tokio::test]
async fn first_vote_unlocks_achievement() {
    let test_app = spawn_app();

    let (status, _) = test_app
        .post(
            "/api/v1/fights/demo-fight/vote",
            json!({ "team": "A" }),
            Some("t1"),
            Some("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    test_app.wait_for_unlocks(1).await;
    let unlocks = test_app.backend.unlocks();
    assert_eq!(unlocks[0].user_id, "u1");
    assert_eq!(unlocks[0].achievement_id, "first_vote");

    let (status, body) = test_app.get("/api/v1/achievements/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry(&body, "first_vote")["unlocked"], true);
    assert_eq!(entry(&body, "ballot_box")["progress"], 1);
    assert_eq!(entry(&body, "ballot_box")["percentage"], 1);
}

#[tokio::test]
async fn unknown_user_has_no_progress() {
    let test_app = spawn_app();

    let (status, body) = test_app.get("/api/v1/achievements/nobody", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|entry| entry["unlocked"] == false && entry["progress"] == 0));
}
