use hyper::StatusCode;

use crate::helpers::spawn_app;

#[tokio::test]
async fn health_check_is_ok_while_tracker_runs() {
    let test_app = spawn_app();

    let (status, _) = test_app.get("/api/v1/health_check", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_check_fails_once_tracker_stops() {
    let test_app = spawn_app();
    test_app.cancel_token.cancel();

    let tracker = &test_app.state.background_threads["achievement_tracker"];
    for _ in 0..100 {
        if tracker.is_finished() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let (status, body) = test_app.get("/api/v1/health_check", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let test_app = spawn_app();

    let (status, _) = test_app.get("/api/v1/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
