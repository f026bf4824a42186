mod common;
use common::{create_titled, get_json, register_user, setup_test_app};

#[actix_web::test]
async fn test_stats_for_empty_library() {
    let (app, _pool) = setup_test_app().await;
    let (_, token) = register_user(&app, "ana").await;

    let (status, stats) = get_json(&app, &token, "/api/videos/stats").await;
    assert_eq!(status, 200);
    assert_eq!(stats["total_videos"], 0);
    assert_eq!(stats["completed"], 0);
    assert_eq!(stats["level"], 1);
}

#[actix_web::test]
async fn test_stats_counts_each_status_for_owner_only() {
    let (app, _pool) = setup_test_app().await;
    let (_, token) = register_user(&app, "bruno").await;
    let (_, other) = register_user(&app, "carla").await;

    for i in 0..5 {
        create_titled(&app, &token, &format!("Done {}", i), "completed").await;
    }
    create_titled(&app, &token, "Idea", "planned").await;
    create_titled(&app, &token, "Shooting", "in-production").await;
    create_titled(&app, &token, "Cutting", "in-editing").await;
    create_titled(&app, &token, "Cutting too", "in-editing").await;
    for i in 0..7 {
        create_titled(&app, &other, &format!("Other {}", i), "completed").await;
    }

    let (_, stats) = get_json(&app, &token, "/api/videos/stats").await;
    assert_eq!(stats["total_videos"], 9);
    assert_eq!(stats["planned"], 1);
    assert_eq!(stats["in_production"], 1);
    assert_eq!(stats["in_editing"], 2);
    assert_eq!(stats["completed"], 5);
    assert_eq!(stats["level"], 2);

    let (_, other_stats) = get_json(&app, &other, "/api/videos/stats").await;
    assert_eq!(other_stats["total_videos"], 7);
    assert_eq!(other_stats["level"], 2);
}
