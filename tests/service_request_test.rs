mod common;

use serde_json::json;

#[tokio::test]
async fn service_request_lifecycle() {
    let app = common::spawn_app().await;
    let (client_id, client) = common::create_test_user(&app, "client").await;
    let (manager_id, manager) = common::create_manager(&app).await;
    let order_id = common::create_order(&app, &client, "Laptop Repair").await;

    let (status, body) = app
        .post(
            "/ServiceRequests/create",
            &client,
            json!({
                "serviceType": "Diagnostics",
                "description": "Run a full hardware check",
                "cost": 35.5,
                "orderId": order_id,
            }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["status"], "New");
    assert_eq!(body["data"]["cost"], 35.5);
    let request_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .get(&format!("/ServiceRequests/{request_id}"), &client)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["client"]["id"], client_id);
    assert!(body["manager"].is_null());

    let (status, body) = app
        .put(
            &format!("/ServiceRequests/manager/assign/{request_id}"),
            &manager,
            json!({}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "Processing");
    assert_eq!(body["data"]["assignedToId"], manager_id);

    let path = format!("/ServiceRequests/manager/status/{request_id}");
    let (status, _) = app.put(&path, &manager, json!({ "status": "Done" })).await;
    assert_eq!(status, 400);

    let (status, body) = app.put(&path, &manager, json!({ "status": "COMPLETED" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "Completed");

    let (status, mine) = app.get("/ServiceRequests/my", &client).await;
    assert_eq!(status, 200);
    assert_eq!(mine[0]["manager"]["id"], manager_id);
}

#[tokio::test]
async fn access_rules() {
    let app = common::spawn_app().await;
    let (_, client) = common::create_test_user(&app, "client").await;
    let (_, other) = common::create_test_user(&app, "other").await;
    let (_, manager) = common::create_manager(&app).await;
    let order_id = common::create_order(&app, &client, "Laptop Repair").await;

    // Someone else's order cannot be referenced.
    let (status, _) = app
        .post(
            "/ServiceRequests/create",
            &other,
            json!({ "serviceType": "Cleaning", "description": "Dust", "orderId": order_id }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, body) = app
        .post(
            "/ServiceRequests/create",
            &client,
            json!({ "serviceType": "Cleaning", "description": "Dust" }),
        )
        .await;
    assert_eq!(status, 200);
    let request_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .get(&format!("/ServiceRequests/{request_id}"), &other)
        .await;
    assert_eq!(status, 403);

    let (status, _) = app.get("/ServiceRequests", &client).await;
    assert_eq!(status, 403);
    let (status, all) = app.get("/ServiceRequests", &manager).await;
    assert_eq!(status, 200);
    assert_eq!(all.as_array().unwrap().len(), 1);

    // Status changes need the assignee.
    let (status, _) = app
        .put(
            &format!("/ServiceRequests/manager/status/{request_id}"),
            &manager,
            json!({ "status": "Cancelled" }),
        )
        .await;
    assert_eq!(status, 403);

    let (status, _) = app
        .put(
            &format!("/ServiceRequests/manager/assign/{request_id}"),
            &client,
            json!({}),
        )
        .await;
    assert_eq!(status, 403);
}
