mod common;

use serde_json::json;

#[tokio::test]
async fn laptop_repair_lifecycle() {
    let app = common::spawn_app().await;
    let (client_id, client) = common::create_test_user(&app, "client").await;
    let (manager_id, manager) = common::create_manager(&app).await;

    let order_id = common::create_order(&app, &client, "Laptop Repair").await;

    let (status, order) = app.get(&format!("/Orders/{order_id}"), &client).await;
    assert_eq!(status, 200);
    assert_eq!(order["status"], "New");
    assert_eq!(order["priority"], "High");
    assert_eq!(order["cost"], 120.5);
    assert_eq!(order["clientId"], client_id);
    assert!(order["completeDate"].is_null());

    // Claim
    let (status, body) = app
        .put(&format!("/Orders/manager/assign/{order_id}"), &manager, json!({}))
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["status"], "Processing");
    assert_eq!(body["data"]["assignedToId"], manager_id);

    // Complete
    let (status, body) = app
        .put(
            &format!("/Orders/manager/{order_id}"),
            &manager,
            json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["status"], "Completed");
    assert!(body["data"]["completeDate"].is_string());

    // The client sees the manager on their order list.
    let (status, mine) = app.get("/Orders/my", &client).await;
    assert_eq!(status, 200);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["assignedToId"], manager_id);
    assert!(mine[0]["managerName"].as_str().unwrap().starts_with("manager"));

    // Reopening clears the completion date.
    let (status, body) = app
        .put(
            &format!("/Orders/manager/{order_id}"),
            &manager,
            json!({ "status": "Processing" }),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["data"]["completeDate"].is_null());
}

#[tokio::test]
async fn clients_cannot_read_other_orders() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_test_user(&app, "owner").await;
    let (_, stranger) = common::create_test_user(&app, "stranger").await;
    let order_id = common::create_order(&app, &owner, "Printer Setup").await;

    let (status, _) = app.get(&format!("/Orders/{order_id}"), &stranger).await;
    assert_eq!(status, 403);

    let (status, body) = app.get("/Orders/9999", &stranger).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Order not found");

    let (status, _) = app.get("/Orders", &stranger).await;
    assert_eq!(status, 403);
    let (status, _) = app.get("/Orders/manager/stats", &owner).await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn create_validates_fields() {
    let app = common::spawn_app().await;
    let (_, client) = common::create_test_user(&app, "client").await;

    let cases = [
        json!({ "orderName": "   ", "description": "x" }),
        json!({ "orderName": "Repair", "description": "x".repeat(3501) }),
        json!({ "orderName": "Repair", "description": "x", "priority": "Urgent" }),
        json!({ "orderName": "Repair", "description": "x", "cost": -1.0 }),
    ];
    for payload in cases {
        let (status, body) = app.post("/Orders/create", &client, payload).await;
        assert_eq!(status, 400, "{body}");
    }

    let (status, body) = app
        .post(
            "/Orders/create",
            &client,
            json!({ "orderName": "  Repair  ", "description": "Fan" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["orderName"], "Repair");
    assert_eq!(body["data"]["priority"], "Medium");
}

#[tokio::test]
async fn manager_unassign_rules() {
    let app = common::spawn_app().await;
    let (_, client) = common::create_test_user(&app, "client").await;
    let (_, first) = common::create_manager(&app).await;
    let (_, second) = common::create_manager(&app).await;
    let order_id = common::create_order(&app, &client, "Phone Screen").await;

    app.put(&format!("/Orders/manager/assign/{order_id}"), &first, json!({}))
        .await;

    // Only the assignee can give it back.
    let (status, _) = app
        .put(&format!("/Orders/manager/unassign/{order_id}"), &second, json!({}))
        .await;
    assert_eq!(status, 400);

    // Only the assignee can edit it.
    let (status, _) = app
        .put(
            &format!("/Orders/manager/{order_id}"),
            &second,
            json!({ "priority": "Low" }),
        )
        .await;
    assert_eq!(status, 403);

    let (status, body) = app
        .put(&format!("/Orders/manager/unassign/{order_id}"), &first, json!({}))
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["status"], "New");
    assert!(body["data"]["assignedToId"].is_null());

    // Closed orders stay with their manager.
    app.put(&format!("/Orders/manager/assign/{order_id}"), &first, json!({}))
        .await;
    app.put(
        &format!("/Orders/manager/{order_id}"),
        &first,
        json!({ "status": "Cancelled" }),
    )
    .await;
    let (status, _) = app
        .put(&format!("/Orders/manager/unassign/{order_id}"), &first, json!({}))
        .await;
    assert_eq!(status, 400);

    // Clients cannot claim.
    let (status, _) = app
        .put(&format!("/Orders/manager/assign/{order_id}"), &client, json!({}))
        .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn admin_unassign_keeps_completion() {
    let app = common::spawn_app().await;
    let (_, client) = common::create_test_user(&app, "client").await;
    let (manager_id, manager) = common::create_manager(&app).await;
    let (_, admin) = common::create_admin(&app).await;
    let order_id = common::create_order(&app, &client, "Server Move").await;

    app.put(&format!("/Orders/manager/assign/{order_id}"), &manager, json!({}))
        .await;
    app.put(
        &format!("/Orders/manager/{order_id}"),
        &manager,
        json!({ "status": "Completed" }),
    )
    .await;

    let (status, _) = app
        .put(&format!("/Orders/admin/unassign/{order_id}"), &manager, json!({}))
        .await;
    assert_eq!(status, 403);

    let (status, body) = app
        .put(&format!("/Orders/admin/unassign/{order_id}"), &admin, json!({}))
        .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["status"], "Completed");
    assert!(body["data"]["completeDate"].is_string());
    assert_eq!(body["data"]["oldManager"]["id"], manager_id);

    let (_, order) = app.get(&format!("/Orders/{order_id}"), &admin).await;
    assert!(order["assignedToId"].is_null());
}

#[tokio::test]
async fn assignee_must_be_staff() {
    let app = common::spawn_app().await;
    let (client_id, client) = common::create_test_user(&app, "client").await;
    let (manager_id, _) = common::create_manager(&app).await;
    let (_, admin) = common::create_admin(&app).await;
    let order_id = common::create_order(&app, &client, "Network Audit").await;
    let path = format!("/Orders/{order_id}");

    let (status, _) = app.put(&path, &admin, json!({ "assignedToId": client_id })).await;
    assert_eq!(status, 400);
    let (status, _) = app.put(&path, &admin, json!({ "assignedToId": 9999 })).await;
    assert_eq!(status, 400);

    let (status, body) = app.put(&path, &admin, json!({ "assignedToId": manager_id })).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["assignedToId"], manager_id);

    let (status, body) = app.put(&path, &admin, json!({ "assignedToId": 0 })).await;
    assert_eq!(status, 200);
    assert!(body["data"]["assignedToId"].is_null());
}

#[tokio::test]
async fn manager_queue_detail_and_stats() {
    let app = common::spawn_app().await;
    let (_, client) = common::create_test_user(&app, "client").await;
    let (_, manager) = common::create_manager(&app).await;
    let first = common::create_order(&app, &client, "First").await;
    let second = common::create_order(&app, &client, "Second").await;

    app.put(&format!("/Orders/manager/assign/{first}"), &manager, json!({}))
        .await;

    let (status, all) = app.get("/Orders/manager", &manager).await;
    assert_eq!(status, 200);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 2);
    // Newest first.
    assert_eq!(all[0]["id"], second);

    let (_, mine) = app.get("/Orders/manager?assigned=me", &manager).await;
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], first);

    let (status, stats) = app.get("/Orders/manager/stats", &manager).await;
    assert_eq!(status, 200);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["new"], 1);
    assert_eq!(stats["processing"], 1);
    assert_eq!(stats["mine"], 1);
    assert_eq!(stats["highPriority"], 2);
    assert_eq!(stats["today"], 2);

    app.post(
        "/SupportRequests/create",
        &client,
        json!({ "topic": "Status?", "message": "Any news?", "relatedOrderId": first }),
    )
    .await;
    app.post(
        "/ServiceRequests/create",
        &client,
        json!({ "serviceType": "Diagnostics", "description": "Full check", "cost": 40.25, "orderId": first }),
    )
    .await;

    let (status, detail) = app
        .get(&format!("/Orders/manager/detail/{first}"), &manager)
        .await;
    assert_eq!(status, 200, "{detail}");
    assert_eq!(detail["order"]["id"], first);
    assert!(detail["client"]["name"].as_str().unwrap().starts_with("client"));
    assert_eq!(detail["supportRequests"].as_array().unwrap().len(), 1);
    assert_eq!(detail["serviceRequests"].as_array().unwrap().len(), 1);
    assert_eq!(detail["statistics"]["activeSupportRequests"], 1);
    assert_eq!(detail["statistics"]["totalServiceCost"], 40.25);
    assert_eq!(detail["statistics"]["totalTimeInDays"], 0.0);
}

#[tokio::test]
async fn admin_create_and_delete() {
    let app = common::spawn_app().await;
    let (client_id, client) = common::create_test_user(&app, "client").await;
    let (_, admin) = common::create_admin(&app).await;

    let (status, _) = app
        .post(
            "/Orders",
            &client,
            json!({ "clientId": client_id, "orderName": "X", "description": "Y" }),
        )
        .await;
    assert_eq!(status, 403);

    let (status, _) = app
        .post(
            "/Orders",
            &admin,
            json!({ "clientId": 9999, "orderName": "X", "description": "Y" }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, body) = app
        .post(
            "/Orders",
            &admin,
            json!({ "clientId": client_id, "orderName": "Office Wiring", "description": "Two floors" }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    let free_order = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["clientId"], client_id);

    let referenced = common::create_order(&app, &client, "Referenced").await;
    app.post(
        "/SupportRequests/create",
        &client,
        json!({ "topic": "Hi", "message": "About my order", "relatedOrderId": referenced }),
    )
    .await;

    let (status, _) = app.delete(&format!("/Orders/{referenced}"), &admin).await;
    assert_eq!(status, 400);

    let (status, _) = app.delete(&format!("/Orders/{free_order}"), &client).await;
    assert_eq!(status, 403);

    let (status, _) = app.delete(&format!("/Orders/{free_order}"), &admin).await;
    assert_eq!(status, 200);
    let (status, _) = app.delete(&format!("/Orders/{free_order}"), &admin).await;
    assert_eq!(status, 404);
}
