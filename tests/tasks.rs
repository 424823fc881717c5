mod common;

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{rt, test, App, HttpServer};
use common::{app, bearer, memory_state, sign_up, TestUser};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::TcpListener;
use tasktrack::models::Task;

async fn create_task(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    user: &TestUser,
    payload: Value,
) -> Task {
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&user.token))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "payload {}", payload);
    test::read_body_json(resp).await
}

#[actix_rt::test]
async fn test_create_and_read_own_task() {
    let (state, _) = memory_state();
    let app = test::init_service(app(&state)).await;
    let user = sign_up(&app, "Owner", "owner@example.com", "ownerpass1").await;

    let task = create_task(&app, &user, json!({ "description": "  write docs  " })).await;
    assert_eq!(task.description, "write docs");
    assert!(!task.completed);
    assert_eq!(task.owner.to_string(), user.id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(&user.token))
        .to_request();
    let fetched: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, task);
}

#[actix_rt::test]
async fn test_create_task_validation() {
    let (state, _) = memory_state();
    let app = test::init_service(app(&state)).await;
    let user = sign_up(&app, "Owner", "owner@example.com", "ownerpass1").await;

    for payload in [
        json!({}),
        json!({ "description": "   " }),
        json!({ "description": "x", "owner": user.id }),
        json!({ "description": "x", "completed": "yes" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(bearer(&user.token))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
    }
}

#[actix_rt::test]
async fn test_foreign_tasks_look_missing() {
    let (state, _) = memory_state();
    let app = test::init_service(app(&state)).await;
    let alice = sign_up(&app, "Alice", "alice@example.com", "alicepass1").await;
    let bob = sign_up(&app, "Bob", "bob@example.com", "bobpass123").await;

    let task = create_task(&app, &alice, json!({ "description": "alice only" })).await;
    let uri = format!("/api/tasks/{}", task.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&bob.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let foreign_body = test::read_body(resp).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", uuid::Uuid::new_v4()))
        .insert_header(bearer(&bob.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(test::read_body(resp).await, foreign_body);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&bob.token))
        .set_json(json!({ "completed": true }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&bob.token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header(bearer(&bob.token))
        .to_request();
    let listed: Vec<Task> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());

    // Bob's attempts left Alice's task as it was.
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&alice.token))
        .to_request();
    let fetched: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, task);
}

#[actix_rt::test]
async fn test_malformed_task_id_is_not_found() {
    let (state, _) = memory_state();
    let app = test::init_service(app(&state)).await;
    let user = sign_up(&app, "Owner", "owner@example.com", "ownerpass1").await;

    let req = test::TestRequest::get()
        .uri("/api/tasks/not-a-uuid")
        .insert_header(bearer(&user.token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_update_task_allow_list() {
    let (state, _) = memory_state();
    let app = test::init_service(app(&state)).await;
    let user = sign_up(&app, "Owner", "owner@example.com", "ownerpass1").await;
    let task = create_task(&app, &user, json!({ "description": "draft" })).await;
    let uri = format!("/api/tasks/{}", task.id);

    for payload in [
        json!({ "_id": "x" }),
        json!({ "owner": uuid::Uuid::new_v4() }),
        json!({ "completed": true, "createdAt": "2020-01-01T00:00:00Z" }),
    ] {
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(bearer(&user.token))
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
    }

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&user.token))
        .set_json(json!({ "description": "final", "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Task = test::read_body_json(resp).await;
    assert_eq!(updated.id, task.id);
    assert_eq!(updated.owner, task.owner);
    assert_eq!(updated.description, "final");
    assert!(updated.completed);
    assert_eq!(updated.created_at, task.created_at);
    assert!(updated.updated_at >= task.updated_at);
}

#[actix_rt::test]
async fn test_delete_task_returns_it_once() {
    let (state, _) = memory_state();
    let app = test::init_service(app(&state)).await;
    let user = sign_up(&app, "Owner", "owner@example.com", "ownerpass1").await;
    let task = create_task(&app, &user, json!({ "description": "ephemeral" })).await;
    let uri = format!("/api/tasks/{}", task.id);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&user.token))
        .to_request();
    let deleted: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(deleted, task);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&user.token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_list_tasks_filter_sort_and_paginate() {
    let (state, _) = memory_state();
    let app = test::init_service(app(&state)).await;
    let user = sign_up(&app, "Owner", "owner@example.com", "ownerpass1").await;

    for (description, completed) in [("b", true), ("d", false), ("a", false), ("c", true)] {
        create_task(
            &app,
            &user,
            json!({ "description": description, "completed": completed }),
        )
        .await;
    }

    let list = |query: &str| {
        test::TestRequest::get()
            .uri(&format!("/api/tasks{}", query))
            .insert_header(bearer(&user.token))
            .to_request()
    };
    let descriptions = |tasks: Vec<Task>| {
        tasks
            .into_iter()
            .map(|task| task.description)
            .collect::<Vec<_>>()
    };

    let all: Vec<Task> = test::call_and_read_body_json(&app, list("")).await;
    assert_eq!(descriptions(all), vec!["b", "d", "a", "c"]);

    let done: Vec<Task> =
        test::call_and_read_body_json(&app, list("?completed=true&sortBy=description:asc")).await;
    assert_eq!(descriptions(done), vec!["b", "c"]);

    let page: Vec<Task> = test::call_and_read_body_json(
        &app,
        list("?sortBy=description:desc&limit=2&skip=1"),
    )
    .await;
    assert_eq!(descriptions(page), vec!["c", "b"]);

    for bad in [
        "?limit=0",
        "?limit=101",
        "?sortBy=owner:asc",
        "?sortBy=description:up",
        "?completed=maybe",
    ] {
        let resp = test::call_service(&app, list(bad)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {}", bad);
    }
}

#[actix_rt::test]
async fn test_create_task_unauthorized_over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let (state, _) = memory_state();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{}/api/tasks", port))
        .json(&json!({ "description": "sneaky" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Please authenticate." }));

    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    handle.stop(true).await;
}
