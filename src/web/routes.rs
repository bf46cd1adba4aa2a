// src/web/routes.rs
use crate::{
    state::AppState,
    web::{dashboard_handlers, message_handlers, note_handlers, realtime_handlers, student_handlers},
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- API JSON (/api/...) ---
    let api_routes = Router::new()
        .route("/dashboard", get(dashboard_handlers::dashboard_handler))
        .route(
            "/students",
            get(student_handlers::list_students).post(student_handlers::create_student),
        )
        .route(
            "/students/{id}",
            get(student_handlers::get_student)
                .patch(student_handlers::update_student)
                .delete(student_handlers::delete_student),
        )
        // Ações do painel de detalhe
        .route("/students/{id}/mentor", post(student_handlers::toggle_mentor))
        .route("/students/{id}/payment-status", put(student_handlers::set_payment_status))
        // Conversa do aluno
        .route(
            "/students/{id}/messages",
            get(message_handlers::list_messages).post(message_handlers::send_message),
        )
        .route(
            "/students/{id}/messages/student-count",
            get(message_handlers::student_message_count),
        )
        .route("/messages/{id}", delete(message_handlers::delete_message))
        // Notas internas
        .route(
            "/students/{id}/notes",
            get(note_handlers::list_notes).post(note_handlers::create_note),
        )
        .route("/notes/{id}", delete(note_handlers::delete_note));

    // --- Feeds em tempo real (/ws/...) ---
    let ws_routes = Router::new()
        .route("/students", get(realtime_handlers::students_ws_handler))
        .route("/students/{id}/messages", get(realtime_handlers::messages_ws_handler))
        .route("/students/{id}/notes", get(realtime_handlers::notes_ws_handler));

    Router::new()
        .nest("/api", api_routes)
        .nest("/ws", ws_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app(fixture_fallback: bool) -> (Router, Store) {
        let store = Store::open_in_memory().await.unwrap();
        let state = AppState { store: store.clone(), fixture_fallback };
        (create_router(state), store)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn student_body(name: &str, email: &str) -> Value {
        json!({
            "name": name,
            "email": email,
            "courseName": "Full-Stack Web Development",
            "currentDay": 5,
            "totalDays": 90
        })
    }

    #[tokio::test]
    async fn student_crud_over_http() {
        let (app, _store) = app(false).await;

        let (status, created) = send(&app, "POST", "/api/students", Some(student_body("Ana", "ana@email.com"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["courseName"], "Full-Stack Web Development");
        assert_eq!(created["unreadCount"], 0);

        let (status, fetched) = send(&app, "GET", &format!("/api/students/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, patched) =
            send(&app, "PATCH", &format!("/api/students/{}", id), Some(json!({ "progress": 40 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["progress"], 40);

        let (status, toggled) = send(&app, "POST", &format!("/api/students/{}/mentor", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["needsMentor"], true);

        let (status, paid) = send(
            &app,
            "PUT",
            &format!("/api/students/{}/payment-status", id),
            Some(json!({ "paymentStatus": "overdue" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["paymentStatus"], "overdue");

        let (status, _) = send(&app, "DELETE", &format!("/api/students/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, "GET", &format!("/api/students/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn invariant_violation_is_422() {
        let (app, _store) = app(false).await;
        let mut body = student_body("Ana", "ana@email.com");
        body["currentDay"] = json!(91);
        let (status, body) = send(&app, "POST", "/api/students", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn search_query_filters_students() {
        let (app, _store) = app(false).await;
        send(&app, "POST", "/api/students", Some(student_body("Alice", "alice@email.com"))).await;
        send(&app, "POST", "/api/students", Some(student_body("Bruno", "bruno@email.com"))).await;

        let (_, found) = send(&app, "GET", "/api/students?q=ALI", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["name"], "Alice");

        let (_, all) = send(&app, "GET", "/api/students", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn chat_and_notes_over_http() {
        let (app, _store) = app(false).await;
        let (_, created) = send(&app, "POST", "/api/students", Some(student_body("Ana", "ana@email.com"))).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, sent) = send(
            &app,
            "POST",
            &format!("/api/students/{}/messages", id),
            Some(json!({ "content": "Olá Ana!", "timestamp": "2024-03-15T10:35:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sent["sender"], "admin");
        send(
            &app,
            "POST",
            &format!("/api/students/{}/messages", id),
            Some(json!({ "sender": "student", "content": "Olá!", "timestamp": "2024-03-15T10:30:00Z" })),
        )
        .await;

        let (_, messages) = send(&app, "GET", &format!("/api/students/{}/messages", id), None).await;
        assert_eq!(messages[0]["content"], "Olá!");
        assert_eq!(messages[1]["content"], "Olá Ana!");

        let (_, count) = send(&app, "GET", &format!("/api/students/{}/messages/student-count", id), None).await;
        assert_eq!(count["count"], 1);

        let message_id = sent["id"].as_str().unwrap();
        let (status, _) = send(&app, "DELETE", &format!("/api/messages/{}", message_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, note) = send(
            &app,
            "POST",
            &format!("/api/students/{}/notes", id),
            Some(json!({ "content": "Precisa de mentor", "adminName": "Admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, notes) = send(&app, "GET", &format!("/api/students/{}/notes", id), None).await;
        assert_eq!(notes.as_array().unwrap().len(), 1);

        let note_id = note["id"].as_str().unwrap();
        let (status, _) = send(&app, "DELETE", &format!("/api/notes/{}", note_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &format!("/api/notes/{}", note_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn writes_for_unknown_student_are_404() {
        let (app, _store) = app(false).await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/students/nao-existe/messages",
            Some(json!({ "content": "olá" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(
            &app,
            "POST",
            "/api/students/nao-existe/notes",
            Some(json!({ "content": "x", "adminName": "Admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_dashboard_is_live_not_fixture() {
        let (app, _store) = app(true).await;
        let (status, body) = send(&app, "GET", "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "live");
        assert!(body["students"].as_array().unwrap().is_empty());
        assert!(body.get("degraded").is_none());
    }

    #[tokio::test]
    async fn failed_load_serves_fixtures_as_degraded() {
        let (app, store) = app(true).await;
        store.close().await;

        let (status, body) = send(&app, "GET", "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "fixture");
        assert_eq!(body["degraded"]["reason"], "Falha ao carregar alunos");
        assert!(!body["students"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_load_without_fallback_is_500() {
        let (app, store) = app(false).await;
        store.close().await;

        let (status, body) = send(&app, "GET", "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
    }
}
