use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{test, App};
use diner_feedback::api::AppState;
use diner_feedback::auth::SESSION_COOKIE;
use diner_feedback::config::Config;
use diner_feedback::db::Database;
use futures::future::join_all;
use serde_json::{json, Value};

const ADMIN_USER: &str = "manager";
const ADMIN_PASS: &str = "grill-master";

// Fresh in-memory store and app state for each test
async fn setup() -> AppState {
    let db = Database::open(":memory:").unwrap();
    db.create_schema().await.unwrap();
    let config = Config {
        admin_username: ADMIN_USER.into(),
        admin_password: ADMIN_PASS.into(),
        session_secret: "integration-secret".into(),
        ..Config::default()
    };
    AppState::new(db, &config)
}

fn submission(rating: i64, content: &str) -> Value {
    json!({
        "name": "Table 4",
        "contact": "table4@example.com",
        "diningTime": "2026-10-10T19:00",
        "rating": rating,
        "content": content,
    })
}

#[actix_web::test]
async fn submitted_feedback_resolves_everywhere() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/feedback")
        .set_json(submission(4, "Steak was excellent, sides were cold"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let feedback_id = body["feedbackId"].as_str().unwrap().to_string();

    // Public single-item lookup
    let req = test::TestRequest::get()
        .uri(&format!("/feedback/{feedback_id}"))
        .to_request();
    let public: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(public["feedbackId"], feedback_id.as_str());
    assert_eq!(public["rating"], 4);
    assert_eq!(public["likes"], 0);
    let keys = public.as_object().unwrap();
    for hidden in ["id", "contact", "status", "response"] {
        assert!(!keys.contains_key(hidden), "{hidden} exposed publicly");
    }

    // Submitter detail lookup
    let req = test::TestRequest::get()
        .uri(&format!("/feedback?id={feedback_id}"))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["status"], "unprocessed");
    assert_eq!(detail["response"], Value::Null);
    assert!(!detail.as_object().unwrap().contains_key("id"));

    // Admin full listing
    let cookie = login(&app).await;
    let req = test::TestRequest::get()
        .uri("/admin/feedback")
        .cookie(cookie)
        .to_request();
    let all: Value = test::call_and_read_body_json(&app, req).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["feedbackId"], feedback_id.as_str());
    assert_eq!(all[0]["contact"], "table4@example.com");
    assert!(all[0]["id"].as_i64().unwrap() > 0);
}

async fn login<S, B>(app: &S) -> Cookie<'static>
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<B>,
        Error = actix_web::Error,
    >,
    B: actix_web::body::MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_json(json!({ "username": ADMIN_USER, "password": ADMIN_PASS }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("session cookie set")
        .into_owned();
    assert_eq!(cookie.http_only(), Some(true));
    cookie
}

#[actix_web::test]
async fn rating_bounds_enforced() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    for rating in [0, 6] {
        let req = test::TestRequest::post()
            .uri("/feedback")
            .set_json(submission(rating, "Perfectly ordinary evening"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["fields"]["rating"], "Rating must be between 1 and 5");
    }

    let req = test::TestRequest::post()
        .uri("/feedback")
        .set_json(json!({ "content": "No stars given at all" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/feedback/public").to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["pagination"]["total"], 0);
}

#[actix_web::test]
async fn content_minimum_length() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/feedback")
        .set_json(submission(3, "  123456789 "))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["fields"]["content"], "Feedback must be at least 10 characters");

    let req = test::TestRequest::post()
        .uri("/feedback")
        .set_json(submission(3, "1234567890"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn bad_contact_is_a_field_error() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let mut body = submission(5, "Great wine list and staff");
    body["contact"] = json!("not-an-email");
    let req = test::TestRequest::post().uri("/feedback").set_json(body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["fields"]["contact"],
        "Please enter a valid email or phone number"
    );
}

#[actix_web::test]
async fn pagination_over_twelve_records() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    for i in 0..12 {
        let req = test::TestRequest::post()
            .uri("/feedback")
            .set_json(submission(i % 5 + 1, &format!("Dinner review number {i}")))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/feedback/public?page=1&limit=5")
        .to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first["feedback"].as_array().unwrap().len(), 5);
    assert_eq!(
        first["pagination"],
        json!({
            "page": 1, "limit": 5, "total": 12, "totalPages": 3,
            "hasNext": true, "hasPrev": false
        })
    );
    // Newest first
    assert_eq!(first["feedback"][0]["content"], "Dinner review number 11");
    for item in first["feedback"].as_array().unwrap() {
        let keys = item.as_object().unwrap();
        assert!(!keys.contains_key("status"));
        assert!(!keys.contains_key("contact"));
        assert!(!keys.contains_key("id"));
    }

    // Default limit is 5
    let req = test::TestRequest::get().uri("/feedback/public?page=3").to_request();
    let last: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(last["feedback"].as_array().unwrap().len(), 2);
    assert_eq!(last["pagination"]["hasNext"], false);
    assert_eq!(last["pagination"]["hasPrev"], true);
    assert_eq!(last["pagination"]["totalPages"], 3);
    assert_eq!(last["feedback"][1]["content"], "Dinner review number 0");
}

#[actix_web::test]
async fn rating_filter_counts_only_matches() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    for rating in [5, 3, 5, 1, 5, 4] {
        let req = test::TestRequest::post()
            .uri("/feedback")
            .set_json(submission(rating, "Some thoughts on dinner"))
            .to_request();
        test::call_service(&app, req).await;
    }

    let req = test::TestRequest::get()
        .uri("/feedback/public?rating=5")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    let items = page["feedback"].as_array().unwrap();
    assert_eq!(page["pagination"]["total"], 3);
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|f| f["rating"] == 5));

    let req = test::TestRequest::get()
        .uri("/feedback/public?rating=all")
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["pagination"]["total"], 6);

    for bad in ["7", "zero"] {
        let req = test::TestRequest::get()
            .uri(&format!("/feedback/public?rating={bad}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn parallel_likes_all_count() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/feedback")
        .set_json(submission(5, "Best crème brûlée ever"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let feedback_id = created["feedbackId"].as_str().unwrap().to_string();

    let calls = (0..10).map(|_| {
        let req = test::TestRequest::post()
            .uri(&format!("/feedback/{feedback_id}/like"))
            .to_request();
        test::call_service(&app, req)
    });
    for resp in join_all(calls).await {
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/feedback/{feedback_id}/dislike"))
        .to_request();
    let votes: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(votes, json!({ "likes": 10, "dislikes": 1 }));
}

#[actix_web::test]
async fn admin_routes_require_session() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/feedback")
        .set_json(submission(2, "Service was painfully slow"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let feedback_id = created["feedbackId"].as_str().unwrap().to_string();

    let forged = Cookie::new(SESSION_COOKIE, "true");
    let requests = vec![
        test::TestRequest::get().uri("/admin/feedback").to_request(),
        test::TestRequest::get().uri("/admin/feedback/counts").to_request(),
        test::TestRequest::get()
            .uri("/admin/feedback")
            .cookie(forged.clone())
            .to_request(),
        test::TestRequest::patch()
            .uri("/admin/feedback/1")
            .set_json(json!({ "status": "processed", "response": "hi" }))
            .to_request(),
        test::TestRequest::patch()
            .uri("/admin/feedback/1")
            .cookie(forged)
            .set_json(json!({ "status": "processed" }))
            .to_request(),
        test::TestRequest::patch()
            .uri("/admin/feedback/1")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request(),
    ];
    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Authentication required");
    }

    let req = test::TestRequest::get()
        .uri(&format!("/feedback?id={feedback_id}"))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["status"], "unprocessed");
    assert_eq!(detail["response"], Value::Null);
}

#[actix_web::test]
async fn moderation_flow() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/feedback")
        .set_json(submission(1, "Found a hair in my soup"))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let feedback_id = created["feedbackId"].as_str().unwrap().to_string();

    let cookie = login(&app).await;
    let req = test::TestRequest::get()
        .uri("/admin/feedback")
        .cookie(cookie.clone())
        .to_request();
    let all: Value = test::call_and_read_body_json(&app, req).await;
    let id = all[0]["id"].as_i64().unwrap();
    let before = all[0].clone();

    // Bogus status is rejected and changes nothing
    let req = test::TestRequest::patch()
        .uri(&format!("/admin/feedback/{id}"))
        .cookie(cookie.clone())
        .set_json(json!({ "status": "bogus", "response": "ignored" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let req = test::TestRequest::get()
        .uri("/admin/feedback")
        .cookie(cookie.clone())
        .to_request();
    let all: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all[0], before);

    // Valid update
    let req = test::TestRequest::patch()
        .uri(&format!("/admin/feedback/{id}"))
        .cookie(cookie.clone())
        .set_json(json!({ "status": "processed", "response": "We are so sorry, dessert is on us" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["status"], "processed");
    assert_eq!(updated["response"], "We are so sorry, dessert is on us");

    // The submitter sees the reply
    let req = test::TestRequest::get()
        .uri(&format!("/feedback?id={feedback_id}"))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["status"], "processed");
    assert_eq!(detail["response"], "We are so sorry, dessert is on us");

    // Status tab filter and counts
    let req = test::TestRequest::get()
        .uri("/admin/feedback?status=unprocessed")
        .cookie(cookie.clone())
        .to_request();
    let open: Value = test::call_and_read_body_json(&app, req).await;
    assert!(open.as_array().unwrap().is_empty());

    let req = test::TestRequest::get()
        .uri("/admin/feedback/counts")
        .cookie(cookie.clone())
        .to_request();
    let counts: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        counts,
        json!({ "all": 1, "unprocessed": 0, "processing": 0, "processed": 1 })
    );

    // Unknown internal id and non-numeric id
    let req = test::TestRequest::patch()
        .uri("/admin/feedback/99999")
        .cookie(cookie.clone())
        .set_json(json!({ "status": "processing" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::patch()
        .uri(&format!("/admin/feedback/{feedback_id}"))
        .cookie(cookie)
        .set_json(json!({ "status": "processing" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_feedback_id_is_404_everywhere() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let requests = vec![
        test::TestRequest::get().uri("/feedback/no-such-id").to_request(),
        test::TestRequest::get().uri("/feedback?id=no-such-id").to_request(),
        test::TestRequest::post().uri("/feedback/no-such-id/like").to_request(),
        test::TestRequest::post().uri("/feedback/no-such-id/dislike").to_request(),
    ];
    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Feedback not found" }));
    }

    let req = test::TestRequest::get().uri("/feedback").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_logout_and_session_probe() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_json(json!({ "username": ADMIN_USER, "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.response().cookies().next().is_none());

    let req = test::TestRequest::post()
        .uri("/admin/login")
        .set_json(json!({ "username": ADMIN_USER }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/admin/session").to_request();
    let probe: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(probe["authenticated"], false);

    let cookie = login(&app).await;
    let req = test::TestRequest::get()
        .uri("/admin/session")
        .cookie(cookie)
        .to_request();
    let probe: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(probe["authenticated"], true);

    let req = test::TestRequest::delete().uri("/admin/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cleared.value(), "");
    assert_eq!(cleared.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
}

#[actix_web::test]
async fn malformed_input_gets_json_errors() {
    let state = setup().await;
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/feedback")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"rating\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid JSON body");

    for uri in ["/feedback/public?page=abc", "/feedback/public?page=0", "/feedback/public?limit=0"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }
}
