use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(value.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_learner(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/learners",
        Some(json!({
            "user": {
                "email": "dana@example.com",
                "name": "Dana Kim",
                "tenantId": "tenant-1"
            },
            "goals": {
                "primaryGoal": "Become a data engineer",
                "secondaryGoals": ["Learn SQL"],
                "targetRoles": ["Data Engineer"],
                "timeBudgetHours": 8.0,
                "preferredLearningStyle": "visual"
            },
            "preferences": {
                "notificationFrequency": "daily",
                "preferredContentTypes": ["video", "reading"],
                "difficultyPreference": "intermediate",
                "language": "en"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["learner"]["id"].as_str().unwrap().to_string()
}

async fn create_skill(app: &Router, slug: &str, prerequisites: Vec<&str>) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/skills",
        Some(json!({
            "slug": slug,
            "label": slug.to_uppercase(),
            "description": format!("All about {slug}"),
            "domain": "data",
            "levelRange": { "min": 1, "max": 5 },
            "prerequisites": prerequisites,
            "estimatedHours": 10.0,
            "difficulty": "beginner"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_root_banner() {
    let app = common::create_test_app().await;
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Learning Path Generator API");
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = common::create_test_app().await;
    for uri in ["/health", "/health/ready", "/health/live", "/health/info"] {
        let (status, _) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_route_returns_error_envelope() {
    let app = common::create_test_app().await;
    let (status, body) = send(&app, Method::GET, "/nonexistent/path", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_learner_plan_progress_flow() {
    let app = common::create_test_app().await;
    let learner_id = create_learner(&app).await;
    let skill_a = create_skill(&app, "sql-basics", vec![]).await;
    let skill_b = create_skill(&app, "sql-window-functions", vec![skill_a.as_str()]).await;

    // Catalog order puts the prerequisite first.
    let (status, body) = send(&app, Method::GET, "/api/v1/skills/order", None).await;
    assert_eq!(status, StatusCode::OK);
    let order: Vec<String> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    let pos_a = order.iter().position(|id| id == &skill_a).unwrap();
    let pos_b = order.iter().position(|id| id == &skill_b).unwrap();
    assert!(pos_a < pos_b);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/plans",
        Some(json!({
            "learnerId": learner_id,
            "title": "SQL ramp-up",
            "objective": "Ship analytics queries unaided",
            "status": "active",
            "totalHours": 4.0,
            "startDate": "2026-01-05T00:00:00Z",
            "targetDate": "2026-03-01T00:00:00Z",
            "steps": [
                {
                    "skillId": skill_a,
                    "title": "Learn SELECT fundamentals",
                    "effortMin": 120,
                    "sequence": 1
                },
                {
                    "skillId": skill_b,
                    "title": "Window functions deep dive",
                    "effortMin": 120,
                    "sequence": 2,
                    "prerequisites": [1]
                }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let plan_id = body["data"]["plan"]["id"].as_str().unwrap().to_string();
    let steps = body["data"]["steps"].as_array().unwrap();
    let step1 = steps[0]["id"].as_str().unwrap().to_string();
    let step2 = steps[1]["id"].as_str().unwrap().to_string();
    assert_eq!(steps[0]["unlocks"][0], json!(step2.clone()));

    // Step 2 is locked while step 1 is unfinished.
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/plans/{plan_id}/steps/{step2}/status"),
        Some(json!({ "status": "in_progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/plans/{plan_id}/summary"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextStep"]["stepId"], json!(step1.clone()));

    // Work through step 1.
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/plans/{plan_id}/steps/{step1}/status"),
        Some(json!({ "status": "in_progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/plans/{plan_id}/steps/{step1}/progress"),
        Some(json!({ "completedContentMinutes": 120 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["step"]["progressPercentage"], json!(100));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/plans/{plan_id}/steps/{step1}/status"),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    // 120 minutes of a 4-hour plan.
    assert_eq!(body["data"]["plan"]["completedHours"], json!(2.0));

    // Completing step 1 unlocks step 2.
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/plans/{plan_id}/summary"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextStep"]["stepId"], json!(step2.clone()));
    assert_eq!(body["data"]["stepsCompleted"], json!(1));
    assert_eq!(body["data"]["percentComplete"], json!(50.0));

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/plans/{plan_id}/steps/{step2}/status"),
        Some(json!({ "status": "in_progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Analytics sees the completed work.
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/analytics/progress?learnerId={learner_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["learnerProgress"]["completedSkills"], json!(1));
    assert_eq!(body["data"]["learnerProgress"]["totalSkills"], json!(2));
    assert_eq!(body["data"]["learnerProgress"]["completedHours"], json!(2.0));
}

#[tokio::test]
async fn test_cyclic_step_graph_is_rejected() {
    let app = common::create_test_app().await;
    let learner_id = create_learner(&app).await;
    let skill = create_skill(&app, "rust-basics", vec![]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/plans",
        Some(json!({
            "learnerId": learner_id,
            "title": "Impossible plan",
            "objective": "Steps require each other",
            "totalHours": 4.0,
            "startDate": "2026-01-05T00:00:00Z",
            "targetDate": "2026-03-01T00:00:00Z",
            "steps": [
                {
                    "skillId": skill,
                    "title": "First",
                    "effortMin": 60,
                    "sequence": 1,
                    "prerequisites": [2]
                },
                {
                    "skillId": skill,
                    "title": "Second",
                    "effortMin": 60,
                    "sequence": 2,
                    "prerequisites": [1]
                }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["code"], "CYCLE_DETECTED");
}

#[tokio::test]
async fn test_assessment_scoring_and_attempt_limit() {
    let app = common::create_test_app().await;
    let learner_id = create_learner(&app).await;
    let skill = create_skill(&app, "python-basics", vec![]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/assessments",
        Some(json!({
            "learnerId": learner_id,
            "skillId": skill,
            "type": "formative",
            "title": "Python check-in",
            "spec": {
                "questions": [
                    {
                        "id": "q1",
                        "type": "multiple_choice",
                        "question": "What is Python?",
                        "options": ["Programming language", "Snake", "Game"],
                        "correctAnswer": "Programming language",
                        "points": 10
                    },
                    {
                        "id": "q2",
                        "type": "true_false",
                        "question": "Python is dynamically typed.",
                        "correctAnswer": "true",
                        "points": 5
                    }
                ],
                "passingScore": 70.0,
                "maxAttempts": 3
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let assessment_id = body["data"]["id"].as_str().unwrap().to_string();

    // 10 of 15 points misses the 70-point bar.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/{assessment_id}/attempts"),
        Some(json!({
            "answers": [
                { "questionId": "q1", "answer": "Programming language" }
            ],
            "timeTakenMin": 12
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["passed"], json!(false));
    let score = body["data"]["attempt"]["score"].as_f64().unwrap();
    assert!((score - 200.0 / 3.0).abs() < 1e-6);

    // Burn the remaining attempts with perfect submissions.
    for _ in 0..2 {
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/assessments/{assessment_id}/attempts"),
            Some(json!({
                "answers": [
                    { "questionId": "q1", "answer": "Programming language" },
                    { "questionId": "q2", "answer": "true" }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["passed"], json!(true));
        assert_eq!(body["data"]["attempt"]["score"], json!(100.0));
    }

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/assessments/{assessment_id}/attempts"),
        Some(json!({ "answers": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["code"], "ATTEMPT_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn test_stale_update_is_a_conflict() {
    let app = common::create_test_app().await;
    let learner_id = create_learner(&app).await;
    let skill = create_skill(&app, "go-basics", vec![]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/plans",
        Some(json!({
            "learnerId": learner_id,
            "title": "Go ramp-up",
            "objective": "Learn Go",
            "totalHours": 2.0,
            "startDate": "2026-01-05T00:00:00Z",
            "targetDate": "2026-02-01T00:00:00Z",
            "steps": [
                { "skillId": skill, "title": "Tour of Go", "effortMin": 120, "sequence": 1 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let plan_id = body["data"]["plan"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/plans/{plan_id}"),
        Some(json!({ "title": "Go ramp-up, revised" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The creation-time updatedAt is now stale.
    let stale = body["data"]["plan"]["updatedAt"].clone();
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/plans/{plan_id}"),
        Some(json!({ "title": "Lost update", "expectedUpdatedAt": stale })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_coach_message_log_with_citations() {
    let app = common::create_test_app().await;
    let learner_id = create_learner(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coach/messages",
        Some(json!({
            "learnerId": learner_id,
            "content": "How should I prepare for the SQL assessment?",
            "sender": "user"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/coach/messages",
        Some(json!({
            "learnerId": learner_id,
            "content": "Review window functions first; the docs cover the exact syntax.",
            "sender": "assistant",
            "type": "suggestion",
            "citations": [
                {
                    "documentId": "doc-postgres-window",
                    "quote": "A window function performs a calculation across a set of table rows.",
                    "spanStart": 0,
                    "spanEnd": 71,
                    "url": "https://www.postgresql.org/docs/current/tutorial-window.html",
                    "confidence": 0.93
                }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let message_id = body["data"]["message"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/coach/messages?learnerId={learner_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["data"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[1]["sender"], "assistant");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/coach/messages/{message_id}/citations"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["documentId"], "doc-postgres-window");
}

#[tokio::test]
async fn test_calendar_event_validation() {
    let app = common::create_test_app().await;
    let learner_id = create_learner(&app).await;

    // end before start
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/calendar/events",
        Some(json!({
            "learnerId": learner_id,
            "title": "Backwards block",
            "startAt": "2026-02-01T10:00:00Z",
            "endAt": "2026-02-01T09:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/calendar/events",
        Some(json!({
            "learnerId": learner_id,
            "title": "Morning study block",
            "startAt": "2026-02-01T09:00:00Z",
            "endAt": "2026-02-01T10:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/calendar/events?learnerId={learner_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
