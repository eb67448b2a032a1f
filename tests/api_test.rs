mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn health_answers() {
    let app = TestApp::new().await;
    let res = app.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn web_login_sets_session_cookies() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/web/auth/register",
            None,
            json!({ "email": "kim@test.com", "password": "pw", "name": "Kim", "role": "tutor" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["redirect"], "/tutor-register");
    assert!(res.body["user"].get("passwordHash").is_none());

    let res = app
        .post(
            "/web/auth/login",
            None,
            json!({ "email": "kim@test.com", "password": "pw" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["redirect"], "/");
    let cookie = common::cookie_from(&res.headers);
    assert!(cookie.contains("session_user_id="));
    assert!(cookie.contains("session_user_role=tutor"));

    let res = app.get("/web/me", Some(cookie.as_str())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["email"], "kim@test.com");
    assert_eq!(res.body["role"], "tutor");

    let res = app.get("/web/me/profile", Some(cookie.as_str())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["price"], 50_000);
}

#[tokio::test]
async fn web_rejects_bad_credentials_and_missing_session() {
    let app = TestApp::new().await;
    common::student(&app.db, "lee").await;

    let res = app
        .post(
            "/web/auth/login",
            None,
            json!({ "email": "lee@student.test", "password": "nope" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Invalid credentials");

    for uri in ["/web/me", "/web/requests", "/web/chats", "/web/me/likes"] {
        let res = app.get(uri, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn web_logout_clears_cookies() {
    let app = TestApp::new().await;
    let student = common::student(&app.db, "lee").await;

    let res = app
        .post("/web/auth/logout", Some(common::cookie_for(&student).as_str()), json!({}))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["redirect"], "/login");

    let cleared: Vec<_> = res
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert_eq!(cleared.len(), 2);
    assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn web_booking_flow() {
    let app = TestApp::new().await;
    let student = common::student(&app.db, "민수").await;
    let tutor = common::tutor(&app.db, "서진").await;
    let student_cookie = common::cookie_for(&student);
    let tutor_cookie = common::cookie_for(&tutor);

    let res = app
        .post(
            &format!("/web/tutors/{}/requests", tutor.id),
            Some(student_cookie.as_str()),
            json!({ "subject": "TOEFL", "message": "주 2회 원해요" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "PENDING");
    let request_id = res.body["id"].as_str().unwrap().to_string();

    let res = app.get("/web/requests/pending", Some(tutor_cookie.as_str())).await;
    assert_eq!(res.body[0]["otherName"], "민수");
    assert_eq!(res.body[0]["type"], "request");

    let res = app
        .post(
            &format!("/web/requests/{}/accept", request_id),
            Some(student_cookie.as_str()),
            json!({}),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .post(
            &format!("/web/requests/{}/accept", request_id),
            Some(tutor_cookie.as_str()),
            json!({}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    let room_id = res.body["chatRoomId"].as_str().unwrap().to_string();

    let res = app
        .post(
            &format!("/web/requests/{}/reject", request_id),
            Some(tutor_cookie.as_str()),
            json!({}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.get("/web/requests", Some(student_cookie.as_str())).await;
    assert_eq!(res.body[0]["status"], "ACCEPTED");
    assert_eq!(res.body[0]["chatRoomId"], room_id.as_str());

    let res = app
        .post(
            &format!("/web/chats/{}/messages", room_id),
            Some(student_cookie.as_str()),
            json!({ "content": "네 좋아요" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let sent_at = res.body["createdAt"].as_str().unwrap().to_string();

    let res = app
        .get(&format!("/web/chats/{}", room_id), Some(tutor_cookie.as_str()))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["otherUserName"], "민수");
    assert_eq!(res.body["requestId"], request_id.as_str());
    assert_eq!(res.body["messages"].as_array().unwrap().len(), 2);

    let res = app
        .get(
            &format!("/web/chats/{}/messages?since={}", room_id, sent_at),
            Some(tutor_cookie.as_str()),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.as_array().unwrap().is_empty());

    let res = app.get("/web/chats", Some(tutor_cookie.as_str())).await;
    assert_eq!(res.body[0]["lastMessage"], "네 좋아요");
    assert_eq!(res.body[0]["type"], "chat");

    let res = app.get("/web/me/settlement", Some(tutor_cookie.as_str())).await;
    assert_eq!(res.body["totalAmount"], 50_000);

    let res = app.get("/web/me/dashboard", Some(tutor_cookie.as_str())).await;
    assert_eq!(res.body["todayClassCount"], 1);
    assert_eq!(res.body["newRequestsCount"], 0);
}

#[tokio::test]
async fn web_reviews_and_likes() {
    let app = TestApp::new().await;
    let student = common::student(&app.db, "민수").await;
    let tutor = common::tutor(&app.db, "서진").await;
    let cookie = common::cookie_for(&student);

    let res = app
        .post(
            &format!("/web/tutors/{}/reviews", tutor.id),
            Some(cookie.as_str()),
            json!({ "rating": 4, "content": "친절해요" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["rating"], 4.0);
    assert_eq!(res.body["reviewCount"], 1);

    let res = app
        .post(
            &format!("/web/tutors/{}/reviews", tutor.id),
            Some(cookie.as_str()),
            json!({ "rating": 9 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(&format!("/web/tutors/{}/like", tutor.id), Some(cookie.as_str()), json!({}))
        .await;
    assert_eq!(res.body["isLiked"], true);

    let res = app
        .get(&format!("/web/tutors/{}", tutor.id), Some(cookie.as_str()))
        .await;
    assert_eq!(res.body["isLiked"], true);
    assert_eq!(res.body["reviews"][0]["authorName"], "민수");

    let res = app.get(&format!("/web/tutors/{}", tutor.id), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["isLiked"], false);

    let res = app.get("/web/tutors/missing", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn web_profile_upload() {
    let app = TestApp::new().await;
    let tutor = common::tutor(&app.db, "서진").await;

    let boundary = "studydol-boundary";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"bio\"\r\n\r\n\
         IB 전문\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"price\"\r\n\r\n\
         45000\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"image\"; filename=\"me.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         PNGDATA\r\n\
         --{b}--\r\n",
        b = boundary
    );

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/web/me/profile")
        .header(header::COOKIE, common::cookie_for(&tutor))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let res = app.send(request).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["bio"], "IB 전문");
    assert_eq!(res.body["price"], 45_000);
    assert!(res.body["imageUrl"].as_str().unwrap().ends_with("-me.png"));

    let files = app.images.files.lock().unwrap();
    assert_eq!(files.values().next().unwrap().as_slice(), b"PNGDATA");
}

#[tokio::test]
async fn web_tutor_search_and_tags() {
    let app = TestApp::new().await;
    studydol::services::seed::seed_demo(&app.db)
        .await
        .expect("seed failed");

    let res = app.get("/web/tutors?sort=newest", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 3);
    assert_eq!(res.body[0]["name"], "이현주");

    let res = app.get("/web/tutors?tags=TOEIC", None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["name"], "김예은");

    let res = app.get("/web/tutors?maxPrice=42000", None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["price"], 40_000);

    let res = app.get("/api/tutors?minPrice=42000&maxPrice=48000", None).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["name"], "이현주");

    let res = app.get("/web/tags/popular", None).await;
    assert_eq!(res.body[0], "발음 교정");
}

#[tokio::test]
async fn mobile_flow() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "m@test.com", "password": "pw", "name": "민수" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["role"], "student");
    let student_id = res.body["id"].as_str().unwrap().to_string();

    let res = app
        .post(
            "/api/onboarding",
            None,
            json!({ "userId": student_id, "answers": { "1": "고등학생" } }),
        )
        .await;
    assert_eq!(res.body, json!({ "success": true, "isOnboarded": true }));

    let tutor = common::tutor(&app.db, "서진").await;

    let res = app
        .post("/api/requests", None, json!({ "studentId": student_id }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/requests",
            None,
            json!({ "studentId": student_id, "tutorId": tutor.id, "subjects": "수학" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["subject"], "수학");

    let res = app.get(&format!("/api/my?userId={}", student_id), None).await;
    assert_eq!(res.body["requests"][0]["tutorName"], "서진");
    assert_eq!(res.body["requests"][0]["status"], "PENDING");
    assert_eq!(res.body["schedules"], json!([]));

    let res = app.get(&format!("/api/chat?userId={}", student_id), None).await;
    assert_eq!(res.body[0]["otherUserName"], "서진");
    assert_eq!(res.body[0]["lastMessage"], "대화가 없습니다.");
    let room_id = res.body[0]["id"].as_str().unwrap().to_string();

    let res = app
        .post(
            &format!("/api/chat/{}", room_id),
            None,
            json!({ "senderId": student_id, "content": "안녕하세요" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.get(&format!("/api/chat/{}", room_id), None).await;
    assert_eq!(res.body[0]["content"], "안녕하세요");

    let res = app.get("/api/chat", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .get(&format!("/api/tutors/{}?userId={}", tutor.id, student_id), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["isLiked"], false);

    let res = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "m@test.com", "password": "pw" }),
        )
        .await;
    assert_eq!(res.body["isOnboarded"], true);
    assert!(res.headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn web_writes_reject_a_session_for_an_unknown_user() {
    let app = TestApp::new().await;
    let tutor = common::tutor(&app.db, "서진").await;
    let cookie = "session_user_id=ghost; session_user_role=student";

    let res = app
        .post(
            &format!("/web/tutors/{}/requests", tutor.id),
            Some(cookie),
            json!({ "subject": "영어" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .post(&format!("/web/tutors/{}/like", tutor.id), Some(cookie), json!({}))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .post(
            &format!("/web/tutors/{}/reviews", tutor.id),
            Some(cookie),
            json!({ "rating": 5, "content": "좋아요" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let detail = app.get(&format!("/web/tutors/{}", tutor.id), None).await;
    assert_eq!(detail.body["reviewCount"], 0);
}
