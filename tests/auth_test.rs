mod common;

use std::collections::BTreeMap;

use studydol::db::{tutors, users};
use studydol::error::AppError;
use studydol::models::{LoginRequest, RegisterRequest, Role};
use studydol::services::auth;

#[tokio::test]
async fn tutor_registration_creates_placeholder_profile() {
    let db = common::pool().await;

    let tutor = common::tutor(&db, "kim").await;
    assert_eq!(tutor.role, Role::Tutor);
    assert!(!tutor.is_onboarded);
    assert_ne!(tutor.password_hash, "password");

    let profile = tutors::find_profile_by_user(&db, &tutor.id)
        .await
        .expect("query failed")
        .expect("tutor should have a profile");
    assert_eq!(profile.bio, auth::DEFAULT_TUTOR_BIO);
    assert_eq!(profile.university, auth::UNSET_FIELD);
    assert_eq!(profile.major, auth::UNSET_FIELD);
    assert_eq!(profile.price, auth::DEFAULT_TUTOR_PRICE);
    assert_eq!(profile.rating, 0.0);
    assert_eq!(profile.review_count, 0);
}

#[tokio::test]
async fn student_registration_has_no_profile() {
    let db = common::pool().await;

    let student = common::student(&db, "lee").await;
    assert_eq!(student.role, Role::Student);
    assert!(
        tutors::find_profile_by_user(&db, &student.id)
            .await
            .expect("query failed")
            .is_none()
    );
}

#[tokio::test]
async fn role_defaults_to_student() {
    let db = common::pool().await;

    let user = auth::register(
        &db,
        RegisterRequest {
            email: "plain@test.com".into(),
            password: "pw".into(),
            name: "Plain".into(),
            role: None,
        },
    )
    .await
    .expect("registration failed");

    assert_eq!(user.role, Role::Student);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let db = common::pool().await;
    common::register(&db, "same@test.com", "First", "student").await;

    let err = auth::register(
        &db,
        RegisterRequest {
            email: "same@test.com".into(),
            password: "other".into(),
            name: "Second".into(),
            role: Some("tutor".into()),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn missing_fields_and_unknown_roles_are_rejected() {
    let db = common::pool().await;

    let err = auth::register(
        &db,
        RegisterRequest {
            email: "a@test.com".into(),
            password: String::new(),
            name: "A".into(),
            role: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = auth::register(
        &db,
        RegisterRequest {
            email: "a@test.com".into(),
            password: "pw".into(),
            name: "A".into(),
            role: Some("admin".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn login_checks_the_password() {
    let db = common::pool().await;
    let student = common::student(&db, "park").await;

    let user = auth::login(
        &db,
        LoginRequest {
            email: student.email.clone(),
            password: "password".into(),
        },
    )
    .await
    .expect("login failed");
    assert_eq!(user.id, student.id);

    let err = auth::login(
        &db,
        LoginRequest {
            email: student.email.clone(),
            password: "wrong".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = auth::login(
        &db,
        LoginRequest {
            email: "nobody@test.com".into(),
            password: "password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn onboarding_stores_answers() {
    let db = common::pool().await;
    let student = common::student(&db, "choi").await;
    assert_eq!(auth::login_redirect(&student), "/onboarding");

    let answers = BTreeMap::from([(1, "중학생".to_string()), (2, "영어".to_string())]);
    let public = auth::complete_onboarding(&db, &student.id, &answers)
        .await
        .expect("onboarding failed");
    assert!(public.is_onboarded);

    let stored = users::find_by_id(&db, &student.id)
        .await
        .expect("query failed")
        .expect("user should exist");
    assert!(stored.is_onboarded);
    assert_eq!(stored.onboarding_data.as_deref(), Some(r#"{"1":"중학생","2":"영어"}"#));
    assert_eq!(auth::login_redirect(&stored), "/");
}

#[tokio::test]
async fn onboarding_unknown_user_is_not_found() {
    let db = common::pool().await;

    let err = auth::complete_onboarding(&db, "missing", &BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}
