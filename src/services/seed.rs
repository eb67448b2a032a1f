//! Demo accounts for local development: one student and three tutors, all with
//! the password `password`.

use sqlx::SqlitePool;
use tracing::info;

use crate::db::{tutors, users};
use crate::error::AppError;
use crate::models::Role;
use crate::services::auth::hash_password;

pub const DEMO_PASSWORD: &str = "password";
pub const DEMO_STUDENT_EMAIL: &str = "student@demo.com";

struct DemoTutor {
    email: &'static str,
    name: &'static str,
    university: &'static str,
    major: &'static str,
    tags: &'static [&'static str],
    price: i64,
    education: &'static [&'static str],
    bio: &'static str,
    image_url: &'static str,
    locations: &'static str,
    pricing_details: &'static str,
}

const DEMO_TUTORS: &[DemoTutor] = &[
    DemoTutor {
        email: "seojin@studydol.com",
        name: "고서진",
        university: "연세대학교",
        major: "융합인문사회과학부",
        tags: &["회화", "비즈니스 영어", "화상 영어", "발음 교정"],
        price: 50_000,
        education: &["International School at Kuala Lumpur", "IB 42"],
        bio: "회화, 비즈니스 영어, 화상 영어, 발음 교정 전문입니다.\n대면/비면 수업 모두 가능합니다.",
        image_url: "/images/tutors/seojin.jpeg",
        locations: "비대면 온라인",
        pricing_details: "대면: 시간당 5만원\n비대면: 시간당 4만원",
    },
    DemoTutor {
        email: "yeaun@studydol.com",
        name: "김예은",
        university: "University of Sydney",
        major: "Pharmacy",
        tags: &["IB Biology", "IB Chemistry", "TOEIC", "국제학교 수학"],
        price: 40_000,
        education: &[
            "University of Sydney Bachelor of Pharmacy (Honors)",
            "Master of Pharmacy Practice",
            "International School Bangkok",
        ],
        bio: "IB, 국제학교 커리큘럼에 최적화 된 맞춤형 수학, 과학, 영어 수업.",
        image_url: "/images/tutors/yeaun.png",
        locations: "비대면 온라인",
        pricing_details: "- ib: 4만원\n- 토익: 3만원\n- 고등수학: 4만원\n- 중등수학: 3만원",
    },
    DemoTutor {
        email: "hyeonju@studydol.com",
        name: "이현주",
        university: "이화여자대학교",
        major: "의류산업학과",
        tags: &["TOEFL", "영어 회화", "발음 교정"],
        price: 45_000,
        education: &["St.Paul Int School in Hanoi", "이화여자대학교 의류산업학과"],
        bio: "편안하지만 똑부러지는 수업으로 재미있는 영어 회화를 이끌어냅니다.\n\nTOEFL 105 / TOEIC 890 보유.",
        image_url: "/images/tutors/hyeonju.jpeg",
        locations: "서울 합정 / 서울 홍대 / 서울 강남",
        pricing_details: "대면 과외 45,000원 이상\n비대면 과외 40,000원",
    },
];

/// Creates whichever demo accounts are missing. Existing accounts are left untouched.
pub async fn seed_demo(db: &SqlitePool) -> Result<usize, AppError> {
    let password_hash = hash_password(DEMO_PASSWORD)?;
    let mut created = 0;

    if users::find_by_email(db, DEMO_STUDENT_EMAIL).await?.is_none() {
        users::insert_user(db, DEMO_STUDENT_EMAIL, &password_hash, "박준원 학생", Role::Student).await?;
        created += 1;
    }

    for tutor in DEMO_TUTORS {
        if users::find_by_email(db, tutor.email).await?.is_some() {
            continue;
        }

        let education = serde_json::to_string(tutor.education)
            .map_err(|_| AppError::InternalServerError)?;

        let mut tx = db.begin().await?;
        let user = users::insert_user(&mut *tx, tutor.email, &password_hash, tutor.name, Role::Tutor).await?;
        let profile = tutors::NewProfile {
            bio: tutor.bio.to_string(),
            university: tutor.university.to_string(),
            major: tutor.major.to_string(),
            price: tutor.price,
            image_url: Some(tutor.image_url.to_string()),
            education: Some(education),
            locations: Some(tutor.locations.to_string()),
            pricing_details: Some(tutor.pricing_details.to_string()),
        };
        let profile_id = tutors::insert_profile(&mut *tx, &user.id, &profile).await?;
        for tag in tutor.tags {
            tutors::attach_tag(&mut *tx, &profile_id, tag).await?;
        }
        tx.commit().await?;

        created += 1;
    }

    info!("seeded {} demo accounts", created);
    Ok(created)
}
