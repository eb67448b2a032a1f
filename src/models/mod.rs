pub mod chat;
pub mod dashboard;
pub mod request;
pub mod review;
pub mod tutor;
pub mod user;

pub use chat::{
    ChatDetails, ChatListRow, ChatRoom, ChatSummary, Message, MessagesSinceQuery, SendMessageRequest,
};
pub use dashboard::{DashboardStats, Settlement, SettlementEntry};
pub use request::{
    LessonRequest, LessonRequestView, NewLessonRequest, PendingRequestView, RequestStatus,
    ScheduleEntry,
};
pub use review::{NewReviewRequest, RatingSummary, Review, ReviewView};
pub use tutor::{
    LikeToggled, PRICE_CEILING, ProfileUpdate, SortOrder, TutorCard, TutorDetail, TutorProfile,
    TutorRow, TutorSearch,
};
pub use user::{LoginRequest, OnboardingRequest, PublicUser, RegisterRequest, Role, User};
