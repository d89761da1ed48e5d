pub mod admissions;
pub mod announcements;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod exams;
pub mod fees;
pub mod health;
pub mod homework;
pub mod invites;
pub mod library;
pub mod messages;
pub mod otp;
pub mod parents;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod transport;
pub mod users;

pub use self::auth::model::LoginRequest;
pub use self::users::model::User;
