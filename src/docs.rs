use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use campusly_core::{PaginationMeta, PaginationParams};

use crate::modules::admissions::model::{
    AcceptAdmissionDto, AcceptedAdmission, Admission, AdmissionStatus, CreateAdmissionDto,
    RecordAssessmentDto, RejectAdmissionDto, ScheduleAssessmentDto,
};
use crate::modules::announcements::model::{
    Announcement, Audience, CreateAnnouncementDto, UpdateAnnouncementDto,
};
use crate::modules::attendance::model::{
    AttendanceRecord, AttendanceSession, AttendanceSummary, CreateSessionDto,
    RecordAttendanceDto, SessionStatus, SessionWithRecords,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    ForgotPasswordRequest, InviteRegisterRequest, LoginRequest, LoginResponse, MessageResponse,
    RefreshTokenRequest, RegisterRequest, RegisterResponse, ResendOtpRequest,
    ResetPasswordRequest, TokenResponse, VerifyOtpRequest,
};
use crate::modules::classes::model::{
    Class, ClassDetail, CreateClassDto, CreateSectionDto, Section, SectionWithCount,
    UpdateClassDto, UpdateSectionDto,
};
use crate::modules::dashboard::model::DashboardStats;
use crate::modules::exams::model::{
    CreateExamDto, EnterMarksDto, Exam, ExamMark, ExamStatus, MarkEntry, StudentResult,
    UpdateExamDto,
};
use crate::modules::fees::model::{
    CreateInvoiceDto, InvoiceStatus, InvoiceView, Payment, PaymentReceipt, RecordPaymentDto,
};
use crate::modules::health::controller::HealthResponse;
use crate::modules::homework::model::{
    CreateHomeworkDto, GradeSubmissionDto, Homework, Submission, SubmissionStatus,
    SubmitHomeworkDto, UpdateHomeworkDto,
};
use crate::modules::invites::model::{CreateInviteDto, CreatedInvite, Invite, InvitePreview};
use crate::modules::library::model::{Book, CreateBookDto, CreateLoanDto, Loan, UpdateBookDto};
use crate::modules::messages::model::{Message, SendMessageDto, UnreadCount};
use crate::modules::parents::model::{
    CreateParentDto, LinkChildDto, LinkedChild, Parent, ParentWithChildren, UpdateParentDto,
};
use crate::modules::students::model::{CreateStudentDto, Student, UpdateStudentDto};
use crate::modules::subjects::model::{CreateSubjectDto, Subject, UpdateSubjectDto};
use crate::modules::teachers::model::{CreateTeacherDto, Teacher, UpdateTeacherDto};
use crate::modules::transport::model::{
    AssignStudentDto, CreateRouteDto, RouteAssignment, RouteStudent, RouteWithCount,
    TransportRoute, UpdateRouteDto,
};
use crate::modules::users::model::{
    ChangePasswordDto, CreateUserDto, UpdateProfileDto, UpdateUserDto, UpdateUserStatusDto,
    User, UserRole,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::health_check,
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::register_with_invite,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::verify_otp,
        crate::modules::auth::controller::resend_otp,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::auth::controller::me,
        crate::modules::invites::controller::create_invite,
        crate::modules::invites::controller::get_invites,
        crate::modules::invites::controller::get_invite,
        crate::modules::invites::controller::revoke_invite,
        crate::modules::invites::controller::validate_invite,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::update_user_status,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::change_password,
        crate::modules::students::controller::create_student,
        crate::modules::students::controller::get_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student,
        crate::modules::students::controller::delete_student,
        crate::modules::teachers::controller::create_teacher,
        crate::modules::teachers::controller::get_teachers,
        crate::modules::teachers::controller::get_teacher,
        crate::modules::teachers::controller::update_teacher,
        crate::modules::teachers::controller::delete_teacher,
        crate::modules::parents::controller::create_parent,
        crate::modules::parents::controller::get_parents,
        crate::modules::parents::controller::get_parent,
        crate::modules::parents::controller::update_parent,
        crate::modules::parents::controller::delete_parent,
        crate::modules::parents::controller::link_child,
        crate::modules::parents::controller::unlink_child,
        crate::modules::parents::controller::get_my_children,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::create_section,
        crate::modules::classes::controller::get_sections,
        crate::modules::classes::controller::update_section,
        crate::modules::classes::controller::delete_section,
        crate::modules::subjects::controller::create_subject,
        crate::modules::subjects::controller::get_subjects,
        crate::modules::subjects::controller::get_subject,
        crate::modules::subjects::controller::update_subject,
        crate::modules::subjects::controller::delete_subject,
        crate::modules::exams::controller::create_exam,
        crate::modules::exams::controller::get_exams,
        crate::modules::exams::controller::get_exam,
        crate::modules::exams::controller::update_exam,
        crate::modules::exams::controller::delete_exam,
        crate::modules::exams::controller::enter_marks,
        crate::modules::exams::controller::get_marks,
        crate::modules::exams::controller::publish_exam,
        crate::modules::exams::controller::get_student_results,
        crate::modules::attendance::controller::create_session,
        crate::modules::attendance::controller::get_sessions,
        crate::modules::attendance::controller::get_session,
        crate::modules::attendance::controller::record_attendance,
        crate::modules::attendance::controller::close_session,
        crate::modules::attendance::controller::reopen_session,
        crate::modules::attendance::controller::get_student_summary,
        crate::modules::fees::controller::create_invoice,
        crate::modules::fees::controller::get_invoices,
        crate::modules::fees::controller::get_invoice,
        crate::modules::fees::controller::record_payment,
        crate::modules::fees::controller::get_payments,
        crate::modules::fees::controller::cancel_invoice,
        crate::modules::fees::controller::get_student_invoices,
        crate::modules::homework::controller::create_homework,
        crate::modules::homework::controller::get_homework_list,
        crate::modules::homework::controller::get_homework,
        crate::modules::homework::controller::update_homework,
        crate::modules::homework::controller::delete_homework,
        crate::modules::homework::controller::submit_homework,
        crate::modules::homework::controller::get_submissions,
        crate::modules::homework::controller::grade_submission,
        crate::modules::library::controller::create_book,
        crate::modules::library::controller::get_books,
        crate::modules::library::controller::get_book,
        crate::modules::library::controller::update_book,
        crate::modules::library::controller::delete_book,
        crate::modules::library::controller::issue_loan,
        crate::modules::library::controller::return_loan,
        crate::modules::library::controller::get_loans,
        crate::modules::library::controller::get_my_loans,
        crate::modules::transport::controller::create_route,
        crate::modules::transport::controller::get_routes,
        crate::modules::transport::controller::get_route,
        crate::modules::transport::controller::update_route,
        crate::modules::transport::controller::delete_route,
        crate::modules::transport::controller::assign_student,
        crate::modules::transport::controller::unassign_student,
        crate::modules::transport::controller::get_route_students,
        crate::modules::messages::controller::send_message,
        crate::modules::messages::controller::get_inbox,
        crate::modules::messages::controller::get_sent,
        crate::modules::messages::controller::get_unread_count,
        crate::modules::messages::controller::get_message,
        crate::modules::messages::controller::mark_read,
        crate::modules::messages::controller::delete_message,
        crate::modules::announcements::controller::create_announcement,
        crate::modules::announcements::controller::get_announcements,
        crate::modules::announcements::controller::get_announcement,
        crate::modules::announcements::controller::update_announcement,
        crate::modules::announcements::controller::delete_announcement,
        crate::modules::admissions::controller::create_application,
        crate::modules::admissions::controller::get_applications,
        crate::modules::admissions::controller::get_application,
        crate::modules::admissions::controller::schedule_assessment,
        crate::modules::admissions::controller::record_assessment,
        crate::modules::admissions::controller::accept_application,
        crate::modules::admissions::controller::reject_application,
        crate::modules::dashboard::controller::get_stats,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            PaginationMeta,
            PaginationParams,
            User,
            UserRole,
            CreateUserDto,
            UpdateUserDto,
            UpdateUserStatusDto,
            UpdateProfileDto,
            ChangePasswordDto,
            RegisterRequest,
            RegisterResponse,
            InviteRegisterRequest,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            TokenResponse,
            VerifyOtpRequest,
            ResendOtpRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            MessageResponse,
            Invite,
            CreateInviteDto,
            CreatedInvite,
            InvitePreview,
            Student,
            CreateStudentDto,
            UpdateStudentDto,
            Teacher,
            CreateTeacherDto,
            UpdateTeacherDto,
            Parent,
            CreateParentDto,
            UpdateParentDto,
            LinkChildDto,
            LinkedChild,
            ParentWithChildren,
            Class,
            ClassDetail,
            CreateClassDto,
            UpdateClassDto,
            Section,
            SectionWithCount,
            CreateSectionDto,
            UpdateSectionDto,
            Subject,
            CreateSubjectDto,
            UpdateSubjectDto,
            Exam,
            ExamStatus,
            CreateExamDto,
            UpdateExamDto,
            EnterMarksDto,
            MarkEntry,
            ExamMark,
            StudentResult,
            AttendanceSession,
            AttendanceRecord,
            SessionStatus,
            SessionWithRecords,
            CreateSessionDto,
            RecordAttendanceDto,
            AttendanceSummary,
            InvoiceView,
            InvoiceStatus,
            CreateInvoiceDto,
            RecordPaymentDto,
            Payment,
            PaymentReceipt,
            Homework,
            CreateHomeworkDto,
            UpdateHomeworkDto,
            Submission,
            SubmissionStatus,
            SubmitHomeworkDto,
            GradeSubmissionDto,
            Book,
            CreateBookDto,
            UpdateBookDto,
            Loan,
            CreateLoanDto,
            TransportRoute,
            RouteWithCount,
            CreateRouteDto,
            UpdateRouteDto,
            AssignStudentDto,
            RouteAssignment,
            RouteStudent,
            Message,
            SendMessageDto,
            UnreadCount,
            Announcement,
            Audience,
            CreateAnnouncementDto,
            UpdateAnnouncementDto,
            Admission,
            AdmissionStatus,
            CreateAdmissionDto,
            ScheduleAssessmentDto,
            RecordAssessmentDto,
            AcceptAdmissionDto,
            RejectAdmissionDto,
            AcceptedAdmission,
            DashboardStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probe"),
        (name = "Authentication", description = "Registration, login, OTP verification and password reset"),
        (name = "Invites", description = "Staff invitations"),
        (name = "Users", description = "User management and own profile"),
        (name = "Students", description = "Student profiles and enrollment"),
        (name = "Teachers", description = "Teacher profiles"),
        (name = "Parents", description = "Parent profiles and linked children"),
        (name = "Classes", description = "Classes and sections"),
        (name = "Subjects", description = "Subjects taught per class"),
        (name = "Exams", description = "Exams, mark entry and published results"),
        (name = "Attendance", description = "Attendance sessions and summaries"),
        (name = "Fees", description = "Invoices and payments"),
        (name = "Homework", description = "Homework assignments and submissions"),
        (name = "Library", description = "Book catalogue and loans"),
        (name = "Transport", description = "Bus routes and rider assignments"),
        (name = "Messages", description = "Direct messages between users"),
        (name = "Announcements", description = "School-wide and audience announcements"),
        (name = "Admissions", description = "Admission applications"),
        (name = "Dashboard", description = "Admin dashboard statistics")
    ),
    info(
        title = "Campusly API",
        version = "0.1.0",
        description = "Education management REST API built with Rust, Axum, and PostgreSQL.",
        contact(
            name = "API Support",
            email = "support@campusly.dev"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_has_bearer_scheme_and_paths() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/api/admissions/{id}/accept"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
