pub use campusly_models::attendance::{
    AttendanceRecord, AttendanceSession, AttendanceSummary, CreateSessionDto,
    RecordAttendanceDto, SessionFilterParams, SessionStatus, SessionWithRecords, StatusCounts,
    SummaryQuery,
};
