pub use campusly_models::exams::{
    CreateExamDto, EnterMarksDto, Exam, ExamFilterParams, ExamMark, ExamStatus, MarkEntry,
    ResultRow, StudentResult, UpdateExamDto,
};
