pub use campusly_models::homework::{
    CreateHomeworkDto, GradeSubmissionDto, Homework, HomeworkFilterParams, Submission,
    SubmissionStatus, SubmitHomeworkDto, UpdateHomeworkDto,
};
