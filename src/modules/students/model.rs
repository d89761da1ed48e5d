pub use campusly_models::students::{
    CreateStudentDto, STUDENT_SELECT, Student, StudentFilterParams, UpdateStudentDto,
};
