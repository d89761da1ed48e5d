pub use campusly_models::teachers::{
    CreateTeacherDto, TEACHER_SELECT, Teacher, TeacherFilterParams, UpdateTeacherDto,
};
