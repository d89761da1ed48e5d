pub use campusly_models::subjects::{
    CreateSubjectDto, Subject, SubjectFilterParams, UpdateSubjectDto,
};
