pub use campusly_models::admissions::{
    AcceptAdmissionDto, AcceptedAdmission, Admission, AdmissionFilterParams, AdmissionStatus,
    CreateAdmissionDto, RecordAssessmentDto, RejectAdmissionDto, ScheduleAssessmentDto,
};
