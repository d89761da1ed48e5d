pub use campusly_models::classes::{
    Class, ClassDetail, ClassFilterParams, CreateClassDto, CreateSectionDto, Section,
    SectionWithCount, UpdateClassDto, UpdateSectionDto,
};
