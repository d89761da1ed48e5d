pub use campusly_models::parents::{
    CreateParentDto, LinkChildDto, LinkedChild, PARENT_SELECT, Parent, ParentFilterParams,
    ParentWithChildren, UpdateParentDto,
};
