//! User data models and DTOs, re-exported from `campusly-models`.

pub use campusly_models::users::{
    ChangePasswordDto, CreateUserDto, USER_COLUMNS, UpdateProfileDto, UpdateUserDto,
    UpdateUserStatusDto, User, UserCredentials, UserFilterParams, UserRole, like_pattern,
};
