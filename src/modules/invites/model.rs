pub use campusly_auth::{InviteError, InviteStatus};
pub use campusly_models::invites::{
    CreateInviteDto, CreatedInvite, INVITE_COLUMNS, Invite, InviteFilterParams, InvitePreview,
    ValidateInviteQuery,
};
