pub use campusly_models::announcements::{
    Announcement, AnnouncementFilterParams, Audience, CreateAnnouncementDto,
    UpdateAnnouncementDto,
};
