pub use campusly_models::transport::{
    AssignStudentDto, CreateRouteDto, RouteAssignment, RouteFilterParams, RouteStudent,
    RouteWithCount, TransportRoute, UpdateRouteDto,
};
