//! TeraStore REST API wire types

pub mod requests;
pub mod responses;

pub use requests::{DeleteUserRequest, DeviceCreate, FilterRequest, LoginForm, SignupRequest, UpdateUserRequest};
pub use responses::{ErrorResponse, FilterRow, KeyEntry, RefreshResponse, TokenResponse};
