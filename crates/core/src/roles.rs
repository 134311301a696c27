//! Well-known role name constants.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MEMBER: &str = "member";
