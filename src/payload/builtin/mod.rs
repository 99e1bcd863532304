//! Payloads shipped with the crate.

mod current_user;
mod host_info;
mod read_file;
mod upload_file;
mod users;

pub use current_user::CurrentUser;
pub use host_info::{HostInfo, HostReport};
pub use read_file::ReadFile;
pub use upload_file::UploadFile;
pub use users::{PasswdEntry, Users, parse_passwd};

use super::PayloadLogic;
use crate::error::PayloadError;

/// Every built-in payload, in catalogue order.
pub fn all() -> Vec<Box<dyn PayloadLogic>> {
    vec![
        Box::new(CurrentUser),
        Box::new(ReadFile),
        Box::new(Users),
        Box::new(HostInfo),
        Box::new(UploadFile),
    ]
}

/// Trimmed argument, or `InvalidArgument` when it is blank.
fn required_arg<'s>(payload: &str, argument: &'s str, what: &str) -> Result<&'s str, PayloadError> {
    let trimmed = argument.trim();
    if trimmed.is_empty() {
        return Err(PayloadError::InvalidArgument {
            payload: payload.to_string(),
            reason: format!("{} is required", what),
        });
    }
    Ok(trimmed)
}
