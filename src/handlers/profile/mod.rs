mod add;
mod delete;
mod history;
mod latest;
mod list;
mod path;
mod version;

pub use add::add_version;
pub use delete::delete_owner;
pub use history::list_versions;
pub use latest::get_latest;
pub use list::list_owners;
pub use path::ProfilePath;
pub use version::get_version;

use crate::error::ApiError;

fn version_not_found() -> ApiError {
    ApiError::not_found("Profile version not found")
}
