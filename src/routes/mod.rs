mod health_check;
mod users;

pub use health_check::health_check;
pub use users::{
    get_profile, get_user_by_id, list_users, login, logout, refresh, register, update_profile,
};
