//! HTTP routes for JustShake

pub mod cocktails;
pub mod health;

pub use cocktails::{
    handle_create, handle_delete, handle_get_by_id, handle_list, handle_list_by_filter,
    handle_update, COCKTAILS_PATH,
};
pub use health::{health_check, readiness_check, version_info};
