pub mod confirm;
pub mod embeds;
pub mod format;
pub mod fuzz;
pub mod paginator;
pub mod permissions;
pub mod time;
pub mod validate;
