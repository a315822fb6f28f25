pub mod phone_filter;
pub mod settings_cache;
pub mod time_fmt;
