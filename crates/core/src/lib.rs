pub mod auth;
pub mod quote;
pub mod storage;

pub fn core_version() -> &'static str {
    "0.1.0"
}
