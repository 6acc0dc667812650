pub mod apply;
pub mod config;
pub mod init;
pub mod name;
pub mod units;
pub mod validate;
