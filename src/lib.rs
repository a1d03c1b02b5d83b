pub mod commands;
pub mod config;
pub mod lock;
pub mod paths;
pub mod platform;
pub mod shell;
pub mod switch;
pub mod ui;
pub mod versions;

#[cfg(test)]
pub mod test_utils;
