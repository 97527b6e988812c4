pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod state;
pub mod users;

#[cfg(test)]
mod test_support;
