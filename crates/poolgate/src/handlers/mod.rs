pub mod api;
pub mod dashboard;
pub mod flash;
pub mod health;
pub mod login;
pub mod pages;
pub mod signup;
