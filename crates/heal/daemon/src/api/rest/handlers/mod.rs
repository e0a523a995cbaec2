//! API request handlers

mod auth;
mod health;
mod pages;
mod profiles;
mod webhook;

pub use auth::*;
pub use health::*;
pub use pages::*;
pub use profiles::*;
pub use webhook::*;
