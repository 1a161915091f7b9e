pub mod auth;
pub mod calendar;
pub mod drafts;
pub mod requests;
