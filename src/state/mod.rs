pub mod aggregate;
pub mod app_settings;
pub mod app_state;
pub mod form;
pub mod games;
pub mod intake;
pub mod league;
pub mod messages;
pub mod network;
pub mod refresher;
pub mod review;
pub mod roster;
pub mod session;
pub mod users;
