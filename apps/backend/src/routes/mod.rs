//! HTTP route handlers

pub mod home;
pub mod maintenance;
pub mod review;
pub mod shared_move;
