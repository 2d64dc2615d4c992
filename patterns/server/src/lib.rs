pub mod cascade;
pub mod config;
pub mod contact;
pub mod entities;
pub mod location;
pub mod notify;
pub mod product;
pub mod render;
pub mod status;
pub mod task;
pub mod web;
