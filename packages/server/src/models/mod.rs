pub mod auth;
pub mod category;
pub mod contract;
pub mod dashboard;
pub mod envelope;
pub mod gallery;
pub mod history;
pub mod product;
pub mod shared;
pub mod tag;
pub mod user;
pub mod video;
