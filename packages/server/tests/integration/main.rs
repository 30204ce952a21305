mod common;
mod contract;
mod history;
mod listing;
mod product;
mod user;
