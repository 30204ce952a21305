pub mod category;
pub mod category_tag;
pub mod contract;
pub mod contract_product;
pub mod file;
pub mod gallery;
pub mod hero;
pub mod history;
pub mod product;
pub mod tag;
pub mod user;
pub mod video;
