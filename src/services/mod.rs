pub mod charts;
pub mod excel;
pub mod pagination;
pub mod store;
