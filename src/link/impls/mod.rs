pub mod concat;
pub mod fn_link;
pub mod service_link;
