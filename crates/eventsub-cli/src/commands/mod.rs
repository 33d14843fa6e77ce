pub mod manifest;
pub mod resource;
