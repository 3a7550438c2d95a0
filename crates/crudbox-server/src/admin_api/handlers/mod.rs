pub mod endpoints;
pub mod imports;
pub mod projects;
pub mod system;
