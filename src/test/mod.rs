mod sessions;
pub mod utils;
