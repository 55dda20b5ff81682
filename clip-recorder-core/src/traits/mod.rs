pub mod backend;
pub mod capture_provider;
pub mod playback_provider;
