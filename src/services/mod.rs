pub mod asset_store;
pub mod intake;
pub mod presentation;
pub mod stage;
pub mod transform;
pub mod upscale_service;
