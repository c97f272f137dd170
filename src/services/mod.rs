// dotpush services
// Stateless or self-contained functionality: classification, extraction, GitHub access, storage, settings.

pub mod credential_store;
pub mod crypto_service;
pub mod device_flow_client;
pub mod editor_extractor;
pub mod language_classifier;
pub mod page_snapshot;
pub mod repository_sync;
pub mod settings_engine;
