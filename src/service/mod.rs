// Service layer module for the tournament registry
pub mod beatleader_service;
pub mod beatsaver_service;
pub mod command_registry;
pub mod form_service;
pub mod lifecycle;
pub mod lookup;
pub mod playlist_service;
pub mod registration_service;
pub mod workflow_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use beatleader_service::BeatLeaderService;
pub use beatsaver_service::BeatSaverService;
pub use command_registry::CommandRegistry;
pub use form_service::FormService;
pub use playlist_service::PlaylistService;
pub use registration_service::RegistrationService;
pub use workflow_service::WorkflowService;
