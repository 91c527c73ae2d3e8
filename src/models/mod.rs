// Core models
pub mod playlist;
pub mod profile;
pub mod tournament;
pub mod workflow;
