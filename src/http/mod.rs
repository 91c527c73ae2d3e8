pub mod health;
pub mod tournament_handler;
