pub mod access_gate;
pub mod cooldown;
pub mod orchestrator;
pub mod outcome;
pub mod validation;
