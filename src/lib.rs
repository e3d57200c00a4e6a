pub mod artifact;
pub mod cancel;
pub mod cli;
pub mod composition;
pub mod config;
pub mod dealer;
pub mod deck;
pub mod display;
pub mod env;
pub mod error;
pub mod hand;
pub mod harness;
pub mod mcts;
pub mod policy;
pub mod state;
pub mod track;
pub mod value_iteration;
