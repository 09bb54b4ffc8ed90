mod bootstrap;
mod commands;
mod config_file;
mod host_session;
mod loop_runner;
mod roster;
mod sim_world;

pub(crate) use bootstrap::build_app;
pub(crate) use loop_runner::run;
