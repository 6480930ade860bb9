// Library for tests to access modules

pub mod config;
pub mod dispatcher;
pub mod iface_monitor;
pub mod models;
pub mod probe_repo;
pub mod process_controller;
pub mod worker;
