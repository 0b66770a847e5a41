pub mod controllers;
pub mod ports;
pub mod services;
