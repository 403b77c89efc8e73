pub mod adapter;
pub mod config;
pub mod controller;
pub mod layout;
pub mod logging;
pub mod session;
pub mod workspace;

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Config(config::ConfigError),
    Log(logging::LogError),
    Session(session::SessionError),
    Layout(layout::LayoutError),
    Controller(controller::ControllerError),
    Workspace(workspace::SerializerError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(err) => write!(f, "Configuration error: {}", err),
            Error::Log(err) => write!(f, "Logging error: {}", err),
            Error::Session(err) => write!(f, "Session error: {}", err),
            Error::Layout(err) => write!(f, "Layout error: {}", err),
            Error::Controller(err) => write!(f, "Controller error: {}", err),
            Error::Workspace(err) => write!(f, "Workspace error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<logging::LogError> for Error {
    fn from(err: logging::LogError) -> Self {
        Error::Log(err)
    }
}

impl From<session::SessionError> for Error {
    fn from(err: session::SessionError) -> Self {
        Error::Session(err)
    }
}

impl From<layout::LayoutError> for Error {
    fn from(err: layout::LayoutError) -> Self {
        Error::Layout(err)
    }
}

impl From<controller::ControllerError> for Error {
    fn from(err: controller::ControllerError) -> Self {
        Error::Controller(err)
    }
}

impl From<workspace::SerializerError> for Error {
    fn from(err: workspace::SerializerError) -> Self {
        Error::Workspace(err)
    }
}
