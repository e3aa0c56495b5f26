use std::io;
use thiserror::Error;
use msgbox::IconType;
use std::fmt::{Display};
use std::str::Utf8Error;
use iced;
use serde_json;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to determine path to settings file")]
    NoSettingsPath,

    #[error("Failed to acquire file lock on settings file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode settings as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write settings file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build settings file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl SettingsError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            SettingsError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to start application (settings): {source}")]
    SettingsError { #[from] source: SettingsError },
}

#[derive(Error, Debug)]
pub enum LinkOpenError {
    #[error("Refusing to open a link that is not http(s)")]
    NotHttp,

    #[error("Failed to open link: {source}")]
    IOError { #[from] source: io::Error },
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("The backend process is not running")]
    NotRunning,

    #[error("Lost the backend process while waiting for its reply")]
    Disconnected,

    #[error("Backend reported an error: {0}")]
    Backend(String),

    #[error("Failed to encode/decode backend payload: {source}")]
    Codec { #[from] source: serde_json::Error },
}

pub fn error_msgbox<T: Display>(message: &'static str, error: &T) {
    let message = format!("{}: {}", message, error);
    eprintln!("{}", &message);
    if let Err(err) = msgbox::create(concat!("QTShock Desktop ", env!("CARGO_PKG_VERSION")), &message, IconType::Error) {
        eprintln!("Failed to create msgbox: {:?}", err);
    }
}
