use std::{fmt, io, num::{ParseFloatError, ParseIntError, TryFromIntError}, str::Utf8Error};
use quick_xml::events::attributes::AttrError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Cache,
    Tiling,
    /// A feature ended up with a different number of property keys and values.
    PropertyMismatch,
    Format,
    Other,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

macro_rules! error_from {
    ($($source:ty => $kind:ident),* $(,)?) => {
        $(
            impl From<$source> for Error {
                fn from(value: $source) -> Self {
                    Error::new(ErrorKind::$kind, value.to_string())
                }
            }
        )*
    };
}

error_from! {
    io::Error => Io,
    quick_xml::Error => Parse,
    ParseFloatError => Parse,
    ParseIntError => Parse,
    AttrError => Parse,
    &AttrError => Parse,
    Utf8Error => Parse,
    TryFromIntError => Format,
    &str => Other,
    String => Other,
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::new(ErrorKind::Parse, format!("invalid config: {}", value))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
