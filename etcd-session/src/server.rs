use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One candidate server of the coordination service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerAddress {
    type Err = Error;

    /// Parses `host:port`, splitting at the last colon.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| Error::InvalidAddress {
            input: input.to_string(),
            reason,
        };

        let Some((host, port)) = input.trim().rsplit_once(':') else {
            return Err(invalid("expected host:port"));
        };
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port = port.parse::<u16>().map_err(|_| invalid("port must be 0-65535"))?;

        Ok(Self::new(host, port))
    }
}
