//! Session configuration: server address and login identity

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Port used when `HOST` is given without `:PORT`
pub const DEFAULT_PORT: u16 = 6667;

/// Remote IRC server (`HOST[:PORT]`)
#[derive(Debug, Clone, PartialEq, Eq)]
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

impl FromStr for ServerAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (host, port) = match s.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| CoreError::InvalidAddress(format!("{s}: bad port ({e})")))?;
                (host, port)
            }
            None => (s, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(CoreError::InvalidAddress(format!("{s}: missing host")));
        }

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Credentials sent during the login handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub password: String,
    pub nickname: String,
    pub username: String,
    pub realname: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            password: "to-wong-foo".to_string(),
            nickname: "jt2222".to_string(),
            username: "paul".to_string(),
            realname: "Paul Muttonchops".to_string(),
        }
    }
}

impl Identity {
    /// Set connection password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set nickname
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    /// Set username (ident)
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set real name
    pub fn with_realname(mut self, realname: impl Into<String>) -> Self {
        self.realname = realname.into();
        self
    }
}

/// Everything a session needs before it connects
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server: ServerAddress,
    pub identity: Identity,
}

impl SessionConfig {
    pub fn new(server: ServerAddress) -> Self {
        Self {
            server,
            identity: Identity::default(),
        }
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_only_uses_default_port() {
        let addr: ServerAddress = "irc.libera.chat".parse().unwrap();
        assert_eq!(addr, ServerAddress::new("irc.libera.chat", 6667));
    }

    #[test]
    fn test_parse_host_and_port() {
        let addr: ServerAddress = "127.0.0.1:7000".parse().unwrap();
        assert_eq!(addr.host, "127.0.0.1");
        assert_eq!(addr.port, 7000);
        assert_eq!(addr.to_string(), "127.0.0.1:7000");
    }

    #[test]
    fn test_parse_rejects_bad_port_and_empty_host() {
        assert!(matches!(
            "irc.example.net:abc".parse::<ServerAddress>(),
            Err(CoreError::InvalidAddress(_))
        ));
        assert!(matches!(
            ":6667".parse::<ServerAddress>(),
            Err(CoreError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_identity_builders() {
        let identity = Identity::default()
            .with_nickname("ferris")
            .with_realname("Ferris Crab");
        assert_eq!(identity.nickname, "ferris");
        assert_eq!(identity.realname, "Ferris Crab");
        assert_eq!(identity.username, "paul");
        assert_eq!(identity.password, "to-wong-foo");
    }
}
