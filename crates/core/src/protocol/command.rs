//! Outbound IRC command lines

use std::fmt;

use crate::config::Identity;

/// Terminates every line sent to the server
pub const LINE_SEPARATOR: &str = "\r\n";

/// A single outbound protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: String,
    params: String,
}

impl Command {
    /// Build a command from an already-normalised verb and parameter string
    pub fn new(verb: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            params: params.into(),
        }
    }

    /// Translate a line typed by the user
    ///
    /// The first word is uppercased and becomes the verb. The remaining
    /// words are kept as typed and joined with single spaces. Returns `None`
    /// for blank input.
    pub fn translate(input: &str) -> Option<Self> {
        let mut words = input.split_whitespace();
        let verb = words.next()?.to_uppercase();
        let params = words.collect::<Vec<_>>().join(" ");
        Some(Self::new(verb, params))
    }

    /// Keep-alive reply for a server line, if that line is a `PING`
    pub fn pong_for(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        if !words.next()?.eq_ignore_ascii_case("PING") {
            return None;
        }
        let token = words.collect::<Vec<_>>().join(" ");
        Some(Self::new("PONG", token))
    }

    /// `PASS`, `NICK` and `USER`, in the order the server expects them
    pub fn handshake(identity: &Identity) -> [Self; 3] {
        [
            Self::new("PASS", identity.password.as_str()),
            Self::new("NICK", identity.nickname.as_str()),
            Self::new(
                "USER",
                format!("{} 8 * : {}", identity.username, identity.realname),
            ),
        ]
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn params(&self) -> &str {
        &self.params
    }

    /// False once the user has asked to leave
    pub fn keeps_session_open(&self) -> bool {
        self.verb != "QUIT"
    }

    /// The line as it goes on the wire, separator included
    pub fn to_wire(&self) -> String {
        format!("{}{}", self, LINE_SEPARATOR)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.verb)
        } else {
            write!(f, "{} {}", self.verb, self.params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_uppercases_verb_only() {
        let cmd = Command::translate("join #chan").unwrap();
        assert_eq!(cmd.to_wire(), "JOIN #chan\r\n");

        let cmd = Command::translate("privmsg #Rust Hello World").unwrap();
        assert_eq!(cmd.verb(), "PRIVMSG");
        assert_eq!(cmd.params(), "#Rust Hello World");
    }

    #[test]
    fn test_translate_collapses_whitespace() {
        let cmd = Command::translate("  mode   #chan\t+o   ferris ").unwrap();
        assert_eq!(cmd.to_wire(), "MODE #chan +o ferris\r\n");
    }

    #[test]
    fn test_translate_blank_input() {
        assert!(Command::translate("").is_none());
        assert!(Command::translate(" \t ").is_none());
    }

    #[test]
    fn test_quit_ends_session() {
        assert!(!Command::translate("quit").unwrap().keeps_session_open());
        assert!(!Command::translate("Quit :bye all").unwrap().keeps_session_open());
        assert!(Command::translate("quitter").unwrap().keeps_session_open());
        assert!(Command::translate("nick quit").unwrap().keeps_session_open());
    }

    #[test]
    fn test_verb_without_params_has_no_trailing_space() {
        assert_eq!(Command::translate("quit").unwrap().to_wire(), "QUIT\r\n");
    }

    #[test]
    fn test_pong_for_ping() {
        assert_eq!(
            Command::pong_for("PING :abc").unwrap().to_wire(),
            "PONG :abc\r\n"
        );
        assert_eq!(
            Command::pong_for("ping irc.example.net").unwrap().to_wire(),
            "PONG irc.example.net\r\n"
        );
        assert!(Command::pong_for(":srv PING :abc").is_none());
        assert!(Command::pong_for("PINGS :abc").is_none());
        assert!(Command::pong_for("").is_none());
    }

    #[test]
    fn test_handshake_order() {
        let lines: Vec<String> = Command::handshake(&Identity::default())
            .iter()
            .map(Command::to_wire)
            .collect();
        assert_eq!(
            lines,
            vec![
                "PASS to-wong-foo\r\n",
                "NICK jt2222\r\n",
                "USER paul 8 * : Paul Muttonchops\r\n",
            ]
        );
    }
}
