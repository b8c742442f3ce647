//! Pre- and post-authentication command parsing.
//!
//! Before authentication, the only recognized input is `connect
//! <site_id> <name> <password>`. After authentication, a line
//! beginning with `!` is a control command (`!help`, `!color on|off`,
//! or anything else, which is routed to the session's "Session Agent"
//! channel for the application to interpret); everything else is
//! ordinary channel input.

/// Default and maximum bound for failed pre-auth attempts before the
/// connection is dropped.
pub const DEFAULT_MAX_AUTH_ATTEMPTS: u32 = 6;
/// Hard ceiling a configured attempt limit is clamped to.
pub const MAX_AUTH_ATTEMPTS_CEILING: u32 = 500;

/// A parsed pre-authentication command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreAuthCommand {
    /// `connect <site_id> <name> <password>`.
    Connect { site_id: u32, name: String, password: String },
    /// Anything else: not recognized before authentication.
    Unrecognized,
}

/// Parses a pre-authentication input line.
pub fn parse_pre_auth(line: &str) -> PreAuthCommand {
    let mut parts = line.splitn(4, ' ');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("connect"), Some(site_id), Some(name), Some(password)) => {
            match site_id.parse::<u32>() {
                Ok(site_id) => PreAuthCommand::Connect {
                    site_id,
                    name: name.to_string(),
                    password: password.to_string(),
                },
                Err(_) => PreAuthCommand::Unrecognized,
            }
        }
        _ => PreAuthCommand::Unrecognized,
    }
}

/// A parsed post-authentication input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAuthCommand {
    /// `!help`.
    Help,
    /// `!color on` or `!color off`.
    Color(bool),
    /// Any other `!`-prefixed command, forwarded verbatim (without
    /// the leading `!`) to the session's "Session Agent" channel.
    Agent(String),
    /// An ordinary line of channel input.
    ChannelInput(String),
}

/// Parses a post-authentication input line.
pub fn parse_post_auth(line: &str) -> PostAuthCommand {
    let Some(rest) = line.strip_prefix('!') else {
        return PostAuthCommand::ChannelInput(line.to_string());
    };

    if rest.eq_ignore_ascii_case("help") {
        return PostAuthCommand::Help;
    }
    if let Some(arg) = rest.strip_prefix("color ") {
        if arg.eq_ignore_ascii_case("on") {
            return PostAuthCommand::Color(true);
        }
        if arg.eq_ignore_ascii_case("off") {
            return PostAuthCommand::Color(false);
        }
    }
    PostAuthCommand::Agent(rest.to_string())
}

/// Tracks failed pre-authentication attempts and decides when a
/// connection has exhausted its budget and must be dropped.
pub struct AuthAttempts {
    failed: u32,
    max: u32,
}

impl AuthAttempts {
    /// Builds a tracker. `configured_max` of `0` falls back to
    /// [`DEFAULT_MAX_AUTH_ATTEMPTS`]; any value is clamped to
    /// [`MAX_AUTH_ATTEMPTS_CEILING`] so a misconfigured deployment
    /// can't turn this into an effectively unbounded brute-force
    /// window.
    pub fn new(configured_max: u32) -> Self {
        let max = if configured_max == 0 { DEFAULT_MAX_AUTH_ATTEMPTS } else { configured_max };
        AuthAttempts { failed: 0, max: max.min(MAX_AUTH_ATTEMPTS_CEILING) }
    }

    /// Records a failed attempt. Returns true if the budget is now
    /// exhausted and the connection should be dropped.
    pub fn record_failure(&mut self) -> bool {
        self.failed += 1;
        self.failed >= self.max
    }

    /// Number of failures recorded so far.
    pub fn failed_count(&self) -> u32 {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connect_command() {
        let cmd = parse_pre_auth("connect 1 alice hunter2");
        assert_eq!(
            cmd,
            PreAuthCommand::Connect { site_id: 1, name: "alice".to_string(), password: "hunter2".to_string() }
        );
    }

    #[test]
    fn rejects_malformed_connect() {
        assert_eq!(parse_pre_auth("connect 1 alice"), PreAuthCommand::Unrecognized);
        assert_eq!(parse_pre_auth("hello"), PreAuthCommand::Unrecognized);
    }

    #[test]
    fn post_auth_recognizes_help_and_color() {
        assert_eq!(parse_post_auth("!help"), PostAuthCommand::Help);
        assert_eq!(parse_post_auth("!color on"), PostAuthCommand::Color(true));
        assert_eq!(parse_post_auth("!color off"), PostAuthCommand::Color(false));
    }

    #[test]
    fn post_auth_forwards_unknown_bang_commands_to_agent() {
        assert_eq!(parse_post_auth("!!who"), PostAuthCommand::Agent("!who".to_string()));
        assert_eq!(parse_post_auth("!quit"), PostAuthCommand::Agent("quit".to_string()));
    }

    #[test]
    fn plain_line_is_channel_input() {
        assert_eq!(parse_post_auth("look"), PostAuthCommand::ChannelInput("look".to_string()));
    }

    #[test]
    fn auth_attempts_clamps_to_ceiling() {
        let attempts = AuthAttempts::new(10_000);
        assert_eq!(attempts.max, MAX_AUTH_ATTEMPTS_CEILING);
    }

    #[test]
    fn auth_attempts_exhausts_after_configured_count() {
        let mut attempts = AuthAttempts::new(2);
        assert!(!attempts.record_failure());
        assert!(attempts.record_failure());
    }
}
