use ecomflex_session::Navigation;
use std::fmt;

/// A session command given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    Refresh,
    Status,
    Profile,
    /// Run the route guard against a path
    Check { path: String },
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No command given.
    MissingCommand,
    /// Command given without a required argument.
    MissingArgument { command: &'static str, usage: &'static str },
    /// Extra arguments after a complete command.
    UnexpectedArgument(String),
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCommand => write!(f, "No command given. Run with --help to see commands"),
            Self::MissingArgument { command, usage } => {
                write!(f, "'{}' is missing an argument (usage: {})", command, usage)
            }
            Self::UnexpectedArgument(arg) => write!(f, "Unexpected argument '{}'", arg),
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Run with --help to see commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse the free arguments left after options into a [`Command`].
///
/// # Examples
///
/// ```
/// use ecomflex_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command(&["status"]), Ok(Command::Status));
/// assert_eq!(
///     parse_command(&["check", "/admin/dashboard"]),
///     Ok(Command::Check { path: "/admin/dashboard".to_string() })
/// );
/// ```
pub fn parse_command<S: AsRef<str>>(args: &[S]) -> Result<Command, ParseError> {
    let parts: Vec<&str> = args.iter().map(|a| a.as_ref().trim()).collect();
    let Some((&name, rest)) = parts.split_first() else {
        return Err(ParseError::MissingCommand);
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "login" => parse_login(rest)?,
        "logout" => Command::Logout,
        "refresh" => Command::Refresh,
        "status" => Command::Status,
        "profile" => Command::Profile,
        "check" => Command::Check {
            path: required(rest, 0, "check", "check PATH")?.to_string(),
        },
        _ => return Err(ParseError::UnrecognizedCommand(name.to_string())),
    };

    let consumed = match command {
        Command::Login { .. } => 2,
        Command::Check { .. } => 1,
        _ => 0,
    };
    match rest.get(consumed) {
        Some(extra) => Err(ParseError::UnexpectedArgument(extra.to_string())),
        None => Ok(command),
    }
}

fn parse_login(rest: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "login EMAIL PASSWORD";
    Ok(Command::Login {
        email: required(rest, 0, "login", USAGE)?.to_string(),
        password: required(rest, 1, "login", USAGE)?.to_string(),
    })
}

fn required<'a>(
    rest: &[&'a str],
    index: usize,
    command: &'static str,
    usage: &'static str,
) -> Result<&'a str, ParseError> {
    rest.get(index)
        .copied()
        .filter(|s| !s.is_empty())
        .ok_or(ParseError::MissingArgument { command, usage })
}

/// One-line description of a guard decision
pub fn describe_navigation(target: &str, navigation: &Navigation) -> String {
    match navigation {
        Navigation::Proceed => format!("{}: allowed", target),
        Navigation::RedirectToLogin { redirect } => {
            format!("{}: login required (redirect back to {})", target, redirect)
        }
        Navigation::RedirectToRoleHome { path } => {
            format!("{}: not permitted for this role (go to {})", target, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Simple commands ===

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command(&["logout"]), Ok(Command::Logout));
        assert_eq!(parse_command(&["refresh"]), Ok(Command::Refresh));
        assert_eq!(parse_command(&["status"]), Ok(Command::Status));
        assert_eq!(parse_command(&["profile"]), Ok(Command::Profile));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse_command(&["STATUS"]), Ok(Command::Status));
    }

    // === Commands with arguments ===

    #[test]
    fn test_parse_login() {
        assert_eq!(
            parse_command(&["login", "jane@example.com", "Password1"]),
            Ok(Command::Login {
                email: "jane@example.com".to_string(),
                password: "Password1".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_login_missing_password() {
        assert_eq!(
            parse_command(&["login", "jane@example.com"]),
            Err(ParseError::MissingArgument {
                command: "login",
                usage: "login EMAIL PASSWORD"
            })
        );
    }

    #[test]
    fn test_parse_check_missing_path() {
        assert!(matches!(
            parse_command(&["check"]),
            Err(ParseError::MissingArgument { command: "check", .. })
        ));
    }

    // === Errors ===

    #[test]
    fn test_parse_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(parse_command(&empty), Err(ParseError::MissingCommand));
    }

    #[test]
    fn test_parse_unrecognized() {
        assert_eq!(
            parse_command(&["signup"]),
            Err(ParseError::UnrecognizedCommand("signup".to_string()))
        );
    }

    #[test]
    fn test_parse_extra_argument() {
        assert_eq!(
            parse_command(&["status", "now"]),
            Err(ParseError::UnexpectedArgument("now".to_string()))
        );
    }

    #[test]
    fn test_error_messages_are_helpful() {
        let err = parse_command(&["login"]).unwrap_err();
        assert!(err.to_string().contains("login EMAIL PASSWORD"));
    }

    // === Output ===

    #[test]
    fn test_describe_navigation() {
        assert_eq!(describe_navigation("/home", &Navigation::Proceed), "/home: allowed");
        assert_eq!(
            describe_navigation(
                "/admin",
                &Navigation::RedirectToRoleHome { path: "/home" }
            ),
            "/admin: not permitted for this role (go to /home)"
        );
    }
}
