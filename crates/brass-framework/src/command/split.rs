//! Text handling for chat commands: prefix stripping and argument splitting.

/// Characters allowed between the bot's nick and the command when the bot is
/// addressed by name (`brass: roll`, `brass, roll`, `brass> roll`).
pub const ADDRESS_SEPARATORS: [char; 3] = [':', ',', '>'];

/// Extracts the command body from a chat line.
///
/// - A line addressed to `nick` has the nick, the separator and an optional
///   `prefix` removed.
/// - Otherwise, in a channel with a `prefix` configured, the line must start
///   with the prefix, or no command is recognised (`None`).
/// - In a private message the prefix is optional and stripped if present.
///
/// An empty `prefix` counts as no prefix.
pub fn command_body<'t>(
    text: &'t str,
    prefix: Option<&str>,
    nick: Option<&str>,
    in_channel: bool,
) -> Option<&'t str> {
    let text = text.trim();
    let prefix = prefix.filter(|p| !p.is_empty());

    if let Some(nick) = nick.filter(|n| !n.is_empty())
        && let Some(rest) = strip_addressee(text, nick)
    {
        return Some(prefix.and_then(|p| rest.strip_prefix(p)).unwrap_or(rest));
    }

    match prefix {
        Some(p) => match text.strip_prefix(p) {
            Some(rest) => Some(rest),
            None if in_channel => None,
            None => Some(text),
        },
        None => Some(text),
    }
}

fn strip_addressee<'t>(text: &'t str, nick: &str) -> Option<&'t str> {
    let head = text.get(..nick.len())?;
    if !head.eq_ignore_ascii_case(nick) {
        return None;
    }
    let after = &text[nick.len()..];
    let rest = match after.strip_prefix(ADDRESS_SEPARATORS) {
        Some(rest) => rest,
        None if after.starts_with(char::is_whitespace) => after,
        None => return None,
    };
    let rest = rest.trim_start();
    (!rest.is_empty()).then_some(rest)
}

/// Splits a command body into the command word and the trimmed remainder.
///
/// Returns `None` for a blank body.
pub fn split_command(body: &str) -> Option<(&str, &str)> {
    let body = body.trim_start();
    if body.is_empty() {
        return None;
    }
    match body.find(char::is_whitespace) {
        Some(end) => Some((&body[..end], body[end..].trim())),
        None => Some((body, "")),
    }
}

/// Splits `input` into at most `limit` whitespace-delimited tokens.
///
/// The last token absorbs the rest of the input, inner whitespace included.
pub fn split_params(input: &str, limit: usize) -> Vec<String> {
    let mut params = Vec::new();
    let mut rest = input.trim();
    while !rest.is_empty() && params.len() < limit {
        if params.len() + 1 == limit {
            params.push(rest.to_string());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                params.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            }
            None => {
                params.push(rest.to_string());
                break;
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_required_in_channel() {
        assert_eq!(command_body("!roll 3d6", Some("!"), None, true), Some("roll 3d6"));
        assert_eq!(command_body("roll 3d6", Some("!"), None, true), None);
        assert_eq!(command_body("roll 3d6", None, None, true), Some("roll 3d6"));
        assert_eq!(command_body("roll", Some(""), None, true), Some("roll"));
    }

    #[test]
    fn test_prefix_optional_in_private() {
        assert_eq!(command_body("!roll", Some("!"), None, false), Some("roll"));
        assert_eq!(command_body("roll", Some("!"), None, false), Some("roll"));
    }

    #[test]
    fn test_addressed_by_nick() {
        for line in ["brass: roll", "Brass, roll", "brass> roll", "brass roll", "brass: !roll"] {
            assert_eq!(
                command_body(line, Some("!"), Some("brass"), true),
                Some("roll"),
                "{line}"
            );
        }
        assert_eq!(command_body("brassy roll", Some("!"), Some("brass"), true), None);
        assert_eq!(command_body("brass:", Some("!"), Some("brass"), true), None);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("roll"), Some(("roll", "")));
        assert_eq!(split_command("roll   3d6 + 2 "), Some(("roll", "3d6 + 2")));
        assert_eq!(split_command("   "), None);
    }

    #[test]
    fn test_split_params_last_absorbs_rest() {
        assert_eq!(split_params("a b c d", 2), ["a", "b c d"]);
        assert_eq!(split_params("a   b", 3), ["a", "b"]);
        assert_eq!(split_params("hello big world", 1), ["hello big world"]);
        assert!(split_params("a b", 0).is_empty());
        assert!(split_params("   ", 2).is_empty());
    }
}
