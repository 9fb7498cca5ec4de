use teloxide::prelude::*;
use tracing::{debug, info};

const START_TEXT: &str = "DM me your videos or add me to your group chats!";

struct Command {
    name: String,
    /// `botname` from `/cmd@botname`.
    target: Option<String>,
}

fn parse_command(text: &str) -> Command {
    // Telegram may send `/cmd@botname arg1 ...`
    let first = text.split_whitespace().next().unwrap_or("");
    let mut parts = first.trim_start_matches('/').splitn(2, '@');
    let name = parts.next().unwrap_or("").to_lowercase();
    let target = parts.next().filter(|t| !t.is_empty()).map(str::to_string);

    Command { name, target }
}

/// A suffixed command is ours only when the suffix is our username.
fn addressed_to_us(cmd: &Command, own_username: Option<&str>) -> bool {
    match (&cmd.target, own_username) {
        (None, _) => true,
        (Some(target), Some(me)) => target.eq_ignore_ascii_case(me),
        (Some(_), None) => false,
    }
}

/// Returns `true` when the message was a command and needs no further
/// handling: either answered here or addressed to another bot.
pub(super) async fn handle_command(
    bot: &Bot,
    msg: &Message,
    text: &str,
    own_username: Option<&str>,
) -> ResponseResult<bool> {
    let cmd = parse_command(text);
    if !addressed_to_us(&cmd, own_username) {
        debug!(target_bot = ?cmd.target, "command for another bot");
        return Ok(true);
    }
    match cmd.name.as_str() {
        "start" => {
            info!(chat_id = msg.chat.id.0, "start");
            bot.send_message(msg.chat.id, START_TEXT).await?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_bot_suffix() {
        let cmd = parse_command("/start@vidfetch_bot");
        assert_eq!(cmd.name, "start");
        assert_eq!(cmd.target.as_deref(), Some("vidfetch_bot"));

        let cmd = parse_command("/Start  https://example.com ");
        assert_eq!(cmd.name, "start");
        assert_eq!(cmd.target, None);

        let cmd = parse_command("/");
        assert_eq!(cmd.name, "");
        assert_eq!(cmd.target, None);
    }

    #[test]
    fn commands_for_other_bots_are_not_ours() {
        let me = Some("vidfetch_bot");
        assert!(addressed_to_us(&parse_command("/start"), me));
        assert!(addressed_to_us(&parse_command("/start@VidFetch_Bot"), me));
        assert!(!addressed_to_us(&parse_command("/start@some_other_bot"), me));
        assert!(!addressed_to_us(&parse_command("/start@some_other_bot"), None));
        assert!(addressed_to_us(&parse_command("/start"), None));
    }
}
