//! Terminal input parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: send to the active chat
    Say(String),
    Chat(String),
    Leave,
    Online,
    Read(String),
    History,
    Show,
    Typing,
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
/chat <user>     open a conversation
/leave           close the current conversation
/online          refresh the online user list
/read <id>       mark a message as read
/history         load the conversation history over HTTP
/show            print the current conversation
/typing          tell the peer you are typing
/quit            go offline and exit
<text>           send a message";

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Say(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let argument = parts.next().map(str::to_string);

        let command = match (name, argument) {
            ("chat", Some(user)) => Self::Chat(user),
            ("read", Some(id)) => Self::Read(id),
            ("chat", None) => Self::Invalid("usage: /chat <user>".to_string()),
            ("read", None) => Self::Invalid("usage: /read <message id>".to_string()),
            ("leave", _) => Self::Leave,
            ("online", _) => Self::Online,
            ("history", _) => Self::History,
            ("show", _) => Self::Show,
            ("typing", _) => Self::Typing,
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            (other, _) => Self::Invalid(format!("unknown command /{other}, try /help")),
        };
        Some(command)
    }
}
