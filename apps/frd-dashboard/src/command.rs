use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Help,
    Quit,
    Retry,
    Open(String),
    Search(String),
    Status(String),
    Page(usize),
    Next,
    Prev,
    Delete(String),
    Confirm(String),
    Cancel(String),
    Edit(String),
    Message(String),
    Tags(String),
    Attach(PathBuf),
    Detach,
    Save,
    Discard,
    Download { id: String, path: Option<PathBuf> },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArg(&'static str),
    #[error("`{0}` is not a page number")]
    BadNumber(String),
}

pub const HELP: &[&str] = &[
    "open <id>            expand or collapse a record",
    "search [text]        filter by workflow name or rationale",
    "status <label|ALL>   filter by status",
    "page <n> | next | prev",
    "delete <id>          ask to delete; then confirm <id> or cancel <id>",
    "edit <id>            start editing; then message/tags/attach/detach",
    "save | discard       finish editing",
    "download <id> [path] save the attached spreadsheet",
    "retry                reload from the source",
    "show | help | quit",
];

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };
    let arg = |name: &'static str| -> Result<String, CommandError> {
        if rest.is_empty() {
            Err(CommandError::MissingArg(name))
        } else {
            Ok(rest.to_string())
        }
    };
    let cmd = match head.to_ascii_lowercase().as_str() {
        "show" | "ls" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        "retry" | "reload" => Command::Retry,
        "open" | "toggle" => Command::Open(arg("open")?),
        "search" => Command::Search(rest.to_string()),
        "status" => Command::Status(arg("status")?),
        "page" => {
            let raw = arg("page")?;
            let n = raw.parse::<usize>().map_err(|_| CommandError::BadNumber(raw))?;
            Command::Page(n)
        }
        "next" => Command::Next,
        "prev" => Command::Prev,
        "delete" | "rm" => Command::Delete(arg("delete")?),
        "confirm" => Command::Confirm(arg("confirm")?),
        "cancel" => Command::Cancel(arg("cancel")?),
        "edit" => Command::Edit(arg("edit")?),
        "message" | "msg" => Command::Message(arg("message")?),
        "tags" | "metadata" => Command::Tags(rest.to_string()),
        "attach" => Command::Attach(PathBuf::from(arg("attach")?)),
        "detach" => Command::Detach,
        "save" => Command::Save,
        "discard" => Command::Discard,
        "download" => {
            let raw = arg("download")?;
            let (id, path) = match raw.split_once(char::is_whitespace) {
                Some((id, p)) => (id.to_string(), Some(PathBuf::from(p.trim()))),
                None => (raw, None),
            };
            Command::Download { id, path }
        }
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}
