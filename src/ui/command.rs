use crate::types::Thread;

pub const HELP_TEXT: &str = "/new  /threads  /open <n|id>  /delete <n|id>  /rename <title>  \
/help  /quit  |  Tab switch thread  PgUp/PgDn scroll";

/// One line of prompt input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text for the active thread.
    Send(String),
    New,
    Refresh,
    Open(String),
    Delete(String),
    Rename(String),
    Help,
    Quit,
    /// A known command missing its argument; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let Some(rest) = input.strip_prefix('/') else {
        return Command::Send(input.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match (name, arg.is_empty()) {
        ("new", _) => Command::New,
        ("threads" | "refresh", _) => Command::Refresh,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        ("open", false) => Command::Open(arg.to_string()),
        ("open", true) => Command::Usage("/open <n|id>"),
        ("delete", false) => Command::Delete(arg.to_string()),
        ("delete", true) => Command::Usage("/delete <n|id>"),
        ("rename", false) => Command::Rename(arg.to_string()),
        ("rename", true) => Command::Usage("/rename <title>"),
        _ => Command::Unknown(name.to_string()),
    }
}

/// Resolves a 1-based position in the sidebar or a literal thread id.
pub fn resolve_thread<'a>(threads: &'a [Thread], reference: &str) -> Option<&'a Thread> {
    if let Some(thread) = threads.iter().find(|thread| thread.id == reference) {
        return Some(thread);
    }
    let position: usize = reference.parse().ok()?;
    threads.get(position.checked_sub(1)?)
}

/// The thread `step` places away from the active one, wrapping at both ends.
pub fn cycle_thread<'a>(
    threads: &'a [Thread],
    active_id: Option<&str>,
    step: isize,
) -> Option<&'a Thread> {
    if threads.is_empty() {
        return None;
    }
    let len = threads.len() as isize;
    let next = match active_id.and_then(|id| threads.iter().position(|t| t.id == id)) {
        Some(current) => (current as isize + step).rem_euclid(len),
        None if step < 0 => len - 1,
        None => 0,
    };
    threads.get(next as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(id: &str) -> Thread {
        Thread {
            id: id.to_string(),
            title: format!("Title {id}"),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(
            parse_command("  what tools help with triage? "),
            Command::Send("what tools help with triage?".to_string())
        );
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse_command("/open 2"), Command::Open("2".to_string()));
        assert_eq!(
            parse_command("/rename   Ward rounds  "),
            Command::Rename("Ward rounds".to_string())
        );
        assert_eq!(parse_command("/delete"), Command::Usage("/delete <n|id>"));
        assert_eq!(parse_command("/threads"), Command::Refresh);
        assert_eq!(parse_command("/bogus x"), Command::Unknown("bogus".to_string()));
    }

    #[test]
    fn test_resolve_thread_by_position_or_id() {
        let threads = vec![thread("a1"), thread("b2")];
        assert_eq!(resolve_thread(&threads, "2").map(|t| t.id.as_str()), Some("b2"));
        assert_eq!(resolve_thread(&threads, "a1").map(|t| t.id.as_str()), Some("a1"));
        assert!(resolve_thread(&threads, "0").is_none());
        assert!(resolve_thread(&threads, "3").is_none());
        assert!(resolve_thread(&threads, "zz").is_none());
    }

    #[test]
    fn test_cycle_thread_wraps() {
        let threads = vec![thread("a"), thread("b"), thread("c")];
        let id = |t: Option<&Thread>| t.map(|t| t.id.clone());
        assert_eq!(id(cycle_thread(&threads, Some("c"), 1)), Some("a".to_string()));
        assert_eq!(id(cycle_thread(&threads, Some("a"), -1)), Some("c".to_string()));
        assert_eq!(id(cycle_thread(&threads, None, 1)), Some("a".to_string()));
        assert_eq!(id(cycle_thread(&threads, None, -1)), Some("c".to_string()));
        assert!(cycle_thread(&[], None, 1).is_none());
    }
}
