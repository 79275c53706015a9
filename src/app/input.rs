use crate::models::AppEvent;

pub const HELP: &str = "commands: search <text> | league <name> | refresh | hide | show | offline | online | help | quit";

/// A line typed at the dashboard prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Event(AppEvent),
    Help,
    Quit,
}

/// Parse one input line. `None` for blank or unknown input.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let event = match verb.to_ascii_lowercase().as_str() {
        "search" | "s" | "/" => AppEvent::SearchChanged(rest.to_string()),
        "league" | "l" => AppEvent::LeagueChanged(rest.to_string()),
        "refresh" | "r" => AppEvent::RefreshRequested,
        "hide" => AppEvent::VisibilityChanged { visible: false },
        "show" => AppEvent::VisibilityChanged { visible: true },
        "offline" => AppEvent::ConnectivityChanged { online: false },
        "online" => AppEvent::ConnectivityChanged { online: true },
        "help" | "?" => return Some(Command::Help),
        "quit" | "q" | "exit" => return Some(Command::Quit),
        _ => return None,
    };

    Some(Command::Event(event))
}
