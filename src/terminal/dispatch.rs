/// Console commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CloseSession,
    CreateSession,
    GetSession,
    Infoex,
    SendTask,
    StartCapturing,
    StopCapturing,
    ReleaseImageBlocks,
    Certify,
    Help,
    List,
    Quit,
    Run,
    Select,
    Sleep,
    Status,
}

/// Tokens accepted for each command, matched case-insensitively.
pub const DISPATCH_TABLE: &[(Command, &[&str])] = &[
    (Command::CloseSession, &["cl", "close", "closesession"]),
    (Command::CreateSession, &["cr", "create", "createsession"]),
    (Command::GetSession, &["get", "getsession"]),
    (Command::Infoex, &["in", "info", "infoex"]),
    (Command::SendTask, &["send", "sendtask"]),
    (Command::StartCapturing, &["start", "startcapturing"]),
    (Command::StopCapturing, &["stop", "stopcapturing"]),
    (Command::ReleaseImageBlocks, &["release", "releaseimageblocks"]),
    (Command::Certify, &["ce", "certify"]),
    (Command::Help, &["h", "help", "?"]),
    (Command::List, &["l", "list"]),
    (Command::Quit, &["ex", "exit", "q", "quit"]),
    (Command::Run, &["r", "run"]),
    (Command::Select, &["s", "select"]),
    (Command::Sleep, &["sleep"]),
    (Command::Status, &["status"]),
];

pub fn lookup(token: &str) -> Option<Command> {
    let token = token.to_ascii_lowercase();
    DISPATCH_TABLE
        .iter()
        .find(|(_, aliases)| aliases.contains(&token.as_str()))
        .map(|(command, _)| *command)
}

pub const SUMMARY: &[&str] = &[
    "Discovery and Selection",
    "help [command]...............................this text",
    "list.........................................list scanners",
    "quit.........................................exit the program",
    "run [script].................................run a script",
    "select [pattern].............................select a scanner",
    "sleep {milliseconds}.........................pause a script",
    "status.......................................status of the program",
    "",
    "Image Capture APIs (in order of use)",
    "infoex.......................................get information about the scanner",
    "createSession................................create a new session",
    "getSession...................................show the current session object",
    "sendTask {task|file}.........................send task",
    "startCapturing...............................start capturing new images",
    "releaseImageBlocks {first} {last}............release image blocks in the scanner",
    "stopCapturing................................stop capturing new images",
    "closeSession.................................close the current session",
    "",
    "Certification",
    "certify [suite]..............................run the certification suite",
];

pub fn help(command: Command) -> &'static [&'static str] {
    match command {
        Command::Help => &[
            "HELP [COMMAND]",
            "Provides assistance with commands and their arguments.",
            "",
            "Curly brackets {} indicate mandatory arguments to a command.  Square",
            "brackets [] indicate optional arguments.",
        ],
        Command::List => &[
            "LIST",
            "List the scanners that are advertising themselves.  The same scanner",
            "may be seen more than once if it is advertised on several networks.",
        ],
        Command::Quit => &["QUIT", "Exit from this program."],
        Command::Run => &[
            "RUN [SCRIPT]",
            "Runs the specified script, trying SCRIPT and then SCRIPT.tdc.  If no",
            "SCRIPT is given, the scripts in the current folder are listed.",
        ],
        Command::Select => &[
            "SELECT [PATTERN]",
            "Selects one of the scanners shown by the list command.  The pattern",
            "must match some or all of the name, the IP address, or the note.",
            "Without a pattern the first scanner is selected.",
        ],
        Command::Sleep => &["SLEEP {MILLISECONDS}", "Waits before running the next command."],
        Command::Status => &[
            "STATUS",
            "The selected scanner, the last scanner list and recent certification runs.",
        ],
        Command::Infoex => &[
            "INFOEX",
            "Issues an infoex command to the selected scanner.  It must be issued",
            "before CREATESESSION.",
        ],
        Command::CreateSession => &[
            "CREATESESSION",
            "Creates a session for the selected scanner.  To end the session use",
            "CLOSESESSION.",
        ],
        Command::GetSession => &["GETSESSION", "Gets information about the current session."],
        Command::SendTask => &[
            "SENDTASK {TASK|FILE}",
            "Sends a TWAIN Direct task.  The argument can either be the task",
            "itself, or a file containing the task.",
        ],
        Command::StartCapturing => &["STARTCAPTURING", "Start capturing images from the scanner."],
        Command::StopCapturing => &["STOPCAPTURING", "Stop capturing images from the scanner."],
        Command::ReleaseImageBlocks => &[
            "RELEASEIMAGEBLOCKS {FIRST} {LAST}",
            "Releases the image blocks from FIRST to LAST inclusive.",
        ],
        Command::CloseSession => &[
            "CLOSESESSION",
            "Close the session, which unlocks the scanner.",
        ],
        Command::Certify => &[
            "CERTIFY [SUITE]",
            "Runs every test in the certification suite against the current",
            "session.  SUITE defaults to the configured suite folder.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_case_insensitively() {
        assert_eq!(lookup("cr"), Some(Command::CreateSession));
        assert_eq!(lookup("createSession"), Some(Command::CreateSession));
        assert_eq!(lookup("?"), Some(Command::Help));
        assert_eq!(lookup("startCapturing"), Some(Command::StartCapturing));
        assert_eq!(lookup("release"), Some(Command::ReleaseImageBlocks));
        assert_eq!(lookup("Q"), Some(Command::Quit));
        assert_eq!(lookup("waitforevents"), None);
    }

    #[test]
    fn aliases_are_unique() {
        let mut seen = Vec::new();
        for (_, aliases) in DISPATCH_TABLE {
            for alias in *aliases {
                assert!(!seen.contains(alias), "duplicate alias {alias}");
                seen.push(*alias);
            }
        }
    }
}
