use std::io::BufRead;
use std::thread::JoinHandle;
use tracing::{info, warn};

use crate::event::{ClientEvent, EventSender, UserCommand};

pub const USAGE: &str =
    "Press Enter to start talking and Enter again to send (r = start, s = send, q = quit)";

/// Map one line of terminal input to a command
pub fn parse_command(line: &str) -> Option<UserCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "t" | "toggle" => Some(UserCommand::ToggleRecording),
        "r" | "start" | "record" => Some(UserCommand::BeginRecording),
        "s" | "stop" | "send" => Some(UserCommand::EndRecording),
        "q" | "quit" | "exit" => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Read push-to-talk commands from stdin on a dedicated thread.
///
/// The thread blocks in `read`, outside the tokio runtime, so it never holds
/// up runtime shutdown; it dies with the process.
pub fn spawn_stdin_reader(events: EventSender) -> std::io::Result<JoinHandle<()>> {
    info!("{}", USAGE);

    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || forward_commands(std::io::stdin().lock(), &events))
}

/// Forward commands from `reader` until EOF, quit, or the client is gone.
/// EOF counts as quit.
pub fn forward_commands(reader: impl BufRead, events: &EventSender) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read input: {}", e);
                break;
            }
        };

        match parse_command(&line) {
            Some(command) => {
                if events.send(ClientEvent::Command(command)).is_err() {
                    return;
                }
                if command == UserCommand::Quit {
                    return;
                }
            }
            None => warn!("Unknown command {:?}. {}", line.trim(), USAGE),
        }
    }

    let _ = events.send(ClientEvent::Command(UserCommand::Quit));
}
