use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use facelock_core::pipeline::loop_controller::ControlCommand;
use facelock_core::shared::constants::CAMERA_CHOICES;

pub const HELP: &str = "Commands: start | stop | scan | camera <n> | cameras | quit";

/// A line typed by the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleInput {
    Control(ControlCommand),
    ListCameras,
    Help,
}

pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };

    let input = match word.to_lowercase().as_str() {
        "start" => ConsoleInput::Control(ControlCommand::Start),
        "stop" => ConsoleInput::Control(ControlCommand::Stop),
        "scan" => ConsoleInput::Control(ControlCommand::Scan),
        "quit" | "exit" => ConsoleInput::Control(ControlCommand::Shutdown),
        "cameras" => ConsoleInput::ListCameras,
        "help" | "?" => ConsoleInput::Help,
        "camera" => {
            let arg = words.next().ok_or("usage: camera <n>")?;
            let index = arg
                .parse::<usize>()
                .map_err(|_| format!("not a camera index: '{arg}'"))?;
            ConsoleInput::Control(ControlCommand::SelectCamera(index))
        }
        other => return Err(format!("unknown command '{other}'. {HELP}")),
    };
    Ok(Some(input))
}

pub fn camera_listing() -> String {
    CAMERA_CHOICES
        .iter()
        .map(|(index, name)| format!("  {index} ({name})"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads operator commands from stdin on a background thread.
pub fn spawn(commands: Sender<ControlCommand>) -> io::Result<JoinHandle<()>> {
    spawn_reader(io::BufReader::new(io::stdin()), commands)
}

/// Forwards commands read from `reader` until it ends or the controller
/// side of the channel is gone.
///
/// End of input only ends this thread; `quit` is the way to shut down, so a
/// closed stdin leaves an autostarted loop running.
pub fn spawn_reader<R>(reader: R, commands: Sender<ControlCommand>) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                match parse_line(&line) {
                    Ok(Some(ConsoleInput::Control(command))) => {
                        if commands.send(command).is_err() {
                            return;
                        }
                    }
                    Ok(Some(ConsoleInput::ListCameras)) => println!("{}", camera_listing()),
                    Ok(Some(ConsoleInput::Help)) => println!("{HELP}"),
                    Ok(None) => {}
                    Err(message) => eprintln!("{message}"),
                }
            }
            log::debug!("Console input closed");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, TryRecvError};
    use std::io::Cursor;

    #[test]
    fn test_parses_control_commands() {
        assert_eq!(
            parse_line("start").unwrap(),
            Some(ConsoleInput::Control(ControlCommand::Start))
        );
        assert_eq!(
            parse_line("  STOP ").unwrap(),
            Some(ConsoleInput::Control(ControlCommand::Stop))
        );
        assert_eq!(
            parse_line("scan").unwrap(),
            Some(ConsoleInput::Control(ControlCommand::Scan))
        );
        assert_eq!(
            parse_line("quit").unwrap(),
            Some(ConsoleInput::Control(ControlCommand::Shutdown))
        );
    }

    #[test]
    fn test_parses_camera_selection() {
        assert_eq!(
            parse_line("camera 1").unwrap(),
            Some(ConsoleInput::Control(ControlCommand::SelectCamera(1)))
        );
        assert!(parse_line("camera").is_err());
        assert!(parse_line("camera front").is_err());
        assert!(parse_line("camera -1").is_err());
    }

    #[test]
    fn test_blank_line_is_ignored() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_unknown_command_mentions_help() {
        let err = parse_line("unlock").unwrap_err();
        assert!(err.contains("unlock"));
        assert!(err.contains(HELP));
    }

    #[test]
    fn test_camera_listing() {
        let listing = camera_listing();
        assert!(listing.contains("0 (Main Camera)"));
        assert!(listing.contains("1 (External Camera)"));
    }

    #[test]
    fn test_end_of_input_does_not_shut_down() {
        let (tx, rx) = unbounded();
        let input = Cursor::new(b"camera 1\nbogus\nstart\n".to_vec());

        spawn_reader(input, tx).unwrap().join().unwrap();

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![ControlCommand::SelectCamera(1), ControlCommand::Start]
        );
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn test_quit_is_forwarded() {
        let (tx, rx) = unbounded();
        let input = Cursor::new(b"quit\n".to_vec());
        spawn_reader(input, tx).unwrap().join().unwrap();
        assert_eq!(rx.try_recv(), Ok(ControlCommand::Shutdown));
    }
}
