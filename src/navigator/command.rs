//! Operator commands read from the interactive channel.

use std::fmt;
use std::io::{self, BufRead};

use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Empty line: give a direction right now.
    Immediate,
    /// Pick a new target direction.
    Change,
    /// Enter highway mode.
    Highway,
    /// Merged onto a new highway (highway mode only).
    New,
    /// Left the highway (highway mode only).
    Exit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Command::Immediate,
            "change" => Command::Change,
            "highway" => Command::Highway,
            "new" => Command::New,
            "exit" => Command::Exit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Immediate => f.write_str("<enter>"),
            Command::Change => f.write_str("change"),
            Command::Highway => f.write_str("highway"),
            Command::New => f.write_str("new"),
            Command::Exit => f.write_str("exit"),
            Command::Unknown(text) => f.write_str(text),
        }
    }
}

/// Forwards each line of `reader` to `tx`, without its line ending, until end of
/// input or until the receiver is gone.
///
/// Bytes that are not valid UTF-8 are replaced rather than treated as an error, so a
/// garbled line still reaches [`Command::parse`] and is reported as unknown. Blocks
/// on a full channel; call it from a plain thread.
pub fn forward_lines<R: BufRead>(mut reader: R, tx: &mpsc::Sender<String>) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if tx.blocking_send(line).is_err() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarded(input: &[u8]) -> Vec<String> {
        let (tx, mut rx) = mpsc::channel(16);
        forward_lines(input, &tx).expect("input read");
        drop(tx);
        let mut lines = Vec::new();
        while let Some(line) = rx.blocking_recv() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn parses_known_tokens() {
        assert_eq!(Command::parse(""), Command::Immediate);
        assert_eq!(Command::parse("\r\n"), Command::Immediate);
        assert_eq!(Command::parse("change\n"), Command::Change);
        assert_eq!(Command::parse("highway"), Command::Highway);
        assert_eq!(Command::parse(" new "), Command::New);
        assert_eq!(Command::parse("exit"), Command::Exit);
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(Command::parse("Highway"), Command::Unknown("Highway".into()));
        assert_eq!(Command::parse("left please"), Command::Unknown("left please".into()));
    }

    #[test]
    fn garbled_line_does_not_end_input() {
        let lines = forwarded(b"change\n\xff\xfe\r\nhighway\n\nexit");

        assert_eq!(lines.len(), 5);
        assert_eq!(Command::parse(&lines[0]), Command::Change);
        assert_eq!(
            Command::parse(&lines[1]),
            Command::Unknown("\u{FFFD}\u{FFFD}".into())
        );
        assert_eq!(Command::parse(&lines[2]), Command::Highway);
        assert_eq!(Command::parse(&lines[3]), Command::Immediate);
        assert_eq!(Command::parse(&lines[4]), Command::Exit);
    }

    #[test]
    fn stops_quietly_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        forward_lines(&b"change\nhighway\n"[..], &tx).expect("closed receiver is not an error");
    }
}
