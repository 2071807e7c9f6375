// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::io::{self, BufRead, BufReader, Read};

use super::LineSource;

/// Splits a byte stream into lines. A read that times out yields whatever
/// partial line arrived before the timeout, which is usually an empty line.
pub struct LineReader<R> {
    reader: BufReader<R>,
    partial: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R) -> LineReader<R> {
        LineReader {
            reader: BufReader::new(reader),
            partial: Vec::new(),
        }
    }

    /// Takes the accumulated bytes as a line without its terminator.
    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.partial)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        self.partial.clear();
        line
    }
}

impl<R: Read + Send> LineSource for LineReader<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        match self.reader.read_until(b'\n', &mut self.partial) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(self.take_line())),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(Some(self.take_line()))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// A reader that replays a fixed script of reads and errors.
    struct Scripted {
        steps: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Scripted {
        fn new(steps: Vec<io::Result<&[u8]>>) -> Scripted {
            Scripted {
                steps: steps
                    .into_iter()
                    .map(|step| step.map(|bytes| bytes.to_vec()))
                    .collect(),
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.steps.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn timeout() -> io::Error {
        io::Error::new(io::ErrorKind::TimedOut, "Operation timed out")
    }

    #[test]
    fn test_splits_lines() {
        let mut reader = LineReader::new(&b"3\r\n12\nabc\n"[..]);

        assert_eq!(reader.read_line().unwrap(), Some("3".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("12".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("abc".to_string()));
        assert_eq!(reader.read_line().unwrap(), None);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut reader = LineReader::new(&b"1\n26"[..]);

        assert_eq!(reader.read_line().unwrap(), Some("1".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("26".to_string()));
        assert_eq!(reader.read_line().unwrap(), None);
    }

    #[test]
    fn test_timeout_yields_empty_line() {
        let mut reader = LineReader::new(Scripted::new(vec![Err(timeout()), Ok(&b"4\n"[..])]));

        assert_eq!(reader.read_line().unwrap(), Some(String::new()));
        assert_eq!(reader.read_line().unwrap(), Some("4".to_string()));
    }

    #[test]
    fn test_timeout_yields_partial_line() {
        let mut reader = LineReader::new(Scripted::new(vec![
            Ok(&b"1"[..]),
            Err(timeout()),
            Ok(&b"5\n"[..]),
        ]));

        assert_eq!(reader.read_line().unwrap(), Some("1".to_string()));
        assert_eq!(reader.read_line().unwrap(), Some("5".to_string()));
    }

    #[test]
    fn test_interrupted_is_retried() {
        let mut reader = LineReader::new(Scripted::new(vec![
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
            Ok(&b"7\n"[..]),
        ]));

        assert_eq!(reader.read_line().unwrap(), Some("7".to_string()));
    }

    #[test]
    fn test_hard_error_propagates() {
        let mut reader = LineReader::new(Scripted::new(vec![Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "device unplugged",
        ))]));

        assert_eq!(
            reader.read_line().unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut reader = LineReader::new(&b"\xff2\n"[..]);
        assert_eq!(reader.read_line().unwrap(), Some("\u{fffd}2".to_string()));
    }
}
