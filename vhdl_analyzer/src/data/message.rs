// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2019, Olof Kraigher olof.kraigher@gmail.com

use std::fmt;
use std::path::Path;

/// Severity of a message about the configuration or the project,
/// as opposed to a [Diagnostic](super::Diagnostic) about the design.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MessageType {
    Error,
    Warning,
    Log,
}

#[must_use]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Message {
    pub message_type: MessageType,
    pub message: String,
}

impl Message {
    pub fn log(message: impl Into<String>) -> Message {
        Message {
            message_type: MessageType::Log,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Message {
        Message {
            message_type: MessageType::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Message {
        Message {
            message_type: MessageType::Error,
            message: message.into(),
        }
    }

    /// An error about one of the files of a library
    pub fn file_error(message: impl fmt::Display, file_name: &Path) -> Message {
        Message::error(format!("{message} (In file {})", file_name.display()))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.message_type {
            MessageType::Error => "error",
            MessageType::Warning => "warning",
            MessageType::Log => "log",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

pub trait MessageHandler {
    fn push(&mut self, message: Message);
}

impl MessageHandler for Vec<Message> {
    fn push(&mut self, message: Message) {
        Vec::push(self, message)
    }
}

/// Forwards messages to the `log` facade
#[derive(Default)]
pub struct MessageLogger;

impl MessageHandler for MessageLogger {
    fn push(&mut self, message: Message) {
        let level = match message.message_type {
            MessageType::Error => log::Level::Error,
            MessageType::Warning => log::Level::Warn,
            MessageType::Log => log::Level::Debug,
        };
        log::log!(level, "{}", message.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_message() {
        assert_eq!(Message::warning("careful").to_string(), "warning: careful");
        assert_eq!(
            Message::file_error("broken", Path::new("a.toml")).to_string(),
            "error: broken (In file a.toml)"
        );
    }
}
