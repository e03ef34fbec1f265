//! Editor commands and their script syntax.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Script parse errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),
    #[error("Invalid number '{value}' for '{command}'")]
    InvalidNumber { command: &'static str, value: String },
    #[error("Unknown shape '{0}' (expected rect, circle, line, text or image)")]
    UnknownShape(String),
}

/// Object kinds the shell can place on a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Rect,
    Circle,
    Line,
    Text(String),
    /// Image by source URL or path.
    Image(String),
}

/// A single editor command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Append an empty slide.
    AddSlide,
    /// Delete the slide at a 1-based position.
    DeleteSlide(usize),
    /// Show the slide at a 1-based position.
    SelectSlide(usize),
    /// Add an object to the current slide.
    Add(ShapeKind),
    /// Select an object by id, or clear the selection.
    Pick(Option<String>),
    /// Delete the selected object.
    RemoveSelected,
    /// Move an object by an offset.
    Move { id: String, dx: f64, dy: f64 },
    /// Set an object's opacity.
    Opacity { id: String, value: f64 },
    /// Replace the text of a text object.
    EditText { id: String, text: String },
    /// Leave text editing mode.
    ExitText,
    Undo,
    Redo,
    /// Run the command bound to a keyboard shortcut.
    Key(String),
    /// Save to the document store, optionally under a new id.
    Save(Option<String>),
    /// Open a document from the store.
    Open(String),
    /// List documents in the store.
    List,
    /// Load a presentation file.
    Import(PathBuf),
    /// Write the presentation to a file.
    Export(PathBuf),
    /// Write the current slide as a PNG image.
    ExportPng(PathBuf),
    /// Print the deck and history state.
    Status,
    Help,
}

impl Command {
    /// Whether the command can change the presentation.
    pub fn modifies_document(&self) -> bool {
        !matches!(
            self,
            Command::Save(_)
                | Command::List
                | Command::Export(_)
                | Command::ExportPng(_)
                | Command::Status
                | Command::Help
                | Command::Pick(_)
        )
    }

    /// Parse one script line. Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        line.parse().map(Some)
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

fn required<'a>(command: &'static str, rest: &'a str) -> Result<(&'a str, &'a str), ParseError> {
    let (word, rest) = split_word(rest);
    if word.is_empty() {
        return Err(ParseError::MissingArgument(command));
    }
    Ok((word, rest))
}

fn number<T: FromStr>(command: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        command,
        value: value.to_string(),
    })
}

fn rest_text(command: &'static str, rest: &str) -> Result<String, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingArgument(command));
    }
    Ok(rest.to_string())
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (name, rest) = split_word(line);
        let command = match name {
            "add-slide" => Command::AddSlide,
            "delete-slide" => {
                let (n, _) = required("delete-slide", rest)?;
                Command::DeleteSlide(number("delete-slide", n)?)
            }
            "select" => {
                let (n, _) = required("select", rest)?;
                Command::SelectSlide(number("select", n)?)
            }
            "add" => {
                let (shape, rest) = required("add", rest)?;
                let kind = match shape {
                    "rect" => ShapeKind::Rect,
                    "circle" => ShapeKind::Circle,
                    "line" => ShapeKind::Line,
                    "text" if rest.is_empty() => ShapeKind::Text("Text".to_string()),
                    "text" => ShapeKind::Text(rest.to_string()),
                    "image" => ShapeKind::Image(rest_text("add image", rest)?),
                    other => return Err(ParseError::UnknownShape(other.to_string())),
                };
                Command::Add(kind)
            }
            "pick" => {
                let (id, _) = required("pick", rest)?;
                Command::Pick((id != "none").then(|| id.to_string()))
            }
            "remove" => Command::RemoveSelected,
            "move" => {
                let (id, rest) = required("move", rest)?;
                let (dx, rest) = required("move", rest)?;
                let (dy, _) = required("move", rest)?;
                Command::Move {
                    id: id.to_string(),
                    dx: number("move", dx)?,
                    dy: number("move", dy)?,
                }
            }
            "opacity" => {
                let (id, rest) = required("opacity", rest)?;
                let (value, _) = required("opacity", rest)?;
                Command::Opacity {
                    id: id.to_string(),
                    value: number("opacity", value)?,
                }
            }
            "edit-text" => {
                let (id, rest) = required("edit-text", rest)?;
                Command::EditText {
                    id: id.to_string(),
                    text: rest_text("edit-text", rest)?,
                }
            }
            "exit-text" => Command::ExitText,
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "key" => Command::Key(rest_text("key", rest)?),
            "save" => {
                let (id, _) = split_word(rest);
                Command::Save((!id.is_empty()).then(|| id.to_string()))
            }
            "open" => Command::Open(required("open", rest)?.0.to_string()),
            "list" => Command::List,
            "import" => Command::Import(PathBuf::from(rest_text("import", rest)?)),
            "export" => Command::Export(PathBuf::from(rest_text("export", rest)?)),
            "export-png" => Command::ExportPng(PathBuf::from(rest_text("export-png", rest)?)),
            "status" => Command::Status,
            "help" => Command::Help,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// One line per command, for `help`.
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("add-slide", "Append an empty slide"),
    ("delete-slide N", "Delete slide N"),
    ("select N", "Show slide N"),
    ("add rect|circle|line", "Add a shape"),
    ("add text [TEXT]", "Add a text box"),
    ("add image SRC", "Add an image"),
    ("pick ID|none", "Select an object or clear the selection"),
    ("remove", "Delete the selected object"),
    ("move ID DX DY", "Move an object"),
    ("opacity ID V", "Set an object's opacity (0-1)"),
    ("edit-text ID TEXT", "Replace the text of a text box"),
    ("exit-text", "Leave text editing"),
    ("undo / redo", "Step through the current slide's history"),
    ("key COMBO", "Press a keyboard shortcut, e.g. Ctrl+Z"),
    ("save [ID]", "Save to the document store"),
    ("open ID", "Open a stored document"),
    ("list", "List stored documents"),
    ("import FILE", "Load a presentation file"),
    ("export FILE", "Write the presentation to a file"),
    ("export-png FILE", "Write the current slide as PNG"),
    ("status", "Show deck and history state"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("add-slide".parse(), Ok(Command::AddSlide));
        assert_eq!("undo".parse(), Ok(Command::Undo));
        assert_eq!("  redo  ".trim().parse(), Ok(Command::Redo));
        assert_eq!("select 3".parse(), Ok(Command::SelectSlide(3)));
        assert_eq!("delete-slide 2".parse(), Ok(Command::DeleteSlide(2)));
    }

    #[test]
    fn test_parse_shapes() {
        assert_eq!("add rect".parse(), Ok(Command::Add(ShapeKind::Rect)));
        assert_eq!(
            "add text Hello world".parse(),
            Ok(Command::Add(ShapeKind::Text("Hello world".to_string())))
        );
        assert_eq!("add text".parse(), Ok(Command::Add(ShapeKind::Text("Text".to_string()))));
        assert_eq!(
            "add star".parse::<Command>(),
            Err(ParseError::UnknownShape("star".to_string()))
        );
        assert_eq!(
            "add image".parse::<Command>(),
            Err(ParseError::MissingArgument("add image"))
        );
    }

    #[test]
    fn test_parse_object_commands() {
        assert_eq!(
            "move a1 10 -5.5".parse(),
            Ok(Command::Move {
                id: "a1".to_string(),
                dx: 10.0,
                dy: -5.5
            })
        );
        assert_eq!("pick none".parse(), Ok(Command::Pick(None)));
        assert_eq!("pick a1".parse(), Ok(Command::Pick(Some("a1".to_string()))));
        assert_eq!(
            "edit-text a1 New title".parse(),
            Ok(Command::EditText {
                id: "a1".to_string(),
                text: "New title".to_string()
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("select".parse::<Command>(), Err(ParseError::MissingArgument("select")));
        assert!(matches!(
            "select two".parse::<Command>(),
            Err(ParseError::InvalidNumber { command: "select", .. })
        ));
        assert_eq!(
            "frobnicate".parse::<Command>(),
            Err(ParseError::UnknownCommand("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_comments_and_blank_lines() {
        assert_eq!(Command::parse_line("   "), Ok(None));
        assert_eq!(Command::parse_line("# setup"), Ok(None));
        assert_eq!(Command::parse_line("save"), Ok(Some(Command::Save(None))));
        assert_eq!(
            Command::parse_line("export out/deck.json"),
            Ok(Some(Command::Export(PathBuf::from("out/deck.json"))))
        );
    }

    #[test]
    fn test_modifies_document() {
        assert!(Command::Undo.modifies_document());
        assert!(Command::AddSlide.modifies_document());
        assert!(!Command::Status.modifies_document());
        assert!(!Command::Save(None).modifies_document());
    }
}
