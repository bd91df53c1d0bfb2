//! Line commands accepted on stdin.
//!
//! One command per line, parsed with `winnow` 0.7. Free-text arguments
//! (names, sender, message) run to the end of the line.

use tinsel_core::id::DocId;
use tinsel_core::model::OrnamentKind;
use winnow::ascii::{float, space0, space1};
use winnow::combinator::{alt, eof, opt, preceded, terminated};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{rest, take_while};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SignIn { uid: String, name: Option<String> },
    SignOut,
    Drag {
        kind: OrnamentKind,
        existing: Option<DocId>,
    },
    Drop { x: f64, y: f64 },
    Zone {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
    Sender(String),
    Message(String),
    Confirm,
    Cancel,
    Open(DocId),
    Close,
    Delete,
    Link,
    List,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  sign-in <uid> [<name>]        sign in as <uid>
  sign-out
  drag <type> [<ornament-id>]   pick an ornament from the tray (1-8 or asset name), or a placed one
  drop <x> <y>                  drop at client coordinates
  zone <left> <top> <w> <h>     measure the drop zone
  sender <text>                 fill the sender field
  message <text>                fill the message field
  confirm | cancel              persist or discard the staged ornament
  open <ornament-id> | close    show or hide an ornament's message
  delete                        delete the open ornament
  link                          copy the tree's share link
  list                          print the ornaments on the tree
  quit";

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut input = line;
    command
        .parse_next(&mut input)
        .map_err(|_| format!("unrecognized command: '{}' (try 'help')", line.trim()))
}

fn command(input: &mut &str) -> ModalResult<Command> {
    skip_space(input);
    terminated(
        alt((
            sign_in,
            "sign-out".value(Command::SignOut),
            drag,
            drop_at,
            zone,
            preceded("sender", free_text).map(Command::Sender),
            preceded("message", free_text).map(Command::Message),
            "confirm".value(Command::Confirm),
            "cancel".value(Command::Cancel),
            preceded(("open", space1), parse_doc_id).map(Command::Open),
            "close".value(Command::Close),
            "delete".value(Command::Delete),
            "link".value(Command::Link),
            "list".value(Command::List),
            "help".value(Command::Help),
            alt(("quit", "exit")).value(Command::Quit),
        )),
        (space0, eof),
    )
    .parse_next(input)
}

// ─── Commands with arguments ─────────────────────────────────────────────

fn sign_in(input: &mut &str) -> ModalResult<Command> {
    preceded(("sign-in", space1), (parse_word, free_text))
        .map(|(uid, name)| Command::SignIn {
            uid: uid.to_string(),
            name: Some(name).filter(|n| !n.is_empty()),
        })
        .parse_next(input)
}

fn drag(input: &mut &str) -> ModalResult<Command> {
    preceded(
        ("drag", space1),
        (parse_kind, opt(preceded(space1, parse_doc_id))),
    )
    .map(|(kind, existing)| Command::Drag { kind, existing })
    .parse_next(input)
}

fn drop_at(input: &mut &str) -> ModalResult<Command> {
    preceded(
        ("drop", space1),
        (parse_number, preceded(space1, parse_number)),
    )
    .map(|(x, y)| Command::Drop { x, y })
    .parse_next(input)
}

fn zone(input: &mut &str) -> ModalResult<Command> {
    preceded(
        ("zone", space1),
        (
            parse_number,
            preceded(space1, parse_number),
            preceded(space1, parse_number),
            preceded(space1, parse_number),
        ),
    )
    .map(|(left, top, width, height)| Command::Zone {
        left,
        top,
        width,
        height,
    })
    .parse_next(input)
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn skip_space(input: &mut &str) {
    let _: Result<&str, winnow::error::ErrMode<ContextError>> = space0.parse_next(input);
}

fn parse_word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace()).parse_next(input)
}

/// The rest of the line after at least one space, trimmed. Empty when the
/// command ends right after its keyword.
fn free_text(input: &mut &str) -> ModalResult<String> {
    alt((preceded(space1, rest), eof))
        .map(|text: &str| text.trim().to_string())
        .parse_next(input)
}

fn parse_doc_id(input: &mut &str) -> ModalResult<DocId> {
    parse_word.map(DocId::intern).parse_next(input)
}

/// A palette number (`1`-`8`) or an asset name (`Ornament3.png`).
fn parse_kind(input: &mut &str) -> ModalResult<OrnamentKind> {
    parse_word
        .verify_map(|word: &str| match word.parse::<usize>() {
            Ok(n) => n
                .checked_sub(1)
                .and_then(|slot| OrnamentKind::ALL.get(slot).copied()),
            Err(_) => word.parse::<OrnamentKind>().ok(),
        })
        .parse_next(input)
}

fn parse_number(input: &mut &str) -> ModalResult<f64> {
    float.verify(|n: &f64| n.is_finite()).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_bare_keywords() {
        assert_eq!(parse_command("confirm"), Ok(Command::Confirm));
        assert_eq!(parse_command("  list  "), Ok(Command::List));
        assert_eq!(parse_command("sign-out"), Ok(Command::SignOut));
        assert_eq!(parse_command("exit"), Ok(Command::Quit));
    }

    #[test]
    fn parses_sign_in_with_and_without_name() {
        assert_eq!(
            parse_command("sign-in u1 Noel Frost"),
            Ok(Command::SignIn {
                uid: "u1".into(),
                name: Some("Noel Frost".into()),
            })
        );
        assert_eq!(
            parse_command("sign-in u1"),
            Ok(Command::SignIn {
                uid: "u1".into(),
                name: None,
            })
        );
    }

    #[test]
    fn parses_drag_by_slot_or_asset() {
        assert_eq!(
            parse_command("drag 3"),
            Ok(Command::Drag {
                kind: OrnamentKind::Ornament3,
                existing: None,
            })
        );
        assert_eq!(
            parse_command("drag Ornanent7.png o42"),
            Ok(Command::Drag {
                kind: OrnamentKind::Ornament7,
                existing: Some(DocId::intern("o42")),
            })
        );
        assert!(parse_command("drag 9").is_err());
        assert!(parse_command("drag Star.png").is_err());
    }

    #[test]
    fn parses_coordinates() {
        assert_eq!(
            parse_command("drop 200 -12.5"),
            Ok(Command::Drop { x: 200.0, y: -12.5 })
        );
        assert_eq!(
            parse_command("zone 100 50 400 200"),
            Ok(Command::Zone {
                left: 100.0,
                top: 50.0,
                width: 400.0,
                height: 200.0,
            })
        );
        assert!(parse_command("drop 200").is_err());
    }

    #[test]
    fn free_text_runs_to_end_of_line() {
        assert_eq!(
            parse_command("message  Merry Christmas, all! "),
            Ok(Command::Message("Merry Christmas, all!".into()))
        );
        assert_eq!(parse_command("sender"), Ok(Command::Sender(String::new())));
    }

    #[test]
    fn rejects_unknown_and_trailing_input() {
        assert!(parse_command("dance").is_err());
        assert!(parse_command("listing").is_err());
        assert!(parse_command("senderIvy").is_err());
        assert!(parse_command("confirm now").is_err());
    }
}
