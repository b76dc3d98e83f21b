//! Line-oriented command console.
//!
//! Each input line is either a JSON-encoded [`Command`] or [`PointerEvent`],
//! or a short word command such as `add`, `text <node> <label>` or
//! `key ctrl+z`. Nodes are named by `root`, `.` (first selected) or a unique
//! prefix of their id.

use crate::shortcuts::parse_chord;
use kurbo::{Point, Size};
use mindink_core::tree;
use mindink_core::{
    Command, EdgeKind, EdgeStylePatch, Editor, Modifiers, Node, NodeId, NodePatch, PointerEvent,
    ROOT_ID, SerializableColor,
};
use std::fmt::Write;
use thiserror::Error;

/// Errors from parsing a console line.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("no node matches `{0}`")]
    UnknownNode(String),
    #[error("`{0}` matches more than one node")]
    AmbiguousNode(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("invalid color `{0}`, expected #rgb or #rrggbb")]
    InvalidColor(String),
    #[error("invalid key chord `{0}`")]
    InvalidChord(String),
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    /// Print the visible outline.
    Show,
    Save,
    Quit,
    Execute(Command),
    Key { key: String, modifiers: Modifiers },
    Pointer(PointerEvent),
    /// Fit the view to the content for a screen of this size.
    Fit(Size),
    /// Drag a node so its top-left lands on `to`, optionally dropping it
    /// onto another node.
    Drag {
        node: NodeId,
        to: Point,
        onto: Option<NodeId>,
    },
}

/// Screen size assumed by `fit` without arguments.
pub const DEFAULT_VIEWPORT: Size = Size::new(1280.0, 800.0);

pub const HELP: &str = "\
Commands:
  show                       print the outline
  add [node]                 add a child (default: first selected)
  select <node>...           replace the selection
  toggle <node>              toggle a node in the selection
  text <node> <label>        rename a node
  notes <node> [text]        set or clear notes
  open-notes <node>          toggle the notes panel
  color <node> <#hex|none>   set the background color
  font <node> <size|none>    set the font size
  width <node> <px>          set the node width
  icon <node> <name>         toggle an icon
  label <node> [text]        set or clear the edge label
  dashed <node>              toggle a dashed edge
  straight|curved <node>     set the edge shape
  collapse <node>            collapse or expand
  move <node> <x> <y>        set a node position
  drag <node> <x> <y> [onto <node>]
  fit [width height]         fit the view to the content (default 1280x800)
  delete | copy | cut | paste | undo | redo | preview
  key <chord>                press a shortcut, e.g. key ctrl+z
  save | quit
Any line starting with `{` is read as a JSON command or pointer event.";

/// Parse one console line against the current editor state.
pub fn parse_line(line: &str, editor: &Editor) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line.starts_with('{') {
        return parse_json(line).map(Some);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();
    let node_arg = |index: usize| -> Result<NodeId, ConsoleError> {
        let name = args.get(index).ok_or(ConsoleError::MissingArgument("node"))?;
        resolve_node(name, editor)
    };
    let rest = |from: usize| args.get(from..).map(|words| words.join(" ")).unwrap_or_default();
    let patch = |patch: NodePatch| -> Result<ConsoleCommand, ConsoleError> {
        Ok(ConsoleCommand::Execute(Command::Patch {
            id: node_arg(0)?,
            patch,
        }))
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => ConsoleCommand::Help,
        "show" | "ls" => ConsoleCommand::Show,
        "save" => ConsoleCommand::Save,
        "quit" | "exit" => ConsoleCommand::Quit,
        "undo" => ConsoleCommand::Execute(Command::Undo),
        "redo" => ConsoleCommand::Execute(Command::Redo),
        "delete" | "rm" => ConsoleCommand::Execute(Command::DeleteSelection),
        "copy" => ConsoleCommand::Execute(Command::Copy),
        "cut" => ConsoleCommand::Execute(Command::Cut),
        "paste" => ConsoleCommand::Execute(Command::Paste),
        "preview" => ConsoleCommand::Execute(Command::TogglePreview),
        "add" => {
            let parent = match args.first() {
                Some(name) => resolve_node(name, editor)?,
                None => editor.selection().first().unwrap_or(ROOT_ID),
            };
            ConsoleCommand::Execute(Command::AddChild { parent })
        }
        "select" => {
            let ids = args
                .iter()
                .map(|name| resolve_node(name, editor))
                .collect::<Result<Vec<_>, _>>()?;
            ConsoleCommand::Execute(Command::SetSelection { ids })
        }
        "toggle" => ConsoleCommand::Execute(Command::ToggleSelection { id: node_arg(0)? }),
        "collapse" => ConsoleCommand::Execute(Command::ToggleCollapse { id: node_arg(0)? }),
        "open-notes" => ConsoleCommand::Execute(Command::ToggleNotes { id: node_arg(0)? }),
        "text" => {
            let text = rest(1);
            if text.is_empty() {
                return Err(ConsoleError::MissingArgument("text"));
            }
            patch(NodePatch::Text(text))?
        }
        "notes" => patch(NodePatch::Notes(rest(1)))?,
        "label" => {
            let label = rest(1);
            patch(NodePatch::EdgeLabel((!label.is_empty()).then_some(label)))?
        }
        "icon" => {
            let icon = args.get(1).ok_or(ConsoleError::MissingArgument("icon"))?;
            patch(NodePatch::ToggleIcon(icon.to_string()))?
        }
        "color" => {
            let value = args.get(1).ok_or(ConsoleError::MissingArgument("color"))?;
            let color = if value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(
                    SerializableColor::from_hex(value)
                        .ok_or_else(|| ConsoleError::InvalidColor(value.to_string()))?,
                )
            };
            patch(NodePatch::BackgroundColor(color))?
        }
        "font" => {
            let value = args.get(1).ok_or(ConsoleError::MissingArgument("size"))?;
            let size = if value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(parse_number(value)?)
            };
            patch(NodePatch::FontSize(size))?
        }
        "width" => {
            let value = args.get(1).ok_or(ConsoleError::MissingArgument("width"))?;
            patch(NodePatch::Width(parse_number(value)?))?
        }
        "move" => {
            let point = parse_point(&args, 1)?;
            patch(NodePatch::Position(point))?
        }
        "dashed" => ConsoleCommand::Execute(Command::SetEdgeStyle {
            id: node_arg(0)?,
            patch: EdgeStylePatch::ToggleDashed,
        }),
        "straight" | "curved" => {
            let kind = if verb.eq_ignore_ascii_case("straight") {
                EdgeKind::Straight
            } else {
                EdgeKind::Curved
            };
            ConsoleCommand::Execute(Command::SetEdgeStyle {
                id: node_arg(0)?,
                patch: EdgeStylePatch::Kind(kind),
            })
        }
        "drag" => {
            let node = node_arg(0)?;
            let to = parse_point(&args, 1)?;
            let onto = match args.get(3) {
                Some(word) if word.eq_ignore_ascii_case("onto") => Some(node_arg(4)?),
                Some(_) => return Err(ConsoleError::UnknownCommand(rest(3))),
                None => None,
            };
            ConsoleCommand::Drag { node, to, onto }
        }
        "fit" => {
            let viewport = if args.is_empty() {
                DEFAULT_VIEWPORT
            } else {
                let corner = parse_point(&args, 0)?;
                Size::new(corner.x, corner.y)
            };
            ConsoleCommand::Fit(viewport)
        }
        "key" => {
            let chord = args.first().ok_or(ConsoleError::MissingArgument("key chord"))?;
            let (key, modifiers) =
                parse_chord(chord).ok_or_else(|| ConsoleError::InvalidChord(chord.to_string()))?;
            ConsoleCommand::Key { key, modifiers }
        }
        other => return Err(ConsoleError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_json(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    match serde_json::from_str::<Command>(line) {
        Ok(command) => Ok(ConsoleCommand::Execute(command)),
        Err(command_error) => match serde_json::from_str::<PointerEvent>(line) {
            Ok(event) => Ok(ConsoleCommand::Pointer(event)),
            Err(_) => Err(ConsoleError::Json(command_error)),
        },
    }
}

fn parse_number(value: &str) -> Result<f64, ConsoleError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConsoleError::InvalidNumber(value.to_string()))
}

fn parse_point(args: &[&str], from: usize) -> Result<Point, ConsoleError> {
    let x = args.get(from).ok_or(ConsoleError::MissingArgument("x"))?;
    let y = args.get(from + 1).ok_or(ConsoleError::MissingArgument("y"))?;
    Ok(Point::new(parse_number(x)?, parse_number(y)?))
}

/// Short display form of an id.
pub fn short_id(id: NodeId) -> String {
    if id == ROOT_ID {
        return "root".to_string();
    }
    id.simple().to_string()[..8].to_string()
}

/// Resolve `root`, `.` or an id prefix to a node of the current document.
pub fn resolve_node(name: &str, editor: &Editor) -> Result<NodeId, ConsoleError> {
    if name.eq_ignore_ascii_case("root") {
        return Ok(ROOT_ID);
    }
    if name == "." {
        return editor
            .selection()
            .first()
            .ok_or(ConsoleError::MissingArgument("selection"));
    }
    let prefix = name.to_ascii_lowercase().replace('-', "");
    let mut matches = tree::flatten_all(editor.document())
        .into_iter()
        .map(|node| node.id)
        .filter(|id| id.simple().to_string().starts_with(&prefix));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (Some(_), Some(_)) => Err(ConsoleError::AmbiguousNode(name.to_string())),
        (None, _) => Err(ConsoleError::UnknownNode(name.to_string())),
    }
}

/// Render the visible tree as an indented outline.
pub fn render_outline(editor: &Editor) -> String {
    let mut out = String::new();
    if editor.is_preview() {
        out.push_str("(preview)\n");
    }
    outline_node(editor, editor.document(), 0, &mut out);
    if let Some(node) = editor.active_notes() {
        let _ = writeln!(
            out,
            "notes [{}]: {}",
            short_id(node.id),
            node.notes.as_deref().unwrap_or("")
        );
    }
    out
}

fn outline_node(editor: &Editor, node: &Node, depth: usize, out: &mut String) {
    let marker = if !node.has_children() {
        " "
    } else if node.is_collapsed {
        "+"
    } else {
        "-"
    };
    let selected = if editor.selection().contains(node.id) { "*" } else { " " };
    let icon = node.icon.as_deref().map(|i| format!(" ({})", i)).unwrap_or_default();
    let label = node
        .edge_label
        .as_deref()
        .map(|l| format!("  <{}>", l))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{}{}{} [{}] {}{} @ ({:.0}, {:.0}){}",
        "  ".repeat(depth),
        selected,
        marker,
        short_id(node.id),
        node.text,
        icon,
        node.position.x,
        node.position.y,
        label,
    );
    if node.is_collapsed {
        return;
    }
    for child in &node.children {
        outline_node(editor, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str, editor: &Editor) -> ConsoleCommand {
        parse_line(line, editor).unwrap().unwrap()
    }

    #[test]
    fn test_blank_and_comment_lines() {
        let editor = Editor::new();
        assert!(parse_line("   ", &editor).unwrap().is_none());
        assert!(parse_line("# note", &editor).unwrap().is_none());
    }

    #[test]
    fn test_add_defaults_to_selection_then_root() {
        let mut editor = Editor::new();
        assert_eq!(
            parse("add", &editor),
            ConsoleCommand::Execute(Command::AddChild { parent: ROOT_ID })
        );
        let child = editor.add_child(ROOT_ID).unwrap();
        assert_eq!(
            parse("add", &editor),
            ConsoleCommand::Execute(Command::AddChild { parent: child })
        );
    }

    #[test]
    fn test_resolve_by_prefix() {
        let mut editor = Editor::new();
        let child = editor.add_child(ROOT_ID).unwrap();
        let prefix = short_id(child);
        assert_eq!(resolve_node(&prefix, &editor).unwrap(), child);
        assert_eq!(resolve_node(".", &editor).unwrap(), child);
        assert_eq!(resolve_node("ROOT", &editor).unwrap(), ROOT_ID);
        assert!(matches!(
            resolve_node("zzzz", &editor),
            Err(ConsoleError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_text_patch() {
        let editor = Editor::new();
        assert_eq!(
            parse("text root Big idea", &editor),
            ConsoleCommand::Execute(Command::Patch {
                id: ROOT_ID,
                patch: NodePatch::Text("Big idea".into()),
            })
        );
        assert!(matches!(
            parse_line("text root", &editor),
            Err(ConsoleError::MissingArgument("text"))
        ));
    }

    #[test]
    fn test_color_and_numbers() {
        let editor = Editor::new();
        assert_eq!(
            parse("color root #ff0000", &editor),
            ConsoleCommand::Execute(Command::Patch {
                id: ROOT_ID,
                patch: NodePatch::BackgroundColor(Some(SerializableColor::new(255, 0, 0, 255))),
            })
        );
        assert!(matches!(
            parse_line("color root red", &editor),
            Err(ConsoleError::InvalidColor(_))
        ));
        assert!(matches!(
            parse_line("width root wide", &editor),
            Err(ConsoleError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_drag_onto() {
        let mut editor = Editor::new();
        let child = editor.add_child(ROOT_ID).unwrap();
        let line = format!("drag {} 420 320 onto root", short_id(child));
        assert_eq!(
            parse(&line, &editor),
            ConsoleCommand::Drag {
                node: child,
                to: Point::new(420.0, 320.0),
                onto: Some(ROOT_ID),
            }
        );
    }

    #[test]
    fn test_json_lines() {
        let editor = Editor::new();
        assert_eq!(parse(r#"{"type":"redo"}"#, &editor), ConsoleCommand::Execute(Command::Redo));
        assert!(matches!(
            parse(r#"{"type":"cancel"}"#, &editor),
            ConsoleCommand::Pointer(PointerEvent::Cancel)
        ));
        assert!(matches!(
            parse_line(r#"{"type":"bogus"}"#, &editor),
            Err(ConsoleError::Json(_))
        ));
    }

    #[test]
    fn test_fit_viewport() {
        let editor = Editor::new();
        assert_eq!(parse("fit", &editor), ConsoleCommand::Fit(DEFAULT_VIEWPORT));
        assert_eq!(
            parse("fit 800 600", &editor),
            ConsoleCommand::Fit(Size::new(800.0, 600.0))
        );
        assert!(matches!(
            parse_line("fit 800", &editor),
            Err(ConsoleError::MissingArgument("y"))
        ));
    }

    #[test]
    fn test_key_chord() {
        let editor = Editor::new();
        match parse("key ctrl+z", &editor) {
            ConsoleCommand::Key { key, modifiers } => {
                assert_eq!(key, "z");
                assert!(modifiers.ctrl);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_outline() {
        let mut editor = Editor::new();
        let child = editor.add_child(ROOT_ID).unwrap();
        editor.patch_node(child, &NodePatch::Text("Leaf".into()));
        let outline = render_outline(&editor);
        let lines: Vec<_> = outline.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[root] Central Topic @ (400, 300)"));
        assert!(lines[1].starts_with("  *"));
        assert!(lines[1].contains("Leaf"));

        editor.toggle_collapse(ROOT_ID);
        assert_eq!(render_outline(&editor).lines().count(), 1);
    }
}
