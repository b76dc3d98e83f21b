//! Application shell: owns the editor, routes input and keeps the session saved.

use crate::console::{self, ConsoleCommand, HELP};
use crate::shortcuts::{ShortcutAction, ShortcutRegistry};
use kurbo::{Point, Vec2};
#[cfg(not(target_arch = "wasm32"))]
use mindink_core::storage::FileStorage;
use mindink_core::storage::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS, Storage, StorageError};
use mindink_core::tree::find_node;
use mindink_core::{Command, ConfigError, Editor, EditorConfig, Modifiers, NodeId, PointerEvent};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming a JSON editor configuration file.
pub const CONFIG_ENV: &str = "MINDINK_CONFIG";
/// Environment variable overriding the session directory.
pub const DATA_DIR_ENV: &str = "MINDINK_DATA_DIR";

/// Screen margin kept around the content by `fit`.
const FIT_PADDING: f64 = 40.0;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub editor: EditorConfig,
    pub autosave_interval_secs: u64,
    /// Where sessions are stored. `None` uses the platform data directory.
    pub storage_dir: Option<PathBuf>,
    /// Named session saved alongside the last-session slot.
    pub session_id: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            storage_dir: None,
            session_id: None,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `MINDINK_CONFIG` and `MINDINK_DATA_DIR`.
    /// A config file that fails to load is reported and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            match EditorConfig::load(&path) {
                Ok(editor) => {
                    log::info!("Loaded editor config from {}", path);
                    config.editor = editor;
                }
                Err(e) => log::warn!("Ignoring config file {}: {}", path, e),
            }
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            config.storage_dir = Some(PathBuf::from(dir));
        }
        config
    }
}

/// Main application struct.
pub struct App<S: Storage> {
    editor: Editor,
    autosave: AutoSaveManager<S>,
}

impl<S: Storage> App<S> {
    pub fn new(editor: Editor, storage: Arc<S>, config: &AppConfig) -> Self {
        let mut autosave = AutoSaveManager::new(storage);
        autosave.set_interval(Duration::from_secs(config.autosave_interval_secs));
        autosave.set_session_id(config.session_id.clone());
        Self { editor, autosave }
    }

    /// Start from the last saved session, or a fresh map when there is none
    /// or it does not hold a valid document.
    pub async fn restore(storage: Arc<S>, config: &AppConfig) -> Self {
        let mut app = Self::new(Editor::with_config(config.editor.clone()), storage, config);
        if let Some(state) = app.autosave.load_last().await {
            match Editor::from_session(state, config.editor.clone()) {
                Ok(editor) => {
                    log::info!(
                        "Restored session ({} history entries)",
                        editor.history().len()
                    );
                    app.editor = editor;
                }
                Err(e) => log::warn!("Discarding unreadable session: {}", e),
            }
        }
        app
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    /// Run a command, marking the session dirty when anything changed.
    pub fn execute(&mut self, command: Command) -> bool {
        let changed = self.editor.execute(command);
        if changed {
            self.autosave.mark_dirty();
        }
        changed
    }

    /// Dispatch a key press through the shortcut registry.
    /// Returns whether a shortcut handled it.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let Some(action) = ShortcutRegistry::lookup(key, modifiers) else {
            log::debug!("No shortcut for {:?} {:?}", key, modifiers);
            return false;
        };
        if action == ShortcutAction::CancelGesture {
            return self.editor.cancel_gesture();
        }
        match action.to_command(&self.editor) {
            Some(command) => self.execute(command),
            None => false,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let changed = self.editor.handle_pointer(event);
        if changed {
            self.autosave.mark_dirty();
        }
        changed
    }

    /// Drag `node` so its top-left corner ends near `to`, then drop it.
    /// With `onto` set the drop targets that node, otherwise whatever lies
    /// under the pointer.
    pub fn drag_node(&mut self, node: NodeId, to: Point, onto: Option<NodeId>) -> bool {
        let Some(start) = find_node(self.editor.document(), node).map(|n| n.position) else {
            return false;
        };
        let grab = Vec2::new(1.0, 1.0);
        self.handle_pointer(PointerEvent::Down {
            position: start + grab,
            target: Some(node),
            modifiers: Modifiers::NONE,
        });
        self.handle_pointer(PointerEvent::Move {
            position: to + grab,
            target: onto,
        });
        self.handle_pointer(PointerEvent::Up {
            position: to + grab,
        })
    }

    /// Save if the session is dirty and the interval has elapsed.
    pub async fn tick(&mut self) -> Result<bool, AppError> {
        let session = self.editor.to_session();
        Ok(self.autosave.maybe_save(&session).await?)
    }

    pub async fn save(&mut self) -> Result<(), AppError> {
        let session = self.editor.to_session();
        self.autosave.save(&session).await?;
        Ok(())
    }

    /// Read console lines until `quit` or end of input, saving before exit.
    pub async fn run_console<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<(), AppError> {
        writeln!(output, "{}", console::render_outline(&self.editor))?;
        for line in input.lines() {
            let line = line?;
            let parsed = match console::parse_line(&line, &self.editor) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(output, "error: {}", e)?;
                    continue;
                }
            };
            match parsed {
                ConsoleCommand::Quit => break,
                ConsoleCommand::Help => {
                    writeln!(output, "{}\n\n{}", HELP, ShortcutRegistry::help_text())?
                }
                ConsoleCommand::Fit(viewport) => {
                    self.editor.zoom_to_fit(viewport, FIT_PADDING);
                    let view = self.editor.view();
                    writeln!(
                        output,
                        "view: offset ({:.1}, {:.1}) scale {:.2}",
                        view.x, view.y, view.scale
                    )?;
                }
                ConsoleCommand::Show => write!(output, "{}", console::render_outline(&self.editor))?,
                ConsoleCommand::Save => {
                    self.save().await?;
                    writeln!(output, "saved")?;
                }
                other => {
                    let changed = self.apply(other);
                    if !changed {
                        writeln!(output, "(no change)")?;
                    }
                    write!(output, "{}", console::render_outline(&self.editor))?;
                }
            }
            if let Err(e) = self.tick().await {
                log::warn!("Auto-save failed: {}", e);
            }
        }
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }

    /// Apply an editing line. Returns whether anything changed.
    fn apply(&mut self, command: ConsoleCommand) -> bool {
        match command {
            ConsoleCommand::Execute(command) => self.execute(command),
            ConsoleCommand::Key { key, modifiers } => self.handle_key(&key, modifiers),
            ConsoleCommand::Pointer(event) => self.handle_pointer(event),
            ConsoleCommand::Drag { node, to, onto } => self.drag_node(node, to, onto),
            ConsoleCommand::Help
            | ConsoleCommand::Fit(_)
            | ConsoleCommand::Show
            | ConsoleCommand::Save
            | ConsoleCommand::Quit => false,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl App<FileStorage> {
    /// Run the console application on stdin and stdout.
    pub async fn run() -> Result<(), AppError> {
        let config = AppConfig::from_env();
        let storage = match &config.storage_dir {
            Some(dir) => FileStorage::new(dir.clone())?,
            None => FileStorage::default_location()?,
        };
        log::info!("Sessions stored in {}", storage.base_path().display());

        let mut app = Self::restore(Arc::new(storage), &config).await;
        println!("MindInk console. Type `help` for commands.");
        let stdin = std::io::stdin();
        app.run_console(stdin.lock(), std::io::stdout()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindink_core::storage::{LAST_SESSION_KEY, MemoryStorage};
    use mindink_core::{NodePatch, ROOT_ID};

    fn test_app() -> App<MemoryStorage> {
        App::new(
            Editor::new(),
            Arc::new(MemoryStorage::new()),
            &AppConfig::default(),
        )
    }

    #[test]
    fn test_execute_marks_dirty() {
        let mut app = test_app();
        assert!(!app.is_dirty());
        assert!(!app.execute(Command::Undo));
        assert!(!app.is_dirty());
        assert!(app.execute(Command::AddChild { parent: ROOT_ID }));
        assert!(app.is_dirty());
    }

    #[test]
    fn test_shortcuts_drive_editor() {
        let mut app = test_app();
        assert!(!app.handle_key("Tab", Modifiers::NONE));
        app.editor_mut().set_selection(vec![ROOT_ID]);
        assert!(app.handle_key("Tab", Modifiers::NONE));
        assert_eq!(app.editor().document().children.len(), 1);
        assert!(app.handle_key("z", Modifiers::CTRL));
        assert!(app.editor().document().children.is_empty());
        assert!(!app.handle_key("q", Modifiers::NONE));
    }

    #[test]
    fn test_escape_cancels_drag() {
        let mut app = test_app();
        let child = app.editor_mut().add_child(ROOT_ID).unwrap();
        let before = Arc::clone(app.editor().document());
        let start = find_node(app.editor().document(), child).unwrap().position;
        app.handle_pointer(PointerEvent::Down {
            position: start + Vec2::new(1.0, 1.0),
            target: Some(child),
            modifiers: Modifiers::NONE,
        });
        app.handle_pointer(PointerEvent::Move {
            position: Point::new(900.0, 900.0),
            target: None,
        });
        assert!(app.handle_key("Escape", Modifiers::NONE));
        assert_eq!(app.editor().document(), &before);
    }

    #[test]
    fn test_drag_node_onto() {
        let mut app = test_app();
        let a = app.editor_mut().add_child(ROOT_ID).unwrap();
        let b = app.editor_mut().add_child(ROOT_ID).unwrap();
        assert!(app.drag_node(b, Point::new(620.0, 420.0), Some(a)));
        let node = find_node(app.editor().document(), b).unwrap();
        assert_eq!(node.parent_id, Some(a));
    }

    #[test]
    fn test_save_and_restore() {
        let storage = Arc::new(MemoryStorage::new());
        let config = AppConfig::default();
        let mut app = App::new(Editor::new(), Arc::clone(&storage), &config);
        let child = app.editor_mut().add_child(ROOT_ID).unwrap();
        app.execute(Command::Patch {
            id: child,
            patch: NodePatch::Text("saved".into()),
        });
        pollster::block_on(app.save()).unwrap();
        assert!(!app.is_dirty());
        assert!(pollster::block_on(storage.exists(LAST_SESSION_KEY)).unwrap());

        let restored = pollster::block_on(App::restore(storage, &config));
        let node = find_node(restored.editor().document(), child).unwrap();
        assert_eq!(node.text, "saved");
        assert!(restored.editor().can_undo());
    }

    #[test]
    fn test_restore_without_session() {
        let restored = pollster::block_on(App::restore(
            Arc::new(MemoryStorage::new()),
            &AppConfig::default(),
        ));
        assert!(restored.editor().document().children.is_empty());
        assert!(!restored.editor().can_undo());
    }

    #[test]
    fn test_console_script() {
        let mut app = test_app();
        let script = "add root\ntext . Plan\nbogus\nundo\nhelp\nfit 1280 800\nquit\nadd\n";
        let mut out = Vec::new();
        pollster::block_on(app.run_console(script.as_bytes(), &mut out)).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Plan"));
        assert!(out.contains("error: unknown command `bogus`"));
        assert!(out.contains("Ctrl+Shift+Z"));
        assert!(out.contains("view: offset"));
        // quit stops before the trailing add; undo leaves the first child
        assert_eq!(app.editor().document().children.len(), 1);
        assert!(!app.is_dirty());
    }
}
