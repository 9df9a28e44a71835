use std::{
    env, fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info};

use blocksplit::{
    BreakKeyEvent, Document, Editor, Settings, markup,
    viewport::LineViewport,
};

fn main() -> Result<()> {
    env_logger::init();
    run()
}

struct Args {
    settings: Option<PathBuf>,
    path: PathBuf,
}

fn parse_args() -> Result<Option<Args>> {
    let mut settings = None;
    let mut path = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                let Some(value) = args.next() else {
                    bail!("--settings needs a file name");
                };
                settings = Some(PathBuf::from(value));
            }
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg}"),
        }
    }
    Ok(path.map(|path| Args { settings, path }))
}

fn run() -> Result<()> {
    let Some(args) = parse_args()? else {
        eprintln!("Usage: blocksplit [--settings FILE] <file.html>");
        return Ok(());
    };

    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let editor = load_editor(&args.path, settings)?;
    let mut app = App::new(editor, args.path);

    enable_raw_mode().context("failed to enable raw mode")?;
    let res = app.run().context("application error");
    disable_raw_mode().ok();
    println!();

    res
}

fn load_editor(path: &PathBuf, settings: Settings) -> Result<Editor> {
    if !path.exists() {
        info!("{} does not exist, starting with an empty document", path.display());
        return Ok(Editor::new(Document::new(), settings));
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = markup::parse(&content).with_context(|| format!("failed to parse {}", path.display()))?;
    let editor = Editor::new(parsed.document, settings);
    Ok(match parsed.selection {
        Some(selection) => editor.with_selection(selection),
        None => editor,
    })
}

struct App {
    editor: Editor,
    file_path: PathBuf,
    should_quit: bool,
    status_message: Option<String>,
}

impl App {
    fn new(editor: Editor, file_path: PathBuf) -> Self {
        let (width, height) = terminal::size().unwrap_or((80, 24));
        let viewport = LineViewport::new(usize::from(width), i32::from(height));
        Self {
            editor: editor.with_viewport(Box::new(viewport)),
            file_path,
            should_quit: false,
            status_message: None,
        }
    }

    fn run(&mut self) -> Result<()> {
        self.draw()?;
        while !self.should_quit {
            let evt = event::read().context("failed to read event")?;
            if self.handle_event(evt)? {
                self.draw()?;
            }
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let selection = self.editor.selection();
        let contents = markup::serialize(self.editor.document(), Some(&selection));
        let mut stdout = io::stdout();
        write!(stdout, "\r\n{contents}\r\n").context("failed to write document")?;
        if let Some(message) = self.status_message.take() {
            write!(stdout, "-- {message}\r\n").context("failed to write status")?;
        }
        stdout.flush().context("failed to flush stdout")
    }

    /// Returns whether the document or status changed.
    fn handle_event(&mut self, event: Event) -> Result<bool> {
        let Event::Key(key) = event else {
            return Ok(false);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }

        if let Some(mut break_event) = BreakKeyEvent::from_key_event(&key) {
            let handled = self.editor.on_key_down(&mut break_event);
            debug!("enter handled: {handled}");
            return Ok(handled);
        }

        let KeyEvent {
            code, modifiers, ..
        } = key;
        match (code, modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('q'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                Ok(false)
            }
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
                self.save()?;
                Ok(true)
            }
            (KeyCode::Char('z'), KeyModifiers::CONTROL) => {
                if !self.editor.undo() {
                    self.status_message = Some("Nothing to undo".to_string());
                }
                Ok(true)
            }
            (KeyCode::Char('y'), KeyModifiers::CONTROL) => {
                if !self.editor.redo() {
                    self.status_message = Some("Nothing to redo".to_string());
                }
                Ok(true)
            }
            (KeyCode::Char(ch), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.editor.insert_text(ch.encode_utf8(&mut [0; 4]));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn save(&mut self) -> Result<()> {
        let contents = markup::serialize(self.editor.document(), None);
        fs::write(&self.file_path, contents)
            .with_context(|| format!("failed to write {}", self.file_path.display()))?;
        self.status_message = Some("Saved".to_string());
        Ok(())
    }
}
