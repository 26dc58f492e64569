//! sectional: navigate a document by its headings and operate on whole sections.
#![allow(clippy::multiple_crate_versions)]

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use sectional::config::Config;
use sectional::credentials::{ApiConfig, CredentialStore, FileCredentialStore, API_KEY};
use sectional::document::{DocumentHost, FontFormat};
use sectional::edit_plan::EditPlan;
use sectional::error::OperationError;
use sectional::formats::{format_by_name, format_for_path, Format};
use sectional::memory::MemoryDocument;
use sectional::operations::{Effect, Extent, HeadingScope, OperationReport, SectionOperations};
use sectional::outline::Outline;
use sectional::resolve::SectionRange;
use sectional::section::Section;
use sectional::session::SessionState;
use sectional::transform::{run_transform, transform_paragraph, HttpTransform, TransformKind};
use sectional::ui::{self, UiState, View};
use simplelog::WriteLogger;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long to wait for a key before checking the refresh timer.
const TICK: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "sectional")]
#[command(about = "Heading outlines and section operations for paragraph documents", long_about = None)]
struct Args {
    /// Document to open (markdown or JSON paragraph records)
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Source format, overriding the file extension
    #[arg(long, short = 'f', value_name = "FORMAT")]
    format: Option<String>,

    /// Replay an edit plan from a JSON file before starting
    #[arg(long)]
    load_plan: Option<PathBuf>,

    /// Print the outline as JSON and exit
    #[arg(long)]
    outline: bool,

    /// Log file
    #[arg(long, default_value = "sectional.log")]
    log_file: PathBuf,

    /// Log level, overriding the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Where `:w` writes the edit plan
    #[arg(long, default_value = "edit-plan.json")]
    plan_out: PathBuf,

    /// Credential store for the text-transform API key
    #[arg(long, default_value = "credentials.json")]
    credentials: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = Config::load()?;

    // Override config with command line args
    if let Some(level) = &args.log_level {
        cfg.log_level.clone_from(level);
    }

    WriteLogger::init(
        cfg.level_filter(),
        simplelog::Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("creating log file {}", args.log_file.display()))?,
    )?;

    let format = choose_format(&args, &cfg)?;
    let source = fs::read_to_string(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let doc = MemoryDocument::new(format.parse(&source)?);
    info!("opened {} as {}", args.path.display(), format.name());

    if let Some(plan_path) = &args.load_plan {
        let plan = EditPlan::load(plan_path)
            .with_context(|| format!("loading edit plan {}", plan_path.display()))?;
        let report = plan.replay(&doc).await?;
        if report.failed > 0 {
            warn!("{} edit(s) from the loaded plan did not apply", report.failed);
        }
    }

    let ops = SectionOperations::new(&doc, cfg.visibility_styles());
    let outline = ops.outline().await?;

    if args.outline {
        println!("{}", serde_json::to_string_pretty(&outline)?);
        return Ok(());
    }

    let store = FileCredentialStore::new(&args.credentials);
    let api = ApiConfig::from_store(&store, &cfg)?;
    info!(
        "text transforms {} (model {})",
        if api.is_configured() { "configured" } else { "not configured" },
        api.model
    );

    let ui_state = UiState {
        paragraphs: doc.paragraphs().await?,
        ..UiState::default()
    };
    let mut app = App {
        doc: &doc,
        ops,
        session: SessionState::new(outline, cfg.refresh_wait()),
        ui: ui_state,
        cfg: &cfg,
        store,
        api,
        transport: HttpTransform::new(),
        suggestions: None,
        plan_out: args.plan_out.clone(),
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    let plan = doc.edit_plan().await;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn choose_format(args: &Args, cfg: &Config) -> Result<Box<dyn Format>> {
    if let Some(name) = &args.format {
        return Ok(format_by_name(name)?);
    }
    let ext = args
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !cfg.file_extensions.iter().any(|allowed| allowed == ext) {
        bail!(
            "{} does not match the configured extensions ({}); pass --format",
            args.path.display(),
            cfg.file_extensions.join(", ")
        );
    }
    Ok(format_for_path(&args.path)?)
}

/// Key-driven navigation over the outline; `None` when `key` is not a movement key.
fn navigation_target(outline: &Outline, pos: usize, key: KeyEvent) -> Option<Option<usize>> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let target = match key.code {
        KeyCode::Up if shift => outline.prev_sibling(pos),
        KeyCode::Up | KeyCode::Char('k') => pos.checked_sub(1),
        KeyCode::Down if shift => outline.next_sibling(pos),
        KeyCode::Down | KeyCode::Char('j') => Some(pos + 1),
        KeyCode::Left => outline.parent(pos),
        KeyCode::Right => outline.next_descendant(pos),
        KeyCode::Home if shift => outline.first_at_level(pos),
        KeyCode::Home => outline.first(),
        KeyCode::End if shift => outline.last_at_level(pos),
        KeyCode::End => outline.last(),
        _ => return None,
    };
    Some(target)
}

/// Paragraph a text transform works on: the first body paragraph under a heading, otherwise the
/// entry's own paragraph.
fn transform_target(section: &Section) -> usize {
    if section.is_heading() {
        section.body.first().copied().unwrap_or(section.index)
    } else {
        section.index
    }
}

struct App<'a> {
    doc: &'a MemoryDocument,
    ops: SectionOperations<'a, MemoryDocument>,
    session: SessionState,
    ui: UiState,
    cfg: &'a Config,
    store: FileCredentialStore,
    api: ApiConfig,
    transport: HttpTransform,
    /// Output of the last `:suggest`, with the paragraph it was made for.
    suggestions: Option<(usize, String)>,
    plan_out: PathBuf,
}

impl App<'_> {
    async fn run<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, &self.session, &self.ui))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && !self.handle_key(key).await {
                        return Ok(());
                    }
                }
            } else if self.session.debounce.poll(Instant::now()) {
                self.reload().await;
            }
        }
    }

    /// Returns `false` when the navigator should exit.
    async fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.ui.view == View::Command {
            return self.handle_command_key(key).await;
        }

        if let Some(target) = navigation_target(&self.session.outline, self.session.current, key)
        {
            self.session.jump(target);
            return true;
        }

        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Char(' ') => self.toggle().await,
            KeyCode::Enter => self.navigate().await,
            KeyCode::Char('h') => {
                let color = self.cfg.highlight_color.clone();
                self.apply(&Effect::Highlight(Some(color))).await;
            }
            KeyCode::Char('b') => {
                let bold = FontFormat {
                    bold: Some(true),
                    ..FontFormat::default()
                };
                self.apply(&Effect::Font(bold)).await;
            }
            KeyCode::Char('w') => self.wrap(true).await,
            KeyCode::Char('u') => self.wrap(false).await,
            KeyCode::Char('r') => self.reload().await,
            KeyCode::Char('c') => self.ui.start_command("comment "),
            KeyCode::Char(':') => self.ui.start_command(""),
            KeyCode::Esc => self.session.message = None,
            _ => {}
        }
        true
    }

    async fn handle_command_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => self.ui.command_buffer.push(c),
            KeyCode::Backspace => {
                self.ui.command_buffer.pop();
            }
            KeyCode::Esc => {
                self.ui.take_command();
            }
            KeyCode::Enter => {
                let cmd = self.ui.take_command();
                return self.run_command(&cmd).await;
            }
            _ => {}
        }
        true
    }

    async fn run_command(&mut self, cmd: &str) -> bool {
        let cmd = cmd.trim();
        let (name, arg) = cmd
            .split_once(' ')
            .map_or((cmd, ""), |(name, arg)| (name, arg.trim()));

        match name {
            "q" | "q!" => return false,
            "w" => {
                let path = if arg.is_empty() {
                    self.plan_out.clone()
                } else {
                    PathBuf::from(arg)
                };
                self.save_plan(&path).await;
            }
            "r" => self.reload().await,
            "comment" if !arg.is_empty() => self.comment(arg).await,
            "critique" if !arg.is_empty() => self.critique(arg).await,
            "clear" => match self.session.clear_critiques(&self.ops).await {
                Ok(removed) => self.session.message = Some(format!("Removed {removed} critique(s)")),
                Err(err) => self.fail(&err).await,
            },
            "highlight" => {
                let color = match arg {
                    "" => Some(self.cfg.highlight_color.clone()),
                    "none" => None,
                    other => Some(other.to_string()),
                };
                self.apply(&Effect::Highlight(color)).await;
            }
            "key" if !arg.is_empty() => {
                self.session.message = Some(match self.store.set(API_KEY, arg) {
                    Ok(()) => {
                        self.api.api_key = Some(arg.to_string());
                        "API key saved".to_string()
                    }
                    Err(err) => format!("Error: {err}"),
                });
            }
            "fix" => self.transform(&TransformKind::FixGrammar).await,
            "summarize" => self.transform(&TransformKind::Summarize).await,
            "rewrite" if !arg.is_empty() => {
                let style = arg.to_string();
                self.transform(&TransformKind::Rewrite { style }).await;
            }
            "suggest" => self.suggest(&TransformKind::SuggestChanges).await,
            "quick" => self.suggest(&TransformKind::QuickSuggestion).await,
            "apply" => match self.suggestions.clone() {
                Some((index, suggestions)) => {
                    let kind = TransformKind::ApplySuggestions { suggestions };
                    if self.transform_at(index, &kind).await {
                        self.suggestions = None;
                    }
                }
                None => self.session.message = Some("No suggestions; run :suggest first".to_string()),
            },
            _ => self.session.message = Some(format!("Unknown command: {cmd}")),
        }
        true
    }

    async fn reload(&mut self) {
        if let Err(err) = self.session.reload(&self.ops).await {
            warn!("reload failed: {err}");
            self.session.message = Some(format!("Error: {err}"));
            return;
        }
        match self.doc.paragraphs().await {
            Ok(paragraphs) => self.ui.paragraphs = paragraphs,
            Err(err) => warn!("paragraph read failed: {err}"),
        }
    }

    async fn fail(&mut self, err: &OperationError) {
        if err.is_stale() {
            self.reload().await;
        }
        self.session.message = Some(format!("Error: {err}"));
    }

    async fn finish(&mut self, verb: &str, result: Result<OperationReport, OperationError>) {
        match result {
            Ok(report) if report.is_complete() => {
                self.session.message = Some(format!("{verb} {} paragraph(s)", report.affected));
                self.reload().await;
            }
            Ok(report) => {
                self.session.message = Some(format!(
                    "{verb} {} paragraph(s); {} rejected",
                    report.affected,
                    report.failed.len()
                ));
                self.reload().await;
            }
            Err(err) => self.fail(&err).await,
        }
    }

    async fn toggle(&mut self) {
        let position = self.session.current;
        if self
            .session
            .toggle_section(&self.ops, position)
            .await
            .is_ok()
        {
            self.reload().await;
        }
    }

    async fn navigate(&mut self) {
        let Some(key) = self.session.current_key() else {
            return;
        };
        let result = self.ops.navigate_to_heading(&key).await;
        if result.is_ok() {
            self.session.debounce.on_selection_changed(Instant::now());
        }
        self.finish("Selected", result).await;
    }

    async fn apply(&mut self, effect: &Effect) {
        let Some(key) = self.session.current_key() else {
            return;
        };
        let result = self
            .ops
            .apply_to_heading(&key, Extent::Full, effect, HeadingScope::Default)
            .await;
        self.finish("Updated", result).await;
    }

    async fn comment(&mut self, text: &str) {
        let Some(index) = self.session.current_section().map(|s| s.index) else {
            return;
        };
        let range = SectionRange {
            start: index,
            end: index,
        };
        let result = self
            .ops
            .apply_to_section(
                range,
                &Effect::Comment(text.to_string()),
                HeadingScope::IncludeHeadings,
            )
            .await;
        self.finish("Commented on", result).await;
    }

    async fn critique(&mut self, text: &str) {
        let Some(index) = self.session.current_section().map(|s| s.index) else {
            return;
        };
        match self.session.add_critique(&self.ops, index, text).await {
            Ok(critique) => {
                self.session.message = Some(format!("Added critique {}", critique.id));
            }
            Err(err) => self.fail(&err).await,
        }
    }

    async fn transform(&mut self, kind: &TransformKind) {
        let Some(index) = self.session.current_section().map(transform_target) else {
            return;
        };
        self.transform_at(index, kind).await;
    }

    /// Returns whether the paragraph was rewritten.
    async fn transform_at(&mut self, index: usize, kind: &TransformKind) -> bool {
        match transform_paragraph(&self.ops, &self.transport, &self.api, kind, index).await {
            Ok(_) => {
                self.session.message = Some(format!("Rewrote paragraph {index}"));
                self.reload().await;
                true
            }
            Err(err) => {
                self.fail(&err).await;
                false
            }
        }
    }

    /// Shows transform output in the status line without touching the document.
    async fn suggest(&mut self, kind: &TransformKind) {
        let Some(index) = self.session.current_section().map(transform_target) else {
            return;
        };
        let result = match self.ops.paragraph_text(index).await {
            Ok(text) => run_transform(&self.transport, &self.api, kind, &text)
                .await
                .map_err(OperationError::from),
            Err(err) => Err(err),
        };
        match result {
            Ok(output) => {
                self.session.message = Some(output.replace('\n', " | "));
                if *kind == TransformKind::SuggestChanges {
                    self.suggestions = Some((index, output));
                }
            }
            Err(err) => self.fail(&err).await,
        }
    }

    async fn wrap(&mut self, wrap: bool) {
        let Some(key) = self.session.current_key() else {
            return;
        };
        let result = if wrap {
            self.ops.wrap_section(&key).await
        } else {
            self.ops.unwrap_section(&key).await
        };
        match result {
            Ok(true) if wrap => self.session.message = Some(format!("Wrapped \"{}\"", key.title)),
            Ok(true) => self.session.message = Some(format!("Unwrapped \"{}\"", key.title)),
            Ok(false) => self.session.message = Some("Nothing to change".to_string()),
            Err(err) => self.fail(&err).await,
        }
    }

    async fn save_plan(&mut self, path: &Path) {
        let plan = self.doc.edit_plan().await;
        self.session.message = Some(match plan.save(path) {
            Ok(()) => format!("Wrote {} edit(s) to {}", plan.len(), path.display()),
            Err(err) => format!("Error saving: {err}"),
        });
    }
}
