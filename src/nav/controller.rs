//! Keystroke routing and session orchestration.
//!
//! [`Navigator`] owns every piece of mutable interaction state: the current
//! view, pane focus, the input line, the child-list window, the palette, and
//! the action runner. Keys are routed by mode (palette first, then focused
//! pane); anything that touches the forest or the engine becomes an
//! [`Action`] launched through the runner, and its outcome is folded back in
//! on the next poll.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::{ArborError, Result};

use super::command::{self, SlashCommand, Submission};
use super::effects::{EffectContext, EffectOutcome, ViewModel};
use super::input::TextInput;
use super::palette::{CommandAction, CommandItem, Palette, PaletteSignal, PaletteState};
use super::runner::{ActionRunner, SessionStatus};
use super::window::ScrollWindow;
use super::{Action, Focus, SiblingDir};

/// What the event loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep running.
    Continue,
    /// Tear down and exit.
    Quit,
}

/// Session orchestrator and sole writer of interaction state.
#[derive(Debug)]
pub struct Navigator {
    ctx: Arc<EffectContext>,
    view: ViewModel,
    focus: Focus,
    window: ScrollWindow,
    input: TextInput,
    palette: Palette,
    runner: ActionRunner,
    notice: Option<String>,
    child_rows: usize,
}

impl Navigator {
    /// Build a navigator over an initial view.
    pub fn new(
        ctx: Arc<EffectContext>,
        view: ViewModel,
        child_rows: usize,
        debug: bool,
    ) -> Result<Self> {
        if child_rows == 0 {
            return Err(ArborError::InvalidConfig {
                message: "ui.child_rows must be at least 1".to_string(),
            });
        }

        Ok(Self {
            ctx,
            view,
            focus: Focus::Input,
            window: ScrollWindow::new(),
            input: TextInput::new(),
            palette: Palette::new(),
            runner: ActionRunner::new(debug),
            notice: None,
            child_rows,
        })
    }

    /// The current view.
    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    /// Which pane has focus.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Child-list window state.
    pub fn window(&self) -> &ScrollWindow {
        &self.window
    }

    /// The input line.
    pub fn input(&self) -> &TextInput {
        &self.input
    }

    /// The palette.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Session status.
    pub fn status(&self) -> &SessionStatus {
        self.runner.status()
    }

    /// Transient notice from the last completed action, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Rows available to the child list.
    pub fn child_rows(&self) -> usize {
        self.child_rows
    }

    /// Whether an action is in flight.
    pub fn is_loading(&self) -> bool {
        self.runner.is_loading()
    }

    /// Route one keystroke.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Step> {
        if self.palette.is_open() {
            return self.handle_palette_key(key);
        }
        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::Children => self.handle_children_key(key),
        }
    }

    /// Fold in the pending action's outcome, if it has finished.
    ///
    /// Called from the event loop on every tick; cheap when nothing is
    /// pending.
    pub async fn poll_effects(&mut self) -> Result<Step> {
        let Some(handle) = self.runner.take_finished() else {
            return Ok(Step::Continue);
        };

        match self.runner.finish(handle.await) {
            Some(EffectOutcome::View(view)) => self.apply_view(*view)?,
            Some(EffectOutcome::Notice(notice)) => self.notice = Some(notice),
            // Failure is already in the status
            None => {}
        }
        Ok(Step::Continue)
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<Step> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Step::Quit),
            (KeyModifiers::CONTROL, KeyCode::Char('p')) => self.open_palette(),
            (KeyModifiers::ALT, KeyCode::Up) => self.go_parent(),
            (KeyModifiers::ALT, KeyCode::Left) => self.go_sibling(SiblingDir::Prev),
            (KeyModifiers::ALT, KeyCode::Right) => self.go_sibling(SiblingDir::Next),
            (_, KeyCode::Down) => self.focus_children()?,
            (_, KeyCode::Enter) => return self.submit(),
            (_, KeyCode::Backspace) => self.input.backspace(),
            (_, KeyCode::Delete) => self.input.delete(),
            (_, KeyCode::Left) => self.input.move_left(),
            (_, KeyCode::Right) => self.input.move_right(),
            (_, KeyCode::Home) => self.input.move_home(),
            (_, KeyCode::End) => self.input.move_end(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => self.input.insert(c),
            _ => {}
        }
        Ok(Step::Continue)
    }

    fn handle_children_key(&mut self, key: KeyEvent) -> Result<Step> {
        let count = self.view.children.len();
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Step::Quit),
            (KeyModifiers::CONTROL, KeyCode::Char('p')) => self.open_palette(),
            (_, KeyCode::Down) => {
                self.window.advance(count);
                self.window.reconcile(count, self.child_rows)?;
            }
            (_, KeyCode::Up) => {
                self.window.retreat();
                self.window.reconcile(count, self.child_rows)?;
                // Retreating past the first child exits back to the input
                if self.window.focus().is_none() {
                    self.focus = Focus::Input;
                }
            }
            (_, KeyCode::Esc) => {
                self.window.escape();
                self.window.reconcile(count, self.child_rows)?;
                self.focus = Focus::Input;
            }
            (_, KeyCode::Enter) => self.select_child(),
            _ => {}
        }
        Ok(Step::Continue)
    }

    fn handle_palette_key(&mut self, key: KeyEvent) -> Result<Step> {
        match self.palette.state() {
            PaletteState::Picking { .. } => self.handle_picking_key(key),
            PaletteState::Naming { .. } => self.handle_naming_key(key),
            PaletteState::Closed => Ok(Step::Continue),
        }
    }

    fn handle_picking_key(&mut self, key: KeyEvent) -> Result<Step> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Step::Quit),
            (KeyModifiers::CONTROL, KeyCode::Char('p')) | (_, KeyCode::Esc) => {
                self.palette.close();
            }
            (_, KeyCode::Up) => self.palette.move_selection(-1),
            (_, KeyCode::Down) => self.palette.move_selection(1),
            (_, KeyCode::Enter) => return self.confirm_pick(),
            (_, KeyCode::Backspace) => {
                let catalog = self.catalog();
                self.palette.pop_char(catalog);
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                let catalog = self.catalog();
                self.palette.push_char(c, catalog);
            }
            _ => {}
        }
        Ok(Step::Continue)
    }

    fn handle_naming_key(&mut self, key: KeyEvent) -> Result<Step> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Step::Quit),
            (_, KeyCode::Esc) => self.palette.close(),
            (_, KeyCode::Enter) => self.confirm_name(),
            (_, KeyCode::Backspace) => self.palette.pop_title_char(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                self.palette.push_title_char(c);
            }
            _ => {}
        }
        Ok(Step::Continue)
    }

    /// Submit the input line as a message or a slash command.
    fn submit(&mut self) -> Result<Step> {
        if self.runner.is_loading() {
            return Ok(Step::Continue);
        }
        let line = self.input.text().trim().to_string();
        if line.is_empty() {
            return Ok(Step::Continue);
        }

        match command::parse_submission(&line) {
            Ok(Submission::Say(text)) => {
                self.input.take();
                self.launch(Action::Say(text));
            }
            Ok(Submission::Command(cmd)) => {
                self.input.take();
                return self.run_command(cmd);
            }
            // Keep the line so the typo can be fixed
            Err(err) => self.runner.fail(err.to_string()),
        }
        Ok(Step::Continue)
    }

    fn run_command(&mut self, cmd: SlashCommand) -> Result<Step> {
        match cmd {
            SlashCommand::Generate(count) => {
                let count = count.unwrap_or(self.ctx.generation_count);
                self.launch(Action::Generate { count });
            }
            SlashCommand::Up => self.go_parent(),
            SlashCommand::Left => self.go_sibling(SiblingDir::Prev),
            SlashCommand::Right => self.go_sibling(SiblingDir::Next),
            SlashCommand::Save(title) => self.launch(Action::SaveBookmark { title }),
            SlashCommand::Exit => return Ok(Step::Quit),
        }
        Ok(Step::Continue)
    }

    fn go_parent(&mut self) {
        // No-op at the root
        if let Some(parent) = self.view.node.parent_id.clone() {
            self.launch(Action::Enter(parent));
        }
    }

    fn go_sibling(&mut self, dir: SiblingDir) {
        if self.view.node.parent_id.is_some() {
            self.launch(Action::Sibling(dir));
        }
    }

    fn focus_children(&mut self) -> Result<()> {
        if self.view.children.is_empty() {
            return Ok(());
        }
        self.focus = Focus::Children;
        self.window.advance(self.view.children.len());
        self.window
            .reconcile(self.view.children.len(), self.child_rows)
    }

    fn select_child(&mut self) {
        let Some(index) = self.window.focus() else {
            return;
        };
        if let Some(child) = self.view.children.get(index) {
            let id = child.id.clone();
            self.focus = Focus::Input;
            self.window.escape();
            self.launch(Action::Enter(id));
        }
    }

    fn open_palette(&mut self) {
        self.notice = None;
        let catalog = self.catalog();
        self.palette.open(catalog);
    }

    fn confirm_pick(&mut self) -> Result<Step> {
        let Some(item) = self.palette.selected_item().cloned() else {
            self.palette.close();
            return Ok(Step::Continue);
        };

        // Close first, then execute
        self.palette.close();
        match item.action {
            CommandAction::Dispatch(PaletteSignal::BeginNaming) => self.palette.begin_naming(),
            CommandAction::Dispatch(PaletteSignal::Quit) => return Ok(Step::Quit),
            CommandAction::Effect(action) => self.launch(action),
        }
        Ok(Step::Continue)
    }

    fn confirm_name(&mut self) {
        let Some(title) = self.palette.title() else {
            return;
        };
        let title = title.trim().to_string();
        if title.is_empty() {
            // The palette stays open so a title can still be entered
            self.runner.fail("Bookmark title cannot be empty");
            return;
        }
        self.palette.close();
        self.launch(Action::SaveBookmark { title });
    }

    /// The full command catalog for the current position.
    ///
    /// Rebuilt on every palette keystroke so bookmark entries always match
    /// the store.
    fn catalog(&self) -> Vec<CommandItem> {
        let mut items = vec![
            CommandItem::effect(
                "generate",
                "Generate replies",
                Action::Generate {
                    count: self.ctx.generation_count,
                },
            ),
            CommandItem::dispatch("save-bookmark", "Save bookmark here", PaletteSignal::BeginNaming),
            CommandItem::effect(
                "copy-message",
                "Copy current message",
                Action::CopyText(self.view.node.message.content.clone()),
            ),
            CommandItem::effect("go-root", "Go to root", Action::Enter(self.view.root().id.clone())),
        ];
        if self.view.node.parent_id.is_some() {
            items.push(CommandItem::effect(
                "delete-branch",
                "Delete current branch",
                Action::DeleteBranch,
            ));
        }
        for (title, bookmark) in self.ctx.bookmarks.read().iter() {
            items.push(CommandItem::effect(
                format!("bookmark:{title}"),
                format!("Load bookmark: {title}"),
                Action::Enter(bookmark.node_id.clone()),
            ));
        }
        items.push(CommandItem::dispatch("quit", "Quit", PaletteSignal::Quit));
        items
    }

    /// Start an action unless one is already in flight.
    fn launch(&mut self, action: Action) {
        if self.runner.is_loading() {
            return;
        }
        self.notice = None;
        self.runner
            .launch(self.ctx.clone(), self.view.node.id.clone(), action);
    }

    fn apply_view(&mut self, view: ViewModel) -> Result<()> {
        let moved = view.node.id != self.view.node.id;
        self.view = view;

        // A new position means a new child list; focus starts over
        if moved {
            self.window.escape();
        }
        self.window
            .reconcile(self.view.children.len(), self.child_rows)?;
        if self.focus == Focus::Children && self.window.focus().is_none() {
            self.focus = Focus::Input;
        }
        Ok(())
    }
}
