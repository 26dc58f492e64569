//! The UI renders the navigator session into something visible.
//!
//! The outline pane shows every entry as a tree using box-drawing characters, with a marker for
//! collapsed headings. The detail pane shows the breadcrumb and the body text of the entry under
//! the cursor. The bottom line is the help bar, the last status message, or the command buffer.

use crate::outline::Outline;
use crate::paragraph::Paragraph as DocParagraph;
use crate::section::Section;
use crate::session::SessionState;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const HELP: &str = "↑/↓: Move | ←/→: Parent/Child | Space: Fold | Enter: Select | h: Highlight | \
b: Bold | c: Comment | :q Quit";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Which input the navigator is reading.
pub enum View {
    #[default]
    /// Outline navigation keys.
    Outline,
    /// Typing a `:` command.
    Command,
}

#[derive(Debug, Default)]
/// Render-only state kept next to the session.
pub struct UiState {
    /// Current input mode.
    pub view: View,
    /// Command text typed so far, without the leading `:`.
    pub command_buffer: String,
    /// Paragraph text from the latest read, for the detail pane.
    pub paragraphs: Vec<DocParagraph>,
}

impl UiState {
    /// Switches to command mode with `initial` already typed.
    pub fn start_command(&mut self, initial: &str) {
        self.view = View::Command;
        self.command_buffer.clear();
        self.command_buffer.push_str(initial);
    }

    /// Leaves command mode and returns the typed command.
    pub fn take_command(&mut self) -> String {
        self.view = View::Outline;
        std::mem::take(&mut self.command_buffer)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One line of the outline pane.
pub struct OutlineRow {
    /// Box-drawing prefix.
    pub prefix: String,
    /// Fold marker and title.
    pub label: String,
    /// Whether a collapsed ancestor hides this entry's text in the document.
    pub folded: bool,
}

/// Renders the session.
pub fn draw(f: &mut Frame, session: &SessionState, ui: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);

    draw_outline(f, session, panes[0]);
    draw_detail(f, session, ui, panes[1]);

    let bottom = match ui.view {
        View::Command => Paragraph::new(format!(":{}", ui.command_buffer))
            .block(Block::default().borders(Borders::ALL).title("Command")),
        View::Outline => Paragraph::new(session.message.clone().unwrap_or_else(|| HELP.to_string()))
            .block(Block::default().borders(Borders::ALL)),
    };
    f.render_widget(bottom, rows[1]);
}

fn draw_outline(f: &mut Frame, session: &SessionState, area: ratatui::layout::Rect) {
    let outline = &session.outline;
    let title = if outline.has_headings() {
        format!("Outline ({} headings)", outline.headings().count())
    } else {
        "Outline (no headings)".to_string()
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if outline.is_empty() {
        let empty = Paragraph::new("Document is empty").block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = outline_rows(outline)
        .into_iter()
        .zip(&outline.sections)
        .map(|(row, section)| {
            let style = if row.folded {
                Style::default().fg(Color::DarkGray)
            } else if section.is_heading() {
                heading_style(section.level)
            } else {
                Style::default().add_modifier(Modifier::ITALIC)
            };
            ListItem::new(Line::from(vec![
                Span::raw(row.prefix),
                Span::styled(row.label, style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(session.current));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_detail(f: &mut Frame, session: &SessionState, ui: &UiState, area: ratatui::layout::Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let breadcrumb = session.outline.breadcrumb(session.current).join(" > ");
    let crumb = Paragraph::new(breadcrumb)
        .block(Block::default().borders(Borders::ALL).title("Navigation"));
    f.render_widget(crumb, chunks[0]);

    let (title, lines) = match session.current_section() {
        Some(section) => (
            format!("¶{} ({} body)", section.index, section.body.len()),
            detail_lines(section, &ui.paragraphs),
        ),
        None => ("Section".to_string(), Vec::new()),
    };
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(body, chunks[1]);
}

fn detail_lines(section: &Section, paragraphs: &[DocParagraph]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if !section.is_heading() {
        if let Some(own) = paragraphs.get(section.index) {
            lines.push(Line::from(own.text.clone()));
        }
    }
    for &index in &section.body {
        if let Some(p) = paragraphs.get(index) {
            lines.push(Line::from(p.text.clone()));
            lines.push(Line::default());
        }
    }
    lines
}

fn heading_style(level: u8) -> Style {
    let color = match level {
        1 => Color::Cyan,
        2 => Color::Blue,
        3 => Color::Green,
        _ => Color::Gray,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Generate box-drawing prefix for tree structure
#[must_use]
pub fn tree_prefix(depth: usize, is_last: bool, parent_states: &[bool]) -> String {
    if depth == 0 {
        return String::new();
    }

    let mut prefix = String::new();

    for i in 0..depth.saturating_sub(1) {
        if parent_states.get(i).copied().unwrap_or(false) {
            prefix.push_str("│   ");
        } else {
            prefix.push_str("    ");
        }
    }

    if is_last {
        prefix.push_str("└── ");
    } else {
        prefix.push_str("├── ");
    }

    prefix
}

/// Lays out the outline pane, one row per outline entry.
#[must_use]
pub fn outline_rows(outline: &Outline) -> Vec<OutlineRow> {
    let sections = &outline.sections;
    let depths: Vec<usize> = (0..sections.len()).map(|p| depth(outline, p)).collect();

    // Last child of its parent; top-level entries count as children of a virtual root.
    let is_last: Vec<bool> = sections
        .iter()
        .enumerate()
        .map(|(pos, s)| match s.parent {
            Some(parent) => sections[parent].subsections.last() == Some(&pos),
            None => !sections[pos + 1..].iter().any(|next| next.parent.is_none()),
        })
        .collect();

    let mut parent_has_siblings: Vec<bool> = Vec::new();
    sections
        .iter()
        .enumerate()
        .map(|(pos, section)| {
            let depth = depths[pos];
            parent_has_siblings.truncate(depth);
            while parent_has_siblings.len() < depth {
                parent_has_siblings.push(false);
            }
            if let Some(slot) = depth.checked_sub(1) {
                parent_has_siblings[slot] = !is_last[pos];
            }

            let marker = match (section.is_heading(), section.expansion.is_expanded()) {
                (false, _) => "¶",
                (true, true) => "▾",
                (true, false) => "▸",
            };
            let label = if section.is_heading() {
                format!("{marker} {}", section.title)
            } else {
                format!("{marker} {}", preview(&section.title))
            };

            OutlineRow {
                prefix: tree_prefix(depth, is_last[pos], &parent_has_siblings),
                label,
                folded: folded(outline, pos),
            }
        })
        .collect()
}

fn depth(outline: &Outline, position: usize) -> usize {
    std::iter::successors(outline.parent(position), |&p| outline.parent(p)).count()
}

fn folded(outline: &Outline, position: usize) -> bool {
    std::iter::successors(outline.parent(position), |&p| outline.parent(p))
        .any(|p| !outline.sections[p].expansion.is_expanded())
}

fn preview(text: &str) -> String {
    const WIDTH: usize = 40;
    if text.chars().count() <= WIDTH {
        text.to_string()
    } else {
        let cut: String = text.chars().take(WIDTH).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
#[path = "tests/ui.rs"]
mod tests;
