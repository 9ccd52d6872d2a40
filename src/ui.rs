use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Padding, Paragraph},
};

use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn rounded_block(theme: &Theme, border: Color) -> Block<'static> {
  Block::bordered()
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border))
    .style(Style::default().bg(theme.bg))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, search_area, message_area, browser_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
    Constraint::Min(0),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_search(frame, app, search_area);
  render_message(frame, app, message_area);
  render_browser(frame, app, browser_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▶ clipseek ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let width = (version.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - width, width, ..area };
  frame.render_widget(right, right_area);
}

fn render_search(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let [input_area, button_area] = Layout::horizontal([Constraint::Min(10), Constraint::Length(18)]).areas(area);

  let focused = app.mode == AppMode::Input;
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = rounded_block(theme, border_color)
    .title(" Search ")
    .title_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let panel = &mut app.panel;
  let inner_w = input_area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&panel.query, panel.cursor);

  if cursor_col < panel.scroll {
    panel.scroll = cursor_col;
  } else if cursor_col >= panel.scroll + inner_w {
    // A box too narrow for any text still keeps the cursor column in view.
    panel.scroll = (cursor_col + 1).saturating_sub(inner_w.max(1));
  }

  let paragraph = if panel.query.is_empty() {
    Paragraph::new(Span::styled(constants().search_placeholder.as_str(), Style::default().fg(theme.muted)))
  } else {
    let scroll = panel.scroll;
    let visible: String = panel
      .query
      .chars()
      .scan(0usize, |col, c| {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        let start = *col;
        *col += w;
        Some((start, *col, c))
      })
      .skip_while(|(_, end, _)| *end <= scroll)
      .take_while(|(start, _, _)| *start < scroll + inner_w)
      .map(|(_, _, c)| c)
      .collect();
    Paragraph::new(visible).style(Style::default().fg(theme.fg))
  };
  frame.render_widget(paragraph.block(input_block), input_area);

  let button_style = if panel.is_pending() {
    Style::default().fg(theme.muted)
  } else {
    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
  };
  let button = Paragraph::new(Span::styled("Find Content", button_style))
    .alignment(Alignment::Center)
    .block(rounded_block(theme, theme.border));
  frame.render_widget(button, button_area);

  if focused && inner_w > 0 {
    let cursor_x = input_area.x + 2 + cursor_col.saturating_sub(panel.scroll) as u16;
    frame.set_cursor_position((cursor_x, input_area.y + 1));
  }
}

fn render_message(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let msg = app.panel.message();
  if msg.is_empty() {
    return;
  }
  let text = truncate_str(msg, area.width.saturating_sub(2) as usize);
  let line = Line::from(Span::styled(format!(" {}", text), Style::default().fg(theme.fg)));
  frame.render_widget(line, area);
}

fn render_browser(frame: &mut Frame, app: &App, area: Rect) {
  let Some(label) = app.browser.position_label() else {
    return;
  };
  let theme = app.theme();

  let [label_area, embed_area, controls_area, _] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(app.browser.embed_height()),
    Constraint::Length(3),
    Constraint::Min(0),
  ])
  .areas(area);

  let label =
    Line::from(Span::styled(format!(" {}", label), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)));
  frame.render_widget(label, label_area);

  render_embed(frame, app, embed_area);
  render_controls(frame, app, controls_area);
}

fn render_embed(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = rounded_block(theme, theme.border)
    .title(Span::styled(" Player ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)))
    .padding(Padding::horizontal(1));

  let Some(target) = app.current_target() else {
    frame.render_widget(block, area);
    return;
  };

  let inner_w = area.width.saturating_sub(4) as usize;
  let url = target.embed_url().map(|u| u.to_string()).unwrap_or_default();
  let playing_this =
    app.player.current_target.as_ref().is_some_and(|t| t.video_id == target.video_id && t.start == target.start);
  let state = match (playing_this, app.player.paused) {
    (true, false) => "playing",
    (true, true) => "paused",
    (false, _) => "not playing",
  };

  let field = |label: &'static str, value: String| {
    Line::from(vec![
      Span::styled(label, Style::default().fg(theme.muted)),
      Span::styled(value, Style::default().fg(theme.fg)),
    ])
  };
  let lines = vec![
    Line::from(""),
    field("Clip      ", truncate_str(&target.video_id, inner_w.saturating_sub(10))),
    field("Start     ", format!("{}s", target.start)),
    field("Captions  ", target.lang.clone()),
    field("Player    ", state.to_string()),
    Line::from(""),
    Line::from(Span::styled(
      truncate_str(&url, inner_w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )),
  ];
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_controls(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let [prev_area, next_area] =
    Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

  let control = |text: &'static str, enabled: bool, color: Color| {
    let style = if enabled {
      Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.muted).add_modifier(Modifier::DIM)
    };
    let border = if enabled { color } else { theme.border };
    Paragraph::new(Span::styled(text, style)).alignment(Alignment::Center).block(rounded_block(theme, border))
  };

  frame.render_widget(control("◀ Previous", app.browser.can_prev(), theme.primary), prev_area);
  frame.render_widget(control("Next ▶", app.browser.can_next(), theme.secondary), next_area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(query) = app.panel.pending_query() {
    (format!(" ⏳ Searching '{}'…", query), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(status) = app.player.last_mpv_status() {
    (format!(" ♪ {}", status), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_videos = !app.browser.is_empty();
  let is_playing = app.player.is_playing();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Find")];
      if is_playing {
        k.push(("^s", "Stop"));
      }
      if has_videos {
        k.push(("↓", "Clips"));
        k.push(("^o", "Open"));
      }
      k.push(("Esc", if has_videos { "Clips" } else { "Quit" }));
      k
    }
    AppMode::Browse => {
      let mut k = vec![("←/→", "Prev/Next"), ("Enter", "Play")];
      if is_playing {
        let pause_label = if app.player.paused { "Resume" } else { "Pause" };
        k.push(("Space", pause_label));
        k.push(("^s", "Stop"));
      }
      k.push(("^o", "Open"));
      k.push(("Esc", "Search"));
      k
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);
}
