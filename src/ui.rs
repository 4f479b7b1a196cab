//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! * The layout is a two-row split: a scrollable list on top and a one-line
//!   status bar at the bottom.
//! * While a page is loading, `page_size` placeholder rows follow the items.
//!   They are cosmetic only and never count as items.
//! * After the list is rendered its scroll offset is reported back through
//!   [`App::observe_viewport`], which is how the sentinel learns whether the
//!   last item is on screen.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::source::Item;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_item_list(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

fn item_line(index: usize, item: &Item) -> Line<'_> {
    let id = item
        .id
        .as_ref()
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| format!("{}.", index + 1));

    let mut spans = vec![
        Span::styled(format!("{id:>6}"), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(item.label(), Style::default().fg(Color::White)),
    ];
    if item.title.is_some() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(&item.url, Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

/// Render the scrollable item list followed by loading placeholders.
fn draw_item_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let placeholders = if app.loader.is_loading() {
        app.loader.page_size()
    } else {
        0
    };

    let mut rows: Vec<ListItem> = app
        .loader
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| ListItem::new(item_line(i, item)))
        .collect();
    rows.extend((0..placeholders).map(|_| {
        ListItem::new(Span::styled(
            "       Loading…",
            Style::default().fg(Color::DarkGray),
        ))
    }));

    let list = List::new(rows)
        .block(
            Block::default()
                .title(format!(" {} ", app.title))
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);

    let visible_rows = usize::from(area.height.saturating_sub(2));
    let offset = app.list_state.offset();
    app.observe_viewport(offset, visible_rows);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let (marker, colour) = if app.loader.is_exhausted() {
        ("end", Color::Magenta)
    } else if app.loader.next_cursor().is_some() {
        ("more", Color::Green)
    } else {
        ("…", Color::DarkGray)
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!(
                "{} items, page {}",
                app.loader.items().len(),
                app.loader.pages_loaded()
            ),
            Style::default().fg(Color::Green),
        ),
        Span::raw(" "),
        Span::styled(format!("[{marker}]"), Style::default().fg(colour)),
        Span::raw("  q: quit  ↑/↓: scroll  r: retry  R: reload"),
    ]));
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link_header::parse_link_header;
    use crate::loader::FeedLoader;
    use crate::source::Page;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    fn app_with(items: usize, next: Option<&str>) -> App {
        let mut app = App::new(FeedLoader::new("http://h/p?_page=1&_limit=5", 5), "photos");
        app.start();
        let req = app.drain_requests().pop().unwrap();
        let items = (0..items)
            .map(|n| {
                let mut item = Item::from_url(format!("http://h/img/{n}"));
                item.title = Some(format!("photo {n}"));
                item
            })
            .collect();
        let header = next.map(|url| format!(r#"<{url}>; rel="next""#));
        app.on_fetched(
            req.id,
            Ok(Page::new(items, parse_link_header(header.as_deref()).unwrap())),
        );
        app
    }

    #[test]
    fn draw_does_not_panic_with_no_items() {
        let mut app = App::new(FeedLoader::new("http://h/p", 5), "photos");
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
    }

    #[test]
    fn loading_shows_placeholders() {
        let mut app = App::new(FeedLoader::new("http://h/p", 5), "photos");
        app.start();

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();

        let text = screen_text(&terminal);
        assert_eq!(text.matches("Loading…").count(), 5 + 1, "five rows plus status");
        assert!(text.contains("0 items"));
    }

    #[test]
    fn status_shows_item_count() {
        let mut app = app_with(3, None);
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("3 items"), "status bar should show item count");
        assert!(text.contains("photo 2"));
        assert!(text.contains("[end]"));
    }

    #[test]
    fn short_list_triggers_next_page_on_first_draw() {
        let mut app = app_with(5, Some("http://h/p?_page=2&_limit=5"));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();

        let reqs = app.drain_requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].url, "http://h/p?_page=2&_limit=5");
        assert!(app.loader.is_loading());

        terminal.draw(|f| draw(&mut app, f)).unwrap();
        assert!(app.drain_requests().is_empty());
    }

    #[test]
    fn long_list_waits_for_scroll() {
        let mut app = app_with(5, Some("http://h/p2"));
        // Only three item rows fit: 5 lines minus borders.
        let mut terminal = Terminal::new(TestBackend::new(80, 6)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
        assert!(app.drain_requests().is_empty());

        app.select_last();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
        assert_eq!(app.drain_requests().len(), 1);
    }
}
