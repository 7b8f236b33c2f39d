use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::timer::{Indicator, Timer};
use crate::util::{format_duration, format_secs};

const HORIZONTAL_MARGIN: u16 = 5;
const RECENT_SOLVES: usize = 5;
const LEGEND: &str = "(space) hold to arm / any key stops / (esc) reset / (q)uit";

fn lines_needed(text: &str, max_chars_per_line: u16) -> u16 {
    let width = text.width();
    if width <= max_chars_per_line as usize {
        1
    } else {
        (width as f64 / max_chars_per_line as f64).ceil() as u16
    }
}

fn readout_style(indicator: Indicator) -> Style {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    match indicator {
        Indicator::Released => bold_style,
        Indicator::Pressed => bold_style.fg(Color::Red),
        Indicator::Ready => bold_style.fg(Color::Green),
        Indicator::Running => bold_style.fg(Color::Cyan),
    }
}

fn optional_secs(secs: Option<f64>) -> String {
    secs.map_or_else(|| "-".to_string(), format_secs)
}

impl Widget for &Timer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let scrambles = self.scrambles();
        let scramble_lines = lines_needed(scrambles.current(), max_chars_per_line);
        let previous_lines = lines_needed(scrambles.previous(), max_chars_per_line);
        let recent_lines = self.history().len().min(RECENT_SOLVES) as u16;

        // scramble, gap, readout, gap, previous, average, stats, gap, recent
        let content_lines = scramble_lines + previous_lines + recent_lines + 6;
        let top_padding = area.height.saturating_sub(content_lines + 1) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(top_padding),
                Constraint::Length(scramble_lines),
                Constraint::Length(1),
                Constraint::Length(1), // readout
                Constraint::Length(1),
                Constraint::Length(previous_lines),
                Constraint::Length(1), // average
                Constraint::Length(1), // best / aoN
                Constraint::Length(1),
                Constraint::Length(recent_lines),
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(scrambles.current(), bold_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            format_duration(self.displayed()),
            readout_style(self.indicator()),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

        Paragraph::new(Span::styled(scrambles.previous(), dim_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[5], buf);

        Paragraph::new(Span::styled(
            format!("Average {}", format_secs(self.average_secs())),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

        let history = self.history();
        Paragraph::new(Span::styled(
            format!(
                "best {}   ao5 {}   ao12 {}",
                history
                    .best()
                    .map_or_else(|| "-".to_string(), format_duration),
                optional_secs(history.average_of(5)),
                optional_secs(history.average_of(12)),
            ),
            dim_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

        let recent = history
            .recent(RECENT_SOLVES)
            .zip((1..=history.len()).rev())
            .map(|(solve, number)| {
                Line::from(vec![
                    Span::styled(format!("{number:>3}. "), dim_style),
                    Span::styled(format_duration(solve.duration), bold_style),
                    Span::styled(
                        format!("  {}", solve.finished_at.format("%H:%M:%S")),
                        dim_style,
                    ),
                ])
            })
            .collect::<Vec<Line>>();

        Paragraph::new(recent)
            .alignment(Alignment::Center)
            .render(chunks[9], buf);

        Paragraph::new(Span::styled(LEGEND, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[11], buf);
    }
}
