//! Terminal rendering with ratatui
//!
//! Pure view layer: everything here is derived from the game controller's
//! read accessors each frame, so the core never holds a renderer handle.

use crate::board::{CellState, NUM_COLS, NUM_ROWS};
use crate::game::{Game, Phase};
use crate::menu::StartScreen;
use crate::settings::Settings;
use crate::tetromino::PieceKind;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const EMPTY: &str = "  ";

/// Total footprint of the play screen
const GAME_WIDTH: u16 = 40;
const GAME_HEIGHT: u16 = 22;

pub fn render(frame: &mut Frame, game: &Game, start_screen: &StartScreen, settings: &Settings) {
    match game.phase() {
        Phase::StartScreen => render_start_screen(frame, start_screen, settings),
        _ => render_game(frame, game, settings),
    }
}

/// NES palette: the two level-dependent piece colors (the third class is
/// always white). Cycles every 10 levels.
fn level_palette(level: u32) -> (Color, Color) {
    match level % 10 {
        0 => (Color::Rgb(0x00, 0x58, 0xF8), Color::Rgb(0x3C, 0xBC, 0xFC)),
        1 => (Color::Rgb(0x00, 0xA8, 0x00), Color::Rgb(0xB8, 0xF8, 0x18)),
        2 => (Color::Rgb(0xD8, 0x00, 0xCC), Color::Rgb(0xF8, 0x78, 0xF8)),
        3 => (Color::Rgb(0x00, 0x58, 0xF8), Color::Rgb(0x58, 0xD8, 0x54)),
        4 => (Color::Rgb(0xE4, 0x00, 0x58), Color::Rgb(0x58, 0xF8, 0x98)),
        5 => (Color::Rgb(0x58, 0x98, 0xF8), Color::Rgb(0x68, 0x88, 0xFC)),
        6 => (Color::Rgb(0xF8, 0x38, 0x00), Color::Rgb(0x7C, 0x7C, 0x7C)),
        7 => (Color::Rgb(0x68, 0x44, 0xFC), Color::Rgb(0xA8, 0x00, 0x20)),
        8 => (Color::Rgb(0x00, 0x58, 0xF8), Color::Rgb(0xF8, 0x38, 0x00)),
        _ => (Color::Rgb(0xF8, 0x38, 0x00), Color::Rgb(0xFC, 0xA0, 0x44)),
    }
}

fn cell_color(state: CellState, level: u32) -> Color {
    let (second, third) = level_palette(level);
    match state {
        CellState::Empty => Color::Reset,
        CellState::Color1 => Color::White,
        CellState::Color2 => second,
        CellState::Color3 => third,
    }
}

/// Whether a column of a clearing row is already blanked at this animation
/// frame. Columns vanish center-out, one pair every 4 ticks.
fn column_blanked(col: usize, animation_frame: u32) -> bool {
    let steps = (animation_frame / 4) as usize;
    let pair = if col <= 4 { 4 - col } else { col - 5 };
    pair < steps
}

fn render_start_screen(frame: &mut Frame, start_screen: &StartScreen, settings: &Settings) {
    let area = center_rect(frame.area(), 44, 12);

    let level_text = if start_screen.input().is_empty() {
        "0".to_string()
    } else {
        start_screen.input().to_string()
    };

    let lines = vec![
        Line::from(Span::styled(
            "TETRIS TRAINER",
            Style::default().fg(Color::White),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Starting level: "),
            Span::styled(level_text, Style::default().fg(Color::Yellow)),
        ]),
        Line::raw(""),
        Line::raw("type digits or Up/Down to pick a level"),
        Line::raw("Enter to start, q to quit"),
        Line::raw(""),
        Line::raw(format!(
            "selector: {}   garbage rows: {}",
            settings.gameplay.selector, settings.gameplay.garbage_rows
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_game(frame: &mut Frame, game: &Game, settings: &Settings) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(22), // Board (10*2 + 2 for borders)
            Constraint::Length(18), // Next box + stats
        ])
        .split(game_area);

    render_board(frame, main_layout[0], game, settings);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Next box
            Constraint::Min(8),    // Stats
        ])
        .split(main_layout[1]);

    render_next_box(frame, right_layout[0], game, settings);
    render_stats(frame, right_layout[1], game);

    match game.phase() {
        Phase::Paused => render_overlay(frame, area, "PAUSED", "Press P to resume"),
        Phase::GameOver => render_overlay(frame, area, "GAME OVER", "Press R to restart"),
        _ => {}
    }
}

fn render_board(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let block_char = settings.visual.block_char();
    let level = game.level();

    let block = Block::default()
        .title(format!(" LEVEL {} ", level))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let piece_cells: Vec<(usize, usize)> = if game.piece_visible() {
        game.current_piece()
            .map(|piece| piece.cells().collect())
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let clearing = game.phase() == Phase::LineClear;
    let animation_frame = game.line_clear_frame();

    let mut lines: Vec<Line> = Vec::with_capacity(NUM_ROWS);
    for row in 0..NUM_ROWS {
        let row_clearing = clearing && game.pending_rows().contains(&row);
        let mut spans = Vec::with_capacity(NUM_COLS);
        for col in 0..NUM_COLS {
            let (text, style) = if piece_cells.contains(&(row, col)) {
                let piece = game.current_piece().map(|p| p.kind.cell_state());
                let color = cell_color(piece.unwrap_or_default(), level);
                (block_char, Style::default().fg(color))
            } else if row_clearing && column_blanked(col, animation_frame) {
                (EMPTY, Style::default())
            } else {
                match game.board().cell(row, col) {
                    CellState::Empty => (EMPTY, Style::default()),
                    state => (block_char, Style::default().fg(cell_color(state, level))),
                }
            };
            spans.push(Span::styled(text, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_next_box(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(next) = game.next_piece() {
        render_mini_piece(frame, inner, next.kind, game.level(), settings);
    }
}

/// Small 2x4 preview of a piece in its spawn orientation
fn render_mini_piece(frame: &mut Frame, area: Rect, kind: PieceKind, level: u32, settings: &Settings) {
    if area.height < 2 || area.width < 8 {
        return;
    }
    let block_char = settings.visual.block_char();
    let color = cell_color(kind.cell_state(), level);
    let shape = kind.shape(0);

    let mut lines: Vec<Line> = Vec::new();
    for row in shape.iter().take(2) {
        let spans: Vec<Span> = row
            .iter()
            .map(|&cell| {
                if cell != 0 {
                    Span::styled(block_char, Style::default().fg(color))
                } else {
                    Span::raw(EMPTY)
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn render_stats(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::raw(format!("Score  {}", game.score())),
        Line::raw(format!("Lines  {}", game.lines())),
        Line::raw(format!("Level  {}", game.level())),
        Line::raw(""),
        Line::raw(format!("Parity {:+}", board_parity(game))),
        Line::raw(""),
        Line::from(Span::styled(
            game.selector_status().to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Checkerboard parity of the stack: +1 for filled cells on even squares,
/// -1 on odd ones. A training aid for flat-stacking strategies.
fn board_parity(game: &Game) -> i32 {
    let mut parity = 0;
    for row in 0..NUM_ROWS {
        for col in 0..NUM_COLS {
            if game.board().cell(row, col).is_filled() {
                parity += if (row + col) % 2 == 0 { 1 } else { -1 };
            }
        }
    }
    parity
}

fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let overlay = center_rect(area, 26, 4);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let lines = vec![
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(Color::Yellow),
        )),
        Line::raw(subtitle.to_string()),
    ];
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, overlay);
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_blanking_is_center_out() {
        // Nothing blanked before the first step completes
        assert!(!column_blanked(4, 3));
        // Center pair goes first
        assert!(column_blanked(4, 4));
        assert!(column_blanked(5, 4));
        assert!(!column_blanked(3, 4));
        // Everything gone by the final frame
        assert!((0..NUM_COLS).all(|c| column_blanked(c, 20)));
    }

    #[test]
    fn test_palette_cycles_every_ten_levels() {
        assert_eq!(level_palette(3), level_palette(13));
        assert_ne!(level_palette(0), level_palette(1));
    }

    #[test]
    fn test_empty_cells_have_no_color() {
        assert_eq!(cell_color(CellState::Empty, 0), Color::Reset);
        assert_eq!(cell_color(CellState::Color1, 7), Color::White);
    }
}
