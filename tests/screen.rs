//! What a terminal actually shows, checked through a VT100 emulator.

use overlog::{Capture, Destination, HeaderFlags, LoggerConfig, Registry};

const ROWS: u16 = 6;
const COLS: u16 = 40;

/// Feed captured bytes to an emulator, translating `\n` the way a tty
/// with `onlcr` does.
fn screen(capture: &Capture) -> vt100::Parser {
    let mut bytes = Vec::new();
    for &b in &capture.contents() {
        if b == b'\n' {
            bytes.push(b'\r');
        }
        bytes.push(b);
    }
    let mut parser = vt100::Parser::new(ROWS, COLS, 0);
    parser.process(&bytes);
    parser
}

fn row(parser: &vt100::Parser, index: usize) -> String {
    parser
        .screen()
        .rows(0, COLS)
        .nth(index)
        .unwrap_or_default()
        .trim_end()
        .to_string()
}

fn quiet() -> LoggerConfig {
    LoggerConfig::new("", HeaderFlags::empty())
}

#[test]
fn test_overlay_is_redrawn_in_place() {
    let registry = Registry::new();
    let capture = Capture::new();
    let dest = Destination::new(capture.clone());
    registry.set_term_width(&dest, COLS);
    let a = registry.logger(dest.clone(), quiet());
    let b = registry.logger(dest, quiet());

    a.print("1").unwrap();
    b.print("2").unwrap();
    a.print("3").unwrap();

    let parser = screen(&capture);
    assert_eq!(row(&parser, 0), "13 | 2");
    assert_eq!(row(&parser, 1), "");
    assert_eq!(parser.screen().cursor_position().0, 0);
}

#[test]
fn test_committed_line_leaves_no_stale_overlay() {
    let registry = Registry::new();
    let capture = Capture::new();
    let dest = Destination::new(capture.clone());
    registry.set_term_width(&dest, COLS);
    let a = registry.logger(dest.clone(), quiet());
    let b = registry.logger(dest, quiet());

    a.print("aaaa").unwrap();
    b.print("bbbb").unwrap();
    a.println("").unwrap();

    let parser = screen(&capture);
    assert_eq!(row(&parser, 0), "aaaa");
    assert_eq!(row(&parser, 1), "bbbb");
}

#[test]
fn test_shrinking_overlay_clears_old_text() {
    let registry = Registry::new();
    let capture = Capture::new();
    let dest = Destination::new(capture.clone());
    registry.set_term_width(&dest, COLS);
    let a = registry.logger(dest.clone(), quiet());
    let b = registry.logger(dest.clone(), quiet());

    a.print("aaaa").unwrap();
    b.print("bbbb").unwrap();
    a.set_partial_lines_visible(false);
    registry.refresh(&dest).unwrap();

    let parser = screen(&capture);
    assert_eq!(row(&parser, 0), "bbbb");
    assert_eq!(row(&parser, 1), "");
}

#[test]
fn test_color_continues_on_next_row() {
    let registry = Registry::new();
    let capture = Capture::new();
    let dest = Destination::new(capture.clone());
    registry.set_term_width(&dest, COLS);
    let a = registry.logger(dest, quiet());

    a.println("\x1b[31mabc\ndef").unwrap();
    a.println("\x1b[0mplain").unwrap();

    let parser = screen(&capture);
    let screen = parser.screen();
    assert_eq!(row(&parser, 0), "abc");
    assert_eq!(row(&parser, 1), "def");
    assert_eq!(row(&parser, 2), "plain");
    let red = vt100::Color::Idx(1);
    assert_eq!(screen.cell(0, 0).unwrap().fgcolor(), red);
    assert_eq!(screen.cell(1, 0).unwrap().fgcolor(), red);
    assert_eq!(screen.cell(2, 0).unwrap().fgcolor(), vt100::Color::Default);
}

#[test]
fn test_truncated_overlay_fits_one_row() {
    let registry = Registry::new();
    let capture = Capture::new();
    let dest = Destination::new(capture.clone());
    registry.set_term_width(&dest, 20);
    let a = registry.logger(dest.clone(), quiet());
    let b = registry.logger(dest, quiet());

    a.print("first stream text").unwrap();
    b.print("second stream text").unwrap();

    let parser = screen(&capture);
    let top = row(&parser, 0);
    assert_eq!(top, "first stream te ...");
    assert_eq!(row(&parser, 1), "");
}

#[test]
fn test_templates_render_colors() {
    let registry = Registry::new();
    registry.set_default_color_template_enabled(true);
    let capture = Capture::new();
    let dest = Destination::new(capture.clone());
    registry.set_term_width(&dest, COLS);
    let a = registry.logger(dest, LoggerConfig::new("@[green:ok] ", HeaderFlags::empty()));

    a.println("@[bright,red:fail] tail").unwrap();

    let parser = screen(&capture);
    let screen = parser.screen();
    assert_eq!(row(&parser, 0), "ok fail tail");
    assert_eq!(screen.cell(0, 0).unwrap().fgcolor(), vt100::Color::Idx(2));
    assert!(screen.cell(0, 3).unwrap().bold());
    assert_eq!(screen.cell(0, 3).unwrap().fgcolor(), vt100::Color::Idx(1));
    assert!(!screen.cell(0, 8).unwrap().bold());
    assert_eq!(screen.cell(0, 8).unwrap().fgcolor(), vt100::Color::Default);
}
