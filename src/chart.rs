//! Terminal log-log chart of lookup latency against table size.

use nu_ansi_term::Color;

const DEFAULT_WIDTH: usize = 72;
const DEFAULT_HEIGHT: usize = 20;
const SEGMENT: char = '·';

/// One plotted line.
pub struct Series<'a> {
    /// Legend text.
    pub label: &'a str,
    /// `(x, y)` points; non-positive values are skipped on a log scale.
    pub points: Vec<(f64, f64)>,
    /// Glyph drawn at every data point.
    pub marker: char,
    /// Colour used when painting is enabled.
    pub color: Color,
}

/// Character-grid chart with logarithmic x and y axes.
pub struct LogLogChart<'a> {
    /// Heading line.
    pub title: &'a str,
    /// Caption under the x axis.
    pub x_label: &'a str,
    /// Caption above the y axis.
    pub y_label: &'a str,
    /// Plot area width in cells.
    pub width: usize,
    /// Plot area height in cells.
    pub height: usize,
    /// Lines to draw, later series on top.
    pub series: Vec<Series<'a>>,
}

#[derive(Clone, Copy)]
struct Cell {
    ch: char,
    color: Option<Color>,
}

impl Cell {
    const EMPTY: Cell = Cell {
        ch: ' ',
        color: None,
    };
}

/// Whole-decade span of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decades {
    lo: i32,
    hi: i32,
}

impl Decades {
    fn fit(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.filter(|v| v.is_finite() && *v > 0.0) {
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() {
            return None;
        }
        let lo = log10_snapped(min).floor() as i32;
        let mut hi = log10_snapped(max).ceil() as i32;
        if hi <= lo {
            hi = lo + 1;
        }
        Some(Self { lo, hi })
    }

    fn position(&self, value: f64, cells: usize) -> usize {
        let span = f64::from(self.hi - self.lo);
        let t = (log10_snapped(value) - f64::from(self.lo)) / span;
        let last = cells.saturating_sub(1);
        ((t * last as f64).round().max(0.0) as usize).min(last)
    }

    fn iter(&self) -> impl Iterator<Item = i32> {
        self.lo..=self.hi
    }
}

fn plottable((x, y): (f64, f64)) -> bool {
    x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0
}

/// `log10`, snapped to the nearest integer when within rounding noise of it.
fn log10_snapped(value: f64) -> f64 {
    let l = value.log10();
    if (l - l.round()).abs() < 1e-9 {
        l.round()
    } else {
        l
    }
}

fn decade_label(exp: i32) -> String {
    format!("1e{exp}")
}

impl LogLogChart<'_> {
    fn plottable_points(&self) -> Vec<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .filter(|&p| plottable(p))
            .collect()
    }

    /// Renders the chart; `paint` adds ANSI colours.
    pub fn render(&self, paint: bool) -> String {
        let width = self.width.max(2);
        let height = self.height.max(2);
        let points = self.plottable_points();
        let (Some(xs), Some(ys)) = (
            Decades::fit(points.iter().map(|p| p.0)),
            Decades::fit(points.iter().map(|p| p.1)),
        ) else {
            return format!("{}\n(no data to plot)\n", self.title);
        };

        let mut grid = vec![vec![Cell::EMPTY; width]; height];
        let grid_color = Some(Color::DarkGray);
        let x_cols: Vec<usize> = xs
            .iter()
            .map(|d| xs.position(10f64.powi(d), width))
            .collect();
        let y_rows: Vec<usize> = ys
            .iter()
            .map(|d| height - 1 - ys.position(10f64.powi(d), height))
            .collect();
        for &row in &y_rows {
            for cell in grid[row].iter_mut() {
                *cell = Cell {
                    ch: '┄',
                    color: grid_color,
                };
            }
        }
        for &col in &x_cols {
            for (row, line) in grid.iter_mut().enumerate() {
                let ch = if y_rows.contains(&row) { '┼' } else { '┊' };
                line[col] = Cell {
                    ch,
                    color: grid_color,
                };
            }
        }

        for series in &self.series {
            let cells: Vec<(usize, usize)> = series
                .points
                .iter()
                .copied()
                .filter(|&p| plottable(p))
                .map(|(x, y)| {
                    (
                        xs.position(x, width),
                        height - 1 - ys.position(y, height),
                    )
                })
                .collect();
            let color = Some(series.color);
            for pair in cells.windows(2) {
                let (c0, r0) = (pair[0].0 as f64, pair[0].1 as f64);
                let (c1, r1) = (pair[1].0 as f64, pair[1].1 as f64);
                let steps = (c1 - c0).abs().max((r1 - r0).abs()) as usize;
                for step in 1..steps {
                    let t = step as f64 / steps as f64;
                    let col = (c0 + (c1 - c0) * t).round() as usize;
                    let row = (r0 + (r1 - r0) * t).round() as usize;
                    grid[row][col] = Cell { ch: SEGMENT, color };
                }
            }
            for &(col, row) in &cells {
                grid[row][col] = Cell {
                    ch: series.marker,
                    color,
                };
            }
        }

        let paint_cell = |cell: &Cell| -> String {
            match cell.color {
                Some(color) if paint => color.paint(cell.ch.to_string()).to_string(),
                _ => cell.ch.to_string(),
            }
        };

        let y_labels: Vec<(usize, String)> = ys
            .iter()
            .zip(&y_rows)
            .map(|(d, &row)| (row, decade_label(d)))
            .collect();
        let margin = y_labels.iter().map(|(_, l)| l.len()).max().unwrap_or(0);

        let mut out = String::new();
        out.push_str(self.title);
        out.push('\n');
        out.push_str(self.y_label);
        out.push('\n');
        for (row, line) in grid.iter().enumerate() {
            let label = y_labels
                .iter()
                .find(|(r, _)| *r == row)
                .map(|(_, l)| l.as_str());
            out.push_str(&format!("{:>margin$}", label.unwrap_or("")));
            out.push(if label.is_some() { '┤' } else { '│' });
            for cell in line {
                out.push_str(&paint_cell(cell));
            }
            out.push('\n');
        }
        out.push_str(&" ".repeat(margin));
        out.push('└');
        out.push_str(&"─".repeat(width));
        out.push('\n');

        let mut ticks = vec![' '; margin + 1 + width + 4];
        for (d, &col) in xs.iter().zip(&x_cols) {
            for (i, ch) in decade_label(d).chars().enumerate() {
                if let Some(slot) = ticks.get_mut(margin + 1 + col + i) {
                    *slot = ch;
                }
            }
        }
        out.push_str(ticks.iter().collect::<String>().trim_end());
        out.push('\n');
        let pad = (margin + 1 + width / 2).saturating_sub(self.x_label.chars().count() / 2);
        out.push_str(&" ".repeat(pad));
        out.push_str(self.x_label);
        out.push('\n');

        for series in &self.series {
            let key = format!("{}{SEGMENT}", series.marker);
            let key = if paint {
                series.color.paint(key).to_string()
            } else {
                key
            };
            out.push_str(&format!("  {key} {}\n", series.label));
        }
        out
    }
}

/// Renders mean latency without and with the index against table size.
pub fn render_chart(sizes: &[usize], without: &[f64], with: &[f64], paint: bool) -> String {
    let points = |values: &[f64]| -> Vec<(f64, f64)> {
        sizes
            .iter()
            .zip(values)
            .map(|(&size, &secs)| (size as f64, secs))
            .collect()
    };
    LogLogChart {
        title: "movie_shows lookup latency (hall_id + start_time range)",
        x_label: "table size (shows)",
        y_label: "mean lookup time (s)",
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        series: vec![
            Series {
                label: "without index",
                points: points(without),
                marker: '●',
                color: Color::Red,
            },
            Series {
                label: "with index",
                points: points(with),
                marker: '▲',
                color: Color::Green,
            },
        ],
    }
    .render(paint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decades_cover_data() {
        let d = Decades::fit([12.0, 950.0].into_iter()).unwrap();
        assert_eq!(d, Decades { lo: 1, hi: 3 });
        let single = Decades::fit([100.0].into_iter()).unwrap();
        assert_eq!(single, Decades { lo: 2, hi: 3 });
        assert!(Decades::fit([0.0, -1.0].into_iter()).is_none());
    }

    #[test]
    fn markers_land_in_corners() {
        let chart = LogLogChart {
            title: "t",
            x_label: "x",
            y_label: "y",
            width: 21,
            height: 11,
            series: vec![Series {
                label: "s",
                points: vec![(10.0, 1e-3), (100.0, 1e-1)],
                marker: '●',
                color: Color::Red,
            }],
        };
        let text = chart.render(false);
        let lines: Vec<&str> = text.lines().collect();
        // title, y label, then 11 plot rows; the margin is "1e-3" plus the axis.
        let top = lines[2].chars().nth(5 + 20);
        let bottom = lines[2 + 10].chars().nth(5);
        assert_eq!(top, Some('●'));
        assert_eq!(bottom, Some('●'));
        assert!(lines[2].starts_with("1e-1┤"));
        assert!(text.contains("1e1"));
        assert!(text.contains("1e2"));
        assert!(text.contains("  ●· s"));
    }

    #[test]
    fn full_chart_has_both_series() {
        let sizes = [10, 100, 1000];
        let text = render_chart(&sizes, &[1e-5, 1e-4, 1e-3], &[5e-6, 6e-6, 7e-6], false);
        assert!(text.contains("without index"));
        assert!(text.contains("with index"));
        assert!(text.contains('●'));
        assert!(text.contains('▲'));
        assert!(text.contains("table size (shows)"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn painted_chart_uses_ansi() {
        let text = render_chart(&[10, 20], &[1e-5, 2e-5], &[1e-6, 1e-6], true);
        assert!(text.contains('\u{1b}'));
    }

    #[test]
    fn empty_chart_says_so() {
        let text = render_chart(&[], &[], &[], false);
        assert!(text.contains("no data"));
    }
}
