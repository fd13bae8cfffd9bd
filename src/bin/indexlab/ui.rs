use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use std::fmt::Display;
use std::io::IsTerminal;

pub struct Ui {
    palette: Palette,
    paint: bool,
}

impl Ui {
    pub fn new(plain: bool) -> Self {
        let paint = !plain && std::io::stdout().is_terminal();

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = if paint {
            Palette::dark()
        } else {
            Palette::plain()
        };
        Self { palette, paint }
    }

    pub fn paint(&self) -> bool {
        self.paint
    }

    pub fn spacer(&self) {
        println!();
    }

    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(String, String)> = rows
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        if rows.is_empty() {
            return;
        }

        self.heading(title);
        let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            println!(
                "  {} {}",
                self.palette.key.paint(format!("{key:>key_width$}:")),
                self.palette.value.paint(value)
            );
        }
    }

    pub fn heading(&self, title: &str) {
        println!(
            "{}",
            self.palette.heading.paint(format!("{HEADING_ICON} {title}"))
        );
    }

    pub fn success(&self, message: &str) {
        println!("{} {message}", self.palette.success.paint(SUCCESS_ICON));
    }

    /// Bar over the experiment sizes; indicatif hides it when stderr is not a terminal.
    pub fn progress(&self, len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::with_template("{prefix} [{bar:32}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        pb.set_style(style);
        pb.set_prefix(self.palette.info.paint(PROGRESS_ICON).to_string());
        pb
    }
}

struct Palette {
    heading: Style,
    key: Style,
    value: Style,
    info: Style,
    success: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue).bold(),
            value: Style::new().fg(Color::White),
            info: Style::new().fg(Color::LightCyan),
            success: Style::new().fg(Color::LightGreen).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            value: Style::new(),
            info: Style::new(),
            success: Style::new(),
        }
    }
}

const HEADING_ICON: &str = "▸";
const SUCCESS_ICON: &str = "✔";
const PROGRESS_ICON: &str = "▶";
