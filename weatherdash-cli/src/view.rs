//! Text rendering of the dashboard cards.

use std::io::Write;

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Stylize},
    terminal::{Clear, ClearType},
};
use unicode_width::UnicodeWidthStr;
use weatherdash_core::{ConditionTag, DashboardState, Theme};

struct Palette {
    text: Color,
    accent: Color,
    muted: Color,
    error: Color,
    border: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                text: Color::White,
                accent: Color::Cyan,
                muted: Color::DarkGrey,
                error: Color::Red,
                border: Color::Grey,
            },
            Theme::Light => Palette {
                text: Color::Black,
                accent: Color::DarkBlue,
                muted: Color::DarkGrey,
                error: Color::DarkRed,
                border: Color::DarkGrey,
            },
        }
    }
}

/// Applies colors, or passes text through untouched.
struct Painter {
    palette: Palette,
    color: bool,
}

impl Painter {
    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Boxed card; widths are the terminal display widths of the unstyled lines.
    fn card(&self, title: &str, lines: &[(String, String)]) -> String {
        let width = lines
            .iter()
            .map(|(plain, _)| plain.width())
            .chain(std::iter::once(title.width() + 2))
            .max()
            .unwrap_or(0);

        let border = self.palette.border;
        let mut out = String::new();
        let rule = "─".repeat(width.saturating_sub(title.width() + 1));
        let top = format!("╭─ {title} {rule}╮");
        out.push_str(&self.paint(&top, border));
        out.push('\n');

        for (plain, styled) in lines {
            let pad = " ".repeat(width - plain.width());
            out.push_str(&self.paint("│ ", border));
            out.push_str(styled);
            out.push_str(&pad);
            out.push_str(&self.paint(" │", border));
            out.push('\n');
        }

        let bottom = format!("╰{}╯", "─".repeat(width + 2));
        out.push_str(&self.paint(&bottom, border));
        out.push('\n');
        out
    }

    fn line(&self, text: String, color: Color) -> (String, String) {
        let styled = self.paint(&text, color);
        (text, styled)
    }
}

pub fn condition_icon(tag: ConditionTag) -> &'static str {
    match tag {
        ConditionTag::Sunny | ConditionTag::Clear => "☀",
        ConditionTag::PartlyCloudy | ConditionTag::PartlySunny => "⛅",
        ConditionTag::Cloudy => "☁",
        ConditionTag::Rainy => "☂",
        ConditionTag::Snowy => "❄",
    }
}

pub fn condition_label(tag: ConditionTag) -> &'static str {
    match tag {
        ConditionTag::Sunny => "Sunny",
        ConditionTag::Clear => "Clear",
        ConditionTag::PartlyCloudy => "Partly Cloudy",
        ConditionTag::PartlySunny => "Partly Sunny",
        ConditionTag::Cloudy => "Cloudy",
        ConditionTag::Rainy => "Rainy",
        ConditionTag::Snowy => "Snowy",
    }
}

/// The whole dashboard as text.
pub fn render(state: &DashboardState, color: bool) -> String {
    let p = Painter {
        palette: Palette::for_theme(state.theme),
        color,
    };
    let c = &p.palette;
    let weather = &state.weather;
    let now = &weather.current;
    let mut out = String::new();

    let mode_icon = match state.theme {
        Theme::Dark => "☾",
        Theme::Light => "☀",
    };
    out.push_str(&p.paint(&format!("{mode_icon} {}", state.theme.label()), c.muted));
    out.push_str("   ");
    out.push_str(&p.paint(":locate  :theme  :quit", c.muted));
    out.push('\n');

    out.push_str(&p.paint("⌕ Type a city and press Enter", c.muted));
    out.push_str("\n\n");

    if let Some(error) = &state.error {
        out.push_str(&p.bold(&format!("! {error}"), c.error));
        out.push_str("\n\n");
    }

    if state.loading {
        out.push_str(&p.paint("… Loading weather data...", c.accent));
        out.push_str("\n\n");
    }

    let clock = vec![
        (now.time.clone(), p.bold(&now.time, c.text)),
        p.line(now.date.clone(), c.muted),
    ];
    out.push_str(&p.card(&now.location, &clock));

    let headline = format!(
        "{}°C  {} {}",
        now.temp,
        condition_icon(now.condition),
        condition_label(now.condition)
    );
    let current = vec![
        (headline.clone(), p.bold(&headline, c.text)),
        p.line(format!("Feels like: {}°C", now.feels_like), c.muted),
        p.line(format!("Sunrise {}   Sunset {}", now.sunrise, now.sunset), c.text),
        p.line(
            format!(
                "Humidity {}%   Wind {}km/h   Pressure {}hPa   UV {}",
                now.humidity, now.wind_speed, now.pressure, now.uv
            ),
            c.text,
        ),
    ];
    out.push_str(&p.card("Now", &current));

    let hourly: Vec<_> = weather
        .hourly
        .iter()
        .map(|h| {
            let icon = condition_icon(h.condition);
            let text = format!("{}  {icon}  {:>3}°C  {:>3}km/h", h.time, h.temp, h.wind_speed);
            p.line(text, c.text)
        })
        .collect();
    out.push_str(&p.card("Hourly Forecast", &hourly));

    let daily: Vec<_> = weather
        .daily
        .iter()
        .map(|d| {
            let text = format!("{}  {:>3}°C  {}", condition_icon(d.condition), d.temp, d.date);
            p.line(text, c.text)
        })
        .collect();
    out.push_str(&p.card("5 Days Forecast", &daily));

    out
}

/// Clear the terminal and draw the dashboard.
pub fn draw(out: &mut impl Write, state: &DashboardState) -> std::io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    // Raw newlines do not return the cursor on every terminal.
    let text = render(state, true).replace('\n', "\r\n");
    out.write_all(text.as_bytes())?;
    out.flush()
}
