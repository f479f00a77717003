use console::style;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn blue(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).blue()
}

pub fn cyan(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

pub fn green_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).green().bold()
}

/// `Error:` / `Info:` / `Success:` prefixed one-line messages.
pub fn error_line(message: impl std::fmt::Display) -> String {
    format!("{} {message}", bright_red("Error:"))
}

pub fn info_line(message: impl std::fmt::Display) -> String {
    format!("{} {message}", cyan("Info:"))
}

pub fn success_line(message: impl std::fmt::Display) -> String {
    format!("{} {message}", bright_green("Success:"))
}
