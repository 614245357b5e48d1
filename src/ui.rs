use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Shorten a secret for display, keeping the first `keep` characters
pub fn preview_secret(secret: &str, keep: usize) -> String {
    if secret.chars().count() <= keep {
        secret.to_string()
    } else {
        let head: String = secret.chars().take(keep).collect();
        format!("{head}…")
    }
}
