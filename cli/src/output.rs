use colored::Colorize;

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn hint(msg: &str) {
    println!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn failure(msg: &str) {
    println!("{} {}", "✗".red().bold(), msg);
}

/// Aligned `name: value (note)` line.
pub fn field(name: &str, value: &str, note: &str) {
    println!(
        "  {:<20} {} {}",
        format!("{name}:"),
        value.cyan(),
        format!("({note})").dimmed()
    );
}
