//! Console report formatting
//!
//! Reports go to stdout; diagnostics go through `tracing` to stderr.

const RULE_WIDTH: usize = 60;

/// Title framed by `=` rules
pub fn banner(title: &str) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{title}");
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Section heading followed by a `-` rule
pub fn section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "-".repeat(RULE_WIDTH));
}

pub fn rule() {
    println!("{}", "=".repeat(RULE_WIDTH));
}

pub fn ok(message: impl AsRef<str>) {
    println!("  ✅ {}", message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    println!("  ⚠️  {}", message.as_ref());
}

pub fn fail(message: impl AsRef<str>) {
    println!("  ❌ {}", message.as_ref());
}

pub fn item(message: impl AsRef<str>) {
    println!("     - {}", message.as_ref());
}

/// `count/total` with a check mark when complete
pub fn ratio(count: usize, total: usize) -> String {
    let mark = if count == total { "✅" } else { "⚠️" };
    format!("{count}/{total} {mark}")
}
