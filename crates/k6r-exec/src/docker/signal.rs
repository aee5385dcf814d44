//! Signalling exec processes from inside their container.
//!
//! The daemon reports exec PIDs in the host PID namespace, which is useless from inside the
//! container. The process is matched by its full command line instead, with `pkill -f` run as a
//! second exec in the same container.

/// Signals sent to an abandoned exec, in escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Term,
    Kill,
}

impl StopSignal {
    pub fn as_flag(&self) -> &'static str {
        match self {
            StopSignal::Term => "-TERM",
            StopSignal::Kill => "-KILL",
        }
    }
}

/// Anchored extended regex matching exactly the command line `argv`.
pub fn command_line_pattern(argv: &[String]) -> String {
    let mut out = String::from("^");
    for (i, arg) in argv.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        for c in arg.chars() {
            if matches!(
                c,
                '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
            ) {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out.push('$');
    out
}

/// `pkill` invocation delivering `signal` to processes whose command line matches `pattern`.
pub fn pkill_command(signal: StopSignal, pattern: &str) -> Vec<String> {
    vec![
        "pkill".to_string(),
        signal.as_flag().to_string(),
        "-f".to_string(),
        pattern.to_string(),
    ]
}
