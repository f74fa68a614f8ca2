//! Console logging for applications which use the allocator.

mod pretty_list;

use std::{fmt::Write as FmtWrite, sync::OnceLock};

use anyhow::Result;
use flexi_logger::{DeferredNow, Logger, LoggerHandle, Record};
use regex::Regex;
use textwrap::{termwidth, Options};

pub use self::pretty_list::PrettyList;

const FIRST_LINE: &str = "┏ ";
const CONTINUED_LINE: &str = "┃ ";

/// Matches the continued-line prefix on the final line of a wrapped record.
static LAST_LINE_MATCHER: OnceLock<Regex> = OnceLock::new();

/// Setup console logging for this application.
///
/// The RUST_LOG environment variable takes precedence over `default_spec`.
/// The returned handle must be kept alive for as long as logs are written.
pub fn setup(default_spec: &str) -> Result<LoggerHandle> {
    let handle = Logger::try_with_env_or_str(default_spec)?
        .format(multiline_format)
        .start()?;

    log::info!(
        "Adjust the log level by setting RUST_LOG. By default RUST_LOG={}",
        default_spec
    );

    Ok(handle)
}

/// A multiline log format for flexi_logger.
///
/// Logs are automatically wrapped at terminal width and prefixed with unicode
/// so it's easy to tell where a big log statement begins and ends.
pub fn multiline_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let size = termwidth().min(74);
    let wrap_options = Options::new(size)
        .initial_indent(FIRST_LINE)
        .subsequent_indent(CONTINUED_LINE);

    let mut full_line = String::new();
    writeln!(
        full_line,
        "{} [{}] [{}:{}]",
        record.level(),
        now.now().format("%H:%M:%S%.6f"),
        record.file().unwrap_or("<unnamed>"),
        record.line().unwrap_or(0),
    )
    .expect("unable to format first log line");

    write!(&mut full_line, "{}", &record.args())
        .expect("unable to format log!");

    let wrapped = textwrap::fill(&full_line, wrap_options);
    writeln!(w, "{}", mark_last_line(wrapped))
}

/// Swap the prefix of the final wrapped line for the closing marker.
fn mark_last_line(wrapped: String) -> String {
    let matcher = LAST_LINE_MATCHER.get_or_init(|| {
        Regex::new(r"(┃)(.*)$").expect("the last line pattern is valid")
    });
    matcher.replace(&wrapped, "┗$2").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_continued_line_gets_the_closing_marker() {
        let wrapped = "┏ DEBUG [x]\n┃ Allocated 268MB\n┃ (total: 268MB)";

        assert_eq!(
            mark_last_line(wrapped.to_owned()),
            "┏ DEBUG [x]\n┃ Allocated 268MB\n┗ (total: 268MB)"
        );
    }

    #[test]
    fn single_line_records_are_unchanged() {
        let wrapped = "┏ INFO [x]";

        assert_eq!(mark_last_line(wrapped.to_owned()), wrapped);
    }
}
