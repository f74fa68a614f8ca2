use std::fmt;

/// Formats a slice as a markdown-style list with one entry per line, so a
/// single log record can carry a whole heap summary or leak report.
pub struct PrettyList<'data, T>(pub &'data [T]);

impl<T> PrettyList<'_, T> {
    fn write_entries<F>(
        &self,
        f: &mut fmt::Formatter<'_>,
        write_entry: F,
    ) -> fmt::Result
    where
        F: Fn(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
    {
        if self.0.is_empty() {
            return f.write_str("(none)");
        }
        for entry in self.0 {
            f.write_str("\n- ")?;
            write_entry(f, entry)?;
        }
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for PrettyList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_entries(f, |f, entry| {
            if f.alternate() {
                write!(f, "{:#?}", entry)
            } else {
                write!(f, "{:?}", entry)
            }
        })
    }
}

impl<T: fmt::Display> fmt::Display for PrettyList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_entries(f, |f, entry| write!(f, "{}", entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_writes_one_line_per_entry() {
        let entries = ["heap 0", "heap 1"];

        let formatted = format!("{}", PrettyList(&entries));

        assert_eq!(formatted, "\n- heap 0\n- heap 1");
    }

    #[test]
    fn debug_uses_the_entry_debug_format() {
        let entries = [(0, 16), (16, 128)];

        let formatted = format!("{:?}", PrettyList(&entries));

        assert_eq!(formatted, "\n- (0, 16)\n- (16, 128)");
    }

    #[test]
    fn empty_lists_say_so() {
        let entries: [u32; 0] = [];

        assert_eq!(format!("{}", PrettyList(&entries)), "(none)");
    }
}
