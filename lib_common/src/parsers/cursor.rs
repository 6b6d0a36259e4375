/// # Line Cursor
///
/// A forward-only cursor over the non-empty, trimmed lines of a message body.
/// Every consuming call moves the position strictly forward, so a scanner built
/// on it always terminates.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        Self { lines, pos: 0 }
    }

    /// The current line, without consuming it.
    pub fn peek(&self) -> Option<&'a str> {
        self.peek_at(0)
    }

    /// The line `offset` positions ahead of the current one.
    pub fn peek_at(&self, offset: usize) -> Option<&'a str> {
        self.lines.get(self.pos + offset).copied()
    }

    /// Skips `n` lines, stopping at the end.
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.lines.len());
    }

    /// Consumes and returns the current line.
    pub fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    /// Consumes lines until `stop` matches (the matching line is left in place)
    /// or the input ends.
    pub fn take_until<F>(&mut self, stop: F) -> Vec<&'a str>
    where
        F: Fn(&str) -> bool,
    {
        let mut taken = Vec::new();
        while let Some(line) = self.peek() {
            if stop(line) {
                break;
            }
            taken.push(line);
            self.pos += 1;
        }
        taken
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.lines.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}
