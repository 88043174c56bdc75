#[derive(Debug)]
struct Segment {
    name: String,
    first_line: usize,
}

/// Named sources laid out one after another with continuous line numbers. Errors are
/// mapped back to the segment and line they came from.
#[derive(Debug)]
pub struct SourceMap {
    segments: Vec<Segment>,
    next_line: usize,
}

impl SourceMap {
    pub fn new() -> Self {
        SourceMap {
            segments: Vec::new(),
            next_line: 1,
        }
    }

    /// Appends a segment. Returns the global line its first line lands on.
    pub fn add(&mut self, name: &str, src: &str) -> usize {
        let first_line = self.next_line;
        self.segments.push(Segment {
            name: String::from(name),
            first_line,
        });

        // a segment without a trailing newline still ends its last line
        self.next_line += src.matches('\n').count();
        if !src.ends_with('\n') {
            self.next_line += 1;
        }
        first_line
    }

    /// Segment name and local line of a global (1-based) line.
    pub fn locate(&self, line: usize) -> (&str, usize) {
        match self
            .segments
            .iter()
            .rev()
            .find(|segment| segment.first_line <= line)
        {
            Some(segment) => (&segment.name, line - segment.first_line + 1),
            None => ("<unknown>", line),
        }
    }
}

impl Default for SourceMap {
    fn default() -> Self {
        SourceMap::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::source::SourceMap;

    #[test]
    fn test_locate_lines_across_segments() {
        let mut map = SourceMap::new();
        assert_eq!(map.add("prelude", "a\nb\nc"), 1);
        assert_eq!(map.add("main", "x\ny\n"), 4);
        assert_eq!(map.add("repl", "z"), 6);

        assert_eq!(map.locate(1), ("prelude", 1));
        assert_eq!(map.locate(3), ("prelude", 3));
        assert_eq!(map.locate(4), ("main", 1));
        assert_eq!(map.locate(5), ("main", 2));
        assert_eq!(map.locate(6), ("repl", 1));
        assert_eq!(map.add("next", ""), 7);
    }

    #[test]
    fn test_empty_map() {
        let map = SourceMap::new();
        assert_eq!(map.locate(3), ("<unknown>", 3));
    }
}
