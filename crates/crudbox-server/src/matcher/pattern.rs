//! Path pattern compilation.
//!
//! A stored endpoint path is a literal path that may contain parameter
//! segments such as `/users/{id}`. A parameter segment matches any single
//! non-empty request segment; there is no wildcard suffix matching.

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
            _ => Segment::Literal(raw.to_string()),
        }
    }

    /// Check a single concrete request segment.
    fn accepts(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(value) => value == segment,
            Segment::Param(_) => !segment.is_empty(),
        }
    }

    /// Whether some concrete segment is accepted by both.
    fn overlaps(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Param(_), Segment::Literal(lit)) | (Segment::Literal(lit), Segment::Param(_)) => {
                !lit.is_empty()
            }
            (Segment::Param(_), Segment::Param(_)) => true,
        }
    }
}

/// Compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    literal_count: usize,
}

impl PathPattern {
    /// Compile a normalised path pattern.
    pub fn compile(pattern: &str) -> Self {
        let segments: Vec<Segment> = split_segments(pattern).map(Segment::parse).collect();
        let literal_count = segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        Self {
            segments,
            literal_count,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of non-parameter segments; higher is more specific.
    pub fn literal_count(&self) -> usize {
        self.literal_count
    }

    pub fn is_parameterized(&self) -> bool {
        self.literal_count < self.segments.len()
    }

    /// Segment-by-segment match against a concrete request path.
    pub fn matches(&self, path: &str) -> bool {
        let mut remaining = self.segments.iter();
        for segment in split_segments(path) {
            match remaining.next() {
                Some(expected) if expected.accepts(segment) => {}
                _ => return false,
            }
        }
        remaining.next().is_none()
    }

    /// Whether at least one concrete path is matched by both patterns.
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.overlaps(b))
    }
}

fn split_segments(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}
