//! Incremental server-sent events decoding.

/// Buffers a byte stream and yields the `data` payload of each complete event.
///
/// Events end at a blank line (`\n\n` or `\r\n\r\n`). Boundaries are ASCII,
/// so a multi-byte character split across network chunks is reassembled
/// before it is decoded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the payloads completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some((end, delimiter)) = find_boundary(&self.buffer) {
            let event: Vec<u8> = self.buffer.drain(..end + delimiter).collect();
            if let Some(data) = event_data(&event[..end]) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Bytes of an event that has not been terminated yet.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|at| (at, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|at| (at, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Joins the `data:` lines of one event. Comments and other fields are
/// ignored; an event without data yields nothing.
fn event_data(event: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(event);
    let lines: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
