// Incremental text/event-stream wire parser
//
// Chunks from the transport can split records (and even UTF-8 sequences)
// anywhere, so the parser buffers raw bytes and only interprets complete
// lines. A blank line dispatches the accumulated event.

/// One complete server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Event name; `message` when the stream did not name the event.
    pub name: String,
    /// Data payload; multi-line `data:` fields are joined with `\n`.
    pub data: String,
    pub id: Option<String>,
}

pub const DEFAULT_EVENT_NAME: &str = "message";

#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    event_name: Option<String>,
    data_lines: Vec<String>,
    last_id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of transport bytes, returning every event completed by it
    /// in arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line) = self.take_line() {
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn take_line(&mut self) -> Option<String> {
        let newline = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=newline).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // Comment / keep-alive line.
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_name = Some(value.to_string()),
            "data" => self.data_lines.push(value.to_string()),
            "id" => self.last_id = Some(value.to_string()),
            // "retry" and unknown fields are ignored; reconnection is not
            // handled at this layer.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let name = self
            .event_name
            .take()
            .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string());
        if self.data_lines.is_empty() {
            // An event without data is not dispatched.
            return None;
        }
        let data = std::mem::take(&mut self.data_lines).join("\n");
        Some(SseEvent {
            name,
            data,
            id: self.last_id.clone(),
        })
    }
}
