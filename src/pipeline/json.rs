//! Incremental JSON framing for the streaming pipeline.
//!
//! Pages arrive as raw bytes, split at arbitrary boundaries, and are consumed
//! as a single concatenated stream of JSON documents (one document per page).
//! The scanners here frame just enough of that stream to drive the pipeline
//! without ever buffering a whole document:
//!
//! - [`FieldScanner`] captures the first value of a named top-level key — the
//!   control path uses it to pull `total_pages` out of a response head.
//! - [`ArrayElementScanner`] captures each element of a named top-level array
//!   key as soon as the element's last byte arrives — the data path uses it
//!   to frame records.
//!
//! Both reset at document boundaries, so two pages' documents back to back
//! parse as a sequence. The scanners validate document structure; the
//! contents of a framed value are validated later when it is materialized
//! with `serde_json`. Inter-token whitespace is dropped from captures, which
//! keeps them valid JSON with identical meaning.

use crate::error::ParseError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    Object(ObjectState),
    Array(ArrayState),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ObjectState {
    /// Right after '{': a key or the end of an empty object
    KeyOrEnd,
    /// Right after ',': a key is required
    Key,
    /// Right after a key: ':' is required
    Colon,
    /// Right after ':': a value is required
    Value,
    /// Right after a value: ',' or '}'
    CommaOrEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArrayState {
    /// Right after '[': a value or the end of an empty array
    ValueOrEnd,
    /// Right after ',': a value is required
    Value,
    /// Right after a value: ',' or ']'
    CommaOrEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StringRole {
    Key,
    Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Capture the first top-level value of the target key
    Field,
    /// Capture each element of the target key's top-level array value
    ArrayElements,
}

struct Scanner {
    target: Vec<u8>,
    mode: Mode,
    stack: Vec<Frame>,
    in_string: Option<StringRole>,
    escaped: bool,
    in_primitive: bool,
    offset: u64,
    key_buf: Vec<u8>,
    /// The next value at top level belongs to the target key
    target_matched: bool,
    in_target_array: bool,
    target_array_depth: usize,
    capture: Option<Vec<u8>>,
    capture_depth: usize,
    completed: Vec<Vec<u8>>,
    field_done: bool,
}

impl Scanner {
    fn new(key: &str, mode: Mode) -> Self {
        Self {
            target: key.as_bytes().to_vec(),
            mode,
            stack: Vec::new(),
            in_string: None,
            escaped: false,
            in_primitive: false,
            offset: 0,
            key_buf: Vec::new(),
            target_matched: false,
            in_target_array: false,
            target_array_depth: 0,
            capture: None,
            capture_depth: 0,
            completed: Vec::new(),
            field_done: false,
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        for &b in chunk {
            if !self.field_done {
                self.consume(b)?;
            }
            self.offset += 1;
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), ParseError> {
        if self.in_string.is_some() || !self.stack.is_empty() {
            return Err(ParseError::UnexpectedEof {
                offset: self.offset,
            });
        }
        Ok(())
    }

    fn consume(&mut self, b: u8) -> Result<(), ParseError> {
        if self.in_string.is_some() {
            self.string_byte(b);
            return Ok(());
        }

        // Primitives end at the first structural or whitespace byte, which
        // then has to be interpreted in the enclosing context.
        if self.in_primitive {
            if Self::primitive_byte(b) {
                if let Some(buf) = &mut self.capture {
                    buf.push(b);
                }
                return Ok(());
            }
            if !Self::ends_primitive(b) {
                return Err(self.syntax(format!("unexpected byte '{}' in literal", b as char)));
            }
            self.in_primitive = false;
            self.value_complete();
        }

        if b.is_ascii_whitespace() {
            return Ok(());
        }

        match self.stack.last().copied() {
            None => self.document_byte(b),
            Some(Frame::Object(state)) => self.object_byte(state, b),
            Some(Frame::Array(state)) => self.array_byte(state, b),
        }
    }

    /// A byte inside a string literal; never a structural error.
    fn string_byte(&mut self, b: u8) {
        if self.escaped {
            self.escaped = false;
            self.string_content_byte(b);
        } else if b == b'\\' {
            self.escaped = true;
            self.string_content_byte(b);
        } else if b == b'"' {
            if let Some(buf) = &mut self.capture {
                buf.push(b);
            }
            match self.in_string.take() {
                Some(StringRole::Key) => self.key_complete(),
                Some(StringRole::Value) | None => self.value_complete(),
            }
        } else {
            self.string_content_byte(b);
        }
    }

    fn string_content_byte(&mut self, b: u8) {
        if let Some(buf) = &mut self.capture {
            buf.push(b);
        } else if self.in_string == Some(StringRole::Key) && self.stack.len() == 1 {
            self.key_buf.push(b);
        }
    }

    /// First byte of a new top-level document.
    fn document_byte(&mut self, b: u8) -> Result<(), ParseError> {
        match b {
            b'{' => self.stack.push(Frame::Object(ObjectState::KeyOrEnd)),
            b'[' => self.stack.push(Frame::Array(ArrayState::ValueOrEnd)),
            b'"' => self.in_string = Some(StringRole::Value),
            _ if Self::primitive_byte(b) => self.in_primitive = true,
            _ => {
                return Err(
                    self.syntax(format!("unexpected byte '{}' at document start", b as char))
                );
            }
        }
        Ok(())
    }

    fn object_byte(&mut self, state: ObjectState, b: u8) -> Result<(), ParseError> {
        match (state, b) {
            (ObjectState::KeyOrEnd | ObjectState::Key, b'"') => {
                if let Some(buf) = &mut self.capture {
                    buf.push(b);
                }
                self.key_buf.clear();
                self.in_string = Some(StringRole::Key);
            }
            (ObjectState::KeyOrEnd, b'}') => {
                if let Some(buf) = &mut self.capture {
                    buf.push(b);
                }
                self.stack.pop();
                self.value_complete();
            }
            (ObjectState::Colon, b':') => {
                if let Some(buf) = &mut self.capture {
                    buf.push(b);
                }
                self.set_object_state(ObjectState::Value);
            }
            (ObjectState::Value, _) => return self.value_start_byte(b),
            (ObjectState::CommaOrEnd, b',') => {
                if let Some(buf) = &mut self.capture {
                    buf.push(b);
                }
                self.set_object_state(ObjectState::Key);
            }
            (ObjectState::CommaOrEnd, b'}') => {
                if let Some(buf) = &mut self.capture {
                    buf.push(b);
                }
                self.stack.pop();
                self.value_complete();
            }
            _ => {
                return Err(self.syntax(format!("unexpected byte '{}' in object", b as char)));
            }
        }
        Ok(())
    }

    fn array_byte(&mut self, state: ArrayState, b: u8) -> Result<(), ParseError> {
        match (state, b) {
            (ArrayState::ValueOrEnd, b']') => self.close_array(b),
            (ArrayState::ValueOrEnd | ArrayState::Value, _) => return self.value_start_byte(b),
            (ArrayState::CommaOrEnd, b',') => {
                if let Some(buf) = &mut self.capture {
                    buf.push(b);
                }
                self.set_array_state(ArrayState::Value);
            }
            (ArrayState::CommaOrEnd, b']') => self.close_array(b),
            _ => {
                return Err(self.syntax(format!("unexpected byte '{}' in array", b as char)));
            }
        }
        Ok(())
    }

    /// First byte of a value in an object or array slot.
    fn value_start_byte(&mut self, b: u8) -> Result<(), ParseError> {
        let mut opens_target_array = false;
        if self.capture.is_none() {
            match self.mode {
                Mode::Field if self.target_matched && self.stack.len() == 1 => {
                    self.target_matched = false;
                    self.capture = Some(Vec::new());
                    self.capture_depth = self.stack.len();
                }
                Mode::ArrayElements if self.target_matched && self.stack.len() == 1 => {
                    if b != b'[' {
                        return Err(self.syntax("target field does not hold an array".to_string()));
                    }
                    self.target_matched = false;
                    opens_target_array = true;
                }
                Mode::ArrayElements
                    if self.in_target_array && self.stack.len() == self.target_array_depth =>
                {
                    self.capture = Some(Vec::new());
                    self.capture_depth = self.stack.len();
                }
                _ => {}
            }
        }
        if let Some(buf) = &mut self.capture {
            buf.push(b);
        }
        match b {
            b'{' => self.stack.push(Frame::Object(ObjectState::KeyOrEnd)),
            b'[' => {
                self.stack.push(Frame::Array(ArrayState::ValueOrEnd));
                if opens_target_array {
                    self.in_target_array = true;
                    self.target_array_depth = self.stack.len();
                }
            }
            b'"' => self.in_string = Some(StringRole::Value),
            _ if Self::primitive_byte(b) => self.in_primitive = true,
            _ => {
                return Err(self.syntax(format!("unexpected byte '{}' at value start", b as char)));
            }
        }
        Ok(())
    }

    fn close_array(&mut self, b: u8) {
        if let Some(buf) = &mut self.capture {
            buf.push(b);
        }
        if self.in_target_array && self.stack.len() == self.target_array_depth {
            self.in_target_array = false;
        }
        self.stack.pop();
        self.value_complete();
    }

    fn key_complete(&mut self) {
        if self.stack.len() == 1 {
            self.target_matched = self.key_buf == self.target;
        }
        self.set_object_state(ObjectState::Colon);
    }

    /// A value just finished (string closed, primitive delimited, or
    /// container popped). Finalizes an active capture when the value is the
    /// captured one, then advances the enclosing context.
    fn value_complete(&mut self) {
        if self.capture.is_some() && self.stack.len() == self.capture_depth {
            if let Some(buf) = self.capture.take() {
                self.completed.push(buf);
                if self.mode == Mode::Field {
                    self.field_done = true;
                }
            }
        }
        match self.stack.last_mut() {
            None => self.reset_document(),
            Some(Frame::Object(state)) => *state = ObjectState::CommaOrEnd,
            Some(Frame::Array(state)) => *state = ArrayState::CommaOrEnd,
        }
    }

    /// A top-level document just completed; the next byte starts a new one.
    fn reset_document(&mut self) {
        self.target_matched = false;
        self.in_target_array = false;
        self.target_array_depth = 0;
        self.key_buf.clear();
    }

    fn set_object_state(&mut self, new: ObjectState) {
        if let Some(Frame::Object(state)) = self.stack.last_mut() {
            *state = new;
        }
    }

    fn set_array_state(&mut self, new: ArrayState) {
        if let Some(Frame::Array(state)) = self.stack.last_mut() {
            *state = new;
        }
    }

    fn primitive_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'-' | b'+' | b'.')
    }

    fn ends_primitive(b: u8) -> bool {
        matches!(b, b',' | b']' | b'}') || b.is_ascii_whitespace()
    }

    fn syntax(&self, message: String) -> ParseError {
        ParseError::Syntax {
            offset: self.offset,
            message,
        }
    }
}

/// Captures the first top-level value of a named key.
///
/// Used on the control path: feed it response bytes until it yields the raw
/// value, then stop reading. Input after the capture is ignored.
pub(crate) struct FieldScanner {
    inner: Scanner,
}

impl FieldScanner {
    pub(crate) fn new(key: &str) -> Self {
        Self {
            inner: Scanner::new(key, Mode::Field),
        }
    }

    /// Feed a chunk; returns the raw value bytes once the value is complete.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Result<Option<Vec<u8>>, ParseError> {
        self.inner.push(chunk)?;
        Ok(self.inner.completed.pop())
    }
}

/// Captures each element of a named key's top-level array value, across one
/// or more concatenated documents.
pub(crate) struct ArrayElementScanner {
    inner: Scanner,
}

impl ArrayElementScanner {
    pub(crate) fn new(key: &str) -> Self {
        Self {
            inner: Scanner::new(key, Mode::ArrayElements),
        }
    }

    /// Feed a chunk; returns the raw bytes of every element completed by it.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Result<Vec<Vec<u8>>, ParseError> {
        self.inner.push(chunk)?;
        Ok(std::mem::take(&mut self.inner.completed))
    }

    /// Assert the stream ended at a document boundary.
    pub(crate) fn finish(&self) -> Result<(), ParseError> {
        self.inner.finish()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn field_in_one(key: &str, doc: &str) -> Option<Vec<u8>> {
        let mut scanner = FieldScanner::new(key);
        scanner.push(doc.as_bytes()).unwrap()
    }

    fn elements_in_one(key: &str, doc: &str) -> Vec<String> {
        let mut scanner = ArrayElementScanner::new(key);
        let out = scanner.push(doc.as_bytes()).unwrap();
        scanner.finish().unwrap();
        out.into_iter()
            .map(|raw| String::from_utf8(raw).unwrap())
            .collect()
    }

    #[test]
    fn test_field_found_in_whole_document() {
        let raw = field_in_one("total_pages", r#"{"page":1,"total_pages":2,"data":[]}"#);
        assert_eq!(raw.unwrap(), b"2");
    }

    #[test]
    fn test_field_found_before_document_ends() {
        // The scanner must yield the value as soon as it is complete, even
        // though the enclosing document is still open.
        let mut scanner = FieldScanner::new("total_pages");
        let raw = scanner.push(br#"{"total_pages": 12, "data": ["#).unwrap();
        assert_eq!(raw.unwrap(), b"12");
    }

    #[test]
    fn test_field_split_across_chunks() {
        let doc = r#"{"page":1,"total_pages":42,"data":[]}"#;
        // Split at every possible boundary, including mid-key and mid-number.
        for split in 0..doc.len() {
            let mut scanner = FieldScanner::new("total_pages");
            let mut found = scanner.push(doc[..split].as_bytes()).unwrap();
            if found.is_none() {
                found = scanner.push(doc[split..].as_bytes()).unwrap();
            }
            assert_eq!(found.unwrap(), b"42", "split at {split}");
        }
    }

    #[test]
    fn test_field_ignores_nested_occurrences() {
        let raw = field_in_one(
            "total_pages",
            r#"{"support":{"total_pages":99},"total_pages":3}"#,
        );
        assert_eq!(raw.unwrap(), b"3");
    }

    #[test]
    fn test_field_not_confused_by_string_contents() {
        let raw = field_in_one("total_pages", r#"{"note":"a\"}{total_pages","total_pages":7}"#);
        assert_eq!(raw.unwrap(), b"7");
    }

    #[test]
    fn test_field_absent_yields_none() {
        assert!(field_in_one("total_pages", r#"{"page":1,"data":[]}"#).is_none());
    }

    #[test]
    fn test_field_captures_string_value() {
        let raw = field_in_one("total_pages", r#"{"total_pages":"two"}"#);
        assert_eq!(raw.unwrap(), br#""two""#);
    }

    #[test]
    fn test_elements_simple() {
        let out = elements_in_one("data", r#"{"data":[{"a":1},{"b":2}],"total_pages":1}"#);
        assert_eq!(out, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn test_elements_empty_array() {
        let out = elements_in_one("data", r#"{"data":[],"total_pages":1}"#);
        assert!(out.is_empty());
    }

    #[test]
    fn test_elements_primitive_and_nested() {
        let out = elements_in_one("data", r#"{"data":[1,"x",true,{"deep":[{"data":[9]}]}]}"#);
        assert_eq!(out, vec!["1", r#""x""#, "true", r#"{"deep":[{"data":[9]}]}"#]);
    }

    #[test]
    fn test_elements_ignore_other_array_keys() {
        let out = elements_in_one("data", r#"{"ads":[1,2,3],"data":[{"a":1}],"more":[4]}"#);
        assert_eq!(out, vec![r#"{"a":1}"#]);
    }

    #[test]
    fn test_elements_split_across_chunks() {
        let doc = r#"{"page":1,"data":[{"first_name":"X","last_name":"Y"},{"first_name":"Z"}]}"#;
        for split in 0..doc.len() {
            let mut scanner = ArrayElementScanner::new("data");
            let mut out = scanner.push(doc[..split].as_bytes()).unwrap();
            out.extend(scanner.push(doc[split..].as_bytes()).unwrap());
            scanner.finish().unwrap();
            assert_eq!(out.len(), 2, "split at {split}");
            assert_eq!(out[0], br#"{"first_name":"X","last_name":"Y"}"#, "split at {split}");
        }
    }

    #[test]
    fn test_elements_across_concatenated_documents() {
        let stream = concat!(
            r#"{"data":[{"a":1}],"total_pages":2}"#,
            r#"{"data":[{"b":2},{"c":3}],"total_pages":2}"#,
        );
        let out = elements_in_one("data", stream);
        assert_eq!(out, vec![r#"{"a":1}"#, r#"{"b":2}"#, r#"{"c":3}"#]);
    }

    #[test]
    fn test_elements_whitespace_between_documents() {
        let out = elements_in_one("data", "{\"data\":[1]}\r\n  {\"data\":[2]}");
        assert_eq!(out, vec!["1", "2"]);
    }

    #[test]
    fn test_elements_whitespace_inside_strings_preserved() {
        let out = elements_in_one("data", r#"{"data": [ {"name": "Ann  Lee"} ]}"#);
        assert_eq!(out, vec![r#"{"name":"Ann  Lee"}"#]);
    }

    #[test]
    fn test_non_array_target_is_rejected() {
        let mut scanner = ArrayElementScanner::new("data");
        let err = scanner.push(br#"{"data":"oops"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_structural_garbage_is_rejected() {
        let mut scanner = ArrayElementScanner::new("data");
        let err = scanner.push(br#"{"data":[}"#).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_colon_outside_object_is_rejected() {
        let mut scanner = ArrayElementScanner::new("data");
        assert!(scanner.push(b"[:").is_err());
    }

    #[test]
    fn test_truncated_document_fails_finish() {
        let mut scanner = ArrayElementScanner::new("data");
        scanner.push(br#"{"data":[{"a":1}"#).unwrap();
        let err = scanner.finish().unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_syntax_error_reports_offset() {
        let mut scanner = ArrayElementScanner::new("data");
        //                     0123456789
        let err = scanner.push(br#"{"a":1,,}"#).unwrap_err();
        match err {
            ParseError::Syntax { offset, .. } => assert_eq!(offset, 7),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
