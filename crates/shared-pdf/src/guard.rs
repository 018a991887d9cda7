//! Structural checks that run before lopdf sees a document
//!
//! lopdf parses arrays and dictionaries recursively and follows a page's
//! `/Parent` links without cycle detection. Either can exhaust the thread
//! stack, and a stack overflow aborts the process instead of unwinding, so
//! `catch_unwind` cannot contain it. Every place lopdf starts parsing an
//! object is measured here first with a lexer that tokenizes the way lopdf
//! does, and documents nested past the limit are refused.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io::Read;
use std::str;

use flate2::read::ZlibDecoder;
use lopdf::{Document, Object, ObjectId};

use crate::decoder::PdfError;

/// Most bytes inflated from object streams in one document
pub const MAX_INFLATED_BYTES: usize = 64 * 1024 * 1024;

/// Longest `/Parent` chain followed from a page
pub const MAX_PARENT_CHAIN: usize = 256;

/// Compression layers unwrapped from a single object stream
const MAX_FILTER_LAYERS: usize = 4;

/// lopdf rejects literal strings nested deeper than this
const MAX_STRING_NESTING: usize = 128;

/// Object scans may cover this multiple of the input, plus [`MIN_SCAN_BUDGET`]
const SCAN_BUDGET_FACTOR: usize = 8;
const MIN_SCAN_BUDGET: usize = 1 << 20;

/// Keywords after which lopdf parses a single object
const OBJECT_ENTRY_KEYWORDS: [&[u8]; 2] = [b"obj", b"trailer"];

/// Keywords lopdf never reads as a value
const STRUCTURAL_KEYWORDS: [&[u8]; 7] = [
    b"obj",
    b"endobj",
    b"stream",
    b"endstream",
    b"xref",
    b"trailer",
    b"startxref",
];

/// Refuse a document whose objects are nested deeper than `max_depth`.
///
/// Covers every indirect object, the trailer dictionary and the objects
/// packed into object streams.
pub fn check_document(data: &[u8], max_depth: usize) -> Result<(), PdfError> {
    let mut scanner = Scanner::new(max_depth, data.len());

    for start in keyword_ends(data, &OBJECT_ENTRY_KEYWORDS) {
        let Some(object) = scanner.scan_object(data, start)? else {
            continue;
        };
        let Some(dict) = object.dict else {
            continue;
        };
        if dict.is_object_stream() {
            if let Some(body_start) = stream_body_start(data, object.end) {
                scanner.check_object_stream(&data[body_start..], &dict)?;
            }
        }
    }

    Ok(())
}

/// Refuse a loaded page whose text extraction would recurse without bound.
pub fn check_page(doc: &Document, page_id: ObjectId, max_depth: usize) -> Result<(), PdfError> {
    check_parent_chain(doc, page_id)?;
    let content = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    check_content(&content, max_depth)
}

fn check_parent_chain(doc: &Document, page_id: ObjectId) -> Result<(), PdfError> {
    let mut seen = BTreeSet::new();
    let mut current = page_id;

    loop {
        if !seen.insert(current) {
            return Err(PdfError::Refused(format!(
                "page tree loops back to object {} {}",
                current.0, current.1
            )));
        }
        if seen.len() > MAX_PARENT_CHAIN {
            return Err(PdfError::Refused(format!(
                "page tree is deeper than {} levels",
                MAX_PARENT_CHAIN
            )));
        }

        let parent = doc
            .get_dictionary(current)
            .and_then(|node| node.get(b"Parent"))
            .and_then(Object::as_reference);
        match parent {
            Ok(id) => current = id,
            Err(_) => return Ok(()),
        }
    }
}

/// Content streams are a flat run of operands and operators.
fn check_content(content: &[u8], max_depth: usize) -> Result<(), PdfError> {
    let mut lexer = Lexer::new(content, 0);
    let mut open = Vec::new();

    loop {
        match lexer.next_token() {
            Token::ArrayOpen => open.push(Container::Array),
            Token::DictOpen => open.push(Container::Dict),
            Token::ArrayClose => {
                if open.pop() != Some(Container::Array) {
                    return Ok(());
                }
            }
            Token::DictClose => {
                if open.pop() != Some(Container::Dict) {
                    return Ok(());
                }
            }
            Token::Name(_) | Token::Word(_) | Token::Text => {}
            Token::Invalid | Token::End => return Ok(()),
        }
        if open.len() > max_depth {
            return Err(PdfError::NestingTooDeep { limit: max_depth });
        }
    }
}

fn keyword_ends<'a>(
    data: &'a [u8],
    keywords: &'a [&'a [u8]],
) -> impl Iterator<Item = usize> + 'a {
    (0..data.len()).filter_map(move |at| {
        keywords
            .iter()
            .find(|keyword| data[at..].starts_with(keyword))
            .map(|keyword| at + keyword.len())
    })
}

/// Where a stream body begins when `stream` follows the dictionary ending at `dict_end`
fn stream_body_start(data: &[u8], dict_end: usize) -> Option<usize> {
    let mut lexer = Lexer::new(data, dict_end);
    lexer.skip_space();
    if !data[lexer.pos..].starts_with(b"stream") {
        return None;
    }

    let after = lexer.pos + b"stream".len();
    match data.get(after..) {
        Some([b'\r', b'\n', ..]) => Some(after + 2),
        Some([b'\r' | b'\n', ..]) => Some(after + 1),
        _ => None,
    }
}

/// Offsets of the objects packed after the `first` byte of an object stream
fn object_offsets(content: &[u8], first: i64) -> Vec<usize> {
    let Ok(first) = usize::try_from(first) else {
        return Vec::new();
    };
    let Some(index) = content.get(..first) else {
        return Vec::new();
    };
    let Ok(index) = str::from_utf8(index) else {
        return Vec::new();
    };

    let numbers: Vec<Option<u32>> = index
        .split_whitespace()
        .map(|number| number.parse().ok())
        .collect();
    numbers
        .chunks_exact(2)
        .filter_map(|pair| match pair {
            [Some(_), Some(offset)] => Some(first + *offset as usize),
            _ => None,
        })
        .collect()
}

struct Scanner {
    max_depth: usize,
    budget: usize,
    inflated: usize,
}

impl Scanner {
    fn new(max_depth: usize, input_len: usize) -> Self {
        Self {
            max_depth,
            budget: SCAN_BUDGET_FACTOR
                .saturating_mul(input_len)
                .saturating_add(MIN_SCAN_BUDGET),
            inflated: 0,
        }
    }

    fn charge(&mut self, scanned: usize) -> Result<(), PdfError> {
        self.budget = self.budget.checked_sub(scanned).ok_or_else(|| {
            PdfError::Refused("structure scan exceeded its work budget".to_string())
        })?;
        Ok(())
    }

    /// Scans the object starting at `start`. `None` means lopdf would not
    /// parse an object there either.
    fn scan_object(
        &mut self,
        data: &[u8],
        start: usize,
    ) -> Result<Option<ScannedObject>, PdfError> {
        let mut lexer = Lexer::new(data, start);
        let scanned = walk_object(&mut lexer, self.max_depth);
        self.charge(lexer.pos.saturating_sub(start))?;
        scanned
    }

    fn check_object_stream(&mut self, body: &[u8], dict: &DictSummary) -> Result<(), PdfError> {
        let content = match dict.encoding() {
            StreamEncoding::Raw => Cow::Borrowed(body),
            StreamEncoding::Flate(layers) => {
                let mut content = self.inflate(body)?;
                for _ in 1..layers {
                    content = self.inflate(&content)?;
                }
                Cow::Owned(content)
            }
            StreamEncoding::Unchecked => {
                return Err(PdfError::Refused(
                    "object stream encoding cannot be checked".to_string(),
                ))
            }
        };

        let Some(first) = dict.integer(b"First") else {
            return Ok(());
        };
        self.budget = self
            .budget
            .saturating_add(SCAN_BUDGET_FACTOR.saturating_mul(content.len()));
        for start in object_offsets(&content, first) {
            self.scan_object(&content, start)?;
        }
        Ok(())
    }

    /// Inflates to the end of `encoded`. A stream cut short by its `/Length`
    /// inflates to a prefix of this output.
    fn inflate(&mut self, encoded: &[u8]) -> Result<Vec<u8>, PdfError> {
        let remaining = MAX_INFLATED_BYTES.saturating_sub(self.inflated);
        let mut decoded = Vec::new();
        // A corrupt tail keeps what inflated before it
        let _ = ZlibDecoder::new(encoded)
            .take(remaining as u64 + 1)
            .read_to_end(&mut decoded);

        if decoded.len() > remaining {
            return Err(PdfError::Refused(format!(
                "object streams inflate past {} bytes",
                MAX_INFLATED_BYTES
            )));
        }
        self.inflated += decoded.len();
        Ok(decoded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Dict,
}

#[derive(Debug)]
struct ScannedObject {
    /// Offset just past the object
    end: usize,
    /// Top-level entries when the object is a dictionary
    dict: Option<DictSummary>,
}

/// A token at the top level of a dictionary
#[derive(Debug)]
enum TopItem {
    Name(Vec<u8>),
    Word(Vec<u8>),
    NameArray(Vec<Vec<u8>>),
    Other,
}

/// Array opened directly inside the top-level dictionary
#[derive(Debug, Default)]
struct OpenArray {
    names: Vec<Vec<u8>>,
    only_names: bool,
}

fn walk_object(
    lexer: &mut Lexer<'_>,
    max_depth: usize,
) -> Result<Option<ScannedObject>, PdfError> {
    let mut open: Vec<Container> = Vec::new();
    let mut top = Vec::new();
    let mut array: Option<OpenArray> = None;
    let mut is_dict = false;

    loop {
        let token = lexer.next_token();
        let depth = open.len();
        let in_top_dict = depth == 1 && is_dict;

        match token {
            Token::ArrayOpen | Token::DictOpen => {
                let container = if token == Token::ArrayOpen {
                    Container::Array
                } else {
                    Container::Dict
                };
                if depth == 0 {
                    is_dict = container == Container::Dict;
                } else if in_top_dict {
                    match container {
                        Container::Array => {
                            array = Some(OpenArray {
                                names: Vec::new(),
                                only_names: true,
                            })
                        }
                        Container::Dict => top.push(TopItem::Other),
                    }
                } else if depth == 2 {
                    if let Some(array) = array.as_mut() {
                        array.only_names = false;
                    }
                }

                open.push(container);
                if open.len() > max_depth {
                    return Err(PdfError::NestingTooDeep { limit: max_depth });
                }
            }
            Token::ArrayClose | Token::DictClose => {
                let container = if token == Token::ArrayClose {
                    Container::Array
                } else {
                    Container::Dict
                };
                if open.pop() != Some(container) {
                    return Ok(None);
                }
                if open.len() == 1 && container == Container::Array {
                    if let Some(closed) = array.take() {
                        top.push(if closed.only_names {
                            TopItem::NameArray(closed.names)
                        } else {
                            TopItem::Other
                        });
                    }
                }
            }
            Token::Word(word) if STRUCTURAL_KEYWORDS.contains(&word) => return Ok(None),
            Token::Invalid | Token::End => return Ok(None),
            Token::Name(name) => {
                if in_top_dict {
                    top.push(TopItem::Name(name));
                } else if depth == 2 {
                    if let Some(array) = array.as_mut() {
                        array.names.push(name);
                    }
                }
            }
            Token::Word(word) => {
                if in_top_dict {
                    top.push(TopItem::Word(word.to_vec()));
                } else if depth == 2 {
                    if let Some(array) = array.as_mut() {
                        array.only_names = false;
                    }
                }
            }
            Token::Text => {
                if in_top_dict {
                    top.push(TopItem::Other);
                } else if depth == 2 {
                    if let Some(array) = array.as_mut() {
                        array.only_names = false;
                    }
                }
            }
        }

        if open.is_empty() {
            return Ok(Some(ScannedObject {
                end: lexer.pos,
                dict: is_dict.then(|| DictSummary::from_items(top)),
            }));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Name(Vec<u8>),
    Integer(i64),
    NameArray(Vec<Vec<u8>>),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEncoding {
    Raw,
    Flate(usize),
    /// lopdf decodes it, but not in a way checked here
    Unchecked,
}

/// The top-level entries of a dictionary, as far as object streams need them
#[derive(Debug, Default)]
struct DictSummary {
    entries: Vec<(Vec<u8>, Value)>,
}

impl DictSummary {
    fn from_items(items: Vec<TopItem>) -> Self {
        let mut entries = Vec::new();
        let mut items = items.into_iter().peekable();

        while let Some(item) = items.next() {
            let TopItem::Name(key) = item else {
                continue;
            };
            let value = match items.next() {
                Some(TopItem::Name(name)) => Value::Name(name),
                // `12 0 R` is a reference
                Some(TopItem::Word(_)) if matches!(items.peek(), Some(TopItem::Word(_))) => {
                    items.next();
                    items.next();
                    Value::Other
                }
                Some(TopItem::Word(word)) => str::from_utf8(&word)
                    .ok()
                    .and_then(|word| word.parse().ok())
                    .map_or(Value::Other, Value::Integer),
                Some(TopItem::NameArray(names)) => Value::NameArray(names),
                Some(TopItem::Other) => Value::Other,
                None => break,
            };
            entries.push((key, value));
        }

        Self { entries }
    }

    fn get(&self, key: &[u8]) -> Option<&Value> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, value)| value)
    }

    fn integer(&self, key: &[u8]) -> Option<i64> {
        match self.get(key) {
            Some(Value::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    fn is_object_stream(&self) -> bool {
        matches!(self.get(b"Type"), Some(Value::Name(name)) if name.as_slice() == b"ObjStm")
    }

    fn encoding(&self) -> StreamEncoding {
        if matches!(self.get(b"Subtype"), Some(Value::Name(name)) if name.as_slice() == b"Image") {
            return StreamEncoding::Raw;
        }

        let filters: Vec<&[u8]> = match self.get(b"Filter") {
            Some(Value::Name(name)) => vec![name.as_slice()],
            Some(Value::NameArray(names)) => names.iter().map(Vec::as_slice).collect(),
            _ => return StreamEncoding::Raw,
        };
        let known = |filter: &&[u8]| *filter == b"FlateDecode" || *filter == b"LZWDecode";
        if filters.is_empty() || !filters.iter().all(known) {
            return StreamEncoding::Raw;
        }

        let lzw = filters.iter().any(|filter| *filter == b"LZWDecode");
        if lzw || filters.len() > MAX_FILTER_LAYERS || self.get(b"DecodeParms").is_some() {
            StreamEncoding::Unchecked
        } else {
            StreamEncoding::Flate(filters.len())
        }
    }
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    ArrayOpen,
    ArrayClose,
    DictOpen,
    DictClose,
    /// Name with `#xx` escapes decoded
    Name(Vec<u8>),
    /// Run of regular characters: numbers, keywords, operators
    Word(&'a [u8]),
    /// Literal or hex string
    Text,
    Invalid,
    End,
}

fn is_whitespace(byte: u8) -> bool {
    b" \t\n\r\0\x0C".contains(&byte)
}

fn is_delimiter(byte: u8) -> bool {
    b"()<>[]{}/%".contains(&byte)
}

fn is_regular(byte: u8) -> bool {
    !is_whitespace(byte) && !is_delimiter(byte)
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    match pair {
        [high, low] if high.is_ascii_hexdigit() && low.is_ascii_hexdigit() => {
            u8::from_str_radix(str::from_utf8(pair).ok()?, 16).ok()
        }
        _ => None,
    }
}

struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Skips whitespace and comments
    fn skip_space(&mut self) {
        while let Some(&byte) = self.data.get(self.pos) {
            if is_whitespace(byte) {
                self.pos += 1;
            } else if byte == b'%' {
                while self
                    .data
                    .get(self.pos)
                    .is_some_and(|&b| b != b'\r' && b != b'\n')
                {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Token<'a> {
        self.skip_space();
        let Some(&byte) = self.data.get(self.pos) else {
            return Token::End;
        };
        let next = self.data.get(self.pos + 1).copied();

        match byte {
            b'[' => {
                self.pos += 1;
                Token::ArrayOpen
            }
            b']' => {
                self.pos += 1;
                Token::ArrayClose
            }
            b'<' if next == Some(b'<') => {
                self.pos += 2;
                Token::DictOpen
            }
            b'>' if next == Some(b'>') => {
                self.pos += 2;
                Token::DictClose
            }
            b'<' => self.hex_string(),
            b'(' => self.literal_string(),
            b'/' => self.name(),
            b')' | b'>' | b'{' | b'}' => Token::Invalid,
            _ => self.word(),
        }
    }

    fn hex_string(&mut self) -> Token<'a> {
        self.pos += 1;
        while let Some(&byte) = self.data.get(self.pos) {
            self.pos += 1;
            if byte == b'>' {
                return Token::Text;
            }
            if !byte.is_ascii_hexdigit() && !is_whitespace(byte) {
                return Token::Invalid;
            }
        }
        Token::Invalid
    }

    fn literal_string(&mut self) -> Token<'a> {
        self.pos += 1;
        let mut depth = 1usize;
        while let Some(&byte) = self.data.get(self.pos) {
            self.pos += 1;
            match byte {
                b'\\' => self.pos += 1,
                b'(' => {
                    depth += 1;
                    if depth > MAX_STRING_NESTING {
                        return Token::Invalid;
                    }
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Token::Text;
                    }
                }
                _ => {}
            }
        }
        Token::Invalid
    }

    fn name(&mut self) -> Token<'a> {
        self.pos += 1;
        let mut name = Vec::new();
        while let Some(&byte) = self.data.get(self.pos) {
            if byte == b'#' {
                match self.data.get(self.pos + 1..self.pos + 3).and_then(hex_byte) {
                    Some(decoded) => {
                        name.push(decoded);
                        self.pos += 3;
                    }
                    None => break,
                }
            } else if is_regular(byte) {
                name.push(byte);
                self.pos += 1;
            } else {
                break;
            }
        }
        Token::Name(name)
    }

    fn word(&mut self) -> Token<'a> {
        let start = self.pos;
        while self.data.get(self.pos).is_some_and(|&b| is_regular(b)) {
            self.pos += 1;
        }
        Token::Word(&self.data[start..self.pos])
    }
}
