//! Tolerant HTML table reader
//!
//! Turns an arbitrary, possibly malformed HTML document into
//! tables → rows → cells of plain text. The ECU status page mixes stray
//! `<center>` tags, `&nbsp;` padding and `<sup>o</sup>` degree markers into its
//! cells, so nothing here relies on the document being well-formed: the
//! html5ever tokenizer produces tags and decoded text, and table nesting is
//! tracked by a small state machine on top of it. Anything left open at the end
//! of the document is dropped.
//!
//! Input may arrive in chunks split at arbitrary positions (as long as each
//! chunk is valid UTF-8); the result is the same as feeding the whole document
//! at once.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Plain text of one `<td>`/`<th>`
pub type Cell = String;

/// Ordered cells of one `<tr>`
pub type Row = Vec<Cell>;

/// Ordered rows of one `<table>`
pub type Table = Vec<Row>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum State {
    #[default]
    Outside,
    InTable,
    InRow,
    InCell,
}

/// Table state machine fed by the tokenizer
#[derive(Debug, Default)]
struct TableSink {
    state: State,
    /// Inside `<script>`/`<style>`; their text never reaches a cell
    raw_text: bool,
    tables: Vec<Table>,
    table: Table,
    row: Row,
    cell: String,
}

impl TokenSink for TableSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => return self.open(&tag.name),
                TagKind::EndTag => self.close(&tag.name),
            },
            Token::CharacterTokens(text) => self.text(&text),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

impl TableSink {
    fn open(&mut self, name: &str) -> TokenSinkResult<()> {
        match name {
            "table" => {
                self.table.clear();
                self.row.clear();
                self.cell.clear();
                self.state = State::InTable;
            }
            "tr" if self.state != State::Outside => {
                self.row.clear();
                self.cell.clear();
                self.state = State::InRow;
            }
            "td" | "th" if matches!(self.state, State::InRow | State::InCell) => {
                self.cell.clear();
                self.state = State::InCell;
            }
            "script" => {
                self.raw_text = true;
                return TokenSinkResult::RawData(RawKind::ScriptData);
            }
            "style" => {
                self.raw_text = true;
                return TokenSinkResult::RawData(RawKind::Rawtext);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }

    fn close(&mut self, name: &str) {
        match (name, self.state) {
            ("script" | "style", _) => self.raw_text = false,
            ("td" | "th", State::InCell) => {
                let text = normalize_cell_text(&self.cell);
                self.row.push(text);
                self.cell.clear();
                self.state = State::InRow;
            }
            ("tr", State::InRow | State::InCell) => {
                self.table.push(std::mem::take(&mut self.row));
                self.cell.clear();
                self.state = State::InTable;
            }
            ("table", State::InTable | State::InRow | State::InCell) => {
                self.tables.push(std::mem::take(&mut self.table));
                self.row.clear();
                self.cell.clear();
                self.state = State::Outside;
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.state == State::InCell && !self.raw_text {
            self.cell.push_str(text);
        }
    }
}

/// Streaming table extractor.
///
/// ```
/// use helios::markup::Tabulator;
///
/// let mut t = Tabulator::new();
/// t.feed("<table><tr><td>a</td><td>b</t");
/// t.feed("d></tr></table>");
/// assert_eq!(t.finish(), vec![vec![vec!["a".to_string(), "b".to_string()]]]);
/// ```
pub struct Tabulator {
    tokenizer: Tokenizer<TableSink>,
    input: BufferQueue,
}

impl Default for Tabulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tabulator {
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(TableSink::default(), TokenizerOpts::default()),
            input: BufferQueue::new(),
        }
    }

    /// Feed the next piece of the document.
    pub fn feed(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from_slice(chunk));
        // The sink never yields a script handle, so feeding always runs to completion.
        let _ = self.tokenizer.feed(&mut self.input);
    }

    /// Flush what is left and return every finalised table in document order.
    pub fn finish(mut self) -> Vec<Table> {
        self.tokenizer.end();
        std::mem::take(&mut self.tokenizer.sink.tables)
    }
}

/// Read every table out of a complete document.
pub fn tabulate(html: &str) -> Vec<Table> {
    let mut tabulator = Tabulator::new();
    tabulator.feed(html);
    tabulator.finish()
}

/// Non-breaking spaces become spaces, whitespace runs collapse, ends are trimmed.
pub fn normalize_cell_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() || ch == '\u{a0}' {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}
