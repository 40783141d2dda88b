//! Lexer for the session script language using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Room and zones
    #[token("container")]
    Container,
    #[token("zone")]
    Zone,

    // Catalog and plans
    #[token("template")]
    Template,
    #[token("plan")]
    Plan,
    #[token("element")]
    Element,
    #[token("close")]
    Close,

    // Matching
    #[token("assign")]
    Assign,
    #[token("to")]
    To,
    #[token("choose")]
    Choose,
    #[token("cancel")]
    Cancel,
    #[token("unassign")]
    Unassign,

    // Placement
    #[token("place")]
    Place,
    #[token("drop")]
    Drop,
    #[token("preview")]
    Preview,
    #[token("hover")]
    Hover,
    #[token("commit")]
    Commit,
    #[token("abort")]
    Abort,
    #[token("auto")]
    Auto,
    #[token("structure")]
    Structure,

    // Entity edits
    #[token("move")]
    Move,
    #[token("rotate")]
    Rotate,
    #[token("resize")]
    Resize,
    #[token("remove")]
    Remove,
    #[token("select")]
    Select,

    // Camera
    #[token("fit")]
    Fit,
    #[token("pan")]
    Pan,
    #[token("zoom")]
    Zoom,

    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,

    // Literals - identifiers must come after keywords. Ids such as
    // `fixed-cashier` may contain dashes.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_\-]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    String(String),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    BlockComment,
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}
