/// All lexemes of the clerk language.
#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
    // Keywords
    Do,
    If,
    Then,
    Else,

    // Symbols
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    Semicolon, // ;
    Eq,        // =
    Bar,       // |
    Minus,     // -
    LeftArrow, // <-

    // Literals
    Integer(i64),
    Ident(String),

    // End of file
    Eof,
}

impl Lexeme {
    /// Try to match an identifier string to a keyword.
    pub fn from_keyword(s: &str) -> Option<Lexeme> {
        match s {
            "do" => Some(Lexeme::Do),
            "if" => Some(Lexeme::If),
            "then" => Some(Lexeme::Then),
            "else" => Some(Lexeme::Else),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Lexeme::Do => "'do'",
            Lexeme::If => "'if'",
            Lexeme::Then => "'then'",
            Lexeme::Else => "'else'",
            Lexeme::LParen => "'('",
            Lexeme::RParen => "')'",
            Lexeme::LBrace => "'{'",
            Lexeme::RBrace => "'}'",
            Lexeme::Semicolon => "';'",
            Lexeme::Eq => "'='",
            Lexeme::Bar => "'|'",
            Lexeme::Minus => "'-'",
            Lexeme::LeftArrow => "'<-'",
            Lexeme::Integer(_) => "integer literal",
            Lexeme::Ident(_) => "identifier",
            Lexeme::Eof => "end of file",
        }
    }

    /// Whether this lexeme can begin a call argument.
    pub fn starts_argument(&self) -> bool {
        matches!(
            self,
            Lexeme::Ident(_) | Lexeme::Integer(_) | Lexeme::Minus | Lexeme::LParen
        )
    }
}
