mod position;
mod scanner;


pub use position::{offset_to_position, Position};
pub use scanner::{LineMode, Scanner, ScannerState, Token, TokenKind};
