use std::fmt;

/// Random 128-bit token identifying one traversal frame.
///
/// Tokens key the family tree that collects closure entries for every open
/// ancestor frame. They only need to be unique within one serialize call.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineageToken(u128);

impl LineageToken {
    /// Draw a fresh token from the thread-local RNG.
    pub fn random() -> Self {
        Self(rand::random())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_be_bytes())
    }
}

impl fmt::Debug for LineageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineageToken({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for LineageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_distinct() {
        let tokens: HashSet<LineageToken> = (0..1000).map(|_| LineageToken::random()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn hex_is_32_chars() {
        assert_eq!(LineageToken::random().to_hex().len(), 32);
    }
}
