use nom::{IResult, Parser};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Token<'a> {
    Literal(&'a [u8]),
    Remapped(u8),
    Null(&'a [u8]),
}

// Keep this in sync with evecopro::strings::REMAP_TABLE. The integration
// tests in evecopro compare the two.
const REMAP_TABLE: [([u8; 2], u8); 8] = [
    ([0xc2, 0xb0], 0x18),
    ([0xc3, 0x9f], 0x19),
    ([0xc3, 0x84], 0x1a),
    ([0xc3, 0x96], 0x1b),
    ([0xc3, 0x9c], 0x1c),
    ([0xc3, 0xa4], 0x1d),
    ([0xc3, 0xb6], 0x1e),
    ([0xc3, 0xbc], 0x1f),
];

const NULL_BYTE: u8 = 0x00;

pub(crate) fn next_token<'a>(input: &'a [u8]) -> (Token<'a>, &'a [u8]) {
    match text_token(input) {
        Ok((remain, token)) => (token, remain),
        // text_any_byte accepts anything non-empty, so this only happens
        // at the end of the input.
        Err(_) => (Token::Literal(input), &b""[..]),
    }
}

fn remap_pair(pair: &[u8]) -> Option<u8> {
    REMAP_TABLE
        .iter()
        .find(|(seq, _)| seq[..] == *pair)
        .map(|(_, code)| *code)
}

fn is_lead_byte(b: u8) -> bool {
    b == 0xc2 || b == 0xc3
}

fn text_remapped(i: &[u8]) -> IResult<&[u8], u8> {
    nom::combinator::map_opt(nom::bytes::complete::take(2_usize), remap_pair)(i)
}

fn text_null(i: &[u8]) -> IResult<&[u8], &[u8]> {
    nom::bytes::complete::tag(b"\x00")(i)
}

fn text_literal(i: &[u8]) -> IResult<&[u8], &[u8]> {
    nom::bytes::complete::take_till1(|b| b == NULL_BYTE || is_lead_byte(b))(i)
}

// A lead byte that doesn't start one of the remapped sequences passes
// through as-is.
fn text_any_byte(i: &[u8]) -> IResult<&[u8], &[u8]> {
    nom::bytes::complete::take(1_usize)(i)
}

fn text_token(i: &[u8]) -> IResult<&[u8], Token> {
    nom::branch::alt((
        text_remapped.map(|code| Token::Remapped(code)),
        text_null.map(|bytes| Token::Null(bytes)),
        text_literal.map(|bytes| Token::Literal(bytes)),
        text_any_byte.map(|bytes| Token::Literal(bytes)),
    ))(i)
}
