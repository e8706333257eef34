/// A single 32-bit word in the coprocessor command stream.
///
/// The `From` implementations define how the various argument shapes of
/// coprocessor commands are packed into words: pairs of 16-bit values put
/// the first value in the low half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CommandWord(u32);

impl CommandWord {
    pub const fn to_raw(&self) -> u32 {
        self.0
    }

    pub const fn to_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl From<u32> for CommandWord {
    #[inline]
    fn from(v: u32) -> Self {
        CommandWord(v)
    }
}

impl From<i32> for CommandWord {
    #[inline]
    fn from(v: i32) -> Self {
        CommandWord(v as u32)
    }
}

impl From<(u16, u16)> for CommandWord {
    #[inline]
    fn from(v: (u16, u16)) -> Self {
        CommandWord((v.0 as u32) | (v.1 as u32) << 16)
    }
}

impl From<(i16, i16)> for CommandWord {
    #[inline]
    fn from(v: (i16, i16)) -> Self {
        let a = v.0 as u16;
        let b = v.1 as u16;
        CommandWord((a as u32) | (b as u32) << 16)
    }
}

impl From<(u8, u8, u8, u8)> for CommandWord {
    #[inline]
    fn from(v: (u8, u8, u8, u8)) -> Self {
        CommandWord((v.0 as u32) | (v.1 as u32) << 8 | (v.2 as u32) << 16 | (v.3 as u32) << 24)
    }
}

/// Rounds a byte count up to the next multiple of the word size.
pub(crate) const fn round_up_4(len: usize) -> usize {
    (len + 3) & !3
}

/// Packs a stream of bytes into little-endian command words, padding the
/// final word with zeros.
pub(crate) fn command_words_for_bytes<Iter>(iter: Iter) -> ByteToCommandIter<Iter>
where
    Iter: core::iter::Iterator<Item = u8>,
{
    ByteToCommandIter { wrapped: iter }
}

pub(crate) struct ByteToCommandIter<I>
where
    I: core::iter::Iterator<Item = u8>,
{
    wrapped: I,
}

impl<I> Iterator for ByteToCommandIter<I>
where
    I: core::iter::Iterator<Item = u8>,
{
    type Item = CommandWord;

    fn next(&mut self) -> core::option::Option<Self::Item> {
        const SIZE: usize = core::mem::size_of::<u32>();

        let mut raw: u32 = 0;
        for i in 0..SIZE {
            match self.wrapped.next() {
                Some(byte) => {
                    raw = raw | ((byte as u32) << (i * 8));
                }
                None => {
                    if i == 0 {
                        return None;
                    } else {
                        break;
                    }
                }
            }
        }
        return Some(CommandWord(raw));
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.wrapped.size_hint();
        (
            round_up_4(lower) / 4,
            upper.map(|upper| round_up_4(upper) / 4),
        )
    }
}

/// A ByteToCommandIter is fused if the wrapped iterator is also fused.
impl<I> core::iter::FusedIterator for ByteToCommandIter<I> where
    I: core::iter::Iterator<Item = u8> + core::iter::FusedIterator
{
}
