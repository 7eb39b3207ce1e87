//! Frame vector and 4400 bps bitstream packing.
//!
//! A coded frame travels between the codec and the channel layer as eight
//! words of fixed widths (12, 12, 12, 12, 11, 11, 11, 7 bits, 88 bits in
//! all), and over the wire as 11 bytes. The 88-bit space is one MSB-first
//! stream: bit `i` of the stream lives in byte `i >> 3` under the mask
//! `0x80 >> (i & 7)`.

/// Bit widths of the eight frame-vector words.
pub const FIELD_WIDTHS: [u32; 8] = [12, 12, 12, 12, 11, 11, 11, 7];

/// Total payload bits per coded frame.
pub const FRAME_BITS: usize = 88;

/// Bytes per coded frame on the wire.
pub const FRAME_BYTES: usize = 11;

/// Quantized parameter frame as exchanged with channel coders.
///
/// Word values outside their field width are masked off on construction
/// and unpacking, so a `FrameVector` always holds a representable frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameVector {
    /// Field words, each masked to its width.
    pub words: [u16; 8],
}

impl FrameVector {
    /// Builds a frame vector, masking each word to its field width.
    pub fn new(words: [u16; 8]) -> Self {
        let mut fv = FrameVector { words };
        for (w, &width) in fv.words.iter_mut().zip(FIELD_WIDTHS.iter()) {
            *w &= (1 << width) - 1;
        }
        fv
    }

    /// Serializes to the 11-byte wire format, MSB-first.
    pub fn pack(&self) -> [u8; FRAME_BYTES] {
        let mut bytes = [0u8; FRAME_BYTES];
        let mut bit = 0;
        for (&w, &width) in self.words.iter().zip(FIELD_WIDTHS.iter()) {
            for k in (0..width).rev() {
                if w >> k & 1 != 0 {
                    bytes[bit >> 3] |= 0x80 >> (bit & 7);
                }
                bit += 1;
            }
        }
        bytes
    }

    /// Deserializes from the 11-byte wire format. Lossless inverse of
    /// [`pack`](Self::pack).
    pub fn unpack(bytes: &[u8; FRAME_BYTES]) -> Self {
        let mut words = [0u16; 8];
        let mut bit = 0;
        for (w, &width) in words.iter_mut().zip(FIELD_WIDTHS.iter()) {
            for _ in 0..width {
                *w <<= 1;
                if bytes[bit >> 3] & (0x80 >> (bit & 7)) != 0 {
                    *w |= 1;
                }
                bit += 1;
            }
        }
        FrameVector { words }
    }
}

/// Writes variable-width fields MSB-first across the frame-vector words.
///
/// The vector starts zeroed, so any bits left unwritten at the end of the
/// parameter stream are the zero padding the format calls for.
pub struct BitWriter {
    fv: FrameVector,
    pos: usize,
}

impl BitWriter {
    /// Starts an empty frame with every bit zero.
    pub fn new() -> Self {
        BitWriter {
            fv: FrameVector::default(),
            pos: 0,
        }
    }

    /// Appends the low `width` bits of `value`, most significant first.
    pub fn put(&mut self, value: u16, width: u32) {
        debug_assert!(self.pos + width as usize <= FRAME_BITS);
        for k in (0..width).rev() {
            if value >> k & 1 != 0 {
                let (word, shift) = locate(self.pos);
                self.fv.words[word] |= 1 << shift;
            }
            self.pos += 1;
        }
    }

    /// Bits not yet written.
    pub fn remaining(&self) -> usize {
        FRAME_BITS - self.pos
    }

    /// Returns the completed frame vector.
    pub fn finish(self) -> FrameVector {
        self.fv
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads variable-width fields back out of a frame vector in stream order.
pub struct BitReader<'a> {
    fv: &'a FrameVector,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Starts reading at the first stream bit.
    pub fn new(fv: &'a FrameVector) -> Self {
        BitReader { fv, pos: 0 }
    }

    /// Reads the next `width` bits as an unsigned value.
    pub fn get(&mut self, width: u32) -> u16 {
        debug_assert!(self.pos + width as usize <= FRAME_BITS);
        let mut value = 0;
        for _ in 0..width {
            let (word, shift) = locate(self.pos);
            value <<= 1;
            value |= self.fv.words[word] >> shift & 1;
            self.pos += 1;
        }
        value
    }

    /// Bits not yet read.
    pub fn remaining(&self) -> usize {
        FRAME_BITS - self.pos
    }
}

/// Maps a flat stream position to (word index, shift within that word).
#[inline]
fn locate(pos: usize) -> (usize, u32) {
    let mut p = pos as u32;
    for (i, &width) in FIELD_WIDTHS.iter().enumerate() {
        if p < width {
            return (i, width - 1 - p);
        }
        p -= width;
    }
    unreachable!("bit position {} out of frame", pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths_cover_the_frame() {
        assert_eq!(FIELD_WIDTHS.iter().sum::<u32>() as usize, FRAME_BITS);
        assert_eq!(FRAME_BITS, FRAME_BYTES * 8);
    }

    #[test]
    fn test_all_ones_unpack() {
        let fv = FrameVector::unpack(&[0xff; FRAME_BYTES]);
        assert_eq!(
            fv.words,
            [4095, 4095, 4095, 4095, 2047, 2047, 2047, 127]
        );
        assert_eq!(fv.pack(), [0xff; FRAME_BYTES]);
    }

    #[test]
    fn test_all_zero_is_stable() {
        let fv = FrameVector::default();
        assert_eq!(fv.pack(), [0u8; FRAME_BYTES]);
        assert_eq!(FrameVector::unpack(&[0u8; FRAME_BYTES]), fv);
    }

    #[test]
    fn test_pack_is_msb_first() {
        // Top bit of word 0 is the first bit on the wire.
        let fv = FrameVector::new([0x800, 0, 0, 0, 0, 0, 0, 0]);
        let bytes = fv.pack();
        assert_eq!(bytes[0], 0x80);
        assert!(bytes[1..].iter().all(|&b| b == 0));

        // Last bit of word 7 is the last bit on the wire.
        let fv = FrameVector::new([0, 0, 0, 0, 0, 0, 0, 1]);
        let bytes = fv.pack();
        assert_eq!(bytes[10], 0x01);
        assert!(bytes[..10].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_word_boundaries_on_the_wire() {
        // Word 1 starts at stream bit 12: byte 1, mask 0x08.
        let fv = FrameVector::new([0, 0x800, 0, 0, 0, 0, 0, 0]);
        assert_eq!(fv.pack()[1], 0x08);
        // Word 4 starts at stream bit 48: byte 6, mask 0x80.
        let fv = FrameVector::new([0, 0, 0, 0, 0x400, 0, 0, 0]);
        assert_eq!(fv.pack()[6], 0x80);
    }

    #[test]
    fn test_round_trip_mixed_pattern() {
        let fv = FrameVector::new([0xa5a, 0x0f0, 0xfff, 0x123, 0x555, 0x2aa, 0x7ff, 0x41]);
        assert_eq!(FrameVector::unpack(&fv.pack()), fv);
    }

    #[test]
    fn test_new_masks_oversized_words() {
        let fv = FrameVector::new([0xffff; 8]);
        assert_eq!(
            fv.words,
            [4095, 4095, 4095, 4095, 2047, 2047, 2047, 127]
        );
    }

    #[test]
    fn test_writer_reader_field_stream() {
        let mut w = BitWriter::new();
        w.put(0xb7, 8); // pitch index
        w.put(0b101, 3); // three voicing bits
        w.put(0x2a, 6); // gain index
        w.put(0x1f, 5);
        w.put(0x00, 4);
        w.put(0x3, 2);
        let used = FRAME_BITS - w.remaining();
        assert_eq!(used, 28);
        let fv = w.finish();

        let mut r = BitReader::new(&fv);
        assert_eq!(r.get(8), 0xb7);
        assert_eq!(r.get(3), 0b101);
        assert_eq!(r.get(6), 0x2a);
        assert_eq!(r.get(5), 0x1f);
        assert_eq!(r.get(4), 0x00);
        assert_eq!(r.get(2), 0x3);
        assert_eq!(r.remaining(), FRAME_BITS - used);
    }

    #[test]
    fn test_writer_spans_word_boundaries() {
        // A 10 + 10 + 10 split straddles the first three words.
        let mut w = BitWriter::new();
        w.put(0x3ff, 10);
        w.put(0x000, 10);
        w.put(0x3ff, 10);
        let fv = w.finish();
        let mut r = BitReader::new(&fv);
        assert_eq!(r.get(10), 0x3ff);
        assert_eq!(r.get(10), 0x000);
        assert_eq!(r.get(10), 0x3ff);
    }
}
