//! Character to state-bitmask encoding of observed genotypes.

/// Bitmask of the states a tip may be in at a single pattern.
pub type StateBits = u64;

/// Number of distinct digit states.
pub const DIGIT_STATE_NUM: usize = 10;

/// State assigned to characters that do not belong to the vocabulary.
pub const ILLEGAL_STATE: StateBits = 0;

/// Union of all digit states; used for missing or unknown observations.
pub const UNDETERMINED_STATE: StateBits = (1 << DIGIT_STATE_NUM) - 1;

const MISSING_STATE_BYTES: [u8; 4] = [b'-', b'?', b'N', b'n'];

/// Byte to state lookup table: `'0'..='9'` map to a single bit each, the
/// missing-data characters map to [`UNDETERMINED_STATE`] and every other
/// byte maps to [`ILLEGAL_STATE`].
pub const ALLELE_STATE_MAP: [StateBits; 256] = {
    let mut states = [ILLEGAL_STATE; 256];

    let mut digit = 0;
    while digit < DIGIT_STATE_NUM {
        states[b'0' as usize + digit] = 1 << digit;
        digit += 1;
    }

    let mut i = 0;
    while i < MISSING_STATE_BYTES.len() {
        states[MISSING_STATE_BYTES[i] as usize] = UNDETERMINED_STATE;
        i += 1;
    }

    states
};

/// Encoder backed by [`ALLELE_STATE_MAP`].
pub static ALLELE_STATE_ENCODER: StateEncoder = StateEncoder::new(ALLELE_STATE_MAP);

/// Maps each byte of a genotype string to its state bitmask.
#[derive(Debug, Clone)]
pub struct StateEncoder {
    map: [StateBits; 256],
}

impl StateEncoder {
    #[must_use]
    pub const fn new(map: [StateBits; 256]) -> Self {
        Self { map }
    }

    /// Returns the state of a single byte.
    #[inline(always)]
    #[must_use]
    pub fn state(&self, byte: u8) -> StateBits {
        self.map[byte as usize]
    }

    /// Encodes `token` into one state per byte.
    ///
    /// # Examples
    /// ```
    /// use qfml::state::ALLELE_STATE_ENCODER;
    ///
    /// assert_eq!(ALLELE_STATE_ENCODER.encode("5"), vec![1 << 5]);
    /// assert_eq!(ALLELE_STATE_ENCODER.encode("10"), vec![1 << 1, 1 << 0]);
    /// ```
    #[must_use]
    pub fn encode(&self, token: &str) -> Vec<StateBits> {
        token.bytes().map(|byte| self.state(byte)).collect()
    }

    /// Returns the raw lookup table.
    #[inline]
    #[must_use]
    pub fn map(&self) -> &[StateBits; 256] {
        &self.map
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self::new(ALLELE_STATE_MAP)
    }
}
