use crate::error::{AppError, AppResult};

pub const MIN_CODE_LENGTH: usize = 6;
pub const MAX_CODE_LENGTH: usize = 8;
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Character set for generating short codes.
const ALPHABET_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Generation and format checks for short codes.
pub struct ShortCodeService;

impl ShortCodeService {
    /// Draw a code of `length` characters uniformly from the 62-char alphabet.
    ///
    /// The result is not checked against storage; uniqueness is the allocator's job.
    pub fn generate(length: usize) -> String {
        nanoid::nanoid!(length, ALPHABET_CHARS)
    }

    /// Accept a user-supplied code only if it is 6 to 8 ASCII letters or digits.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidFormat` for anything else, including the empty
    /// string and codes with surrounding whitespace.
    pub fn validate(candidate: &str) -> AppResult<()> {
        if Self::is_well_formed(candidate) {
            Ok(())
        } else {
            Err(AppError::InvalidFormat(format!(
                "code must be {}-{} alphanumeric characters, got {:?}",
                MIN_CODE_LENGTH, MAX_CODE_LENGTH, candidate
            )))
        }
    }

    pub fn is_well_formed(candidate: &str) -> bool {
        (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&candidate.len())
            && candidate.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}
