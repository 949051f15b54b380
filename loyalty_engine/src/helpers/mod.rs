mod luhn;

pub use luhn::luhn_checksum_is_valid;
