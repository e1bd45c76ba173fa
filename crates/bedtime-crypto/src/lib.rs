/// Bedtime Crypto Library
///
/// Parent PINs gate the exit from child mode. Only Argon2id digests are
/// stored; the four digits themselves never reach the database or the logs.
pub mod pin;
