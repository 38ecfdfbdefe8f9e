use rand::{
    rngs::{OsRng, StdRng},
    seq::SliceRandom,
    SeedableRng,
};

pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

/// Random characters added even when the user-derived part alone would fill `length`.
const MIN_RANDOM_CHARS: usize = 8;
const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SPECIALS: &str = "!@#$%^&*()-_=+";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("secure random source unavailable: {0}")]
    Entropy(#[from] rand::Error),
    #[error("password character pool is empty")]
    EmptyPool,
}

/// Generates an initial password loosely flavoured by the user's details.
///
/// Three letters of the first name and three of the email local part seed the
/// string, the rest is drawn from letters, digits and specials, then the whole
/// thing is cut to `length` and shuffled. The result is always exactly
/// `length` characters; when `length` is short the cut can drop random
/// characters as well as parts of the seed.
pub fn generate_user_based_password(
    name: &str,
    email: &str,
    length: usize,
) -> Result<String, PasswordError> {
    let mut rng = StdRng::from_rng(OsRng)?;

    let base = base_fragment(name, email);
    let remaining = length
        .saturating_sub(base.chars().count())
        .max(MIN_RANDOM_CHARS);

    let pool: Vec<char> = LETTERS
        .chars()
        .chain(DIGITS.chars())
        .chain(SPECIALS.chars())
        .collect();

    let mut chars: Vec<char> = base.chars().collect();
    for _ in 0..remaining {
        let c = pool.choose(&mut rng).ok_or(PasswordError::EmptyPool)?;
        chars.push(*c);
    }

    chars.truncate(length);
    chars.shuffle(&mut rng);
    Ok(chars.into_iter().collect())
}

fn base_fragment(name: &str, email: &str) -> String {
    let first_word = name.trim().split(' ').next().unwrap_or_default();
    let name_part: String = match first_word.chars().take(3).collect::<String>() {
        s if s.is_empty() => "usr".to_string(),
        s => s,
    };

    let local = email.split('@').next().unwrap_or_default();
    let email_part: String = match local.chars().take(3).collect::<String>() {
        s if s.is_empty() => "acc".to_string(),
        s => s,
    };

    format!("{}{}", title_case(&name_part), email_part.to_lowercase())
}

/// Upper-cases the first letter of every run of letters and lower-cases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = c.is_alphabetic();
    }
    out
}
