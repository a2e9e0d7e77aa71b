pub mod config;
pub mod error;
pub mod types;
pub mod vector;

pub use config::{optional_env, required_env};
pub use error::NewsloomError;
pub use types::*;
pub use vector::{cosine_similarity, ema_blend, mean_vector};

/// Normalize a section/source name into a URL-safe slug: lowercase, strip
/// non-alphanumeric (keeping spaces), collapse whitespace, hyphenate.
///
/// ```
/// assert_eq!(newsloom_common::slugify("Cyber Security"), "cyber-security");
/// assert_eq!(newsloom_common::slugify("World & Economy!!!"), "world-economy");
/// assert_eq!(newsloom_common::slugify("  Multiple   Spaces  "), "multiple-spaces");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<&str>>().join("-")
}
