//! Prompt assembly.

/// Fixed instruction sent with every product photo.
pub const BASE_DESCRIPTION: &str = "This is an image of my product. I want to sell this on \
the Myntra website, so I need professional photos for it. Create a perfect, professional \
product photograph using this image, showing it from a slightly different angle, with clean \
lighting on a neutral, minimalist background suitable for an e-commerce listing.";

/// Builds the final prompt from [`BASE_DESCRIPTION`] and an optional suffix.
pub fn assemble(extra: &str) -> String {
    assemble_with(BASE_DESCRIPTION, extra)
}

/// Joins the trimmed `base` and trimmed `extra` with a single space.
///
/// An empty `extra` yields the trimmed base with no trailing separator.
pub fn assemble_with(base: &str, extra: &str) -> String {
    format!("{} {}", base.trim(), extra.trim()).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_is_deterministic() {
        for extra in ["", "on a marble tabletop", "  \t ", "with soft shadows\n"] {
            assert_eq!(assemble(extra), assemble(extra));
        }
    }

    #[test]
    fn test_assemble_empty_suffix() {
        assert_eq!(assemble(""), BASE_DESCRIPTION.trim());
        assert!(!assemble("").ends_with(' '));
    }

    #[test]
    fn test_assemble_whitespace_only_suffix() {
        assert_eq!(assemble("   \n"), BASE_DESCRIPTION.trim());
    }

    #[test]
    fn test_assemble_trims_suffix() {
        assert_eq!(
            assemble("  on a marble tabletop  "),
            format!("{} on a marble tabletop", BASE_DESCRIPTION)
        );
    }

    #[test]
    fn test_assemble_with_custom_base() {
        assert_eq!(
            assemble_with("  Studio shot.  ", " white backdrop "),
            "Studio shot. white backdrop"
        );
        assert_eq!(assemble_with("", "  only suffix "), "only suffix");
        assert_eq!(assemble_with("  ", "  "), "");
    }

    #[test]
    fn test_base_description_is_single_spaced() {
        assert!(!BASE_DESCRIPTION.contains("  "));
        assert!(BASE_DESCRIPTION.starts_with("This is an image of my product."));
        assert!(BASE_DESCRIPTION.ends_with("e-commerce listing."));
    }
}
