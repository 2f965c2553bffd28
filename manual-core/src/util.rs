use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// Turns a title into a URL-safe slug.
///
/// ASCII letters are lowercased, digits and hyphens are kept, spaces become hyphens,
/// and everything else is dropped. Consecutive separators collapse into one hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.chars() {
        let next = match c {
            ' ' | '-' => '-',
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            _ => continue,
        };

        if next == '-' && slug.ends_with('-') {
            continue;
        }

        slug.push(next);
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_replaces_spaces() {
        assert_eq!(slugify("Container Run"), "container-run");
        assert_eq!(slugify("Multi   Word!!"), "multi-word");
    }

    #[test]
    fn slugify_drops_other_characters() {
        assert_eq!(slugify("CI/CD Pipelines 101"), "cicd-pipelines-101");
        assert_eq!(slugify("Docker: Основы"), "docker-");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn random_strings_differ() {
        let a = random_string(32);
        let b = random_string(32);

        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
