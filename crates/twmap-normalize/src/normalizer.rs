use std::collections::HashMap;

use twmap_model::CanonicalRegionId;

use crate::config::{Granularity, NormalizerConfig};

/// Separators accepted between a field label and its value.
const LABEL_SEPARATORS: [char; 2] = ['=', '＝'];

/// Pure, total region-name normalizer.
///
/// Output is idempotent: `normalize(normalize(s)) == normalize(s)`.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    glyphs: HashMap<char, char>,
    /// Labels with their glyphs already collapsed.
    labels: Vec<Vec<char>>,
    granularity: Granularity,
    min_chars: usize,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl NameNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        let glyphs = resolve_glyphs(&config.glyph_variants);
        let labels = config
            .label_prefixes
            .iter()
            .map(|label| {
                label
                    .trim()
                    .chars()
                    .map(|ch| glyphs.get(&ch).copied().unwrap_or(ch))
                    .collect::<Vec<char>>()
            })
            .filter(|label| !label.is_empty())
            .collect();
        Self {
            glyphs,
            labels,
            granularity: config.granularity,
            min_chars: config.min_chars,
        }
    }

    /// Configured granularity of this deployment.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Normalize without truncation.
    pub fn normalize(&self, raw: &str) -> CanonicalRegionId {
        self.normalize_at(raw, Granularity::Full)
    }

    /// Normalize, then truncate to `granularity`.
    pub fn normalize_at(&self, raw: &str, granularity: Granularity) -> CanonicalRegionId {
        let mut rest = raw.trim();
        while let Some(stripped) = self.strip_label(rest) {
            rest = stripped.trim();
        }
        let collapsed: String = rest.chars().map(|ch| self.collapse(ch)).collect();
        let collapsed = collapsed.trim();
        let value = match granularity {
            Granularity::Full => collapsed.to_string(),
            Granularity::Chars(limit) => {
                let truncated: String = collapsed.chars().take(limit).collect();
                truncated.trim_end().to_string()
            }
        };
        CanonicalRegionId::new(value)
    }

    /// Normalize at the configured granularity and reject ids that cannot
    /// name a region (empty, or shorter than `min_chars`).
    pub fn region_id(&self, raw: &str) -> Option<CanonicalRegionId> {
        let id = self.normalize_at(raw, self.granularity);
        self.accepts(&id).then_some(id)
    }

    pub fn accepts(&self, id: &CanonicalRegionId) -> bool {
        !id.is_empty() && id.char_len() >= self.min_chars
    }

    fn collapse(&self, ch: char) -> char {
        self.glyphs.get(&ch).copied().unwrap_or(ch)
    }

    /// Remove one leading `<label>=`; labels compare after glyph collapsing.
    fn strip_label<'a>(&self, value: &'a str) -> Option<&'a str> {
        'labels: for label in &self.labels {
            let mut chars = value.char_indices();
            for expected in label {
                match chars.next() {
                    Some((_, ch)) if self.collapse(ch) == *expected => {}
                    _ => continue 'labels,
                }
            }
            if let Some((idx, sep)) = chars.next()
                && LABEL_SEPARATORS.contains(&sep)
            {
                return Some(&value[idx + sep.len_utf8()..]);
            }
        }
        None
    }
}

/// Flatten variant chains (`a→b`, `b→c` becomes `a→c`, `b→c`) so one lookup
/// always lands on the canonical glyph. Whitespace pairs are ignored.
fn resolve_glyphs(pairs: &[(char, char)]) -> HashMap<char, char> {
    let direct: HashMap<char, char> = pairs
        .iter()
        .filter(|(from, to)| from != to && !from.is_whitespace() && !to.is_whitespace())
        .map(|(from, to)| (*from, *to))
        .collect();
    let mut resolved = HashMap::with_capacity(direct.len());
    for from in direct.keys() {
        let mut target = *from;
        for _ in 0..=direct.len() {
            match direct.get(&target) {
                Some(next) if next != from => target = *next,
                _ => break,
            }
        }
        if target != *from {
            resolved.insert(*from, target);
        }
    }
    resolved
}
