use serde::{Deserialize, Serialize};

/// Characters in a county name (`臺北市`, `花蓮縣`).
pub const COUNTY_CHARS: usize = 3;

/// Characters compared for county + township matching (`臺北市中正區`).
pub const TOWNSHIP_CHARS: usize = 6;

/// Granularity at which names are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Compare the whole normalized name.
    #[default]
    Full,
    /// Compare only the first N characters.
    Chars(usize),
}

impl Granularity {
    pub const fn county() -> Self {
        Self::Chars(COUNTY_CHARS)
    }

    pub const fn township() -> Self {
        Self::Chars(TOWNSHIP_CHARS)
    }
}

/// Deployment-level normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// `(variant, canonical)` glyph pairs.
    pub glyph_variants: Vec<(char, char)>,
    /// Field labels stripped when they lead a value as `<label>=`.
    pub label_prefixes: Vec<String>,
    /// Granularity used for both tabular regions and geometry names.
    pub granularity: Granularity,
    /// Ids shorter than this (in characters) are not usable as regions.
    pub min_chars: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            glyph_variants: vec![('台', '臺'), ('巿', '市')],
            label_prefixes: vec![
                "縣市".to_string(),
                "縣市別".to_string(),
                "地區".to_string(),
                "region".to_string(),
                "county".to_string(),
            ],
            granularity: Granularity::Full,
            min_chars: 0,
        }
    }
}
