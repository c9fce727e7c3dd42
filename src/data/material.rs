use std::collections::BTreeMap;

use super::config::EngineConfig;

/// Maps raw material cells (codes or free text) to canonical names.
#[derive(Debug, Clone)]
pub struct MaterialNormalizer {
    codes: BTreeMap<String, String>,
    empty: String,
}

impl MaterialNormalizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            codes: config.material_codes.clone(),
            empty: config.empty_material.clone(),
        }
    }

    /// Name used for blank or missing cells.
    pub fn empty_marker(&self) -> &str {
        &self.empty
    }

    /// Canonical material name for a raw cell.
    ///
    /// Lookup order: exact code, numeric code (`"7.0"` → `"7"`), known
    /// free-text aliases, then the trimmed input unchanged.
    pub fn normalize(&self, raw: Option<&str>) -> String {
        let s = match raw.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => return self.empty.clone(),
        };

        if let Some(name) = self.codes.get(s) {
            return name.clone();
        }

        if let Some(code) = integer_code(s) {
            return self.codes.get(&code).cloned().unwrap_or(code);
        }

        if let Some(alias) = text_alias(&fold_accents(&s.to_lowercase())) {
            return alias.to_string();
        }

        s.to_string()
    }
}

/// Integer string of a numeric cell, truncated toward zero.
fn integer_code(s: &str) -> Option<String> {
    let v = s.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let t = v.trunc();
    // -0.5 truncates to -0.0, which must print as "0".
    let t = if t == 0.0 { 0.0 } else { t };
    Some(format!("{t:.0}"))
}

fn text_alias(low: &str) -> Option<&'static str> {
    if low.contains("ichnusa") {
        Some("ichnusa")
    } else if low.contains("non filtrata") || low.contains("nonfiltrata") {
        Some("non filtrata")
    } else if low.contains("cruda") {
        Some("cruda")
    } else if low.contains("ambra") && low.contains("limpida") {
        Some("ambra limpida")
    } else {
        None
    }
}

/// Strip the accents found in Italian product names.
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'ì' | 'í' | 'ï' | 'î' => 'i',
            'à' | 'á' | 'ä' | 'â' => 'a',
            'è' | 'é' | 'ë' | 'ê' => 'e',
            'ò' | 'ó' | 'ö' | 'ô' => 'o',
            'ù' | 'ú' | 'ü' | 'û' => 'u',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> MaterialNormalizer {
        MaterialNormalizer::new(&EngineConfig::default())
    }

    #[test]
    fn codes_map_to_names() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("7")), "ichnusa");
        assert_eq!(n.normalize(Some("0")), "vuoto");
        assert_eq!(n.normalize(Some("28")), "ambra limpida");
        assert_eq!(n.normalize(Some("36")), "Recovered Beer");
        assert_eq!(n.normalize(Some(" 2 ")), "Ich Fusti");
    }

    #[test]
    fn blank_is_empty_marker() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("")), "(vuoto)");
        assert_eq!(n.normalize(Some("   ")), "(vuoto)");
        assert_eq!(n.normalize(None), "(vuoto)");
    }

    #[test]
    fn numeric_codes_are_coerced() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("7.0")), "ichnusa");
        assert_eq!(n.normalize(Some("07")), "ichnusa");
        assert_eq!(n.normalize(Some("99")), "99");
        assert_eq!(n.normalize(Some("99.9")), "99");
        assert_eq!(n.normalize(Some("-0.5")), "vuoto");
        assert_eq!(n.normalize(Some("1e2")), "100");
    }

    #[test]
    fn free_text_aliases() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("ICHNUSA extra")), "ichnusa");
        assert_eq!(n.normalize(Some("Birra NonFiltrata")), "non filtrata");
        assert_eq!(n.normalize(Some("Crùda")), "cruda");
        assert_eq!(n.normalize(Some("Ambra Limpìda")), "ambra limpida");
    }

    #[test]
    fn unknown_text_passes_through_trimmed() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("  Lager X ")), "Lager X");
        assert_eq!(n.normalize(Some("ambra")), "ambra");
        assert_eq!(n.normalize(Some("nan")), "nan");
    }

    #[test]
    fn accents_fold() {
        assert_eq!(fold_accents("àéìòü"), "aeiou");
        assert_eq!(fold_accents("ñ"), "ñ");
    }
}
