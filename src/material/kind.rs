/// Closed set of shelf materials.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Wood,
    Marble,
    Glass,
    #[default]
    Metal,
}

impl Material {
    /// Map a free-form material identifier ("Walnut shelf", "brushed steel", ...) to a variant.
    ///
    /// Matching is a case-insensitive substring test; unknown identifiers are metal.
    pub fn classify(identifier: &str) -> Self {
        let id = identifier.trim().to_ascii_lowercase();
        if ["wood", "oak", "walnut"].iter().any(|k| id.contains(k)) {
            Self::Wood
        } else if id.contains("marble") {
            Self::Marble
        } else if id.contains("glass") {
            Self::Glass
        } else {
            Self::Metal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wood => "wood",
            Self::Marble => "marble",
            Self::Glass => "glass",
            Self::Metal => "metal",
        }
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_wood_family() {
        assert_eq!(Material::classify("wood"), Material::Wood);
        assert_eq!(Material::classify("dark-oak"), Material::Wood);
        assert_eq!(Material::classify("Walnut Shelf"), Material::Wood);
    }

    #[test]
    fn classify_other_variants() {
        assert_eq!(Material::classify("white marble"), Material::Marble);
        assert_eq!(Material::classify(" frosted GLASS "), Material::Glass);
        assert_eq!(Material::classify("steel"), Material::Metal);
        assert_eq!(Material::classify(""), Material::Metal);
    }

    #[test]
    fn wood_wins_over_later_keywords() {
        assert_eq!(Material::classify("oak and glass"), Material::Wood);
        assert_eq!(Material::classify("marble glass"), Material::Marble);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let s = serde_json::to_string(&Material::Glass).unwrap();
        assert_eq!(s, "\"glass\"");
        assert_eq!(Material::Glass.to_string(), "glass");
    }
}
