/// Viewing angle requested for a subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Front,
    Back,
    Left,
    Right,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [Self::Front, Self::Back, Self::Left, Self::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const VINTAGE_CAMERAS: [&str; 15] = [
    "Leica M3 (1954)",
    "Rolleiflex 2.8F (1960)",
    "Nikon F (1959)",
    "Canon AE-1 (1976)",
    "Hasselblad 500C/M (1970)",
    "Pentax Spotmatic (1964)",
    "Zeiss Ikon Contessa (1950)",
    "Kodak Retina IIa (1951)",
    "Olympus OM-1 (1972)",
    "Yashica Mat-124G (1970)",
    "Minolta SR-T 101 (1966)",
    "Voigtländer Bessa II (1950)",
    "Argus C3 (1939)",
    "Graflex Speed Graphic (1947)",
    "Polaroid SX-70 (1972)",
];

/// Ordered subjects and orientations, assigned to cells by index modulo length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    subjects: Vec<String>,
    orientations: Vec<Orientation>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            subjects: VINTAGE_CAMERAS.iter().map(|s| s.to_string()).collect(),
            orientations: Orientation::ALL.to_vec(),
        }
    }
}

impl Catalog {
    /// Returns `None` when either list is empty.
    pub fn new(subjects: Vec<String>, orientations: Vec<Orientation>) -> Option<Self> {
        if subjects.is_empty() || orientations.is_empty() {
            return None;
        }
        Some(Self {
            subjects,
            orientations,
        })
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn orientations(&self) -> &[Orientation] {
        &self.orientations
    }

    pub fn subject_for(&self, index: u32) -> &str {
        &self.subjects[index as usize % self.subjects.len()]
    }

    pub fn orientation_for(&self, index: u32) -> Orientation {
        self.orientations[index as usize % self.orientations.len()]
    }
}
