//! Layout and orientation choices, and the capture/selection quotas they imply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Collage arrangement chosen when a session is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Two photos side by side or stacked
    #[default]
    Double,
    /// Up to four photos in a grid or column
    Quad,
    /// Up to eight photos in a strip grid
    Strip,
}

/// Orientation of the finished collage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Layout {
    /// All layouts, in menu order
    pub const ALL: [Layout; 3] = [Layout::Double, Layout::Quad, Layout::Strip];

    /// Number of photos captured before the session moves on to selection
    pub const fn capture_limit(self) -> usize {
        match self {
            Layout::Double => 4,
            Layout::Quad => 6,
            Layout::Strip => 12,
        }
    }

    /// Number of photos the user must select for the collage
    pub const fn final_limit(self) -> usize {
        match self {
            Layout::Double => 2,
            Layout::Quad => 4,
            Layout::Strip => 8,
        }
    }

    pub const fn limits(self) -> Limits {
        Limits {
            max_capture_photos: self.capture_limit(),
            final_photos_needed: self.final_limit(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Double => "double",
            Layout::Quad => "quad",
            Layout::Strip => "strip",
        }
    }
}

// Selecting more photos than were captured would be unsatisfiable.
const _: () = {
    let mut i = 0;
    while i < Layout::ALL.len() {
        assert!(Layout::ALL[i].final_limit() <= Layout::ALL[i].capture_limit());
        i += 1;
    }
};

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Capture and selection quotas for one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub max_capture_photos: usize,
    pub final_photos_needed: usize,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "double" => Ok(Layout::Double),
            "quad" | "grid" => Ok(Layout::Quad),
            "strip" => Ok(Layout::Strip),
            other => Err(format!(
                "unknown layout '{}' (expected double, quad or strip)",
                other
            )),
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!(
                "unknown orientation '{}' (expected portrait or landscape)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Layout::Double, 4, 2 ; "double")]
    #[test_case(Layout::Quad, 6, 4 ; "quad")]
    #[test_case(Layout::Strip, 12, 8 ; "strip")]
    fn test_limits_table(layout: Layout, capture: usize, final_count: usize) {
        assert_eq!(layout.capture_limit(), capture);
        assert_eq!(layout.final_limit(), final_count);
        assert!(layout.final_limit() <= layout.capture_limit());
    }

    #[test]
    fn test_parse_round_trip_names() {
        for layout in Layout::ALL {
            assert_eq!(layout.as_str().parse::<Layout>().unwrap(), layout);
        }
        assert_eq!("Landscape".parse::<Orientation>().unwrap(), Orientation::Landscape);
        assert!("triple".parse::<Layout>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Layout::Strip).unwrap();
        assert_eq!(json, "\"strip\"");
        let parsed: Orientation = serde_json::from_str("\"portrait\"").unwrap();
        assert_eq!(parsed, Orientation::Portrait);
    }
}
