//! Line-oriented pragma attribute library (`lib_<design>.info`).
//!
//! Each usable line defines one pragma option. The two digits at byte
//! offsets 4..6 name the owning dimension; the rest of the line is an
//! opaque definition handed to the synthesizer, rendered into its header
//! syntax here. Comment lines (`#`) and lines shorter than 5 characters
//! are skipped.

use crate::model::{ConfigurationSpace, Dimension, DimensionIndex, Position};
use crate::DseError;
use std::path::Path;

/// Extra synthesizer options selected by the `folding` marker substring.
pub const FOLDING_OPTIONS: &str = "-ZZpipeline";

/// One pragma option: the rendered header define and the marker flags
/// the strategies act on.
#[derive(Debug, Clone)]
pub struct PragmaDef {
    define: String,
    folding: bool,
}

impl PragmaDef {
    /// The `#define <name> Cyber <value> = ...` line written into the
    /// synthesizer's attribute header.
    pub fn define(&self) -> &str {
        &self.define
    }

    pub fn folding(&self) -> bool {
        self.folding
    }
}

/// All pragma options of a design, grouped by dimension. Group 0 is the
/// reserved placeholder and stays empty.
#[derive(Debug, Clone, Default)]
pub struct PragmaLibrary {
    groups: Vec<Vec<PragmaDef>>,
}

impl PragmaLibrary {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DseError> {
        let text = std::fs::read_to_string(path)?;
        PragmaLibrary::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, DseError> {
        let mut groups: Vec<Vec<PragmaDef>> = Vec::new();
        for (n, line) in text.lines().enumerate() {
            if line.starts_with('#') || line.len() < 5 {
                continue;
            }
            let dimension = line
                .get(4..6)
                .and_then(|s| s.trim().parse::<DimensionIndex>().ok())
                .ok_or(DseError::Library {
                    line: n + 1,
                    reason: "no two-digit dimension index at offset 4",
                })?;
            while groups.len() <= dimension {
                groups.push(Vec::new());
            }
            groups[dimension].push(render(line));
        }
        Ok(PragmaLibrary { groups })
    }

    /// Dimension count, reserved group 0 included.
    pub fn dimension_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, dim: DimensionIndex) -> &[PragmaDef] {
        &self.groups[dim]
    }

    /// Build the configuration space. A real dimension that the library
    /// names but never populates is a fatal configuration error.
    pub fn to_space(&self) -> Result<ConfigurationSpace, DseError> {
        if self.groups.len() < 2 {
            return Err(DseError::EmptyDimension { dim: 1 });
        }
        let dims = self.groups[1..]
            .iter()
            .enumerate()
            .map(|(i, g)| Dimension {
                label: format!("pragma{:02}", i + 1),
                options: g.len(),
            })
            .collect();
        ConfigurationSpace::new(dims)
    }

    /// The header defines selected by a position, one per real dimension,
    /// plus the extra synthesizer options its markers call for.
    pub fn defines_for(&self, pos: &Position) -> (Vec<String>, &'static str) {
        let mut defines = Vec::with_capacity(self.groups.len().saturating_sub(1));
        let mut options = "";
        for dim in 1..self.groups.len() {
            let def = &self.groups[dim][pos.get(dim) as usize];
            if def.folding() {
                options = FOLDING_OPTIONS;
            }
            defines.push(def.define().to_string());
        }
        (defines, options)
    }
}

// Rebuild the raw library line into the synthesizer's header syntax:
// "name01 value rest" becomes "#define name01 Cyber value = rest", a
// macro named after the attribute that expands to the Cyber pragma. The
// EXPAND marker additionally pins the array index.
fn render(line: &str) -> PragmaDef {
    let mut words: Vec<&str> = line.trim_end().split(' ').collect();
    if words.get(2).map_or(false, |w| w.contains("EXPAND")) {
        words.push(", array_index=const");
    }
    if words.len() > 2 {
        words.insert(2, "=");
    }
    if words.len() > 1 {
        words.insert(1, "Cyber");
    }
    words.insert(0, "#define");
    PragmaDef {
        folding: line.contains("folding"),
        define: words.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIB: &str = "\
# pragma library for the sobel design
ph
attr01_loop unroll x2
attr01_loop unroll x4
attr02_mem array EXPAND
attr02_mem folding keep
";

    #[test]
    fn parse_skips_comments_and_short_lines() {
        let lib = PragmaLibrary::parse(LIB).unwrap();
        assert_eq!(lib.dimension_count(), 3);
        assert_eq!(lib.group(1).len(), 2);
        assert_eq!(lib.group(2).len(), 2);
    }

    #[test]
    fn render_matches_header_syntax() {
        let lib = PragmaLibrary::parse(LIB).unwrap();
        assert_eq!(
            lib.group(1)[0].define(),
            "#define attr01_loop Cyber unroll = x2"
        );
    }

    #[test]
    fn expand_marker_pins_array_index() {
        let lib = PragmaLibrary::parse(LIB).unwrap();
        assert_eq!(
            lib.group(2)[0].define(),
            "#define attr02_mem Cyber array = EXPAND , array_index=const"
        );
    }

    #[test]
    fn folding_marker_selects_extra_options() {
        let lib = PragmaLibrary::parse(LIB).unwrap();
        let space = lib.to_space().unwrap();
        let mut pos = space.first_position();
        pos.set(2, 1);
        let (defines, options) = lib.defines_for(&pos);
        assert_eq!(defines.len(), 2);
        assert_eq!(options, FOLDING_OPTIONS);

        pos.set(2, 0);
        let (_, options) = lib.defines_for(&pos);
        assert_eq!(options, "");
    }

    #[test]
    fn malformed_dimension_index_is_fatal() {
        let err = PragmaLibrary::parse("attrXY_loop unroll x2\n").unwrap_err();
        match err {
            DseError::Library { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn unpopulated_dimension_is_fatal() {
        // group 1 is named nowhere, group 2 is; the space must reject it
        let lib = PragmaLibrary::parse("attr02_mem EXPAND spread\n").unwrap();
        let err = lib.to_space().unwrap_err();
        match err {
            DseError::EmptyDimension { dim } => assert_eq!(dim, 1),
            other => panic!("unexpected error: {}", other),
        }
    }
}
