//! OBJ parsing into attribute tables and a triangulated face corpus
//!
//! Supported statements: `v` (with optional `r g b`), `vt`, `vn`, `f`, `o`, `g`
//! and `s`. Everything else (`usemtl`, `mtllib`, `l`, ...) is ignored.

use glam::{Vec2, Vec3};
use meshweld_core::{AttributeIndex, AttributeStore, Face, FaceCorner, FaceCorpus, Shape};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parser options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Store texture coordinates as `v' = 1 - v` (top-left origin)
    pub flip_v: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { flip_v: true }
    }
}

/// Error returned when an OBJ file cannot be parsed
#[derive(Debug, thiserror::Error)]
pub enum ObjError {
    #[error("Failed to read OBJ: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Parsed OBJ contents
#[derive(Debug, Clone, Default)]
pub struct ObjModel {
    pub store: AttributeStore,
    pub corpus: FaceCorpus,
}

/// Load and parse an OBJ file
pub fn load_obj(path: &Path, options: &ParseOptions) -> Result<ObjModel, ObjError> {
    let file = File::open(path)?;
    parse_obj(BufReader::new(file), options)
}

/// Parse OBJ text from any buffered reader
pub fn parse_obj<R: BufRead>(reader: R, options: &ParseOptions) -> Result<ObjModel, ObjError> {
    let mut parser = ObjParser::new(*options);
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        parser
            .parse_line(&line)
            .map_err(|message| ObjError::Parse {
                line: line_idx + 1,
                message,
            })?;
    }
    Ok(parser.finish())
}

struct ObjParser {
    options: ParseOptions,
    positions: Vec<Vec3>,
    colors: Vec<Option<Vec3>>,
    has_colors: bool,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    shapes: Vec<Shape>,
    current: Shape,
    smoothing_group: Option<u32>,
}

impl ObjParser {
    fn new(options: ParseOptions) -> Self {
        Self {
            options,
            positions: Vec::new(),
            colors: Vec::new(),
            has_colors: false,
            normals: Vec::new(),
            uvs: Vec::new(),
            shapes: Vec::new(),
            current: Shape::default(),
            smoothing_group: None,
        }
    }

    fn parse_line(&mut self, line: &str) -> Result<(), String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Ok(());
        };
        let args: Vec<&str> = parts.collect();

        match keyword {
            "v" => {
                let values = parse_floats(&args)?;
                match values.len() {
                    // x y z, or x y z w
                    3 | 4 => {
                        self.positions.push(Vec3::new(values[0], values[1], values[2]));
                        self.colors.push(None);
                    }
                    // x y z r g b [a]
                    6 | 7 => {
                        self.positions.push(Vec3::new(values[0], values[1], values[2]));
                        self.colors.push(Some(Vec3::new(values[3], values[4], values[5])));
                        self.has_colors = true;
                    }
                    n => return Err(format!("vertex has {} components", n)),
                }
            }
            "vt" => {
                let values = parse_floats(&args)?;
                if values.is_empty() || values.len() > 3 {
                    return Err(format!("texture coordinate has {} components", values.len()));
                }
                let u = values[0];
                let v = values.get(1).copied().unwrap_or(0.0);
                let v = if self.options.flip_v { 1.0 - v } else { v };
                self.uvs.push(Vec2::new(u, v));
            }
            "vn" => {
                let values = parse_floats(&args)?;
                if values.len() != 3 {
                    return Err(format!("normal has {} components", values.len()));
                }
                self.normals.push(Vec3::new(values[0], values[1], values[2]));
            }
            "f" => self.parse_face(&args)?,
            "o" | "g" => {
                let name = args.join(" ");
                self.start_shape(name);
            }
            "s" => {
                self.smoothing_group = match args.first().copied() {
                    None | Some("off") | Some("0") => None,
                    Some(group) => Some(
                        group
                            .parse::<u32>()
                            .map_err(|_| format!("invalid smoothing group '{}'", group))?,
                    ),
                };
            }
            _ => {}
        }

        Ok(())
    }

    fn parse_face(&mut self, args: &[&str]) -> Result<(), String> {
        if args.len() < 3 {
            return Err(format!("face has {} corners, need at least 3", args.len()));
        }

        let corners = args
            .iter()
            .map(|s| self.parse_corner(s))
            .collect::<Result<Vec<_>, _>>()?;

        // Fan triangulation (convex polygons)
        for i in 1..corners.len() - 1 {
            let mut face = Face::new([corners[0], corners[i], corners[i + 1]]);
            face.smoothing_group = self.smoothing_group;
            self.current.faces.push(face);
        }
        Ok(())
    }

    /// Parse a corner reference: "v", "v/vt", "v/vt/vn", or "v//vn"
    fn parse_corner(&self, s: &str) -> Result<FaceCorner, String> {
        let mut refs = s.split('/');

        let position = refs
            .next()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| format!("corner '{}' has no vertex index", s))?;
        let position = resolve_index(position, self.positions.len())?;

        let uv = match refs.next().filter(|r| !r.is_empty()) {
            Some(r) => Some(resolve_index(r, self.uvs.len())?),
            None => None,
        };
        let normal = match refs.next().filter(|r| !r.is_empty()) {
            Some(r) => Some(resolve_index(r, self.normals.len())?),
            None => None,
        };

        Ok(FaceCorner {
            position,
            normal,
            uv,
        })
    }

    fn start_shape(&mut self, name: String) {
        if self.current.faces.is_empty() {
            self.current.name = name;
        } else {
            let finished = std::mem::replace(&mut self.current, Shape::new(name));
            self.shapes.push(finished);
        }
    }

    fn finish(mut self) -> ObjModel {
        if !self.current.faces.is_empty() {
            self.shapes.push(self.current);
        }

        let colors = if self.has_colors {
            self.colors
                .into_iter()
                .map(|c| c.unwrap_or(meshweld_core::DEFAULT_COLOR))
                .collect()
        } else {
            Vec::new()
        };

        ObjModel {
            store: AttributeStore {
                positions: self.positions,
                normals: self.normals,
                uvs: self.uvs,
                colors,
            },
            corpus: FaceCorpus::new(self.shapes),
        }
    }
}

fn parse_floats(args: &[&str]) -> Result<Vec<f32>, String> {
    args.iter()
        .map(|s| s.parse::<f32>().map_err(|_| format!("invalid number '{}'", s)))
        .collect()
}

/// Resolve a 1-based or negative (relative) OBJ index to a 0-based one
///
/// Positive indices past the end are passed through; the mesh builder reports
/// them as malformed.
fn resolve_index(s: &str, count: usize) -> Result<AttributeIndex, String> {
    let raw: i64 = s.parse().map_err(|_| format!("invalid index '{}'", s))?;
    let resolved = match raw {
        0 => return Err("index 0 is not valid in OBJ".to_string()),
        i if i > 0 => i - 1,
        i => count as i64 + i,
    };
    if resolved < 0 {
        return Err(format!("relative index {} points before the first element", raw));
    }
    u32::try_from(resolved)
        .map(AttributeIndex)
        .map_err(|_| format!("index {} is too large", raw))
}
