//! OBJ text parser.

use std::collections::HashMap;

use crate::geometry::{ArrayFormat, Geometry, GeometryError, PrimitiveTopology, VertexAttribute};

use super::error::ObjError;

/// Options controlling OBJ import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjOptions {
    /// De-duplicate identical face corners and emit an index array.
    /// When `false`, every corner becomes its own vertex and no indices are produced.
    pub generate_indices: bool,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self {
            generate_indices: true,
        }
    }
}

/// One object of an OBJ file, expanded into per-vertex arrays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjMesh {
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Option<Vec<u32>>,
}

impl ObjMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Build a triangle-list [`Geometry`] with one root array per attribute.
    pub fn to_geometry(&self) -> Result<Geometry, GeometryError> {
        let mut geometry = Geometry::new().with_topology(PrimitiveTopology::TriangleList);
        if let Some(name) = &self.name {
            geometry = geometry.with_label(name.clone());
        }
        geometry.add_array_pod(ArrayFormat::float3(VertexAttribute::Position), &self.positions)?;
        if let Some(texcoords) = &self.texcoords {
            geometry.add_array_pod(ArrayFormat::float2(VertexAttribute::TexCoord(0)), texcoords)?;
        }
        if let Some(normals) = &self.normals {
            geometry.add_array_pod(ArrayFormat::float3(VertexAttribute::Normal), normals)?;
        }
        if let Some(indices) = &self.indices {
            geometry.set_indices_u32(indices)?;
        }
        Ok(geometry)
    }
}

/// All objects read from one OBJ file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjModel {
    pub meshes: Vec<ObjMesh>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

#[derive(Default)]
struct Pools {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

/// Parse OBJ source text.
pub fn parse_obj(source: &str, options: &ObjOptions) -> Result<ObjModel, ObjError> {
    let mut pools = Pools::default();
    let mut model = ObjModel::default();
    let mut name: Option<String> = None;
    let mut corners: Vec<Corner> = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let line = i + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = content.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => pools.positions.push(parse_floats::<3>(line, tokens)?),
            "vt" => pools.texcoords.push(parse_floats::<2>(line, tokens)?),
            "vn" => pools.normals.push(parse_floats::<3>(line, tokens)?),
            "f" => {
                let face = tokens
                    .map(|token| parse_corner(line, token, &pools))
                    .collect::<Result<Vec<_>, _>>()?;
                if face.len() < 3 {
                    return Err(ObjError::Syntax {
                        line,
                        message: format!("face needs at least 3 corners, got {}", face.len()),
                    });
                }
                for k in 1..face.len() - 1 {
                    corners.extend([face[0], face[k], face[k + 1]]);
                }
            }
            "o" | "g" => {
                if !corners.is_empty() {
                    model
                        .meshes
                        .push(assemble(name.take(), &corners, &pools, options));
                    corners.clear();
                }
                let rest: Vec<&str> = tokens.collect();
                name = (!rest.is_empty()).then(|| rest.join(" "));
            }
            "s" | "usemtl" | "mtllib" | "l" | "p" => {}
            other => {
                log::debug!("OBJ line {line}: ignoring unsupported statement '{other}'");
            }
        }
    }

    if !corners.is_empty() {
        model.meshes.push(assemble(name, &corners, &pools, options));
    }

    log::debug!(
        "Parsed OBJ: {} meshes, {} positions",
        model.meshes.len(),
        pools.positions.len()
    );
    Ok(model)
}

fn parse_floats<'a, const N: usize>(
    line: usize,
    tokens: impl Iterator<Item = &'a str>,
) -> Result<[f32; N], ObjError> {
    let mut out = [0.0; N];
    let mut read = 0;
    for token in tokens.take(N) {
        out[read] = token.parse().map_err(|_| ObjError::Syntax {
            line,
            message: format!("invalid number '{token}'"),
        })?;
        read += 1;
    }
    if read < N {
        return Err(ObjError::Syntax {
            line,
            message: format!("expected {N} values, got {read}"),
        });
    }
    Ok(out)
}

fn parse_corner(line: usize, token: &str, pools: &Pools) -> Result<Corner, ObjError> {
    let mut parts = token.split('/');
    let position = parts
        .next()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ObjError::Syntax {
            line,
            message: format!("face corner '{token}' has no position"),
        })?;
    let position = resolve(line, position, pools.positions.len())?;
    let texcoord = match parts.next() {
        Some(t) if !t.is_empty() => Some(resolve(line, t, pools.texcoords.len())?),
        _ => None,
    };
    let normal = match parts.next() {
        Some(n) if !n.is_empty() => Some(resolve(line, n, pools.normals.len())?),
        _ => None,
    };
    Ok(Corner {
        position,
        texcoord,
        normal,
    })
}

/// Turn a one-based or negative relative OBJ index into a zero-based one.
fn resolve(line: usize, token: &str, len: usize) -> Result<usize, ObjError> {
    let index: i64 = token.parse().map_err(|_| ObjError::Syntax {
        line,
        message: format!("invalid index '{token}'"),
    })?;
    let resolved = if index < 0 {
        len as i64 + index
    } else {
        index - 1
    };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(ObjError::IndexOutOfRange { line, index, len });
    }
    Ok(resolved as usize)
}

fn assemble(
    name: Option<String>,
    corners: &[Corner],
    pools: &Pools,
    options: &ObjOptions,
) -> ObjMesh {
    let has_texcoords = corners.iter().all(|c| c.texcoord.is_some());
    let has_normals = corners.iter().all(|c| c.normal.is_some());
    if !has_texcoords && corners.iter().any(|c| c.texcoord.is_some()) {
        log::warn!("OBJ object {name:?}: some corners lack texcoords, dropping texcoords");
    }
    if !has_normals && corners.iter().any(|c| c.normal.is_some()) {
        log::warn!("OBJ object {name:?}: some corners lack normals, dropping normals");
    }

    let mut mesh = ObjMesh {
        name,
        texcoords: has_texcoords.then(Vec::new),
        normals: has_normals.then(Vec::new),
        ..Default::default()
    };

    let emit = |corner: &Corner, mesh: &mut ObjMesh| {
        mesh.positions.push(pools.positions[corner.position]);
        if let (Some(texcoords), Some(t)) = (mesh.texcoords.as_mut(), corner.texcoord) {
            texcoords.push(pools.texcoords[t]);
        }
        if let (Some(normals), Some(n)) = (mesh.normals.as_mut(), corner.normal) {
            normals.push(pools.normals[n]);
        }
    };

    if options.generate_indices {
        let mut seen: HashMap<Corner, u32> = HashMap::new();
        let mut indices = Vec::with_capacity(corners.len());
        for corner in corners {
            let key = Corner {
                position: corner.position,
                texcoord: corner.texcoord.filter(|_| has_texcoords),
                normal: corner.normal.filter(|_| has_normals),
            };
            let index = match seen.get(&key) {
                Some(&index) => index,
                None => {
                    let index = mesh.positions.len() as u32;
                    emit(&key, &mut mesh);
                    seen.insert(key, index);
                    index
                }
            };
            indices.push(index);
        }
        mesh.indices = Some(indices);
    } else {
        for corner in corners {
            emit(corner, &mut mesh);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# a unit quad
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_indexed() {
        let model = parse_obj(QUAD, &ObjOptions::default()).unwrap();
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.name.as_deref(), Some("quad"));
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices.as_deref(), Some(&[0, 1, 2, 0, 2, 3][..]));
        assert_eq!(mesh.texcoords.as_ref().map(Vec::len), Some(4));
        assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_quad_expanded() {
        let options = ObjOptions {
            generate_indices: false,
        };
        let model = parse_obj(QUAD, &options).unwrap();
        let mesh = &model.meshes[0];
        assert_eq!(mesh.vertex_count(), 6);
        assert!(mesh.indices.is_none());
        assert_eq!(mesh.positions[3], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_positions_only_and_negative_indices() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let model = parse_obj(source, &ObjOptions::default()).unwrap();
        let mesh = &model.meshes[0];
        assert!(mesh.name.is_none());
        assert!(mesh.texcoords.is_none());
        assert!(mesh.normals.is_none());
        assert_eq!(mesh.positions[2], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_multiple_objects() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
o first
f 1 2 3
g second part
f 3 2 1
";
        let model = parse_obj(source, &ObjOptions::default()).unwrap();
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[1].name.as_deref(), Some("second part"));
    }

    #[test]
    fn test_normal_without_texcoord() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let model = parse_obj(source, &ObjOptions::default()).unwrap();
        let mesh = &model.meshes[0];
        assert!(mesh.texcoords.is_none());
        assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_index_out_of_range() {
        let source = "v 0 0 0\nf 1 2 3\n";
        let err = parse_obj(source, &ObjOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ObjError::IndexOutOfRange {
                line: 2,
                index: 2,
                len: 1
            }
        );
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_obj("v 0 zero 0\n", &ObjOptions::default()).unwrap_err();
        assert!(matches!(err, ObjError::Syntax { line: 1, .. }));

        let err = parse_obj("v 0 0 0\nv 1 1 1\nf 1 2\n", &ObjOptions::default()).unwrap_err();
        assert!(matches!(err, ObjError::Syntax { line: 3, .. }));
    }

    #[test]
    fn test_to_geometry() {
        let model = parse_obj(QUAD, &ObjOptions::default()).unwrap();
        let geometry = model.meshes[0].to_geometry().unwrap();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.root_arrays().count(), 3);
        assert_eq!(geometry.index_array().map(|i| i.count()), Some(6));
        assert_eq!(geometry.label(), Some("quad"));
    }
}
