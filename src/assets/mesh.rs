use std::sync::Arc;

use anyhow::bail;
use log::error;

use crate::assets::ResourceCache;
use crate::formats::mesh::{MorphAnimation, MorphMeshReader, PackedMesh, PackedVertex, ProgMeshReader, SubMeshRange};
use crate::formats::model::{ModelLibReader, ModelLibrary};
use crate::util::file_ext::{exchange_ext, has_ext};

/// Which shape of result the mesh decode dispatch produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshLoadCode {
    Static,
    Morph,
    Dynamic,
}

/// The normalized in-memory mesh every load path converges on.
#[derive(Debug, Clone)]
pub struct ProtoMesh {
    pub name: String,
    pub packed: PackedMesh,
    /// Morph-animation table, only populated for `MeshLoadCode::Morph`.
    pub morph_animations: Vec<MorphAnimation>,
    /// Node names of a dynamic model's attached submesh groups, in
    /// submesh-range order. Empty for static and morph meshes.
    pub attachment_nodes: Vec<String>,
    pub load_code: MeshLoadCode,
}

impl ProtoMesh {
    pub(crate) fn from_static(packed: PackedMesh, name: &str) -> Self {
        Self {
            name: name.to_string(),
            packed,
            morph_animations: Vec::new(),
            attachment_nodes: Vec::new(),
            load_code: MeshLoadCode::Static,
        }
    }

    pub(crate) fn from_morph(packed: PackedMesh, animations: Vec<MorphAnimation>, name: &str) -> Self {
        Self {
            name: name.to_string(),
            packed,
            morph_animations: animations,
            attachment_nodes: Vec::new(),
            load_code: MeshLoadCode::Morph,
        }
    }

    /// Flattens a model library into one packed mesh: attachment meshes are
    /// concatenated, submesh ranges rebased, and the owning node recorded
    /// per range so a skeleton binding can be derived later.
    pub(crate) fn from_library(library: &ModelLibrary, name: &str) -> Self {
        let mut packed = PackedMesh::default();
        let mut attachment_nodes = Vec::new();

        for attachment in &library.attachments {
            let vertex_base = packed.vertices.len() as u32;
            let index_base = packed.indices.len() as u32;

            packed.vertices.extend_from_slice(&attachment.mesh.vertices);
            packed
                .indices
                .extend(attachment.mesh.indices.iter().map(|i| i + vertex_base));
            for range in &attachment.mesh.submeshes {
                packed.submeshes.push(SubMeshRange {
                    texture: range.texture.clone(),
                    index_offset: range.index_offset + index_base,
                    index_count: range.index_count,
                });
                attachment_nodes.push(attachment.node_name.clone());
            }
        }

        Self {
            name: name.to_string(),
            packed,
            morph_animations: Vec::new(),
            attachment_nodes,
            load_code: MeshLoadCode::Dynamic,
        }
    }
}

/// Decal geometry request: the resolved material texture plus the half
/// extents and sidedness of the quad.
#[derive(Debug, Clone)]
pub struct DecalDescription {
    pub texture: String,
    pub size_x: f32,
    pub size_y: f32,
    pub two_sided: bool,
}

/// Composite cache key with field-wise equality; the float extents take
/// part bit-exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DecalKey {
    texture: String,
    size_x_bits: u32,
    size_y_bits: u32,
    two_sided: bool,
}

impl From<&DecalDescription> for DecalKey {
    fn from(desc: &DecalDescription) -> Self {
        Self {
            texture: desc.texture.clone(),
            size_x_bits: desc.size_x.to_bits(),
            size_y_bits: desc.size_y.to_bits(),
            two_sided: desc.two_sided,
        }
    }
}

impl ResourceCache {
    pub fn mesh(&self, name: &str) -> Option<Arc<ProtoMesh>> {
        if name.is_empty() {
            return None;
        }
        if has_ext(name, "TGA") {
            error!("decals should be loaded by ResourceCache::decal_mesh instead");
            return None;
        }

        if let Some(hit) = self.meshes().get(name) {
            return hit.clone();
        }
        self.meshes()
            .entry(name.to_string())
            .or_insert_with(|| match self.load_mesh_dispatch(name) {
                Ok(mesh) => Some(Arc::new(mesh)),
                Err(e) => {
                    error!("unable to load mesh \"{}\": {}", name, e);
                    None
                }
            })
            .clone()
    }

    pub fn decal_mesh(&self, desc: &DecalDescription) -> Option<Arc<ProtoMesh>> {
        // A decal without a resolvable material texture has nothing to show.
        self.texture(&desc.texture)?;

        let key = DecalKey::from(desc);
        if let Some(hit) = self.decals().get(&key) {
            return Some(hit.clone());
        }
        Some(
            self.decals()
                .entry(key)
                .or_insert_with(|| Arc::new(build_decal_mesh(desc)))
                .clone(),
        )
    }

    /// Extension sniffing picks the load strategy; raw-source names are
    /// first exchanged for their compiled counterparts.
    fn load_mesh_dispatch(&self, cname: &str) -> Result<ProtoMesh, anyhow::Error> {
        let mut name = cname.to_string();
        if !name.contains("-C") {
            let _ = exchange_ext(&mut name, "3DS", "MRM")
                || exchange_ext(&mut name, "MMS", "MMB")
                || exchange_ext(&mut name, "ASC", "MDL");
        }

        if has_ext(&name, "MRM") {
            let data = self.read_bytes(&name)?;
            let packed = ProgMeshReader::parse_asset(&mut data.as_slice())?;
            if packed.submeshes.is_empty() {
                bail!("load failed");
            }
            return Ok(ProtoMesh::from_static(packed, cname));
        }

        if has_ext(&name, "MMB") {
            let data = self.read_bytes(&name)?;
            let (mut packed, animations) = MorphMeshReader::parse_asset(&mut data.as_slice())?;
            if packed.submeshes.is_empty() {
                bail!("load failed");
            }
            // morph meshes store normals with the vertical axis swapped
            for v in &mut packed.vertices {
                v.normal.swap(1, 2);
                v.normal[2] = -v.normal[2];
            }
            return Ok(ProtoMesh::from_morph(packed, animations, cname));
        }

        if has_ext(&name, "MDMS") || has_ext(&name, "MDS") || has_ext(&name, "MDL") || has_ext(&name, "MDM") {
            let library = self.load_model_library(name)?;
            if library.is_empty() {
                bail!("load failed");
            }
            return Ok(ProtoMesh::from_library(&library, cname));
        }

        bail!("unrecognized mesh format");
    }

    /// The skinned-model group compiles into up to three sibling files:
    /// `.MDL` (complete), `.MDM` (mesh) + `.MDH` (hierarchy), or a bare
    /// `.MDH`. Probe them in that order.
    pub(crate) fn load_model_library(&self, mut name: String) -> Result<ModelLibrary, anyhow::Error> {
        if exchange_ext(&mut name, "MDMS", "MDM") {
            return self.parse_library(&name);
        }
        if self.source().exists(&name) {
            return self.parse_library(&name);
        }

        set_ext(&mut name, "MDL");
        if self.source().exists(&name) {
            return self.parse_library(&name);
        }

        set_ext(&mut name, "MDM");
        if self.source().exists(&name) {
            let mut library = self.parse_library(&name)?;
            set_ext(&mut name, "MDH");
            if self.source().exists(&name) {
                library.merge_hierarchy(self.parse_library(&name)?);
            }
            return Ok(library);
        }

        set_ext(&mut name, "MDH");
        if self.source().exists(&name) {
            return self.parse_library(&name);
        }

        Ok(ModelLibrary::default())
    }

    fn parse_library(&self, name: &str) -> Result<ModelLibrary, anyhow::Error> {
        let data = self.read_bytes(name)?;
        Ok(ModelLibReader::parse_library(&mut data.as_slice())?)
    }

    pub(crate) fn read_bytes(&self, name: &str) -> Result<Vec<u8>, anyhow::Error> {
        self.source()
            .load_raw_owned(name)
            .ok_or_else(|| anyhow::anyhow!("could not locate {}", name))
    }
}

fn build_decal_mesh(desc: &DecalDescription) -> ProtoMesh {
    let mut vertices = Vec::with_capacity(8);
    for normal_z in [-1.0f32, 1.0] {
        vertices.extend_from_slice(&[
            vertex(-1.0, -1.0, normal_z, [0.0, 1.0]),
            vertex(1.0, -1.0, normal_z, [1.0, 1.0]),
            vertex(1.0, 1.0, normal_z, [1.0, 0.0]),
            vertex(-1.0, 1.0, normal_z, [0.0, 0.0]),
        ]);
    }
    for v in &mut vertices {
        v.position[0] *= desc.size_x;
        v.position[1] *= desc.size_y;
    }

    let indices: Vec<u32> = if desc.two_sided {
        vec![0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6]
    } else {
        vec![0, 1, 2, 0, 2, 3]
    };
    let index_count = indices.len() as u32;

    ProtoMesh::from_static(
        PackedMesh {
            vertices,
            indices,
            submeshes: vec![SubMeshRange {
                texture: desc.texture.clone(),
                index_offset: 0,
                index_count,
            }],
        },
        &desc.texture,
    )
}

fn vertex(x: f32, y: f32, nz: f32, uv: [f32; 2]) -> PackedVertex {
    PackedVertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, nz],
        uv,
        color: 0xFFFF_FFFF,
    }
}

fn set_ext(name: &mut String, ext: &str) {
    if let Some(dot) = name.rfind('.') {
        name.truncate(dot + 1);
        name.push_str(ext);
    }
}
