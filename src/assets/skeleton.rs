use std::sync::{Arc, LazyLock};

use glam::Vec3;
use log::error;

use crate::assets::ResourceCache;
use crate::assets::mesh::ProtoMesh;
use crate::formats::model::ModelLibrary;
use crate::util::file_ext::{exchange_ext, has_ext};

#[derive(Debug, Clone)]
pub struct SkeletonNode {
    pub name: String,
    pub parent: Option<usize>,
    pub translation: Vec3,
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,
    pub nodes: Vec<SkeletonNode>,
}

impl Skeleton {
    fn from_library(library: &ModelLibrary, name: &str) -> Self {
        let nodes = library
            .nodes
            .iter()
            .map(|node| SkeletonNode {
                name: node.name.clone(),
                parent: usize::try_from(node.parent).ok(),
                translation: Vec3::from_array(node.translation),
            })
            .collect();
        Self {
            name: name.to_string(),
            nodes,
        }
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }
}

/// Pairing of a dynamic mesh's attached submesh groups with the node
/// indices of one concrete skeleton. One entry per attachment, `None` when
/// the skeleton has no node of that name.
#[derive(Debug, Default)]
pub struct AttachBinder {
    pub bindings: Vec<Option<usize>>,
}

impl AttachBinder {
    fn new(skeleton: &Skeleton, mesh: &ProtoMesh) -> Self {
        Self {
            bindings: mesh
                .attachment_nodes
                .iter()
                .map(|node_name| skeleton.node_index(node_name))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

static EMPTY_BINDER: LazyLock<Arc<AttachBinder>> = LazyLock::new(|| Arc::new(AttachBinder::default()));

impl ResourceCache {
    pub fn skeleton(&self, name: &str) -> Option<Arc<Skeleton>> {
        if name.is_empty() || has_ext(name, "3DS") || has_ext(name, "MMS") {
            return None;
        }

        let mut name = name.to_string();
        let _ = exchange_ext(&mut name, "MDS", "MDH") || exchange_ext(&mut name, "ASC", "MDL");

        if let Some(hit) = self.skeletons().get(&name) {
            return Some(hit.clone());
        }

        match self.load_skeleton_uncached(&name) {
            Some(skeleton) => Some(self.skeletons().entry(name).or_insert(skeleton).clone()),
            None => None,
        }
    }

    fn load_skeleton_uncached(&self, name: &str) -> Option<Arc<Skeleton>> {
        let library = match self.load_model_library(name.to_string()) {
            Ok(library) if !library.nodes.is_empty() => library,
            Ok(_) => {
                error!("unable to load skeleton \"{}\"", name);
                return None;
            }
            Err(e) => {
                error!("unable to load skeleton \"{}\": {}", name, e);
                return None;
            }
        };
        Some(Arc::new(Skeleton::from_library(&library, name)))
    }

    /// Derives (and caches) the binding of `mesh` onto `skeleton`, keyed by
    /// the identity of the pair. A mesh without attachments shares one
    /// no-op binder across the whole process.
    pub fn bind_mesh(&self, skeleton: &Arc<Skeleton>, mesh: &Arc<ProtoMesh>) -> Arc<AttachBinder> {
        if mesh.attachment_nodes.is_empty() {
            return EMPTY_BINDER.clone();
        }

        let key = (Arc::as_ptr(skeleton) as usize, Arc::as_ptr(mesh) as usize);
        if let Some(hit) = self.binders().get(&key) {
            return hit.clone();
        }
        self.binders()
            .entry(key)
            .or_insert_with(|| Arc::new(AttachBinder::new(skeleton, mesh)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::model::ModelNode;

    fn library() -> ModelLibrary {
        ModelLibrary {
            nodes: vec![
                ModelNode {
                    name: "BIP01".into(),
                    parent: -1,
                    translation: [0.0; 3],
                },
                ModelNode {
                    name: "BIP01 HEAD".into(),
                    parent: 0,
                    translation: [0.0, 1.7, 0.0],
                },
            ],
            attachments: Vec::new(),
        }
    }

    #[test]
    fn skeleton_resolves_parents_and_names() {
        let skeleton = Skeleton::from_library(&library(), "HERO.MDH");
        assert_eq!(skeleton.nodes[0].parent, None);
        assert_eq!(skeleton.nodes[1].parent, Some(0));
        assert_eq!(skeleton.node_index("BIP01 HEAD"), Some(1));
        assert_eq!(skeleton.node_index("BIP01 TAIL"), None);
    }

    #[test]
    fn binder_maps_attachments_to_nodes() {
        let skeleton = Skeleton::from_library(&library(), "HERO.MDH");
        let mesh = ProtoMesh {
            name: "HERO.MDL".into(),
            packed: Default::default(),
            morph_animations: Vec::new(),
            attachment_nodes: vec!["BIP01 HEAD".into(), "BIP01 TAIL".into()],
            load_code: crate::assets::mesh::MeshLoadCode::Dynamic,
        };
        let binder = AttachBinder::new(&skeleton, &mesh);
        assert_eq!(binder.bindings, vec![Some(1), None]);
    }
}
