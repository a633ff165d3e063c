//! Multi-scene project registry.
//!
//! Scenes sharing a directory form one project; the registry maps the
//! directory prefix to an ordered set of parsed scenes. The registry is
//! an explicitly constructed object, not process-global state, and uses
//! a concurrent map so synchronization is visible at the type level.
//! Interleaved sync/purge calls on the same project still race
//! logically; callers are expected to serialize per project.

use anyhow::{anyhow, Result};
use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use tracing::debug;
use url::Url;

use choicescript_core::doc::{project_path_of, scene_name_of, TextDocument};
use choicescript_core::parser::{parse_scene, Scene};

use crate::symbols::Symbols;


/// One indexed scene: its URI, the document snapshot it was parsed from,
/// and the parsed tree.
#[derive(Debug)]
pub struct SceneIndex {
    pub name: String,
    pub uri: Url,
    pub document: TextDocument,
    pub scene: Scene,
}

/// The ordered scenes of one project directory.
#[derive(Debug)]
pub struct ProjectIndex {
    path: String,
    scenes: Vec<SceneIndex>,
}

impl ProjectIndex {
    fn new(path: String) -> Self {
        Self {
            path,
            scenes: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Scene names in indexing order.
    pub fn get_scene_list(&self) -> Vec<String> {
        self.scenes.iter().map(|s| s.name.clone()).collect()
    }

    pub fn get_scene_index(&self, name: &str) -> Option<&SceneIndex> {
        self.scenes.iter().find(|s| s.name == name)
    }

    /// The parsed tree for a scene name. `startup` resolved this way is
    /// how other scenes see the project's global declarations.
    pub fn get_scene_node_by_name(&self, name: &str) -> Option<&Scene> {
        self.get_scene_index(name).map(|s| &s.scene)
    }

    pub fn get_scene_doc_by_name(&self, name: &str) -> Option<&TextDocument> {
        self.get_scene_index(name).map(|s| &s.document)
    }

    /// Freshly built symbols for a scene name. Callers that need them
    /// repeatedly within one request memoize on their side.
    pub fn get_scene_symbols_by_name(&self, name: &str) -> Option<Symbols> {
        self.get_scene_node_by_name(name).map(Symbols::from_scene)
    }
}

/// Registry of projects, keyed by project path.
#[derive(Debug, Default)]
pub struct Indexer {
    projects: DashMap<String, ProjectIndex>,
}

impl Indexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch of scene documents into the project the URI belongs
    /// to. New scenes are parsed; known scenes are re-parsed when their
    /// version changed or `force` is set.
    pub fn sync(
        &self,
        uri: &Url,
        resources: Option<Vec<TextDocument>>,
        force: bool,
    ) -> Result<Option<Ref<'_, String, ProjectIndex>>> {
        let path = project_path_of(uri)
            .ok_or_else(|| anyhow!("scene uri has no directory: {uri}"))?;
        {
            let mut project = self
                .projects
                .entry(path.clone())
                .or_insert_with(|| ProjectIndex::new(path.clone()));
            for document in resources.into_iter().flatten() {
                let Some(name) = scene_name_of(&document.uri) else {
                    debug!(uri = %document.uri, "skipping resource with no scene name");
                    continue;
                };
                match project.scenes.iter_mut().find(|s| s.uri == document.uri) {
                    Some(existing) => {
                        if force || existing.document.version != document.version {
                            debug!(scene = %name, version = document.version, "re-parsing scene");
                            existing.scene = parse_scene(&document);
                            existing.document = document;
                        }
                    }
                    None => {
                        debug!(scene = %name, "indexing new scene");
                        let scene = parse_scene(&document);
                        project.scenes.push(SceneIndex {
                            name,
                            uri: document.uri.clone(),
                            document,
                            scene,
                        });
                    }
                }
            }
        }
        Ok(self.projects.get(&path))
    }

    /// Drop a whole project, or only the listed scene URIs from it.
    pub fn purge(
        &self,
        uri: &Url,
        specific: Option<&[Url]>,
    ) -> Result<Option<Ref<'_, String, ProjectIndex>>> {
        let path = project_path_of(uri)
            .ok_or_else(|| anyhow!("scene uri has no directory: {uri}"))?;
        match specific {
            None => {
                debug!(%path, "purging project");
                self.projects.remove(&path);
                Ok(None)
            }
            Some(uris) => {
                if let Some(mut project) = self.projects.get_mut(&path) {
                    project.scenes.retain(|s| !uris.contains(&s.uri));
                }
                Ok(self.projects.get(&path))
            }
        }
    }

    /// The project a scene URI belongs to, if indexed.
    pub fn get(&self, uri: &Url) -> Option<Ref<'_, String, ProjectIndex>> {
        let path = project_path_of(uri)?;
        self.projects.get(&path)
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
