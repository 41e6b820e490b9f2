//! Named scenes and the active one

use rustc_hash::FxHashMap;

use super::engine::EngineError;
use crate::scene::Scene;

/// Owns every loaded scene; at most one is active
#[derive(Debug, Default)]
pub struct SceneManager {
    scenes: FxHashMap<String, Scene>,
    current: Option<String>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene under its own name
    ///
    /// # Errors
    ///
    /// Returns an error if a scene with that name already exists
    pub fn add(&mut self, scene: Scene) -> Result<(), EngineError> {
        let name = scene.name().to_owned();
        if self.scenes.contains_key(&name) {
            return Err(EngineError::DuplicateScene(name));
        }
        log::info!("Registered scene '{name}'");
        self.scenes.insert(name, scene);
        Ok(())
    }

    /// Make `name` the active scene and return it
    ///
    /// # Errors
    ///
    /// Returns an error if no scene has that name
    pub fn enter(&mut self, name: &str) -> Result<&mut Scene, EngineError> {
        let scene = self
            .scenes
            .get_mut(name)
            .ok_or_else(|| EngineError::UnknownScene(name.to_owned()))?;
        self.current = Some(name.to_owned());
        log::info!("Entered scene '{name}'");
        Ok(scene)
    }

    /// Drop a scene; removing the active one leaves no scene active
    pub fn remove(&mut self, name: &str) -> Option<Scene> {
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        self.scenes.remove(name)
    }

    #[must_use]
    pub fn current(&self) -> Option<&Scene> {
        self.current.as_deref().and_then(|name| self.scenes.get(name))
    }

    pub fn current_mut(&mut self) -> Option<&mut Scene> {
        let name = self.current.as_deref()?;
        self.scenes.get_mut(name)
    }

    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_switches_current() {
        let mut manager = SceneManager::new();
        manager.add(Scene::new("menu")).unwrap();
        manager.add(Scene::new("level")).unwrap();
        assert!(manager.current().is_none());

        manager.enter("menu").unwrap();
        assert_eq!(manager.current_name(), Some("menu"));
        manager.enter("level").unwrap();
        assert_eq!(manager.current().map(Scene::name), Some("level"));
    }

    #[test]
    fn test_unknown_and_duplicate_names() {
        let mut manager = SceneManager::new();
        manager.add(Scene::new("menu")).unwrap();

        assert!(matches!(
            manager.add(Scene::new("menu")),
            Err(EngineError::DuplicateScene(name)) if name == "menu"
        ));
        assert!(matches!(
            manager.enter("credits"),
            Err(EngineError::UnknownScene(name)) if name == "credits"
        ));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_removing_current_scene() {
        let mut manager = SceneManager::new();
        manager.add(Scene::new("menu")).unwrap();
        manager.enter("menu").unwrap();

        assert!(manager.remove("menu").is_some());
        assert!(manager.current_mut().is_none());
        assert!(manager.is_empty());
    }
}
