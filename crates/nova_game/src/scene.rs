//! Scenes own the sprites of one screen of the game; the manager keeps them
//! by name and knows which one is active.

use crate::context::Context;
use crate::engine::{EngineError, Frame};
use crate::sprite::{Group, Sprite, SpriteId};
use nova_core::Rect;

pub type SceneLogic<S> = Box<dyn FnMut(&mut Scene<S>, &mut Frame<'_, S>)>;

pub struct Scene<S> {
    name: String,
    objects: Vec<Sprite>,
    /// Ids of every solid sprite in `objects`, in insertion order. Rebuilt
    /// from `Sprite::solid` whenever the scene mutates its sprites.
    solids: Vec<SpriteId>,
    groups: Vec<Group>,
    logic: Option<SceneLogic<S>>,
}

impl<S> Scene<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            solids: Vec::new(),
            groups: Vec::new(),
            logic: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_sprite(&mut self, sprite: Sprite) -> SpriteId {
        let id = sprite.id();
        self.objects.push(sprite);
        self.sync_solids();
        id
    }

    pub fn add_sprites(&mut self, sprites: impl IntoIterator<Item = Sprite>) -> Vec<SpriteId> {
        sprites.into_iter().map(|s| self.add_sprite(s)).collect()
    }

    /// Groups are updated after the scene's own sprites.
    pub fn add_group(&mut self, group: Group) -> usize {
        self.groups.push(group);
        self.groups.len() - 1
    }

    pub fn group(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    pub fn group_mut(&mut self, index: usize) -> Option<&mut Group> {
        self.groups.get_mut(index)
    }

    pub fn objects(&self) -> &[Sprite] {
        &self.objects
    }

    pub fn solids(&self) -> &[SpriteId] {
        &self.solids
    }

    /// Mark a sprite solid or not, keeping `solids()` in step.
    pub fn set_solid(&mut self, id: SpriteId, solid: bool) -> bool {
        match self.objects.iter_mut().find(|s| s.id() == id) {
            Some(sprite) => {
                sprite.solid = solid;
                self.sync_solids();
                true
            }
            None => false,
        }
    }

    /// Rects of every solid sprite other than `id`. Reads the live `solid`
    /// flag, so sprites toggled through `get_mut` count immediately.
    pub fn solid_rects_except(&self, id: SpriteId) -> Vec<Rect> {
        self.objects
            .iter()
            .filter(|s| s.id() != id && s.solid)
            .map(|s| s.rect)
            .collect()
    }

    /// Rects of every sprite other than `id`.
    pub fn rects_except(&self, id: SpriteId) -> Vec<Rect> {
        self.objects
            .iter()
            .filter(|s| s.id() != id)
            .map(|s| s.rect)
            .collect()
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.objects.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.objects.iter_mut().find(|s| s.id() == id)
    }

    pub fn remove(&mut self, id: SpriteId) -> Option<Sprite> {
        let index = self.objects.iter().position(|s| s.id() == id)?;
        let sprite = self.objects.remove(index);
        self.sync_solids();
        Some(sprite)
    }

    pub fn set_logic(&mut self, logic: impl FnMut(&mut Scene<S>, &mut Frame<'_, S>) + 'static) {
        self.logic = Some(Box::new(logic));
    }

    /// Update every sprite and group, then sweep the dead ones.
    pub fn update(&mut self, ctx: &mut Context) {
        for sprite in &mut self.objects {
            sprite.update(ctx);
        }
        for group in &mut self.groups {
            group.update(ctx);
        }
        self.sweep();
        self.sync_solids();
    }

    /// Run the scene's logic, or a plain `update` when it has none.
    pub fn run(&mut self, frame: &mut Frame<'_, S>) {
        match self.logic.take() {
            Some(mut logic) => {
                logic(self, frame);
                if self.logic.is_none() {
                    self.logic = Some(logic);
                }
                self.sweep();
                self.sync_solids();
            }
            None => self.update(frame.ctx),
        }
    }

    /// Total sprites including group members.
    pub fn sprite_count(&self) -> usize {
        self.objects.len() + self.groups.iter().map(Group::len).sum::<usize>()
    }

    fn sweep(&mut self) {
        if !self.objects.iter().all(Sprite::alive) {
            self.objects.retain(Sprite::alive);
        }
    }

    fn sync_solids(&mut self) {
        self.solids.clear();
        self.solids
            .extend(self.objects.iter().filter(|s| s.solid).map(Sprite::id));
    }
}

pub struct SceneManager<S> {
    scenes: Vec<Scene<S>>,
    active: Option<usize>,
}

impl<S> SceneManager<S> {
    pub fn new() -> Self {
        Self {
            scenes: Vec::new(),
            active: None,
        }
    }

    /// Register a scene, replacing one with the same name.
    pub fn add(&mut self, scene: Scene<S>) {
        match self.scenes.iter().position(|s| s.name == scene.name) {
            Some(index) => {
                log::warn!(target: "SceneManager", "Replacing scene '{}'", scene.name);
                self.scenes[index] = scene;
            }
            None => self.scenes.push(scene),
        }
    }

    pub fn switch_to(&mut self, name: &str) -> Result<(), EngineError> {
        let index = self
            .scenes
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| EngineError::UnknownScene(name.to_string()))?;
        if self.active != Some(index) {
            log::info!(target: "SceneManager", "Switching to scene '{}'", name);
        }
        self.active = Some(index);
        Ok(())
    }

    pub fn active(&self) -> Option<&Scene<S>> {
        self.active.and_then(|i| self.scenes.get(i))
    }

    pub fn active_mut(&mut self) -> Option<&mut Scene<S>> {
        self.active.and_then(|i| self.scenes.get_mut(i))
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active().map(Scene::name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Scene<S>> {
        self.scenes.iter_mut().find(|s| s.name == name)
    }

    pub fn run_active(&mut self, frame: &mut Frame<'_, S>) {
        if let Some(scene) = self.active_mut() {
            scene.run(frame);
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenes.iter().map(Scene::name)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

impl<S> Default for SceneManager<S> {
    fn default() -> Self {
        Self::new()
    }
}
