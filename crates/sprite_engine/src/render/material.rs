//! Material interning
//!
//! Materials and textures are created once per name. Asking for a name that
//! already exists hands back the existing handle; looking up a name that was
//! never created is a configuration error.

use super::{MaterialDesc, MaterialId, RenderError, RenderResult, TextureId};
use std::collections::HashMap;

/// Name-keyed registry of materials and textures
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    materials: HashMap<String, MaterialId>,
    descs: HashMap<MaterialId, MaterialDesc>,
    textures: HashMap<String, TextureId>,
}

impl MaterialRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing material for `desc.name`, or one made by `create`
    pub fn intern_material(
        &mut self,
        desc: &MaterialDesc,
        create: impl FnOnce(&MaterialDesc) -> RenderResult<MaterialId>,
    ) -> RenderResult<MaterialId> {
        if let Some(&id) = self.materials.get(&desc.name) {
            return Ok(id);
        }
        let id = create(desc)?;
        log::debug!("Created material '{}'", desc.name);
        self.materials.insert(desc.name.clone(), id);
        self.descs.insert(id, desc.clone());
        Ok(id)
    }

    /// Existing texture for `name`, or one made by `create`
    pub fn intern_texture(
        &mut self,
        name: &str,
        create: impl FnOnce() -> RenderResult<TextureId>,
    ) -> RenderResult<TextureId> {
        if let Some(&id) = self.textures.get(name) {
            return Ok(id);
        }
        let id = create()?;
        log::debug!("Created texture '{name}'");
        self.textures.insert(name.to_string(), id);
        Ok(id)
    }

    /// Material by name
    pub fn material(&self, name: &str) -> RenderResult<MaterialId> {
        self.materials
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::UnknownMaterial(name.to_string()))
    }

    /// Texture by name
    pub fn texture(&self, name: &str) -> RenderResult<TextureId> {
        self.textures
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::UnknownTexture(name.to_string()))
    }

    /// Description a material was created from
    pub fn desc(&self, id: MaterialId) -> Option<&MaterialDesc> {
        self.descs.get(&id)
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether no material exists
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use slotmap::SlotMap;

    #[test]
    fn test_materials_interned_by_name() {
        let mut ids: SlotMap<MaterialId, ()> = SlotMap::with_key();
        let mut registry = MaterialRegistry::new();
        let mut created = 0;
        let desc = MaterialDesc::flat("ship", Vec4::new(1.0, 1.0, 1.0, 1.0));

        let first = registry
            .intern_material(&desc, |_| {
                created += 1;
                Ok(ids.insert(()))
            })
            .unwrap();
        let second = registry
            .intern_material(&desc, |_| {
                created += 1;
                Ok(ids.insert(()))
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(created, 1);
        assert_eq!(registry.material("ship").unwrap(), first);
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let registry = MaterialRegistry::new();
        assert!(matches!(registry.material("ghost"), Err(RenderError::UnknownMaterial(name)) if name == "ghost"));
        assert!(matches!(registry.texture("ghost"), Err(RenderError::UnknownTexture(_))));
    }
}
