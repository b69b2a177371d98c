use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::world::Category;

use super::compiler::compile_builtin_taxonomy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDefId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub id: TypeDefId,
    pub type_name: String,
    pub category: Category,
}

/// Registered object kinds. A type's id doubles as its one-hot index in
/// entity feature vectors.
#[derive(Debug, Default, Clone)]
pub struct Taxonomy {
    type_defs: Vec<TypeDef>,
    type_ids_by_name: HashMap<String, TypeDefId>,
}

impl Taxonomy {
    pub(crate) fn from_type_defs(mut type_defs: Vec<TypeDef>) -> Self {
        let mut type_ids_by_name = HashMap::with_capacity(type_defs.len());
        for (idx, def) in type_defs.iter_mut().enumerate() {
            let id = TypeDefId(idx as u32);
            def.id = id;
            type_ids_by_name.insert(def.type_name.clone(), id);
        }
        Self {
            type_defs,
            type_ids_by_name,
        }
    }

    pub fn builtin() -> Self {
        compile_builtin_taxonomy().expect("built-in taxonomy should compile")
    }

    pub fn type_def_id_by_name(&self, name: &str) -> Option<TypeDefId> {
        self.type_ids_by_name.get(name).copied()
    }

    pub fn type_def(&self, id: TypeDefId) -> Option<&TypeDef> {
        self.type_defs.get(id.0 as usize)
    }

    pub fn type_def_by_name(&self, name: &str) -> Option<&TypeDef> {
        self.type_def_id_by_name(name)
            .and_then(|id| self.type_def(id))
    }

    pub fn type_defs(&self) -> &[TypeDef] {
        &self.type_defs
    }

    pub fn category_of(&self, name: &str) -> Option<Category> {
        self.type_def_by_name(name).map(|def| def.category)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.type_ids_by_name.contains_key(name)
    }

    pub fn types_in(&self, category: Category) -> impl Iterator<Item = &str> + '_ {
        self.type_defs
            .iter()
            .filter(move |def| def.category == category)
            .map(|def| def.type_name.as_str())
    }

    pub fn categories(&self) -> BTreeMap<Category, BTreeSet<String>> {
        let mut categories = BTreeMap::<Category, BTreeSet<String>>::new();
        for def in &self.type_defs {
            categories
                .entry(def.category)
                .or_default()
                .insert(def.type_name.clone());
        }
        categories
    }

    pub fn len(&self) -> usize {
        self.type_defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.type_defs.is_empty()
    }
}
