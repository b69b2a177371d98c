use zoo_engine::world::in_contact;
use zoo_engine::{Category, Entity, EntityId, SceneWorld, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    /// Display name, suffixed with a number when it collides.
    pub key: String,
    pub id: EntityId,
    pub position: Vec2,
    pub grasped: bool,
    pub standing_on: bool,
    pub grew_this_step: bool,
}

/// Display name to entity mapping for the current step, in slot order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn build(scene: &SceneWorld, color_in_names: bool) -> Self {
        let agent = scene.agent();
        let mut entries = Vec::<DirectoryEntry>::with_capacity(scene.entity_count());
        // One suffix counter for every collision of the step.
        let mut suffix = 1;
        for entity in scene.entities() {
            let mut key = display_name(entity, color_in_names);
            if entries.iter().any(|entry| entry.key == key) {
                key = format!("{key}{suffix}");
                suffix += 1;
            }
            let standing_on = !entity.is_grasped()
                && in_contact(
                    entity.position(),
                    entity.size(),
                    agent.position,
                    agent.size,
                );
            entries.push(DirectoryEntry {
                key,
                id: entity.id(),
                position: entity.position(),
                grasped: entity.is_grasped(),
                standing_on,
                grew_this_step: entity.grew_this_step(),
            });
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// First non-grasped entry whose key starts with `descriptor`.
    pub fn resolve(&self, descriptor: &str) -> Option<&DirectoryEntry> {
        self.entries
            .iter()
            .find(|entry| !entry.grasped && entry.key.starts_with(descriptor))
    }

    /// Held entries' names in slot order.
    pub fn inventory(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.grasped)
            .map(|entry| strip_trailing_digits(&entry.key).to_string())
            .collect()
    }

    pub fn newly_grown(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.grew_this_step)
            .map(|entry| strip_trailing_digits(&entry.key).to_string())
            .collect()
    }
}

pub fn display_name(entity: &Entity, color_in_names: bool) -> String {
    let type_name = entity.type_name();
    let base = match entity.category() {
        Category::Plant if !entity.grown_once() => format!("{type_name} seed"),
        category if category.is_animal() && !entity.grown_once() => format!("baby {type_name}"),
        _ => type_name.to_string(),
    };
    match entity.color_name() {
        Some(color) if color_in_names => format!("{color} {base}"),
        _ => base,
    }
}

pub fn strip_trailing_digits(name: &str) -> &str {
    name.trim_end_matches(|ch: char| ch.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Perception {
    pub text: String,
    pub possible_actions: Vec<String>,
    pub inventory: Vec<String>,
}

pub fn render(directory: &Directory, inventory_capacity: usize) -> Perception {
    let visible = directory
        .entries()
        .iter()
        .filter(|entry| !entry.grasped)
        .collect::<Vec<_>>();
    let standing_on = directory
        .entries()
        .iter()
        .filter(|entry| entry.standing_on)
        .map(|entry| strip_trailing_digits(&entry.key))
        .collect::<Vec<_>>();
    let inventory = directory.inventory();

    let text = format!(
        "You see: {}\nYou are standing on: {}\nInventory ({}/{}): {}",
        visible
            .iter()
            .map(|entry| strip_trailing_digits(&entry.key))
            .collect::<Vec<_>>()
            .join(", "),
        list_or(&standing_on, "nothing"),
        inventory.len(),
        inventory_capacity,
        list_or(&inventory, "empty"),
    );

    let mut possible_actions = vec!["Grasp".to_string()];
    possible_actions.extend(visible.iter().map(|entry| format!("Go to {}", entry.key)));
    possible_actions.extend(inventory.iter().map(|name| format!("Release {name}")));
    if inventory.len() >= inventory_capacity {
        possible_actions.push("Release all".to_string());
    }

    Perception {
        text,
        possible_actions,
        inventory,
    }
}

fn list_or<S: AsRef<str>>(items: &[S], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
